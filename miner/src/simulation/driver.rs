//! Block-by-block attack simulation
//!
//! Each step proposes a header one second after the tip, asks the retarget
//! algorithm for its bits, and "mines" it: the solve time is the expected
//! number of hashes for that difficulty divided by the phase's hash rate.

use crate::error::SimResult;
use crate::simulation::report::{AttackSummary, BlockReport, SimEvent, SimulationOutcome};
use crate::simulation::scenario::{Phase, Scenario};
use retarget_core::{
    block_proof, get_difficulty, BlockHeader, BlockIndex, Chain, ConsensusParams,
    DifficultyAlgorithm, RetargetAlgorithm,
};
use tracing::{debug, info, warn};

/// Hashes per unit of difficulty
const HASHES_PER_DIFFICULTY: f64 = 4_294_967_296.0;

/// Drives one algorithm through one scenario
#[derive(Debug)]
pub struct AttackSimulator<A = RetargetAlgorithm> {
    algorithm: A,
    params: ConsensusParams,
    scenario: Scenario,
    chain: Chain,
    phase: Phase,
    attack_start_height: u32,
    summary: Option<AttackSummary>,
}

impl<A: DifficultyAlgorithm> AttackSimulator<A> {
    /// Validate the inputs and create the genesis block
    pub fn new(algorithm: A, params: ConsensusParams, scenario: Scenario) -> SimResult<Self> {
        params.validate()?;
        scenario.validate()?;

        let genesis = BlockIndex {
            height: 0,
            time: scenario.genesis_time,
            bits: scenario.genesis_bits,
            chain_work: block_proof(scenario.genesis_bits),
        };

        Ok(Self {
            algorithm,
            params,
            scenario,
            chain: Chain::new(genesis),
            phase: Phase::PreAttack,
            attack_start_height: 0,
            summary: None,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn attack_summary(&self) -> Option<&AttackSummary> {
        self.summary.as_ref()
    }

    /// Whether the tip has reached the end of the scenario
    pub fn is_finished(&self) -> bool {
        self.chain.tip().time as u64 >= self.scenario.end_time()
    }

    /// Append one block. Returns the phase transitions it triggered followed
    /// by the block itself, or nothing once the run is finished.
    pub fn step(&mut self) -> Vec<SimEvent> {
        if self.is_finished() {
            return Vec::new();
        }

        let (tip_height, tip_time, tip_work, bits) = {
            let tip = self.chain.tip();
            let mut candidate = BlockHeader::new(tip.time.saturating_add(1), 0);
            candidate.bits = self
                .algorithm
                .next_work_required(Some(tip), &candidate, &self.params);
            (tip.height, tip.time, tip.chain_work, candidate.bits)
        };
        let candidate_time = tip_time.saturating_add(1) as u64;

        let mut events = Vec::new();

        if self.phase == Phase::PreAttack && candidate_time >= self.scenario.attack_start() {
            self.phase = Phase::Attack;
            self.attack_start_height = tip_height;
            let rate = self.scenario.attack.mega_hashes_per_sec;
            info!(height = tip_height, mega_hashes_per_sec = rate, "attack started");
            events.push(SimEvent::AttackStarted {
                height: tip_height,
                mega_hashes_per_sec: rate,
            });
        }

        if self.phase == Phase::Attack && candidate_time >= self.scenario.attack_end() {
            self.phase = Phase::PostAttack;
            let summary = self.finish_attack(tip_height);
            let rate = self.scenario.post_attack.mega_hashes_per_sec;
            info!(
                height = tip_height,
                blocks_mined = summary.blocks_mined,
                blocks_expected = summary.blocks_expected,
                "attack stopped"
            );
            events.push(SimEvent::AttackStopped {
                mega_hashes_per_sec: rate,
                summary,
            });
        }

        let hash_rate = self.scenario.phase(self.phase).mega_hashes_per_sec;
        let difficulty = get_difficulty(bits);
        let solve_time = difficulty * HASHES_PER_DIFFICULTY / hash_rate / 1_000_000.0;
        // Float-to-int casts saturate, so a huge solve time pins at u32::MAX
        let time = (candidate_time as f64 + solve_time) as u32;

        let chain_work = tip_work + block_proof(bits);
        let block = self.chain.push(time, bits, chain_work);
        let height = block.height;

        debug!(height, time, bits, difficulty, "added block");

        events.push(SimEvent::BlockAdded(BlockReport {
            height,
            time,
            parent_time: tip_time,
            bits,
            difficulty,
            phase: self.phase,
        }));

        events
    }

    fn finish_attack(&mut self, tip_height: u32) -> AttackSummary {
        let spacing = self.params.pow_target_spacing.max(1) as u64;
        let expected = self.scenario.attack.duration_secs as u64 / spacing;
        if expected == 0 {
            warn!(
                duration_secs = self.scenario.attack.duration_secs,
                "attack shorter than one block spacing, increase is undefined"
            );
        }

        let summary = AttackSummary::new(
            self.attack_start_height,
            tip_height,
            u32::try_from(expected).unwrap_or(u32::MAX),
        );
        self.summary = Some(summary.clone());
        summary
    }

    /// Run to completion, handing every event to `on_event` as it happens
    pub fn run_with<F>(&mut self, mut on_event: F) -> SimulationOutcome
    where
        F: FnMut(&SimEvent),
    {
        let rate = self.scenario.pre_attack.mega_hashes_per_sec;
        info!(
            algorithm = self.algorithm.name(),
            mega_hashes_per_sec = rate,
            "simulation started"
        );
        on_event(&SimEvent::Started {
            mega_hashes_per_sec: rate,
        });

        while !self.is_finished() {
            for event in self.step() {
                on_event(&event);
            }
        }

        self.outcome()
    }

    /// Run to completion without observing events
    pub fn run(&mut self) -> SimulationOutcome {
        self.run_with(|_| {})
    }

    pub fn outcome(&self) -> SimulationOutcome {
        let tip = self.chain.tip();
        SimulationOutcome {
            algorithm: self.algorithm.name().to_string(),
            final_height: tip.height,
            final_time: tip.time,
            chain_work: tip.chain_work,
            attack: self.summary.clone(),
        }
    }
}

/// Play the same scenario under every available algorithm
pub fn compare(params: &ConsensusParams, scenario: &Scenario) -> SimResult<Vec<SimulationOutcome>> {
    RetargetAlgorithm::all()
        .into_iter()
        .map(|algorithm| {
            let mut simulator = AttackSimulator::new(algorithm, params.clone(), scenario.clone())?;
            Ok(simulator.run())
        })
        .collect()
}
