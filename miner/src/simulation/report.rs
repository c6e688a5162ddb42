//! Run events, summaries and their rendering

use crate::simulation::scenario::Phase;
use retarget_core::U256;
use serde::Serialize;

/// Format a duration in seconds as `"{days}d {hh}:{mm}:{ss}"`
pub fn format_time(secs: u32) -> String {
    let sec = secs % 60;
    let minutes = secs / 60;
    let min = minutes % 60;
    let hours = minutes / 60;
    let hour = hours % 24;
    let day = hours / 24;
    format!("{day}d {hour:02}:{min:02}:{sec:02}")
}

/// Format `later - earlier` like [`format_time`]. The difference wraps, so a
/// block timestamped before its parent shows up as a very long delta.
pub fn format_time_delta(later: u32, earlier: u32) -> String {
    format_time(later.wrapping_sub(earlier))
}

/// One appended block, as reported to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub height: u32,
    pub time: u32,
    /// Timestamp of the parent block
    pub parent_time: u32,
    pub bits: u32,
    pub difficulty: f64,
    pub phase: Phase,
}

impl BlockReport {
    /// Seconds since the parent block, wrapping on out-of-order timestamps
    pub fn time_delta(&self) -> u32 {
        self.time.wrapping_sub(self.parent_time)
    }
}

/// What the attacker gained while the attack phase lasted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackSummary {
    /// Tip height when the attack started
    pub start_height: u32,
    /// Tip height when the attack stopped
    pub end_height: u32,
    pub blocks_mined: u32,
    /// Blocks the attack duration is worth at the target spacing
    pub blocks_expected: u32,
    pub extra_blocks: i64,
    /// `None` when no blocks were expected at all
    pub increase_percent: Option<f64>,
}

impl AttackSummary {
    pub fn new(start_height: u32, end_height: u32, blocks_expected: u32) -> Self {
        let blocks_mined = end_height.saturating_sub(start_height);
        let increase_percent = (blocks_expected > 0)
            .then(|| blocks_mined as f64 / blocks_expected as f64 * 100.0 - 100.0);
        Self {
            start_height,
            end_height,
            blocks_mined,
            blocks_expected,
            extra_blocks: blocks_mined as i64 - blocks_expected as i64,
            increase_percent,
        }
    }

    pub fn render(&self) -> String {
        match self.increase_percent {
            Some(percent) => format!(
                "attacker mined {} blocks instead of {} ({} extra, {:.2}% increase)",
                self.blocks_mined, self.blocks_expected, self.extra_blocks, percent
            ),
            None => format!(
                "attacker mined {} blocks instead of {} ({} extra, no increase defined)",
                self.blocks_mined, self.blocks_expected, self.extra_blocks
            ),
        }
    }
}

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Started {
        mega_hashes_per_sec: f64,
    },
    AttackStarted {
        height: u32,
        mega_hashes_per_sec: f64,
    },
    AttackStopped {
        mega_hashes_per_sec: f64,
        summary: AttackSummary,
    },
    BlockAdded(BlockReport),
}

impl SimEvent {
    /// Phase transitions, as opposed to per-block reports
    pub fn is_transition(&self) -> bool {
        !matches!(self, SimEvent::BlockAdded(_))
    }

    /// Human-readable lines for this event
    pub fn render_text(&self) -> Vec<String> {
        match self {
            SimEvent::Started {
                mega_hashes_per_sec,
            } => vec![format!("STARTED: now mining at {mega_hashes_per_sec:.6} MH")],
            SimEvent::AttackStarted {
                mega_hashes_per_sec,
                ..
            } => vec![format!(
                "ATTACK STARTED: now mining at {mega_hashes_per_sec:.6} MH"
            )],
            SimEvent::AttackStopped {
                mega_hashes_per_sec,
                summary,
            } => vec![
                summary.render(),
                format!("ATTACK STOPPED: now mining at {mega_hashes_per_sec:.6} MH"),
            ],
            SimEvent::BlockAdded(block) => vec![format!(
                "  added block {:04} time {} (+{}) diff {:.6}",
                block.height,
                format_time(block.time),
                format_time_delta(block.time, block.parent_time),
                block.difficulty
            )],
        }
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Final state of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutcome {
    pub algorithm: String,
    pub final_height: u32,
    pub final_time: u32,
    pub chain_work: U256,
    /// `None` if the run ended before the attack stopped
    pub attack: Option<AttackSummary>,
}

impl SimulationOutcome {
    pub fn render_text(&self) -> String {
        let attack = match &self.attack {
            Some(summary) => summary.render(),
            None => "attack never completed".to_string(),
        };
        format!(
            "{}: height {} time {} work 0x{} | {}",
            self.algorithm,
            self.final_height,
            format_time(self.final_time),
            self.chain_work.to_hex().trim_start_matches('0'),
            attack
        )
    }
}
