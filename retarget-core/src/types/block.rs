//! Block index arena
//!
//! The simulated chain never forks or reorganizes, so it is stored as an
//! append-only vector indexed by height. A node's predecessor is simply the
//! entry one slot below it, and ancestor lookup is index arithmetic.

use crate::types::uint256::U256;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Number of blocks (this one included) whose timestamps feed the median time past
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Candidate header proposed on top of the current tip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Timestamp in seconds
    pub time: u32,
    /// Compact-encoded target
    pub bits: u32,
}

impl BlockHeader {
    pub fn new(time: u32, bits: u32) -> Self {
        Self { time, bits }
    }

    pub fn block_time(&self) -> i64 {
        self.time as i64
    }
}

/// One block of the simulated chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndex {
    /// Height of this block, genesis is 0
    pub height: u32,

    /// Timestamp in seconds
    pub time: u32,

    /// Compact-encoded target
    pub bits: u32,

    /// Total work of the chain up to and including this block
    pub chain_work: U256,
}

impl BlockIndex {
    pub fn block_time(&self) -> i64 {
        self.time as i64
    }
}

/// Append-only chain of block indices, owned as a whole
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<BlockIndex>,
}

impl Chain {
    /// Start a chain from its genesis block; the genesis height is forced to 0.
    pub fn new(mut genesis: BlockIndex) -> Self {
        genesis.height = 0;
        Self {
            blocks: vec![genesis],
        }
    }

    /// Append a block on top of the tip and return a view of it.
    ///
    /// The height is assigned here, so callers cannot break the
    /// height-equals-index invariant.
    pub fn push(&mut self, time: u32, bits: u32, chain_work: U256) -> BlockRef<'_> {
        let height = self.blocks.len() as u32;
        self.blocks.push(BlockIndex {
            height,
            time,
            bits,
            chain_work,
        });
        self.tip()
    }

    pub fn tip(&self) -> BlockRef<'_> {
        BlockRef {
            blocks: &self.blocks,
            pos: self.blocks.len() - 1,
        }
    }

    pub fn genesis(&self) -> BlockRef<'_> {
        BlockRef {
            blocks: &self.blocks,
            pos: 0,
        }
    }

    pub fn get(&self, height: u32) -> Option<BlockRef<'_>> {
        let index = height as usize;
        (index < self.blocks.len()).then_some(BlockRef {
            blocks: &self.blocks,
            pos: index,
        })
    }

    pub fn height(&self) -> u32 {
        self.tip().height
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[BlockIndex] {
        &self.blocks
    }
}

/// Borrowed view of a block together with its ancestry
#[derive(Debug, Clone, Copy)]
pub struct BlockRef<'a> {
    blocks: &'a [BlockIndex],
    pos: usize,
}

impl<'a> BlockRef<'a> {
    pub fn block(&self) -> &'a BlockIndex {
        &self.blocks[self.pos]
    }

    /// The immediate predecessor, `None` at genesis
    pub fn prev(&self) -> Option<BlockRef<'a>> {
        self.pos.checked_sub(1).map(|pos| BlockRef {
            blocks: self.blocks,
            pos,
        })
    }

    /// The ancestor at `height`, or `None` when it lies above this block.
    pub fn ancestor(&self, height: u32) -> Option<BlockRef<'a>> {
        let index = height as usize;
        (index <= self.pos).then_some(BlockRef {
            blocks: self.blocks,
            pos: index,
        })
    }

    /// Median of the timestamps of this block and up to ten predecessors.
    ///
    /// With fewer than [`MEDIAN_TIME_SPAN`] blocks available the median is
    /// taken over what exists; an even count yields the lower middle element.
    pub fn median_time_past(&self) -> i64 {
        let first = (self.pos + 1).saturating_sub(MEDIAN_TIME_SPAN);
        let mut times: Vec<i64> = self.blocks[first..=self.pos]
            .iter()
            .map(BlockIndex::block_time)
            .collect();
        times.sort_unstable();
        times[(times.len() - 1) / 2]
    }
}

impl Deref for BlockRef<'_> {
    type Target = BlockIndex;

    fn deref(&self) -> &Self::Target {
        self.block()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_times(times: &[u32]) -> Chain {
        let mut chain = Chain::new(BlockIndex {
            height: 0,
            time: times[0],
            bits: 0x1d00ffff,
            chain_work: U256::zero(),
        });
        for &time in &times[1..] {
            chain.push(time, 0x1d00ffff, U256::zero());
        }
        chain
    }

    #[test]
    fn test_heights_follow_insertion_order() {
        let chain = chain_with_times(&[0, 600, 1200, 1800]);
        assert_eq!(chain.height(), 3);
        assert_eq!(chain.len(), 4);
        for (i, block) in chain.blocks().iter().enumerate() {
            assert_eq!(block.height as usize, i);
        }
    }

    #[test]
    fn test_ancestor_lookup() {
        let chain = chain_with_times(&[0, 10, 20, 30, 40]);
        let tip = chain.tip();
        assert_eq!(tip.ancestor(4).unwrap().time, 40);
        assert_eq!(tip.ancestor(0).unwrap().time, 0);
        assert_eq!(tip.ancestor(2).unwrap().height, 2);
        assert!(tip.ancestor(5).is_none());

        let middle = chain.get(2).unwrap();
        assert!(middle.ancestor(3).is_none());
        assert_eq!(middle.prev().unwrap().height, 1);
        assert!(chain.genesis().prev().is_none());
    }

    #[test]
    fn test_median_time_past_full_window() {
        // 12 blocks, only the last 11 count
        let times = [1000, 5, 9, 1, 7, 3, 11, 2, 8, 4, 10, 6];
        let chain = chain_with_times(&times);
        // Window is times[1..]: sorted 1..=11, median 6
        assert_eq!(chain.tip().median_time_past(), 6);
    }

    #[test]
    fn test_median_time_past_short_chains() {
        assert_eq!(chain_with_times(&[42]).tip().median_time_past(), 42);
        // Even count picks the lower middle element
        assert_eq!(chain_with_times(&[30, 10]).tip().median_time_past(), 10);
        assert_eq!(chain_with_times(&[40, 10, 30, 20]).tip().median_time_past(), 20);
        // Odd count picks the exact middle
        assert_eq!(chain_with_times(&[50, 10, 30]).tip().median_time_past(), 30);
    }

    #[test]
    fn test_median_time_past_tolerates_non_monotonic_times() {
        let chain = chain_with_times(&[0, 600, 300, 1200, 900]);
        // Sorted: 0, 300, 600, 900, 1200
        assert_eq!(chain.tip().median_time_past(), 600);
    }

    #[test]
    fn test_genesis_height_forced_to_zero() {
        let chain = Chain::new(BlockIndex {
            height: 7,
            time: 0,
            bits: 0x1d00ffff,
            chain_work: U256::zero(),
        });
        assert_eq!(chain.tip().height, 0);
    }
}
