pub mod block;
pub mod uint256;

pub use block::{BlockHeader, BlockIndex, BlockRef, Chain, MEDIAN_TIME_SPAN};
pub use uint256::U256;
