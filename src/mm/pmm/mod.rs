//! # PMM - Physical Memory Manager
//!
//! Alocador de frames físicos particionado por CPU, com roubo de frames
//! entre partições quando a local esgota.

pub mod arena;
pub mod frame;
pub mod pool;
pub mod region;
pub mod stats;

pub use arena::FrameArena;
pub use frame::PhysFrame;
pub use pool::FramePool;
pub use region::{MemoryRegion, MemoryRegionType};
pub use stats::{PmmStats, PoolSnapshot};

pub use crate::mm::config::PoolConfig;
