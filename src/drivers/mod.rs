//! # Drivers
//!
//! Apenas a fronteira com os drivers de disco: a trait que o buffer cache
//! consome e um ramdisk para rodar o cache sem hardware.

pub mod block;
