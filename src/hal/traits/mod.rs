//! Traits do HAL
//!
//! Define as interfaces abstratas que o kernel implementa para os pools.

pub mod cpu;
pub mod sched;

pub use cpu::*;
pub use sched::*;

/// Tudo que os pools precisam da plataforma
pub trait Platform: CpuHal + SchedHal {}

impl<T: CpuHal + SchedHal> Platform for T {}
