//! Forge Pools Library.
//!
//! Pools de recursos particionados do Kernel Forge:
//!
//! - `mm::pmm`: alocador de frames físicos com uma free list por CPU e
//!   rebalanceamento (stealing) quando a partição local esgota.
//! - `fs::bcache`: buffer cache de blocos de disco com um bucket por
//!   partição de hash, busca em rotação e admissão com fallback.
//!
//! Os dois subsistemas são folhas: nenhum chama o outro. Scheduler, driver
//! de disco e page tables são colaboradores externos, plugados via `hal` e
//! `drivers::block::BlockDevice`.

#![no_std]

// Habilitar alocação dinâmica (arenas, free lists, buckets)
extern crate alloc;

// HAL hospedado usa threads do host
#[cfg(any(test, feature = "std"))]
extern crate std;

// --- Infraestrutura (macros de log primeiro: usadas por todos) ---
pub mod core; // Logging zero-overhead
pub mod hal; // Seams de CPU e Scheduler
pub mod klib; // Utilitários internos (alinhamento, framework de testes)
pub mod sync; // Spinlock, SleepLock, aquisição ordenada

// --- Colaboradores externos ---
pub mod drivers; // Trait de dispositivo de bloco

// --- Subsistemas ---
pub mod fs; // Buffer cache de blocos
pub mod mm; // Alocador de frames particionado

pub use crate::fs::bcache::{BlockKey, BufGuard, BufferCache, CacheConfig};
pub use crate::mm::pmm::{FrameArena, FramePool, PhysFrame, PoolConfig};
pub use crate::mm::{MmError, MmResult};
