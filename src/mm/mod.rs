//! # Memory Management (MM)
//!
//! Alocador de frames físicos particionado e a configuração compartilhada
//! pelos pools.
//!
//! | Módulo   | Responsabilidade                                  |
//! |----------|---------------------------------------------------|
//! | `pmm`    | Frames de 4KiB, uma free list por CPU + roubo     |
//! | `addr`   | `PhysAddr` type-safe                              |
//! | `config` | Constantes e geometria dos pools                  |
//! | `error`  | `MmError` / `MmResult`                            |
//!
//! ## Ordem de lock do PMM
//!
//! ```text
//! alloc/free ──▶ lock(partição do CPU)            (um lock)
//! rebalance  ──▶ lock(0) → lock(1) → ... → lock(P-1)
//!                solta  P-1 → ... → 0
//! ```
//!
//! Nenhum outro caminho segura duas partições.

pub mod addr;
pub mod config;
pub mod error;
pub mod pmm;

#[cfg(feature = "self_test")]
pub mod test;

pub use error::{MmError, MmResult};

#[cfg(feature = "self_test")]
pub use test::run_pool_tests;
