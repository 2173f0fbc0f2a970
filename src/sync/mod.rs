//! # Synchronization Primitives
//!
//! Primitivas de sincronização dos pools.
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! Spinlock     → Seções críticas curtas (não pode dormir)
//! SleepLock    → Seções que podem bloquear em I/O (pode dormir)
//! lock_ordered → Vários Spinlocks de um mesmo array, ordem crescente
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: free lists, metadados de bucket. Nunca atravessar I/O.
//! - **SleepLock**: conteúdo de buffer. Nunca adquirir com Spinlock tomado.
//! - **Ordem de Lock**: mais de um lock do mesmo array só via `lock_ordered`.

/// Spinlock (busy-wait, não dorme)
pub mod spinlock;

/// SleepLock (bloqueia a task)
pub mod sleeplock;

/// Aquisição de múltiplos locks em ordem global
pub mod ordered;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use ordered::{lock_all, lock_ordered, OrderedGuards};
pub use sleeplock::{SleepLock, SleepLockGuard};
pub use spinlock::{Spinlock, SpinlockGuard};
