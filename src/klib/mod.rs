//! Kernel Library (KLib).
//!
//! Utilitários agnósticos de hardware para uso interno dos pools.

pub mod align;

#[cfg(feature = "self_test")]
pub mod test_framework;

pub use align::{align_down, align_up, is_aligned};
