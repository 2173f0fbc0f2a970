//! # Buffer Cache
//!
//! Cache de blocos de disco particionado em buckets de hash. Cada bucket
//! tem lock próprio e um número fixo de slots; slots nunca mudam de
//! bucket. Uma chave fica no bucket home quando há espaço e em outro
//! bucket quando o home estava cheio na admissão.
//!
//! ## Contrato
//!
//! - `read`/`get` entregam um [`BufGuard`] com acesso exclusivo.
//! - Um release por aquisição: o guard é consumido ou dropado.
//! - `write` exige o acesso exclusivo (verificado).
//! - `pin`/`unpin` seguram o slot sem acesso exclusivo.
//!
//! ## Estados de um slot
//!
//! ```text
//! Livre ──admit──▶ Invalid,rc=1 ──read──▶ Valid,rc=1 ──hit──▶ Valid,rc=N
//!   ▲                                                              │
//!   └──────────── admit(outra chave) ◀── Valid,rc=0 ◀──release─────┘
//! ```

mod bucket;
mod buf;
mod cache;
mod stats;

pub use buf::{BlockKey, BufFlags, BufGuard};
pub use cache::BufferCache;
pub use stats::CacheStats;

pub use crate::mm::config::CacheConfig;
