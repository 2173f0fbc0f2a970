//! Camada de blocos do sistema de arquivos.
//!
//! Submódulos:
//! - `bcache`: buffer cache de blocos de disco, particionado em buckets.

pub mod bcache;

#[cfg(feature = "self_test")]
pub mod test;
