//! Core Module
//!
//! Infraestrutura comum aos pools: o sistema de logging zero-overhead.

pub mod logging;
