//! # Dispositivos de Bloco
//!
//! Interface de dispositivo usada pelo buffer cache.
//!
//! | Driver      | Descrição                          |
//! |-------------|------------------------------------|
//! | Ramdisk     | Disco em memória (testes, boot)    |
//!
//! Drivers de hardware (ATA, VirtIO) vivem no kernel e implementam
//! [`BlockDevice`] do lado de lá.

pub mod ramdisk;
pub mod traits;

pub use ramdisk::RamDisk;
pub use traits::{BlockDevice, BlockError};
