//! # Camada de Abstração de Dispositivos de Bloco
//!
//! O que o buffer cache precisa do driver de disco.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              fs::bcache (BufferCache)               │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              BlockDevice Trait                      │
//! │   read_block(dev, blockno) write_block(dev, ...)    │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              DRIVERS (VirtIO, ATA, Ramdisk)         │
//! └─────────────────────────────────────────────────────┘
//! ```

use core::fmt;

/// Tipos de erro para dispositivos de bloco
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// Dispositivo não encontrado ou não inicializado
    NotFound,
    /// Endereço de bloco inválido (fora do intervalo)
    InvalidBlock,
    /// Erro de I/O durante leitura/escrita
    IoError,
    /// Tamanho do buffer incorreto
    InvalidBuffer,
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::NotFound => write!(f, "Dispositivo não encontrado"),
            BlockError::InvalidBlock => write!(f, "Endereço de bloco inválido"),
            BlockError::IoError => write!(f, "Erro de I/O"),
            BlockError::InvalidBuffer => write!(f, "Tamanho do buffer inválido"),
        }
    }
}

/// Trait para dispositivos de bloco
///
/// Síncrona do ponto de vista do cache: quando retorna, a transferência
/// terminou. O cache chama com o SleepLock do buffer tomado e nenhum lock
/// de bucket, então a implementação pode bloquear.
pub trait BlockDevice: Send + Sync {
    /// Lê o bloco `blockno` do dispositivo `dev` em `buf` (`BSIZE` bytes)
    fn read_block(&self, dev: u32, blockno: u32, buf: &mut [u8]) -> Result<(), BlockError>;

    /// Escreve `buf` (`BSIZE` bytes) no bloco `blockno` do dispositivo `dev`
    fn write_block(&self, dev: u32, blockno: u32, buf: &[u8]) -> Result<(), BlockError>;
}
