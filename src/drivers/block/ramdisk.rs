//! Ramdisk: dispositivo de bloco em memória
//!
//! Blocos nunca escritos leem como zero. Conta leituras e escritas por
//! chave para os testes verificarem quantas vezes o cache foi ao disco.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::traits::{BlockDevice, BlockError};
use crate::mm::config::BSIZE;
use crate::sync::Spinlock;

#[derive(Default)]
struct Block {
    data: Option<Box<[u8; BSIZE]>>,
    reads: usize,
    writes: usize,
}

/// Disco em memória endereçado por (dev, blockno)
pub struct RamDisk {
    blocks: Spinlock<BTreeMap<(u32, u32), Block>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    /// Blocos por dispositivo (None = ilimitado)
    limit: Option<u32>,
}

impl RamDisk {
    pub const fn new() -> Self {
        Self {
            blocks: Spinlock::new(BTreeMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            limit: None,
        }
    }

    /// Disco com `blocks` blocos por dispositivo
    pub const fn with_blocks(blocks: u32) -> Self {
        Self {
            blocks: Spinlock::new(BTreeMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            limit: Some(blocks),
        }
    }

    /// Total de leituras
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Total de escritas
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Leituras de um bloco específico
    pub fn reads_of(&self, dev: u32, blockno: u32) -> usize {
        self.blocks.lock().get(&(dev, blockno)).map_or(0, |b| b.reads)
    }

    /// Escritas de um bloco específico
    pub fn writes_of(&self, dev: u32, blockno: u32) -> usize {
        self.blocks.lock().get(&(dev, blockno)).map_or(0, |b| b.writes)
    }

    /// Primeiro byte armazenado do bloco (sem passar pelo cache)
    pub fn peek(&self, dev: u32, blockno: u32) -> Option<u8> {
        self.blocks
            .lock()
            .get(&(dev, blockno))
            .and_then(|b| b.data.as_ref().map(|d| d[0]))
    }

    fn check(&self, blockno: u32, len: usize) -> Result<(), BlockError> {
        if len != BSIZE {
            return Err(BlockError::InvalidBuffer);
        }
        if self.limit.map_or(false, |l| blockno >= l) {
            return Err(BlockError::InvalidBlock);
        }
        Ok(())
    }
}

impl Default for RamDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, dev: u32, blockno: u32, buf: &mut [u8]) -> Result<(), BlockError> {
        self.check(blockno, buf.len())?;
        {
            let mut blocks = self.blocks.lock();
            let block = blocks.entry((dev, blockno)).or_default();
            block.reads += 1;
            match &block.data {
                Some(data) => buf.copy_from_slice(&data[..]),
                None => buf.fill(0),
            }
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn write_block(&self, dev: u32, blockno: u32, buf: &[u8]) -> Result<(), BlockError> {
        self.check(blockno, buf.len())?;

        // Alocar fora do Spinlock
        let mut copy = Box::new([0u8; BSIZE]);
        copy.copy_from_slice(buf);
        {
            let mut blocks = self.blocks.lock();
            let block = blocks.entry((dev, blockno)).or_default();
            block.writes += 1;
            block.data = Some(copy);
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
