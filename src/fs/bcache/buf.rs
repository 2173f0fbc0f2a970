//! Buffers e o guard de acesso exclusivo

use core::mem::ManuallyDrop;
use core::sync::atomic::{AtomicU8, Ordering};

use bitflags::bitflags;

use crate::mm::config::BSIZE;
use crate::sync::{SleepLock, SleepLockGuard};

/// Identidade de um bloco: (dispositivo, número do bloco)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockKey {
    pub dev: u32,
    pub blockno: u32,
}

impl BlockKey {
    pub const fn new(dev: u32, blockno: u32) -> Self {
        Self { dev, blockno }
    }
}

bitflags! {
    /// Estado do conteúdo de um buffer
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BufFlags: u8 {
        /// Conteúdo reflete o disco
        const VALID = 1 << 0;
        /// Modificado desde o último write
        const DIRTY = 1 << 1;
    }
}

/// Um slot de buffer.
///
/// As flags ficam fora do SleepLock: a admissão zera `VALID` sob o lock do
/// bucket, num slot com refcnt 0 que ninguém segura.
pub(super) struct Buf {
    flags: AtomicU8,
    pub data: SleepLock<[u8; BSIZE]>,
}

impl Buf {
    pub fn new() -> Self {
        Self {
            flags: AtomicU8::new(0),
            data: SleepLock::new([0u8; BSIZE]),
        }
    }

    #[inline]
    pub fn flags(&self) -> BufFlags {
        BufFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, f: BufFlags) {
        self.flags.fetch_or(f.bits(), Ordering::AcqRel);
    }

    #[inline]
    pub fn clear(&self, f: BufFlags) {
        self.flags.fetch_and(!f.bits(), Ordering::AcqRel);
    }

    /// Zera tudo (slot re-associado a outra chave)
    #[inline]
    pub fn reset(&self) {
        self.flags.store(0, Ordering::Release);
    }
}

/// Dono do acesso exclusivo a um buffer.
///
/// Criado por `BufferCache::get`/`read`. Soltar o guard (drop ou
/// [`BufGuard::release`]) libera o SleepLock e depois decrementa o refcnt
/// do slot. Não é `Send`: o SleepLock pertence à task que o adquiriu.
pub struct BufGuard<'a> {
    pub(super) owner: &'a dyn SlotRelease,
    pub(super) bucket: usize,
    pub(super) slot: usize,
    pub(super) key: BlockKey,
    pub(super) buf: &'a Buf,
    /// Solto manualmente no Drop, antes do refcnt
    pub(super) data: ManuallyDrop<SleepLockGuard<'a, [u8; BSIZE]>>,
}

/// Lado do cache que o guard chama ao ser solto
pub(super) trait SlotRelease: Sync {
    /// refcnt -= 1 no slot (chamado já sem o SleepLock)
    fn put_slot(&self, bucket: usize, slot: usize);
    /// refcnt += 1 no slot
    fn get_slot(&self, bucket: usize, slot: usize);
    /// Escrita síncrona no dispositivo
    fn write_through(&self, key: BlockKey, data: &[u8; BSIZE]);
}

impl<'a> BufGuard<'a> {
    pub fn key(&self) -> BlockKey {
        self.key
    }

    pub fn dev(&self) -> u32 {
        self.key.dev
    }

    pub fn blockno(&self) -> u32 {
        self.key.blockno
    }

    /// Conteúdo reflete o disco?
    pub fn is_valid(&self) -> bool {
        self.buf.flags().contains(BufFlags::VALID)
    }

    /// Modificado desde o último `write`?
    pub fn is_dirty(&self) -> bool {
        self.buf.flags().contains(BufFlags::DIRTY)
    }

    /// Posição (bucket, slot) no cache
    pub fn location(&self) -> (usize, usize) {
        (self.bucket, self.slot)
    }

    pub fn data(&self) -> &[u8; BSIZE] {
        &self.data
    }

    /// Conteúdo mutável; marca o buffer como sujo
    pub fn data_mut(&mut self) -> &mut [u8; BSIZE] {
        self.buf.set(BufFlags::DIRTY);
        &mut self.data
    }

    /// Grava o conteúdo no disco (síncrono).
    ///
    /// # Panics
    ///
    /// Se a task atual não segura o SleepLock do buffer.
    pub fn write(&mut self) {
        if !self.data.lock_ref().holding() {
            crate::kerror!("(BCACHE) write sem segurar o buffer. bloco=", self.key.blockno);
            panic!("bwrite");
        }

        self.owner.write_through(self.key, &self.data);
        self.buf.clear(BufFlags::DIRTY);
    }

    /// Referência extra que mantém o slot no cache além deste guard.
    ///
    /// Desfeita com `BufferCache::unpin`.
    pub fn pin(&self) {
        self.owner.get_slot(self.bucket, self.slot);
    }

    /// Solta o buffer (equivalente ao drop)
    pub fn release(self) {}
}

impl Drop for BufGuard<'_> {
    fn drop(&mut self) {
        // SleepLock primeiro, refcnt depois
        if !self.data.lock_ref().holding() {
            crate::kerror!("(BCACHE) release sem segurar o buffer. bloco=", self.key.blockno);
            panic!("brelse");
        }
        // SAFETY: único drop do guard; o campo não é mais usado
        unsafe { ManuallyDrop::drop(&mut self.data) };
        self.owner.put_slot(self.bucket, self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let buf = Buf::new();
        assert!(buf.flags().is_empty());
        buf.set(BufFlags::VALID | BufFlags::DIRTY);
        buf.clear(BufFlags::DIRTY);
        assert_eq!(buf.flags(), BufFlags::VALID);
        buf.reset();
        assert!(buf.flags().is_empty());
    }
}
