//! Bucket: fatia do cache com lock próprio
//!
//! Metadados (chave, refcnt, contagem de livres) ficam sob o Spinlock do
//! bucket. O conteúdo de cada slot fica fora, no `Buf` correspondente,
//! protegido pelo SleepLock do próprio buffer.

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::buf::{Buf, BlockKey};
use crate::sync::Spinlock;

/// Metadados de um slot
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct SlotMeta {
    /// Chave atual (None = nunca usado)
    pub key: Option<BlockKey>,
    /// Holders atuais (guards + pins)
    pub refcnt: u32,
}

/// Estado protegido pelo lock do bucket
pub(super) struct BucketMeta {
    pub slots: Vec<SlotMeta>,
    /// Slots com refcnt = 0
    pub free: usize,
}

impl BucketMeta {
    /// Procura `key` e incrementa o refcnt
    pub fn acquire(&mut self, key: BlockKey) -> Option<usize> {
        let slot = self.slots.iter().position(|s| s.key == Some(key))?;
        self.get_ref(slot);
        Some(slot)
    }

    /// refcnt += 1 (0 → 1 tira o slot da contagem de livres)
    pub fn get_ref(&mut self, slot: usize) {
        let meta = &mut self.slots[slot];
        meta.refcnt += 1;
        if meta.refcnt == 1 {
            self.free -= 1;
        }
    }

    /// refcnt -= 1 (1 → 0 devolve o slot à contagem de livres).
    ///
    /// Retorna `false` se o refcnt já era 0.
    pub fn put_ref(&mut self, slot: usize) -> bool {
        let meta = &mut self.slots[slot];
        if meta.refcnt == 0 {
            return false;
        }
        meta.refcnt -= 1;
        if meta.refcnt == 0 {
            self.free += 1;
        }
        true
    }

    /// Slot com refcnt 0 para reaproveitar.
    ///
    /// Prefere slots nunca usados; entre os ociosos, o de menor índice.
    pub fn victim(&self) -> Option<usize> {
        if self.free == 0 {
            return None;
        }
        self.slots
            .iter()
            .position(|s| s.key.is_none())
            .or_else(|| self.slots.iter().position(|s| s.refcnt == 0))
    }
}

/// Um bucket do cache
pub(super) struct Bucket {
    pub meta: Spinlock<BucketMeta>,
    pub bufs: Box<[Buf]>,
}

impl Bucket {
    pub fn new(slots: usize) -> Self {
        let bufs: Vec<Buf> = (0..slots).map(|_| Buf::new()).collect();
        Self {
            meta: Spinlock::new(BucketMeta {
                slots: alloc::vec![SlotMeta::default(); slots],
                free: slots,
            }),
            bufs: bufs.into_boxed_slice(),
        }
    }
}
