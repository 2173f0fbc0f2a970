//! # BufferCache
//!
//! ## Busca
//!
//! 1. Bucket home (`hash(dev, blockno) % nbuckets`), sob o lock dele.
//! 2. Demais buckets em rotação a partir de `home + 1`, um lock por vez.
//!    Uma chave pode viver fora do home se foi admitida quando o home
//!    estava cheio.
//!
//! ## Admissão (miss)
//!
//! Sob o lock de admissão: repete a busca (outro contexto pode ter
//! admitido a mesma chave enquanto isso) e então percorre os buckets a
//! partir do home; no primeiro com `free > 0`, re-associa um slot ocioso.
//! Nenhum slot ocioso em lugar nenhum: panic.
//!
//! ## Ordem de lock
//!
//! `admission` → um lock de bucket por vez → (solto) → SleepLock do buffer.
//! Nunca dois buckets ao mesmo tempo. I/O de disco só com o SleepLock.

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::bucket::Bucket;
use super::buf::{BlockKey, BufFlags, BufGuard, SlotRelease};
use super::stats::CacheStats;
use crate::drivers::block::BlockDevice;
use crate::mm::config::{CacheConfig, BSIZE, DEV_PRIME};
use crate::mm::error::MmResult;
use crate::sync::Spinlock;
use core::mem::ManuallyDrop;

/// Onde a busca achou a chave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Found {
    Home,
    Fallback,
}

/// Buffer cache particionado em buckets
pub struct BufferCache<D: BlockDevice> {
    device: D,
    buckets: Box<[Bucket]>,
    /// Serializa admissões (nunca tomado no caminho de hit)
    admission: Spinlock<()>,
    config: CacheConfig,
    stats: CacheStats,
}

impl<D: BlockDevice> BufferCache<D> {
    pub fn new(device: D, config: CacheConfig) -> MmResult<Self> {
        config.validate()?;

        let buckets: Vec<Bucket> = (0..config.buckets)
            .map(|_| Bucket::new(config.slots_per_bucket))
            .collect();

        crate::kinfo!("(BCACHE) Buckets=", config.buckets);
        crate::kinfo!("(BCACHE) Slots por bucket=", config.slots_per_bucket);

        Ok(Self {
            device,
            buckets: buckets.into_boxed_slice(),
            admission: Spinlock::new(()),
            config,
            stats: CacheStats::new(),
        })
    }

    /// Cache com a geometria padrão (`NBUCKET` × `BUCKET_SLOTS`)
    pub fn with_defaults(device: D) -> MmResult<Self> {
        Self::new(device, CacheConfig::default())
    }

    /// Bucket home de um bloco
    #[inline]
    pub fn home_bucket(&self, dev: u32, blockno: u32) -> usize {
        ((dev as u64 * DEV_PRIME + blockno as u64) % self.buckets.len() as u64) as usize
    }

    // =========================================================================
    // AQUISIÇÃO
    // =========================================================================

    /// Acesso exclusivo ao buffer de `(dev, blockno)`.
    ///
    /// Dorme se outro holder estiver com o buffer. O conteúdo pode não ser
    /// válido; use [`read`](Self::read) para garantir.
    pub fn get(&self, dev: u32, blockno: u32) -> BufGuard<'_> {
        let key = BlockKey::new(dev, blockno);
        let home = self.home_bucket(dev, blockno);

        let (bucket, slot) = match self.lookup(key, home) {
            Some((b, s, found)) => {
                self.count_hit(found);
                (b, s)
            }
            None => self.admit_or_find(key, home),
        };

        // Sem nenhum Spinlock tomado: pode dormir
        let buf = &self.buckets[bucket].bufs[slot];
        let data = buf.data.lock();

        BufGuard {
            owner: self,
            bucket,
            slot,
            key,
            buf,
            data: ManuallyDrop::new(data),
        }
    }

    /// Como [`get`](Self::get), com conteúdo lido do disco se necessário.
    ///
    /// O dispositivo é consultado no máximo uma vez por admissão.
    pub fn read(&self, dev: u32, blockno: u32) -> BufGuard<'_> {
        let mut guard = self.get(dev, blockno);
        if !guard.is_valid() {
            let buf = guard.buf;
            let data: &mut [u8; BSIZE] = &mut guard.data;
            if let Err(e) = self.device.read_block(dev, blockno, data) {
                crate::kerror!("(BCACHE) Falha de leitura no bloco=", blockno);
                panic!("bread: {}", e);
            }
            CacheStats::bump(&self.stats.device_reads);
            buf.set(BufFlags::VALID);
        }
        guard
    }

    /// Busca home → rotação. Incrementa o refcnt se achar.
    fn lookup(&self, key: BlockKey, home: usize) -> Option<(usize, usize, Found)> {
        let n = self.buckets.len();

        if let Some(slot) = self.buckets[home].meta.lock().acquire(key) {
            return Some((home, slot, Found::Home));
        }

        // Limitado a n - 1 buckets além do home
        (1..n).map(|i| (home + i) % n).find_map(|b| {
            let slot = self.buckets[b].meta.lock().acquire(key)?;
            Some((b, slot, Found::Fallback))
        })
    }

    /// Caminho de miss: re-busca e admite sob o lock de admissão
    fn admit_or_find(&self, key: BlockKey, home: usize) -> (usize, usize) {
        let n = self.buckets.len();
        let _admission = self.admission.lock();

        if let Some((b, s, found)) = self.lookup(key, home) {
            self.count_hit(found);
            return (b, s);
        }

        CacheStats::bump(&self.stats.misses);

        for i in 0..n {
            let b = (home + i) % n;
            let bucket = &self.buckets[b];
            let mut meta = bucket.meta.lock();

            let Some(slot) = meta.victim() else {
                continue;
            };

            meta.slots[slot].key = Some(key);
            bucket.bufs[slot].reset();
            meta.get_ref(slot);
            drop(meta);

            CacheStats::bump(&self.stats.admissions);
            if b != home {
                CacheStats::bump(&self.stats.overflow_admissions);
                crate::kdebug!("(BCACHE) Admissão fora do home. bucket=", b);
            }
            crate::ktrace!("(BCACHE) Admitido bloco=", key.blockno);
            return (b, slot);
        }

        crate::kerror!("(BCACHE) Sem buffers livres. bloco=", key.blockno);
        panic!("bget: no buffers");
    }

    fn count_hit(&self, found: Found) {
        match found {
            Found::Home => CacheStats::bump(&self.stats.hits),
            Found::Fallback => CacheStats::bump(&self.stats.fallback_hits),
        }
    }

    // =========================================================================
    // PIN
    // =========================================================================

    /// Referência extra a um bloco em cache, sem acesso exclusivo.
    ///
    /// # Panics
    ///
    /// Se o bloco não estiver em cache.
    pub fn pin(&self, dev: u32, blockno: u32) {
        let key = BlockKey::new(dev, blockno);
        let home = self.home_bucket(dev, blockno);
        if self.lookup(key, home).is_none() {
            crate::kerror!("(BCACHE) pin de bloco fora do cache. bloco=", blockno);
            panic!("bpin: bloco não está em cache");
        }
    }

    /// Desfaz um [`pin`](Self::pin).
    ///
    /// # Panics
    ///
    /// Se o bloco não estiver em cache ou o refcnt já for 0.
    pub fn unpin(&self, dev: u32, blockno: u32) {
        let key = BlockKey::new(dev, blockno);
        let home = self.home_bucket(dev, blockno);
        let n = self.buckets.len();

        for i in 0..n {
            let b = (home + i) % n;
            let mut meta = self.buckets[b].meta.lock();
            let Some(slot) = meta.slots.iter().position(|s| s.key == Some(key)) else {
                continue;
            };
            if !meta.put_ref(slot) {
                drop(meta);
                crate::kerror!("(BCACHE) unpin com refcnt 0. bloco=", blockno);
                panic!("bunpin: refcnt underflow");
            }
            return;
        }

        crate::kerror!("(BCACHE) unpin de bloco fora do cache. bloco=", blockno);
        panic!("bunpin: bloco não está em cache");
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    /// Posição atual de um bloco em cache (sem tocar no refcnt)
    pub fn locate(&self, dev: u32, blockno: u32) -> Option<(usize, usize)> {
        let key = BlockKey::new(dev, blockno);
        let home = self.home_bucket(dev, blockno);
        let n = self.buckets.len();
        (0..n).map(|i| (home + i) % n).find_map(|b| {
            let meta = self.buckets[b].meta.lock();
            let slot = meta.slots.iter().position(|s| s.key == Some(key))?;
            Some((b, slot))
        })
    }

    /// Refcnt atual de um bloco (0 se ocioso ou fora do cache)
    pub fn ref_count(&self, dev: u32, blockno: u32) -> u32 {
        self.locate(dev, blockno)
            .map_or(0, |(b, s)| self.buckets[b].meta.lock().slots[s].refcnt)
    }

    /// Slots ociosos de um bucket
    pub fn free_in(&self, bucket: usize) -> usize {
        self.buckets.get(bucket).map_or(0, |b| b.meta.lock().free)
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<D: BlockDevice> SlotRelease for BufferCache<D> {
    fn put_slot(&self, bucket: usize, slot: usize) {
        let ok = self.buckets[bucket].meta.lock().put_ref(slot);
        if !ok {
            crate::kerror!("(BCACHE) release com refcnt 0. bucket=", bucket);
            panic!("brelse: refcnt underflow");
        }
    }

    fn get_slot(&self, bucket: usize, slot: usize) {
        self.buckets[bucket].meta.lock().get_ref(slot);
    }

    fn write_through(&self, key: BlockKey, data: &[u8; BSIZE]) {
        if let Err(e) = self.device.write_block(key.dev, key.blockno, data) {
            crate::kerror!("(BCACHE) Falha de escrita no bloco=", key.blockno);
            panic!("bwrite: {}", e);
        }
        CacheStats::bump(&self.stats.device_writes);
    }
}
