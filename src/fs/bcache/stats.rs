use core::sync::atomic::{AtomicUsize, Ordering};

/// Contadores do buffer cache
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Encontrado no bucket home
    pub hits: AtomicUsize,
    /// Encontrado em outro bucket (admissão anterior por overflow)
    pub fallback_hits: AtomicUsize,
    /// Não estava em cache
    pub misses: AtomicUsize,
    /// Slots reaproveitados para uma nova chave
    pub admissions: AtomicUsize,
    /// Admissões fora do bucket home
    pub overflow_admissions: AtomicUsize,
    pub device_reads: AtomicUsize,
    pub device_writes: AtomicUsize,
}

impl CacheStats {
    pub const fn new() -> Self {
        Self {
            hits: AtomicUsize::new(0),
            fallback_hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            admissions: AtomicUsize::new(0),
            overflow_admissions: AtomicUsize::new(0),
            device_reads: AtomicUsize::new(0),
            device_writes: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(super) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Leitura pontual de um contador
    #[inline]
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}
