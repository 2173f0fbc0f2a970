use core::sync::atomic::{AtomicUsize, Ordering};

use alloc::vec::Vec;

/// Contadores do PMM (relaxados: diagnóstico, não sincronização)
#[derive(Debug, Default)]
pub struct PmmStats {
    pub total_frames: usize,
    pub used_frames: AtomicUsize,
    pub allocs: AtomicUsize,
    pub frees: AtomicUsize,
    pub rebalances: AtomicUsize,
    pub frames_stolen: AtomicUsize,
    pub failed_allocs: AtomicUsize,
}

impl PmmStats {
    pub const fn new(total_frames: usize) -> Self {
        Self {
            total_frames,
            used_frames: AtomicUsize::new(0),
            allocs: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            rebalances: AtomicUsize::new(0),
            frames_stolen: AtomicUsize::new(0),
            failed_allocs: AtomicUsize::new(0),
        }
    }

    pub fn inc_alloc(&self) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.used_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
        self.used_frames.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_rebalance(&self, stolen: usize) {
        self.rebalances.fetch_add(1, Ordering::Relaxed);
        self.frames_stolen.fetch_add(stolen, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed_allocs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn used(&self) -> usize {
        self.used_frames.load(Ordering::Relaxed)
    }
}

/// Foto consistente das free lists (todas as partições travadas)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Frames livres por partição
    pub free_per_partition: Vec<usize>,
    /// Total de frames do pool
    pub total_frames: usize,
}

impl PoolSnapshot {
    pub fn free_total(&self) -> usize {
        self.free_per_partition.iter().sum()
    }

    pub fn in_use(&self) -> usize {
        self.total_frames - self.free_total()
    }
}
