//! Testes do PMM (Physical Memory Manager)

use alloc::vec::Vec;

use crate::klib::test_framework::{TestCase, TestResult};
use crate::mm::config::{PoolConfig, ALLOC_JUNK, PAGE_SIZE};
use crate::mm::error::MmError;
use crate::mm::pmm::FramePool;

/// Testes do PMM
pub const PMM_TESTS: &[TestCase] = &[
    TestCase::new("pmm_alloc_free", test_alloc_free),
    TestCase::new("pmm_frame_alignment", test_frame_alignment),
    TestCase::new("pmm_rebalance_steals_half", test_rebalance),
    TestCase::new("pmm_exhaustion", test_exhaustion),
    TestCase::new("pmm_alloc_junk", test_alloc_junk),
];

fn pool(frames: usize, partitions: usize) -> Option<FramePool> {
    match FramePool::hosted(frames, PoolConfig::new(partitions)) {
        Ok(p) => Some(p),
        Err(e) => {
            crate::kerror!("(PMM) Falha ao criar pool de teste");
            crate::kerror!(e.as_str());
            None
        }
    }
}

/// Alocar e devolver 10 frames
fn test_alloc_free() -> TestResult {
    let Some(pmm) = pool(16, 2) else {
        return TestResult::Fail;
    };

    let mut frames = Vec::new();
    for i in 0..10 {
        match pmm.alloc_on(i) {
            Ok(f) => frames.push(f),
            Err(_) => {
                crate::kerror!("(PMM) OOM ao alocar frame índice=", i);
                return TestResult::Fail;
            }
        }
    }
    crate::ktrace!("(PMM) 10 frames alocados OK");

    for f in frames {
        pmm.free_on(0, f);
    }

    if pmm.snapshot().free_total() != 16 {
        crate::kerror!("(PMM) Frames perdidos após free");
        return TestResult::Fail;
    }
    TestResult::Pass
}

/// Todo frame entregue é alinhado a página
fn test_frame_alignment() -> TestResult {
    let Some(pmm) = pool(8, 4) else {
        return TestResult::Fail;
    };

    for i in 0..8 {
        let Ok(frame) = pmm.alloc_on(i) else {
            return TestResult::Fail;
        };
        if frame.addr() % PAGE_SIZE as u64 != 0 {
            crate::kerror!("(PMM) Frame desalinhado em=", frame.addr());
            return TestResult::Fail;
        }
        pmm.free_on(i, frame);
    }
    TestResult::Pass
}

/// 8 frames / 2 partições: o 5º alloc na partição 0 rouba 2 da 1
fn test_rebalance() -> TestResult {
    let Some(pmm) = pool(8, 2) else {
        return TestResult::Fail;
    };

    let mut held = Vec::new();
    for _ in 0..5 {
        match pmm.alloc_on(0) {
            Ok(f) => held.push(f),
            Err(_) => return TestResult::Fail,
        }
    }

    let snap = pmm.snapshot();
    if snap.free_per_partition[0] != 1 || snap.free_per_partition[1] != 2 {
        crate::kerror!("(PMM) Rebalance inesperado. p1=", snap.free_per_partition[1]);
        return TestResult::Fail;
    }

    for f in held {
        pmm.free_on(1, f);
    }
    TestResult::Pass
}

/// OOM só depois de todas as partições vazias
fn test_exhaustion() -> TestResult {
    let Some(pmm) = pool(4, 4) else {
        return TestResult::Fail;
    };

    let mut held = Vec::new();
    for _ in 0..4 {
        match pmm.alloc_on(2) {
            Ok(f) => held.push(f),
            Err(_) => return TestResult::Fail,
        }
    }

    let result = match pmm.alloc_on(2) {
        Err(MmError::OutOfMemory) => TestResult::Pass,
        _ => TestResult::Fail,
    };

    for f in held {
        pmm.free_on(0, f);
    }
    result
}

/// Frame entregue vem preenchido com ALLOC_JUNK
fn test_alloc_junk() -> TestResult {
    let Some(pmm) = pool(2, 1) else {
        return TestResult::Fail;
    };
    let Ok(f) = pmm.alloc() else {
        return TestResult::Fail;
    };

    // SAFETY: frame recém-alocado, único dono
    let ok = unsafe { pmm.frame_bytes(&f) }.iter().all(|&b| b == ALLOC_JUNK);
    pmm.free(f);

    if ok {
        TestResult::Pass
    } else {
        crate::kerror!("(PMM) Frame sem ALLOC_JUNK");
        TestResult::Fail
    }
}
