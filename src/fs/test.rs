//! Testes do Buffer Cache

use crate::drivers::block::RamDisk;
use crate::fs::bcache::{BufferCache, CacheConfig};
use crate::klib::test_framework::{TestCase, TestResult};

/// Casos de teste do bcache
pub const BCACHE_TESTS: &[TestCase] = &[
    TestCase::new("bcache_read_populates_once", test_read_populates_once),
    TestCase::new("bcache_overflow_fallback", test_overflow_fallback),
    TestCase::new("bcache_write_round_trip", test_write_round_trip),
    TestCase::new("bcache_pin_survives_churn", test_pin_survives_churn),
];

fn cache(buckets: usize, slots: usize) -> Option<BufferCache<RamDisk>> {
    BufferCache::new(RamDisk::new(), CacheConfig::new(buckets, slots)).ok()
}

/// Dois `read` do mesmo bloco: uma leitura de disco
fn test_read_populates_once() -> TestResult {
    let Some(c) = cache(3, 2) else {
        return TestResult::Fail;
    };

    drop(c.read(1, 5));
    drop(c.read(1, 5));

    if c.device().reads_of(1, 5) != 1 {
        crate::kerror!("(BCACHE) Leituras repetidas=", c.device().reads_of(1, 5));
        return TestResult::Fail;
    }
    TestResult::Pass
}

/// Home cheio: a chave entra em outro bucket e é achada lá depois
fn test_overflow_fallback() -> TestResult {
    let Some(c) = cache(2, 2) else {
        return TestResult::Fail;
    };

    let full = c.home_bucket(1, 100);
    if c.home_bucket(1, 102) != full || c.home_bucket(1, 104) != full {
        return TestResult::Skip;
    }

    let a = c.get(1, 100);
    let b = c.get(1, 104);

    let placed = c.get(1, 102).location().0;
    let found = c.get(1, 102).location().0;

    drop((a, b));

    if placed == full || found != placed {
        crate::kerror!("(BCACHE) Overflow no bucket errado=", placed);
        return TestResult::Fail;
    }
    TestResult::Pass
}

/// write + expulsão + read devolve o conteúdo gravado
fn test_write_round_trip() -> TestResult {
    let Some(c) = cache(1, 1) else {
        return TestResult::Fail;
    };

    {
        let mut g = c.read(1, 7);
        g.data_mut()[0] = 0x5A;
        g.write();
    }
    drop(c.read(1, 8));

    if c.read(1, 7).data()[0] != 0x5A {
        crate::kerror!("(BCACHE) Conteúdo perdido no bloco=", 7);
        return TestResult::Fail;
    }
    TestResult::Pass
}

/// Slot fixado não é reaproveitado
fn test_pin_survives_churn() -> TestResult {
    let Some(c) = cache(1, 2) else {
        return TestResult::Fail;
    };

    c.read(1, 1).pin();
    let at = c.locate(1, 1);

    for b in 10..30 {
        drop(c.read(1, b));
    }

    let ok = at.is_some() && c.locate(1, 1) == at && c.ref_count(1, 1) == 1;
    c.unpin(1, 1);

    if ok {
        TestResult::Pass
    } else {
        crate::kerror!("(BCACHE) Slot fixado foi reaproveitado");
        TestResult::Fail
    }
}
