//! # Testes dos Pools
//!
//! - `pmm_test.rs` - FramePool (partições, roubo, OOM, junk)
//!
//! Os testes do buffer cache ficam em `fs::test`.

pub mod pmm_test;

pub use pmm_test::PMM_TESTS;

use crate::klib::test_framework::{run_test_suite, SuiteReport};

/// Executa as suites do PMM e do buffer cache no boot
pub fn run_pool_tests() -> SuiteReport {
    crate::kinfo!("╔════════════════════════════════════════╗");
    crate::kinfo!("║     🧪 TESTES DOS POOLS                ║");
    crate::kinfo!("╚════════════════════════════════════════╝");

    let pmm = run_test_suite("PMM", PMM_TESTS);
    let bcache = run_test_suite("BCache", crate::fs::test::BCACHE_TESTS);

    let total = SuiteReport {
        passed: pmm.passed + bcache.passed,
        failed: pmm.failed + bcache.failed,
        skipped: pmm.skipped + bcache.skipped,
    };

    if total.all_passed() {
        crate::kok!("Pools validados");
    } else {
        crate::kfail!("Pools com falhas");
    }
    total
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_pool_suites_pass() {
        #[cfg(feature = "std")]
        crate::hal::host::install_host();
        let report = super::run_pool_tests();
        assert_eq!(report.failed, 0);
        assert!(report.passed > 0);
    }
}
