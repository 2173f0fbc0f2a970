//! Framework de testes do kernel
//!
//! Suites estáticas de `TestCase` executadas no boot (feature `self_test`)
//! ou pelos testes unitários no host.

/// Resultado de teste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    Skip,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Placar de uma suite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Executa suite de testes
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> SuiteReport {
    crate::klog!("=== Suite: ");
    crate::klog!(name);
    crate::knl!();

    let mut report = SuiteReport::default();

    for test in tests {
        match (test.func)() {
            TestResult::Pass => {
                crate::kok!(test.name);
                report.passed += 1;
            }
            TestResult::Fail => {
                crate::kfail!(test.name);
                report.failed += 1;
            }
            TestResult::Skip => {
                crate::kwarn!(test.name);
                report.skipped += 1;
            }
        }
    }

    crate::kinfo!("Resultados: passed=", report.passed);
    if report.failed > 0 {
        crate::kerror!("Resultados: failed=", report.failed);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> TestResult {
        TestResult::Pass
    }

    fn bad() -> TestResult {
        TestResult::Fail
    }

    fn skip() -> TestResult {
        TestResult::Skip
    }

    #[test]
    fn test_suite_counts() {
        let suite = [
            TestCase::new("ok", ok),
            TestCase::new("bad", bad),
            TestCase::new("skip", skip),
            TestCase::new("ok2", ok),
        ];
        let report = run_test_suite("demo", &suite);
        assert_eq!(
            report,
            SuiteReport {
                passed: 2,
                failed: 1,
                skipped: 1
            }
        );
        assert!(!report.all_passed());
    }
}
