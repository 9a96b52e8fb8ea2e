//! # Self-Test Harness
//!
//! A small test vector for scenario suites that run outside the unit
//! test framework, e.g. from the `selftest` binary on a target machine.
//! A vector collects named tests and executes either all of them or the
//! single one selected by a zero-based positional argument; the failure
//! count becomes the process exit code.

use log::{error, info};

/// Collects assertion results while a test runs.
#[derive(Debug, Default)]
pub struct TestContext {
    checks: usize,
    failures: usize,
}

impl TestContext {
    /// Asserts that two values are equal.
    pub fn check_eq<T: PartialEq + std::fmt::Debug>(
        &mut self,
        actual: T,
        expected: T,
        message: &str,
    ) {
        self.checks += 1;
        if actual != expected {
            self.failures += 1;
            error!("{message} (actual: {actual:?}, expected: {expected:?})");
        }
    }

    /// Asserts that a condition holds.
    pub fn check_true(&mut self, condition: bool, message: &str) {
        self.checks += 1;
        if !condition {
            self.failures += 1;
            error!("{message}");
        }
    }

    /// Asserts that a condition does not hold.
    pub fn check_false(&mut self, condition: bool, message: &str) {
        self.check_true(!condition, message);
    }

    /// Records a failure detected by the test itself.
    pub fn fail(&mut self, message: &str) {
        self.checks += 1;
        self.failures += 1;
        error!("{message}");
    }

    /// Number of assertions made.
    pub fn checks(&self) -> usize {
        self.checks
    }

    /// Number of failed assertions.
    pub fn failures(&self) -> usize {
        self.failures
    }
}

/// One named scenario test.
pub trait Test {
    /// The name reported while the test runs.
    fn name(&self) -> &str;

    /// Runs the test, reporting assertions into `context`.
    fn run(&self, context: &mut TestContext);
}

/// A collection of tests executed together.
#[derive(Default)]
pub struct TestVector {
    tests: Vec<Box<dyn Test>>,
    selected: Option<usize>,
}

impl TestVector {
    /// Creates a vector that runs every added test.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vector from command-line arguments: the first
    /// positional argument, if present, is the zero-based index of the
    /// single test to run.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let selected = args.into_iter().skip(1).find_map(|arg| arg.parse().ok());
        TestVector {
            tests: Vec::new(),
            selected,
        }
    }

    /// Adds a test.
    pub fn add_test(&mut self, test: Box<dyn Test>) {
        self.tests.push(test);
    }

    /// Executes the selected test, or all of them, and returns the
    /// total number of failed assertions.
    pub fn execute(&self) -> usize {
        let mut checks = 0;
        let mut failures = 0;
        for (index, test) in self.tests.iter().enumerate() {
            if self.selected.is_some_and(|selected| selected != index) {
                continue;
            }
            info!("Execute {}...", test.name());
            let mut context = TestContext::default();
            test.run(&mut context);
            checks += context.checks();
            failures += context.failures();
        }
        info!("Test finished! {checks} Tests, {failures} Errors.");
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Passing;

    impl Test for Passing {
        fn name(&self) -> &str {
            "passing"
        }

        fn run(&self, context: &mut TestContext) {
            context.check_eq(2 + 2, 4, "arithmetic broke");
            context.check_true(true, "unreachable");
        }
    }

    struct Failing;

    impl Test for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(&self, context: &mut TestContext) {
            context.check_eq(1, 2, "intended failure");
            context.fail("second intended failure");
        }
    }

    fn vector(selected: Option<usize>) -> TestVector {
        let mut vector = TestVector::new();
        vector.selected = selected;
        vector.add_test(Box::new(Passing));
        vector.add_test(Box::new(Failing));
        vector
    }

    #[test]
    fn executes_all_tests_by_default() {
        assert_eq!(vector(None).execute(), 2);
    }

    #[test]
    fn index_selects_a_single_test() {
        assert_eq!(vector(Some(0)).execute(), 0);
        assert_eq!(vector(Some(1)).execute(), 2);
        // An out-of-range index runs nothing.
        assert_eq!(vector(Some(9)).execute(), 0);
    }

    #[test]
    fn from_args_parses_the_first_positional() {
        let vector = TestVector::from_args(
            ["selftest", "3"].into_iter().map(String::from),
        );
        assert_eq!(vector.selected, Some(3));

        let vector = TestVector::from_args(["selftest"].into_iter().map(String::from));
        assert_eq!(vector.selected, None);
    }
}
