//! The failure-reporting seam between the client and the host test framework.
//!
//! # Design
//! Every failure the client detects is pushed through a [`Reporter`] rather
//! than returned as an error value, so test code never has to unwrap. Two
//! implementations ship with the crate: [`PanicReporter`] for real tests
//! (failing means panicking the test thread) and [`FakeReporter`] for the
//! crate's own tests, which records failures without halting so scenarios
//! that are supposed to fail can be asserted on.

use std::cell::RefCell;

/// Pluggable sink for test failures.
pub trait Reporter {
    /// Record a failure message without necessarily halting execution.
    fn report(&self, message: &str);

    /// Halt the current test immediately.
    fn fail_now(&self);

    /// True when the reporter is a self-test harness that expects the
    /// scenario it observes to fail. Reaching a successful dispatch under
    /// such a reporter is itself a failure.
    fn expects_failure(&self) -> bool {
        false
    }
}

/// Production reporter: `fail_now` panics the current test with the most
/// recently reported message.
#[derive(Debug, Default)]
pub struct PanicReporter {
    messages: RefCell<Vec<String>>,
}

impl PanicReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for PanicReporter {
    fn report(&self, message: &str) {
        log::error!("{message}");
        self.messages.borrow_mut().push(message.to_string());
    }

    fn fail_now(&self) {
        let messages = self.messages.borrow();
        match messages.last() {
            Some(message) => panic!("{message}"),
            None => panic!("test failed with no reported message"),
        }
    }
}

/// Recording reporter for verifying that a scenario fails with the exact
/// message it should. Never halts.
#[derive(Debug, Default)]
pub struct FakeReporter {
    messages: RefCell<Vec<String>>,
}

impl FakeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message reported so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// True once at least one failure was reported.
    pub fn failed(&self) -> bool {
        !self.messages.borrow().is_empty()
    }
}

impl Reporter for FakeReporter {
    fn report(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }

    fn fail_now(&self) {}

    fn expects_failure(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_reporter_records_messages_in_order() {
        let reporter = FakeReporter::new();
        assert!(!reporter.failed());

        reporter.report("first");
        reporter.report("second");
        reporter.fail_now();

        assert!(reporter.failed());
        assert_eq!(reporter.messages(), vec!["first", "second"]);
        assert!(reporter.expects_failure());
    }

    #[test]
    #[should_panic(expected = "something broke")]
    fn panic_reporter_panics_with_the_last_message() {
        let reporter = PanicReporter::new();
        reporter.report("something broke");
        reporter.fail_now();
    }

    #[test]
    fn panic_reporter_does_not_expect_failure() {
        assert!(!PanicReporter::new().expects_failure());
    }
}
