//! ObservationScope: begin/complete logging around a multi-step operation
//!
//! - `{NAME}_BEGIN` on creation (INFO)
//! - `{NAME}_COMPLETE` on `complete()` (INFO), with `elapsed_ms`
//! - `{NAME}_FAILED` on `fail()` (ERROR) or `fail_fatal()` (FATAL)
//! - `{NAME}_INCOMPLETE` if dropped without an outcome (WARN)

use std::time::Instant;

use super::logger::Logger;

/// A scope that logs its own start and outcome
pub struct ObservationScope {
    name: &'static str,
    started: Instant,
    completed: bool,
}

impl ObservationScope {
    /// Opens a scope and logs `{name}_BEGIN`.
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Opens a scope, attaching `fields` to the BEGIN event.
    pub fn with_fields(name: &'static str, fields: &[(&str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        Self {
            name,
            started: Instant::now(),
            completed: false,
        }
    }

    /// Logs `{name}_COMPLETE` with the elapsed time and `fields`.
    pub fn complete(mut self, fields: &[(&str, &str)]) {
        self.completed = true;
        let elapsed = self.elapsed_ms();
        let mut all_fields: Vec<(&str, &str)> = fields.to_vec();
        all_fields.push(("elapsed_ms", elapsed.as_str()));
        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Logs `{name}_FAILED` at ERROR level.
    pub fn fail(mut self, reason: &str) {
        self.completed = true;
        Logger::error(&format!("{}_FAILED", self.name), &[("reason", reason)]);
    }

    /// Logs `{name}_FAILED` at FATAL level.
    pub fn fail_fatal(mut self, reason: &str) {
        self.completed = true;
        Logger::fatal(&format!("{}_FAILED", self.name), &[("reason", reason)]);
    }

    /// Milliseconds since the scope opened, as a log field value.
    pub fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }

    /// Check if the scope has an outcome
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scope_is_open() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_completed());
        scope.complete(&[]);
    }

    #[test]
    fn test_scope_with_fields_and_complete() {
        let scope = ObservationScope::with_fields("TEST", &[("pending", "3")]);
        scope.complete(&[("published", "3")]);
    }

    #[test]
    fn test_scope_fail() {
        ObservationScope::new("TEST").fail("publish rejected");
        ObservationScope::new("TEST").fail_fatal("store commit failed");
    }

    #[test]
    fn test_scope_drop_without_outcome_does_not_panic() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_elapsed_ms_parses() {
        let scope = ObservationScope::new("TEST");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let ms: u64 = scope.elapsed_ms().parse().unwrap();
        assert!(ms >= 5);
        scope.complete(&[]);
    }
}
