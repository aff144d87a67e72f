//! Teardown progress and outcome reporting

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cf_teardown_common::{ConcurrencyToken, DistributionId, TeardownError, TestRecord};
use serde::{Serialize, Serializer};
use tracing::info;

use super::deleter::DeleteOutcome;

/// Orchestrator state machine positions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr,
)]
pub enum TeardownState {
    Start,
    BindingsChecked,
    AccessControlStripped,
    AccessControlPropagated,
    FirewallChecked,
    FirewallStripped,
    FirewallPropagated,
    DistributionDisabled,
    Deleted,
    AbortedNonFatal,
}

impl TeardownState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted | Self::AbortedNonFatal)
    }
}

/// The step a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum TeardownStage {
    Read,
    AccessControl,
    Firewall,
    Disable,
    Delete,
}

fn serialize_display<T: std::fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: TeardownStage,
    #[serde(serialize_with = "serialize_display")]
    pub error: TeardownError,
}

impl StageFailure {
    pub fn new(stage: TeardownStage, error: TeardownError) -> Self {
        Self { stage, error }
    }
}

/// Everything a teardown run did.
///
/// Failures are data here, not errors: a run always produces a report.
#[derive(Debug, Clone, Serialize)]
pub struct TeardownReport {
    pub distribution_id: DistributionId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// States in the order they were entered
    pub states: Vec<TeardownState>,
    pub failures: Vec<StageFailure>,
    /// Distinct concurrency tokens in the order they were observed
    pub tokens: Vec<ConcurrencyToken>,
    pub delete_outcome: DeleteOutcome,
}

impl TeardownReport {
    pub(crate) fn new(distribution_id: DistributionId) -> Self {
        Self {
            distribution_id,
            started_at: Utc::now(),
            finished_at: None,
            states: vec![TeardownState::Start],
            failures: Vec::new(),
            tokens: Vec::new(),
            delete_outcome: DeleteOutcome::Skipped,
        }
    }

    pub(crate) fn enter(&mut self, state: TeardownState) {
        info!(distribution_id = %self.distribution_id, state = %state, "Teardown state");
        self.states.push(state);
    }

    pub(crate) fn observe_token(&mut self, token: &ConcurrencyToken) {
        if self.tokens.last() != Some(token) {
            self.tokens.push(token.clone());
        }
    }

    pub(crate) fn record_failure(&mut self, failure: StageFailure) {
        self.failures.push(failure);
    }

    pub(crate) fn finish(mut self, state: TeardownState) -> Self {
        self.enter(state);
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn final_state(&self) -> TeardownState {
        self.states.last().copied().unwrap_or(TeardownState::Start)
    }

    pub fn visited(&self, state: TeardownState) -> bool {
        self.states.contains(&state)
    }

    pub fn is_deleted(&self) -> bool {
        self.final_state() == TeardownState::Deleted
    }

    /// Whether the run stopped at the initial read without touching anything
    pub fn was_skipped(&self) -> bool {
        !self.visited(TeardownState::BindingsChecked)
    }

    pub fn failures_in(&self, stage: TeardownStage) -> impl Iterator<Item = &TeardownError> {
        self.failures
            .iter()
            .filter(move |f| f.stage == stage)
            .map(|f| &f.error)
    }

    pub fn duration(&self) -> std::time::Duration {
        self.finished_at
            .unwrap_or_else(Utc::now)
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Summarize the run as one harness record.
    pub fn to_test_record(&self, name: &str) -> TestRecord {
        if self.is_deleted() {
            return TestRecord::pass(name, self.duration());
        }

        let errors = self
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.stage, f.error))
            .collect::<Vec<_>>()
            .join("; ");

        if self.was_skipped() {
            TestRecord::skip(name, errors)
        } else {
            TestRecord::fail(name, self.duration(), errors)
        }
    }
}

/// Write harness records as pretty JSON
pub fn write_test_records(path: &Path, records: &[TestRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("Failed to serialize test records")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!(path = %path.display(), records = records.len(), "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_teardown_common::TestStatus;

    fn report() -> TeardownReport {
        TeardownReport::new(DistributionId::parse("EDFDVBD6EXAMPLE").unwrap())
    }

    #[test]
    fn tokens_are_deduplicated_in_order() {
        let mut report = report();
        for t in ["t0", "t0", "t1", "t1", "t1", "t2"] {
            report.observe_token(&ConcurrencyToken::new(t));
        }
        let tokens: Vec<_> = report.tokens.iter().map(|t| t.as_str()).collect();
        assert_eq!(tokens, ["t0", "t1", "t2"]);
    }

    #[test]
    fn skipped_run_becomes_skip_record() {
        let mut report = report();
        report.record_failure(StageFailure::new(
            TeardownStage::Read,
            TeardownError::NotFound {
                distribution_id: "EDFDVBD6EXAMPLE".to_string(),
            },
        ));
        let report = report.finish(TeardownState::AbortedNonFatal);

        assert!(report.was_skipped());
        let record = report.to_test_record("teardown");
        assert_eq!(record.status, TestStatus::Skip);
        assert!(record.error.unwrap().starts_with("Read: "));
    }

    #[test]
    fn deleted_run_passes_even_with_stage_failures() {
        let mut report = report();
        report.enter(TeardownState::BindingsChecked);
        report.record_failure(StageFailure::new(
            TeardownStage::Firewall,
            TeardownError::Transient {
                message: "throttled".to_string(),
            },
        ));
        let report = report.finish(TeardownState::Deleted);

        assert!(report.is_deleted());
        assert_eq!(report.failures_in(TeardownStage::Firewall).count(), 1);
        assert_eq!(report.to_test_record("teardown").status, TestStatus::Pass);
    }

    #[test]
    fn report_serializes_errors_as_text() {
        let mut report = report();
        report.record_failure(StageFailure::new(TeardownStage::Delete, TeardownError::Cancelled));
        let report = report.finish(TeardownState::AbortedNonFatal);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["stage"], "Delete");
        assert_eq!(json["failures"][0]["error"], "Teardown cancelled");
        assert_eq!(json["delete_outcome"], "Skipped");
        assert_eq!(json["states"][1], "AbortedNonFatal");
    }

    #[test]
    fn records_are_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-report.json");
        let records = vec![
            TestRecord::pass("apply", std::time::Duration::from_secs(2)),
            TestRecord::skip("teardown", "read failed"),
        ];

        write_test_records(&path, &records).unwrap();

        let written: Vec<TestRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, records);
    }
}
