//! Distribution teardown
//!
//! Removes the dependent bindings that block deletion of a CloudFront
//! distribution, then deletes it:
//!
//! 1. Read the distribution. A failed read skips the whole teardown.
//! 2. Clear origin access-control references, write, wait for `Deployed`.
//! 3. Re-read, clear the firewall (web ACL) binding, write, wait.
//! 4. Optionally disable the distribution, write, wait.
//! 5. Re-read for the freshest token and delete.
//!
//! Stages 2-4 are best-effort: a failure is recorded and the next stage runs
//! anyway. Every mutation carries the token from the most recent read or
//! write; a conflict triggers a fresh read and a recomputed patch, never a
//! blind retry with the old token. Cancellation is honoured between provider
//! calls only.

mod deleter;
mod reader;
mod report;
mod strip;
mod waiter;
mod writer;

pub use deleter::{DeleteOutcome, delete_distribution};
pub use reader::read_distribution;
pub use report::{StageFailure, TeardownReport, TeardownStage, TeardownState, write_test_records};
pub use strip::{StripOutcome, disable, strip, strip_access_control, strip_firewall};
pub use waiter::wait_for_deployed;
pub use writer::write_conditional;

use crate::config::TeardownConfig;
use cf_teardown_common::{
    DistributionId, DistributionOperations, DistributionResource, DistributionSnapshot,
    TeardownError,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// A mutating stage: how to patch, and which states mark its progress
struct StagePlan {
    stage: TeardownStage,
    patch: fn(&DistributionResource) -> StripOutcome,
    written: Option<TeardownState>,
    propagated: TeardownState,
}

const ACCESS_CONTROL: StagePlan = StagePlan {
    stage: TeardownStage::AccessControl,
    patch: strip_access_control,
    written: Some(TeardownState::AccessControlStripped),
    propagated: TeardownState::AccessControlPropagated,
};

const FIREWALL: StagePlan = StagePlan {
    stage: TeardownStage::Firewall,
    patch: strip_firewall,
    written: Some(TeardownState::FirewallStripped),
    propagated: TeardownState::FirewallPropagated,
};

const DISABLE: StagePlan = StagePlan {
    stage: TeardownStage::Disable,
    patch: disable,
    written: None,
    propagated: TeardownState::DistributionDisabled,
};

/// Drives one distribution through the teardown state machine
pub struct TeardownOrchestrator<'a, D> {
    api: &'a D,
    config: TeardownConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, D: DistributionOperations> TeardownOrchestrator<'a, D> {
    pub fn new(api: &'a D, config: TeardownConfig) -> Self {
        Self {
            api,
            config,
            cancel: None,
        }
    }

    /// Stop at the next step boundary once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the full teardown. Never fails; the outcome is in the report.
    #[instrument(skip_all, fields(distribution_id = %id))]
    pub async fn run(&self, id: &DistributionId) -> TeardownReport {
        info!("Starting distribution teardown");
        let mut report = TeardownReport::new(id.clone());

        match self.execute(id, &mut report).await {
            Ok(state) => {
                let report = report.finish(state);
                info!(
                    delete_outcome = %report.delete_outcome,
                    failures = report.failures.len(),
                    "Teardown finished"
                );
                report
            }
            Err(failure) => {
                warn!(
                    stage = %failure.stage,
                    error = %failure.error,
                    "Teardown aborted"
                );
                report.record_failure(failure);
                report.finish(TeardownState::AbortedNonFatal)
            }
        }
    }

    async fn execute(
        &self,
        id: &DistributionId,
        report: &mut TeardownReport,
    ) -> Result<TeardownState, StageFailure> {
        let snapshot = self.read(id, report).await.map_err(|e| {
            warn!(error = %e, "Initial read failed, nothing to tear down");
            StageFailure::new(TeardownStage::Read, e)
        })?;
        report.enter(TeardownState::BindingsChecked);
        info!(
            access_control_bound = snapshot.resource.has_access_control_bindings(),
            firewall = %snapshot.resource.firewall_binding(),
            enabled = snapshot.resource.enabled,
            status = %snapshot.resource.status,
            "Bindings checked"
        );

        let result = self.mutate(id, &ACCESS_CONTROL, snapshot, report).await;
        self.settle(report, TeardownStage::AccessControl, result)?;

        // The token may have moved since the last stage; always start fresh
        self.checkpoint(TeardownStage::Firewall)?;
        let result = match self.read(id, report).await {
            Ok(snapshot) => {
                report.enter(TeardownState::FirewallChecked);
                self.mutate(id, &FIREWALL, snapshot, report).await
            }
            Err(e) => Err(e),
        };
        self.settle(report, TeardownStage::Firewall, result)?;

        if self.config.disable_before_delete {
            self.checkpoint(TeardownStage::Disable)?;
            let result = match self.read(id, report).await {
                Ok(snapshot) => self.mutate(id, &DISABLE, snapshot, report).await,
                Err(e) => Err(e),
            };
            self.settle(report, TeardownStage::Disable, result)?;
        }

        self.delete(id, report).await
    }

    /// Apply one stage's patch, retrying from a fresh read after conflicts.
    ///
    /// Returns without writing when the patch changes nothing.
    async fn mutate(
        &self,
        id: &DistributionId,
        plan: &StagePlan,
        mut snapshot: DistributionSnapshot,
        report: &mut TeardownReport,
    ) -> Result<(), TeardownError> {
        let mut conflicts = 0;

        loop {
            let outcome = (plan.patch)(&snapshot.resource);
            if !outcome.changed {
                info!(stage = %plan.stage, "Nothing to change, skipping write");
                return Ok(());
            }

            if !snapshot.resource.status.is_deployed() {
                info!(stage = %plan.stage, "Previous change still propagating, waiting before write");
                snapshot = self.wait(id, report).await?;
                continue;
            }

            self.check_cancelled()?;
            match write_conditional(self.api, id, &outcome.resource, &snapshot.token).await {
                Ok(token) => {
                    report.observe_token(&token);
                    if let Some(state) = plan.written {
                        report.enter(state);
                    }
                    self.check_cancelled()?;
                    self.wait(id, report).await?;
                    report.enter(plan.propagated);
                    return Ok(());
                }
                Err(e) if e.is_conflict() && conflicts < self.config.conflict_retries => {
                    conflicts += 1;
                    warn!(
                        stage = %plan.stage,
                        stale_token = %snapshot.token,
                        attempt = conflicts,
                        "Concurrency conflict, re-reading before retry"
                    );
                    self.check_cancelled()?;
                    snapshot = self.read(id, report).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn delete(
        &self,
        id: &DistributionId,
        report: &mut TeardownReport,
    ) -> Result<TeardownState, StageFailure> {
        let mut conflicts = 0;

        loop {
            self.checkpoint(TeardownStage::Delete)?;

            let snapshot = match self.read_deployed(id, report).await {
                Ok(snapshot) => snapshot,
                Err(e) if e.is_not_found() => {
                    info!("Distribution already gone");
                    report.delete_outcome = DeleteOutcome::AlreadyDeleted;
                    return Ok(TeardownState::Deleted);
                }
                Err(e) => return Err(self.delete_failed(report, e)),
            };

            self.checkpoint(TeardownStage::Delete)?;
            match delete_distribution(self.api, id, &snapshot.token).await {
                Ok(outcome) => {
                    report.delete_outcome = outcome;
                    return Ok(TeardownState::Deleted);
                }
                Err(e) if e.is_conflict() && conflicts < self.config.conflict_retries => {
                    conflicts += 1;
                    warn!(
                        stale_token = %snapshot.token,
                        attempt = conflicts,
                        "Concurrency conflict on delete, re-reading before retry"
                    );
                }
                Err(e) => return Err(self.delete_failed(report, e)),
            }
        }
    }

    fn delete_failed(&self, report: &mut TeardownReport, error: TeardownError) -> StageFailure {
        if !matches!(error, TeardownError::Cancelled) {
            report.delete_outcome = DeleteOutcome::Failed;
        }
        StageFailure::new(TeardownStage::Delete, error)
    }

    /// Read, then wait out any change still in flight
    async fn read_deployed(
        &self,
        id: &DistributionId,
        report: &mut TeardownReport,
    ) -> Result<DistributionSnapshot, TeardownError> {
        let snapshot = self.read(id, report).await?;
        if snapshot.resource.status.is_deployed() {
            return Ok(snapshot);
        }
        self.check_cancelled()?;
        self.wait(id, report).await
    }

    async fn read(
        &self,
        id: &DistributionId,
        report: &mut TeardownReport,
    ) -> Result<DistributionSnapshot, TeardownError> {
        let snapshot = read_distribution(self.api, id, self.config.read_retries).await?;
        report.observe_token(&snapshot.token);
        Ok(snapshot)
    }

    async fn wait(
        &self,
        id: &DistributionId,
        report: &mut TeardownReport,
    ) -> Result<DistributionSnapshot, TeardownError> {
        let snapshot =
            wait_for_deployed(self.api, id, &self.config.wait, self.cancel.as_ref()).await?;
        report.observe_token(&snapshot.token);
        Ok(snapshot)
    }

    /// Record a best-effort stage failure and carry on; only cancellation stops the run
    fn settle(
        &self,
        report: &mut TeardownReport,
        stage: TeardownStage,
        result: Result<(), TeardownError>,
    ) -> Result<(), StageFailure> {
        match result {
            Ok(()) => Ok(()),
            Err(TeardownError::Cancelled) => Err(StageFailure::new(stage, TeardownError::Cancelled)),
            Err(e) => {
                warn!(stage = %stage, error = %e, "Stage failed, continuing teardown");
                report.record_failure(StageFailure::new(stage, e));
                Ok(())
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), TeardownError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(TeardownError::Cancelled),
            _ => Ok(()),
        }
    }

    fn checkpoint(&self, stage: TeardownStage) -> Result<(), StageFailure> {
        self.check_cancelled()
            .map_err(|e| StageFailure::new(stage, e))
    }
}
