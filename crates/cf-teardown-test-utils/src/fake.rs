//! In-memory CloudFront
//!
//! Enforces the provider rules teardown depends on: every write and delete is
//! conditional on the current token, nothing is accepted while a change is
//! propagating, and a distribution with bindings cannot be deleted. Tokens
//! are issued as `t0`, `t1`, ... so tests can assert the exact sequence.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use cf_teardown_common::{
    ConcurrencyToken, DistributionId, DistributionOperations, DistributionResource,
    DistributionSnapshot, DistributionStatus, Origin, TeardownError,
};

/// Provider call kinds, for fault injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Update,
    Delete,
}

/// A recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get,
    Update { token: String },
    Delete { token: String },
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Self::Get => Op::Get,
            Self::Update { .. } => Op::Update,
            Self::Delete { .. } => Op::Delete,
        }
    }
}

/// A distribution with one OAC-bound origin and a web ACL, fully deployed
pub fn bound_distribution(id: &str) -> DistributionResource {
    DistributionResource {
        id: DistributionId::parse(id).expect("valid distribution id"),
        enabled: true,
        status: DistributionStatus::Deployed,
        origins: vec![Origin::new("o1").with_access_control("oac-1")],
        firewall_policy_ref: Some("waf-1".to_string()),
    }
}

#[derive(Debug)]
struct State {
    id: DistributionId,
    resource: Option<DistributionResource>,
    token: u64,
    /// Reads after a write that still observe `InProgress`
    propagation_reads: u32,
    pending_reads: u32,
    stuck: bool,
    require_disabled: bool,
    faults: HashMap<Op, VecDeque<TeardownError>>,
    /// Get numbers (1-based) before which an external writer bumps the token
    bumps_before_get: Vec<usize>,
    /// Get numbers after which an external writer bumps the token, leaving
    /// the caller holding a stale snapshot
    bumps_after_get: Vec<usize>,
    gets: usize,
    calls: Vec<Call>,
}

impl State {
    fn token(&self) -> ConcurrencyToken {
        ConcurrencyToken::new(format!("t{}", self.token))
    }

    fn next_token(&mut self) -> ConcurrencyToken {
        self.token += 1;
        self.token()
    }

    fn take_fault(&mut self, op: Op) -> Option<TeardownError> {
        self.faults.get_mut(&op).and_then(VecDeque::pop_front)
    }

    fn not_found(&self) -> TeardownError {
        TeardownError::NotFound {
            distribution_id: self.id.to_string(),
        }
    }

    /// Check existence and the `If-Match` precondition
    fn precondition(
        &self,
        id: &DistributionId,
        token: &ConcurrencyToken,
    ) -> Result<(), TeardownError> {
        if *id != self.id || self.resource.is_none() {
            return Err(self.not_found());
        }
        if *token != self.token() {
            return Err(TeardownError::ConcurrencyConflict {
                distribution_id: id.to_string(),
                token: token.to_string(),
            });
        }
        Ok(())
    }

    fn start_propagation(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            resource.status = DistributionStatus::InProgress;
        }
        self.pending_reads = self.propagation_reads;
    }
}

/// Thread-safe in-memory CloudFront holding a single distribution
#[derive(Debug)]
pub struct FakeCloudFront {
    state: Mutex<State>,
}

impl FakeCloudFront {
    /// Serve `resource` at token `t0`
    pub fn new(resource: DistributionResource) -> Self {
        Self {
            state: Mutex::new(State {
                id: resource.id.clone(),
                resource: Some(resource),
                token: 0,
                propagation_reads: 0,
                pending_reads: 0,
                stuck: false,
                require_disabled: false,
                faults: HashMap::new(),
                bumps_before_get: Vec::new(),
                bumps_after_get: Vec::new(),
                gets: 0,
                calls: Vec::new(),
            }),
        }
    }

    /// A fake that has no distribution with this ID
    pub fn missing(id: &str) -> Self {
        let fake = Self::new(bound_distribution(id));
        fake.lock().resource = None;
        fake
    }

    /// Number of reads after each write that still report `InProgress`
    pub fn with_propagation_reads(self, reads: u32) -> Self {
        {
            let mut state = self.lock();
            state.propagation_reads = reads;
            state.pending_reads = reads;
        }
        self
    }

    /// Refuse to delete an enabled distribution
    pub fn require_disabled(self) -> Self {
        self.lock().require_disabled = true;
        self
    }

    /// Keep reporting `InProgress` no matter how often it is read
    pub fn stick_in_progress(&self, stuck: bool) {
        let mut state = self.lock();
        state.stuck = stuck;
        if stuck {
            if let Some(resource) = state.resource.as_mut() {
                resource.status = DistributionStatus::InProgress;
            }
        }
    }

    /// Fail the next call of kind `op` with `error` (queued, FIFO)
    pub fn fail_next(&self, op: Op, error: TeardownError) {
        self.lock().faults.entry(op).or_default().push_back(error);
    }

    /// Simulate an unrelated external write landing just before get number `nth`
    pub fn bump_token_on_get(&self, nth: usize) {
        self.lock().bumps_before_get.push(nth);
    }

    /// Simulate an unrelated external write landing right after get number `nth`
    pub fn bump_token_after_get(&self, nth: usize) {
        self.lock().bumps_after_get.push(nth);
    }

    /// Simulate an unrelated external write right now
    pub fn bump_token(&self) {
        self.lock().next_token();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Tokens submitted with update calls, in order
    pub fn update_tokens(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Update { token } => Some(token.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn current(&self) -> Option<DistributionResource> {
        self.lock().resource.clone()
    }

    pub fn current_token(&self) -> ConcurrencyToken {
        self.lock().token()
    }

    pub fn is_deleted(&self) -> bool {
        self.lock().resource.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the assertions
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DistributionOperations for FakeCloudFront {
    async fn get_distribution(
        &self,
        id: &DistributionId,
    ) -> Result<DistributionSnapshot, TeardownError> {
        let mut state = self.lock();
        state.calls.push(Call::Get);
        state.gets += 1;

        let gets = state.gets;
        if state.bumps_before_get.contains(&gets) {
            state.next_token();
        }
        if let Some(e) = state.take_fault(Op::Get) {
            return Err(e);
        }
        if *id != state.id {
            return Err(state.not_found());
        }

        let stuck = state.stuck;
        let settle = state.pending_reads == 0;
        if !settle {
            state.pending_reads -= 1;
        }
        let token = state.token();
        let not_found = state.not_found();
        let Some(resource) = state.resource.as_mut() else {
            return Err(not_found);
        };
        if resource.status == DistributionStatus::InProgress && settle && !stuck {
            resource.status = DistributionStatus::Deployed;
        }
        let snapshot = DistributionSnapshot {
            resource: resource.clone(),
            token,
        };

        if state.bumps_after_get.contains(&gets) {
            state.next_token();
        }
        Ok(snapshot)
    }

    async fn update_distribution(
        &self,
        id: &DistributionId,
        resource: &DistributionResource,
        token: &ConcurrencyToken,
    ) -> Result<ConcurrencyToken, TeardownError> {
        let mut state = self.lock();
        state.calls.push(Call::Update {
            token: token.to_string(),
        });

        if let Some(e) = state.take_fault(Op::Update) {
            return Err(e);
        }
        state.precondition(id, token)?;

        let not_found = state.not_found();
        let Some(current) = state.resource.as_mut() else {
            return Err(not_found);
        };
        if current.status != DistributionStatus::Deployed {
            return Err(TeardownError::PropagationInProgress {
                distribution_id: id.to_string(),
            });
        }
        if let Some(unknown) = resource
            .origins
            .iter()
            .find(|o| !current.origins.iter().any(|c| c.id == o.id))
        {
            return Err(TeardownError::RejectedUpdate {
                code: Some("InvalidArgument".to_string()),
                message: format!("Unknown origin '{}'", unknown.id),
            });
        }

        current.enabled = resource.enabled;
        current.origins = resource.origins.clone();
        current.firewall_policy_ref = resource.firewall_policy_ref.clone();
        state.start_propagation();

        Ok(state.next_token())
    }

    async fn delete_distribution(
        &self,
        id: &DistributionId,
        token: &ConcurrencyToken,
    ) -> Result<(), TeardownError> {
        let mut state = self.lock();
        state.calls.push(Call::Delete {
            token: token.to_string(),
        });

        if let Some(e) = state.take_fault(Op::Delete) {
            return Err(e);
        }
        state.precondition(id, token)?;

        let require_disabled = state.require_disabled;
        let Some(current) = state.resource.as_ref() else {
            return Err(state.not_found());
        };
        let distribution_id = id.to_string();
        if current.status != DistributionStatus::Deployed {
            return Err(TeardownError::PropagationInProgress { distribution_id });
        }
        if current.has_dependent_bindings() {
            return Err(TeardownError::DependentBindingsPresent { distribution_id });
        }
        if require_disabled && current.enabled {
            return Err(TeardownError::DistributionNotDisabled { distribution_id });
        }

        state.resource = None;
        Ok(())
    }
}
