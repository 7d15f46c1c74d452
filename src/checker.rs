use log::{debug, info, warn};

use crate::aggregator::{collect_balances, validate_address, NetworkContext};
use crate::chain::ChainClient;
use crate::error::CheckError;
use crate::types::{BalanceReport, BalanceRequest};

/// Where a [`BalanceChecker`] is in its check cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Idle,
    Validating,
    Fetching,
    Rendering,
}

/// Current state plus every state the last check passed through
#[derive(Debug)]
struct StateLog {
    current: CheckState,
    transitions: Vec<CheckState>,
}

impl StateLog {
    fn new() -> Self {
        Self {
            current: CheckState::Idle,
            transitions: Vec::new(),
        }
    }

    fn set(&mut self, next: CheckState) {
        debug!("Check state {:?} -> {:?}", self.current, next);
        self.current = next;
        self.transitions.push(next);
    }
}

/// Puts the checker back to `Idle` when dropped, including when the check
/// future is dropped half way.
struct StateGuard<'a> {
    log: &'a mut StateLog,
}

impl<'a> StateGuard<'a> {
    fn enter(log: &'a mut StateLog) -> Self {
        log.transitions.clear();
        log.set(CheckState::Validating);
        Self { log }
    }

    fn set(&mut self, next: CheckState) {
        self.log.set(next);
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.log.set(CheckState::Idle);
    }
}

/// Session front ends drive: the selected network plus the outcome of the
/// last check.
pub struct BalanceChecker<C> {
    context: NetworkContext<C>,
    state: StateLog,
    last_report: Option<BalanceReport>,
    last_error: Option<String>,
}

impl<C: ChainClient> BalanceChecker<C> {
    pub fn new(context: NetworkContext<C>) -> Self {
        info!("Using {}", context.network.name);
        Self {
            context,
            state: StateLog::new(),
            last_report: None,
            last_error: None,
        }
    }

    /// Select another network. Anything shown for the previous one is cleared.
    pub fn switch_network(&mut self, context: NetworkContext<C>) {
        info!("Switching to {}", context.network.name);
        self.context = context;
        self.last_report = None;
        self.last_error = None;
    }

    pub fn network(&self) -> &NetworkContext<C> {
        &self.context
    }

    pub fn state(&self) -> CheckState {
        self.state.current
    }

    /// States entered during the most recent check, ending with `Idle`
    pub fn transitions(&self) -> &[CheckState] {
        &self.state.transitions
    }

    pub fn last_report(&self) -> Option<&BalanceReport> {
        self.last_report.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Run one check. The previous report and error are cleared first.
    ///
    /// Validation errors are returned without entering `Fetching`, so no RPC
    /// call is made; the message is also kept in
    /// [`last_error`](Self::last_error).
    pub async fn check(&mut self, request: &BalanceRequest) -> Result<&BalanceReport, CheckError> {
        self.last_report = None;
        self.last_error = None;

        let mut guard = StateGuard::enter(&mut self.state);
        let owner = match validate_address(&self.context, &request.address) {
            Ok(owner) => owner,
            Err(e) => {
                drop(guard);
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        guard.set(CheckState::Fetching);
        let report = collect_balances(&self.context, owner, request).await;
        let failed = report.results.iter().filter(|r| r.balance.is_sentinel()).count();
        if failed > 0 {
            warn!("{} of {} balances could not be fetched", failed, report.results.len());
        }

        guard.set(CheckState::Rendering);
        drop(guard);
        let report: &BalanceReport = self.last_report.insert(report);
        Ok(report)
    }
}
