use crate::source::{QuotaResource, QuotaSnapshot};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct QuotaState {
    core: Option<QuotaSnapshot>,
    graphql: Option<QuotaSnapshot>,
    calls: u64,
}

impl QuotaState {
    const fn slot(&mut self, resource: QuotaResource) -> &mut Option<QuotaSnapshot> {
        match resource {
            QuotaResource::Core => &mut self.core,
            QuotaResource::GraphQl => &mut self.graphql,
        }
    }
}

/// Quota and call accounting shared by every concurrent fetch of a run.
///
/// Each budget is tracked on its own, so GraphQL calls never spend or reveal the REST quota
/// and vice versa. All updates happen under a single lock so no completed call is ever lost.
#[derive(Debug, Default)]
pub struct QuotaCounter {
    state: Mutex<QuotaState>,
}

impl QuotaCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed call against `resource` and the quota it reported, if any.
    ///
    /// A report is filed under the budget it names. Without one, the known remaining quota of
    /// `resource` is decremented by one.
    pub fn record_call(&self, resource: QuotaResource, reported: Option<QuotaSnapshot>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        match reported {
            Some(snapshot) => merge(state.slot(snapshot.resource), snapshot),
            None => {
                if let Some(known) = state.slot(resource).as_mut() {
                    known.remaining = known.remaining.saturating_sub(1);
                }
            }
        }
    }

    /// Merges a snapshot obtained outside of a counted call.
    pub fn observe(&self, snapshot: QuotaSnapshot) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        merge(state.slot(snapshot.resource), snapshot);
    }

    #[must_use]
    pub fn snapshot(&self, resource: QuotaResource) -> Option<QuotaSnapshot> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner).slot(resource)
    }

    #[must_use]
    pub fn calls(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).calls
    }
}

/// A newer reset window replaces the known snapshot; within the same window the lower remaining count wins,
/// since responses can complete out of order.
fn merge(known: &mut Option<QuotaSnapshot>, incoming: QuotaSnapshot) {
    match known {
        None => *known = Some(incoming),
        Some(current) if incoming.reset_at > current.reset_at => *current = incoming,
        Some(current) if incoming.reset_at == current.reset_at => {
            current.remaining = current.remaining.min(incoming.remaining);
            current.limit = current.limit.max(incoming.limit);
        }
        Some(_) => {}
    }
}
