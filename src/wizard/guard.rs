//! Request tickets that decide which gateway response is authoritative.

use std::collections::HashMap;

/// Gateway resources the wizard fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Programs,
    Calendar,
    TimeBlocks,
    Submission,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Programs => "programs",
            Self::Calendar => "calendar",
            Self::TimeBlocks => "time_blocks",
            Self::Submission => "submission",
        };
        write!(f, "{s}")
    }
}

/// Minted for every dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub resource: Resource,
    pub seq: u64,
}

/// Tracks the latest ticket per resource. Only that ticket's response may
/// be applied; anything older is stale.
#[derive(Debug, Default)]
pub struct FetchGuard {
    next_seq: u64,
    /// Latest unsettled ticket per resource.
    in_flight: HashMap<Resource, u64>,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a ticket, superseding any in-flight request for the same resource.
    pub fn issue(&mut self, resource: Resource) -> Ticket {
        self.next_seq += 1;
        let seq = self.next_seq;
        if let Some(previous) = self.in_flight.insert(resource, seq) {
            tracing::debug!(%resource, superseded = previous, seq, "Request superseded");
        }
        Ticket { resource, seq }
    }

    /// Whether `ticket` is the latest unsettled request for its resource.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.in_flight.get(&ticket.resource) == Some(&ticket.seq)
    }

    /// Settle a response. Returns `true` if it is current and may be applied.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.is_current(ticket) {
            self.in_flight.remove(&ticket.resource);
            true
        } else {
            false
        }
    }

    /// Forget any in-flight request for `resource`; its response will be stale.
    pub fn cancel(&mut self, resource: Resource) {
        self.in_flight.remove(&resource);
    }

    pub fn in_flight(&self, resource: Resource) -> bool {
        self.in_flight.contains_key(&resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut guard = FetchGuard::new();
        let march = guard.issue(Resource::Calendar);
        let april = guard.issue(Resource::Calendar);
        assert!(!guard.is_current(march));
        assert!(guard.is_current(april));

        // April resolves first, March late
        assert!(guard.settle(april));
        assert!(!guard.settle(march));
        assert!(!guard.in_flight(Resource::Calendar));
    }

    #[test]
    fn resources_are_independent() {
        let mut guard = FetchGuard::new();
        let cal = guard.issue(Resource::Calendar);
        let blocks = guard.issue(Resource::TimeBlocks);
        assert!(guard.is_current(cal));
        assert!(guard.is_current(blocks));
        assert!(guard.settle(blocks));
        assert!(guard.in_flight(Resource::Calendar));
    }

    #[test]
    fn settled_ticket_cannot_apply_twice() {
        let mut guard = FetchGuard::new();
        let t = guard.issue(Resource::Programs);
        assert!(guard.settle(t));
        assert!(!guard.settle(t));
    }

    #[test]
    fn cancel_makes_response_stale() {
        let mut guard = FetchGuard::new();
        let t = guard.issue(Resource::TimeBlocks);
        guard.cancel(Resource::TimeBlocks);
        assert!(!guard.in_flight(Resource::TimeBlocks));
        assert!(!guard.settle(t));
    }

    #[test]
    fn sequence_is_monotonic_across_resources() {
        let mut guard = FetchGuard::new();
        let a = guard.issue(Resource::Programs);
        let b = guard.issue(Resource::Calendar);
        let c = guard.issue(Resource::Programs);
        assert!(a.seq < b.seq && b.seq < c.seq);
    }
}
