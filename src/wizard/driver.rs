//! Runs wizard commands against a gateway and feeds outcomes back.
//!
//! Commands run concurrently on the caller's task; outcomes come back in
//! completion order, not dispatch order. The wizard's ticket guard sorts
//! out which of them still matter.

use std::sync::Arc;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;

use super::command::{Command, Outcome};
use super::machine::BookingWizard;
use crate::gateway::AvailabilityGateway;

pub struct Driver {
    gateway: Arc<dyn AvailabilityGateway>,
    pending: FuturesUnordered<BoxFuture<'static, Outcome>>,
}

impl Driver {
    pub fn new(gateway: Arc<dyn AvailabilityGateway>) -> Self {
        Self {
            gateway,
            pending: FuturesUnordered::new(),
        }
    }

    /// Start a command. It makes progress whenever the driver is polled.
    pub fn dispatch(&mut self, command: Command) {
        let gateway = Arc::clone(&self.gateway);
        self.pending
            .push(Box::pin(async move { command.run(gateway.as_ref()).await }));
    }

    pub fn dispatch_opt(&mut self, command: Option<Command>) {
        if let Some(command) = command {
            self.dispatch(command);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Wait for the next command to finish. `None` when nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        self.pending.next().await
    }

    /// Run all pending commands to completion, applying each outcome.
    pub async fn settle(&mut self, wizard: &mut BookingWizard) {
        while let Some(outcome) = self.pending.next().await {
            wizard.apply(outcome);
        }
    }
}
