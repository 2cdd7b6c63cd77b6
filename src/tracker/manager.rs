//! Manager that wraps ticket tracker implementations
use log::*;

use crate::{
    Result,
    tracker::{config::TrackerConfig, traits::TicketTracker, types::Ticket},
};

pub struct TrackerManager {
    tracker: Box<dyn TicketTracker>,
    config: TrackerConfig,
}

impl TrackerManager {
    pub fn new(tracker: Box<dyn TicketTracker>) -> Self {
        let config = tracker.config();
        Self { tracker, config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub async fn get_ticket(&self, key: &str) -> Result<Ticket> {
        self.tracker.get_ticket(key).await
    }

    pub async fn transition_ticket(
        &self,
        key: &str,
        transition_id: &str,
    ) -> Result<()> {
        if self.config.dry_run {
            warn!("dry_run: would transition {key} with transition {transition_id}");
            return Ok(());
        }
        self.tracker.transition_ticket(key, transition_id).await
    }

    pub async fn add_ticket_label(&self, key: &str, label: &str) -> Result<()> {
        if self.config.dry_run {
            warn!("dry_run: would add label {label} to {key}");
            return Ok(());
        }
        self.tracker.add_ticket_label(key, label).await
    }
}
