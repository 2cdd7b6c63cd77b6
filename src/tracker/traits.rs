//! Traits related to issue trackers
use async_trait::async_trait;

use crate::{
    Result,
    tracker::{config::TrackerConfig, types::Ticket},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketTracker: Send + Sync {
    fn config(&self) -> TrackerConfig;
    async fn get_ticket(&self, key: &str) -> Result<Ticket>;
    async fn transition_ticket(&self, key: &str, transition_id: &str) -> Result<()>;
    async fn add_ticket_label(&self, key: &str, label: &str) -> Result<()>;
}
