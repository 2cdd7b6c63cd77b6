use serde::Serialize;

/// Current state of a tracker ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// Ticket id, e.g. `ENG-123`.
    pub key: String,
    /// Workflow status name, e.g. `In Progress`.
    pub status: String,
    pub labels: Vec<String>,
}
