//! Issue-tracker collaborator used to label and transition Jira tickets.

/// Connection and workflow settings for the tracker.
pub mod config;

/// Jira REST API client implementation.
pub mod jira;

/// Dry-run aware wrapper around a [`traits::TicketTracker`].
pub mod manager;

/// Common trait for ticket tracker implementations.
pub mod traits;

/// Ticket data returned from the tracker.
pub mod types;
