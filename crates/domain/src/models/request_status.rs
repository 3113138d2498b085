//! Status codes shared by access requests and sync requests.
//!
//! The two-letter codes are persisted locally and in the external
//! `AttandanceSynchronization` table, so they are part of the wire format.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// `NR`: submitted, waiting for an admin.
    #[serde(rename = "NR")]
    New,
    /// `IP`: approved or dispatched, work under way.
    #[serde(rename = "IP")]
    InProgress,
    /// `CP`: finished successfully.
    #[serde(rename = "CP")]
    Completed,
    /// `RR`: rejected by an admin or failed remotely.
    #[serde(rename = "RR")]
    Rejected,
    /// `CN`: withdrawn by the requester.
    #[serde(rename = "CN")]
    Cancelled,
}

/// Attempted a status change the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot change request status from {from} to {to}")]
pub struct TransitionError {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::New,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Rejected,
        RequestStatus::Cancelled,
    ];

    /// Two-letter status code.
    pub fn code(&self) -> &'static str {
        match self {
            RequestStatus::New => "NR",
            RequestStatus::InProgress => "IP",
            RequestStatus::Completed => "CP",
            RequestStatus::Rejected => "RR",
            RequestStatus::Cancelled => "CN",
        }
    }

    /// Human-readable label for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::New => "New",
            RequestStatus::InProgress => "In Progress",
            RequestStatus::Completed => "Completed",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Cancelled => "Cancelled",
        }
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Rejected | RequestStatus::Cancelled
        )
    }

    /// Statuses that still block a duplicate request.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Statuses reachable from this one.
    pub fn next_statuses(&self) -> &'static [RequestStatus] {
        match self {
            RequestStatus::New => &[
                RequestStatus::InProgress,
                RequestStatus::Rejected,
                RequestStatus::Cancelled,
            ],
            RequestStatus::InProgress => &[RequestStatus::Completed, RequestStatus::Rejected],
            RequestStatus::Completed | RequestStatus::Rejected | RequestStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Validates a transition and returns the new status.
    pub fn transition(self, next: RequestStatus) -> Result<RequestStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NR" => Ok(RequestStatus::New),
            "IP" => Ok(RequestStatus::InProgress),
            "CP" => Ok(RequestStatus::Completed),
            "RR" => Ok(RequestStatus::Rejected),
            "CN" => Ok(RequestStatus::Cancelled),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
