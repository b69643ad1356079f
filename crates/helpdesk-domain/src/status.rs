use serde::{Deserialize, Serialize};

use crate::error::HelpdeskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    Open,
    // `in_progress` is the dashboard list view's legacy spelling of the same
    // lifecycle slot; accepted on input, never emitted.
    #[serde(alias = "in_progress")]
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::Open,
        TicketStatus::Pending,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, HelpdeskError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(TicketStatus::New),
            "open" => Ok(TicketStatus::Open),
            "pending" | "in_progress" => Ok(TicketStatus::Pending),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(HelpdeskError::ValidationFailed(format!(
                "`{other}` is not a ticket status. Valid statuses: {}",
                status_list_hint()
            ))),
        }
    }
}

fn status_list_hint() -> String {
    TicketStatus::ALL
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Policy over the status transition graph.
///
/// The backing store accepts any in-enum status as the next status of any
/// ticket, so the default policy permits every pair. A deployment wanting a
/// stricter workflow supplies its own edge list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionPolicy {
    allowed: Option<Vec<(TicketStatus, TicketStatus)>>,
}

impl TransitionPolicy {
    pub fn restricted(edges: Vec<(TicketStatus, TicketStatus)>) -> Self {
        Self {
            allowed: Some(edges),
        }
    }

    pub fn permits(&self, from: TicketStatus, to: TicketStatus) -> bool {
        match &self.allowed {
            None => true,
            Some(edges) => edges.iter().any(|(f, t)| *f == from && *t == to),
        }
    }

    pub fn check(&self, from: TicketStatus, to: TicketStatus) -> Result<(), HelpdeskError> {
        if self.permits(from, to) {
            return Ok(());
        }
        Err(HelpdeskError::ValidationFailed(format!(
            "transition `{}` -> `{}` is not permitted",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, TicketStatus, TransitionPolicy};
    use crate::error::HelpdeskError;

    #[test]
    fn status_parse_accepts_every_canonical_value() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::parse(status.as_str()).expect("parse"), status);
        }
    }

    #[test]
    fn status_parse_maps_legacy_in_progress_to_pending() {
        assert_eq!(
            TicketStatus::parse("in_progress").expect("parse alias"),
            TicketStatus::Pending
        );
    }

    #[test]
    fn status_parse_rejects_values_outside_the_closed_set() {
        let error = TicketStatus::parse("archived").expect_err("reject unknown status");
        assert!(matches!(error, HelpdeskError::ValidationFailed(_)));
        assert!(error.to_string().contains("archived"));
    }

    #[test]
    fn status_deserializes_legacy_alias_but_serializes_canonically() {
        let status: TicketStatus = serde_json::from_str("\"in_progress\"").expect("alias");
        assert_eq!(status, TicketStatus::Pending);
        assert_eq!(
            serde_json::to_string(&status).expect("serialize"),
            "\"pending\""
        );
    }

    #[test]
    fn status_rejects_unknown_wire_values() {
        assert!(serde_json::from_str::<TicketStatus>("\"reopened\"").is_err());
    }

    #[test]
    fn priority_uses_snake_case_wire_values() {
        let priority: Priority = serde_json::from_str("\"critical\"").expect("priority");
        assert_eq!(priority, Priority::Critical);
    }

    #[test]
    fn default_policy_permits_every_pair() {
        let policy = TransitionPolicy::default();
        for from in TicketStatus::ALL {
            for to in TicketStatus::ALL {
                assert!(policy.permits(from, to));
            }
        }
    }

    #[test]
    fn restricted_policy_rejects_unlisted_edges() {
        let policy =
            TransitionPolicy::restricted(vec![(TicketStatus::Open, TicketStatus::Resolved)]);
        assert!(policy.permits(TicketStatus::Open, TicketStatus::Resolved));
        assert!(!policy.permits(TicketStatus::Resolved, TicketStatus::Open));
        let error = policy
            .check(TicketStatus::Resolved, TicketStatus::Open)
            .expect_err("unlisted edge");
        assert!(matches!(error, HelpdeskError::ValidationFailed(_)));
    }
}
