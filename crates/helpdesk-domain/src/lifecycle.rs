use crate::error::HelpdeskError;
use crate::model::{Comment, NewTicket, Ticket};

pub fn validate_new_ticket(draft: &NewTicket) -> Result<(), HelpdeskError> {
    let mut missing = Vec::new();
    if draft.title.trim().is_empty() {
        missing.push("title");
    }
    if draft.description.trim().is_empty() {
        missing.push("description");
    }
    if draft.department.trim().is_empty() {
        missing.push("department");
    }
    if missing.is_empty() {
        return Ok(());
    }
    Err(HelpdeskError::ValidationFailed(format!(
        "required fields are empty: {}",
        missing.join(", ")
    )))
}

/// Returns the trimmed message, or `None` for whitespace-only submissions.
/// An empty comment is a silent no-op, not an error.
pub fn trimmed_comment_message(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Appends a server-confirmed ticket to the collection. Ids are unique in the
/// cache; if the server re-sends a known id the entry is replaced in place.
pub fn apply_created(mut tickets: Vec<Ticket>, created: Ticket) -> Vec<Ticket> {
    match tickets.iter().position(|ticket| ticket.id == created.id) {
        Some(index) => tickets[index] = created,
        None => tickets.push(created),
    }
    tickets
}

/// Merges a status patch into the cached ticket: only `status` and
/// `last_updated` move; comments and assignment stay untouched.
pub fn apply_status_patch(cached: Ticket, confirmed: &Ticket) -> Ticket {
    let last_updated = later_timestamp(&cached.last_updated, &confirmed.last_updated);
    Ticket {
        status: confirmed.status,
        last_updated,
        ..cached
    }
}

/// Appends a server-confirmed comment and refreshes `last_updated` from its
/// creation timestamp. The comment sequence is append-only.
pub fn apply_comment(mut cached: Ticket, comment: Comment) -> Ticket {
    cached.last_updated = later_timestamp(&cached.last_updated, &comment.created_at);
    cached.comments.push(comment);
    cached
}

// RFC 3339 timestamps order lexically; the clamp keeps `last_updated` from
// moving backwards when the server clock lags the cached value.
fn later_timestamp(current: &str, candidate: &str) -> String {
    if candidate > current {
        candidate.to_owned()
    } else {
        current.to_owned()
    }
}
