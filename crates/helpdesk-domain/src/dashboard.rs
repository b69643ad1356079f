use std::collections::BTreeMap;

use crate::model::Ticket;
use crate::status::TicketStatus;

/// Per-status tallies over the current cache snapshot, computed in one pass.
/// Every status is present so summary tiles can render zeros.
pub fn count_by_status(tickets: &[Ticket]) -> BTreeMap<TicketStatus, usize> {
    let mut counts: BTreeMap<TicketStatus, usize> = TicketStatus::ALL
        .iter()
        .map(|status| (*status, 0))
        .collect();
    for ticket in tickets {
        *counts.entry(ticket.status).or_insert(0) += 1;
    }
    counts
}

/// Case-insensitive substring match over title, description and department.
/// A blank query matches everything.
pub fn filter(query: &str, tickets: &[Ticket]) -> Vec<Ticket> {
    let needle = query.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return tickets.to_vec();
    }
    tickets
        .iter()
        .filter(|ticket| {
            let haystack = format!(
                "{} {} {}",
                ticket.title, ticket.description, ticket.department
            )
            .to_ascii_lowercase();
            haystack.contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn sort_recent_first(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut sorted = tickets.to_vec();
    sorted.sort_by(|left, right| {
        right
            .last_updated
            .cmp(&left.last_updated)
            .then_with(|| left.id.as_str().cmp(right.id.as_str()))
    });
    sorted
}
