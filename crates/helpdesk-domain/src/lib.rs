pub mod dashboard;
pub mod error;
pub mod identifiers;
pub mod lifecycle;
pub mod model;
pub mod status;

pub use dashboard::{count_by_status, filter, sort_recent_first};
pub use error::HelpdeskError;
pub use identifiers::{CommentId, TicketId, UserId};
pub use lifecycle::{
    apply_comment, apply_created, apply_status_patch, trimmed_comment_message, validate_new_ticket,
};
pub use model::{Comment, NewTicket, Ticket, User};
pub use status::{Priority, TicketStatus, TransitionPolicy};
