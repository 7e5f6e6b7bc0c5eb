//! Persistence for users, tickets and messages.
//!
//! SQLite through a sqlx connection pool. The schema lives in `migrations/`
//! and is applied at startup.

pub mod models;
pub mod operations;

pub use models::{
    Message, NewMessage, NewTicket, NewUser, Ticket, TicketChanges, TicketFilter, User,
    UserChanges, UserPublic,
};
pub use operations::DbOperations;
