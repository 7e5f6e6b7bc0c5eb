//! Role-based access rules for users, tickets and messages.
//!
//! Lookups happen before any of these checks run: a missing ticket or user
//! is reported as not found by the caller, never as forbidden.

use crate::db::{Ticket, TicketChanges, User};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Agent,
}

impl Role {
    pub fn from_agent_flag(is_agent: bool) -> Self {
        if is_agent {
            Role::Agent
        } else {
            Role::Customer
        }
    }
}

/// The identity a request runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// A verified user.
    User {
        id: i64,
        email: String,
        role: Role,
    },
    /// Authentication is disabled; backed by the reserved anonymous user row.
    Anonymous { id: i64 },
}

impl Actor {
    pub fn from_user(user: &User) -> Self {
        Actor::User {
            id: user.id,
            email: user.email.clone(),
            role: Role::from_agent_flag(user.is_agent),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Actor::User { id, .. } | Actor::Anonymous { id } => *id,
        }
    }

    /// Anonymous actors carry agent-equivalent rights.
    pub fn role(&self) -> Role {
        match self {
            Actor::User { role, .. } => *role,
            Actor::Anonymous { .. } => Role::Agent,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role() == Role::Agent
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    enforced: bool,
}

impl AccessPolicy {
    pub fn new(auth_required: bool) -> Self {
        Self {
            enforced: auth_required,
        }
    }

    fn check(&self, allowed: bool, reason: &str) -> Result<(), AppError> {
        if !self.enforced || allowed {
            Ok(())
        } else {
            tracing::warn!("Access denied: {}", reason);
            Err(AppError::forbidden(reason))
        }
    }

    /// Returns the `creator_id` filter a ticket listing must apply for `actor`.
    pub fn ticket_scope(&self, actor: &Actor) -> Option<i64> {
        if self.enforced && !actor.is_agent() {
            Some(actor.id())
        } else {
            None
        }
    }

    pub fn require_agent(&self, actor: &Actor) -> Result<(), AppError> {
        self.check(actor.is_agent(), "Agent role required")
    }

    pub fn can_create_ticket(&self, actor: &Actor, creator_id: i64) -> Result<(), AppError> {
        self.check(
            actor.is_agent() || creator_id == actor.id(),
            "Cannot create ticket for other users",
        )
    }

    pub fn can_view_ticket(&self, actor: &Actor, ticket: &Ticket) -> Result<(), AppError> {
        self.check(
            owns_or_agent(actor, ticket),
            "Not authorized to view this ticket",
        )
    }

    pub fn can_update_ticket(
        &self,
        actor: &Actor,
        ticket: &Ticket,
        changes: &TicketChanges,
    ) -> Result<(), AppError> {
        self.check(
            owns_or_agent(actor, ticket),
            "Not authorized to update this ticket",
        )?;
        self.check(
            actor.is_agent() || !changes.touches_agent_fields(),
            "Not allowed to change status/assignee",
        )
    }

    pub fn can_post_message(
        &self,
        actor: &Actor,
        ticket: &Ticket,
        author_id: i64,
    ) -> Result<(), AppError> {
        self.check(
            owns_or_agent(actor, ticket),
            "Not authorized to post to this ticket",
        )?;
        self.check(author_id == actor.id(), "Cannot post as another user")
    }

    pub fn can_list_messages(&self, actor: &Actor, ticket: &Ticket) -> Result<(), AppError> {
        self.check(
            owns_or_agent(actor, ticket),
            "Not authorized to view this ticket's messages",
        )
    }

    pub fn can_view_user(&self, actor: &Actor, user_id: i64) -> Result<(), AppError> {
        self.check(
            actor.is_agent() || actor.id() == user_id,
            "Not authorized to view this user",
        )
    }

    pub fn can_update_user(&self, actor: &Actor, user_id: i64) -> Result<(), AppError> {
        self.check(
            actor.is_agent() || actor.id() == user_id,
            "Not authorized to update this user",
        )
    }
}

fn owns_or_agent(actor: &Actor, ticket: &Ticket) -> bool {
    actor.is_agent() || ticket.creator_id == actor.id()
}
