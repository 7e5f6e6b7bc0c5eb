//! Authentication and authorization.
//!
//! Password hashing, bearer token signing, resolution of the calling actor
//! and the role-based access policy applied by every resource handler.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod policy;
mod service;
pub mod token;

pub use extractor::CurrentActor;
pub use policy::{AccessPolicy, Actor, Role};
pub use service::{
    normalize_email, AuthService, IssuedToken, Registration, ANONYMOUS_EMAIL, PLACEHOLDER_TOKEN,
};
pub use token::{Claims, TokenService};
