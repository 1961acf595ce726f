//! Authentication and authorization module entry point.
//!
//! Accounts and roles, password hashing, invitation tokens, session tokens,
//! and the per-request access pipeline with its axum middleware.

pub mod access;
pub mod hashing;
pub mod jwt;
pub mod login_service;
pub mod middleware;
pub mod models;
pub mod registration_service;
pub mod role;
pub mod token_codec;
pub mod user;

pub use access::AccessPipeline;
pub use jwt::{Authenticator, SessionClaims};
pub use login_service::{LoginService, Session};
pub use models::{ActingUser, AuthError};
pub use registration_service::{Registration, RegistrationService};
pub use role::{Role, RoleLevel};
pub use user::{LoginRequest, NewUser, RegisterUserRequest, User, UserCredentials};
