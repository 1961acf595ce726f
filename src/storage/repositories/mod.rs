//! Repository modules for data access
//!
//! Each repository exposes an `async_trait` interface plus its sqlx-backed
//! implementation so services and handlers can be exercised with doubles.

pub mod follower;
pub mod post;
pub mod user;

pub use follower::{FollowRepository, SqlxFollowRepository};
pub use post::{CommentRepository, PostRepository, SqlxCommentRepository, SqlxPostRepository};
pub use user::{RoleRepository, SqlxRoleRepository, SqlxUserRepository, UserRepository};
