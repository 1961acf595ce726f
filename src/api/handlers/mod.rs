//! HTTP request handlers organized by resource type

pub mod auth;
pub mod feed;
pub mod health;
pub mod posts;
pub mod users;

pub use auth::{activate_handler, login_handler, register_handler};
pub use feed::feed_handler;
pub use health::health_handler;
pub use posts::{create_post_handler, delete_post_handler, show_post_handler, update_post_handler};
pub use users::{follow_handler, get_user_handler, unfollow_handler};
