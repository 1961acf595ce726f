//! Domain layer
//!
//! Entities of the social graph that carry no infrastructure concerns:
//! identifiers, posts with their comments, and feed queries.

pub mod feed;
pub mod id;
pub mod post;

pub use feed::{FeedParams, FeedQuery, SortOrder, MAX_FEED_LIMIT};
pub use id::{CommentId, PostId, RoleId, UserId};
pub use post::{Comment, CommentAuthor, FeedItem, NewPost, Post, PostPatch};
