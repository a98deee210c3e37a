//! Data models for the Lamppost node.
//!
//! # Core Types
//!
//! - [`Post`] - a stored note, including the write-once raw coordinates
//! - [`NewPost`] - what the write path supplies; the store assigns the rest
//! - [`PostView`] - the only externally visible shape, with no coordinates
//! - [`ModerationRecord`] - the audit trail row for one moderation outcome

mod moderation_record;
mod post;

pub use moderation_record::ModerationRecord;
pub use post::{NewPost, Post, PostView};
