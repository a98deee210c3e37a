//! Lamppost - location-scoped anonymous notes.
//!
//! A post is a short anonymous note tied to the author's location. It is
//! visible only to readers near the same place, for 24 hours, and only if
//! the moderation gate let it through. Raw coordinates never leave the
//! server.
//!
//! # Architecture
//!
//! - **Models**: posts, moderation records, and the coordinate-free view
//! - **Storage**: RocksDB-backed post store with a moderation audit trail
//! - **Locality**: slug normalization and request-origin resolution
//! - **Geocode**: coordinate-to-place resolution via an external service
//! - **Moderation**: best-effort classification with a fallback policy
//! - **Access**: the write gate binding client token to target locality
//! - **Query**: proximity reads (cell, radius, or locality strategies)
//! - **Pipeline**: the write/read paths wired over testable seams
//! - **API**: HTTP endpoints
//!
//! # Example
//!
//! ```no_run
//! use lamppost_node::{Config, Node};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let node = Node::new(config).await?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod api;
pub mod error;
pub mod geocode;
pub mod locality;
pub mod models;
pub mod moderation;
pub mod node;
pub mod pipeline;
pub mod query;
pub mod storage;

pub use error::{Error, Result};
pub use models::{ModerationRecord, NewPost, Post, PostView};
pub use node::{Config, Node, NodeState};
pub use pipeline::{Pipeline, WriteOutcome, WriteRequest};
pub use query::{QueryEngine, SpatialStrategy, Viewer};
pub use storage::{PostFilter, Storage};
