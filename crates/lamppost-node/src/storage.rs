//! Persistent storage using RocksDB.
//!
//! Keys are prefixed and ids are zero-padded so lexicographic key order
//! matches id order:
//!
//! - `post:{id:020}` -> JSON-encoded [`Post`]
//! - `eval:{post_id:020}` -> JSON-encoded [`ModerationRecord`]

use crate::error::Result;
use crate::models::{ModerationRecord, NewPost, Post};
use chrono::{DateTime, Utc};
use lamppost_grid::CellId;
use rocksdb::{Options, DB};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

const POST_PREFIX: &[u8] = b"post:";
const EVAL_PREFIX: &[u8] = b"eval:";

/// Storage backend for posts and moderation records.
pub struct Storage {
    db: DB,
    next_id: AtomicU64,
}

/// Filter predicates for the read path.
///
/// Combined conjunctively; `None` fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Keep posts whose cell is in this set
    pub cells: Option<Vec<CellId>>,
    /// Keep posts with this locality slug
    pub locality: Option<String>,
    /// Keep posts created strictly after this instant
    pub created_after: Option<DateTime<Utc>>,
    /// Exclude posts hidden by moderation
    pub visible_only: bool,
}

impl PostFilter {
    fn matches(&self, post: &Post) -> bool {
        if self.visible_only && !post.is_visible {
            return false;
        }
        if let Some(cells) = &self.cells {
            match post.cell {
                Some(cell) if cells.contains(&cell) => {}
                _ => return false,
            }
        }
        if let Some(slug) = &self.locality {
            if post.locality.as_deref() != Some(slug.as_str()) {
                return false;
            }
        }
        if let Some(cutoff) = self.created_after {
            if post.created_at <= cutoff {
                return false;
            }
        }
        true
    }
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        let next_id = AtomicU64::new(last_post_id(&db)? + 1);
        Ok(Self { db, next_id })
    }

    // --- Posts ---

    /// Persist a new post, assigning the next monotonic id.
    ///
    /// `is_visible` is part of the initial row write, so a reader can never
    /// observe a post whose moderation outcome is still pending.
    pub fn insert_post(&self, new: NewPost) -> Result<Post> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let post = Post {
            id,
            content: new.content,
            cell: new.cell,
            locality: new.locality,
            latitude: new.latitude,
            longitude: new.longitude,
            is_visible: new.is_visible,
            created_at: now,
            updated_at: now,
        };
        self.db.put(post_key(id), serde_json::to_vec(&post)?)?;
        Ok(post)
    }

    /// Get a post by id.
    pub fn get_post(&self, id: u64) -> Result<Option<Post>> {
        match self.db.get(post_key(id))? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// All posts matching the filter, in id order.
    pub fn query(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut posts = Vec::new();

        let iter = self.db.prefix_iterator(POST_PREFIX);
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(POST_PREFIX) {
                break;
            }
            let post: Post = serde_json::from_slice(&value)?;
            if filter.matches(&post) {
                posts.push(post);
            }
        }

        Ok(posts)
    }

    // --- Moderation records ---

    /// Store the moderation outcome for a post.
    pub fn insert_moderation(&self, record: &ModerationRecord) -> Result<()> {
        self.db
            .put(eval_key(record.post_id), serde_json::to_vec(record)?)?;
        Ok(())
    }

    /// Get the moderation outcome recorded for a post.
    pub fn moderation_for(&self, post_id: u64) -> Result<Option<ModerationRecord>> {
        match self.db.get(eval_key(post_id))? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }
}

fn post_key(id: u64) -> Vec<u8> {
    format!("post:{id:020}").into_bytes()
}

fn eval_key(post_id: u64) -> Vec<u8> {
    format!("eval:{post_id:020}").into_bytes()
}

/// Highest post id already in the store, or 0 when empty.
fn last_post_id(db: &DB) -> Result<u64> {
    let mut last = 0;
    for item in db.prefix_iterator(POST_PREFIX) {
        let (key, value) = item?;
        if !key.starts_with(POST_PREFIX) {
            break;
        }
        let post: Post = serde_json::from_slice(&value)?;
        last = last.max(post.id);
    }
    Ok(last)
}
