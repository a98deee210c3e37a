//! Post model - an anonymous location-scoped note.

use chrono::{DateTime, Utc};
use lamppost_grid::CellId;
use serde::{Deserialize, Serialize};

/// A stored post.
///
/// Raw coordinates are kept for server-side distance checks only. They are
/// write-once and never part of an externally serialized shape: readers get
/// [`PostView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Store-assigned id, monotonically increasing
    pub id: u64,

    /// Trimmed note text
    pub content: String,

    /// Spatial cell derived from the author's coordinate at write time,
    /// never recomputed
    pub cell: Option<CellId>,

    /// Canonical locality slug derived from the same coordinate
    pub locality: Option<String>,

    /// Author latitude
    pub latitude: f64,

    /// Author longitude
    pub longitude: f64,

    /// Set from the moderation verdict at creation. False means the post is
    /// retained for audit but excluded from every read.
    pub is_visible: bool,

    /// Creation time, immutable once set
    pub created_at: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Fields the write path supplies. The store assigns the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub content: String,
    pub cell: Option<CellId>,
    pub locality: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_visible: bool,
}

/// The shape readers see. Carries no coordinate fields at all, so no read
/// path can leak an author's exact location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub id: u64,
    pub content: String,
    pub cell: Option<CellId>,
    pub locality: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            content: post.content,
            cell: post.cell,
            locality: post.locality,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamppost_grid::cell_of;

    fn sample_post() -> Post {
        let now = Utc::now();
        Post {
            id: 7,
            content: "farmers market is back".to_string(),
            cell: Some(cell_of(37.7749, -122.4194)),
            locality: Some("san-francisco".to_string()),
            latitude: 37.7749,
            longitude: -122.4194,
            is_visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serialize_deserialize() {
        let post = sample_post();
        let json = serde_json::to_string(&post).unwrap();
        let parsed: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(post, parsed);
    }

    #[test]
    fn view_carries_no_coordinates() {
        let view = PostView::from(sample_post());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("latitude").is_none());
        assert!(json.get("longitude").is_none());
        assert_eq!(json["locality"], "san-francisco");
    }

    #[test]
    fn view_keeps_identity_and_timestamps() {
        let post = sample_post();
        let view = PostView::from(post.clone());
        assert_eq!(view.id, post.id);
        assert_eq!(view.content, post.content);
        assert_eq!(view.created_at, post.created_at);
    }
}
