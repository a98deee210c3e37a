//! Moderation audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One moderation outcome for one post.
///
/// Written right after the post row, whether the verdict came from the live
/// classifier or a fallback path, so every stored post has its decision on
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRecord {
    /// The post this record judged
    pub post_id: u64,

    /// The classifier's verdict
    pub is_allowed: bool,

    /// Rationale, present even on fallback paths
    pub reason: String,

    /// Creation time, immutable once set
    pub created_at: DateTime<Utc>,
}

impl ModerationRecord {
    /// Create a record stamped with the current time.
    pub fn new(post_id: u64, is_allowed: bool, reason: String) -> Self {
        Self {
            post_id,
            is_allowed,
            reason,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record() {
        let record = ModerationRecord::new(3, false, "hate speech".to_string());
        assert_eq!(record.post_id, 3);
        assert!(!record.is_allowed);
        assert_eq!(record.reason, "hate speech");
    }

    #[test]
    fn serialize_deserialize() {
        let record = ModerationRecord::new(9, true, "no policy violation".to_string());
        let json = serde_json::to_string(&record).unwrap();
        let parsed: ModerationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }
}
