//! The write and read paths, end to end.
//!
//! Write: validate, gate, derive the spatial cell, resolve the locality,
//! classify, persist, record the verdict. Read: hand the viewer to the
//! query engine. The two external calls sit behind traits so the whole
//! path can be exercised without the network, and per-request facts travel
//! in [`RequestContext`] rather than ambient state.

use crate::access::can_write;
use crate::error::{Error, Result};
use crate::geocode::LocalityLookup;
use crate::locality::RequestContext;
use crate::models::{ModerationRecord, NewPost, PostView};
use crate::moderation::ContentClassifier;
use crate::query::{QueryEngine, Viewer};
use crate::storage::Storage;
use chrono::Utc;
use lamppost_grid::cell_of;
use std::sync::Arc;

/// Longest accepted note, in bytes of trimmed content.
pub const MAX_CONTENT_LEN: usize = 280;

/// Shown to the author when moderation blocks a post.
const BLOCKED_MESSAGE: &str =
    "Your post was not published. Please keep it friendly and try again.";

/// Longest content prefix included in log events.
const PREVIEW_LEN: usize = 50;

/// A write request after HTTP decoding.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub content: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of a write. A moderation block is a structured notice for the
/// caller to render, not an error.
#[derive(Debug)]
pub enum WriteOutcome {
    Published(PostView),
    Blocked { message: String },
}

/// The pipeline wiring: storage plus the two external-call seams.
pub struct Pipeline {
    pub storage: Arc<Storage>,
    pub geocoder: Arc<dyn LocalityLookup>,
    pub classifier: Arc<dyn ContentClassifier>,
    pub engine: QueryEngine,
}

impl Pipeline {
    /// The write path.
    ///
    /// Cell and locality are derived from the author's coordinate here, at
    /// creation time, and never recomputed. The post row is written with
    /// its visibility already decided, then the moderation record follows.
    pub async fn create_post(
        &self,
        ctx: &RequestContext,
        request: WriteRequest,
    ) -> Result<WriteOutcome> {
        let content = validate(&request)?;

        if !can_write(ctx) {
            tracing::info!(
                host = %ctx.host,
                claimed = ?ctx.claimed_locality,
                "write denied"
            );
            return Err(Error::AccessDenied);
        }

        let cell = cell_of(request.latitude, request.longitude);
        let locality = self
            .geocoder
            .locality_at(request.latitude, request.longitude)
            .await?;
        let verdict = self.classifier.classify(&content).await;

        let post = self.storage.insert_post(NewPost {
            content,
            cell: Some(cell),
            locality: Some(locality.slug),
            latitude: request.latitude,
            longitude: request.longitude,
            is_visible: verdict.allowed,
        })?;

        let record = ModerationRecord::new(post.id, verdict.allowed, verdict.reason.clone());
        if let Err(e) = self.storage.insert_moderation(&record) {
            // The post row already carries its visibility; a lost audit row
            // cannot leak an unmoderated post
            tracing::warn!(post_id = post.id, error = %e, "failed to record moderation outcome");
        }

        let preview: String = post.content.chars().take(PREVIEW_LEN).collect();
        if verdict.allowed {
            tracing::info!(
                post_id = post.id,
                cell = %cell,
                locality = ?post.locality,
                content = %preview,
                "post published"
            );
            Ok(WriteOutcome::Published(PostView::from(post)))
        } else {
            tracing::info!(
                post_id = post.id,
                cell = %cell,
                reason = %verdict.reason,
                content = %preview,
                "post blocked"
            );
            Ok(WriteOutcome::Blocked {
                message: BLOCKED_MESSAGE.to_string(),
            })
        }
    }

    /// The read path: visible, fresh, nearby posts, newest first, with raw
    /// coordinates stripped.
    pub fn fetch_posts(&self, viewer: &Viewer) -> Result<Vec<PostView>> {
        self.engine.query(&self.storage, viewer, Utc::now())
    }
}

fn validate(request: &WriteRequest) -> Result<String> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(Error::Validation("post content is required".to_string()));
    }
    if content.len() > MAX_CONTENT_LEN {
        return Err(Error::Validation(format!(
            "post content is limited to {MAX_CONTENT_LEN} characters"
        )));
    }
    if !(-90.0..=90.0).contains(&request.latitude)
        || !(-180.0..=180.0).contains(&request.longitude)
    {
        return Err(Error::Validation("coordinates are out of range".to_string()));
    }
    Ok(content.to_string())
}
