//! Read-path query engine.
//!
//! Filters stored posts down to what one viewer may see: visible, fresh,
//! and near. "Near" is decided by the configured spatial strategy - the
//! competing filter approaches the service went through live here as one
//! enum rather than parallel code paths.

use crate::error::Result;
use crate::models::PostView;
use crate::storage::{PostFilter, Storage};
use chrono::{DateTime, Duration, Utc};
use lamppost_grid::{haversine_km, neighborhood_of};

/// How long a post stays readable, in hours.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Radius for the great-circle refinement, roughly 30 miles.
pub const RADIUS_KM: f64 = 48.0;

/// Spatial filter strategy for coordinate-based reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialStrategy {
    /// Posts whose cell falls in the viewer's 3x3 cell neighborhood
    #[default]
    CellNeighborhood,
    /// Neighborhood prefilter, then a true great-circle distance check
    /// against [`RADIUS_KM`] to drop false positives near cell edges
    Radius,
    /// Locality-slug equality with the viewer's resolved locality
    LocalitySlug,
}

impl SpatialStrategy {
    pub fn from_env_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "cells" => Some(Self::CellNeighborhood),
            "radius" => Some(Self::Radius),
            "locality" => Some(Self::LocalitySlug),
            _ => None,
        }
    }
}

/// Who is asking.
///
/// `locality` set means an explicit "view this locality" request (or the
/// viewer's own resolved locality when coordinates are unavailable); it
/// takes precedence over coordinates.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub coords: Option<(f64, f64)>,
    pub locality: Option<String>,
}

/// The read-path engine: freshness window, spatial filter, recency order,
/// coordinate stripping.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine {
    strategy: SpatialStrategy,
}

impl QueryEngine {
    pub fn new(strategy: SpatialStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SpatialStrategy {
        self.strategy
    }

    /// Posts this viewer may see, newest first.
    ///
    /// Results are [`PostView`]s, so raw coordinates are stripped
    /// unconditionally. A viewer with neither coordinates nor a locality
    /// sees nothing. No pagination at this scale; this is the place to add
    /// a bound if volume grows.
    pub fn query(
        &self,
        store: &Storage,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostView>> {
        let cutoff = now - Duration::hours(FRESHNESS_WINDOW_HOURS);
        let base = PostFilter {
            visible_only: true,
            created_after: Some(cutoff),
            ..Default::default()
        };

        let mut posts = if let Some(slug) = &viewer.locality {
            store.query(&PostFilter {
                locality: Some(slug.clone()),
                ..base
            })?
        } else if let Some((lat, lng)) = viewer.coords {
            match self.strategy {
                SpatialStrategy::CellNeighborhood => store.query(&PostFilter {
                    cells: Some(neighborhood_of(lat, lng)),
                    ..base
                })?,
                SpatialStrategy::Radius => {
                    let candidates = store.query(&PostFilter {
                        cells: Some(neighborhood_of(lat, lng)),
                        ..base
                    })?;
                    candidates
                        .into_iter()
                        .filter(|post| {
                            haversine_km((lat, lng), (post.latitude, post.longitude)) <= RADIUS_KM
                        })
                        .collect()
                }
                // The caller resolves the viewer's locality before querying;
                // without one there is nothing to match
                SpatialStrategy::LocalitySlug => Vec::new(),
            }
        } else {
            Vec::new()
        };

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts.into_iter().map(PostView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPost;
    use lamppost_grid::cell_of;
    use tempfile::tempdir;

    // Downtown San Francisco; the far point is Sacramento, four cell
    // columns east and well outside the radius refinement.
    const NEAR: (f64, f64) = (37.7749, -122.4194);
    const NEAR_NEIGHBOR: (f64, f64) = (37.9101, -122.0652); // Walnut Creek, adjacent cell
    const FAR: (f64, f64) = (38.5816, -121.4944);

    fn seed(storage: &Storage, content: &str, at: (f64, f64), locality: &str, visible: bool) {
        storage
            .insert_post(NewPost {
                content: content.to_string(),
                cell: Some(cell_of(at.0, at.1)),
                locality: Some(locality.to_string()),
                latitude: at.0,
                longitude: at.1,
                is_visible: visible,
            })
            .unwrap();
    }

    fn fixture() -> (tempfile::TempDir, Storage) {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        seed(&storage, "near", NEAR, "san-francisco", true);
        seed(&storage, "next door", NEAR_NEIGHBOR, "walnut-creek", true);
        seed(&storage, "far away", FAR, "sacramento", true);
        seed(&storage, "hidden", NEAR, "san-francisco", false);
        (dir, storage)
    }

    fn contents(posts: &[PostView]) -> Vec<&str> {
        posts.iter().map(|p| p.content.as_str()).collect()
    }

    #[test]
    fn cell_neighborhood_returns_only_nearby() {
        let (_dir, storage) = fixture();
        let engine = QueryEngine::new(SpatialStrategy::CellNeighborhood);
        let posts = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: None,
                },
                Utc::now(),
            )
            .unwrap();
        let mut found = contents(&posts);
        found.sort_unstable();
        assert_eq!(found, vec!["near", "next door"]);
    }

    #[test]
    fn radius_returns_only_posts_within_distance() {
        let (_dir, storage) = fixture();
        let engine = QueryEngine::new(SpatialStrategy::Radius);
        let posts = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: None,
                },
                Utc::now(),
            )
            .unwrap();
        let mut found = contents(&posts);
        found.sort_unstable();
        assert_eq!(found, vec!["near", "next door"]);
    }

    #[test]
    fn locality_strategy_needs_a_resolved_locality() {
        let (_dir, storage) = fixture();
        let engine = QueryEngine::new(SpatialStrategy::LocalitySlug);

        let with_coords_only = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: None,
                },
                Utc::now(),
            )
            .unwrap();
        assert!(with_coords_only.is_empty());

        let with_locality = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: Some("san-francisco".to_string()),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(contents(&with_locality), vec!["near"]);
    }

    #[test]
    fn hidden_posts_never_appear_under_any_strategy() {
        let (_dir, storage) = fixture();
        for strategy in [
            SpatialStrategy::CellNeighborhood,
            SpatialStrategy::Radius,
            SpatialStrategy::LocalitySlug,
        ] {
            let engine = QueryEngine::new(strategy);
            let posts = engine
                .query(
                    &storage,
                    &Viewer {
                        coords: Some(NEAR),
                        locality: Some("san-francisco".to_string()),
                    },
                    Utc::now(),
                )
                .unwrap();
            assert!(
                !posts.iter().any(|p| p.content == "hidden"),
                "hidden post leaked under {strategy:?}"
            );
        }
    }

    #[test]
    fn stale_posts_age_out() {
        let (_dir, storage) = fixture();
        let engine = QueryEngine::new(SpatialStrategy::CellNeighborhood);
        let future = Utc::now() + Duration::hours(FRESHNESS_WINDOW_HOURS + 1);
        let posts = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: None,
                },
                future,
            )
            .unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn explicit_locality_wins_over_coordinates() {
        let (_dir, storage) = fixture();
        let engine = QueryEngine::new(SpatialStrategy::CellNeighborhood);
        let posts = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: Some("sacramento".to_string()),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(contents(&posts), vec!["far away"]);
    }

    #[test]
    fn anonymous_viewer_sees_nothing() {
        let (_dir, storage) = fixture();
        let engine = QueryEngine::new(SpatialStrategy::CellNeighborhood);
        let posts = engine.query(&storage, &Viewer::default(), Utc::now()).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn newest_first() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        seed(&storage, "first", NEAR, "san-francisco", true);
        seed(&storage, "second", NEAR, "san-francisco", true);
        seed(&storage, "third", NEAR, "san-francisco", true);

        let engine = QueryEngine::new(SpatialStrategy::CellNeighborhood);
        let posts = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: None,
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(contents(&posts), vec!["third", "second", "first"]);
    }

    #[test]
    fn results_never_serialize_coordinates() {
        let (_dir, storage) = fixture();
        let engine = QueryEngine::new(SpatialStrategy::Radius);
        let posts = engine
            .query(
                &storage,
                &Viewer {
                    coords: Some(NEAR),
                    locality: None,
                },
                Utc::now(),
            )
            .unwrap();
        assert!(!posts.is_empty());
        let json = serde_json::to_value(&posts).unwrap();
        for post in json.as_array().unwrap() {
            assert!(post.get("latitude").is_none());
            assert!(post.get("longitude").is_none());
        }
    }
}
