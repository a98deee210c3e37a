//! HTTP API for the Lamppost node.
//!
//! This is also the sanitizing boundary: responses carry user-actionable
//! messages only, while full failure detail stays in the logs.

use crate::access::can_write;
use crate::error::Error;
use crate::locality::{slugify, RequestContext};
use crate::models::PostView;
use crate::node::NodeState;
use crate::pipeline::{WriteOutcome, WriteRequest};
use crate::query::{SpatialStrategy, Viewer};
use axum::{
    extract::{Host, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Cookie carrying the client's self-asserted locality slug.
pub const LOCALITY_COOKIE: &str = "locality";

type AppState = Arc<NodeState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Locality context (establishes the locality cookie)
        .route("/api/v1/context", get(get_context))
        // Posts
        .route("/api/v1/posts", get(list_posts))
        .route("/api/v1/posts", post(create_post))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Error boundary ---

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::AccessDenied => (
                StatusCode::FORBIDDEN,
                "You are not allowed to post here.".to_string(),
            ),
            Error::GeocodingUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "We couldn't figure out where you are right now. Please try again.".to_string(),
            ),
            Error::ModerationUnavailable(_)
            | Error::Storage(_)
            | Error::HttpClient(_)
            | Error::Serialization(_)
            | Error::Io(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// --- Locality context endpoint ---

#[derive(Debug, Deserialize)]
struct ContextParams {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextResponse {
    /// Display name, present when coordinates were supplied and resolved
    locality: Option<String>,
    locality_slug: Option<String>,
    subdomain: Option<String>,
    can_post: bool,
    dev_mode: bool,
}

/// Resolve the request's locality context. With coordinates, the resolved
/// slug is also set as the locality cookie - the token later writes are
/// checked against.
async fn get_context(
    State(state): State<AppState>,
    Host(host): Host,
    Query(params): Query<ContextParams>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ContextResponse>), Error> {
    let token = jar.get(LOCALITY_COOKIE).map(|c| c.value().to_string());
    let mut ctx = RequestContext::resolve(
        &host,
        token.as_deref(),
        &state.config.root_domain,
        state.config.dev_mode,
    );

    let mut jar = jar;
    let mut locality_name = None;
    if let (Some(lat), Some(lng)) = (params.lat, params.lng) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(Error::Validation("coordinates are out of range".to_string()));
        }
        let locality = state.pipeline.geocoder.locality_at(lat, lng).await?;
        jar = jar.add(Cookie::build((LOCALITY_COOKIE, locality.slug.clone())).path("/"));
        ctx.claimed_locality = Some(locality.slug);
        locality_name = Some(locality.name);
    }

    let response = ContextResponse {
        locality: locality_name,
        locality_slug: ctx.claimed_locality.clone(),
        subdomain: ctx.subdomain.clone(),
        can_post: can_write(&ctx),
        dev_mode: ctx.dev_mode,
    };
    Ok((jar, Json(response)))
}

// --- Post endpoints ---

#[derive(Debug, Deserialize)]
struct CreatePostBody {
    content: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn create_post(
    State(state): State<AppState>,
    Host(host): Host,
    jar: CookieJar,
    Json(body): Json<CreatePostBody>,
) -> Result<Json<CreatePostResponse>, Error> {
    let token = jar.get(LOCALITY_COOKIE).map(|c| c.value().to_string());
    let ctx = RequestContext::resolve(
        &host,
        token.as_deref(),
        &state.config.root_domain,
        state.config.dev_mode,
    );

    let outcome = state
        .pipeline
        .create_post(
            &ctx,
            WriteRequest {
                content: body.content,
                latitude: body.latitude,
                longitude: body.longitude,
            },
        )
        .await?;

    Ok(Json(match outcome {
        WriteOutcome::Published(_) => CreatePostResponse {
            success: true,
            blocked: None,
            message: None,
        },
        WriteOutcome::Blocked { message } => CreatePostResponse {
            success: false,
            blocked: Some(true),
            message: Some(message),
        },
    }))
}

#[derive(Debug, Deserialize)]
struct ListPostsParams {
    lat: Option<f64>,
    lng: Option<f64>,
    locality: Option<String>,
}

async fn list_posts(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<Vec<PostView>>, Error> {
    let coords = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(Error::Validation("coordinates are out of range".to_string()));
            }
            Some((lat, lng))
        }
        _ => None,
    };

    let explicit = params
        .locality
        .as_deref()
        .map(slugify)
        .filter(|slug| !slug.is_empty());

    // The cookie stands in for the viewer's locality only when coordinates
    // are missing or the engine matches by locality anyway; it must not
    // override a coordinate lookup
    let token = jar
        .get(LOCALITY_COOKIE)
        .map(|c| slugify(c.value()))
        .filter(|slug| !slug.is_empty());
    let token_applies = coords.is_none()
        || state.pipeline.engine.strategy() == SpatialStrategy::LocalitySlug;

    let viewer = Viewer {
        coords,
        locality: explicit.or(if token_applies { token } else { None }),
    };

    let posts = state.pipeline.fetch_posts(&viewer)?;
    Ok(Json(posts))
}
