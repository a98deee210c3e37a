//! Reverse geocoding via an external HTTP service.
//!
//! The upstream speaks the Google Geocoding API shape (`status`,
//! `results[]`, `address_components[]` with `types`). It is treated as an
//! untrusted, possibly slow third party: a single call with a request
//! timeout, and every failure maps to [`Error::GeocodingUnavailable`] so the
//! write path can surface it instead of inventing a locality.

use crate::error::{Error, Result};
use crate::locality::slugify;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Component types that can stand in for a locality, most specific first.
const LOCALITY_TYPES: [&str; 3] = ["locality", "sublocality", "administrative_area_level_2"];

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(5);

/// A resolved place: display name plus canonical slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locality {
    pub name: String,
    pub slug: String,
}

/// Coordinate-to-place resolution, behind a trait so the pipeline can be
/// exercised without the network.
#[async_trait]
pub trait LocalityLookup: Send + Sync {
    async fn locality_at(&self, lat: f64, lng: f64) -> Result<Locality>;
}

/// Client for the reverse-geocoding upstream.
pub struct Geocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeEntry>,
}

#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl Geocoder {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(GEOCODE_TIMEOUT)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn fetch(&self, lat: f64, lng: f64) -> Result<GeocodeResponse> {
        let url = format!("{}?latlng={lat},{lng}&key={}", self.base_url, self.api_key);
        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!(error = %e, "reverse geocoding request failed");
            Error::GeocodingUnavailable
        })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "reverse geocoding returned an error status");
            return Err(Error::GeocodingUnavailable);
        }

        response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "reverse geocoding returned malformed JSON");
            Error::GeocodingUnavailable
        })
    }
}

#[async_trait]
impl LocalityLookup for Geocoder {
    async fn locality_at(&self, lat: f64, lng: f64) -> Result<Locality> {
        let response = self.fetch(lat, lng).await?;
        match locality_from(&response) {
            Some(locality) => Ok(locality),
            None => {
                tracing::warn!(status = %response.status, "reverse geocoding had no usable locality component");
                Err(Error::GeocodingUnavailable)
            }
        }
    }
}

/// The most specific locality-type component in the response, searched in
/// the fixed [`LOCALITY_TYPES`] priority order across all results.
fn locality_from(response: &GeocodeResponse) -> Option<Locality> {
    if response.status != "OK" {
        return None;
    }
    for wanted in LOCALITY_TYPES {
        for entry in &response.results {
            for component in &entry.address_components {
                if component.types.iter().any(|t| t == wanted) {
                    let slug = slugify(&component.long_name);
                    if slug.is_empty() {
                        continue;
                    }
                    return Some(Locality {
                        name: component.long_name.clone(),
                        slug,
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeocodeResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn extracts_locality_component() {
        let response = parse(
            r#"{
                "status": "OK",
                "results": [{
                    "address_components": [
                        {"long_name": "Market Street", "types": ["route"]},
                        {"long_name": "San Francisco", "types": ["locality", "political"]},
                        {"long_name": "California", "types": ["administrative_area_level_1"]}
                    ]
                }]
            }"#,
        );
        let locality = locality_from(&response).unwrap();
        assert_eq!(locality.name, "San Francisco");
        assert_eq!(locality.slug, "san-francisco");
    }

    #[test]
    fn locality_beats_broader_components_regardless_of_order() {
        // administrative_area_level_2 appears first in document order, but
        // the more specific locality type wins
        let response = parse(
            r#"{
                "status": "OK",
                "results": [{
                    "address_components": [
                        {"long_name": "Cook County", "types": ["administrative_area_level_2"]},
                        {"long_name": "Chicago", "types": ["locality"]}
                    ]
                }]
            }"#,
        );
        assert_eq!(locality_from(&response).unwrap().slug, "chicago");
    }

    #[test]
    fn falls_back_to_sublocality_then_county() {
        let sublocality = parse(
            r#"{
                "status": "OK",
                "results": [{
                    "address_components": [
                        {"long_name": "Brooklyn", "types": ["sublocality", "political"]},
                        {"long_name": "Kings County", "types": ["administrative_area_level_2"]}
                    ]
                }]
            }"#,
        );
        assert_eq!(locality_from(&sublocality).unwrap().slug, "brooklyn");

        let county_only = parse(
            r#"{
                "status": "OK",
                "results": [{
                    "address_components": [
                        {"long_name": "Kings County", "types": ["administrative_area_level_2"]}
                    ]
                }]
            }"#,
        );
        assert_eq!(locality_from(&county_only).unwrap().slug, "kings-county");
    }

    #[test]
    fn no_results_is_unusable() {
        let response = parse(r#"{"status": "ZERO_RESULTS", "results": []}"#);
        assert!(locality_from(&response).is_none());
    }

    #[test]
    fn missing_locality_types_is_unusable() {
        let response = parse(
            r#"{
                "status": "OK",
                "results": [{
                    "address_components": [
                        {"long_name": "California", "types": ["administrative_area_level_1"]}
                    ]
                }]
            }"#,
        );
        assert!(locality_from(&response).is_none());
    }

    #[tokio::test]
    async fn unreachable_upstream_is_unavailable() {
        // Nothing listens on this port; the request fails fast
        let geocoder = Geocoder::new(
            "http://127.0.0.1:9/maps/api/geocode/json".to_string(),
            "test-key".to_string(),
        )
        .unwrap();
        let result = geocoder.locality_at(37.77, -122.42).await;
        assert!(matches!(result, Err(Error::GeocodingUnavailable)));
    }
}
