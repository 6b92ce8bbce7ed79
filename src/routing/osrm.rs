//! OSRM HTTP adapter.
//!
//! Talks to an OSRM-compatible `route` endpoint over a blocking client with
//! a request timeout. Responses carry an encoded polyline which is decoded
//! into segment geometry; a degenerate geometry falls back to the straight
//! line between the endpoints.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::{RouteLeg, RoutingClient, RoutingError};
use crate::geo::polyline;
use crate::models::Point;

/// Connection settings for an OSRM-compatible routing service.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Blocking OSRM client returning per-leg distance, duration, and geometry.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    /// Builds a client with the configured request timeout.
    pub fn new(config: OsrmConfig) -> Result<Self, RoutingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }
}

impl RoutingClient for OsrmClient {
    fn route(&self, from: Point, to: Point) -> Result<RouteLeg, RoutingError> {
        // OSRM takes lng,lat pairs.
        let url = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=polyline",
            self.config.base_url, self.config.profile, from.lng, from.lat, to.lng, to.lat
        );

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(RoutingError::Status(response.status().as_u16()));
        }

        let body: OsrmRouteResponse = response.json()?;
        if body.code != "Ok" {
            warn!(code = %body.code, "osrm rejected route request");
            return Err(RoutingError::Malformed(body.code));
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or(RoutingError::NoRoute)?;

        let mut geometry = polyline::decode(&route.geometry);
        if geometry.len() < 2 {
            geometry = vec![from, to];
        }

        Ok(RouteLeg {
            distance_km: route.distance / 1000.0,
            duration_secs: route.duration,
            geometry,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Encoded polyline for the whole leg.
    geometry: String,
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}
