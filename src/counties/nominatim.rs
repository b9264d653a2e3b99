// Nominatim geocoder HTTP client.
// Looks up county boundary polygons one request at a time, respecting the public rate limit.

use std::time::Duration;

use geo::MultiPolygon;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::http::{self, check_response};

use super::place_query;
use super::types::FeatureCollection;

pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim search client.
pub struct NominatimClient {
    client: Client,
    endpoint: String,
    request_interval: Duration,
}

impl NominatimClient {
    /// Create a client against `endpoint`, pausing `request_interval` between lookups.
    pub fn new(endpoint: &str, request_interval: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(http::USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(BotError::Api)?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            request_interval,
        })
    }

    /// Fetch the boundary of a single place.
    pub async fn fetch_boundary(&self, query: &str) -> Result<MultiPolygon<f64>> {
        let params = [
            ("q", query),
            ("format", "geojson"),
            ("polygon_geojson", "1"),
            ("limit", "1"),
        ];
        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(BotError::Api)?;

        let response = check_response(response).await?;
        let collection: FeatureCollection = response.json().await?;

        let feature = collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| BotError::GeodataMiss(query.to_string()))?;

        if let Some(name) = &feature.properties.display_name {
            debug!(query, matched = %name, "resolved place");
        }

        Ok(feature.geometry.into_multi_polygon())
    }

    /// Fetch one boundary per county, in the order given.
    pub async fn fetch_counties(&self, names: &[&str]) -> Result<Vec<MultiPolygon<f64>>> {
        let mut shapes = Vec::with_capacity(names.len());

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.request_interval).await;
            }
            info!(county = *name, "fetching {}/{}", i + 1, names.len());
            shapes.push(self.fetch_boundary(&place_query(name)).await?);
        }

        Ok(shapes)
    }
}
