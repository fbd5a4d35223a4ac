// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Geospatial Collaborators
//!
//! - [`PassthroughProjector`]: identity `GeoProjector` for development and
//!   tests, where fixtures already carry storage-CRS values. Production
//!   wires a real LKS-94 transform behind the same trait; the mathematics
//!   is outside this crate.
//! - [`GeoServerClient`]: `LocationResolver` against the national UETK
//!   QGIS server: WMS `GetFeatureInfo` bbox queries for rivers/lakes,
//!   estuary fishing sections and municipalities.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::geo::{
    Coordinates, GeoError, GeoPoint, GeoProjector, LocationDescriptor, LocationResolver,
    Municipality,
};
use crate::domain::session::SessionType;

/// Identity projection for development and tests.
pub struct PassthroughProjector;

impl GeoProjector for PassthroughProjector {
    fn to_storage(&self, coordinates: Coordinates) -> Result<GeoPoint, GeoError> {
        Ok(GeoPoint {
            x: coordinates.x,
            y: coordinates.y,
        })
    }

    fn to_display(&self, point: GeoPoint) -> Result<Coordinates, GeoError> {
        Ok(Coordinates {
            x: point.x,
            y: point.y,
        })
    }
}

// GetFeatureInfo responses are GeoJSON-shaped: a feature list with
// free-form properties per layer.
#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Value,
}

pub struct GeoServerClient {
    base_url: String,
    client: Client,
    projector: std::sync::Arc<dyn GeoProjector>,
}

impl GeoServerClient {
    pub fn new(
        base_url: impl Into<String>,
        projector: std::sync::Arc<dyn GeoProjector>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
            projector,
        }
    }

    /// Square bbox around a projected point, `x1,y1,x2,y2`.
    fn bbox(point: GeoPoint, tolerance: f64) -> String {
        format!(
            "{},{},{},{}",
            point.x - tolerance,
            point.y - tolerance,
            point.x + tolerance,
            point.y + tolerance
        )
    }

    async fn feature_info(
        &self,
        service: &str,
        layers: &str,
        bbox: &str,
    ) -> Result<FeatureCollection, GeoError> {
        let url = format!(
            "{}/qgisserver/{}?SERVICE=WMS&VERSION=1.1.1&REQUEST=GetFeatureInfo\
             &QUERY_LAYERS={}&INFO_FORMAT=application%2Fjson&FEATURE_COUNT=1000\
             &X=50&Y=50&SRS=EPSG%3A3346&STYLES=&WIDTH=101&HEIGHT=101&BBOX={}",
            self.base_url, service, layers, bbox
        );
        debug!(%url, "querying geo server");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeoError::Service(e.to_string()))?;
        if !response.status().is_success() {
            return Err(GeoError::Service(format!(
                "Geo server returned {}",
                response.status()
            )));
        }
        response
            .json::<FeatureCollection>()
            .await
            .map_err(|e| GeoError::Payload(e.to_string()))
    }

    async fn municipality(&self, point: GeoPoint) -> Result<Option<Municipality>, GeoError> {
        let info = self
            .feature_info(
                "administrative_boundaries",
                "municipalities",
                &Self::bbox(point, 0.001),
            )
            .await?;

        Ok(info.features.first().and_then(|f| {
            let code = f.properties.get("code")?.as_str()?.parse().ok()?;
            let name = f.properties.get("name")?.as_str()?.to_string();
            Some(Municipality { id: code, name })
        }))
    }

    async fn river_or_lake(
        &self,
        point: GeoPoint,
    ) -> Result<Option<LocationDescriptor>, GeoError> {
        let info = self
            .feature_info(
                "uetk_public",
                "upes%2Cezerai_tvenkiniai",
                &Self::bbox(point, 200.0),
            )
            .await?;
        let Some(feature) = info.features.first() else {
            return Ok(None);
        };

        // UETK publishes human-labelled property keys.
        let id = feature
            .properties
            .get("2. Kadastro identifikavimo kodas")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GeoError::Payload("Missing cadastral id property".into()))?;
        let name = feature
            .properties
            .get("1. Pavadinimas")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        Ok(Some(LocationDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            municipality: self.municipality(point).await?,
        }))
    }

    async fn fishing_section(
        &self,
        point: GeoPoint,
    ) -> Result<Option<LocationDescriptor>, GeoError> {
        let info = self
            .feature_info("zuvinimas_barai", "fishing_sections", &Self::bbox(point, 0.001))
            .await?;
        let Some(feature) = info.features.first() else {
            return Ok(None);
        };

        let id = feature
            .properties
            .get("id")
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
            .ok_or_else(|| GeoError::Payload("Missing section id property".into()))?;
        let name = feature
            .properties
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        Ok(Some(LocationDescriptor {
            id,
            name: name.to_string(),
            municipality: self.municipality(point).await?,
        }))
    }
}

#[async_trait::async_trait]
impl LocationResolver for GeoServerClient {
    async fn resolve(
        &self,
        coordinates: Coordinates,
        session_type: SessionType,
    ) -> Result<Option<LocationDescriptor>, GeoError> {
        let point = self.projector.to_storage(coordinates)?;
        match session_type {
            SessionType::InlandWaters => self.river_or_lake(point).await,
            SessionType::Estuary => self.fishing_section(point).await,
            SessionType::Polders => Ok(Some(LocationDescriptor {
                id: "POLDERS".to_string(),
                name: "Polderiai".to_string(),
                municipality: self.municipality(point).await?,
            })),
        }
    }
}
