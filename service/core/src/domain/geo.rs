// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! Geospatial value objects and collaborator seams.
//!
//! The core never does projection mathematics or map-service lookups itself.
//! It stores points in a fixed projected coordinate system and snapshots
//! water-body descriptors on events; both come from collaborators behind the
//! traits defined here, implemented in `crate::infrastructure`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::session::SessionType;

/// A point in the caller-facing source coordinate system (WGS 84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// A point in the projected storage coordinate system (LKS-94).
///
/// Only ever produced by a [`GeoProjector`]; persisted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: i32,
    pub name: String,
}

/// Snapshot of a resolved water body or administrative area, captured at
/// event time and stored with the event rather than live-joined on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDescriptor {
    pub id: String,
    pub name: String,
    pub municipality: Option<Municipality>,
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Coordinates out of projection bounds: ({x}, {y})")]
    OutOfBounds { x: f64, y: f64 },

    #[error("Geo service request failed: {0}")]
    Service(String),

    #[error("Geo service returned an unusable payload: {0}")]
    Payload(String),
}

/// Coordinate transformation collaborator.
///
/// Mutating ledger actions call `to_storage` before persisting geometry;
/// read paths returning geometry to callers go back through `to_display`.
/// A failure aborts the whole action, so no row/event pair is left half
/// committed with unprojected geometry.
pub trait GeoProjector: Send + Sync {
    fn to_storage(&self, coordinates: Coordinates) -> Result<GeoPoint, GeoError>;

    fn to_display(&self, point: GeoPoint) -> Result<Coordinates, GeoError>;
}

/// Water-body lookup collaborator.
///
/// Resolves the descriptor for a coordinate pair, shaped by the session type
/// (estuary fishing sections, inland rivers and lakes, polders). Callers of
/// the ledgers typically resolve up front and pass the snapshot in.
#[async_trait::async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(
        &self,
        coordinates: Coordinates,
        session_type: SessionType,
    ) -> Result<Option<LocationDescriptor>, GeoError>;
}
