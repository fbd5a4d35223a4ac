// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure Layer
//!
//! Concrete implementations of the domain's collaborator seams: in-memory
//! and PostgreSQL repositories, the connection pool wrapper, configuration
//! loading, and the geospatial collaborators.

pub mod config;
pub mod db;
pub mod geo;
pub mod repositories;
