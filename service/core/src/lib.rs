// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! FishTrail Core
//!
//! Session, gear-deployment and catch ledgers of the FishTrail fishing
//! journal: the auditable state machine regulators read and operators write.
//!
//! # Architecture
//!
//! - **domain**: aggregates, immutable events, repository contracts
//! - **application**: the ledgers and the history assembler
//! - **infrastructure**: in-memory and PostgreSQL repositories, config,
//!   geo collaborators

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
