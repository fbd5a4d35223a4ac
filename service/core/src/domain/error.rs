// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! Error taxonomy of the ledger core.
//!
//! Every variant except `Repository` and `RollbackFailed` is a
//! client-correctable validation failure: it propagates unchanged to the
//! caller, maps to a 4xx-style response in the transport layer, and is never
//! retried automatically: resubmitting the same request will fail the same
//! way until the input is corrected. Nothing here is fatal to the process.

use thiserror::Error;

use crate::domain::deployment::GearDeploymentId;
use crate::domain::gear::GearCategory;
use crate::domain::geo::GeoError;
use crate::domain::repository::RepositoryError;
use crate::domain::session::SessionId;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("A fishing session is already active for this operator")]
    AlreadyActive,

    #[error("No fishing session is active for this operator")]
    NotStarted,

    #[error("Cannot start a session with no registered gear")]
    NoGearAvailable,

    #[error("A deployment needs at least one gear item")]
    NoGearSelected,

    #[error("Referenced gear does not exist for this operator")]
    GearNotFound,

    #[error("Gear is already part of an active deployment")]
    GearInUse,

    #[error("Grouped gear must all share one gear type")]
    TooManyGearTypes,

    #[error("Only net-category gear may be grouped into one deployment")]
    InvalidGearCategory,

    #[error("Catch payload references an unknown species")]
    InvalidSpecies,

    #[error("Per-deployment catch was recorded but no shore weighing exists")]
    CatchNotWeighed,

    #[error("Deployment not found: {0}")]
    DeploymentNotFound(GearDeploymentId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Seal number is already registered: {0}")]
    SealNumberTaken(String),

    #[error("Calibration data does not fit gear category {expected:?}")]
    CalibrationMismatch { expected: GearCategory },

    #[error("Location lookup failed: {0}")]
    Location(#[from] GeoError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The compensating delete after a failed two-row write itself failed,
    /// leaving an orphaned row behind. Surfaced distinctly, never folded
    /// into the original failure: the orphan needs operational cleanup.
    #[error("Rollback after failed write also failed (orphaned row): {source}; cleanup: {cleanup}")]
    RollbackFailed {
        source: Box<LedgerError>,
        cleanup: RepositoryError,
    },
}

impl LedgerError {
    /// Stable machine-readable code carried alongside the human message.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AlreadyActive => "ALREADY_ACTIVE",
            LedgerError::NotStarted => "NOT_STARTED",
            LedgerError::NoGearAvailable => "NO_GEAR_AVAILABLE",
            LedgerError::NoGearSelected => "NO_GEAR_SELECTED",
            LedgerError::GearNotFound => "GEAR_NOT_FOUND",
            LedgerError::GearInUse => "GEAR_IN_USE",
            LedgerError::TooManyGearTypes => "TOO_MANY_GEAR_TYPES",
            LedgerError::InvalidGearCategory => "INVALID_GEAR_CATEGORY",
            LedgerError::InvalidSpecies => "INVALID_SPECIES",
            LedgerError::CatchNotWeighed => "CATCH_NOT_WEIGHED",
            LedgerError::DeploymentNotFound(_) => "DEPLOYMENT_NOT_FOUND",
            LedgerError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            LedgerError::SealNumberTaken(_) => "SEAL_NUMBER_TAKEN",
            LedgerError::CalibrationMismatch { .. } => "CALIBRATION_MISMATCH",
            LedgerError::Location(_) => "LOCATION_FAILED",
            LedgerError::Repository(_) => "REPOSITORY_FAILED",
            LedgerError::RollbackFailed { .. } => "ROLLBACK_FAILED",
        }
    }

    /// Whether the caller can fix this by correcting the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            LedgerError::Repository(_) | LedgerError::RollbackFailed { .. }
        )
    }
}
