// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Shared wiring for the ledger integration tests: every service built over
//! the in-memory repositories with a passthrough projector, plus seeded
//! gear-type and species catalogs.

use std::sync::Arc;

use fishtrail_core::application::{
    CatchLedger, DeploymentLedger, GearRegistry, HistoryAssembler, SessionLedger,
};
use fishtrail_core::domain::gear::{
    Gear, GearCalibration, GearCategory, GearType,
};
use fishtrail_core::domain::geo::Coordinates;
use fishtrail_core::domain::scope::{OperatorId, OperatorScope};
use fishtrail_core::domain::species::{Species, SpeciesId};
use fishtrail_core::infrastructure::geo::PassthroughProjector;
use fishtrail_core::infrastructure::repositories::{
    InMemoryCatchWeighingRepository, InMemoryDeploymentEventRepository,
    InMemoryDeploymentRepository, InMemoryGearRepository, InMemoryGearTypeRepository,
    InMemorySessionEventRepository, InMemorySessionRepository,
    InMemorySpeciesRepository,
};

pub struct Harness {
    pub scope: OperatorScope,

    pub sessions: Arc<InMemorySessionRepository>,
    pub session_events: Arc<InMemorySessionEventRepository>,
    pub gear: Arc<InMemoryGearRepository>,
    pub gear_types: Arc<InMemoryGearTypeRepository>,
    pub species: Arc<InMemorySpeciesRepository>,
    pub deployments: Arc<InMemoryDeploymentRepository>,
    pub deployment_events: Arc<InMemoryDeploymentEventRepository>,
    pub weighings: Arc<InMemoryCatchWeighingRepository>,

    pub session_ledger: SessionLedger,
    pub deployment_ledger: DeploymentLedger,
    pub catch_ledger: Arc<CatchLedger>,
    pub history: HistoryAssembler,
    pub registry: GearRegistry,

    pub net_type: GearType,
    pub catcher_type: GearType,
    pub second_net_type: GearType,
    pub pike: SpeciesId,
    pub perch: SpeciesId,
}

impl Harness {
    pub fn new() -> Self {
        let scope = OperatorScope::personal(OperatorId::new());

        let sessions = Arc::new(InMemorySessionRepository::new());
        let session_events = Arc::new(InMemorySessionEventRepository::new());
        let gear = Arc::new(InMemoryGearRepository::new());
        let gear_types = Arc::new(InMemoryGearTypeRepository::new());
        let species = Arc::new(InMemorySpeciesRepository::new());
        let deployments = Arc::new(InMemoryDeploymentRepository::new());
        let deployment_events = Arc::new(InMemoryDeploymentEventRepository::new());
        let weighings = Arc::new(InMemoryCatchWeighingRepository::new());
        let projector = Arc::new(PassthroughProjector);

        let net_type = GearType::new("Statomasis tinklaitis", GearCategory::Net);
        let second_net_type = GearType::new("Traukiamasis tinklas", GearCategory::Net);
        let catcher_type = GearType::new("Marinė gaudyklė", GearCategory::Catcher);
        gear_types.insert(net_type.clone());
        gear_types.insert(second_net_type.clone());
        gear_types.insert(catcher_type.clone());

        let pike_species = Species::new("lydekos");
        let perch_species = Species::new("sterkai");
        let pike = pike_species.id;
        let perch = perch_species.id;
        species.insert(pike_species);
        species.insert(perch_species);

        let session_ledger = SessionLedger::new(
            sessions.clone(),
            session_events.clone(),
            gear.clone(),
            weighings.clone(),
            projector.clone(),
        );
        let catch_ledger = Arc::new(CatchLedger::new(
            weighings.clone(),
            species.clone(),
            deployments.clone(),
            sessions.clone(),
            projector.clone(),
        ));
        let deployment_ledger = DeploymentLedger::new(
            deployments.clone(),
            deployment_events.clone(),
            gear.clone(),
            gear_types.clone(),
            sessions.clone(),
            weighings.clone(),
            catch_ledger.clone(),
            projector.clone(),
        );
        let history = HistoryAssembler::new(
            sessions.clone(),
            session_events.clone(),
            deployment_events.clone(),
            weighings.clone(),
            projector.clone(),
        );
        let registry = GearRegistry::new(
            gear.clone(),
            gear_types.clone(),
            species.clone(),
            deployments.clone(),
        );

        Self {
            scope,
            sessions,
            session_events,
            gear,
            gear_types,
            species,
            deployments,
            deployment_events,
            weighings,
            session_ledger,
            deployment_ledger,
            catch_ledger,
            history,
            registry,
            net_type,
            catcher_type,
            second_net_type,
            pike,
            perch,
        }
    }

    pub fn coords(&self) -> Coordinates {
        Coordinates {
            x: 21.1175,
            y: 55.3072,
        }
    }

    /// Register a net for the harness scope.
    pub async fn net(&self, seal: &str) -> Gear {
        self.registry
            .register(
                &self.scope,
                seal.to_string(),
                self.net_type.id,
                30,
                GearCalibration::Net { net_length_m: 60 },
            )
            .await
            .expect("net registration failed")
    }

    /// Register a catcher for the harness scope.
    pub async fn catcher(&self, seal: &str) -> Gear {
        self.registry
            .register(
                &self.scope,
                seal.to_string(),
                self.catcher_type.id,
                40,
                GearCalibration::Catcher {
                    secondary_eye_size_mm: 14,
                },
            )
            .await
            .expect("catcher registration failed")
    }
}
