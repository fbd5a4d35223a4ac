// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! Application Layer
//!
//! The ledgers and read assemblers, as application services over the domain
//! repositories. Each service is request-scoped: it reads what it needs,
//! writes at most a handful of rows, and holds no mutable state of its own.

pub mod catch_ledger;
pub mod deployment_ledger;
pub mod gear_registry;
pub mod history;
pub mod session_ledger;

pub use catch_ledger::CatchLedger;
pub use deployment_ledger::DeploymentLedger;
pub use gear_registry::{GearRegistry, RegisteredGear};
pub use history::{HistoryAssembler, TimelineEntry, TimelineEntryKind};
pub use session_ledger::SessionLedger;
