// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an individual operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorId(pub Uuid);

impl OperatorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for OperatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an organization tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The resolved identity a request acts under.
///
/// Sessions, gear, deployments and weighings are all owned by a scope, and
/// every ledger lookup filters by it: gear exclusivity and the
/// single-active-session rule hold within a scope, not globally.
///
/// An operator working under an organization profile acts in tenant scope;
/// records written by any member of the tenant are visible to the whole
/// tenant. Without a tenant profile the operator acts in personal scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorScope {
    pub operator: OperatorId,
    pub tenant: Option<TenantId>,
}

impl OperatorScope {
    pub fn personal(operator: OperatorId) -> Self {
        Self {
            operator,
            tenant: None,
        }
    }

    pub fn tenant(operator: OperatorId, tenant: TenantId) -> Self {
        Self {
            operator,
            tenant: Some(tenant),
        }
    }

    /// Whether a record owned by `owner` is visible to this scope.
    ///
    /// Tenant scope matches on the tenant alone; personal scope matches the
    /// operator's own tenant-less records.
    pub fn owns(&self, owner: &OperatorScope) -> bool {
        match self.tenant {
            Some(tenant) => owner.tenant == Some(tenant),
            None => owner.tenant.is_none() && owner.operator == self.operator,
        }
    }
}

impl std::fmt::Display for OperatorScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tenant {
            Some(tenant) => write!(f, "tenant:{}", tenant),
            None => write!(f, "operator:{}", self.operator),
        }
    }
}
