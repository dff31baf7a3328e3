//! Core tenant identity types.
//!
//! [`TenantKey`] is the externally visible slug used to derive resource
//! names (schemas, buckets, DNS); it is validated at construction so every
//! downstream consumer can rely on it being a well-formed slug.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// A nil id is the "absent" sentinel carried by deserialized requests
    /// that never set one.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from tenant key validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantKeyError {
    #[error("tenant key must not be empty")]
    Empty,

    #[error("tenant key must be 3 to 50 characters, got {0}")]
    Length(usize),

    #[error("tenant key must start with a lowercase letter")]
    InvalidStart,

    #[error("tenant key contains invalid character '{0}'")]
    InvalidChar(char),
}

/// Validated tenant slug.
///
/// Keys must match `^[a-z][a-z0-9_-]{2,49}$`: they seed schema names,
/// bucket names and DNS labels, so anything outside that alphabet is
/// rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantKey(String);

impl TenantKey {
    pub fn new(key: impl Into<String>) -> Result<Self, TenantKeyError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TenantKeyError::Empty);
        }
        if key.len() < 3 || key.len() > 50 {
            return Err(TenantKeyError::Length(key.len()));
        }
        let mut chars = key.chars();
        if let Some(first) = chars.next() {
            if !first.is_ascii_lowercase() {
                return Err(TenantKeyError::InvalidStart);
            }
        }
        for c in chars {
            if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-') {
                return Err(TenantKeyError::InvalidChar(c));
            }
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TenantKey {
    type Err = TenantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TenantKey {
    type Error = TenantKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TenantKey> for String {
    fn from(key: TenantKey) -> Self {
        key.0
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provisioning isolation level for a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantTier {
    /// Shared infrastructure
    Pooled,
    /// Dedicated infrastructure
    Silo,
    /// Intermediate: shared compute, dedicated data stores
    Bridge,
}

impl TenantTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantTier::Pooled => "pooled",
            TenantTier::Silo => "silo",
            TenantTier::Bridge => "bridge",
        }
    }

    /// Silo tenants get their own infrastructure stack during provisioning.
    pub fn requires_dedicated_infrastructure(&self) -> bool {
        matches!(self, TenantTier::Silo)
    }
}

impl fmt::Display for TenantTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TenantTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pooled" => Ok(TenantTier::Pooled),
            "silo" => Ok(TenantTier::Silo),
            "bridge" => Ok(TenantTier::Bridge),
            other => Err(format!(
                "unknown tier '{}', expected one of: pooled, silo, bridge",
                other
            )),
        }
    }
}

/// Lifecycle states of a tenant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Registered, provisioning not yet started
    Pending,
    /// Provisioning saga in flight
    Provisioning,
    /// Fully provisioned and reachable
    Active,
    /// Provisioning aborted; resources compensated
    Failed,
    /// Administratively disabled
    Deactivated,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Pending => "pending",
            TenantStatus::Provisioning => "provisioning",
            TenantStatus::Active => "active",
            TenantStatus::Failed => "failed",
            TenantStatus::Deactivated => "deactivated",
        }
    }

    /// Terminal states are never left by the provisioning saga.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TenantStatus::Active | TenantStatus::Failed | TenantStatus::Deactivated
        )
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tenant as stored in the tenant registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    pub tenant_id: TenantId,
    pub tenant_key: TenantKey,
    pub display_name: String,
    pub tier: TenantTier,
    pub status: TenantStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
