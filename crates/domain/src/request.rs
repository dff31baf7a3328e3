//! Provisioning request input types.
//!
//! A [`ProvisioningRequest`] is assembled once by the caller (typically the
//! onboarding API) and never mutated afterwards; the saga reads it and the
//! durable-execution substrate may persist it, so everything here is serde.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tenant::{TenantId, TenantKey, TenantTier};

/// A tenant contact; exactly one contact per request is expected to be
/// marked primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub primary: bool,
}

impl Contact {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            primary: false,
        }
    }

    pub fn primary(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            primary: true,
        }
    }
}

/// Subscription descriptor attached to a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub plan_id: String,
    pub tier: TenantTier,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Identity-provider configuration for the new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpConfig {
    /// Provider name, e.g. "auth0" or "keycloak"
    pub provider: String,
    /// Create a dedicated identity organization for the tenant
    pub create_organization: bool,
    /// Create the initial admin user inside the organization
    pub create_admin_user: bool,
    #[serde(default)]
    pub sso_enabled: bool,
    #[serde(default)]
    pub mfa_required: bool,
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            provider: "internal".to_string(),
            create_organization: false,
            create_admin_user: false,
            sso_enabled: false,
            mfa_required: false,
        }
    }
}

/// Immutable input for one provisioning saga execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    pub tenant_id: TenantId,
    pub tenant_key: TenantKey,
    pub display_name: String,
    pub tier: TenantTier,
    #[serde(default)]
    pub domains: Vec<String>,
    pub contacts: Vec<Contact>,
    pub subscription: Subscription,
    pub idp_config: IdpConfig,
    #[serde(default)]
    pub custom_variables: HashMap<String, String>,
}

impl ProvisioningRequest {
    /// Start building a request for the given key and tier.
    pub fn builder(tenant_key: TenantKey, tier: TenantTier) -> ProvisioningRequestBuilder {
        ProvisioningRequestBuilder::new(tenant_key, tier)
    }

    /// The contact marked primary, if the request carries one.
    pub fn primary_contact(&self) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.primary)
    }
}

/// Builder for [`ProvisioningRequest`].
#[derive(Debug, Clone)]
pub struct ProvisioningRequestBuilder {
    tenant_id: TenantId,
    tenant_key: TenantKey,
    display_name: String,
    tier: TenantTier,
    domains: Vec<String>,
    contacts: Vec<Contact>,
    subscription: Option<Subscription>,
    idp_config: IdpConfig,
    custom_variables: HashMap<String, String>,
}

impl ProvisioningRequestBuilder {
    pub fn new(tenant_key: TenantKey, tier: TenantTier) -> Self {
        let display_name = tenant_key.as_str().to_string();
        Self {
            tenant_id: TenantId::new(),
            tenant_key,
            display_name,
            tier,
            domains: Vec::new(),
            contacts: Vec::new(),
            subscription: None,
            idp_config: IdpConfig::default(),
            custom_variables: HashMap::new(),
        }
    }

    pub fn with_tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domains.push(domain.into());
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contacts.push(contact);
        self
    }

    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = Some(subscription);
        self
    }

    pub fn with_idp_config(mut self, idp_config: IdpConfig) -> Self {
        self.idp_config = idp_config;
        self
    }

    pub fn with_custom_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.custom_variables.insert(key.into(), value.into());
        self
    }

    /// Assemble the request. A missing subscription defaults to an
    /// open-ended plan on the request's tier, starting now.
    pub fn build(self) -> ProvisioningRequest {
        let subscription = self.subscription.unwrap_or(Subscription {
            plan_id: format!("{}-standard", self.tier.as_str()),
            tier: self.tier,
            start_date: chrono::Utc::now(),
            end_date: None,
        });
        ProvisioningRequest {
            tenant_id: self.tenant_id,
            tenant_key: self.tenant_key,
            display_name: self.display_name,
            tier: self.tier,
            domains: self.domains,
            contacts: self.contacts,
            subscription,
            idp_config: self.idp_config,
            custom_variables: self.custom_variables,
        }
    }
}
