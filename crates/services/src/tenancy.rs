use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use exam_core::model::TenantId;

use crate::error::TenantError;

/// How a hostname maps into the tenant directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TenantKey {
    /// `acme.examhall.app` → `Subdomain("acme")`.
    Subdomain(String),
    /// A custom domain pointed at the platform, e.g. `lms.acme-school.org`.
    Domain(String),
}

impl TenantKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            TenantKey::Subdomain(value) | TenantKey::Domain(value) => value,
        }
    }
}

/// Derive the directory key for a request host.
///
/// Pure string work: strips any port, lowercases, and classifies against the
/// platform base domain. The apex and `www` carry no tenant (they serve the
/// landing surface), so they map to `None`.
#[must_use]
pub fn tenant_key_for_host(host: &str, base_domain: &str) -> Option<TenantKey> {
    let host = host.trim().rsplit_once(':').map_or(host.trim(), |(name, port)| {
        // Only treat the suffix as a port when it is numeric; IPv6 literals
        // are not expected here.
        if port.chars().all(|c| c.is_ascii_digit()) {
            name
        } else {
            host.trim()
        }
    });
    let host = host.to_ascii_lowercase();
    let base_domain = base_domain.to_ascii_lowercase();

    if host.is_empty() {
        return None;
    }
    if host == base_domain || host == format!("www.{base_domain}") {
        return None;
    }
    if let Some(subdomain) = host.strip_suffix(&format!(".{base_domain}")) {
        return Some(TenantKey::Subdomain(subdomain.to_string()));
    }
    Some(TenantKey::Domain(host))
}

/// A resolved tenant: branding inputs for the shell and the id every
/// backend call is scoped by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantProfile {
    pub tenant_id: TenantId,
    pub name: String,
}

/// Lookup boundary to the platform's tenant directory.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// # Errors
    ///
    /// Returns `TenantError` for transport failures; an unknown key is
    /// `Ok(None)`, not an error.
    async fn lookup(&self, key: &TenantKey) -> Result<Option<TenantProfile>, TenantError>;
}

//
// ─── HTTP DIRECTORY ────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TenantProfileDto {
    tenant_id: String,
    name: String,
}

#[derive(Clone)]
pub struct HttpTenantDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTenantDirectory {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TenantDirectory for HttpTenantDirectory {
    async fn lookup(&self, key: &TenantKey) -> Result<Option<TenantProfile>, TenantError> {
        let kind = match key {
            TenantKey::Subdomain(_) => "subdomain",
            TenantKey::Domain(_) => "domain",
        };
        let url = format!("{}/tenants/by-{kind}/{}", self.base_url, key.as_str());
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TenantError::HttpStatus(response.status()));
        }

        let dto: TenantProfileDto = response.json().await?;
        Ok(Some(TenantProfile {
            tenant_id: TenantId::new(dto.tenant_id),
            name: dto.name,
        }))
    }
}

//
// ─── STATIC DIRECTORY ──────────────────────────────────────────────────────────
//

/// Fixed key→profile table for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantDirectory {
    profiles: HashMap<TenantKey, TenantProfile>,
}

impl StaticTenantDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_profile(mut self, key: TenantKey, profile: TenantProfile) -> Self {
        self.profiles.insert(key, profile);
        self
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn lookup(&self, key: &TenantKey) -> Result<Option<TenantProfile>, TenantError> {
        Ok(self.profiles.get(key).cloned())
    }
}

//
// ─── RESOLVER ──────────────────────────────────────────────────────────────────
//

/// Resolves the viewer's hostname to a tenant profile at startup.
#[derive(Clone)]
pub struct TenantResolver {
    base_domain: String,
    directory: Arc<dyn TenantDirectory>,
}

impl TenantResolver {
    #[must_use]
    pub fn new(base_domain: impl Into<String>, directory: Arc<dyn TenantDirectory>) -> Self {
        Self {
            base_domain: base_domain.into(),
            directory,
        }
    }

    /// # Errors
    ///
    /// Returns `TenantError` for directory transport failures. A host with
    /// no tenant (apex, `www`, unknown key) resolves to `Ok(None)`.
    pub async fn resolve(&self, hostname: &str) -> Result<Option<TenantProfile>, TenantError> {
        let Some(key) = tenant_key_for_host(hostname, &self.base_domain) else {
            return Ok(None);
        };
        self.directory.lookup(&key).await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "examhall.app";

    #[test]
    fn subdomain_hosts_map_to_subdomain_keys() {
        assert_eq!(
            tenant_key_for_host("acme.examhall.app", BASE),
            Some(TenantKey::Subdomain("acme".to_string()))
        );
        assert_eq!(
            tenant_key_for_host("North.Campus.examhall.app", BASE),
            Some(TenantKey::Subdomain("north.campus".to_string()))
        );
    }

    #[test]
    fn foreign_hosts_map_to_domain_keys() {
        assert_eq!(
            tenant_key_for_host("lms.acme-school.org", BASE),
            Some(TenantKey::Domain("lms.acme-school.org".to_string()))
        );
    }

    #[test]
    fn apex_and_www_have_no_tenant() {
        assert_eq!(tenant_key_for_host("examhall.app", BASE), None);
        assert_eq!(tenant_key_for_host("www.examhall.app", BASE), None);
        assert_eq!(tenant_key_for_host("", BASE), None);
    }

    #[test]
    fn ports_are_stripped() {
        assert_eq!(
            tenant_key_for_host("acme.examhall.app:8080", BASE),
            Some(TenantKey::Subdomain("acme".to_string()))
        );
        assert_eq!(tenant_key_for_host("examhall.app:443", BASE), None);
    }

    #[tokio::test]
    async fn resolver_looks_up_known_tenants() {
        let directory = StaticTenantDirectory::new().with_profile(
            TenantKey::Subdomain("acme".to_string()),
            TenantProfile {
                tenant_id: TenantId::new("tn-acme"),
                name: "Acme Academy".to_string(),
            },
        );
        let resolver = TenantResolver::new(BASE, Arc::new(directory));

        let profile = resolver.resolve("acme.examhall.app").await.unwrap().unwrap();
        assert_eq!(profile.tenant_id, TenantId::new("tn-acme"));

        assert!(resolver.resolve("unknown.examhall.app").await.unwrap().is_none());
        assert!(resolver.resolve("examhall.app").await.unwrap().is_none());
    }
}
