// ── Tiered API facade ──
//
// Three tiers share one `RestClient` (and so one cookie jar) but differ in
// root URL and credentials:
//
//   Management  {service_root_url}/manage/v1   root client credentials
//   Instance    {service_root_url}/{inst}/api/v1   user credentials
//   Database    {instance_root}/Databases('{db}')  user credentials
//
// Each tier resolves its root and `Authorization` once, when constructed.
// A resolution failure therefore surfaces before any request is sent.

use std::path::Path;

use serde_json::{Value, json};
use tm1ctl_api::{Authorization, JsonObject, RestClient};
use tm1ctl_config::{
    Config, Overrides, resolve_database_root_url, resolve_host_config,
    resolve_instance_root_url, resolve_management_root_url, resolve_root_authorization,
    resolve_user_authorization,
};

use crate::error::CoreError;
use crate::odata::{self, entity_key};

/// Root URL plus credentials, shared by every tier.
#[derive(Debug, Clone)]
struct Tier {
    rest: RestClient,
    root: String,
    auth: Authorization,
}

impl Tier {
    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.root.clone()
        } else {
            format!("{}/{path}", self.root.trim_end_matches('/'))
        }
    }

    async fn get(&self, path: &str) -> Result<JsonObject, CoreError> {
        Ok(self.rest.get(&self.url(path), &self.auth).await?)
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Option<JsonObject>, CoreError> {
        Ok(self.rest.post(&self.url(path), &self.auth, payload).await?)
    }

    async fn delete(&self, path: &str) -> Result<(), CoreError> {
        Ok(self.rest.delete(&self.url(path), &self.auth).await?)
    }
}

// ── Management ──────────────────────────────────────────────────────

/// Host-level management API, authorized with the root client credentials.
#[derive(Debug, Clone)]
pub struct ManagementApi {
    tier: Tier,
}

impl ManagementApi {
    pub fn new(rest: RestClient, root_url: impl Into<String>, auth: Authorization) -> Self {
        Self {
            tier: Tier {
                rest,
                root: root_url.into(),
                auth,
            },
        }
    }

    /// Resolve the management tier of the effective host.
    pub fn resolve(
        rest: &RestClient,
        config: &Config,
        overrides: &Overrides,
    ) -> Result<Self, CoreError> {
        let host = resolve_host_config(config, overrides.host.as_deref())?;
        let root = resolve_management_root_url(config, Some(host.name()))?;
        let auth = resolve_root_authorization(
            &host,
            overrides.root_client_id.as_deref(),
            overrides.root_client_secret.as_ref(),
        )?;
        Ok(Self::new(rest.clone(), root, auth))
    }

    /// Root URL all paths of this tier are relative to.
    pub fn root_url(&self) -> &str {
        &self.tier.root
    }

    pub async fn get(&self, path: &str) -> Result<JsonObject, CoreError> {
        self.tier.get(path).await
    }

    pub async fn post(
        &self,
        path: &str,
        payload: &Value,
    ) -> Result<Option<JsonObject>, CoreError> {
        self.tier.post(path, payload).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), CoreError> {
        self.tier.delete(path).await
    }

    pub async fn list_instances(&self) -> Result<Vec<Value>, CoreError> {
        odata::collection(self.get("Instances").await?)
    }

    pub async fn get_instance(&self, name: &str) -> Result<JsonObject, CoreError> {
        Ok(odata::entity(self.get(&entity_key("Instances", name)).await?))
    }

    /// Create an instance; returns the created entity when the service sends one.
    pub async fn create_instance(&self, name: &str) -> Result<Option<JsonObject>, CoreError> {
        let created = self.post("Instances", &json!({ "Name": name })).await?;
        Ok(created.map(odata::entity))
    }

    pub async fn delete_instance(&self, name: &str) -> Result<(), CoreError> {
        self.delete(&entity_key("Instances", name)).await
    }
}

// ── Instance ────────────────────────────────────────────────────────

/// Instance API, authorized with the end-user credentials.
#[derive(Debug, Clone)]
pub struct InstanceApi {
    tier: Tier,
}

impl InstanceApi {
    pub fn new(rest: RestClient, root_url: impl Into<String>, auth: Authorization) -> Self {
        Self {
            tier: Tier {
                rest,
                root: root_url.into(),
                auth,
            },
        }
    }

    /// Resolve the effective instance of the effective host.
    pub fn resolve(
        rest: &RestClient,
        config: &Config,
        overrides: &Overrides,
    ) -> Result<Self, CoreError> {
        let root = resolve_instance_root_url(
            config,
            overrides.host.as_deref(),
            overrides.instance.as_deref(),
        )?;
        let auth = resolve_user_authorization(
            config,
            overrides.user.as_deref(),
            overrides.password.as_ref(),
        )?;
        Ok(Self::new(rest.clone(), root, auth))
    }

    /// Root URL all paths of this tier are relative to.
    pub fn root_url(&self) -> &str {
        &self.tier.root
    }

    pub async fn get(&self, path: &str) -> Result<JsonObject, CoreError> {
        self.tier.get(path).await
    }

    pub async fn post(
        &self,
        path: &str,
        payload: &Value,
    ) -> Result<Option<JsonObject>, CoreError> {
        self.tier.post(path, payload).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), CoreError> {
        self.tier.delete(path).await
    }

    pub async fn list_databases(&self) -> Result<Vec<Value>, CoreError> {
        odata::collection(self.get("Databases").await?)
    }

    pub async fn get_database(&self, name: &str) -> Result<JsonObject, CoreError> {
        Ok(odata::entity(self.get(&entity_key("Databases", name)).await?))
    }

    pub async fn create_database(&self, name: &str) -> Result<Option<JsonObject>, CoreError> {
        let created = self.post("Databases", &json!({ "Name": name })).await?;
        Ok(created.map(odata::entity))
    }

    pub async fn delete_database(&self, name: &str) -> Result<(), CoreError> {
        self.delete(&entity_key("Databases", name)).await
    }
}

// ── Database ────────────────────────────────────────────────────────

/// Database API, authorized with the end-user credentials.
#[derive(Debug, Clone)]
pub struct DatabaseApi {
    tier: Tier,
}

impl DatabaseApi {
    pub fn new(rest: RestClient, root_url: impl Into<String>, auth: Authorization) -> Self {
        Self {
            tier: Tier {
                rest,
                root: root_url.into(),
                auth,
            },
        }
    }

    /// Resolve the named database on the effective instance.
    ///
    /// The database must be given in `overrides`; there is no stored default.
    pub fn resolve(
        rest: &RestClient,
        config: &Config,
        overrides: &Overrides,
    ) -> Result<Self, CoreError> {
        let root = resolve_database_root_url(
            config,
            overrides.host.as_deref(),
            overrides.instance.as_deref(),
            overrides.database.as_deref(),
        )?;
        let auth = resolve_user_authorization(
            config,
            overrides.user.as_deref(),
            overrides.password.as_ref(),
        )?;
        Ok(Self::new(rest.clone(), root, auth))
    }

    /// Root URL all paths of this tier are relative to.
    pub fn root_url(&self) -> &str {
        &self.tier.root
    }

    pub async fn get(&self, path: &str) -> Result<JsonObject, CoreError> {
        self.tier.get(path).await
    }

    pub async fn post(
        &self,
        path: &str,
        payload: &Value,
    ) -> Result<Option<JsonObject>, CoreError> {
        self.tier.post(path, payload).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), CoreError> {
        self.tier.delete(path).await
    }

    /// PUT the raw bytes of `file` to `{root}/{path}`. Returns the bytes sent.
    pub async fn put_file(&self, path: &str, file: &Path) -> Result<u64, CoreError> {
        let url = self.tier.url(path);
        Ok(self.tier.rest.put_file(&url, &self.tier.auth, file).await?)
    }
}
