//! REST implementation of [`ImportService`].

use async_trait::async_trait;
use import_common::{CheckResults, EntityKind, ImportRecord, ImportRunResult, ReferenceEntity};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::endpoints;
use crate::error::{ServiceError, ServiceResult};
use crate::service::ImportService;

/// Default API host; the data API lives under `/data`.
pub const DEFAULT_HOST: &str = "https://api.splashback.io";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const API_KEY_HEADER: &str = "api-key";
const API_KEY_PREFIX: &str = "API-Key";

/// Connection settings for the import API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub pool_id: i64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_key: String::new(),
            pool_id: 0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Body of a lookup creation request.
#[derive(Debug, Serialize)]
struct LookupObject<'a> {
    id: i64,
    key: &'a str,
    pool_id: i64,
}

/// HTTP client for one pool of the import API.
pub struct HttpImportService {
    client: Client,
    base_url: String,
    api_key: String,
    pool_id: i64,
}

impl HttpImportService {
    pub fn new(config: &ServiceConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/data", config.host.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            pool_id: config.pool_id,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            API_KEY_HEADER,
            format!("{} {}", API_KEY_PREFIX, self.api_key),
        )
    }

    /// Send a request and return the body text, mapping non-2xx to [`ServiceError::Status`].
    async fn send_raw(&self, request: RequestBuilder) -> ServiceResult<String> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ServiceResult<T> {
        let body = self.send_raw(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ImportService for HttpImportService {
    #[instrument(skip(self, records), fields(records = records.len()))]
    async fn check(&self, records: &[ImportRecord]) -> ServiceResult<CheckResults> {
        let url = endpoints::check_url(&self.base_url, self.pool_id);
        let results: CheckResults = self.send(self.client.post(&url).json(records)).await?;
        debug!(
            messages = results.messages.len(),
            has_error_message = results.has_error_message,
            "Import check complete"
        );
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn list_entities(&self, kind: EntityKind) -> ServiceResult<Vec<ReferenceEntity>> {
        let url = endpoints::collection_url(&self.base_url, kind, self.pool_id);
        let items: Vec<serde_json::Value> = self.send(self.client.get(&url)).await?;
        Ok(items.iter().filter_map(ReferenceEntity::from_json).collect())
    }

    #[instrument(skip(self, entity))]
    async fn create_entity(
        &self,
        kind: EntityKind,
        entity: &ReferenceEntity,
    ) -> ServiceResult<ReferenceEntity> {
        let url = endpoints::collection_url(&self.base_url, kind, self.pool_id);
        let created: serde_json::Value = self.send(self.client.post(&url).json(entity)).await?;
        Ok(ReferenceEntity::from_json(&created).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn create_lookup(&self, kind: EntityKind, key: &str, id: i64) -> ServiceResult<()> {
        let url = endpoints::lookup_url(&self.base_url, kind, self.pool_id);
        let lookup = LookupObject {
            id,
            key,
            pool_id: self.pool_id,
        };
        self.send_raw(self.client.post(&url).json(&lookup)).await?;
        Ok(())
    }

    #[instrument(skip(self, records), fields(records = records.len()))]
    async fn submit(&self, records: &[ImportRecord]) -> ServiceResult<ImportRunResult> {
        let url = endpoints::run_url(&self.base_url, self.pool_id);
        self.send(self.client.post(&url).json(records)).await
    }
}
