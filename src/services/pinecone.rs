//! Pinecone serverless index: control-plane setup and data-plane upserts.

use super::http::{build_client, require, send_json};
use super::{VectorRecord, VectorStore};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

const API_VERSION: &str = "2024-07";
const READY_POLL_ATTEMPTS: usize = 30;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Vector store backed by one Pinecone index.
///
/// The data-plane host is resolved by [`VectorStore::ensure_index`]; upserts
/// before that fail with a configuration error.
pub struct PineconeStore {
    client: Client,
    control_url: String,
    index: IndexSpec,
    host: OnceLock<String>,
}

#[derive(Debug, Clone, Serialize)]
struct IndexSpec {
    name: String,
    dimension: usize,
    metric: String,
    spec: ServerlessSpec,
}

#[derive(Debug, Clone, Serialize)]
struct ServerlessSpec {
    serverless: CloudRegion,
}

#[derive(Debug, Clone, Serialize)]
struct CloudRegion {
    cloud: String,
    region: String,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: [&'a VectorRecord; 1],
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(default, rename = "upsertedCount")]
    upserted_count: Option<usize>,
}

impl PineconeStore {
    /// Build a client for the index described by `config`.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        require("vector store", "API key", &config.vector_api_key)?;
        require("vector store", "index name", &config.index_name)?;
        if config.dimension == 0 {
            return Err(Error::Config("vector dimension must be positive".into()));
        }
        let client = build_client(
            "vector store",
            config.timeout,
            Some(("api-key", config.vector_api_key.trim().to_string())),
        )?;
        Ok(Self {
            client,
            control_url: config.vector_control_url.trim_end_matches('/').to_string(),
            index: IndexSpec {
                name: config.index_name.clone(),
                dimension: config.dimension,
                metric: config.metric.clone(),
                spec: ServerlessSpec {
                    serverless: CloudRegion {
                        cloud: config.cloud.clone(),
                        region: config.region.clone(),
                    },
                },
            },
            host: OnceLock::new(),
        })
    }

    /// Name of the target index.
    pub fn index_name(&self) -> &str {
        &self.index.name
    }

    fn list_indexes(&self) -> Result<IndexList> {
        let url = format!("{}/indexes", self.control_url);
        send_json(
            "vector store",
            self.client.get(url).header("x-pinecone-api-version", API_VERSION),
        )
    }

    fn describe_index(&self) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.control_url, self.index.name);
        send_json(
            "vector store",
            self.client.get(url).header("x-pinecone-api-version", API_VERSION),
        )
    }

    fn create_index(&self) -> Result<()> {
        log::info!(
            "Creating index {} (dimension {}, metric {})",
            self.index.name,
            self.index.dimension,
            self.index.metric
        );
        let url = format!("{}/indexes", self.control_url);
        let request = self
            .client
            .post(url)
            .header("x-pinecone-api-version", API_VERSION)
            .json(&self.index);
        match send_json::<serde_json::Value>("vector store", request) {
            Ok(_) => Ok(()),
            // Lost a race with another creator.
            Err(Error::ServiceStatus { status: 409, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn wait_until_ready(&self) -> Result<IndexDescription> {
        for attempt in 1..=READY_POLL_ATTEMPTS {
            let description = self.describe_index()?;
            if description.status.ready {
                return Ok(description);
            }
            log::debug!(
                "Index {} not ready yet (poll {}/{})",
                self.index.name,
                attempt,
                READY_POLL_ATTEMPTS
            );
            thread::sleep(READY_POLL_INTERVAL);
        }
        Err(Error::Config(format!(
            "index {} did not become ready",
            self.index.name
        )))
    }

    fn check_dimension(&self, description: &IndexDescription) -> Result<()> {
        match description.dimension {
            Some(found) if found != self.index.dimension => Err(Error::DimensionMismatch {
                expected: self.index.dimension,
                found,
            }),
            _ => Ok(()),
        }
    }
}

impl VectorStore for PineconeStore {
    fn dimension(&self) -> usize {
        self.index.dimension
    }

    fn ensure_index(&self) -> Result<()> {
        if self.host.get().is_some() {
            return Ok(());
        }
        let exists = self
            .list_indexes()?
            .indexes
            .iter()
            .any(|index| index.name == self.index.name);
        if !exists {
            self.create_index()?;
        }
        let description = self.wait_until_ready()?;
        self.check_dimension(&description)?;
        let host = description
            .host
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| Error::malformed("vector store", "index description has no host"))?;
        log::info!("Index {} ready at {}", description.name, host);
        let _ = self.host.set(host);
        Ok(())
    }

    fn upsert(&self, record: &VectorRecord) -> Result<()> {
        let host = self.host.get().ok_or_else(|| {
            Error::Config(format!(
                "index {} has not been set up; call ensure_index first",
                self.index.name
            ))
        })?;
        let url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/vectors/upsert", host.trim_end_matches('/'))
        } else {
            format!("https://{}/vectors/upsert", host)
        };
        let request = self
            .client
            .post(url)
            .header("x-pinecone-api-version", API_VERSION)
            .json(&UpsertRequest { vectors: [record] });
        let response: UpsertResponse = send_json("vector store", request)?;
        log::debug!(
            "Upserted {} ({} vector(s))",
            record.id,
            response.upserted_count.unwrap_or(1)
        );
        Ok(())
    }
}
