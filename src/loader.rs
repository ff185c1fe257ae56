//! Fetches the pre-built JSON resources and caches them for an hour.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use snafu::ResultExt;
use tracing::{debug, info, warn};

use crate::cache::TimeBoxedCache;
use crate::config::{Environment, Settings};
use crate::error::{DeserializationSnafu, IoSnafu, Result, UnavailableSnafu};
use crate::network::HttpTransport;

/// The static resources served as `{ "result": [...] }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Skills,
    Education,
    Courses,
    Jobs,
    Technologies,
    Projects,
    Travel,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Skills,
        Resource::Education,
        Resource::Courses,
        Resource::Jobs,
        Resource::Technologies,
        Resource::Projects,
        Resource::Travel,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Resource::Skills => "skills.json",
            Resource::Education => "education.json",
            Resource::Courses => "courses.json",
            Resource::Jobs => "jobs.json",
            Resource::Technologies => "technologies.json",
            Resource::Projects => "projects.json",
            Resource::Travel => "travel.json",
        }
    }

    /// Human label used in loading and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Resource::Skills => "skills",
            Resource::Education => "education",
            Resource::Courses => "courses",
            Resource::Jobs => "experience",
            Resource::Technologies => "technologies",
            Resource::Projects => "projects",
            Resource::Travel => "travels",
        }
    }

    pub fn cache_key(self) -> String {
        format!("{}_cache", self.file_name().trim_end_matches(".json"))
    }
}

/// Where resources come from: the production origin or a local directory.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    Remote { base_url: String },
    Local { root: PathBuf },
}

impl ContentSource {
    pub fn select(settings: &Settings) -> Self {
        match settings.environment {
            Environment::Production => ContentSource::Remote {
                base_url: settings.production_url.trim_end_matches('/').to_string(),
            },
            Environment::Development => ContentSource::Local {
                root: PathBuf::from(shellexpand::tilde(&settings.local_path).into_owned()),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ContentSource::Remote { base_url } => base_url.clone(),
            ContentSource::Local { root } => root.display().to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    result: Vec<Value>,
}

pub struct ContentLoader {
    source: ContentSource,
    transport: Arc<dyn HttpTransport>,
    cache: TimeBoxedCache,
}

impl ContentLoader {
    pub fn new(source: ContentSource, transport: Arc<dyn HttpTransport>, cache: TimeBoxedCache) -> Self {
        Self {
            source,
            transport,
            cache,
        }
    }

    /// Cached array on a hit; otherwise fetch, unwrap `result`, write through.
    /// A failed fetch leaves the cache as it was.
    pub async fn load(&self, resource: Resource) -> Result<Vec<Value>> {
        let key = resource.cache_key();
        if let Some(Value::Array(items)) = self.cache.get(&key) {
            debug!(resource = resource.file_name(), "cache hit");
            return Ok(items);
        }

        let body = self.fetch_body(resource).await?;
        let envelope: Envelope = serde_json::from_str(&body).context(DeserializationSnafu {
            what: resource.file_name(),
        })?;
        info!(resource = resource.file_name(), items = envelope.result.len(), "loaded");
        self.cache.set(&key, &Value::Array(envelope.result.clone()));
        Ok(envelope.result)
    }

    async fn fetch_body(&self, resource: Resource) -> Result<String> {
        match &self.source {
            ContentSource::Remote { base_url } => {
                snafu::ensure!(
                    !base_url.is_empty(),
                    UnavailableSnafu {
                        message: "production_url is not configured"
                    }
                );
                let url = format!("{base_url}/{}", resource.file_name());
                let response = self.transport.get(&url).await.inspect_err(|e| {
                    warn!(url, error = %e, "content fetch failed");
                })?;
                crate::network::ensure_success(&response, &url)?;
                Ok(response.body)
            }
            ContentSource::Local { root } => {
                let path = root.join(resource.file_name());
                tokio::fs::read_to_string(&path).await.context(IoSnafu { path })
            }
        }
    }
}
