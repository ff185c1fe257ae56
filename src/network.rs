use async_trait::async_trait;
use reqwest::header::{LINK, USER_AGENT};
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use tracing::debug;

use crate::error::{DeserializationSnafu, HttpSnafu, Result, StatusSnafu};

/// The parts of an HTTP response the loader and stats client look at.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub link: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails with `Status` on a non-2xx response, otherwise parses the body.
    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        ensure_success(self, url)?;
        serde_json::from_str(&self.body).context(DeserializationSnafu { what: url })
    }
}

pub fn ensure_success(response: &HttpResponse, url: &str) -> Result<()> {
    snafu::ensure!(
        response.is_success(),
        StatusSnafu {
            url,
            status: response.status
        }
    );
    Ok(())
}

/// Read-only GET transport. The production implementation is `ReqwestTransport`;
/// tests substitute canned responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: format!("folio/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url, "GET");
        // api.github.com rejects requests without a user agent
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .context(HttpSnafu { url })?;
        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.context(HttpSnafu { url })?;
        Ok(HttpResponse { status, link, body })
    }
}

#[cfg(test)]
pub mod fake {
    //! Canned transport shared by loader and stats tests.
    use super::*;
    use crate::error::UnavailableSnafu;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeTransport {
        routes: Mutex<HashMap<String, HttpResponse>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(self, url: &str, status: u16, body: &str) -> Self {
            self.route_with_link(url, status, body, None)
        }

        pub fn route_with_link(self, url: &str, status: u16, body: &str, link: Option<&str>) -> Self {
            self.routes.lock().unwrap().insert(
                url.to_string(),
                HttpResponse {
                    status,
                    link: link.map(str::to_string),
                    body: body.to_string(),
                },
            );
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.routes.lock().unwrap().get(url) {
                Some(response) => Ok(response.clone()),
                None => UnavailableSnafu {
                    message: format!("no route for {url}"),
                }
                .fail(),
            }
        }
    }
}
