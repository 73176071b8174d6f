//! Response-sheet sources: HTTP(S) and local files.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::instrument;

use gatemarks_core::error::FetchError;
use gatemarks_core::traits::SheetSource;

use crate::config::FetchConfig;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches response sheets from the exam portal over HTTP(S).
pub struct HttpSheetSource {
    client: reqwest::Client,
    /// Client without certificate verification, used only after a
    /// certificate failure.
    insecure: Option<reqwest::Client>,
    timeout_secs: u64,
}

impl HttpSheetSource {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let builder = || {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .user_agent(config.user_agent.clone())
        };

        let client = builder().build().context("failed to build HTTP client")?;
        let insecure = if config.insecure_fallback {
            Some(
                builder()
                    .danger_accept_invalid_certs(true)
                    .build()
                    .context("failed to build fallback HTTP client")?,
            )
        } else {
            None
        };

        Ok(Self {
            client,
            insecure,
            timeout_secs: config.timeout_secs,
        })
    }

    async fn download(&self, client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
        let response = client
            .get(url)
            .header("Accept", ACCEPT)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Http { status });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read body: {e}")))
    }

    fn classify(&self, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Network(error_chain(err))
        }
    }
}

/// reqwest keeps TLS details in the source chain, not the top-level message.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn is_certificate_error(err: &FetchError) -> bool {
    matches!(err, FetchError::Network(msg) if msg.to_lowercase().contains("certificate"))
}

fn check_scheme(location: &str) -> Result<(), FetchError> {
    let lower = location.trim().to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(FetchError::InvalidScheme(location.to_string()))
    }
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, location: &str) -> anyhow::Result<String> {
        check_scheme(location)?;
        let url = location.trim();

        match self.download(&self.client, url).await {
            Ok(html) => Ok(html),
            Err(err) if is_certificate_error(&err) => match &self.insecure {
                Some(insecure) => {
                    tracing::warn!("certificate verification failed, retrying unverified: {err}");
                    Ok(self.download(insecure, url).await?)
                }
                None => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        }
    }
}

/// Reads response sheets saved to disk.
#[derive(Debug, Default)]
pub struct FileSheetSource;

#[async_trait]
impl SheetSource for FileSheetSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, location: &str) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(location)
            .await
            .map_err(|e| FetchError::Io {
                path: location.to_string(),
                message: e.to_string(),
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Dispatches on the location: anything with a scheme goes to HTTP,
/// everything else is a file path.
pub struct AutoSheetSource {
    http: HttpSheetSource,
    file: FileSheetSource,
}

impl AutoSheetSource {
    pub fn new(http: HttpSheetSource) -> Self {
        Self {
            http,
            file: FileSheetSource,
        }
    }
}

#[async_trait]
impl SheetSource for AutoSheetSource {
    fn name(&self) -> &str {
        "auto"
    }

    async fn fetch(&self, location: &str) -> anyhow::Result<String> {
        if location.contains("://") {
            self.http.fetch(location).await
        } else {
            self.file.fetch(location).await
        }
    }
}
