//! Streaming archive download.
//!
//! Bodies are written to disk chunk by chunk as they arrive, so memory use
//! stays flat regardless of archive size. No retries happen here.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;
use crate::paths::filename_from_url;

/// Failures while fetching a remote archive.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport-level failure (DNS, connect, TLS, reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The request did not finish within the configured timeout.
    #[error("Download of {url} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured limit.
        timeout: Duration,
    },

    /// Writing the destination failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Retrieves a URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` into `dest`, creating parent directories as needed.
    /// Returns the number of bytes written.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn Reporter,
    ) -> Result<u64, DownloadError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Http`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> DownloadError {
        if err.is_timeout() {
            DownloadError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            DownloadError::Http(err)
        }
    }

    async fn stream_to(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn Reporter,
    ) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let name = filename_from_url(url);
        let total_size = response.content_length();
        reporter.downloading(name, 0, total_size);

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.classify(url, e))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            reporter.downloading(name, downloaded, total_size);
        }

        file.flush().await?;
        Ok(downloaded)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn Reporter,
    ) -> Result<u64, DownloadError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::debug!(%url, dest = %dest.display(), "fetching");
        let result = self.stream_to(url, dest, reporter).await;
        if result.is_err() {
            tokio::fs::remove_file(dest).await.ok();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use mockito::Server;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fetch_writes_body_and_creates_parents() {
        let mut server = Server::new_async().await;
        let body = vec![7u8; 200_000];
        let m = server
            .mock("GET", "/1.0.0/asset.tar.gz")
            .match_header("user-agent", crate::USER_AGENT)
            .with_status(200)
            .with_body(&body)
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested/deeper/asset.tar.gz");
        let fetcher = HttpFetcher::new(Duration::from_secs(10)).unwrap();

        let written = fetcher
            .fetch(
                &format!("{}/1.0.0/asset.tar.gz", server.url()),
                &dest,
                &NullReporter,
            )
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_success_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("missing.zip");
        let fetcher = HttpFetcher::new(Duration::from_secs(10)).unwrap();

        let err = fetcher
            .fetch(&format!("{}/missing.zip", server.url()), &dest, &NullReporter)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status { status: 404, .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_connection_failure() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("asset.zip");
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        // Port 1 is reserved (tcpmux) and not listening on test machines.
        let err = fetcher
            .fetch("http://127.0.0.1:1/asset.zip", &dest, &NullReporter)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Http(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_timeout_leaves_no_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/slow.tar.gz")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"partial")?;
                std::thread::sleep(std::time::Duration::from_secs(2));
                w.write_all(b"rest")
            })
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("slow.tar.gz");
        let fetcher = HttpFetcher::new(Duration::from_millis(300)).unwrap();

        let err = fetcher
            .fetch(&format!("{}/slow.tar.gz", server.url()), &dest, &NullReporter)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DownloadError::Timeout { .. } | DownloadError::Http(_)
        ));
        assert!(!dest.exists());
    }
}
