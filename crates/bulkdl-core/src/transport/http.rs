//! HTTP transport against the download backend.
//!
//! Implements [`Transport`] over reqwest, plus the two endpoints only
//! the presentation layer needs: sheet upload and file fetch.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ws, ProgressStream, Transport};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{DownloadOutcome, HistoryEntry, JobId, LinkItem, RemoteFile};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// HTTP/WebSocket client for the download backend
pub struct HttpTransport {
    config: ClientConfig,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from explicit configuration. Credentialed
    /// mode turns on the cookie store so requests carry session
    /// cookies like a browser would.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(config.with_credentials)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload a spreadsheet and return the parsed link list.
    ///
    /// Only `.xlsx` is accepted; the backend rejects anything else
    /// with a 400, so fail before the request instead.
    pub async fn upload_sheet(&self, path: &Path) -> Result<Vec<LinkItem>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !name.to_lowercase().ends_with(".xlsx") {
            return Err(Error::UnsupportedSheet(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name)
            .mime_str(XLSX_MIME)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = self.config.endpoint("/upload-excel/");
        debug!("uploading sheet to {}", url);
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(classify_send_error)?;
        let parsed: UploadResponse = read_json(resp).await.map_err(as_submission)?;

        parsed.links.into_iter().map(LinkItem::new).collect()
    }

    /// Fetch one downloaded file's bytes for a client-initiated save.
    pub async fn fetch_file(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.config.endpoint(&format!("/downloads/file/{name}"));
        let resp = self.http.get(&url).send().await.map_err(classify_send_error)?;
        let resp = resp.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.config.endpoint(path);
        debug!("API request: GET {}", url);
        let resp = self.http.get(&url).send().await.map_err(classify_send_error)?;
        read_json(resp).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.config.endpoint(path);
        debug!("API request: POST {}", url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(classify_send_error)?;
        read_json(resp).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit_batch(&self, items: &[LinkItem]) -> Result<JobId> {
        let req = SubmitRequest { links: items };
        let resp: SubmitResponse = self
            .post_json("/download-all/", &req)
            .await
            .map_err(as_submission)?;
        Ok(resp.job_id)
    }

    async fn open_progress_channel(&self, job: &JobId) -> Result<ProgressStream> {
        ws::open_event_stream(&self.config.ws_url(), job).await
    }

    async fn fetch_batch_result(
        &self,
        job: &JobId,
        items: &[LinkItem],
    ) -> Result<Vec<DownloadOutcome>> {
        // The singleton case has its own endpoint; everything else
        // confirms the registered job.
        let resp: ResultsResponse = if let [only] = items {
            let url = self.config.endpoint("/download-single/");
            debug!("API request: POST {} (link={})", url, only.url());
            let resp = self
                .http
                .post(&url)
                .query(&[("link", only.url())])
                .send()
                .await
                .map_err(classify_send_error)?;
            read_json(resp).await?
        } else {
            self.post_json("/download-all/", &ConfirmRequest { job_id: job }).await?
        };
        Ok(resp.results)
    }

    async fn list_files(&self) -> Result<Vec<RemoteFile>> {
        let resp: FilesResponse = self.get_json("/downloads/list-files/").await?;
        Ok(resp.files)
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        let resp: HistoryResponse = self.get_json("/downloads/history/").await?;
        Ok(resp.downloads)
    }

    async fn clear_history(&self) -> Result<()> {
        let url = self.config.endpoint("/downloads/clear-history/");
        debug!("API request: DELETE {}", url);
        let resp = self.http.delete(&url).send().await.map_err(classify_send_error)?;
        resp.error_for_status()?;
        Ok(())
    }
}

/// A request error with no HTTP status means nothing came back at all,
/// which the client cannot tell apart from a CORS misconfiguration.
fn classify_send_error(err: reqwest::Error) -> Error {
    if err.status().is_none() {
        Error::NetworkAmbiguous(err)
    } else {
        Error::Http(err)
    }
}

/// Reclassify registration/upload failures as submission errors,
/// keeping the ambiguous-network hint intact.
fn as_submission(err: Error) -> Error {
    match err {
        e @ Error::NetworkAmbiguous(_) => e,
        e => Error::Submission(e.to_string()),
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp.json().await?)
    } else {
        let text = resp.text().await.unwrap_or_default();
        Err(Error::Other(format!("API error {status}: {text}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Batch registration request
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    links: &'a [LinkItem],
}

/// Batch registration response
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: JobId,
}

/// Job confirmation request (synchronous fallback)
#[derive(Debug, Serialize)]
struct ConfirmRequest<'a> {
    job_id: &'a JobId,
}

/// Terminal outcome list response
#[derive(Debug, Deserialize)]
struct ResultsResponse {
    results: Vec<DownloadOutcome>,
}

/// Sheet upload response
#[derive(Debug, Deserialize)]
struct UploadResponse {
    links: Vec<String>,
}

/// History listing response
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    downloads: Vec<HistoryEntry>,
}

/// File listing response
#[derive(Debug, Deserialize)]
struct FilesResponse {
    files: Vec<RemoteFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_xlsx_sheet() {
        let transport = HttpTransport::new(ClientConfig::default()).unwrap();
        let err = tokio_test::block_on(transport.upload_sheet(Path::new("links.csv")));
        assert!(matches!(err, Err(Error::UnsupportedSheet(_))));
    }

    #[test]
    fn test_submit_request_wire_shape() {
        let items = vec![LinkItem::new("https://x.com/a").unwrap()];
        let body = serde_json::to_string(&SubmitRequest { links: &items }).unwrap();
        assert_eq!(body, r#"{"links":["https://x.com/a"]}"#);
    }

    #[test]
    fn test_results_response_wire_shape() {
        let resp: ResultsResponse = serde_json::from_str(
            r#"{"results":[{"link":"https://x.com/a","status":"failed","error":"private account"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].error.as_deref(), Some("private account"));
    }
}
