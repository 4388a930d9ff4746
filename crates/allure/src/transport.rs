use std::future::Future;
use std::time::Duration;

use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

/// The HTTP surface the scrapers need. Callers own the session and decide
/// how it is pooled; every call returns the response body of a successful
/// request or an error for anything else.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// [`Transport`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn read_body(url: &str, response: reqwest::Response) -> Result<String, TransportError> {
        let status = response.status();
        if !status.is_success() {
            log::error!("{} answered with status {}", url, status);
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}

impl Transport for HttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;
        Self::read_body(url, response).await
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, TransportError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;
        Self::read_body(url, response).await
    }
}
