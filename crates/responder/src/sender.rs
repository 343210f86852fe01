use async_trait::async_trait;
use lambda_runtime::tracing;
use model::CustomResourceResponse;
use thiserror::Error;
use url::Url;

/// Delivers a custom resource response to the URL CloudFormation provided.
#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), DeliveryError>;
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid response URL: {0}")]
    InvalidUrl(String),
    #[error("failed to serialise response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to send response: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sends the response as the body of a single PUT to the presigned URL.
///
/// No `Content-Type` is set: the presigned S3 URL is signed without one.
#[derive(Clone, Default)]
pub struct HttpResponseSender {
    http: reqwest::Client,
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), DeliveryError> {
        let url: Url = parse_response_url(response_url)?;
        let body: Vec<u8> = serde_json::to_vec(response)?;

        tracing::debug!(
            host = url.host_str(),
            path = url.path(),
            "Sending response of {} bytes",
            body.len()
        );

        let reply: reqwest::Response = self.http.put(url).body(body).send().await?;

        let status = reply.status();
        if !status.is_success() {
            let body: String = reply.text().await.unwrap_or_default();

            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

pub(crate) fn parse_response_url(response_url: &str) -> Result<Url, DeliveryError> {
    let url: Url =
        Url::parse(response_url).map_err(|err| DeliveryError::InvalidUrl(err.to_string()))?;

    if !matches!(url.scheme(), "https" | "http") {
        return Err(DeliveryError::InvalidUrl(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(DeliveryError::InvalidUrl("missing host".to_string()));
    }

    Ok(url)
}
