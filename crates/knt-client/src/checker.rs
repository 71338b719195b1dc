//! Check driver
//!
//! Posts the planned check requests to the agents through the ingress and
//! decodes their responses.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use knt_model::{
    DirectCheckRequestItem, DirectCheckResultItem, ServiceCheckRequest, ServiceCheckResponse,
};

/// Errors raised while sending a check request to an agent
#[derive(Error, Debug)]
pub enum CheckerError {
    /// The request could not be sent or the response not received
    #[error("POST {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The agent answered with a non-2xx status
    #[error("POST {url}: response failed with status code {status}")]
    Status { url: String, status: u16 },

    /// The response body is not the expected payload
    #[error("POST {url}: invalid response body: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Sends check requests to the agents
#[derive(Debug, Clone)]
pub struct Checker {
    client: reqwest::Client,
    service_url: String,
    direct_url: String,
}

impl Checker {
    /// Create a checker posting to `<base_url>/svc` and `<base_url>/direct`
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            service_url: format!("{}/svc", base),
            direct_url: format!("{}/direct", base),
        })
    }

    /// Run a service check on one agent
    pub async fn service(
        &self,
        request: &ServiceCheckRequest,
    ) -> Result<ServiceCheckResponse, CheckerError> {
        let response: ServiceCheckResponse = self.post(&self.service_url, request).await?;
        tracing::debug!(
            "Service check from {}: {} errors",
            response.source_host,
            response.error_count
        );
        Ok(response)
    }

    /// Run a direct check on one agent and return the failed probes
    pub async fn direct(
        &self,
        request: &[DirectCheckRequestItem],
    ) -> Result<Vec<DirectCheckResultItem>, CheckerError> {
        let failures: Vec<DirectCheckResultItem> = self.post(&self.direct_url, request).await?;
        tracing::debug!("Direct check: {} failures", failures.len());
        Ok(failures)
    }

    async fn post<Req, Resp>(&self, url: &str, payload: &Req) -> Result<Resp, CheckerError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let request_error = |source: reqwest::Error| CheckerError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckerError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        serde_json::from_slice(&bytes).map_err(|source| CheckerError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn checker(base: &str) -> Checker {
        Checker::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_service_and_direct() {
        let router = Router::new()
            .route(
                "/svc",
                post(|Json(req): Json<ServiceCheckRequest>| async move {
                    (
                        StatusCode::ACCEPTED,
                        Json(ServiceCheckResponse {
                            source_host: "pinger-a".into(),
                            error_count: req.count / 10,
                        }),
                    )
                }),
            )
            .route(
                "/direct",
                post(|Json(req): Json<Vec<DirectCheckRequestItem>>| async move {
                    let failures: Vec<DirectCheckResultItem> = req
                        .into_iter()
                        .map(|item| DirectCheckResultItem {
                            source_host: "pinger-a".into(),
                            dest_host: item.hostname,
                            addr: item.addrs[0].clone(),
                            error: "timeout".into(),
                        })
                        .collect();
                    (StatusCode::ACCEPTED, Json(failures))
                }),
            );
        let base = serve(router).await;
        let checker = checker(&format!("{}/", base));

        let svc = checker
            .service(&ServiceCheckRequest::new("http://pinger-svc:8080/ping", 200))
            .await
            .unwrap();
        assert_eq!(svc.source_host, "pinger-a");
        assert_eq!(svc.error_count, 20);

        let request = vec![DirectCheckRequestItem::new("pinger-b", vec!["10.0.0.2".into()])];
        let failures = checker.direct(&request).await.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].dest_host, "pinger-b");
        assert_eq!(failures[0].addr, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_non_2xx_is_an_error() {
        let router = Router::new().route(
            "/svc",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "no endpoints") }),
        );
        let base = serve(router).await;

        let err = checker(&base)
            .service(&ServiceCheckRequest::new("http://x/ping", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckerError::Status { status: 503, .. }));
        assert!(err.to_string().ends_with("response failed with status code 503"));
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let router = Router::new().route("/direct", post(|| async { "not json" }));
        let base = serve(router).await;

        let err = checker(&base).direct(&[]).await.unwrap_err();
        assert!(matches!(err, CheckerError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_agent_is_request_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = checker(&base).direct(&[]).await.unwrap_err();
        assert!(matches!(err, CheckerError::Request { .. }));
    }
}
