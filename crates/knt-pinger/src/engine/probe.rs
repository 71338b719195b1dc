//! Probe client: a single HTTP GET against a single target

use async_trait::async_trait;
use reqwest::header::CONNECTION;
use reqwest::StatusCode;
use std::time::Duration;

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Connected and received a status in `[100, 299]`
    Reachable,
    /// Transport error, timeout or status `>= 300`
    Unreachable(String),
}

impl ProbeOutcome {
    /// Whether the probe failed
    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeOutcome::Unreachable(_))
    }

    /// Failure description, if the probe failed
    pub fn into_failure(self) -> Option<String> {
        match self {
            ProbeOutcome::Reachable => None,
            ProbeOutcome::Unreachable(reason) => Some(reason),
        }
    }
}

/// Executes one reachability probe and classifies the result.
///
/// Implementations never return an error: failure is an outcome.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe `target` (an absolute URL)
    async fn probe(&self, target: &str) -> ProbeOutcome;
}

/// HTTP probe that opens a fresh connection for every request.
///
/// The idle pool is disabled and every request asks the peer to close the
/// connection. Redirects are not followed and system proxies are ignored.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe with the given per-probe timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &str) -> ProbeOutcome {
        let response = self
            .client
            .get(target)
            .header(CONNECTION, "close")
            .send()
            .await;

        match response {
            Ok(response) => classify_status(response.status()),
            Err(e) => ProbeOutcome::Unreachable(format!("GET {}: {}", target, error_chain(&e))),
        }
    }
}

/// Map a response status onto an outcome
pub fn classify_status(status: StatusCode) -> ProbeOutcome {
    if (100..=299).contains(&status.as_u16()) {
        ProbeOutcome::Reachable
    } else {
        ProbeOutcome::Unreachable(format!("response failed with status code {}", status.as_u16()))
    }
}

// reqwest's Display stops at the outermost layer ("error sending request")
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        "timed out".to_string()
    } else {
        err.to_string()
    };
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), ProbeOutcome::Reachable);
        assert_eq!(classify_status(StatusCode::NO_CONTENT), ProbeOutcome::Reachable);
        assert!(classify_status(StatusCode::MOVED_PERMANENTLY).is_failure());
        assert!(classify_status(StatusCode::NOT_FOUND).is_failure());
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE).into_failure().as_deref(),
            Some("response failed with status code 503")
        );
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = HttpProbe::new(Duration::from_millis(500)).unwrap();
        let outcome = probe.probe(&format!("http://127.0.0.1:{}/ping", port)).await;
        let reason = outcome.into_failure().expect("closed port must fail");
        assert!(reason.starts_with("GET http://127.0.0.1:"));
    }

    /// Server that keeps every connection alive and counts accepts
    async fn keep_alive_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/ping", listener.local_addr().unwrap());
        let accepts = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepts);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    loop {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) => {
                                let reply = "HTTP/1.1 200 OK\r\n\
                                             Content-Length: 0\r\n\
                                             Connection: keep-alive\r\n\r\n";
                                if stream.write_all(reply.as_bytes()).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        });
        (url, accepts)
    }

    #[tokio::test]
    async fn test_every_probe_opens_a_new_connection() {
        let (url, accepts) = keep_alive_server().await;
        let probe = HttpProbe::new(Duration::from_secs(2)).unwrap();

        for _ in 0..5 {
            assert_eq!(probe.probe(&url).await, ProbeOutcome::Reachable);
        }
        assert_eq!(accepts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_invalid_url_is_unreachable() {
        let probe = HttpProbe::new(Duration::from_millis(500)).unwrap();
        assert!(probe.probe("not a url").await.is_failure());
    }
}
