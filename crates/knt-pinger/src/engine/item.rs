//! Work items produced for each check kind

use std::borrow::Cow;
use std::sync::Arc;

use knt_model::{DirectCheckRequestItem, DirectCheckResultItem};

use super::probe::ProbeOutcome;

/// A unit of work consumed by exactly one worker.
///
/// The item carries whatever context the aggregator needs, and folds the
/// probe outcome into its output once the probe has run.
pub trait WorkItem: Send + 'static {
    /// What the worker hands to the aggregator
    type Output: Send + 'static;

    /// URL to probe
    fn target(&self) -> Cow<'_, str>;

    /// Combine the item with the outcome of its probe
    fn complete(self, outcome: ProbeOutcome) -> Self::Output;
}

/// One repetition of a service check
#[derive(Debug, Clone)]
pub struct ServiceTarget {
    url: Arc<str>,
}

impl WorkItem for ServiceTarget {
    type Output = ProbeOutcome;

    fn target(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.url)
    }

    fn complete(self, outcome: ProbeOutcome) -> ProbeOutcome {
        outcome
    }
}

/// `count` identical probes of `url`
pub fn service_targets(url: &str, count: usize) -> impl Iterator<Item = ServiceTarget> + Send {
    let url: Arc<str> = Arc::from(url);
    std::iter::repeat_with(move || ServiceTarget {
        url: Arc::clone(&url),
    })
    .take(count)
}

/// One (peer, address) pair of a direct check
#[derive(Debug, Clone)]
pub struct DirectTarget {
    port: u16,
    result: DirectCheckResultItem,
}

impl DirectTarget {
    /// Peer address this item probes
    pub fn addr(&self) -> &str {
        &self.result.addr
    }
}

impl WorkItem for DirectTarget {
    type Output = DirectCheckResultItem;

    fn target(&self) -> Cow<'_, str> {
        Cow::Owned(probe_url(&self.result.addr, self.port))
    }

    fn complete(mut self, outcome: ProbeOutcome) -> DirectCheckResultItem {
        if let Some(reason) = outcome.into_failure() {
            self.result.error = reason;
        }
        self.result
    }
}

/// One item per address of every requested peer, in request order
pub fn direct_targets(
    source_host: &str,
    peers: Vec<DirectCheckRequestItem>,
    port: u16,
) -> impl Iterator<Item = DirectTarget> + Send {
    let source_host: Arc<str> = Arc::from(source_host);
    peers.into_iter().flat_map(move |peer| {
        let source_host = Arc::clone(&source_host);
        let DirectCheckRequestItem { hostname, addrs } = peer;
        addrs.into_iter().map(move |addr| DirectTarget {
            port,
            result: DirectCheckResultItem {
                source_host: source_host.to_string(),
                dest_host: hostname.clone(),
                addr,
                error: String::new(),
            },
        })
    })
}

/// URL of a peer's `/ping` endpoint.
///
/// Any address containing a colon is taken to be an IPv6 literal and is
/// bracketed.
pub fn probe_url(addr: &str, port: u16) -> String {
    if addr.contains(':') {
        format!("http://[{}]:{}/ping", addr, port)
    } else {
        format!("http://{}:{}/ping", addr, port)
    }
}
