//! Finds a working API root for a host.
//!
//! Candidates are probed strictly in order: https before http, default
//! ports before the alternates used by on-site installations. The first
//! candidate that answers 2xx, 401 or 403 wins; a credential challenge still
//! proves the API is there.

use std::net::Ipv6Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::Transport;
use crate::error::{DiscoveryError, ProbeFailure, TransportError};

const API_ROOT: &str = "piwebapi";
const PROBE_PATH: &str = "system";

/// Alternates tried after the defaults for a bare host.
const ALTERNATES: &[(&str, &str)] = &[("https", ":8443"), ("http", ":8080")];

/// Candidate base URLs for `host`, in probe order.
pub fn candidate_urls(host: &str) -> Vec<String> {
    let host = bracket_ipv6(host.trim().trim_end_matches('/'));
    let host = host.as_str();
    let mut candidates = Vec::new();

    if host.starts_with("https://") || host.starts_with("http://") {
        if host.ends_with(API_ROOT) {
            candidates.push(host.to_string());
        } else {
            candidates.push(format!("{host}/{API_ROOT}"));
        }
    } else if has_port(host) {
        candidates.push(format!("https://{host}/{API_ROOT}"));
        candidates.push(format!("http://{host}/{API_ROOT}"));
        candidates.push(format!("https://{host}/pi/{API_ROOT}"));
        candidates.push(format!("http://{host}/pi/{API_ROOT}"));
    } else {
        candidates.push(format!("https://{host}/{API_ROOT}"));
        candidates.push(format!("https://{host}:443/{API_ROOT}"));
        candidates.push(format!("http://{host}/{API_ROOT}"));
        for (scheme, port) in ALTERNATES {
            candidates.push(format!("{scheme}://{host}{port}/{API_ROOT}"));
        }
        candidates.push(format!("https://{host}/pi/{API_ROOT}"));
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates
}

/// A bare IPv6 literal needs brackets before a port or path can follow it.
fn bracket_ipv6(host: &str) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

fn has_port(host: &str) -> bool {
    match host.rfind(']') {
        Some(end) => host[end..].contains(':'),
        None => host.matches(':').count() == 1,
    }
}

/// A base URL that answered a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub base_url: String,
    /// The probe was answered with 401/403
    pub auth_challenge: bool,
    /// Candidates tried, including the winner
    pub attempts: usize,
}

pub struct EndpointResolver {
    transport: Arc<dyn Transport>,
    probe_timeout: Duration,
}

impl EndpointResolver {
    pub fn new(transport: Arc<dyn Transport>, probe_timeout: Duration) -> Self {
        Self {
            transport,
            probe_timeout,
        }
    }

    pub async fn resolve(&self, host: &str) -> Result<ResolvedEndpoint, DiscoveryError> {
        let candidates = candidate_urls(host);
        let mut failures = Vec::new();

        for (index, base_url) in candidates.iter().enumerate() {
            let probe_url = format!("{base_url}/{PROBE_PATH}");
            let error = match self.transport.probe(&probe_url, self.probe_timeout).await {
                Ok(status) if (200..300).contains(&status) || status == 401 || status == 403 => {
                    info!(base_url = %base_url, status, "API endpoint resolved");
                    return Ok(ResolvedEndpoint {
                        base_url: base_url.clone(),
                        auth_challenge: status == 401 || status == 403,
                        attempts: index + 1,
                    });
                }
                Ok(status) => TransportError::HttpError {
                    url: probe_url,
                    status,
                },
                Err(e) => e,
            };
            debug!(candidate = %base_url, error = %error, "endpoint probe failed");
            failures.push(ProbeFailure {
                candidate: base_url.clone(),
                error,
            });
        }

        Err(DiscoveryError::EndpointUnreachable {
            host: host.to_string(),
            attempts: failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{self, MockTransport};

    #[test]
    fn bare_host_order_is_fixed() {
        assert_eq!(
            candidate_urls("pi.example.com"),
            vec![
                "https://pi.example.com/piwebapi",
                "https://pi.example.com:443/piwebapi",
                "http://pi.example.com/piwebapi",
                "https://pi.example.com:8443/piwebapi",
                "http://pi.example.com:8080/piwebapi",
                "https://pi.example.com/pi/piwebapi",
            ]
        );
    }

    #[test]
    fn explicit_port_or_scheme_is_respected() {
        assert_eq!(
            candidate_urls("10.0.0.5:5460"),
            vec![
                "https://10.0.0.5:5460/piwebapi",
                "http://10.0.0.5:5460/piwebapi",
                "https://10.0.0.5:5460/pi/piwebapi",
                "http://10.0.0.5:5460/pi/piwebapi",
            ]
        );
        assert_eq!(
            candidate_urls("https://pi.local/piwebapi/"),
            vec!["https://pi.local/piwebapi"]
        );
        assert_eq!(candidate_urls("http://pi.local"), vec!["http://pi.local/piwebapi"]);
        assert_eq!(candidate_urls("[::1]:8080").len(), 4);
    }

    #[test]
    fn bare_ipv6_literal_is_bracketed() {
        let candidates = candidate_urls("::1");
        assert_eq!(candidates.len(), 6);
        assert_eq!(candidates[0], "https://[::1]/piwebapi");
        assert_eq!(candidates[1], "https://[::1]:443/piwebapi");
        assert_eq!(candidates[4], "http://[::1]:8080/piwebapi");
        assert_eq!(candidate_urls("fe80::2")[2], "http://[fe80::2]/piwebapi");
        assert_eq!(candidate_urls("[::1]")[0], "https://[::1]/piwebapi");
    }

    #[tokio::test]
    async fn first_reachable_candidate_wins_every_time() {
        let transport = Arc::new(
            MockTransport::new()
                .fail("https://pi/piwebapi/system", mock::refused)
                .fail("https://pi:443/piwebapi/system", mock::timed_out)
                .status("http://pi/piwebapi/system", 200)
                .status("https://pi:8443/piwebapi/system", 200),
        );
        let resolver = EndpointResolver::new(transport.clone(), Duration::from_secs(1));

        for _ in 0..3 {
            let resolved = resolver.resolve("pi").await.unwrap();
            assert_eq!(resolved.base_url, "http://pi/piwebapi");
            assert_eq!(resolved.attempts, 3);
            assert!(!resolved.auth_challenge);
        }
        assert!(!transport
            .calls()
            .iter()
            .any(|url| url.starts_with("https://pi:8443")));
    }

    #[tokio::test]
    async fn auth_challenge_counts_as_reachable() {
        let transport = Arc::new(MockTransport::new().status("https://pi/piwebapi/system", 401));
        let resolver = EndpointResolver::new(transport, Duration::from_secs(1));
        let resolved = resolver.resolve("pi").await.unwrap();
        assert_eq!(resolved.base_url, "https://pi/piwebapi");
        assert!(resolved.auth_challenge);
    }

    #[tokio::test]
    async fn exhausting_candidates_reports_every_attempt() {
        let transport = Arc::new(MockTransport::new().status("https://pi/piwebapi/system", 500));
        let resolver = EndpointResolver::new(transport.clone(), Duration::from_secs(1));
        match resolver.resolve("pi").await {
            Err(DiscoveryError::EndpointUnreachable { host, attempts }) => {
                assert_eq!(host, "pi");
                assert_eq!(attempts.len(), 6);
                assert!(matches!(
                    attempts[0].error,
                    TransportError::HttpError { status: 500, .. }
                ));
            }
            other => panic!("expected EndpointUnreachable, got {other:?}"),
        }
        assert_eq!(transport.calls().len(), 6);
    }
}
