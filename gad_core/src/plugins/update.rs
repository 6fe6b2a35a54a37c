//! Plugin-pack update check.
//!
//! Queries a GitHub-releases style endpoint for the latest tag. Never fails:
//! any problem collapses to [`UNABLE_TO_CHECK`].

use std::time::Duration;

use semver::Version;

/// Current application version (from Cargo.toml)
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Message returned whenever the check cannot produce a tag
pub const UNABLE_TO_CHECK: &str = "Unable to check for updates.";

/// Result of an update check
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCheckResult {
    /// The endpoint reported a release tag
    Latest { tag: String, newer: bool },
    /// Check failed (with reason)
    Unavailable(String),
}

impl UpdateCheckResult {
    /// User-facing one-line summary
    pub fn message(&self) -> String {
        match self {
            UpdateCheckResult::Latest { tag, .. } => format!("Latest plugin pack version: {}", tag),
            UpdateCheckResult::Unavailable(_) => UNABLE_TO_CHECK.to_string(),
        }
    }
}

/// Ask `url` for the latest release.
pub async fn fetch_latest_release(url: &str, timeout: Duration) -> UpdateCheckResult {
    let client = match reqwest::Client::builder()
        .user_agent(format!("Bridge_GAD/{}", CURRENT_VERSION))
        .timeout(timeout)
        .build()
    {
        Ok(c) => c,
        Err(e) => return UpdateCheckResult::Unavailable(format!("Failed to create HTTP client: {}", e)),
    };

    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => return UpdateCheckResult::Unavailable(format!("Network error: {}", e)),
    };

    if response.status() != reqwest::StatusCode::OK {
        return UpdateCheckResult::Unavailable(format!("Endpoint returned {}", response.status()));
    }

    let release: serde_json::Value = match response.json().await {
        Ok(r) => r,
        Err(e) => return UpdateCheckResult::Unavailable(format!("Failed to parse response: {}", e)),
    };

    let Some(tag) = release.get("tag_name").and_then(|t| t.as_str()) else {
        return UpdateCheckResult::Unavailable("Response has no tag_name".to_string());
    };

    UpdateCheckResult::Latest {
        tag: tag.to_string(),
        newer: is_newer(tag),
    }
}

/// Query `url` and return the user-facing message.
pub async fn check_for_plugin_updates(url: &str, timeout: Duration) -> String {
    let result = fetch_latest_release(url, timeout).await;
    if let UpdateCheckResult::Unavailable(reason) = &result {
        tracing::debug!(url, reason = %reason, "update check failed");
    }
    result.message()
}

/// Whether `tag` (optionally `v`-prefixed) is newer than this build
fn is_newer(tag: &str) -> bool {
    match (Version::parse(tag.trim_start_matches('v')), Version::parse(CURRENT_VERSION)) {
        (Ok(remote), Ok(current)) => remote > current,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a local port and return its URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        format!("http://{}/releases/latest", addr)
    }

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/releases/latest", addr)
    }

    #[tokio::test]
    async fn test_reports_latest_tag() {
        let url = serve_once("HTTP/1.1 200 OK", r#"{"tag_name": "v9.9.9", "name": "pack"}"#);
        let result = fetch_latest_release(&url, Duration::from_secs(5)).await;
        assert_eq!(
            result,
            UpdateCheckResult::Latest {
                tag: "v9.9.9".to_string(),
                newer: true
            }
        );
        assert_eq!(result.message(), "Latest plugin pack version: v9.9.9");
    }

    #[tokio::test]
    async fn test_non_200_is_sentinel() {
        let url = serve_once("HTTP/1.1 404 Not Found", r#"{"message": "Not Found"}"#);
        assert_eq!(check_for_plugin_updates(&url, Duration::from_secs(5)).await, UNABLE_TO_CHECK);
    }

    #[tokio::test]
    async fn test_missing_tag_is_sentinel() {
        let url = serve_once("HTTP/1.1 200 OK", r#"{"name": "no tag here"}"#);
        assert_eq!(check_for_plugin_updates(&url, Duration::from_secs(5)).await, UNABLE_TO_CHECK);
    }

    #[tokio::test]
    async fn test_unreachable_is_sentinel() {
        let url = closed_port_url();
        assert_eq!(check_for_plugin_updates(&url, Duration::from_secs(5)).await, UNABLE_TO_CHECK);
    }

    #[test]
    fn test_is_newer() {
        assert!(is_newer("v99.0.0"));
        assert!(!is_newer("0.0.1"));
        assert!(!is_newer("latest"));
    }
}
