//! Endpoint normalization.
//!
//! Services report endpoints in whatever form their listeners were configured
//! with (`tcp://0.0.0.0:26657`, `127.0.0.1:9090`, `http://localhost:1317`).
//! The panel needs something a user can act on: a URL to open, or a string to
//! copy when the endpoint is not HTTP.

use crate::model::{EndpointAction, EndpointDisposition};

const TCP_SCHEME: &str = "tcp://";
const HTTP_SCHEME: &str = "http://";
const HTTPS_SCHEME: &str = "https://";
const WILDCARD_HOSTS: [&str; 2] = ["0.0.0.0", "127.0.0.1"];

/// Canonicalize a raw endpoint and decide whether it opens as a link or is copied.
///
/// Total: any string is accepted. Idempotent on the canonical form.
pub fn normalize(raw: &str) -> EndpointDisposition {
    let canonical_url = canonicalize(raw.trim());
    let action = if is_http(&canonical_url) {
        EndpointAction::OpenLink
    } else {
        EndpointAction::CopyToClipboard
    };
    EndpointDisposition {
        canonical_url,
        action,
    }
}

fn canonicalize(raw: &str) -> String {
    let mut rest = raw;
    while let Some(stripped) = rest.strip_prefix(TCP_SCHEME) {
        rest = stripped;
    }

    match split_scheme(rest) {
        Some((scheme, authority)) => format!("{scheme}{}", localize_host(authority)),
        None => format!("{HTTP_SCHEME}{}", localize_host(rest)),
    }
}

/// Split `scheme://rest` into (`scheme://`, `rest`). Only a well-formed scheme
/// counts, so `localhost:8080/a://b` is treated as scheme-less.
fn split_scheme(s: &str) -> Option<(&str, &str)> {
    let idx = s.find("://")?;
    let scheme = &s[..idx];
    let mut chars = scheme.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if first_ok && rest_ok {
        Some(s.split_at(idx + 3))
    } else {
        None
    }
}

fn localize_host(authority: &str) -> String {
    let host_end = authority
        .find(|c| matches!(c, ':' | '/' | '?' | '#'))
        .unwrap_or(authority.len());
    let (host, tail) = authority.split_at(host_end);
    if WILDCARD_HOSTS.contains(&host) {
        format!("localhost{tail}")
    } else {
        authority.to_string()
    }
}

fn is_http(url: &str) -> bool {
    url.starts_with(HTTP_SCHEME) || url.starts_with(HTTPS_SCHEME)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(url: &str) -> EndpointDisposition {
        EndpointDisposition {
            canonical_url: url.to_string(),
            action: EndpointAction::OpenLink,
        }
    }

    #[test]
    fn tcp_wildcard_becomes_localhost_link() {
        assert_eq!(normalize("tcp://0.0.0.0:8080"), open("http://localhost:8080"));
    }

    #[test]
    fn bare_loopback_gets_http_scheme() {
        assert_eq!(normalize("127.0.0.1:9000"), open("http://localhost:9000"));
    }

    #[test]
    fn http_and_https_are_kept() {
        assert_eq!(normalize("http://localhost:1317"), open("http://localhost:1317"));
        assert_eq!(
            normalize("https://127.0.0.1:8443/api"),
            open("https://localhost:8443/api")
        );
        assert_eq!(normalize("example.com/rpc"), open("http://example.com/rpc"));
    }

    #[test]
    fn only_an_exact_host_match_is_rewritten() {
        assert_eq!(
            normalize("http://127.0.0.1.nip.io:80"),
            open("http://127.0.0.1.nip.io:80")
        );
        assert_eq!(normalize("10.0.0.1:26657"), open("http://10.0.0.1:26657"));
    }

    #[test]
    fn foreign_schemes_are_copied_in_canonical_form() {
        let d = normalize("grpc://0.0.0.0:9090");
        assert_eq!(d.canonical_url, "grpc://localhost:9090");
        assert_eq!(d.action, EndpointAction::CopyToClipboard);

        let ws = normalize("ws://127.0.0.1:26657/websocket");
        assert_eq!(ws.canonical_url, "ws://localhost:26657/websocket");
        assert_eq!(ws.action, EndpointAction::CopyToClipboard);
    }

    #[test]
    fn any_string_is_accepted() {
        assert_eq!(normalize(""), open("http://"));
        assert_eq!(normalize("  0.0.0.0  "), open("http://localhost"));
        assert_eq!(
            normalize("localhost:8080/a://b"),
            open("http://localhost:8080/a://b")
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            normalize("\ttcp://0.0.0.0:26657\n"),
            open("http://localhost:26657")
        );
        assert_eq!(normalize(" http://0.0.0.0:1317 "), open("http://localhost:1317"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "tcp://0.0.0.0:8080",
            "127.0.0.1:9000",
            "tcp://tcp://0.0.0.0:1",
            "http://0.0.0.0",
            "https://example.com",
            "grpc://127.0.0.1:9090",
            "localhost:8080/a://b",
            "weird string with spaces",
            "",
            "::1",
            "0.0.0.0/path?q=1#frag",
        ];
        for raw in samples {
            let once = normalize(raw);
            let twice = normalize(&once.canonical_url);
            assert_eq!(twice, once, "not idempotent for {raw:?}");
        }
    }
}
