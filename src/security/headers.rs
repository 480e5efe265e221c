//! Header manipulation and security headers.
//!
//! # Responsibilities
//! - Build the upstream header set from an explicit allow-list
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Strip cookies, vendor and fingerprinting headers from responses
//! - Add CORS headers so browsers can read proxied responses
//!
//! # Design Decisions
//! - Request headers start empty; nothing passes unless allow-listed
//! - Never trust existing X-Forwarded-* from the client
//! - Response headers start from upstream and are filtered by deny-lists
//! - `Location` is left alone here; the redirect resolver owns it

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use url::Url;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Inbound headers copied to the upstream request.
pub static REQUEST_ALLOW_LIST: &[HeaderName] = &REQUEST_ALLOW;

static REQUEST_ALLOW: [HeaderName; 11] = [
    header::AUTHORIZATION,
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::CACHE_CONTROL,
    header::PRAGMA,
    header::USER_AGENT,
    header::RANGE,
    HeaderName::from_static("x-api-key"),
    HeaderName::from_static("x-auth-token"),
    HeaderName::from_static("x-requested-with"),
];

/// Upstream response headers that are always removed.
pub static RESPONSE_DENY_LIST: &[HeaderName] = &RESPONSE_DENY;

static RESPONSE_DENY: [HeaderName; 13] = [
    header::SET_COOKIE,
    header::COOKIE,
    header::SERVER,
    header::VIA,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    HeaderName::from_static("set-cookie2"),
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("x-powered-by"),
    HeaderName::from_static("x-aspnet-version"),
    HeaderName::from_static("x-aspnetmvc-version"),
    HeaderName::from_static("x-generator"),
    HeaderName::from_static("x-runtime"),
];

/// Removed only on GitHub-routed responses; the proxy origin must not
/// inherit the target's CSP.
pub static SECURITY_DENY_LIST: &[HeaderName] = &SECURITY_DENY;

static SECURITY_DENY: [HeaderName; 3] = [
    header::CONTENT_SECURITY_POLICY,
    header::CONTENT_SECURITY_POLICY_REPORT_ONLY,
    HeaderName::from_static("clear-site-data"),
];

/// Hosting-platform header prefixes stripped from responses.
pub const VENDOR_PREFIXES: &[&str] = &["cf-", "x-amz-cf-", "x-vercel-", "x-nf-"];

/// Methods advertised on proxied responses.
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS, HEAD";

/// Methods advertised on preflight responses.
pub const PREFLIGHT_ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, TRACE, DELETE, HEAD, OPTIONS";

/// Headers exposed to browsers in query-parameter mode.
pub const EXPOSE_HEADERS: &str = "content-range, content-length, content-type, content-disposition";

/// Which addressing mode produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
    /// `?url=` query-parameter mode.
    Simple,
    /// Path mode with GitHub classification.
    GitHub,
}

impl ProxyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyMode::Simple => "simple",
            ProxyMode::GitHub => "github",
        }
    }

    /// `Access-Control-Max-Age` for preflight answers.
    pub fn preflight_max_age(&self) -> u32 {
        match self {
            ProxyMode::Simple => 86_400,
            ProxyMode::GitHub => 1_728_000,
        }
    }
}

/// Facts about the inbound hop needed for X-Forwarded-* headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingContext {
    /// Client address from a trusted source.
    pub client_ip: Option<String>,
    /// Scheme the client used to reach the proxy.
    pub proto: String,
    /// Host header the client sent to the proxy.
    pub host: Option<String>,
}

/// Comma separated allow-list, as advertised in `Access-Control-Allow-Headers`.
pub fn allowed_request_headers() -> String {
    REQUEST_ALLOW_LIST
        .iter()
        .map(HeaderName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Host` value for a target: hostname plus port when it is not the default.
pub fn host_value(target: &Url) -> Option<HeaderValue> {
    let host = target.host_str()?;
    let value = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).ok()
}

/// Point `Host` at `target`, replacing any previous value.
pub fn set_host(headers: &mut HeaderMap, target: &Url) {
    headers.remove(header::HOST);
    if let Some(value) = host_value(target) {
        headers.insert(header::HOST, value);
    }
}

/// Build the header set for an upstream request.
pub fn request_headers(
    inbound: &HeaderMap,
    target: &Url,
    ctx: &ForwardingContext,
    default_user_agent: &str,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for name in REQUEST_ALLOW_LIST {
        for value in inbound.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    set_host(&mut headers, target);

    let client_ip = ctx.client_ip.as_deref().unwrap_or("unknown");
    if let Ok(value) = HeaderValue::from_str(client_ip) {
        headers.insert(X_FORWARDED_FOR, value);
    } else {
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("unknown"));
    }
    if let Ok(value) = HeaderValue::from_str(&ctx.proto) {
        headers.insert(X_FORWARDED_PROTO, value);
    }
    if let Some(value) = ctx.host.as_deref().and_then(|h| HeaderValue::from_str(h).ok()) {
        headers.insert(X_FORWARDED_HOST, value);
    }

    if !headers.contains_key(header::USER_AGENT) {
        if let Ok(value) = HeaderValue::from_str(default_user_agent) {
            headers.insert(header::USER_AGENT, value);
        }
    }

    headers
}

fn is_vendor_header(name: &HeaderName) -> bool {
    VENDOR_PREFIXES.iter().any(|prefix| name.as_str().starts_with(prefix))
}

/// Filter an upstream response's headers and add CORS exposure.
pub fn response_headers(upstream: HeaderMap, mode: ProxyMode) -> HeaderMap {
    let mut headers = upstream;

    for name in RESPONSE_DENY_LIST {
        headers.remove(name);
    }
    if mode == ProxyMode::GitHub {
        for name in SECURITY_DENY_LIST {
            headers.remove(name);
        }
    }

    let vendor: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_vendor_header(name))
        .cloned()
        .collect();
    for name in vendor {
        headers.remove(&name);
    }

    apply_cors(&mut headers);
    let expose = match mode {
        ProxyMode::Simple => HeaderValue::from_static(EXPOSE_HEADERS),
        ProxyMode::GitHub => HeaderValue::from_static("*"),
    };
    headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, expose);

    headers
}

/// Wildcard origin plus the method and header allow-lists.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    if let Ok(value) = HeaderValue::from_str(&allowed_request_headers()) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }
}

/// Headers for a 204 preflight answer.
pub fn preflight_headers(mode: ProxyMode) -> HeaderMap {
    let mut headers = HeaderMap::new();
    apply_cors(&mut headers);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(PREFLIGHT_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(mode.preflight_max_age()),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://example.com/data.json").unwrap()
    }

    #[test]
    fn header_lists_are_shared_statics() {
        assert_eq!(REQUEST_ALLOW_LIST.len(), 11);
        assert_eq!(RESPONSE_DENY_LIST.len(), 13);
        assert_eq!(SECURITY_DENY_LIST.len(), 3);
        assert!(REQUEST_ALLOW_LIST.contains(&HeaderName::from_static("x-api-key")));
        assert!(RESPONSE_DENY_LIST.contains(&header::SET_COOKIE));
        assert!(SECURITY_DENY_LIST.contains(&header::CONTENT_SECURITY_POLICY));
        assert_eq!(
            allowed_request_headers(),
            "authorization, content-type, accept, accept-language, cache-control, pragma, \
             user-agent, range, x-api-key, x-auth-token, x-requested-with"
        );
    }

    #[test]
    fn request_headers_keep_only_allow_list() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        inbound.insert(header::ACCEPT, "application/json".parse().unwrap());
        inbound.insert("x-api-key", "k".parse().unwrap());
        inbound.insert(header::COOKIE, "session=1".parse().unwrap());
        inbound.insert(header::ORIGIN, "https://evil.example".parse().unwrap());
        inbound.insert(header::REFERER, "https://evil.example/".parse().unwrap());
        inbound.insert("cf-ray", "123".parse().unwrap());
        inbound.insert("x-forwarded-for", "6.6.6.6".parse().unwrap());
        inbound.insert(header::HOST, "proxy.local".parse().unwrap());

        let headers = request_headers(&inbound, &target(), &ForwardingContext::default(), "ua");

        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(headers[header::ACCEPT], "application/json");
        assert_eq!(headers["x-api-key"], "k");
        assert!(!headers.contains_key(header::COOKIE));
        assert!(!headers.contains_key(header::ORIGIN));
        assert!(!headers.contains_key(header::REFERER));
        assert!(!headers.contains_key("cf-ray"));
        assert_eq!(headers[header::HOST], "example.com");
        assert_eq!(headers[X_FORWARDED_FOR], "unknown");
    }

    #[test]
    fn request_headers_forwarding_context() {
        let ctx = ForwardingContext {
            client_ip: Some("203.0.113.7".into()),
            proto: "https".into(),
            host: Some("proxy.local".into()),
        };
        let headers = request_headers(&HeaderMap::new(), &target(), &ctx, "edge/1.0");

        assert_eq!(headers[X_FORWARDED_FOR], "203.0.113.7");
        assert_eq!(headers[X_FORWARDED_PROTO], "https");
        assert_eq!(headers[X_FORWARDED_HOST], "proxy.local");
        assert_eq!(headers[header::USER_AGENT], "edge/1.0");
    }

    #[test]
    fn client_user_agent_wins_over_default() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::USER_AGENT, "curl/8.0".parse().unwrap());
        let headers = request_headers(&inbound, &target(), &ForwardingContext::default(), "edge");
        assert_eq!(headers[header::USER_AGENT], "curl/8.0");
    }

    #[test]
    fn host_includes_non_default_port() {
        let url = Url::parse("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(host_value(&url).unwrap(), "127.0.0.1:8080");
        let url = Url::parse("https://example.com:443/x").unwrap();
        assert_eq!(host_value(&url).unwrap(), "example.com");
    }

    #[test]
    fn response_headers_strip_and_cors() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        upstream.insert(header::SET_COOKIE, "a=b".parse().unwrap());
        upstream.insert(header::SERVER, "nginx".parse().unwrap());
        upstream.insert("x-powered-by", "php".parse().unwrap());
        upstream.insert("cf-cache-status", "HIT".parse().unwrap());
        upstream.insert(header::CONTENT_SECURITY_POLICY, "default-src 'none'".parse().unwrap());

        let headers = response_headers(upstream, ProxyMode::Simple);

        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(header::SET_COOKIE));
        assert!(!headers.contains_key(header::SERVER));
        assert!(!headers.contains_key("x-powered-by"));
        assert!(!headers.contains_key("cf-cache-status"));
        // CSP is only stripped for GitHub-routed responses.
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], CORS_ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_EXPOSE_HEADERS], EXPOSE_HEADERS);
    }

    #[test]
    fn github_mode_strips_security_headers() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_SECURITY_POLICY, "default-src 'none'".parse().unwrap());
        upstream.insert(
            header::CONTENT_SECURITY_POLICY_REPORT_ONLY,
            "default-src 'none'".parse().unwrap(),
        );
        upstream.insert("clear-site-data", "\"cache\"".parse().unwrap());
        upstream.insert(header::LOCATION, "https://example.com/".parse().unwrap());

        let headers = response_headers(upstream, ProxyMode::GitHub);

        assert!(!headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(!headers.contains_key(header::CONTENT_SECURITY_POLICY_REPORT_ONLY));
        assert!(!headers.contains_key("clear-site-data"));
        assert_eq!(headers[header::LOCATION], "https://example.com/");
        assert_eq!(headers[header::ACCESS_CONTROL_EXPOSE_HEADERS], "*");
    }

    #[test]
    fn preflight_max_age_per_mode() {
        let simple = preflight_headers(ProxyMode::Simple);
        assert_eq!(simple[header::ACCESS_CONTROL_MAX_AGE], "86400");
        assert_eq!(simple[header::ACCESS_CONTROL_ALLOW_METHODS], PREFLIGHT_ALLOW_METHODS);
        assert!(simple[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .contains("authorization"));

        let github = preflight_headers(ProxyMode::GitHub);
        assert_eq!(github[header::ACCESS_CONTROL_MAX_AGE], "1728000");
    }
}
