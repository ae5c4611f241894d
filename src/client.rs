//! HTTP/2 client for the APNs provider API.

use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::certificate::Certificate;
use crate::error::{ApnsError, Result};
use crate::notification::Notification;
use crate::response::Response;
use crate::token::Token;

/// Production endpoint (port 443; APNs also listens on 2197).
pub const HOST_PRODUCTION: &str = "https://api.push.apple.com";

/// Sandbox endpoint for development builds.
pub const HOST_SANDBOX: &str = "https://api.sandbox.push.apple.com";

static TLS_DIAL_TIMEOUT: Mutex<Duration> = Mutex::new(Duration::from_secs(20));

/// The process-wide TCP+TLS dial timeout (default 20 seconds).
pub fn tls_dial_timeout() -> Duration {
    *TLS_DIAL_TIMEOUT
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Set the dial timeout for transports created after this call.
///
/// Independent of any per-request timeout; a dial that cannot complete
/// within the window fails that attempt.
pub fn set_tls_dial_timeout(timeout: Duration) {
    *TLS_DIAL_TIMEOUT
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = timeout;
}

type Transport = legacy::Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// An APNs client bound to one credential.
///
/// Owns an HTTP/2 transport whose TLS configuration carries the client
/// certificate (token-mode clients carry no TLS identity and authenticate
/// per-request with a bearer header). Clients are `Send + Sync`, multiplex
/// concurrent pushes over shared connections, and are intended to be built
/// once per credential and shared via [`ClientManager`](crate::ClientManager).
pub struct Client {
    host: String,
    certificate: Option<Certificate>,
    token: Option<Token>,
    connector: HttpsConnector<HttpConnector>,
    transport: RwLock<Transport>,
}

impl Client {
    /// Create a certificate-authenticated client targeting the sandbox.
    ///
    /// The empty [`Certificate`] is accepted and yields a transport with no
    /// client identity, which is how certless test clients are built.
    pub fn new(certificate: Certificate) -> Result<Self> {
        let connector = build_connector(&certificate)?;
        let transport = build_transport(&connector);
        Ok(Self {
            host: HOST_SANDBOX.to_string(),
            certificate: Some(certificate),
            token: None,
            connector,
            transport: RwLock::new(transport),
        })
    }

    /// Create a bearer-token-authenticated client targeting the sandbox.
    pub fn with_token(token: Token) -> Result<Self> {
        let connector = build_connector(&Certificate::default())?;
        let transport = build_transport(&connector);
        Ok(Self {
            host: HOST_SANDBOX.to_string(),
            certificate: None,
            token: Some(token),
            connector,
            transport: RwLock::new(transport),
        })
    }

    /// Target the sandbox endpoint.
    pub fn development(mut self) -> Self {
        self.host = HOST_SANDBOX.to_string();
        self
    }

    /// Target the production endpoint.
    pub fn production(mut self) -> Self {
        self.host = HOST_PRODUCTION.to_string();
        self
    }

    /// Target an arbitrary host (local mock servers, proxies).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// The endpoint this client targets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The credential this client presents during the TLS handshake.
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// The bearer-token authenticator, for token-mode clients.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Submit a single notification and decode the outcome.
    ///
    /// A non-200 answer from APNs is not an error: it returns a [`Response`]
    /// with the failure `reason`. Errors mean the push could not be
    /// attempted or the answer could not be trusted.
    pub async fn push(&self, notification: &Notification) -> Result<Response> {
        let body = notification.encode_payload()?;
        let url = self.device_url(notification)?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(url.as_str())
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header("apns-push-type", notification.push_type.as_str());

        if let Some(apns_id) = &notification.apns_id {
            builder = builder.header("apns-id", apns_id.as_str());
        }
        if let Some(collapse_id) = &notification.collapse_id {
            builder = builder.header("apns-collapse-id", collapse_id.as_str());
        }
        if let Some(priority) = notification.priority {
            builder = builder.header("apns-priority", priority.as_str());
        }
        if let Some(topic) = &notification.topic {
            builder = builder.header("apns-topic", topic.as_str());
        }
        if let Some(expiration) = notification.expiration {
            builder = builder.header("apns-expiration", expiration.timestamp().to_string());
        }
        if let Some(thread_id) = &notification.thread_id {
            builder = builder.header("thread-id", thread_id.as_str());
        }
        if let Some(token) = &self.token {
            let bearer = token.generate_if_expired()?;
            builder = builder.header(AUTHORIZATION, format!("bearer {bearer}"));
        }

        let request = builder
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| ApnsError::Transport(e.to_string()))?;

        debug!(url = %url, push_type = notification.push_type.as_str(), "sending notification");

        let transport = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let response = transport
            .request(request)
            .await
            .map_err(|e| ApnsError::Transport(e.to_string()))?;

        decode_response(response).await
    }

    /// [`push`](Self::push) bounded by a deadline.
    ///
    /// A zero timeout returns [`ApnsError::Cancelled`] before dispatch; an
    /// elapsed timeout aborts the in-flight request with the same error.
    /// Partial server-side delivery is possible but undetectable.
    pub async fn push_with_timeout(
        &self,
        notification: &Notification,
        timeout: Duration,
    ) -> Result<Response> {
        if timeout.is_zero() {
            return Err(ApnsError::Cancelled);
        }
        tokio::time::timeout(timeout, self.push(notification))
            .await
            .map_err(|_| ApnsError::Cancelled)?
    }

    /// Drop pooled idle connections by swapping in a fresh pool over the
    /// same connector.
    pub fn close_idle_connections(&self) {
        let fresh = build_transport(&self.connector);
        *self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner) = fresh;
    }

    fn device_url(&self, notification: &Notification) -> Result<String> {
        let device_token = notification.device_token.as_str();
        let url_safe = !device_token.is_empty()
            && device_token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'));
        if !url_safe {
            return Err(ApnsError::Transport(
                "device token is empty or not a URL-safe string".to_string(),
            ));
        }
        Ok(format!("{}/3/device/{}", self.host, device_token))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

fn build_connector(certificate: &Certificate) -> Result<HttpsConnector<HttpConnector>> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let builder = rustls::ClientConfig::builder().with_root_certificates(roots);
    let tls = match certificate.identity() {
        Some((chain, key)) => builder
            .with_client_auth_cert(chain, key)
            .map_err(|e| ApnsError::Config(e.to_string()))?,
        None => builder.with_no_client_auth(),
    };

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(tls_dial_timeout()));

    Ok(HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http))
}

fn build_transport(connector: &HttpsConnector<HttpConnector>) -> Transport {
    legacy::Client::builder(TokioExecutor::new()).build(connector.clone())
}

async fn decode_response(response: hyper::Response<hyper::body::Incoming>) -> Result<Response> {
    let status = response.status().as_u16();
    let apns_id = response
        .headers()
        .get("apns-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let json_body = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| ApnsError::Transport(e.to_string()))?
        .to_bytes();

    let mut decoded = Response {
        status_code: status,
        apns_id,
        ..Response::default()
    };
    if !body.is_empty() && json_body {
        let parsed: Response = serde_json::from_slice(&body)
            .map_err(|e| ApnsError::ResponseDecode(e.to_string()))?;
        decoded.reason = parsed.reason;
        decoded.timestamp = parsed.timestamp;
    }

    if !decoded.sent() {
        debug!(
            status,
            reason = decoded.reason.as_deref().unwrap_or(""),
            "notification rejected"
        );
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn mock_notification() -> Notification {
        Notification::new(
            "11aa01229f15f0f0c52029d8cf8cd0aeaf2365fe4cebc4af26cd6d76b7919ef7",
            br#"{"aps":{"alert":"Hello!"}}"#.as_slice(),
        )
    }

    #[test]
    fn test_client_default_host() {
        let client = Client::new(Certificate::default()).unwrap();
        assert_eq!(client.host(), "https://api.sandbox.push.apple.com");
    }

    #[test]
    fn test_token_client_default_host() {
        let client = Client::with_token(Token::default()).unwrap();
        assert_eq!(client.host(), "https://api.sandbox.push.apple.com");
    }

    #[test]
    fn test_client_development_host() {
        let client = Client::new(Certificate::default()).unwrap().development();
        assert_eq!(client.host(), "https://api.sandbox.push.apple.com");
    }

    #[test]
    fn test_client_production_host() {
        let client = Client::new(Certificate::default()).unwrap().production();
        assert_eq!(client.host(), "https://api.push.apple.com");
    }

    #[test]
    fn test_client_with_loaded_certificate() {
        let certificate =
            Certificate::from_p12_file(fixture("certificate-valid.p12"), "").unwrap();
        let client = Client::new(certificate).unwrap();
        assert!(client.certificate().unwrap().has_identity());
    }

    #[test]
    fn test_tls_dial_timeout_roundtrip() {
        assert_eq!(tls_dial_timeout(), Duration::from_secs(20));
        set_tls_dial_timeout(Duration::from_millis(10));
        assert_eq!(tls_dial_timeout(), Duration::from_millis(10));
        set_tls_dial_timeout(Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_push_rejects_empty_device_token() {
        let client = Client::new(Certificate::default()).unwrap();
        let mut n = mock_notification();
        n.device_token = String::new();
        let err = client.push(&n).await.unwrap_err();
        assert!(matches!(err, ApnsError::Transport(_)));
    }

    #[tokio::test]
    async fn test_push_rejects_unsafe_device_token() {
        let client = Client::new(Certificate::default()).unwrap();
        let mut n = mock_notification();
        n.device_token = "DGw\x07OoD+HwSroh#Ug]%xzd]".to_string();
        let err = client.push(&n).await.unwrap_err();
        assert!(matches!(err, ApnsError::Transport(_)));
    }

    #[tokio::test]
    async fn test_push_surfaces_signing_failure_before_dispatch() {
        // Default token has no auth key; the bearer refresh fails before
        // any network I/O.
        let client = Client::with_token(Token::default()).unwrap();
        let err = client.push(&mock_notification()).await.unwrap_err();
        assert!(matches!(err, ApnsError::Signature(_)));
    }

    #[tokio::test]
    async fn test_zero_timeout_is_cancelled() {
        let client = Client::new(Certificate::default()).unwrap();
        let err = client
            .push_with_timeout(&mock_notification(), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ApnsError::Cancelled));
    }

    #[test]
    fn test_close_idle_connections_keeps_client_usable() {
        let client = Client::new(Certificate::default()).unwrap();
        client.close_idle_connections();
        assert_eq!(client.host(), "https://api.sandbox.push.apple.com");
    }
}
