//! # APNs Client
//!
//! Apple Push Notification service (APNs) client over HTTP/2.
//!
//! ## Features
//!
//! - **HTTP/2 delivery**: persistent multiplexed connections to Apple's
//!   provider endpoints
//! - **Certificate auth**: PKCS#12 (`.p12`) and PEM credentials, including
//!   encrypted variants
//! - **Token auth**: ES256 bearer tokens from a `.p8` signing key, cached
//!   and refreshed inside the reuse window
//! - **Payload builder**: chainable construction of the `aps` dictionary
//! - **Client pooling**: a bounded, age-expiring manager that shares one
//!   client per credential
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use apns_client::{Client, Notification, Payload, PushType, Token};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = apns_client::token::auth_key_from_file("AuthKey_ABC123DEFG.p8")?;
//!     let token = Token::new(key, "ABC123DEFG", "DEF123GHIJ");
//!     let client = Client::with_token(token)?.production();
//!
//!     let payload = Payload::new().alert_title("Hello").alert_body("World").badge(1);
//!     let mut notification = Notification::new("<device token>", payload);
//!     notification.topic = Some("com.example.app".to_string());
//!     notification.push_type = PushType::Alert;
//!
//!     let response = client.push(&notification).await?;
//!     println!("sent: {} ({:?})", response.sent(), response.apns_id);
//!     Ok(())
//! }
//! ```
//!
//! ## With a certificate
//!
//! ```rust,ignore
//! use apns_client::{Certificate, Client};
//!
//! let certificate = Certificate::from_p12_file("cert.p12", "password")?;
//! let client = Client::new(certificate)?.production();
//! ```
//!
//! Server-side rejections are not errors: they come back as a [`Response`]
//! with a non-200 status and a [`reason`](response::reason) string. Errors
//! mean the push could not be attempted or the server's answer could not be
//! trusted.

pub mod certificate;
pub mod client;
pub mod error;
pub mod manager;
pub mod notification;
pub mod payload;
pub mod response;
pub mod token;

pub use certificate::Certificate;
pub use client::{Client, HOST_PRODUCTION, HOST_SANDBOX, set_tls_dial_timeout, tls_dial_timeout};
pub use error::{ApnsError, Result};
pub use manager::ClientManager;
pub use notification::{Notification, NotificationPayload, Priority, PushType};
pub use payload::{Alert, AlertDictionary, CriticalSound, InterruptionLevel, Payload, Sound};
pub use response::Response;
pub use token::{AuthKey, Token, auth_key_from_bytes, auth_key_from_file};

/// Prelude for common imports.
///
/// ```
/// use apns_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::certificate::Certificate;
    pub use crate::client::{Client, HOST_PRODUCTION, HOST_SANDBOX};
    pub use crate::error::{ApnsError, Result};
    pub use crate::manager::ClientManager;
    pub use crate::notification::{Notification, NotificationPayload, Priority, PushType};
    pub use crate::payload::{InterruptionLevel, Payload};
    pub use crate::response::Response;
    pub use crate::token::{AuthKey, Token};
}
