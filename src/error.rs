//! APNs client error types.

use thiserror::Error;

/// Result type for APNs operations.
pub type Result<T> = std::result::Result<T, ApnsError>;

/// APNs client errors.
///
/// Server-side push failures are not errors: a delivery the server rejects
/// comes back as a [`Response`](crate::Response) with a non-200 status and a
/// populated `reason`. Anything that prevents a trustworthy response, from
/// unusable credentials and signing failures to transport faults and
/// malformed server JSON, surfaces here.
#[derive(Debug, Error)]
pub enum ApnsError {
    /// PKCS#12 archive could not be parsed.
    #[error("invalid PKCS#12 archive: {0}")]
    Pkcs12(String),

    /// PKCS#12 decryption password incorrect.
    #[error("PKCS#12 decryption password incorrect")]
    Pkcs12Password,

    /// PEM input contained no certificate block.
    #[error("no certificate found in PEM input")]
    MissingCertificate,

    /// PEM input contained no private-key block.
    #[error("no private key found in PEM input")]
    MissingPrivateKey,

    /// Encrypted PEM private key could not be decrypted.
    #[error("failed to decrypt PEM private key")]
    KeyDecryption,

    /// PEM private-key block is not a valid RSA/EC/PKCS#8 key.
    #[error("failed to parse PEM private key: {0}")]
    KeyParse(String),

    /// PKCS#8 auth key is not a valid P-256 ECDSA private key.
    #[error("invalid auth key: {0}")]
    InvalidAuthKey(String),

    /// Bearer-token signing failed.
    #[error("token signing failed: {0}")]
    Signature(String),

    /// Notification payload could not be JSON-encoded.
    #[error("payload encoding failed: {0}")]
    PayloadEncode(String),

    /// Transport-level failure (DNS, TLS, connect, HTTP/2 framing), or a
    /// device token rejected before dispatch.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request was cancelled or timed out before completing.
    #[error("request cancelled")]
    Cancelled,

    /// The server response body declared JSON but did not decode.
    #[error("response decoding failed: {0}")]
    ResponseDecode(String),

    /// Client construction failed (TLS configuration).
    #[error("client configuration error: {0}")]
    Config(String),

    /// I/O error reading a credential file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApnsError {
    /// Check if this error indicates unusable credentials.
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            Self::Pkcs12(_)
                | Self::Pkcs12Password
                | Self::MissingCertificate
                | Self::MissingPrivateKey
                | Self::KeyDecryption
                | Self::KeyParse(_)
                | Self::InvalidAuthKey(_)
        )
    }

    /// Check if this error is retryable without caller intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApnsError::KeyParse("bad block".to_string());
        assert!(err.to_string().contains("bad block"));
        assert_eq!(
            ApnsError::Pkcs12Password.to_string(),
            "PKCS#12 decryption password incorrect"
        );
    }

    #[test]
    fn test_credential_classification() {
        assert!(ApnsError::Pkcs12Password.is_credential());
        assert!(ApnsError::MissingCertificate.is_credential());
        assert!(!ApnsError::Cancelled.is_credential());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApnsError::Transport("reset".to_string()).is_retryable());
        assert!(!ApnsError::Signature("no key".to_string()).is_retryable());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ApnsError = io.into();
        assert!(matches!(err, ApnsError::Io(_)));
    }
}
