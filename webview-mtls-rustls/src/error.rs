use webview_mtls::LoadError;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `webview-mtls-rustls`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The decision engine cancelled the handshake: the host requires the
    /// client credential and it could not be loaded.
    #[error("client certificate handshake cancelled: {0}")]
    HandshakeCancelled(#[source] LoadError),

    /// Failed to create a `rustls::sign::CertifiedKey` from the credential.
    #[error("failed building rustls certified key: {0}")]
    CertifiedKey(String),

    /// A rustls error occurred.
    #[error("rustls error: {0}")]
    Rustls(#[from] rustls::Error),
}
