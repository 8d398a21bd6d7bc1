use rustls::client::ResolvesClientCert;
use rustls::sign::CertifiedKey;
use rustls::SignatureScheme;
use std::sync::Arc;

/// Presents one fixed client certificate on every request.
///
/// Installed only in configurations for hosts the decision engine approved,
/// so it never needs to decide anything itself.
#[derive(Clone, Debug)]
pub struct CredentialResolver {
    key: Arc<CertifiedKey>,
}

impl CredentialResolver {
    /// Creates a resolver presenting `key`.
    pub fn new(key: Arc<CertifiedKey>) -> Self {
        Self { key }
    }
}

impl ResolvesClientCert for CredentialResolver {
    fn resolve(
        &self,
        _root_hint_subjects: &[&[u8]],
        _sigschemes: &[SignatureScheme],
    ) -> Option<Arc<CertifiedKey>> {
        // rustls falls back to an empty certificate message when the key
        // cannot sign with any offered scheme.
        Some(Arc::clone(&self.key))
    }

    fn has_certs(&self) -> bool {
        true
    }
}
