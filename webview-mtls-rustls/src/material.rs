use crate::crypto::default_provider;
use crate::error::{Error, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::sign::CertifiedKey;
use std::sync::Arc;
use webview_mtls::Credential;

/// Builds a rustls `CertifiedKey` from a loaded credential.
///
/// The signing key is loaded through the process default crypto provider
/// (installed on demand).
///
/// # Errors
///
/// Returns [`Error::CertifiedKey`] if no crypto provider is available or the
/// provider does not support the key type.
pub fn certified_key_from_credential(credential: &Credential) -> Result<Arc<CertifiedKey>> {
    let provider = default_provider()?;

    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        credential.private_key().as_bytes().to_vec(),
    ));
    let signing_key = provider
        .key_provider
        .load_private_key(key_der)
        .map_err(|e| Error::CertifiedKey(format!("{e:?}")))?;

    let chain: Vec<CertificateDer<'static>> = credential
        .cert_chain()
        .iter()
        .map(|c| CertificateDer::from(c.as_bytes().to_vec()))
        .collect();

    Ok(Arc::new(CertifiedKey::new(chain, signing_key)))
}
