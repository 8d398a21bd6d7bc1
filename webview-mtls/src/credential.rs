//! The client credential: a private key and its X.509 chain.

use crate::archive::{ArchiveCertificate, ParsedArchive};
use crate::cert::parsing::MAX_CERT_CHAIN_LENGTH;
use crate::cert::{Certificate, PrivateKey};
use crate::error::{ArchiveError, LoadError};

/// A private key and the non-empty X.509 chain it belongs to, leaf first.
///
/// Only obtainable through validation, so the chain is never empty and every
/// member parses as X.509. Immutable once built; the store shares it behind an
/// `Arc`.
#[derive(Debug)]
pub struct Credential {
    alias: String,
    private_key: PrivateKey,
    cert_chain: Vec<Certificate>,
}

impl Credential {
    /// Extracts the credential from the first private key entry of `archive`.
    ///
    /// # Errors
    ///
    /// - [`LoadError::NoKeyEntry`] if no entry is a private key entry.
    /// - [`LoadError::IncompleteCredential`] if that entry has no key or an empty chain.
    /// - [`LoadError::InvalidPrivateKey`] if the key is not PKCS#8 or of an
    ///   unsupported algorithm.
    /// - [`LoadError::KeyCertificateMismatch`] if the key does not belong to the leaf.
    /// - [`LoadError::NonX509Entry`] if a chain member is not an X.509 certificate.
    /// - [`LoadError::ArchiveDecryptionFailure`] if the chain is implausibly long.
    pub fn from_archive(archive: &ParsedArchive) -> Result<Self, LoadError> {
        let entry = archive.first_key_entry().ok_or(LoadError::NoKeyEntry)?;
        let alias = entry.alias();
        let incomplete = || LoadError::IncompleteCredential {
            alias: alias.to_owned(),
        };

        let key = entry.key_bytes().ok_or_else(incomplete)?;
        let chain = entry.chain();
        if chain.is_empty() {
            return Err(incomplete());
        }

        if chain.len() > MAX_CERT_CHAIN_LENGTH {
            return Err(ArchiveError::Malformed(format!(
                "certificate chain has {} entries (max {MAX_CERT_CHAIN_LENGTH})",
                chain.len()
            ))
            .into());
        }

        let cert_chain = chain
            .iter()
            .enumerate()
            .map(|(index, cert)| to_x509(index, cert))
            .collect::<Result<Vec<_>, _>>()?;

        let invalid_key = |source| LoadError::InvalidPrivateKey {
            alias: alias.to_owned(),
            source,
        };
        let private_key = PrivateKey::try_from(key).map_err(invalid_key)?;
        if !private_key.matches(&cert_chain[0]).map_err(invalid_key)? {
            return Err(LoadError::KeyCertificateMismatch {
                alias: alias.to_owned(),
            });
        }

        Ok(Self {
            alias: alias.to_owned(),
            private_key,
            cert_chain,
        })
    }

    /// The archive alias the credential was loaded from.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The private key, PKCS#8 DER.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The certificate chain, leaf first. Never empty.
    pub fn cert_chain(&self) -> &[Certificate] {
        &self.cert_chain
    }

    /// The leaf certificate.
    pub fn leaf(&self) -> &Certificate {
        &self.cert_chain[0]
    }
}

fn to_x509(index: usize, cert: &ArchiveCertificate) -> Result<Certificate, LoadError> {
    if !cert.is_x509() {
        return Err(LoadError::NonX509Entry {
            index,
            cert_type: cert.cert_type().to_owned(),
            source: None,
        });
    }
    Certificate::try_from(cert.der()).map_err(|e| LoadError::NonX509Entry {
        index,
        cert_type: cert.cert_type().to_owned(),
        source: Some(e),
    })
}
