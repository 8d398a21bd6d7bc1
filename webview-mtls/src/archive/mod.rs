//! The archive seam: where bytes come from and how they are decoded.
//!
//! The store never touches a platform keystore directly. It asks an
//! [`AssetSource`] for a byte stream and an [`ArchiveParser`] to turn those
//! bytes into a [`ParsedArchive`]. Both are traits so the store can be driven
//! by in-memory fakes.

mod assets;
#[cfg(feature = "pkcs12")]
mod pkcs12;

pub use assets::{DirAssets, MemoryAssets};
#[cfg(feature = "pkcs12")]
pub use pkcs12::Pkcs12Parser;

use crate::error::ArchiveError;
use std::io::{self, Read};
use zeroize::Zeroizing;

/// Certificate type label used by archives for X.509 certificates.
pub const X509_CERT_TYPE: &str = "X.509";

/// Opens named resources as byte streams.
pub trait AssetSource: Send + Sync + 'static {
    /// Opens the resource called `name`.
    ///
    /// # Errors
    ///
    /// Any I/O failure; the store reports it as
    /// [`LoadError::ArchiveUnreadable`](crate::LoadError::ArchiveUnreadable).
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Decodes a password-protected key/certificate archive.
pub trait ArchiveParser: Send + Sync + 'static {
    /// Decrypts and decodes `bytes` with `password`.
    ///
    /// Implementations must not keep a copy of `password`.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::Decrypt`] for a wrong password or corrupt container,
    /// [`ArchiveError::Malformed`] for undecodable content.
    fn parse(&self, bytes: &[u8], password: &[u8]) -> Result<ParsedArchive, ArchiveError>;
}

impl<T: AssetSource + ?Sized> AssetSource for Box<T> {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        (**self).open(name)
    }
}

impl<T: ArchiveParser + ?Sized> ArchiveParser for Box<T> {
    fn parse(&self, bytes: &[u8], password: &[u8]) -> Result<ParsedArchive, ArchiveError> {
        (**self).parse(bytes, password)
    }
}

/// A certificate as stored in an archive, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCertificate {
    cert_type: String,
    der: Vec<u8>,
}

impl ArchiveCertificate {
    /// Creates an X.509 certificate entry from DER bytes.
    pub fn x509(der: impl Into<Vec<u8>>) -> Self {
        Self::new(X509_CERT_TYPE, der)
    }

    /// Creates a certificate entry of an arbitrary type.
    pub fn new(cert_type: impl Into<String>, der: impl Into<Vec<u8>>) -> Self {
        Self {
            cert_type: cert_type.into(),
            der: der.into(),
        }
    }

    /// The certificate type label reported by the archive.
    pub fn cert_type(&self) -> &str {
        &self.cert_type
    }

    /// Whether the archive reports this certificate as X.509.
    pub fn is_x509(&self) -> bool {
        self.cert_type.eq_ignore_ascii_case(X509_CERT_TYPE)
    }

    /// The encoded certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

/// What an archive entry holds.
#[derive(Debug)]
#[non_exhaustive]
pub enum EntryKind {
    /// A private key with its certificate chain, leaf first.
    ///
    /// Either part may be missing in a damaged archive.
    PrivateKey {
        /// PKCS#8 DER bytes of the key.
        key: Option<Zeroizing<Vec<u8>>>,
        /// The chain, leaf first.
        chain: Vec<ArchiveCertificate>,
    },
    /// A certificate without a key.
    TrustedCertificate(ArchiveCertificate),
}

/// A single aliased archive entry.
#[derive(Debug)]
pub struct ArchiveEntry {
    alias: String,
    kind: EntryKind,
}

impl ArchiveEntry {
    /// Creates a private key entry.
    pub fn private_key(
        alias: impl Into<String>,
        key: Option<Zeroizing<Vec<u8>>>,
        chain: Vec<ArchiveCertificate>,
    ) -> Self {
        Self {
            alias: alias.into(),
            kind: EntryKind::PrivateKey { key, chain },
        }
    }

    /// Creates a trusted certificate entry.
    pub fn trusted_certificate(alias: impl Into<String>, cert: ArchiveCertificate) -> Self {
        Self {
            alias: alias.into(),
            kind: EntryKind::TrustedCertificate(cert),
        }
    }

    /// The entry alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The entry content.
    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// The PKCS#8 key bytes, for a key entry that holds a key.
    pub fn key_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            EntryKind::PrivateKey { key, .. } => key.as_deref().map(Vec::as_slice),
            EntryKind::TrustedCertificate(_) => None,
        }
    }

    /// The certificates of the entry, leaf first.
    ///
    /// For a trusted certificate entry this is the single certificate.
    pub fn chain(&self) -> &[ArchiveCertificate] {
        match &self.kind {
            EntryKind::PrivateKey { chain, .. } => chain,
            EntryKind::TrustedCertificate(cert) => std::slice::from_ref(cert),
        }
    }

    /// Whether this is a private key entry.
    pub fn is_key_entry(&self) -> bool {
        matches!(self.kind, EntryKind::PrivateKey { .. })
    }
}

/// The decoded content of an archive: aliased entries in archive order.
#[derive(Debug, Default)]
pub struct ParsedArchive {
    entries: Vec<ArchiveEntry>,
}

impl ParsedArchive {
    /// Creates an archive from entries, keeping their order.
    pub fn new(entries: Vec<ArchiveEntry>) -> Self {
        Self { entries }
    }

    /// All aliases, in archive order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(ArchiveEntry::alias)
    }

    /// The first private key entry, in archive order.
    pub fn first_key_entry(&self) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.is_key_entry())
    }

    /// The alias of the first private key entry.
    pub fn first_key_alias(&self) -> Option<&str> {
        self.first_key_entry().map(ArchiveEntry::alias)
    }

    /// The private key stored under `alias`.
    ///
    /// Only key entries are considered, so a certificate entry sharing the
    /// alias does not hide the key.
    pub fn private_key(&self, alias: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.alias == alias && e.is_key_entry())?
            .key_bytes()
    }

    /// The certificate chain of the first entry stored under `alias`, leaf first.
    pub fn certificate_chain(&self, alias: &str) -> Option<&[ArchiveCertificate]> {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .map(ArchiveEntry::chain)
    }
}
