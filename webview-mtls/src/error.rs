//! Error types for configuration, archive decoding and credential loading.

use crate::cert::error::{CertificateError, PrivateKeyError};
use std::fmt;
use std::io;

/// Errors produced while reading [`MtlsConfig`](crate::MtlsConfig) from the environment.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// An environment variable is set but does not hold valid unicode.
    #[error("environment variable {0} is not valid unicode")]
    NotUnicode(&'static str),
}

/// Errors produced by an [`ArchiveParser`](crate::ArchiveParser).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ArchiveError {
    /// The container could not be decrypted: wrong password, unsupported
    /// encryption, or corrupt data.
    #[error("failed decrypting archive: {0}")]
    Decrypt(String),

    /// The container decrypted but its content is malformed.
    #[error("malformed archive content: {0}")]
    Malformed(String),
}

/// Reasons a [`CredentialStore`](crate::CredentialStore) load attempt fails.
///
/// None of these are cached: the next request retries the load from scratch.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// No archive resource name is configured (empty after trimming).
    #[error("no client certificate archive is configured")]
    MissingArchiveConfig,

    /// The archive resource could not be opened or read.
    #[error("failed reading archive resource '{resource}'")]
    ArchiveUnreadable {
        /// The configured resource name.
        resource: String,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The archive could not be decrypted or decoded.
    #[error("failed decoding archive")]
    ArchiveDecryptionFailure(#[from] ArchiveError),

    /// The archive holds no private-key entry.
    #[error("no private key entry found in archive")]
    NoKeyEntry,

    /// The key entry lacks a private key or a certificate chain.
    #[error("archive entry '{alias}' is missing its private key or certificate chain")]
    IncompleteCredential {
        /// Alias of the key entry.
        alias: String,
    },

    /// The private key of the key entry is not a valid PKCS#8 key.
    #[error("archive entry '{alias}' holds an unusable private key")]
    InvalidPrivateKey {
        /// Alias of the key entry.
        alias: String,
        /// Decoding failure.
        #[source]
        source: PrivateKeyError,
    },

    /// The private key is not the one certified by the leaf certificate.
    #[error("archive entry '{alias}' holds a private key that does not match its leaf certificate")]
    KeyCertificateMismatch {
        /// Alias of the key entry.
        alias: String,
    },

    /// A member of the certificate chain is not an X.509 certificate.
    #[error("certificate #{index} in the chain is not an X.509 certificate ({cert_type})")]
    NonX509Entry {
        /// Position in the chain, leaf is 0.
        index: usize,
        /// The certificate type reported by the archive.
        cert_type: String,
        /// Parse failure, when the entry claimed to be X.509.
        #[source]
        source: Option<CertificateError>,
    },
}

impl LoadError {
    /// Returns the stable kind of this error.
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::MissingArchiveConfig => LoadErrorKind::MissingArchiveConfig,
            Self::ArchiveUnreadable { .. } => LoadErrorKind::ArchiveUnreadable,
            Self::ArchiveDecryptionFailure(_) => LoadErrorKind::ArchiveDecryptionFailure,
            Self::NoKeyEntry => LoadErrorKind::NoKeyEntry,
            Self::IncompleteCredential { .. }
            | Self::InvalidPrivateKey { .. }
            | Self::KeyCertificateMismatch { .. } => LoadErrorKind::IncompleteCredential,
            Self::NonX509Entry { .. } => LoadErrorKind::NonX509Entry,
        }
    }
}

/// Low-cardinality classification of a [`LoadError`], suitable for log fields
/// and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LoadErrorKind {
    /// See [`LoadError::MissingArchiveConfig`].
    MissingArchiveConfig,
    /// See [`LoadError::ArchiveUnreadable`].
    ArchiveUnreadable,
    /// See [`LoadError::ArchiveDecryptionFailure`].
    ArchiveDecryptionFailure,
    /// See [`LoadError::NoKeyEntry`].
    NoKeyEntry,
    /// See [`LoadError::IncompleteCredential`], [`LoadError::InvalidPrivateKey`]
    /// and [`LoadError::KeyCertificateMismatch`].
    IncompleteCredential,
    /// See [`LoadError::NonX509Entry`].
    NonX509Entry,
}

impl LoadErrorKind {
    /// Returns a string representation of the error kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingArchiveConfig => "missing_archive_config",
            Self::ArchiveUnreadable => "archive_unreadable",
            Self::ArchiveDecryptionFailure => "archive_decryption_failure",
            Self::NoKeyEntry => "no_key_entry",
            Self::IncompleteCredential => "incomplete_credential",
            Self::NonX509Entry => "non_x509_entry",
        }
    }
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
