//! Error types for certificate and private key validation.

use x509_parser::error::X509Error;

/// An error that may arise parsing X.509 certificates.
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum CertificateError {
    /// Error returned by the X.509 parsing library.
    #[error("failed parsing X.509 certificate")]
    ParseX509Certificate(#[from] X509Error),

    /// Bytes were left over after the certificate.
    #[error("unexpected {0} trailing byte(s) after X.509 certificate")]
    TrailingData(usize),
}

/// An error that may arise decoding private keys.
#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum PrivateKeyError {
    /// Error returned by the pkcs#8 private key decoding library.
    #[error("failed decoding PKCS#8 private key")]
    DecodePkcs8(pkcs8::Error),

    /// The key decodes but its algorithm is not one a TLS client can sign with.
    #[error("unsupported private key algorithm {0}")]
    UnsupportedAlgorithm(String),
}
