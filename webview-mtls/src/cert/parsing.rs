//! Internal parsing helpers.

use crate::cert::error::CertificateError;
use x509_parser::certificate::X509Certificate;
use x509_parser::error::X509Error;
use x509_parser::nom::Err;

/// Maximum number of certificates accepted in a client certificate chain.
///
/// Real chains are leaf + one or two intermediates; anything longer than this
/// is treated as a malformed archive.
pub(crate) const MAX_CERT_CHAIN_LENGTH: usize = 16;

/// Parses the given DER-encoded bytes as a single X.509 certificate.
///
/// Trailing bytes are rejected so that a chain entry cannot smuggle a second
/// certificate.
pub(crate) fn parse_der_encoded_bytes_as_x509_certificate(
    der_bytes: &[u8],
) -> Result<X509Certificate<'_>, CertificateError> {
    match x509_parser::parse_x509_certificate(der_bytes) {
        Ok((rest, _)) if !rest.is_empty() => Err(CertificateError::TrailingData(rest.len())),
        Ok((_, cert)) => Ok(cert),
        Err(Err::Incomplete(_)) => Err(CertificateError::ParseX509Certificate(
            X509Error::InvalidCertificate,
        )),
        Err(Err::Error(e) | Err::Failure(e)) => Err(CertificateError::ParseX509Certificate(e)),
    }
}
