use super::{ArchiveCertificate, ArchiveEntry, ArchiveParser, ParsedArchive};
use crate::error::ArchiveError;
use openssl::pkcs12::Pkcs12;
use openssl::x509::X509Ref;
use zeroize::Zeroizing;

/// Alias reported for a key entry whose certificate carries no friendly name.
const DEFAULT_KEY_ALIAS: &str = "1";

/// [`ArchiveParser`] for PKCS#12 (`.p12` / `.pfx`) containers, backed by OpenSSL.
///
/// A PKCS#12 file produced for client authentication holds one private key,
/// its leaf certificate and, optionally, the issuing CA certificates. They are
/// surfaced as a single key entry whose chain is the leaf followed by the CA
/// certificates. A container with certificates but no key yields trusted
/// certificate entries only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pkcs12Parser;

impl ArchiveParser for Pkcs12Parser {
    fn parse(&self, bytes: &[u8], password: &[u8]) -> Result<ParsedArchive, ArchiveError> {
        let password = std::str::from_utf8(password)
            .map_err(|_| ArchiveError::Decrypt("password is not valid UTF-8".into()))?;
        // OpenSSL takes the password as a C string.
        if password.contains('\0') {
            return Err(ArchiveError::Decrypt("password contains a NUL byte".into()));
        }

        let container =
            Pkcs12::from_der(bytes).map_err(|e| ArchiveError::Malformed(e.to_string()))?;
        let parsed = container
            .parse2(password)
            .map_err(|e| ArchiveError::Decrypt(e.to_string()))?;

        let mut cas = Vec::new();
        if let Some(stack) = &parsed.ca {
            for cert in stack {
                cas.push(to_archive_cert(cert)?);
            }
        }

        let mut entries = Vec::with_capacity(cas.len() + 1);
        match (parsed.pkey, parsed.cert) {
            (Some(pkey), leaf) => {
                let key = Zeroizing::new(
                    pkey.private_key_to_pkcs8()
                        .map_err(|e| ArchiveError::Malformed(e.to_string()))?,
                );
                let alias = leaf
                    .as_deref()
                    .and_then(friendly_name)
                    .unwrap_or_else(|| DEFAULT_KEY_ALIAS.to_owned());

                let mut chain = Vec::with_capacity(cas.len() + 1);
                if let Some(leaf) = &leaf {
                    chain.push(to_archive_cert(leaf)?);
                    chain.extend(cas);
                }
                entries.push(ArchiveEntry::private_key(alias, Some(key), chain));
            }
            (None, leaf) => {
                let leaf = leaf.as_deref().map(to_archive_cert).transpose()?;
                for (i, cert) in leaf.into_iter().chain(cas).enumerate() {
                    entries.push(ArchiveEntry::trusted_certificate(format!("cert-{i}"), cert));
                }
            }
        }

        Ok(ParsedArchive::new(entries))
    }
}

fn to_archive_cert(cert: &X509Ref) -> Result<ArchiveCertificate, ArchiveError> {
    cert.to_der()
        .map(ArchiveCertificate::x509)
        .map_err(|e| ArchiveError::Malformed(e.to_string()))
}

fn friendly_name(cert: &X509Ref) -> Option<String> {
    cert.alias()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .filter(|name| !name.is_empty())
}
