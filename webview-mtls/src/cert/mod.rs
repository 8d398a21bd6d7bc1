//! `Certificate` and `PrivateKey` types.
//!
//! These types wrap DER-encoded bytes and validate them at construction time.

use crate::cert::error::{CertificateError, PrivateKeyError};
use crate::cert::parsing::parse_der_encoded_bytes_as_x509_certificate;
use pkcs8::PrivateKeyInfo;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaKeyPair};
use zeroize::Zeroize;

pub mod error;
pub(crate) mod parsing;

/// A single DER-encoded X.509 certificate.
///
/// Invariant: instances are always validated as parseable DER-encoded X.509.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Returns the certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the subject distinguished name in RFC 4514 form.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::ParseX509Certificate`] if the bytes no longer parse,
    /// which cannot happen for a constructed `Certificate`.
    pub fn subject(&self) -> Result<String, CertificateError> {
        let x509 = parse_der_encoded_bytes_as_x509_certificate(&self.0)?;
        Ok(x509.subject().to_string())
    }

    /// Returns the `subjectPublicKey` bits of the certificate.
    pub(crate) fn public_key_bits(&self) -> Result<Vec<u8>, CertificateError> {
        let x509 = parse_der_encoded_bytes_as_x509_certificate(&self.0)?;
        Ok(x509.public_key().subject_public_key.data.to_vec())
    }
}

impl AsRef<[u8]> for Certificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(der_bytes.to_vec())
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: Vec<u8>) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(&der_bytes)?;
        Ok(Self(der_bytes))
    }
}

/// A DER-encoded private key in PKCS#8 format.
///
/// Invariant: instances are always validated as parseable PKCS#8.
///
/// This type is zeroized on drop and is deliberately not `Clone`: the loaded
/// key has a single owner, the cached [`Credential`](crate::Credential).
#[derive(Eq, PartialEq, Zeroize)]
#[zeroize(drop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    /// Returns the private key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether `cert` carries the public half of this key.
    ///
    /// # Errors
    ///
    /// Returns [`PrivateKeyError::UnsupportedAlgorithm`] for keys other than
    /// ECDSA P-256/P-384, Ed25519 and RSA.
    pub fn matches(&self, cert: &Certificate) -> Result<bool, PrivateKeyError> {
        let public_key = self.public_key()?;
        Ok(cert
            .public_key_bits()
            .is_ok_and(|bits| bits == public_key))
    }

    // Encoded as the certificate's `subjectPublicKey`: an uncompressed point
    // for ECDSA, the raw key for Ed25519, `RSAPublicKey` DER for RSA.
    fn public_key(&self) -> Result<Vec<u8>, PrivateKeyError> {
        let rng = SystemRandom::new();
        for alg in [
            &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
            &signature::ECDSA_P384_SHA384_ASN1_SIGNING,
        ] {
            if let Ok(pair) = EcdsaKeyPair::from_pkcs8(alg, &self.0, &rng) {
                return Ok(pair.public_key().as_ref().to_vec());
            }
        }
        if let Ok(pair) = Ed25519KeyPair::from_pkcs8_maybe_unchecked(&self.0) {
            return Ok(pair.public_key().as_ref().to_vec());
        }
        if let Ok(pair) = RsaKeyPair::from_pkcs8(&self.0) {
            return Ok(pair.public_key().as_ref().to_vec());
        }

        let oid = PrivateKeyInfo::try_from(self.0.as_slice())
            .map(|info| info.algorithm.oid.to_string())
            .map_err(PrivateKeyError::DecodePkcs8)?;
        Err(PrivateKeyError::UnsupportedAlgorithm(oid))
    }
}

impl AsRef<[u8]> for PrivateKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for PrivateKey {
    type Error = PrivateKeyError;

    fn try_from(mut bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if let Err(e) = PrivateKeyInfo::try_from(bytes.as_slice()) {
            bytes.zeroize();
            return Err(PrivateKeyError::DecodePkcs8(e));
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<&[u8]> for PrivateKey {
    type Error = PrivateKeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(bytes.to_vec())
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("len", &self.0.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::ec::{EcGroup, EcKey};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey::{PKey, Private};
    use openssl::x509::{X509NameBuilder, X509};

    #[test]
    fn certificate_rejects_garbage() {
        let err = Certificate::try_from(&b"not a certificate"[..]).unwrap_err();
        assert!(matches!(err, CertificateError::ParseX509Certificate(_)));
    }

    #[test]
    fn private_key_rejects_garbage() {
        let err = PrivateKey::try_from(vec![0x30, 0x03, 0x02, 0x01]).unwrap_err();
        assert!(matches!(err, PrivateKeyError::DecodePkcs8(_)));
    }

    #[test]
    fn certificate_rejects_empty_input() {
        assert!(Certificate::try_from(Vec::new()).is_err());
    }

    fn ec_key() -> PKey<Private> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
    }

    fn self_signed(key: &PKey<Private>) -> Certificate {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "pairing").unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        builder.sign(key, MessageDigest::sha256()).unwrap();
        Certificate::try_from(builder.build().to_der().unwrap()).unwrap()
    }

    fn pkcs8(key: &PKey<Private>) -> PrivateKey {
        PrivateKey::try_from(key.private_key_to_pkcs8().unwrap()).unwrap()
    }

    #[test]
    fn key_matches_its_own_certificate_only() {
        let key = ec_key();
        let other = ec_key();
        let cert = self_signed(&key);

        assert!(pkcs8(&key).matches(&cert).unwrap());
        assert!(!pkcs8(&other).matches(&cert).unwrap());
    }

    #[test]
    fn ed25519_key_pairs_with_its_certificate() {
        let key = PKey::generate_ed25519().unwrap();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "ed25519").unwrap();
        let name = name.build();
        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::null()).unwrap();
        let cert = Certificate::try_from(builder.build().to_der().unwrap()).unwrap();

        assert!(pkcs8(&key).matches(&cert).unwrap());
        assert!(!pkcs8(&ec_key()).matches(&cert).unwrap());
    }

    #[test]
    fn unsupported_key_algorithm_is_reported() {
        let dsa = PKey::from_dsa(openssl::dsa::Dsa::generate(2048).unwrap()).unwrap();
        let cert = self_signed(&ec_key());

        let err = pkcs8(&dsa).matches(&cert).unwrap_err();
        assert!(matches!(err, PrivateKeyError::UnsupportedAlgorithm(_)));
    }
}
