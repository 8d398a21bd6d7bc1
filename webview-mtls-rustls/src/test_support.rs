//! Shared fixtures: a PKCS#12 archive generated once per test binary.

use openssl::asn1::Asn1Time;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::x509::{X509NameBuilder, X509};
use std::sync::{Arc, OnceLock};
use webview_mtls::{ArchiveParser, Credential, Pkcs12Parser};

pub(crate) const PASSWORD: &str = "s3cret";

pub(crate) fn archive() -> Vec<u8> {
    static ARCHIVE: OnceLock<Vec<u8>> = OnceLock::new();
    ARCHIVE
        .get_or_init(|| {
            let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
            let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

            let mut name = X509NameBuilder::new().unwrap();
            name.append_entry_by_text("CN", "webview-device").unwrap();
            let name = name.build();

            let mut cert = X509::builder().unwrap();
            cert.set_version(2).unwrap();
            cert.set_subject_name(&name).unwrap();
            cert.set_issuer_name(&name).unwrap();
            cert.set_pubkey(&key).unwrap();
            cert.set_not_before(&Asn1Time::days_from_now(0).unwrap())
                .unwrap();
            cert.set_not_after(&Asn1Time::days_from_now(7).unwrap())
                .unwrap();
            cert.sign(&key, MessageDigest::sha256()).unwrap();
            let cert = cert.build();

            let mut p12 = Pkcs12::builder();
            p12.name("webview-device").pkey(&key).cert(&cert);
            p12.build2(PASSWORD).unwrap().to_der().unwrap()
        })
        .clone()
}

pub(crate) fn credential() -> Arc<Credential> {
    let parsed = Pkcs12Parser
        .parse(&archive(), PASSWORD.as_bytes())
        .unwrap();
    Arc::new(Credential::from_archive(&parsed).unwrap())
}
