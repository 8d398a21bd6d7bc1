#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Mutual-TLS client authentication for embedded web surfaces.
//!
//! When a server asks an embedded web client for a client certificate, this
//! crate decides whether to supply one and, if so, supplies the private key and
//! X.509 chain held in a password-protected PKCS#12 archive.
//!
//! The flow is:
//!
//! 1. the host shell builds an [`MtlsConfig`] once, plus a [`CredentialStore`]
//!    over an [`AssetSource`] and an [`ArchiveParser`];
//! 2. every client certificate request is handed to [`DecisionEngine::decide`];
//! 3. the returned [`Decision`] tells the shell to abstain, abort, or present
//!    the credential.
//!
//! Policy checks (feature toggle, host allow-list) always run before any key
//! material is touched. The archive is read at most once successfully; failed
//! loads are retried on the next request.
//!
//! ```no_run
//! use std::sync::Arc;
//! use webview_mtls::{
//!     CertificateRequest, CredentialStore, Decision, DecisionEngine, DirAssets, MtlsConfig,
//!     Pkcs12Parser,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(MtlsConfig::from_env()?);
//! let store = Arc::new(CredentialStore::new(
//!     Arc::clone(&config),
//!     DirAssets::new("/opt/app/assets"),
//!     Pkcs12Parser,
//! ));
//! let engine = DecisionEngine::builder(config, store).build();
//!
//! match engine.decide(&CertificateRequest::new("api.example.com", 443)) {
//!     Decision::Ignore(_) => { /* continue without a client certificate */ }
//!     Decision::Cancel(_) => { /* abort the handshake */ }
//!     Decision::Proceed(credential) => {
//!         let _chain = credential.cert_chain();
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **`pkcs12`** (default): OpenSSL-backed [`Pkcs12Parser`].
//! - **`logging`** (default): emit `log` records.
//! - **`tracing`**: emit `tracing` events instead of `log` records.

mod observability;
mod prelude;

pub mod allow_list;
pub mod archive;
pub mod cert;
pub mod config;
pub mod credential;
pub mod decision;
pub mod error;
pub mod policy;
pub mod secret;
pub mod store;

pub use crate::{
    allow_list::HostAllowList,
    archive::{
        ArchiveCertificate, ArchiveEntry, ArchiveParser, AssetSource, DirAssets, EntryKind,
        MemoryAssets, ParsedArchive,
    },
    cert::{Certificate, PrivateKey},
    config::{MtlsConfig, MtlsConfigBuilder, SecretString},
    credential::Credential,
    decision::{
        Abstain, CertificateRequest, Decision, DecisionEngine, DecisionEngineBuilder,
        DecisionKind, DecisionObserver,
    },
    error::{ArchiveError, ConfigError, LoadError, LoadErrorKind},
    policy::{EffectivePolicy, PolicyReason, PolicyResolver, ProfileSettings},
    secret::SecretBuffer,
    store::{CredentialStore, LoadState},
};

#[cfg(feature = "pkcs12")]
pub use crate::archive::Pkcs12Parser;
