#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # webview-mtls-rustls
//!
//! Applies [`webview_mtls`] decisions to [`rustls`] client handshakes.
//!
//! [`HandshakeConnector`] turns the [`Decision`](webview_mtls::Decision) for a
//! host into the configuration the handshake should use:
//!
//! * `Ignore` => a [`rustls::ClientConfig`] without client authentication;
//! * `Proceed` => a `ClientConfig` presenting the loaded credential;
//! * `Cancel` => [`Error::HandshakeCancelled`]; the caller must not connect.
//!
//! Both configurations are built once and shared by later handshakes.
//!
//! ## Feature flags
//!
//! Exactly **one** `rustls` crypto provider must be enabled:
//!
//! * `ring` (default)
//! * `aws-lc-rs`
//!
//! Enabling more than one provider results in a compile-time error.

#[cfg(all(feature = "ring", feature = "aws-lc-rs"))]
compile_error!("Enable only one crypto provider feature: `ring` or `aws-lc-rs`.");

#[cfg(not(any(feature = "ring", feature = "aws-lc-rs")))]
compile_error!("Enable one crypto provider feature: `ring` (default) or `aws-lc-rs`.");

mod connector;
mod crypto;
mod error;
mod material;
mod observability;
mod resolve;

#[cfg(test)]
mod test_support;

pub use connector::{HandshakeConfig, HandshakeConnector};
pub use error::{Error, Result};
pub use material::certified_key_from_credential;
pub use resolve::CredentialResolver;
