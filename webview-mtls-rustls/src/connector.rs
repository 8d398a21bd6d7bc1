use crate::crypto::default_provider;
use crate::error::{Error, Result};
use crate::material::certified_key_from_credential;
use crate::observability::{debug, warn};
use crate::resolve::CredentialResolver;
use rustls::client::WantsClientCert;
use rustls::{ClientConfig, ConfigBuilder, RootCertStore};
use std::sync::{Arc, OnceLock};
use webview_mtls::{CertificateRequest, Credential, Decision, DecisionEngine};

/// The client configuration a handshake should use.
#[derive(Debug, Clone)]
pub enum HandshakeConfig {
    /// No client certificate: the engine abstained for this host.
    Anonymous(Arc<ClientConfig>),
    /// Presents the loaded client credential.
    Authenticated(Arc<ClientConfig>),
}

impl HandshakeConfig {
    /// The rustls configuration to connect with.
    pub fn client_config(&self) -> &Arc<ClientConfig> {
        match self {
            Self::Anonymous(cfg) | Self::Authenticated(cfg) => cfg,
        }
    }

    /// Whether the configuration presents a client certificate.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Applies [`DecisionEngine`] outcomes to rustls client handshakes.
///
/// # Examples
///
/// ```no_run
/// use rustls::RootCertStore;
/// use std::sync::Arc;
/// use webview_mtls::{CertificateRequest, CredentialStore, DecisionEngine, DirAssets, MtlsConfig, Pkcs12Parser};
/// use webview_mtls_rustls::HandshakeConnector;
///
/// # fn example(roots: RootCertStore) -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(MtlsConfig::from_env()?);
/// let store = Arc::new(CredentialStore::new(Arc::clone(&config), DirAssets::new("assets"), Pkcs12Parser));
/// let engine = Arc::new(DecisionEngine::builder(config, store).build());
///
/// let connector = HandshakeConnector::new(engine, roots).with_alpn_protocols(["h2", "http/1.1"]);
/// let handshake = connector.config_for(&CertificateRequest::new("term.example", 443))?;
/// let _client_config = handshake.client_config();
/// # Ok(())
/// # }
/// ```
pub struct HandshakeConnector {
    engine: Arc<DecisionEngine>,
    roots: Arc<RootCertStore>,
    alpn_protocols: Vec<Vec<u8>>,
    anonymous: OnceLock<Arc<ClientConfig>>,
    authenticated: OnceLock<Arc<ClientConfig>>,
}

impl std::fmt::Debug for HandshakeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeConnector")
            .field("engine", &self.engine)
            .field("roots", &self.roots.len())
            .field("alpn_protocols", &self.alpn_protocols)
            .field("anonymous", &self.anonymous.get().is_some())
            .field("authenticated", &self.authenticated.get().is_some())
            .finish()
    }
}

impl HandshakeConnector {
    /// Creates a connector that verifies servers against `roots`.
    pub fn new(engine: Arc<DecisionEngine>, roots: impl Into<Arc<RootCertStore>>) -> Self {
        Self {
            engine,
            roots: roots.into(),
            alpn_protocols: Vec::new(),
            anonymous: OnceLock::new(),
            authenticated: OnceLock::new(),
        }
    }

    /// Sets the ALPN protocols advertised by every configuration, most
    /// preferred first.
    #[must_use]
    pub fn with_alpn_protocols<I, P>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        self.alpn_protocols = protocols.into_iter().map(|p| p.as_ref().to_vec()).collect();
        self
    }

    /// Returns the configuration for a handshake answering `request`.
    ///
    /// # Errors
    ///
    /// - [`Error::HandshakeCancelled`] if the engine cancels: do not connect.
    /// - [`Error::CertifiedKey`] / [`Error::Rustls`] if the configuration
    ///   cannot be built.
    pub fn config_for(&self, request: &CertificateRequest) -> Result<HandshakeConfig> {
        match self.engine.decide(request) {
            Decision::Ignore(reason) => {
                debug!("anonymous handshake for {:?}: {reason:?}", request.host());
                self.anonymous().map(HandshakeConfig::Anonymous)
            }
            Decision::Proceed(credential) => self
                .authenticated(&credential)
                .map(HandshakeConfig::Authenticated),
            Decision::Cancel(e) => {
                warn!("refusing handshake with {:?}: {e}", request.host());
                Err(Error::HandshakeCancelled(e))
            }
        }
    }

    fn anonymous(&self) -> Result<Arc<ClientConfig>> {
        if let Some(cfg) = self.anonymous.get() {
            return Ok(Arc::clone(cfg));
        }
        let cfg = self.finish(self.builder()?.with_no_client_auth());
        Ok(Arc::clone(self.anonymous.get_or_init(|| cfg)))
    }

    // The store hands out one credential for its whole lifetime, so the
    // authenticated configuration only has to be built once.
    fn authenticated(&self, credential: &Credential) -> Result<Arc<ClientConfig>> {
        if let Some(cfg) = self.authenticated.get() {
            return Ok(Arc::clone(cfg));
        }
        let resolver = CredentialResolver::new(certified_key_from_credential(credential)?);
        let cfg = self.finish(self.builder()?.with_client_cert_resolver(Arc::new(resolver)));
        Ok(Arc::clone(self.authenticated.get_or_init(|| cfg)))
    }

    fn builder(&self) -> Result<ConfigBuilder<ClientConfig, WantsClientCert>> {
        Ok(ClientConfig::builder_with_provider(default_provider()?)
            .with_safe_default_protocol_versions()?
            .with_root_certificates(Arc::clone(&self.roots)))
    }

    fn finish(&self, mut cfg: ClientConfig) -> Arc<ClientConfig> {
        cfg.alpn_protocols.clone_from(&self.alpn_protocols);
        Arc::new(cfg)
    }
}
