//! The certificate decision engine.
//!
//! For every client certificate request the engine returns one of three
//! outcomes, evaluated in order (first match wins):
//!
//! 1. feature toggle off: [`Decision::Ignore`];
//! 2. host not in the allow-list: [`Decision::Ignore`];
//! 3. the credential cannot be loaded: [`Decision::Cancel`];
//! 4. otherwise: [`Decision::Proceed`] with the credential.
//!
//! `Ignore` means the engine does not participate and the handshake continues
//! without a client certificate. `Cancel` means it should have participated
//! but cannot, so the handshake must be aborted rather than silently
//! downgraded.

use crate::config::MtlsConfig;
use crate::credential::Credential;
use crate::error::LoadError;
use crate::policy::{EffectivePolicy, PolicyResolver, ProfileSettings};
use crate::prelude::{debug, info, warn};
use crate::store::CredentialStore;
use std::fmt;
use std::sync::Arc;

/// A client certificate request, as delivered by the TLS layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateRequest {
    host: Option<String>,
    port: Option<u16>,
}

impl CertificateRequest {
    /// A request from `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
        }
    }

    /// A request whose target host is unknown.
    pub fn without_host() -> Self {
        Self::default()
    }

    /// A request for an optional host and port.
    pub fn from_parts(host: Option<String>, port: Option<u16>) -> Self {
        Self { host, port }
    }

    /// The target host, if known.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The target port, if known.
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Why the engine abstained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abstain {
    /// Client certificates are switched off (globally or for the active profile).
    FeatureDisabled,
    /// The request host is not in the allow-list.
    HostNotAllowed,
}

/// The outcome for one client certificate request.
#[derive(Debug)]
pub enum Decision {
    /// Do not participate; continue the handshake without a client certificate.
    Ignore(Abstain),
    /// Abort the handshake: the credential was required but is unavailable.
    Cancel(LoadError),
    /// Present this credential.
    Proceed(Arc<Credential>),
}

/// Field-less mirror of [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    /// See [`Decision::Ignore`].
    Ignore,
    /// See [`Decision::Cancel`].
    Cancel,
    /// See [`Decision::Proceed`].
    Proceed,
}

impl Decision {
    /// The kind of this decision.
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Ignore(_) => DecisionKind::Ignore,
            Self::Cancel(_) => DecisionKind::Cancel,
            Self::Proceed(_) => DecisionKind::Proceed,
        }
    }

    /// A stable event code for host-side reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ignore(Abstain::FeatureDisabled) => "MTLS_IGNORED_DISABLED",
            Self::Ignore(Abstain::HostNotAllowed) => "MTLS_HOST_NOT_ALLOWED",
            Self::Cancel(_) => "MTLS_CREDENTIAL_LOAD_FAILED",
            Self::Proceed(_) => "MTLS_PROCEED",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore(Abstain::FeatureDisabled) => f.write_str("ignore: client certificates disabled"),
            Self::Ignore(Abstain::HostNotAllowed) => f.write_str("ignore: host not allowed"),
            Self::Cancel(e) => write!(f, "cancel: {e}"),
            Self::Proceed(c) => write!(f, "proceed with '{}'", c.alias()),
        }
    }
}

/// Receives every decision the engine makes.
///
/// Use it to surface errors to the user or to record metrics. Implementations
/// are called synchronously on the handshake thread and must be cheap.
pub trait DecisionObserver: Send + Sync {
    /// Called once per request, after the decision is made.
    fn on_decision(&self, request: &CertificateRequest, decision: &Decision);
}

impl<F> DecisionObserver for F
where
    F: Fn(&CertificateRequest, &Decision) + Send + Sync,
{
    fn on_decision(&self, request: &CertificateRequest, decision: &Decision) {
        self(request, decision);
    }
}

type ProfileProvider = Arc<dyn Fn() -> Option<ProfileSettings> + Send + Sync>;

/// Classifies client certificate requests.
///
/// Stateless per call: the outcome depends only on the policy, the request
/// and the store's load state.
pub struct DecisionEngine {
    resolver: PolicyResolver,
    global: Arc<EffectivePolicy>,
    store: Arc<CredentialStore>,
    profile_provider: Option<ProfileProvider>,
    observer: Option<Arc<dyn DecisionObserver>>,
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("global", &self.global)
            .field("store", &self.store)
            .field("profile_provider", &self.profile_provider.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl DecisionEngine {
    /// Returns a builder for an engine over `config` and `store`.
    pub fn builder(config: Arc<MtlsConfig>, store: Arc<CredentialStore>) -> DecisionEngineBuilder {
        DecisionEngineBuilder {
            config,
            store,
            profile_provider: None,
            observer: None,
        }
    }

    /// Decides how to answer `request`.
    ///
    /// Policy checks run first and never touch the store; the store is only
    /// consulted for enabled, allowed requests.
    pub fn decide(&self, request: &CertificateRequest) -> Decision {
        let decision = self.evaluate(request);
        self.report(request, &decision);
        decision
    }

    /// The policy that applies right now (resolved from the active profile
    /// when a profile provider is installed).
    pub fn effective_policy(&self) -> Arc<EffectivePolicy> {
        match &self.profile_provider {
            Some(provider) => Arc::new(self.resolver.resolve(provider().as_ref())),
            None => Arc::clone(&self.global),
        }
    }

    /// The underlying credential store.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    fn evaluate(&self, request: &CertificateRequest) -> Decision {
        let policy = self.effective_policy();

        if !policy.enabled() {
            debug!("client certificate request ignored ({})", policy.reason());
            return Decision::Ignore(Abstain::FeatureDisabled);
        }

        if !policy.allows(request.host()) {
            debug!(
                "client certificate request ignored: host {:?} not allowed",
                request.host()
            );
            return Decision::Ignore(Abstain::HostNotAllowed);
        }

        match self.store.get_or_load() {
            Ok(credential) => Decision::Proceed(credential),
            Err(e) => {
                warn!(
                    "cancelling client certificate request for {:?}: {} ({})",
                    request.host(),
                    e,
                    e.kind()
                );
                Decision::Cancel(e)
            }
        }
    }

    fn report(&self, request: &CertificateRequest, decision: &Decision) {
        if let Decision::Proceed(credential) = decision {
            info!(
                "presenting client certificate '{}' to {:?}:{:?}",
                credential.alias(),
                request.host(),
                request.port()
            );
        }
        if let Some(observer) = &self.observer {
            observer.on_decision(request, decision);
        }
    }
}

/// Builder for [`DecisionEngine`].
pub struct DecisionEngineBuilder {
    config: Arc<MtlsConfig>,
    store: Arc<CredentialStore>,
    profile_provider: Option<ProfileProvider>,
    observer: Option<Arc<dyn DecisionObserver>>,
}

impl fmt::Debug for DecisionEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngineBuilder")
            .field("config", &self.config)
            .field("profile_provider", &self.profile_provider.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl DecisionEngineBuilder {
    /// Resolves the policy per request from the active server profile.
    ///
    /// Once installed, a provider returning `None` disables client
    /// certificates (no active profile).
    #[must_use]
    pub fn profile_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<ProfileSettings> + Send + Sync + 'static,
    {
        self.profile_provider = Some(Arc::new(provider));
        self
    }

    /// Installs an observer notified of every decision.
    #[must_use]
    pub fn observer<O: DecisionObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Builds the engine.
    pub fn build(self) -> DecisionEngine {
        let resolver = PolicyResolver::new(&self.config);
        DecisionEngine {
            global: Arc::new(resolver.global()),
            resolver,
            store: self.store,
            profile_provider: self.profile_provider,
            observer: self.observer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveParser, MemoryAssets, ParsedArchive};
    use crate::error::{ArchiveError, LoadErrorKind};
    use crate::policy::PolicyReason;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always fails; counts how often the store reached it.
    struct CountingParser(Arc<AtomicUsize>);

    impl ArchiveParser for CountingParser {
        fn parse(&self, _: &[u8], _: &[u8]) -> Result<ParsedArchive, ArchiveError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(ArchiveError::Decrypt("bad password".into()))
        }
    }

    fn engine(enabled: bool, hosts: &str) -> (DecisionEngineBuilder, Arc<AtomicUsize>) {
        let config = Arc::new(
            MtlsConfig::builder()
                .enabled(enabled)
                .allowed_hosts(hosts)
                .archive_resource("client.p12")
                .build(),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(CredentialStore::new(
            Arc::clone(&config),
            MemoryAssets::new().with("client.p12", vec![1u8]),
            CountingParser(Arc::clone(&calls)),
        ));
        (DecisionEngine::builder(config, store), calls)
    }

    #[test]
    fn disabled_feature_ignores_every_host() {
        let (builder, calls) = engine(false, "");
        let engine = builder.build();
        for request in [
            CertificateRequest::new("example.com", 443),
            CertificateRequest::without_host(),
        ] {
            assert!(matches!(
                engine.decide(&request),
                Decision::Ignore(Abstain::FeatureDisabled)
            ));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.store().load_attempts(), 0);
    }

    #[test]
    fn disallowed_host_is_ignored_without_touching_the_store() {
        let (builder, calls) = engine(true, "example.com");
        let engine = builder.build();

        let decision = engine.decide(&CertificateRequest::new("evil.example", 443));
        assert!(matches!(decision, Decision::Ignore(Abstain::HostNotAllowed)));
        assert_eq!(decision.code(), "MTLS_HOST_NOT_ALLOWED");

        let decision = engine.decide(&CertificateRequest::without_host());
        assert!(matches!(decision, Decision::Ignore(Abstain::HostNotAllowed)));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn load_failure_cancels_and_retries() {
        let (builder, calls) = engine(true, "example.com");
        let engine = builder.build();
        let request = CertificateRequest::new("EXAMPLE.COM", 443);

        for expected in 1..=2 {
            let decision = engine.decide(&request);
            assert!(matches!(
                &decision,
                Decision::Cancel(e) if e.kind() == LoadErrorKind::ArchiveDecryptionFailure
            ));
            assert_eq!(decision.kind(), DecisionKind::Cancel);
            assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }

    #[test]
    fn observer_sees_every_decision() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (builder, _) = engine(true, "example.com");
        let engine = builder
            .observer(move |req: &CertificateRequest, d: &Decision| {
                sink.lock().push((req.host().map(str::to_owned), d.code()));
            })
            .build();

        engine.decide(&CertificateRequest::new("other.example", 443));
        engine.decide(&CertificateRequest::new("example.com", 443));

        assert_eq!(
            *seen.lock(),
            [
                (Some("other.example".to_owned()), "MTLS_HOST_NOT_ALLOWED"),
                (Some("example.com".to_owned()), "MTLS_CREDENTIAL_LOAD_FAILED"),
            ]
        );
    }

    #[test]
    fn effective_policy_follows_the_active_profile() {
        let active = Arc::new(Mutex::new(None::<ProfileSettings>));
        let provider = Arc::clone(&active);
        let (builder, _) = engine(true, "global.example");
        let engine = builder
            .profile_provider(move || provider.lock().clone())
            .build();

        assert_eq!(engine.effective_policy().reason(), PolicyReason::ProfileMissing);

        *active.lock() = Some(ProfileSettings::new(true));
        let policy = engine.effective_policy();
        assert!(policy.enabled());
        assert_eq!(policy.reason(), PolicyReason::Enabled);
    }

    #[test]
    fn effective_policy_without_provider_is_the_global_one() {
        let (builder, _) = engine(true, "global.example");
        let engine = builder.build();

        let policy = engine.effective_policy();
        assert!(policy.allows(Some("global.example")));
        assert!(!policy.allows(Some("other.example")));
        assert!(Arc::ptr_eq(&policy, &engine.effective_policy()));
    }

    #[test]
    fn profile_provider_overrides_global_policy() {
        let active = Arc::new(Mutex::new(None::<ProfileSettings>));
        let provider = Arc::clone(&active);
        let (builder, calls) = engine(true, "global.example");
        let engine = builder
            .profile_provider(move || provider.lock().clone())
            .build();
        let request = CertificateRequest::new("term.example", 443);

        assert!(matches!(
            engine.decide(&request),
            Decision::Ignore(Abstain::FeatureDisabled)
        ));

        *active.lock() = Some(ProfileSettings::new(false).with_allowed_hosts("term.example"));
        assert!(matches!(
            engine.decide(&request),
            Decision::Ignore(Abstain::FeatureDisabled)
        ));

        *active.lock() = Some(ProfileSettings::new(true));
        assert!(matches!(
            engine.decide(&request),
            Decision::Ignore(Abstain::HostNotAllowed)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        *active.lock() = Some(ProfileSettings::new(true).with_allowed_hosts("term.example"));
        assert!(matches!(engine.decide(&request), Decision::Cancel(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
