//! Effective policy resolution.
//!
//! The global configuration can be narrowed per server profile: a profile may
//! switch client certificates off for itself, or carry its own host list.
//!
//! # Examples
//!
//! ```rust
//! use webview_mtls::{MtlsConfig, PolicyReason, PolicyResolver, ProfileSettings};
//!
//! let config = MtlsConfig::builder()
//!     .enabled(true)
//!     .allowed_hosts("default.example")
//!     .build();
//! let resolver = PolicyResolver::new(&config);
//!
//! let profile = ProfileSettings::new(true).with_allowed_hosts("term.example");
//! let policy = resolver.resolve(Some(&profile));
//! assert_eq!(policy.reason(), PolicyReason::Enabled);
//! assert!(policy.allows(Some("term.example")));
//! assert!(!policy.allows(Some("default.example")));
//!
//! assert_eq!(resolver.resolve(None).reason(), PolicyReason::ProfileMissing);
//! ```

use crate::allow_list::HostAllowList;
use crate::config::MtlsConfig;
use std::fmt;

/// Client certificate settings carried by a server profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSettings {
    mtls_enabled: bool,
    allowed_hosts: Option<String>,
}

impl ProfileSettings {
    /// Creates profile settings with the given toggle and no host override.
    pub fn new(mtls_enabled: bool) -> Self {
        Self {
            mtls_enabled,
            allowed_hosts: None,
        }
    }

    /// Overrides the global host allow-list for this profile.
    ///
    /// A blank value means "no override".
    #[must_use]
    pub fn with_allowed_hosts(mut self, hosts: impl Into<String>) -> Self {
        self.allowed_hosts = Some(hosts.into());
        self
    }

    /// Whether the profile enables client certificates.
    pub fn mtls_enabled(&self) -> bool {
        self.mtls_enabled
    }

    /// The profile's own host list, if any.
    pub fn allowed_hosts(&self) -> Option<&str> {
        self.allowed_hosts.as_deref()
    }
}

/// Why a policy is enabled or disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyReason {
    /// Client certificates are enabled.
    Enabled,
    /// The global feature toggle is off.
    DisabledByConfig,
    /// The active profile switched client certificates off.
    DisabledByProfile,
    /// Profiles are in use but none is active.
    ProfileMissing,
}

impl PolicyReason {
    /// Returns a string representation of the reason.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::DisabledByConfig => "disabled_by_config",
            Self::DisabledByProfile => "disabled_by_profile",
            Self::ProfileMissing => "profile_missing",
        }
    }
}

impl fmt::Display for PolicyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The toggle and allow-list that apply to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePolicy {
    enabled: bool,
    allowed_hosts: HostAllowList,
    reason: PolicyReason,
}

impl EffectivePolicy {
    /// Whether client certificates are enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The host allow-list in effect.
    pub fn allowed_hosts(&self) -> &HostAllowList {
        &self.allowed_hosts
    }

    /// Why the policy is enabled or disabled.
    pub fn reason(&self) -> PolicyReason {
        self.reason
    }

    /// Whether `host` passes the allow-list. Does not consider the toggle.
    pub fn allows(&self, host: Option<&str>) -> bool {
        self.allowed_hosts.contains(host)
    }
}

/// Resolves the [`EffectivePolicy`] from the global configuration and an
/// optional server profile.
#[derive(Debug, Clone)]
pub struct PolicyResolver {
    enabled: bool,
    allowed_hosts: HostAllowList,
}

impl PolicyResolver {
    /// Captures the global toggle and parses the global allow-list once.
    pub fn new(config: &MtlsConfig) -> Self {
        Self {
            enabled: config.enabled(),
            allowed_hosts: HostAllowList::parse(config.allowed_hosts()),
        }
    }

    /// The policy when no profiles are in use: the global configuration.
    pub fn global(&self) -> EffectivePolicy {
        EffectivePolicy {
            enabled: self.enabled,
            allowed_hosts: self.allowed_hosts.clone(),
            reason: if self.enabled {
                PolicyReason::Enabled
            } else {
                PolicyReason::DisabledByConfig
            },
        }
    }

    /// The policy for the active `profile`.
    ///
    /// Rules, first match wins: global toggle off, no active profile, profile
    /// toggle off, enabled. The host list comes from the profile when it
    /// carries a non-blank one, otherwise from the global configuration.
    pub fn resolve(&self, profile: Option<&ProfileSettings>) -> EffectivePolicy {
        let allowed_hosts = match profile.and_then(ProfileSettings::allowed_hosts) {
            Some(hosts) if !hosts.trim().is_empty() => HostAllowList::parse(hosts),
            _ => self.allowed_hosts.clone(),
        };

        let (enabled, reason) = match profile {
            _ if !self.enabled => (false, PolicyReason::DisabledByConfig),
            None => (false, PolicyReason::ProfileMissing),
            Some(p) if !p.mtls_enabled => (false, PolicyReason::DisabledByProfile),
            Some(_) => (true, PolicyReason::Enabled),
        };

        EffectivePolicy {
            enabled,
            allowed_hosts,
            reason,
        }
    }
}
