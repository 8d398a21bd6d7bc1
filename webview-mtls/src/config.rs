//! Configuration surface.
//!
//! All options are resolved once, when the host shell starts, into an
//! immutable [`MtlsConfig`] that is shared by the
//! [`CredentialStore`](crate::CredentialStore) and the
//! [`DecisionEngine`](crate::DecisionEngine).

use crate::error::ConfigError;
use std::env::{self, VarError};
use zeroize::Zeroizing;

/// Environment variable enabling client certificate participation.
pub const ENV_ENABLED: &str = "MTLS_ENABLED";
/// Environment variable holding the comma-separated host allow-list.
pub const ENV_ALLOWED_HOSTS: &str = "MTLS_ALLOWED_HOSTS";
/// Environment variable naming the PKCS#12 archive resource.
pub const ENV_ARCHIVE: &str = "MTLS_P12_ASSET";
/// Environment variable holding the archive password.
pub const ENV_PASSWORD: &str = "MTLS_P12_PASSWORD";

/// A password held in memory that is zeroized on drop and never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    /// Returns the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(Zeroizing::new(value))
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

/// Client certificate configuration.
#[derive(Debug, Clone, Default)]
pub struct MtlsConfig {
    enabled: bool,
    allowed_hosts: String,
    archive_resource: String,
    archive_password: Option<SecretString>,
}

impl MtlsConfig {
    /// Returns a builder with everything disabled and empty.
    pub fn builder() -> MtlsConfigBuilder {
        MtlsConfigBuilder::default()
    }

    /// Reads the configuration from `MTLS_ENABLED`, `MTLS_ALLOWED_HOSTS`,
    /// `MTLS_P12_ASSET` and `MTLS_P12_PASSWORD`.
    ///
    /// Unset variables take their defaults. `MTLS_ENABLED` is true for
    /// `true`, `1`, `yes` or `on` (any case).
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotUnicode`] if a variable is set to a non-unicode value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name)),
        })
    }

    pub(crate) fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&'static str) -> Result<Option<String>, ConfigError>,
    {
        let mut builder = Self::builder();
        if let Some(enabled) = lookup(ENV_ENABLED)? {
            builder = builder.enabled(parse_flag(&enabled));
        }
        if let Some(hosts) = lookup(ENV_ALLOWED_HOSTS)? {
            builder = builder.allowed_hosts(hosts);
        }
        if let Some(archive) = lookup(ENV_ARCHIVE)? {
            builder = builder.archive_resource(archive);
        }
        if let Some(password) = lookup(ENV_PASSWORD)? {
            builder = builder.archive_password(password);
        }
        Ok(builder.build())
    }

    /// Whether client certificate participation is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The raw, comma-separated host allow-list.
    pub fn allowed_hosts(&self) -> &str {
        &self.allowed_hosts
    }

    /// The archive resource name, as configured.
    pub fn archive_resource(&self) -> &str {
        &self.archive_resource
    }

    /// The archive password, if one is configured.
    pub fn archive_password(&self) -> Option<&SecretString> {
        self.archive_password.as_ref()
    }
}

/// Builder for [`MtlsConfig`].
#[derive(Debug, Default)]
pub struct MtlsConfigBuilder {
    config: MtlsConfig,
}

impl MtlsConfigBuilder {
    /// Enables or disables client certificate participation.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Sets the comma-separated host allow-list. Empty allows every host.
    #[must_use]
    pub fn allowed_hosts(mut self, hosts: impl Into<String>) -> Self {
        self.config.allowed_hosts = hosts.into();
        self
    }

    /// Sets the name of the archive resource to load.
    #[must_use]
    pub fn archive_resource(mut self, name: impl Into<String>) -> Self {
        self.config.archive_resource = name.into();
        self
    }

    /// Sets the archive password.
    #[must_use]
    pub fn archive_password(mut self, password: impl Into<SecretString>) -> Self {
        self.config.archive_password = Some(password.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> MtlsConfig {
        self.config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&'static str, &str)]) -> Result<MtlsConfig, ConfigError> {
        let vars: HashMap<_, _> = vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        MtlsConfig::from_lookup(|name| Ok(vars.get(name).cloned()))
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = from_map(&[]).unwrap();
        assert!(!config.enabled());
        assert_eq!(config.allowed_hosts(), "");
        assert_eq!(config.archive_resource(), "");
        assert!(config.archive_password().is_none());
    }

    #[test]
    fn reads_all_options() {
        let config = from_map(&[
            (ENV_ENABLED, "TRUE"),
            (ENV_ALLOWED_HOSTS, "a.example, b.example"),
            (ENV_ARCHIVE, "mtls/client.p12"),
            (ENV_PASSWORD, "changeit"),
        ])
        .unwrap();

        assert!(config.enabled());
        assert_eq!(config.allowed_hosts(), "a.example, b.example");
        assert_eq!(config.archive_resource(), "mtls/client.p12");
        assert_eq!(config.archive_password().unwrap().expose(), "changeit");
    }

    #[test]
    fn flag_parsing() {
        for on in ["true", "1", "yes", "ON", " True "] {
            assert!(parse_flag(on), "{on}");
        }
        for off in ["false", "0", "", "enabled", "nope"] {
            assert!(!parse_flag(off), "{off}");
        }
    }

    #[test]
    fn lookup_errors_propagate() {
        let err = MtlsConfig::from_lookup(|name| Err(ConfigError::NotUnicode(name))).unwrap_err();
        assert_eq!(err, ConfigError::NotUnicode(ENV_ENABLED));
    }

    #[test]
    fn debug_redacts_password() {
        let config = MtlsConfig::builder().archive_password("hunter2").build();
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("redacted"));
    }
}
