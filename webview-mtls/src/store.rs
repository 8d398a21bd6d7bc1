//! Lazy, load-once credential store.

use crate::archive::{ArchiveParser, AssetSource};
use crate::config::MtlsConfig;
use crate::credential::Credential;
use crate::error::LoadError;
use crate::prelude::{debug, error, info};
use crate::secret::SecretBuffer;
use parking_lot::Mutex;
use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Upper bound on the size of an archive resource.
///
/// Client certificate archives are a few KiB; larger resources are rejected
/// before parsing.
pub const MAX_ARCHIVE_BYTES: u64 = 1024 * 1024;

/// Load state of a [`CredentialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing has been loaded yet.
    Unloaded,
    /// The credential is cached for the lifetime of the store.
    Loaded,
    /// The most recent attempt failed. The next call retries.
    Failed,
}

/// Loads the client credential from the configured archive on first use and
/// caches it.
///
/// [`get_or_load`](Self::get_or_load) is safe to call from many threads:
///
/// - once loaded, calls are lock-free reads of the cached `Arc<Credential>`;
/// - before that, at most one thread performs archive I/O and parsing at a
///   time; threads that waited re-check the cache before trying themselves;
/// - failures are not cached, the next call retries from scratch.
pub struct CredentialStore {
    config: Arc<MtlsConfig>,
    assets: Box<dyn AssetSource>,
    parser: Box<dyn ArchiveParser>,
    slot: OnceLock<Arc<Credential>>,
    load_lock: Mutex<()>,
    last_failed: AtomicBool,
    attempts: AtomicU64,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("archive_resource", &self.config.archive_resource())
            .field("assets", &"<dyn AssetSource>")
            .field("parser", &"<dyn ArchiveParser>")
            .field("state", &self.state())
            .field("attempts", &self.load_attempts())
            .finish()
    }
}

impl CredentialStore {
    /// Creates a store reading `config.archive_resource()` from `assets` and
    /// decoding it with `parser`. Nothing is read until the first call to
    /// [`get_or_load`](Self::get_or_load).
    pub fn new<A, P>(config: Arc<MtlsConfig>, assets: A, parser: P) -> Self
    where
        A: AssetSource,
        P: ArchiveParser,
    {
        Self {
            config,
            assets: Box::new(assets),
            parser: Box::new(parser),
            slot: OnceLock::new(),
            load_lock: Mutex::new(()),
            last_failed: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
        }
    }

    /// Returns the cached credential, loading it first if needed.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`]; the store stays unloaded and the next call retries.
    pub fn get_or_load(&self) -> Result<Arc<Credential>, LoadError> {
        if let Some(credential) = self.slot.get() {
            return Ok(Arc::clone(credential));
        }

        let _guard = self.load_lock.lock();
        if let Some(credential) = self.slot.get() {
            return Ok(Arc::clone(credential));
        }

        let mut secret = SecretBuffer::from_secret(self.config.archive_password());
        match self.load_with(&mut secret) {
            Ok(credential) => {
                let credential = Arc::new(credential);
                // Only this thread can fill the slot while holding the lock.
                let _ = self.slot.set(Arc::clone(&credential));
                self.last_failed.store(false, Ordering::Release);
                Ok(credential)
            }
            Err(e) => {
                self.last_failed.store(true, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        if self.slot.get().is_some() {
            LoadState::Loaded
        } else if self.last_failed.load(Ordering::Acquire) {
            LoadState::Failed
        } else {
            LoadState::Unloaded
        }
    }

    /// Number of load attempts that got as far as opening the archive.
    pub fn load_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// One load attempt. `secret` is wiped on every exit path.
    pub(crate) fn load_with(&self, secret: &mut SecretBuffer) -> Result<Credential, LoadError> {
        let secret = secret.wipe_on_exit();

        let resource = self.config.archive_resource().trim();
        if resource.is_empty() {
            error!("client certificate archive resource is not configured");
            return Err(LoadError::MissingArchiveConfig);
        }

        self.attempts.fetch_add(1, Ordering::Relaxed);
        let bytes = self.read_resource(resource).map_err(|source| {
            error!("failed reading client certificate archive '{resource}': {source}");
            LoadError::ArchiveUnreadable {
                resource: resource.to_owned(),
                source,
            }
        })?;
        debug!("read {} byte(s) from archive '{resource}'", bytes.len());

        let archive = self.parser.parse(&bytes, secret.expose()).map_err(|e| {
            error!("failed decoding client certificate archive '{resource}': {e}");
            LoadError::from(e)
        })?;

        let credential = Credential::from_archive(&archive).inspect_err(|e| {
            error!("unusable client certificate archive '{resource}': {e}");
        })?;

        info!(
            "client certificate '{}' loaded from '{resource}' ({} certificate(s) in chain)",
            credential.alias(),
            credential.cert_chain().len()
        );
        Ok(credential)
    }

    fn read_resource(&self, resource: &str) -> std::io::Result<Vec<u8>> {
        let reader = self.assets.open(resource)?;
        let mut bytes = Vec::new();
        reader.take(MAX_ARCHIVE_BYTES + 1).read_to_end(&mut bytes)?;
        if bytes.len() as u64 > MAX_ARCHIVE_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("archive exceeds {MAX_ARCHIVE_BYTES} bytes"),
            ));
        }
        Ok(bytes)
    }
}
