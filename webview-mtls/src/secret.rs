//! Transient secret buffers.

use crate::config::SecretString;
use std::ops::Deref;
use zeroize::Zeroize;

/// A private, per-attempt copy of a secret (the archive password).
///
/// [`wipe`](Self::wipe) overwrites the content with zeros in place, keeping
/// its length, so callers can observe that it was cleared. Dropping the buffer
/// zeroizes it as well.
#[derive(Default)]
pub struct SecretBuffer {
    bytes: Vec<u8>,
}

impl SecretBuffer {
    /// Copies `secret` into a new buffer; `None` yields an empty buffer.
    pub fn from_secret(secret: Option<&SecretString>) -> Self {
        Self {
            bytes: secret
                .map(|s| s.expose().as_bytes().to_vec())
                .unwrap_or_default(),
        }
    }

    /// Returns the secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether every byte is zero.
    pub fn is_wiped(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    /// Overwrites the content with zeros.
    pub fn wipe(&mut self) {
        self.bytes.as_mut_slice().zeroize();
    }

    /// Returns a guard that wipes this buffer when it goes out of scope,
    /// including while unwinding.
    pub(crate) fn wipe_on_exit(&mut self) -> WipeOnExit<'_> {
        WipeOnExit(self)
    }
}

impl From<&[u8]> for SecretBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub(crate) struct WipeOnExit<'a>(&'a mut SecretBuffer);

impl Deref for WipeOnExit<'_> {
    type Target = SecretBuffer;

    fn deref(&self) -> &SecretBuffer {
        self.0
    }
}

impl Drop for WipeOnExit<'_> {
    fn drop(&mut self) {
        self.0.wipe();
    }
}
