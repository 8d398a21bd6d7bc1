use super::AssetSource;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Resolves resource names against a directory, the way an application's
/// bundled assets are addressed.
///
/// Names are relative paths. Absolute paths and `..` components are rejected so
/// a resource name cannot escape the asset root.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    /// Creates an asset source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The asset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("asset name '{name}' must be a relative path inside the asset root"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetSource for DirAssets {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = self.resolve(name)?;
        Ok(Box::new(File::open(path)?))
    }
}

/// Named in-memory blobs, for archives embedded in the binary (`include_bytes!`)
/// or fetched by the host before handshakes begin.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    blobs: HashMap<String, Arc<[u8]>>,
}

impl MemoryAssets {
    /// Creates an empty asset set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the blob served under `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.blobs.insert(name.into(), bytes.into());
        self
    }
}

impl AssetSource for MemoryAssets {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let blob = self.blobs.get(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset named '{name}'"))
        })?;
        Ok(Box::new(Cursor::new(Arc::clone(blob))))
    }
}
