//! Implementation of key-value storage using files on disk.
//!
//! Each key maps to one file inside the store directory. Writes go to a
//! temporary sibling file which is flushed and then renamed over the target,
//! so a reader (or a restarted process) sees either the previous contents or
//! the new contents in full.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use gatekeeper_store::Store;
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory used when the host does not configure one.
pub const DEFAULT_DIR: &str = "data";

/// KV store using files on disk.
#[derive(Clone, Debug)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Creates a new `FsStore` with the specified directory.
    ///
    /// The directory is created on first write if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The default data directory, relative to the working directory.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        PathBuf::from(DEFAULT_DIR)
    }

    /// The directory this store keeps its files in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn get_file_path(&self, key: &str) -> Result<PathBuf, Error> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(Error::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(key))
    }

    fn get_temp_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()))
    }

    async fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> Result<(), Error> {
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| Error::Io("error creating temporary file", e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| Error::Io("error writing temporary file", e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Io("error syncing temporary file", e))?;
        drop(file);

        fs::rename(temp_path, path)
            .await
            .map_err(|e| Error::Io("error renaming temporary file", e))
    }

    #[cfg(unix)]
    async fn sync_dir(&self) -> Result<(), Error> {
        fs::File::open(&self.dir)
            .await
            .map_err(|e| Error::Io("error opening directory", e))?
            .sync_all()
            .await
            .map_err(|e| Error::Io("error syncing directory", e))
    }

    #[cfg(not(unix))]
    #[allow(clippy::unused_async)]
    async fn sync_dir(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl Default for FsStore {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

#[async_trait]
impl Store for FsStore {
    type Error = Error;

    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error> {
        let key: String = key.into();
        let path = self.get_file_path(&key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io("error reading file", e)),
        }
    }

    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error> {
        let key: String = key.into();
        let path = self.get_file_path(&key)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Io("error creating directory", e))?;

        let temp_path = self.get_temp_path(&key);
        if let Err(e) = Self::write_and_rename(&temp_path, &path, &bytes).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup, "failed to remove temporary file");
                }
            }
            return Err(e);
        }

        self.sync_dir().await?;

        debug!(path = %path.display(), len = bytes.len(), "replaced file");
        Ok(())
    }
}
