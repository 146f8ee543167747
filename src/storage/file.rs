use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;

use super::StorageAdapter;
use crate::error::StorageError;

/// Storage that keeps one file per key inside a directory.
///
/// File names are the hex encoding of the key, so any string is a valid key.
/// Writes go to a temporary file that is renamed into place, which keeps each
/// `set` atomic per key.
pub struct FileStorage {
    dir: PathBuf,
    next_tmp: AtomicU64,
}

impl FileStorage {
    /// Store entries under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_tmp: AtomicU64::new(0),
        }
    }

    /// The directory entries are stored in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex(key)))
    }
}

fn hex(key: &str) -> String {
    key.bytes().fold(String::with_capacity(key.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[async_trait]
impl StorageAdapter for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).await?;

        let target = self.path_for(key);
        let seq = self.next_tmp.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!("{}.{seq}.tmp", hex(key)));

        fs::write(&tmp, value).await?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_hex_encoded() {
        assert_eq!(hex("ab"), "6162");
        assert_eq!(hex("a/b"), "612f62");
        assert_eq!(hex(""), "");
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));

        assert_eq!(storage.get("cart").await.unwrap(), None);

        storage.set("cart", "[\"apple\"]").await.unwrap();
        storage.set("cart", "[\"pear\"]").await.unwrap();
        assert_eq!(
            storage.get("cart").await.unwrap().as_deref(),
            Some("[\"pear\"]")
        );

        storage.remove("cart").await.unwrap();
        storage.remove("cart").await.unwrap();
        assert_eq!(storage.get("cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_with_separators_stay_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("../escape", "1").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("2e2e2f657363617065.json")]);
    }
}
