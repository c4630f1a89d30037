use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use super::error::StorefrontResult;

pub const CART_KEY: &str = "pranjay-cart";
pub const WISHLIST_KEY: &str = "pranjay-wishlist";
pub const ORDERS_KEY: &str = "pranjay-orders";
pub const AUTH_KEY: &str = "pranjay-auth";

/// Directory-backed key-value store. Each key is one `<key>.json` file.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn open(dir: impl Into<PathBuf>) -> StorefrontResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `PRANJAY_DATA_DIR`, else `.pranjay` under the working directory.
    pub fn from_env() -> StorefrontResult<Self> {
        let dir = std::env::var("PRANJAY_DATA_DIR").unwrap_or_else(|_| ".pranjay".to_string());
        Self::open(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Missing, unreadable and corrupt values all load as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read stored value");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding corrupt stored value");
                None
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> StorefrontResult<()> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> StorefrontResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_corrupt_values_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        assert_eq!(store.load::<Vec<i32>>("absent"), None);

        fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        assert_eq!(store.load::<Vec<i32>>("broken"), None);
    }

    #[test]
    fn save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("nested")).unwrap();
        store.save("numbers", &vec![1, 2, 3]).unwrap();
        assert_eq!(store.load::<Vec<i32>>("numbers"), Some(vec![1, 2, 3]));
        assert!(!dir.path().join("nested/numbers.json.tmp").exists());

        store.remove("numbers").unwrap();
        store.remove("numbers").unwrap();
        assert_eq!(store.load::<Vec<i32>>("numbers"), None);
    }
}
