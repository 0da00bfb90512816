// File-per-key storage

use crate::kv::KvBackend;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

// Longest name this backend derives from a key, and the common file name limit
const LONGEST_SUFFIX: &str = ".json.tmp";
const MAX_FILE_NAME: usize = 255;

/// Longest key whose derived file names all fit in one path component
pub const MAX_KEY_LEN: usize = MAX_FILE_NAME - LONGEST_SUFFIX.len();

/// Stores each key as `<key>.json` in a directory
///
/// Writes go to a temporary file that is synced and renamed over the target
/// while holding an exclusive lock on `<key>.lock`.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create store directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(eyre!("Storage key cannot be empty"));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(eyre!(
                "Storage key too long: {} bytes (max {} to fit a file name)",
                key.len(),
                MAX_KEY_LEN
            ));
        }
        // Keys become file names: no separators, dots or other special characters
        if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!("Invalid storage key: {} (must be ASCII alphanumeric with _/-)", key));
        }
        Ok(())
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Self::validate_key(key)?;

        let path = self.value_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        Self::validate_key(key)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.dir.join(format!("{}.lock", key)))
            .context("Failed to open lock file")?;
        lock_file.lock_exclusive().context("Failed to acquire file lock")?;

        let path = self.value_path(key);
        let tmp_path = self.dir.join(format!("{}{}", key, LONGEST_SUFFIX));
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .context("Failed to open temporary file")?;
            tmp.write_all(value.as_bytes())?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &path).with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(key, bytes = value.len(), "Wrote key to file");
        // Lock is released when lock_file is dropped
        Ok(())
    }
}
