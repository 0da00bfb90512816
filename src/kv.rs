// Key-value backend abstraction

use eyre::{Result, eyre};
use std::collections::HashMap;

/// Durable string storage addressed by key
///
/// Backends serialize their own operations; the last completed `set` for a
/// key is what a later `get` observes.
pub trait KvBackend {
    /// Value stored under `key`, or `None` if nothing was ever written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<B: KvBackend + ?Sized> KvBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-process backend
///
/// Keeps a log of every write attempt and can be told to fail reads or
/// writes, which makes it the backend of choice for exercising the store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: HashMap<String, String>,
    writes: Vec<(String, String)>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with one value
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut backend = Self::new();
        backend.values.insert(key.to_string(), value.to_string());
        backend
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Every `set` attempt so far, failed ones included
    pub fn writes(&self) -> &[(String, String)] {
        &self.writes
    }

    /// Stored value, bypassing failure injection
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(eyre!("Memory backend read failure for key: {}", key));
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.writes.push((key.to_string(), value.to_string()));
        if self.fail_writes {
            return Err(eyre!("Memory backend write failure for key: {}", key));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
