//! In-memory store fakes shared by coordinator and session tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::challenges::ProgressRecord;
use crate::errors::{Error, Result};
use crate::sync::{LocalProgressCache, RemoteProgressStore, UserProgress};

/// In-memory cache with a failure toggle.
pub struct FakeCache {
    pub entries: Mutex<HashMap<String, ProgressRecord>>,
    pub fail_writes: Mutex<bool>,
}

impl FakeCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fail_writes: Mutex::new(false),
        }
    }
}

impl LocalProgressCache for FakeCache {
    fn get(&self, key: &str) -> Result<Option<ProgressRecord>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, record: &ProgressRecord) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::persistence("cache offline"));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

/// In-memory remote store counting writes, with failure toggles.
pub struct FakeRemote {
    pub records: Mutex<HashMap<String, ProgressRecord>>,
    pub write_count: Mutex<usize>,
    pub fail_writes: Mutex<bool>,
    pub fail_reads: Mutex<bool>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            write_count: Mutex::new(0),
            fail_writes: Mutex::new(false),
            fail_reads: Mutex::new(false),
        }
    }

    pub fn writes(&self) -> usize {
        *self.write_count.lock().unwrap()
    }
}

#[async_trait]
impl RemoteProgressStore for FakeRemote {
    async fn read(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(Error::persistence("network down"));
        }
        Ok(self.records.lock().unwrap().get(user_id).cloned())
    }

    async fn write(&self, user_id: &str, record: &ProgressRecord) -> Result<()> {
        *self.write_count.lock().unwrap() += 1;
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::persistence("network down"));
        }
        self.records
            .lock()
            .unwrap()
            .insert(user_id.to_string(), record.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserProgress>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|(user_id, record)| UserProgress {
                user_id: user_id.clone(),
                username: None,
                record: record.clone(),
            })
            .collect())
    }
}
