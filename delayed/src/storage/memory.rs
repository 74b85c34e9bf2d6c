use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
};

use serde_json::Value;

use super::{key_of, RecordStore};
use crate::{core::Performable, InvocationError};

/// Records held in memory, grouped by type then primary key.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, HashMap<String, Value>>>,
    lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: &dyn Performable) -> anyhow::Result<()> {
        let identity = record
            .as_record()
            .ok_or_else(|| InvocationError::NotARecord(record.type_name().to_string()))?;
        let primary_key = identity.primary_key()?;
        let key = key_of(&primary_key);
        let attributes = record.state()?;

        tracing::debug!(
            "Storing {}({}={})",
            record.type_name(),
            identity.primary_key_name(),
            primary_key
        );

        self.records
            .write()
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .entry(record.type_name().to_string())
            .or_default()
            .insert(key, attributes);

        Ok(())
    }

    pub fn remove(&self, entity_type: &str, primary_key: &Value) -> anyhow::Result<bool> {
        let removed = self
            .records
            .write()
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .get_mut(entity_type)
            .and_then(|records| records.remove(&key_of(primary_key)))
            .is_some();

        Ok(removed)
    }

    /// Number of `find` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, entity_type: &str, primary_key: &Value) -> anyhow::Result<Option<Value>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let found = self
            .records
            .read()
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .get(entity_type)
            .and_then(|records| records.get(&key_of(primary_key)))
            .cloned();

        Ok(found)
    }
}
