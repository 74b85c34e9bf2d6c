use std::sync::Arc;

use serde_json::Value;

pub mod memory;

/// The backing record store: looks records up by primary key.
///
/// Returns the record attributes, which the [`Registry`](crate::registry::Registry)
/// turns back into a receiver.
#[async_trait::async_trait]
pub trait RecordStore: Sync + Send {
    async fn find(&self, entity_type: &str, primary_key: &Value) -> anyhow::Result<Option<Value>>;
}

#[async_trait::async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn find(&self, entity_type: &str, primary_key: &Value) -> anyhow::Result<Option<Value>> {
        self.as_ref().find(entity_type, primary_key).await
    }
}

/// Json text of the key, so `"5"` and `5` stay distinct.
pub(crate) fn key_of(primary_key: &Value) -> String {
    primary_key.to_string()
}
