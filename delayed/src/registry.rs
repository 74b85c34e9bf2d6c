use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    core::{MethodInfo, Performable, PerformableType},
    InvocationError,
};

type Instantiate =
    Box<dyn Fn(Value) -> Result<Box<dyn Performable>, serde_json::Error> + Send + Sync>;

struct Entry {
    methods: &'static [MethodInfo],
    instantiate: Instantiate,
}

/// Receiver types known to a [`Delayed`](crate::Delayed), keyed by type name.
#[derive(Default)]
pub struct Registry {
    types: HashMap<&'static str, Entry>,
}

impl Registry {
    pub fn register<T>(&mut self)
    where
        T: PerformableType + DeserializeOwned + 'static,
    {
        if self.types.contains_key(T::TYPE_NAME) {
            tracing::warn!("Receiver type {} registered twice", T::TYPE_NAME);
        }

        self.types.insert(
            T::TYPE_NAME,
            Entry {
                methods: T::METHODS,
                instantiate: Box::new(|state: Value| -> Result<Box<dyn Performable>, serde_json::Error> {
                    let object: T = serde_json::from_value(state)?;
                    Ok(Box::new(object) as Box<dyn Performable>)
                }),
            },
        );
    }

    pub fn methods(&self, type_name: &str) -> Option<&'static [MethodInfo]> {
        self.types.get(type_name).map(|entry| entry.methods)
    }

    pub fn instantiate(
        &self,
        type_name: &str,
        state: Value,
    ) -> Result<Box<dyn Performable>, InvocationError> {
        let entry = self
            .types
            .get(type_name)
            .ok_or_else(|| InvocationError::UnknownType(type_name.to_string()))?;

        (entry.instantiate)(state).map_err(|source| InvocationError::Instantiate {
            type_name: type_name.to_string(),
            source,
        })
    }
}
