use std::fmt::{Debug, Display};

use serde_json::Value;

use crate::{core::Performable, Delayed, InvocationError};

/// Lightweight stand-in for a persisted record: its type and primary key.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct EntityReference {
    pub entity_type: String,
    pub primary_key: Value,
}

impl EntityReference {
    pub fn new(entity_type: impl Into<String>, primary_key: Value) -> Self {
        Self {
            entity_type: entity_type.into(),
            primary_key,
        }
    }

    pub fn of(object: &dyn Performable) -> anyhow::Result<Self> {
        let record = object
            .as_record()
            .ok_or_else(|| InvocationError::NotARecord(object.type_name().to_string()))?;

        Ok(Self::new(object.type_name(), record.primary_key()?))
    }
}

impl Display for EntityReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.entity_type, self.primary_key)
    }
}

/// Whether a read of the receiver may fetch a referenced record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    #[default]
    Load,
    /// Return references untouched, no store lookups
    Skip,
}

pub enum Receiver {
    Concrete(Box<dyn Performable>),
    Reference(EntityReference),
}

impl Receiver {
    pub fn type_name(&self) -> &str {
        match self {
            Receiver::Concrete(object) => object.type_name(),
            Receiver::Reference(reference) => &reference.entity_type,
        }
    }

    pub fn as_concrete(&self) -> Option<&dyn Performable> {
        match self {
            Receiver::Concrete(object) => Some(object.as_ref()),
            Receiver::Reference(_) => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Receiver::Reference(_))
    }

    /// Turn the receiver into a live object, fetching it from the store if needed.
    pub async fn resolve(self, delayed: &Delayed) -> anyhow::Result<Option<Box<dyn Performable>>> {
        match self {
            Receiver::Concrete(object) => Ok(Some(object)),
            Receiver::Reference(reference) => delayed.load(&reference).await,
        }
    }
}

impl Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Receiver::Concrete(object) => f.debug_tuple("Concrete").field(&object.type_name()).finish(),
            Receiver::Reference(reference) => f.debug_tuple("Reference").field(reference).finish(),
        }
    }
}
