#![doc = include_str!("../README.md")]
use crate::core::{Performable, PerformableType};
use crate::models::{Job, PayloadFormat};
use crate::registry::Registry;
use crate::storage::RecordStore;
use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;
use typed_builder::TypedBuilder;

// lets the generated code refer to `::delayed` from inside this crate too
extern crate self as delayed;

pub use anyhow;
pub use delayed_derive::performable;
pub use serde_json;

pub use error::InvocationError;
pub use invocation::DeferredInvocation;
pub use reference::{EntityReference, Receiver, Resolution};

pub mod args;
pub mod core;
pub mod encoder;
mod error;
mod invocation;
mod metrics;
pub mod models;
mod reference;
pub mod registry;
pub mod storage;

pub type UtcDateTime = chrono::DateTime<chrono::Utc>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobId(pub(crate) String);
impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn generate_id() -> String {
    rusty_ulid::generate_ulid_string()
}

#[derive(TypedBuilder)]
pub struct Config {
    /// Name of the queue stamped on every [`Job`] created by [`Delayed::delay`].
    #[builder(setter(into))]
    pub name: String,

    /// Backing store used to re-fetch records referenced by a payload.
    pub store: Box<dyn RecordStore>,

    #[builder(default)]
    pub format: PayloadFormat,
}

/// Entry point: knows the receiver types, the record store and the payload format.
pub struct Delayed {
    config: Config,
    registry: Registry,
}

impl Delayed {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: Registry::default(),
        }
    }

    /// Register a receiver type so payloads naming it can be decoded.
    pub fn register<T>(mut self) -> Self
    where
        T: PerformableType + DeserializeOwned + 'static,
    {
        self.registry.register::<T>();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.config.store.as_ref()
    }

    pub fn format(&self) -> PayloadFormat {
        self.config.format
    }

    pub fn get_metrics(&self) -> anyhow::Result<String> {
        metrics::COUNTER.output()
    }

    /// Re-fetch the record behind `reference`. `None` when the record is gone.
    pub async fn load(
        &self,
        reference: &EntityReference,
    ) -> anyhow::Result<Option<Box<dyn Performable>>> {
        tracing::debug!("Loading {}", reference);

        let attributes = self
            .store()
            .find(&reference.entity_type, &reference.primary_key)
            .await
            .with_context(|| format!("Unable to look up {}", reference))?;

        match attributes {
            Some(attributes) => Ok(Some(
                self.registry
                    .instantiate(&reference.entity_type, attributes)?,
            )),
            None => Ok(None),
        }
    }

    pub fn encode(&self, invocation: &DeferredInvocation) -> anyhow::Result<Vec<u8>> {
        let payload = invocation.to_payload()?;
        encoder::encode_as(self.config.format, &payload)
            .with_context(|| format!("Unable to serialize {}", invocation.display_name()))
    }

    pub async fn decode(&self, bytes: &[u8]) -> anyhow::Result<DeferredInvocation> {
        self.decode_as(self.config.format, bytes).await
    }

    async fn decode_as(
        &self,
        format: PayloadFormat,
        bytes: &[u8],
    ) -> anyhow::Result<DeferredInvocation> {
        let payload = encoder::decode_as(format, bytes)
            .context("Unable to deserialize the invocation payload")?;

        DeferredInvocation::from_payload(payload, self).await
    }

    /// Capture `receiver.method(args)` as a job ready to be stored by a queue.
    pub fn delay(
        &self,
        receiver: impl Performable + 'static,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> anyhow::Result<Job> {
        let invocation = DeferredInvocation::new(receiver, method, args)?;
        self.enqueue_invocation(&invocation)
    }

    pub fn enqueue_invocation(&self, invocation: &DeferredInvocation) -> anyhow::Result<Job> {
        let job = Job {
            id: JobId(generate_id()),
            queue: self.config.name.clone(),
            display_name: invocation.display_name(),
            format: self.config.format,
            handler: self.encode(invocation)?,
            created_at: chrono::Utc::now(),
        };

        tracing::debug!(
            "Created job {} [{}] on {}",
            job.id,
            job.display_name,
            job.queue
        );

        Ok(job)
    }

    /// Decode the job's handler and perform it.
    ///
    /// Returns `Ok(None)` without side effects when the receiver no longer exists.
    pub async fn run(&self, job: &Job) -> anyhow::Result<Option<Value>> {
        let mut invocation = self
            .decode_as(job.format, &job.handler)
            .await
            .with_context(|| format!("Unable to load job {}", job.id))?;

        let ty = invocation.receiver_type().to_string();

        match invocation.perform(self).await {
            Ok(Some(output)) => {
                metrics::COUNTER
                    .invocations_performed
                    .with_label_values(&[ty.as_str()])
                    .inc();
                tracing::debug!("Job {} [{}]: Performed", job.id, job.display_name);
                Ok(Some(output))
            }
            Ok(None) => {
                metrics::COUNTER
                    .invocations_skipped
                    .with_label_values(&[ty.as_str()])
                    .inc();
                tracing::info!(
                    "Job {} [{}]: Receiver no longer exists, skipping",
                    job.id,
                    job.display_name
                );
                Ok(None)
            }
            Err(e) => {
                metrics::COUNTER
                    .invocations_failed
                    .with_label_values(&[ty.as_str()])
                    .inc();
                tracing::warn!("Job {} [{}]: Failed: {}", job.id, job.display_name, e);
                Err(e)
            }
        }
    }
}
