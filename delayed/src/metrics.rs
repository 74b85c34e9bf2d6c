use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    pub(crate) static ref COUNTER: Metrics = Metrics::new();
}

pub(crate) struct Metrics {
    pub invocations_performed: IntCounterVec,
    pub invocations_skipped: IntCounterVec,
    pub invocations_failed: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let performed = register_int_counter_vec!(
            "delayed_invocations_performed",
            "total deferred invocations performed",
            &["type"]
        )
        .expect("register delayed_invocations_performed");
        let skipped = register_int_counter_vec!(
            "delayed_invocations_skipped",
            "deferred invocations skipped because the receiver no longer exists",
            &["type"]
        )
        .expect("register delayed_invocations_skipped");
        let failed = register_int_counter_vec!(
            "delayed_invocations_failed",
            "deferred invocations that returned an error",
            &["type"]
        )
        .expect("register delayed_invocations_failed");

        Metrics {
            invocations_performed: performed,
            invocations_skipped: skipped,
            invocations_failed: failed,
        }
    }

    pub fn output(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        encoder.encode(&metric_families, &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }
}
