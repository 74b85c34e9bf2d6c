use thiserror::Error;

/// Raised while building or dispatching a deferred invocation.
///
/// These are programmer errors and are never retried.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("undefined method `{method}' for {type_name}")]
    UndefinedMethod { type_name: String, method: String },

    #[error("wrong number of arguments for {type_name}#{method} (given {given}, expected {expected})")]
    ArgumentCount {
        type_name: String,
        method: String,
        given: usize,
        expected: usize,
    },

    #[error("invalid argument #{index} for `{method}': {source}")]
    Argument {
        method: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown receiver type {0}")]
    UnknownType(String),

    #[error("unable to instantiate {type_name}: {source}")]
    Instantiate {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not a record")]
    NotARecord(String),
}
