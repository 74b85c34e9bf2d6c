//! Helpers used by the code generated with [`performable!`](crate::performable)
//! to unpack the argument list of an invocation.
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::InvocationError;

pub fn check_arity(
    type_name: &str,
    method: &str,
    args: &[Value],
    expected: usize,
) -> Result<(), InvocationError> {
    if args.len() != expected {
        return Err(InvocationError::ArgumentCount {
            type_name: type_name.to_string(),
            method: method.to_string(),
            given: args.len(),
            expected,
        });
    }

    Ok(())
}

pub fn arg<T: DeserializeOwned>(
    method: &str,
    args: &[Value],
    index: usize,
) -> Result<T, InvocationError> {
    let value = args.get(index).unwrap_or(&Value::Null);

    T::deserialize(value).map_err(|source| InvocationError::Argument {
        method: method.to_string(),
        index,
        source,
    })
}
