use serde::{de::DeserializeOwned, Serialize};

use crate::models::PayloadFormat;

pub fn encode(input: impl Serialize) -> anyhow::Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(&input)?)
}

pub fn decode<T: DeserializeOwned>(input: &[u8]) -> anyhow::Result<T> {
    Ok(rmp_serde::from_slice(input)?)
}

pub fn encode_json(input: impl Serialize) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(&input)?)
}

pub fn decode_json<T: DeserializeOwned>(input: &[u8]) -> anyhow::Result<T> {
    Ok(serde_json::from_slice(input)?)
}

pub fn encode_as(format: PayloadFormat, input: impl Serialize) -> anyhow::Result<Vec<u8>> {
    match format {
        PayloadFormat::Json => encode_json(input),
        PayloadFormat::MessagePack => encode(input),
    }
}

pub fn decode_as<T: DeserializeOwned>(format: PayloadFormat, input: &[u8]) -> anyhow::Result<T> {
    match format {
        PayloadFormat::Json => decode_json(input),
        PayloadFormat::MessagePack => decode(input),
    }
}
