//! Deserialization of stage descriptions.
//!
//! Descriptions are plain tagged records; the `kind` field picks the
//! parser and everything else is kind-specific. Parsing is recursive:
//! composite kinds run their `upstreams` elements back through
//! [`from_value`], so an unknown tag or a missing field anywhere in the
//! tree fails the whole description with a pointed error.
//!
//! Serialization is the derive on [`Stage`]; [`to_value`]/[`to_json`] are
//! thin wrappers kept here so both directions of the contract live in one
//! place. Round-tripping a tree through serialize/deserialize yields a
//! value-equal tree.

use serde_json::Value;

use crate::{
    engine::{FilterKind, Waveform},
    error::PatchError,
    stage::{EnvelopeStage, FilterStage, GainStage, NoiseStage, SampleStage, Stage, WaveStage},
};

/// Parse a stage tree from description JSON.
pub fn from_json(text: &str) -> Result<Stage, PatchError> {
    let value: Value = serde_json::from_str(text)?;
    from_value(&value)
}

/// Parse a stage tree from an in-memory description record.
pub fn from_value(value: &Value) -> Result<Stage, PatchError> {
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(PatchError::MissingField {
            kind: "stage",
            field: "kind",
        })?;

    match kind {
        "wave" => parse_wave(value),
        "noise" => Ok(Stage::Noise(NoiseStage::new())),
        "sample" => parse_sample(value),
        "gain" => parse_gain(value),
        "envelope" => parse_envelope(value),
        "filter" => parse_filter(value),
        other => Err(PatchError::UnknownKind(other.to_owned())),
    }
}

/// Serialize a stage tree to its description record.
pub fn to_value(stage: &Stage) -> Result<Value, PatchError> {
    Ok(serde_json::to_value(stage)?)
}

/// Serialize a stage tree to description JSON.
pub fn to_json(stage: &Stage) -> Result<String, PatchError> {
    Ok(serde_json::to_string(stage)?)
}

fn parse_wave(value: &Value) -> Result<Stage, PatchError> {
    let waveform: Waveform = enum_field(value, "wave", "type")?;
    Ok(Stage::Wave(WaveStage::new(waveform)))
}

fn parse_sample(value: &Value) -> Result<Stage, PatchError> {
    let data = match value.get("data") {
        Some(data) => serde_json::from_value::<Vec<Vec<f32>>>(data.clone()).map_err(|_| {
            PatchError::InvalidField {
                kind: "sample",
                field: "data",
            }
        })?,
        None => {
            return Err(PatchError::MissingField {
                kind: "sample",
                field: "data",
            })
        }
    };

    let begin_at = frame_field(value, "sample", "beginAt")?;
    let end_at = frame_field(value, "sample", "endAt")?;

    Ok(Stage::Sample(SampleStage::with_range(data, begin_at, end_at)))
}

fn parse_gain(value: &Value) -> Result<Stage, PatchError> {
    let level = float_field(value, "gain", "level")?;
    let upstreams = upstream_field(value, "gain", false)?;
    Ok(Stage::Gain(GainStage::new(level, upstreams)))
}

fn parse_envelope(value: &Value) -> Result<Stage, PatchError> {
    let attack = float_field(value, "envelope", "attack")?;
    let decay = float_field(value, "envelope", "decay")?;
    let sustain = float_field(value, "envelope", "sustain")?;
    let release = float_field(value, "envelope", "release")?;
    let upstreams = upstream_field(value, "envelope", true)?;
    Ok(Stage::Envelope(EnvelopeStage::new(
        attack, decay, sustain, release, upstreams,
    )))
}

fn parse_filter(value: &Value) -> Result<Stage, PatchError> {
    let kind: FilterKind = enum_field(value, "filter", "type")?;
    let frequency = float_field(value, "filter", "frequency")?;
    let q = float_field(value, "filter", "q")?;
    let gain = float_field(value, "filter", "gain")?;
    let upstreams = upstream_field(value, "filter", true)?;
    Ok(Stage::Filter(FilterStage::new(
        kind, frequency, q, gain, upstreams,
    )))
}

fn float_field(value: &Value, kind: &'static str, field: &'static str) -> Result<f32, PatchError> {
    match value.get(field) {
        Some(v) => v
            .as_f64()
            .map(|f| f as f32)
            .ok_or(PatchError::InvalidField { kind, field }),
        None => Err(PatchError::MissingField { kind, field }),
    }
}

fn frame_field(
    value: &Value,
    kind: &'static str,
    field: &'static str,
) -> Result<Option<usize>, PatchError> {
    match value.get(field) {
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or(PatchError::InvalidField { kind, field }),
        None => Ok(None),
    }
}

fn enum_field<T: serde::de::DeserializeOwned>(
    value: &Value,
    kind: &'static str,
    field: &'static str,
) -> Result<T, PatchError> {
    match value.get(field) {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|_| PatchError::InvalidField { kind, field }),
        None => Err(PatchError::MissingField { kind, field }),
    }
}

fn upstream_field(
    value: &Value,
    kind: &'static str,
    required: bool,
) -> Result<Vec<Stage>, PatchError> {
    match value.get("upstreams") {
        Some(Value::Array(items)) => items.iter().map(from_value).collect(),
        Some(_) => Err(PatchError::InvalidField {
            kind,
            field: "upstreams",
        }),
        None if required => Err(PatchError::MissingField {
            kind,
            field: "upstreams",
        }),
        None => Ok(Vec::new()),
    }
}
