use crate::modules::protocol::{fields, VibeParams};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("AI response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("AI response is missing required numeric fields: {0:?}")]
    MissingNumericFields(Vec<&'static str>),
}

/// Turns the model's JSON text into `VibeParams`.
///
/// Only the three numeric fields are checked, and only for being JSON numbers. Values are not
/// clamped to the nominal 0-100 range. `ambienceNotes` is taken as-is: a string is used
/// directly, an absent/null value becomes empty, anything else is kept as its JSON text.
pub fn parse_vibe_params(text: &str) -> Result<VibeParams, FormatError> {
    let parsed: Value = serde_json::from_str(text.trim())?;

    let intensity = numeric_field(&parsed, fields::INTENSITY);
    let spatial_width = numeric_field(&parsed, fields::SPATIAL_WIDTH);
    let distance = numeric_field(&parsed, fields::DISTANCE);

    let (Some(intensity), Some(spatial_width), Some(distance)) =
        (intensity, spatial_width, distance)
    else {
        let missing = [
            (fields::INTENSITY, intensity),
            (fields::SPATIAL_WIDTH, spatial_width),
            (fields::DISTANCE, distance),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect();
        return Err(FormatError::MissingNumericFields(missing));
    };

    let ambience_notes = match parsed.get(fields::AMBIENCE_NOTES) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };

    Ok(VibeParams {
        intensity,
        spatial_width,
        distance,
        ambience_notes,
    })
}

fn numeric_field(parsed: &Value, name: &str) -> Option<f64> {
    parsed
        .get(name)
        .filter(|v| v.is_number())
        .and_then(Value::as_f64)
}
