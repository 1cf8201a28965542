use crate::modules::protocol::fields;
use serde_json::{json, Value};

/// Instruction sent with every request. The description is quoted verbatim.
pub fn build_prompt(description: &str) -> String {
    format!(
        r#"Based on the following scene or mood description, generate appropriate parameters for an audio effect processor. The user wants to feel like their audio is playing within this scene.

Description: "{description}"

Return a JSON object with values between 0 and 100 for intensity, spatialWidth, and distance. Also include a brief "ambienceNotes" string describing the sonic environment you imagined."#
    )
}

/// Structured-output schema (Gemini's OpenAPI subset) for a `VibeParams` reply.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            (fields::INTENSITY): {
                "type": "NUMBER",
                "description": "Overall effect intensity. Lower for subtle moods, higher for more immersive ones. Range: 0-100."
            },
            (fields::SPATIAL_WIDTH): {
                "type": "NUMBER",
                "description": "Stereo width of the ambience. Lower for a narrow, focused sound, higher for a wide, open environment. Range: 0-100."
            },
            (fields::DISTANCE): {
                "type": "NUMBER",
                "description": "Perceived distance of the sound. Lower for close-up audio, higher for audio far away. Range: 0-100."
            },
            (fields::AMBIENCE_NOTES): {
                "type": "STRING",
                "description": "A short, creative description of the soundscape imagined from the prompt."
            }
        },
        "required": [
            fields::INTENSITY,
            fields::SPATIAL_WIDTH,
            fields::DISTANCE,
            fields::AMBIENCE_NOTES
        ]
    })
}
