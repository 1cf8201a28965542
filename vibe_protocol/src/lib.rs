use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Range the model is asked to keep the numeric parameters in. Values outside it are still
/// delivered as-is; consumers decide what to do with them.
pub const NOMINAL_RANGE: RangeInclusive<f64> = 0.0..=100.0;

pub mod fields {
    pub const INTENSITY: &str = "intensity";
    pub const SPATIAL_WIDTH: &str = "spatialWidth";
    pub const DISTANCE: &str = "distance";
    pub const AMBIENCE_NOTES: &str = "ambienceNotes";

    pub const NUMERIC: [&str; 3] = [INTENSITY, SPATIAL_WIDTH, DISTANCE];
}

/// Effect settings derived from a mood/scene description.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VibeParams {
    pub intensity: f64,
    pub spatial_width: f64,
    pub distance: f64,
    pub ambience_notes: String,
}

impl VibeParams {
    /// Wire names of the numeric fields outside [`NOMINAL_RANGE`] (or non-finite).
    pub fn out_of_range_fields(&self) -> Vec<&'static str> {
        [
            (fields::INTENSITY, self.intensity),
            (fields::SPATIAL_WIDTH, self.spatial_width),
            (fields::DISTANCE, self.distance),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_finite() || !NOMINAL_RANGE.contains(v))
        .map(|(name, _)| name)
        .collect()
    }
}
