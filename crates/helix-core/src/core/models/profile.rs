use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileShapeError {
    #[error("Layerline profile is empty")]
    Empty,

    #[error("Profile columns differ in length: {radial} radial indices, {amplitude} amplitudes, {phase} phases")]
    LengthMismatch {
        radial: usize,
        amplitude: usize,
        phase: usize,
    },

    #[error("Profile contains a non-finite value at radial index {radial_index}")]
    NonFinite { radial_index: i64 },
}

/// Radial profile of one layerline.
///
/// Radial indices are integer pixel offsets from the meridian. Amplitudes are background
/// subtracted (the minimum is zero for an extracted profile). Phases, in degrees, are only
/// present when the profile came from true complex data.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerlineProfile {
    radial_index: Vec<i64>,
    amplitude: Vec<f64>,
    phase: Option<Vec<f64>>,
}

impl LayerlineProfile {
    pub fn new(
        radial_index: Vec<i64>,
        amplitude: Vec<f64>,
        phase: Option<Vec<f64>>,
    ) -> Result<Self, ProfileShapeError> {
        if radial_index.is_empty() {
            return Err(ProfileShapeError::Empty);
        }
        let phase_len = phase.as_ref().map_or(radial_index.len(), Vec::len);
        if amplitude.len() != radial_index.len() || phase_len != radial_index.len() {
            return Err(ProfileShapeError::LengthMismatch {
                radial: radial_index.len(),
                amplitude: amplitude.len(),
                phase: phase_len,
            });
        }

        let phases = phase.iter().flatten();
        let values = amplitude.iter().zip(&radial_index).chain(phases.zip(&radial_index));
        for (value, &r) in values {
            if !value.is_finite() {
                return Err(ProfileShapeError::NonFinite { radial_index: r });
            }
        }

        Ok(Self {
            radial_index,
            amplitude,
            phase,
        })
    }

    pub fn radial_index(&self) -> &[i64] {
        &self.radial_index
    }

    pub fn amplitude(&self) -> &[f64] {
        &self.amplitude
    }

    pub fn phase(&self) -> Option<&[f64]> {
        self.phase.as_deref()
    }

    pub fn len(&self) -> usize {
        self.radial_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radial_index.is_empty()
    }

    pub fn max_amplitude(&self) -> f64 {
        self.amplitude.iter().copied().fold(f64::MIN, f64::max)
    }
}
