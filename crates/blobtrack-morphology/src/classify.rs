use serde::{Deserialize, Serialize};

use crate::MorphologyError;

/// Default ratio above which one semi-axis counts as longer than another.
pub const DEFAULT_TOLERANCE: f64 = 1.2;

/// Coarse shape of a fitted ellipsoid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeLabel {
    /// All semi-axes roughly equal.
    Sphere,
    /// Two long axes and a short one: a flat disk.
    Oblate,
    /// One long axis and two short ones: a rugby ball.
    Prolate,
    /// Three distinct lengths.
    Scalene,
}

impl ShapeLabel {
    /// Numeric code stored in the `MORPHOLOGY` spot feature.
    pub fn code(self) -> u8 {
        match self {
            Self::Sphere => 0,
            Self::Oblate => 1,
            Self::Prolate => 2,
            Self::Scalene => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Sphere),
            1 => Some(Self::Oblate),
            2 => Some(Self::Prolate),
            3 => Some(Self::Scalene),
            _ => None,
        }
    }
}

/// Labels sorted semi-axis lengths with a tolerance factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeClassifier {
    tolerance: f64,
}

impl Default for ShapeClassifier {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ShapeClassifier {
    pub fn new(tolerance: f64) -> Result<Self, MorphologyError> {
        if !(tolerance.is_finite() && tolerance >= 1.0) {
            return Err(MorphologyError::InvalidTolerance { tolerance });
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Classify ascending lengths `[a, b]` or `[a, b, c]`.
    ///
    /// The 3D checks run in order: sphere, oblate, prolate, scalene.
    pub fn classify(&self, lengths: &[f64]) -> Result<ShapeLabel, MorphologyError> {
        let f = self.tolerance;
        match *lengths {
            [a, b] => Ok(if b >= f * a {
                ShapeLabel::Prolate
            } else {
                ShapeLabel::Sphere
            }),
            [a, b, c] => Ok(if c < f * a {
                ShapeLabel::Sphere
            } else if c < f * b {
                ShapeLabel::Oblate
            } else if b < f * a {
                ShapeLabel::Prolate
            } else {
                ShapeLabel::Scalene
            }),
            _ => Err(MorphologyError::InvalidAxisCount {
                count: lengths.len(),
            }),
        }
    }
}
