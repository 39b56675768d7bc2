//! Teacher preference profile.
//!
//! Teachers declare what class composition they work best with. The
//! matcher compares these declarations to each class's actual makeup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Gender, LevelBand};

/// Preferred class size window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSizePreference {
    pub min: usize,
    pub ideal: usize,
    pub max: usize,
}

impl Default for ClassSizePreference {
    fn default() -> Self {
        Self {
            min: 15,
            ideal: 20,
            max: 25,
        }
    }
}

/// Target share for one level band, in percent (0–100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelTarget {
    pub preferred_pct: f64,
    /// Hard ceiling; exceeding it is penalized per point.
    pub max_pct: f64,
}

impl LevelTarget {
    pub fn new(preferred_pct: f64, max_pct: f64) -> Self {
        Self {
            preferred_pct,
            max_pct,
        }
    }
}

/// Gender mix preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderPreference {
    /// How much the teacher cares (1 = indifferent, 5 = very).
    pub importance: u8,
    /// Preferred share per gender, in percent.
    pub preferred_pct: BTreeMap<Gender, f64>,
}

impl Default for GenderPreference {
    fn default() -> Self {
        Self {
            importance: 3,
            preferred_pct: BTreeMap::from([(Gender::Male, 50.0), (Gender::Female, 50.0)]),
        }
    }
}

/// How many students on formal plans a teacher can support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialEdCapacity {
    pub max_iep: usize,
    pub max_504: usize,
}

impl Default for SpecialEdCapacity {
    fn default() -> Self {
        Self {
            max_iep: 3,
            max_504: 3,
        }
    }
}

/// A teacher and their declared class preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class_size: ClassSizePreference,
    /// Academic band targets. Bands not listed are not scored.
    #[serde(default)]
    pub academic_targets: BTreeMap<LevelBand, LevelTarget>,
    /// Behavioral band targets. Bands not listed are not scored.
    #[serde(default)]
    pub behavioral_targets: BTreeMap<LevelBand, LevelTarget>,
    #[serde(default)]
    pub gender: GenderPreference,
    #[serde(default)]
    pub special_ed: SpecialEdCapacity,
    /// Informational only.
    #[serde(default)]
    pub specialties: Vec<String>,
}

impl TeacherProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            class_size: ClassSizePreference::default(),
            academic_targets: BTreeMap::new(),
            behavioral_targets: BTreeMap::new(),
            gender: GenderPreference::default(),
            special_ed: SpecialEdCapacity::default(),
            specialties: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_class_size(mut self, min: usize, ideal: usize, max: usize) -> Self {
        self.class_size = ClassSizePreference { min, ideal, max };
        self
    }

    pub fn with_academic_target(mut self, band: LevelBand, preferred: f64, max: f64) -> Self {
        self.academic_targets
            .insert(band, LevelTarget::new(preferred, max));
        self
    }

    pub fn with_behavioral_target(mut self, band: LevelBand, preferred: f64, max: f64) -> Self {
        self.behavioral_targets
            .insert(band, LevelTarget::new(preferred, max));
        self
    }

    /// Sets gender importance (clamped into 1..=5).
    pub fn with_gender_importance(mut self, importance: u8) -> Self {
        self.gender.importance = importance.clamp(1, 5);
        self
    }

    pub fn with_gender_ratio(mut self, gender: Gender, pct: f64) -> Self {
        self.gender.preferred_pct.insert(gender, pct);
        self
    }

    pub fn with_special_ed(mut self, max_iep: usize, max_504: usize) -> Self {
        self.special_ed = SpecialEdCapacity { max_iep, max_504 };
        self
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialties.push(specialty.into());
        self
    }
}
