//! Student model.
//!
//! A student is the unit being placed. All attributes are read-only
//! input to a placement run; the engine never mutates them.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Gender as recorded on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Ordinal level on a 1–5 scale (5 = strongest).
///
/// Used for both academic and behavioral levels. Deserializes from an
/// integer or from a category name:
///
/// | Category | Level |
/// |----------|-------|
/// | `advanced` / `excellent` | 5 |
/// | `proficient` / `good` | 4 |
/// | `developing` / `fair` | 3 |
/// | `needs_support` / `needs_improvement` | 1 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "LevelRepr", into = "u8")]
pub struct Level(u8);

/// Coarse level bands used by teacher distribution targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelBand {
    /// Level 5.
    Top,
    /// Level 4.
    High,
    /// Level 3.
    Mid,
    /// Levels 1–2.
    Low,
}

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Creates a level, clamping into 1..=5.
    pub fn new(value: u8) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Parses a category name (academic or behavioral vocabulary).
    pub fn from_category(name: &str) -> Option<Self> {
        let level = match name.trim().to_ascii_lowercase().as_str() {
            "advanced" | "excellent" => 5,
            "proficient" | "good" => 4,
            "developing" | "fair" => 3,
            "needs_support" | "needs_improvement" => 1,
            _ => return None,
        };
        Some(Self(level))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    pub fn band(self) -> LevelBand {
        match self.0 {
            5 => LevelBand::Top,
            4 => LevelBand::High,
            3 => LevelBand::Mid,
            _ => LevelBand::Low,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self(3)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(u8),
    Category(String),
}

impl TryFrom<LevelRepr> for Level {
    type Error = String;

    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Number(n) if (Level::MIN..=Level::MAX).contains(&n) => Ok(Level(n)),
            LevelRepr::Number(n) => Err(format!("level {n} is outside 1..=5")),
            LevelRepr::Category(name) => {
                Level::from_category(&name).ok_or_else(|| format!("unknown level category '{name}'"))
            }
        }
    }
}

impl LevelBand {
    pub const ALL: [LevelBand; 4] = [
        LevelBand::Top,
        LevelBand::High,
        LevelBand::Mid,
        LevelBand::Low,
    ];
}

/// Formal support plan attached to a special-needs student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportPlan {
    /// Individualized Education Program.
    Iep,
    /// Section 504 accommodation plan.
    #[serde(rename = "504")]
    Section504,
    /// Special needs without a formal plan on record.
    Unspecified,
}

/// `special_needs` accepts a plan name or a plain flag; `true` without a
/// plan means [`SupportPlan::Unspecified`].
#[derive(Deserialize)]
#[serde(untagged)]
enum SpecialNeedsRepr {
    Flag(bool),
    Plan(SupportPlan),
}

fn deserialize_special_needs<'de, D>(deserializer: D) -> Result<Option<SupportPlan>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<SpecialNeedsRepr>::deserialize(deserializer)? {
        None | Some(SpecialNeedsRepr::Flag(false)) => None,
        Some(SpecialNeedsRepr::Flag(true)) => Some(SupportPlan::Unspecified),
        Some(SpecialNeedsRepr::Plan(plan)) => Some(plan),
    })
}

/// A student to be placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Grade the placement is for.
    pub grade: u8,
    pub gender: Gender,
    #[serde(default)]
    pub academic_level: Level,
    #[serde(default)]
    pub behavioral_level: Level,
    /// `None` = no special needs.
    #[serde(default, deserialize_with = "deserialize_special_needs")]
    pub special_needs: Option<SupportPlan>,
    /// Classmates requested by parents or teachers.
    #[serde(default)]
    pub preferred_peers: Vec<String>,
    /// Classmates the family asked to keep apart from (soft).
    #[serde(default)]
    pub avoid_peers: Vec<String>,
}

impl Student {
    /// Creates a student with mid-scale levels and no special needs.
    pub fn new(id: impl Into<String>, grade: u8, gender: Gender) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            grade,
            gender,
            academic_level: Level::default(),
            behavioral_level: Level::default(),
            special_needs: None,
            preferred_peers: Vec::new(),
            avoid_peers: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the academic level (clamped into 1..=5).
    pub fn with_academic(mut self, level: u8) -> Self {
        self.academic_level = Level::new(level);
        self
    }

    /// Sets the behavioral level (clamped into 1..=5).
    pub fn with_behavioral(mut self, level: u8) -> Self {
        self.behavioral_level = Level::new(level);
        self
    }

    pub fn with_special_needs(mut self, plan: SupportPlan) -> Self {
        self.special_needs = Some(plan);
        self
    }

    pub fn with_preferred_peer(mut self, peer: impl Into<String>) -> Self {
        self.preferred_peers.push(peer.into());
        self
    }

    pub fn with_avoid_peer(mut self, peer: impl Into<String>) -> Self {
        self.avoid_peers.push(peer.into());
        self
    }

    #[inline]
    pub fn has_special_needs(&self) -> bool {
        self.special_needs.is_some()
    }

    pub fn has_iep(&self) -> bool {
        self.special_needs == Some(SupportPlan::Iep)
    }

    pub fn has_504(&self) -> bool {
        self.special_needs == Some(SupportPlan::Section504)
    }

    /// Whether parents/teachers recorded a preferred classmate.
    pub fn has_peer_request(&self) -> bool {
        !self.preferred_peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_builder() {
        let s = Student::new("S1", 3, Gender::Female)
            .with_name("Ada")
            .with_academic(5)
            .with_behavioral(2)
            .with_special_needs(SupportPlan::Iep)
            .with_preferred_peer("S2");

        assert_eq!(s.id, "S1");
        assert_eq!(s.academic_level.value(), 5);
        assert_eq!(s.behavioral_level.band(), LevelBand::Low);
        assert!(s.has_special_needs());
        assert!(s.has_iep());
        assert!(!s.has_504());
        assert!(s.has_peer_request());
    }

    #[test]
    fn test_level_clamped() {
        assert_eq!(Level::new(0).value(), 1);
        assert_eq!(Level::new(9).value(), 5);
    }

    #[test]
    fn test_level_bands() {
        assert_eq!(Level::new(5).band(), LevelBand::Top);
        assert_eq!(Level::new(4).band(), LevelBand::High);
        assert_eq!(Level::new(3).band(), LevelBand::Mid);
        assert_eq!(Level::new(2).band(), LevelBand::Low);
        assert_eq!(Level::new(1).band(), LevelBand::Low);
    }

    #[test]
    fn test_level_from_category() {
        assert_eq!(Level::from_category("advanced"), Some(Level::new(5)));
        assert_eq!(Level::from_category("Good"), Some(Level::new(4)));
        assert_eq!(Level::from_category("needs_improvement"), Some(Level::new(1)));
        assert_eq!(Level::from_category("stellar"), None);
    }

    #[test]
    fn test_student_deserialize_mixed_levels() {
        let json = r#"{
            "id": "S9",
            "grade": 3,
            "gender": "male",
            "academic_level": "proficient",
            "behavioral_level": 2,
            "special_needs": "504"
        }"#;
        let s: Student = serde_json::from_str(json).unwrap();
        assert_eq!(s.academic_level.value(), 4);
        assert_eq!(s.behavioral_level.value(), 2);
        assert!(s.has_504());
        assert!(s.preferred_peers.is_empty());
    }

    #[test]
    fn test_special_needs_flag_or_plan() {
        let parse = |value: &str| {
            let json = format!(r#"{{"id": "S1", "grade": 3, "gender": "female"{value}}}"#);
            serde_json::from_str::<Student>(&json).unwrap().special_needs
        };
        assert_eq!(parse(r#", "special_needs": true"#), Some(SupportPlan::Unspecified));
        assert_eq!(parse(r#", "special_needs": false"#), None);
        assert_eq!(parse(r#", "special_needs": null"#), None);
        assert_eq!(parse(r#", "special_needs": "iep""#), Some(SupportPlan::Iep));
        assert_eq!(parse(r#", "special_needs": "504""#), Some(SupportPlan::Section504));
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_level_out_of_range_rejected() {
        let json = r#"{"id": "S1", "grade": 3, "gender": "other", "academic_level": 7}"#;
        assert!(serde_json::from_str::<Student>(json).is_err());
    }
}
