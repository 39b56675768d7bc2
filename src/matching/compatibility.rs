//! Teacher-to-class compatibility scoring.
//!
//! Compares one teacher's declared preferences with one class's actual
//! composition. Five subscores in [0, 1] are combined into a weighted
//! total on a 0–100 scale.
//!
//! | Subscore | Weight | Penalty |
//! |----------|--------|---------|
//! | Class size | 20% | 0.1 per student beyond ideal ±2 inside bounds; 0.2 per student outside bounds |
//! | Academic mix | 25% | mean absolute % deviation / 50; 0.02 per point over a declared max |
//! | Behavioral mix | 25% | same as academic |
//! | Special education | 15% | 0.2 per IEP / 504 student over capacity, averaged |
//! | Gender mix | 15% | deviation score pulled toward 0.5 by low importance |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::balance::{round2, ClassProfile};
use crate::models::{
    ClassSizePreference, GenderPreference, LevelBand, LevelTarget, SpecialEdCapacity,
    TeacherProfile,
};

pub const SIZE_WEIGHT: f64 = 0.20;
pub const ACADEMIC_WEIGHT: f64 = 0.25;
pub const BEHAVIORAL_WEIGHT: f64 = 0.25;
pub const SPECIAL_ED_WEIGHT: f64 = 0.15;
pub const GENDER_WEIGHT: f64 = 0.15;

/// Students around the ideal size that cost nothing.
const IDEAL_SIZE_TOLERANCE: usize = 2;
const IN_BOUNDS_PENALTY: f64 = 0.1;
const OUT_OF_BOUNDS_PENALTY: f64 = 0.2;
const OVER_MAX_PENALTY_PER_POINT: f64 = 0.02;
const SPECIAL_ED_PENALTY: f64 = 0.2;
/// Mean absolute deviation (points) at which a mix scores 0.
const MAX_MIX_DEVIATION: f64 = 50.0;

/// Subscores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityBreakdown {
    pub class_size: f64,
    pub academic: f64,
    pub behavioral: f64,
    pub special_ed: f64,
    pub gender: f64,
}

/// Compatibility of one (teacher, class) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScore {
    pub teacher_id: String,
    pub class_id: String,
    /// Weighted total in [0, 100].
    pub score: f64,
    pub breakdown: CompatibilityBreakdown,
}

/// Scores one teacher against one class profile.
pub fn score_pair(
    teacher: &TeacherProfile,
    class_id: &str,
    profile: &ClassProfile,
) -> CompatibilityScore {
    let breakdown = CompatibilityBreakdown {
        class_size: class_size_score(&teacher.class_size, profile.size),
        academic: distribution_score(&teacher.academic_targets, |b| profile.academic_pct(b)),
        behavioral: distribution_score(&teacher.behavioral_targets, |b| {
            profile.behavioral_pct(b)
        }),
        special_ed: special_ed_score(&teacher.special_ed, profile.iep, profile.plan_504),
        gender: gender_score(&teacher.gender, profile),
    };

    let weighted = SIZE_WEIGHT * breakdown.class_size
        + ACADEMIC_WEIGHT * breakdown.academic
        + BEHAVIORAL_WEIGHT * breakdown.behavioral
        + SPECIAL_ED_WEIGHT * breakdown.special_ed
        + GENDER_WEIGHT * breakdown.gender;

    CompatibilityScore {
        teacher_id: teacher.id.clone(),
        class_id: class_id.to_string(),
        score: round2((weighted * 100.0).clamp(0.0, 100.0)),
        breakdown: CompatibilityBreakdown {
            class_size: round2(breakdown.class_size),
            academic: round2(breakdown.academic),
            behavioral: round2(breakdown.behavioral),
            special_ed: round2(breakdown.special_ed),
            gender: round2(breakdown.gender),
        },
    }
}

/// Size fit. Outside `[min, max]` each student beyond the nearer bound
/// costs 0.2; inside, each student beyond `ideal ± 2` costs 0.1.
pub fn class_size_score(pref: &ClassSizePreference, size: usize) -> f64 {
    let score = if size < pref.min {
        1.0 - OUT_OF_BOUNDS_PENALTY * (pref.min - size) as f64
    } else if size > pref.max {
        1.0 - OUT_OF_BOUNDS_PENALTY * (size - pref.max) as f64
    } else {
        let excess = size.abs_diff(pref.ideal).saturating_sub(IDEAL_SIZE_TOLERANCE);
        1.0 - IN_BOUNDS_PENALTY * excess as f64
    };
    score.clamp(0.0, 1.0)
}

/// Level-mix fit over the bands a teacher declared. No targets → 1.0.
pub fn distribution_score(
    targets: &BTreeMap<LevelBand, LevelTarget>,
    actual_pct: impl Fn(LevelBand) -> f64,
) -> f64 {
    if targets.is_empty() {
        return 1.0;
    }
    let mut deviation = 0.0;
    let mut over_max = 0.0;
    for (&band, target) in targets {
        let actual = actual_pct(band);
        deviation += (actual - target.preferred_pct).abs();
        over_max += (actual - target.max_pct).max(0.0);
    }
    let mean_deviation = deviation / targets.len() as f64;
    let score = 1.0 - mean_deviation / MAX_MIX_DEVIATION - OVER_MAX_PENALTY_PER_POINT * over_max;
    score.clamp(0.0, 1.0)
}

/// IEP and 504 loads scored independently, then averaged.
pub fn special_ed_score(capacity: &SpecialEdCapacity, iep: usize, plan_504: usize) -> f64 {
    let part = |count: usize, max: usize| {
        (1.0 - SPECIAL_ED_PENALTY * count.saturating_sub(max) as f64).clamp(0.0, 1.0)
    };
    (part(iep, capacity.max_iep) + part(plan_504, capacity.max_504)) / 2.0
}

/// Gender-mix fit, scaled by importance: `0.5 + (base - 0.5) * importance / 5`.
pub fn gender_score(pref: &GenderPreference, profile: &ClassProfile) -> f64 {
    let base = if pref.preferred_pct.is_empty() {
        1.0
    } else {
        let deviation: f64 = pref
            .preferred_pct
            .iter()
            .map(|(&g, &pct)| (profile.gender_pct(g) - pct).abs())
            .sum();
        (1.0 - deviation / pref.preferred_pct.len() as f64 / 100.0).clamp(0.0, 1.0)
    };
    let importance = pref.importance.clamp(1, 5) as f64;
    (0.5 + (base - 0.5) * importance / 5.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Student, SupportPlan};

    fn profile(students: &[Student]) -> ClassProfile {
        let refs: Vec<&Student> = students.iter().collect();
        ClassProfile::from_members(&refs)
    }

    fn mixed_class(n: usize) -> Vec<Student> {
        (0..n)
            .map(|i| {
                let g = if i % 2 == 0 { Gender::Male } else { Gender::Female };
                Student::new(format!("S{i}"), 3, g)
            })
            .collect()
    }

    #[test]
    fn test_class_size_near_ideal() {
        let pref = ClassSizePreference {
            min: 15,
            ideal: 20,
            max: 25,
        };
        assert!(class_size_score(&pref, 22) > 0.9);
        assert_eq!(class_size_score(&pref, 20), 1.0);
        assert!((class_size_score(&pref, 24) - 0.8).abs() < 1e-10);
    }

    #[test]
    fn test_class_size_outside_bounds() {
        let pref = ClassSizePreference {
            min: 15,
            ideal: 20,
            max: 25,
        };
        assert_eq!(class_size_score(&pref, 30), 0.0);
        assert!((class_size_score(&pref, 27) - 0.6).abs() < 1e-10);
        assert!((class_size_score(&pref, 13) - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_distribution_exact_match() {
        let targets = BTreeMap::from([
            (LevelBand::Top, LevelTarget::new(50.0, 60.0)),
            (LevelBand::Low, LevelTarget::new(50.0, 60.0)),
        ]);
        let score = distribution_score(&targets, |b| match b {
            LevelBand::Top | LevelBand::Low => 50.0,
            _ => 0.0,
        });
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_distribution_over_max_penalty() {
        let targets = BTreeMap::from([(LevelBand::Top, LevelTarget::new(20.0, 30.0))]);
        // deviation 15 → 1 - 15/50 = 0.7; over max by 5 → -0.1
        let score = distribution_score(&targets, |_| 35.0);
        assert!((score - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_distribution_no_targets() {
        assert_eq!(distribution_score(&BTreeMap::new(), |_| 80.0), 1.0);
    }

    #[test]
    fn test_special_ed_over_capacity() {
        let cap = SpecialEdCapacity {
            max_iep: 2,
            max_504: 1,
        };
        assert_eq!(special_ed_score(&cap, 2, 1), 1.0);
        // IEP over by 2 → 0.6; 504 fine → 1.0; mean 0.8
        assert!((special_ed_score(&cap, 4, 0) - 0.8).abs() < 1e-10);
        assert_eq!(special_ed_score(&cap, 9, 9), 0.0);
    }

    #[test]
    fn test_gender_importance_scaling() {
        let all_boys: Vec<Student> = (0..4)
            .map(|i| Student::new(format!("B{i}"), 3, Gender::Male))
            .collect();
        let p = profile(&all_boys);

        let caring = GenderPreference {
            importance: 5,
            ..Default::default()
        };
        let indifferent = GenderPreference {
            importance: 1,
            ..Default::default()
        };
        // base = 1 - 50/100 = 0.5 → 0.5 regardless of importance
        assert!((gender_score(&caring, &p) - 0.5).abs() < 1e-10);

        let balanced = profile(&mixed_class(4));
        assert_eq!(gender_score(&caring, &balanced), 1.0);
        assert!((gender_score(&indifferent, &balanced) - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_score_pair_bounds_and_weights() {
        let teacher = TeacherProfile::new("T1")
            .with_class_size(15, 20, 25)
            .with_gender_importance(5);
        let class = mixed_class(20);
        let s = score_pair(&teacher, "class-1", &profile(&class));
        assert_eq!(s.teacher_id, "T1");
        assert_eq!(s.class_id, "class-1");
        assert_eq!(s.score, 100.0);

        let mut heavy = mixed_class(30);
        for st in heavy.iter_mut().take(6) {
            st.special_needs = Some(SupportPlan::Iep);
        }
        let s = score_pair(&teacher, "class-2", &profile(&heavy));
        assert_eq!(s.breakdown.class_size, 0.0);
        assert!((0.0..=100.0).contains(&s.score));
        assert!(s.score < 100.0);
    }
}
