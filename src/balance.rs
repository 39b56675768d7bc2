//! Balance scoring.
//!
//! Computes per-class balance metrics from a roster partition. Every
//! score is in [0, 1] (1 = perfectly balanced) and rounded to two
//! decimals.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Gender | `min(male, female) / max(male, female, 1)`; 1.0 with fewer than two binary-gender students |
//! | Academic | `1 - stddev(levels) / 4`, clamped |
//! | Behavioral | `1 - stddev(levels) / 4`, clamped |
//! | Special needs | `1 - min(|actual - expected| / expected, 1)`, where `expected = roster_share * class_size`; 1.0 when `expected == 0` |
//! | Overall | weighted mean of the four, weights normalized by their sum |
//!
//! Scoring is pure and shares no state, so buckets may be scored in any
//! order or in parallel.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{BalanceFactor, BalanceScores, ClassBucket, Gender, LevelBand, Student};

/// Spread on a 1–5 scale treated as fully unbalanced.
const MAX_LEVEL_SPREAD: f64 = 4.0;

/// Relative weight of each balance dimension in the overall score.
///
/// Missing fields default to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceWeights {
    pub gender: f64,
    pub academic: f64,
    pub behavioral: f64,
    pub special_needs: f64,
}

impl Default for BalanceWeights {
    fn default() -> Self {
        Self {
            gender: 1.0,
            academic: 1.0,
            behavioral: 1.0,
            special_needs: 1.0,
        }
    }
}

impl BalanceWeights {
    pub fn new(gender: f64, academic: f64, behavioral: f64, special_needs: f64) -> Self {
        Self {
            gender,
            academic,
            behavioral,
            special_needs,
        }
    }

    pub fn get(&self, factor: BalanceFactor) -> f64 {
        match factor {
            BalanceFactor::Gender => self.gender,
            BalanceFactor::Academic => self.academic,
            BalanceFactor::Behavioral => self.behavioral,
            BalanceFactor::SpecialNeeds => self.special_needs,
        }
    }

    /// Returns a copy with `factor` multiplied by `multiplier`.
    pub fn emphasize(mut self, factor: BalanceFactor, multiplier: f64) -> Self {
        let slot = match factor {
            BalanceFactor::Gender => &mut self.gender,
            BalanceFactor::Academic => &mut self.academic,
            BalanceFactor::Behavioral => &mut self.behavioral,
            BalanceFactor::SpecialNeeds => &mut self.special_needs,
        };
        *slot *= multiplier;
        self
    }

    /// Weights in `[gender, academic, behavioral, special_needs]` order,
    /// summing to 1. Non-positive or non-finite totals fall back to equal
    /// weights.
    pub fn normalized(&self) -> [f64; 4] {
        let raw = [
            self.gender.max(0.0),
            self.academic.max(0.0),
            self.behavioral.max(0.0),
            self.special_needs.max(0.0),
        ];
        let sum: f64 = raw.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return [0.25; 4];
        }
        raw.map(|w| w / sum)
    }
}

/// Composition summary of one class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassProfile {
    pub size: usize,
    pub male: usize,
    pub female: usize,
    pub other: usize,
    pub special_needs: usize,
    pub iep: usize,
    pub plan_504: usize,
    pub academic_mean: f64,
    pub behavioral_mean: f64,
    pub academic_bands: BTreeMap<LevelBand, usize>,
    pub behavioral_bands: BTreeMap<LevelBand, usize>,
}

impl ClassProfile {
    pub fn from_members(members: &[&Student]) -> Self {
        let mut profile = Self {
            size: members.len(),
            ..Default::default()
        };
        let mut academic_sum = 0.0;
        let mut behavioral_sum = 0.0;

        for s in members {
            match s.gender {
                Gender::Male => profile.male += 1,
                Gender::Female => profile.female += 1,
                Gender::Other => profile.other += 1,
            }
            if s.has_special_needs() {
                profile.special_needs += 1;
            }
            if s.has_iep() {
                profile.iep += 1;
            }
            if s.has_504() {
                profile.plan_504 += 1;
            }
            academic_sum += s.academic_level.as_f64();
            behavioral_sum += s.behavioral_level.as_f64();
            *profile
                .academic_bands
                .entry(s.academic_level.band())
                .or_insert(0) += 1;
            *profile
                .behavioral_bands
                .entry(s.behavioral_level.band())
                .or_insert(0) += 1;
        }

        let denom = profile.size.max(1) as f64;
        profile.academic_mean = academic_sum / denom;
        profile.behavioral_mean = behavioral_sum / denom;
        profile
    }

    /// Share of `gender` in percent.
    pub fn gender_pct(&self, gender: Gender) -> f64 {
        let count = match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
            Gender::Other => self.other,
        };
        percent(count, self.size)
    }

    pub fn academic_pct(&self, band: LevelBand) -> f64 {
        percent(self.academic_bands.get(&band).copied().unwrap_or(0), self.size)
    }

    pub fn behavioral_pct(&self, band: LevelBand) -> f64 {
        percent(
            self.behavioral_bands.get(&band).copied().unwrap_or(0),
            self.size,
        )
    }
}

fn percent(count: usize, total: usize) -> f64 {
    count as f64 * 100.0 / total.max(1) as f64
}

/// Scores buckets against a fixed roster.
#[derive(Debug, Clone)]
pub struct BalanceScorer<'a> {
    index: HashMap<&'a str, &'a Student>,
    total_students: usize,
    total_special_needs: usize,
    weights: BalanceWeights,
}

impl<'a> BalanceScorer<'a> {
    /// Creates a scorer for the full roster of a run.
    pub fn new(all_students: &'a [Student], weights: BalanceWeights) -> Self {
        Self {
            index: all_students.iter().map(|s| (s.id.as_str(), s)).collect(),
            total_students: all_students.len(),
            total_special_needs: all_students.iter().filter(|s| s.has_special_needs()).count(),
            weights,
        }
    }

    pub fn weights(&self) -> &BalanceWeights {
        &self.weights
    }

    pub fn student(&self, id: &str) -> Option<&'a Student> {
        self.index.get(id).copied()
    }

    /// Resolves a bucket's IDs to students. Unknown IDs are skipped.
    pub fn members(&self, student_ids: &[String]) -> Vec<&'a Student> {
        student_ids
            .iter()
            .filter_map(|id| self.student(id))
            .collect()
    }

    /// Scores one bucket.
    pub fn score(&self, bucket: &ClassBucket) -> BalanceScores {
        self.score_members(&self.members(&bucket.student_ids))
    }

    /// Scores an explicit member list.
    pub fn score_members(&self, members: &[&Student]) -> BalanceScores {
        let gender = gender_balance(members);
        let academic = spread_balance(members.iter().map(|s| s.academic_level.as_f64()));
        let behavioral = spread_balance(members.iter().map(|s| s.behavioral_level.as_f64()));
        let special_needs = self.special_needs_balance(members);

        let [wg, wa, wb, ws] = self.weights.normalized();
        let overall = wg * gender + wa * academic + wb * behavioral + ws * special_needs;

        BalanceScores {
            gender: round2(gender),
            academic: round2(academic),
            behavioral: round2(behavioral),
            special_needs: round2(special_needs),
            overall: round2(overall.clamp(0.0, 1.0)),
        }
    }

    /// Recomputes `balance` on every bucket.
    pub fn score_all(&self, buckets: &mut [ClassBucket]) {
        for bucket in buckets.iter_mut() {
            bucket.balance = self.score(bucket);
        }
    }

    fn special_needs_balance(&self, members: &[&Student]) -> f64 {
        let share = self.total_special_needs as f64 / self.total_students.max(1) as f64;
        let expected = share * members.len() as f64;
        if expected <= 0.0 {
            return 1.0;
        }
        let actual = members.iter().filter(|s| s.has_special_needs()).count() as f64;
        1.0 - ((actual - expected).abs() / expected).min(1.0)
    }
}

fn gender_balance(members: &[&Student]) -> f64 {
    let male = members.iter().filter(|s| s.gender == Gender::Male).count();
    let female = members.iter().filter(|s| s.gender == Gender::Female).count();
    if male + female < 2 {
        return 1.0;
    }
    male.min(female) as f64 / male.max(female).max(1) as f64
}

fn spread_balance(levels: impl Iterator<Item = f64>) -> f64 {
    (1.0 - std_dev(levels) / MAX_LEVEL_SPREAD).clamp(0.0, 1.0)
}

/// Population standard deviation; 0 for an empty sequence.
pub(crate) fn std_dev(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
