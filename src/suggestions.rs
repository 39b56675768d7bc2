//! Post-placement improvement suggestions.
//!
//! Looks at every pair of classes of similar size and proposes single
//! swaps or moves that would reduce one kind of imbalance:
//!
//! | Focus | Trigger | Proposal |
//! |-------|---------|----------|
//! | Gender | one class male-skewed, the other female-skewed | swap a boy and a girl |
//! | Academic | mean level gap > threshold | swap the strongest of the higher class with the weakest of the lower |
//! | Behavioral | same as academic, on behavioral levels | same |
//! | Special needs | count gap >= threshold | move one student to the lower-count class |
//!
//! Only students outside every together/separate rule are ever proposed,
//! so no suggestion can break a grouping constraint. Nothing is applied.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::balance::{round2, BalanceScorer, BalanceWeights, ClassProfile};
use crate::models::{BalanceFactor, BalanceScores, ClassBucket, Constraint, Gender, Student};

/// Whether a suggestion exchanges two students or relocates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Swap,
    Move,
}

/// Estimated change per dimension, as the shift in the two classes' mean
/// score if the suggestion were applied. Positive = better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub gender: f64,
    pub academic: f64,
    pub behavioral: f64,
    pub special_needs: f64,
    pub overall: f64,
}

/// A proposed single change to a finished placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    /// The imbalance this change targets.
    pub focus: BalanceFactor,
    /// Moving student first; for swaps, the partner second.
    pub students: Vec<String>,
    pub from_class: String,
    pub to_class: String,
    pub reason: String,
    pub impact: Impact,
}

/// Generates swap/move suggestions.
#[derive(Debug, Clone)]
pub struct SuggestionGenerator {
    max_suggestions: usize,
    max_size_gap: usize,
    level_gap: f64,
    special_needs_gap: usize,
    weights: BalanceWeights,
}

impl SuggestionGenerator {
    pub fn new() -> Self {
        Self {
            max_suggestions: 5,
            max_size_gap: 3,
            level_gap: 0.5,
            special_needs_gap: 2,
            weights: BalanceWeights::default(),
        }
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Class pairs whose sizes differ by more than this are not compared.
    pub fn with_max_size_gap(mut self, gap: usize) -> Self {
        self.max_size_gap = gap;
        self
    }

    /// Minimum mean-level gap that triggers an academic/behavioral swap.
    pub fn with_level_gap(mut self, gap: f64) -> Self {
        self.level_gap = gap;
        self
    }

    /// Minimum special-needs count gap that triggers a move.
    pub fn with_special_needs_gap(mut self, gap: usize) -> Self {
        self.special_needs_gap = gap;
        self
    }

    pub fn with_weights(mut self, weights: BalanceWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Proposes up to `max_suggestions` changes, best overall impact first.
    pub fn suggest(
        &self,
        classes: &[ClassBucket],
        students: &[Student],
        constraints: &[Constraint],
    ) -> Vec<Suggestion> {
        let constrained: HashSet<&str> = constraints
            .iter()
            .filter(|c| c.is_grouping())
            .flat_map(|c| c.students())
            .collect();
        let scorer = BalanceScorer::new(students, self.weights);
        let members: Vec<Vec<&Student>> = classes
            .iter()
            .map(|c| scorer.members(&c.student_ids))
            .collect();
        let free = |s: &&Student| !constrained.contains(s.id.as_str());

        let mut suggestions = Vec::new();
        for a in 0..classes.len() {
            for b in a + 1..classes.len() {
                if classes[a].size().abs_diff(classes[b].size()) > self.max_size_gap {
                    continue;
                }
                let ctx = PairContext {
                    classes,
                    members: &members,
                    scorer: &scorer,
                    a,
                    b,
                };
                let pa = ClassProfile::from_members(&members[a]);
                let pb = ClassProfile::from_members(&members[b]);

                if let Some(s) = self.gender_swap(&ctx, &pa, &pb, &free) {
                    suggestions.push(s);
                }
                if let Some(s) = self.level_swap(&ctx, &pa, &pb, BalanceFactor::Academic, &free) {
                    suggestions.push(s);
                }
                if let Some(s) = self.level_swap(&ctx, &pa, &pb, BalanceFactor::Behavioral, &free)
                {
                    suggestions.push(s);
                }
                if let Some(s) = self.special_needs_move(&ctx, &pa, &pb, &free) {
                    suggestions.push(s);
                }
            }
        }

        // Stable: equal impact keeps pair/focus order.
        suggestions.sort_by(|x, y| y.impact.overall.total_cmp(&x.impact.overall));
        suggestions.truncate(self.max_suggestions);
        debug!(event = "suggestions_generated", count = suggestions.len());
        suggestions
    }

    fn gender_swap(
        &self,
        ctx: &PairContext<'_, '_>,
        pa: &ClassProfile,
        pb: &ClassProfile,
        free: &impl Fn(&&Student) -> bool,
    ) -> Option<Suggestion> {
        let (from, to) = if pa.male > pa.female && pb.female > pb.male {
            (ctx.a, ctx.b)
        } else if pa.female > pa.male && pb.male > pb.female {
            (ctx.b, ctx.a)
        } else {
            return None;
        };
        // `from` is the male-skewed class.
        let boy = ctx.members[from]
            .iter()
            .find(|s| s.gender == Gender::Male && free(*s))?;
        let girl = ctx.members[to]
            .iter()
            .find(|s| s.gender == Gender::Female && free(*s))?;

        let reason = format!(
            "Swap {} (male) in {} with {} (female) in {} to even out the gender mix",
            boy.id, ctx.classes[from].name, girl.id, ctx.classes[to].name
        );
        Some(ctx.swap(from, *boy, to, *girl, BalanceFactor::Gender, reason))
    }

    fn level_swap(
        &self,
        ctx: &PairContext<'_, '_>,
        pa: &ClassProfile,
        pb: &ClassProfile,
        focus: BalanceFactor,
        free: &impl Fn(&&Student) -> bool,
    ) -> Option<Suggestion> {
        let (level, mean_a, mean_b) = match focus {
            BalanceFactor::Behavioral => (
                behavioral_value as fn(&Student) -> u8,
                pa.behavioral_mean,
                pb.behavioral_mean,
            ),
            _ => (
                academic_value as fn(&Student) -> u8,
                pa.academic_mean,
                pb.academic_mean,
            ),
        };
        if (mean_a - mean_b).abs() <= self.level_gap {
            return None;
        }
        let (high, low) = if mean_a > mean_b {
            (ctx.a, ctx.b)
        } else {
            (ctx.b, ctx.a)
        };

        // First max / first min in bucket order.
        let strong = ctx.members[high]
            .iter()
            .filter(|s| free(*s))
            .fold(None::<&&Student>, |best, s| match best {
                Some(b) if level(b) >= level(s) => Some(b),
                _ => Some(s),
            })?;
        let weak = ctx.members[low]
            .iter()
            .filter(|s| free(*s))
            .fold(None::<&&Student>, |best, s| match best {
                Some(b) if level(b) <= level(s) => Some(b),
                _ => Some(s),
            })?;
        if level(strong) <= level(weak) {
            return None;
        }

        let label = if focus == BalanceFactor::Behavioral {
            "behavioral"
        } else {
            "academic"
        };
        let reason = format!(
            "Swap {} ({label} {}) in {} with {} ({label} {}) in {} to narrow the {label} gap",
            strong.id,
            level(strong),
            ctx.classes[high].name,
            weak.id,
            level(weak),
            ctx.classes[low].name
        );
        Some(ctx.swap(high, *strong, low, *weak, focus, reason))
    }

    fn special_needs_move(
        &self,
        ctx: &PairContext<'_, '_>,
        pa: &ClassProfile,
        pb: &ClassProfile,
        free: &impl Fn(&&Student) -> bool,
    ) -> Option<Suggestion> {
        if pa.special_needs.abs_diff(pb.special_needs) < self.special_needs_gap {
            return None;
        }
        let (from, to) = if pa.special_needs > pb.special_needs {
            (ctx.a, ctx.b)
        } else {
            (ctx.b, ctx.a)
        };
        let student = ctx.members[from]
            .iter()
            .find(|s| s.has_special_needs() && free(*s))?;

        let mut from_after = ctx.members[from].clone();
        from_after.retain(|s| s.id != student.id);
        let mut to_after = ctx.members[to].clone();
        to_after.push(*student);

        Some(Suggestion {
            kind: SuggestionKind::Move,
            focus: BalanceFactor::SpecialNeeds,
            students: vec![student.id.clone()],
            from_class: ctx.classes[from].id.clone(),
            to_class: ctx.classes[to].id.clone(),
            reason: format!(
                "Move {} from {} to {} to spread special-needs support",
                student.id, ctx.classes[from].name, ctx.classes[to].name
            ),
            impact: ctx.impact(from, to, &from_after, &to_after),
        })
    }
}

impl Default for SuggestionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

struct PairContext<'c, 's> {
    classes: &'c [ClassBucket],
    members: &'c [Vec<&'s Student>],
    scorer: &'c BalanceScorer<'s>,
    a: usize,
    b: usize,
}

impl<'c, 's> PairContext<'c, 's> {
    fn swap(
        &self,
        from: usize,
        outgoing: &'s Student,
        to: usize,
        incoming: &'s Student,
        focus: BalanceFactor,
        reason: String,
    ) -> Suggestion {
        let replace = |list: &[&'s Student], out: &str, inc: &'s Student| -> Vec<&'s Student> {
            list.iter()
                .map(|s| if s.id == out { inc } else { *s })
                .collect()
        };
        let from_after = replace(&self.members[from][..], outgoing.id.as_str(), incoming);
        let to_after = replace(&self.members[to][..], incoming.id.as_str(), outgoing);

        Suggestion {
            kind: SuggestionKind::Swap,
            focus,
            students: vec![outgoing.id.clone(), incoming.id.clone()],
            from_class: self.classes[from].id.clone(),
            to_class: self.classes[to].id.clone(),
            reason,
            impact: self.impact(from, to, &from_after, &to_after),
        }
    }

    fn impact(
        &self,
        from: usize,
        to: usize,
        from_after: &[&Student],
        to_after: &[&Student],
    ) -> Impact {
        let before = mean_scores(
            self.scorer.score_members(&self.members[from]),
            self.scorer.score_members(&self.members[to]),
        );
        let after = mean_scores(
            self.scorer.score_members(from_after),
            self.scorer.score_members(to_after),
        );
        Impact {
            gender: round2(after.gender - before.gender),
            academic: round2(after.academic - before.academic),
            behavioral: round2(after.behavioral - before.behavioral),
            special_needs: round2(after.special_needs - before.special_needs),
            overall: round2(after.overall - before.overall),
        }
    }
}

fn academic_value(s: &Student) -> u8 {
    s.academic_level.value()
}

fn behavioral_value(s: &Student) -> u8 {
    s.behavioral_level.value()
}

fn mean_scores(x: BalanceScores, y: BalanceScores) -> BalanceScores {
    BalanceScores {
        gender: (x.gender + y.gender) / 2.0,
        academic: (x.academic + y.academic) / 2.0,
        behavioral: (x.behavioral + y.behavioral) / 2.0,
        special_needs: (x.special_needs + y.special_needs) / 2.0,
        overall: (x.overall + y.overall) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassCapacity, SupportPlan};

    fn bucket(idx: usize, ids: &[&str]) -> ClassBucket {
        ClassBucket::new(idx, ClassCapacity::new(0, 10, 12)).with_students(ids.iter().copied())
    }

    fn s(id: &str, gender: Gender, academic: u8, behavioral: u8) -> Student {
        Student::new(id, 3, gender)
            .with_academic(academic)
            .with_behavioral(behavioral)
    }

    #[test]
    fn test_gender_swap_proposed() {
        let students = vec![
            s("B1", Gender::Male, 3, 3),
            s("B2", Gender::Male, 3, 3),
            s("B3", Gender::Male, 3, 3),
            s("B4", Gender::Male, 3, 3),
            s("G1", Gender::Female, 3, 3),
            s("G2", Gender::Female, 3, 3),
            s("G3", Gender::Female, 3, 3),
            s("G4", Gender::Female, 3, 3),
        ];
        let classes = vec![
            bucket(0, &["B1", "B2", "B3", "G1"]),
            bucket(1, &["G2", "G3", "G4", "B4"]),
        ];

        let out = SuggestionGenerator::new().suggest(&classes, &students, &[]);
        assert_eq!(out.len(), 1);
        let sug = &out[0];
        assert_eq!(sug.kind, SuggestionKind::Swap);
        assert_eq!(sug.focus, BalanceFactor::Gender);
        assert_eq!(sug.students, vec!["B1", "G2"]);
        assert_eq!(sug.from_class, "class-1");
        assert_eq!(sug.to_class, "class-2");
        assert!(sug.impact.gender > 0.0);
    }

    #[test]
    fn test_constrained_students_never_proposed() {
        let students = vec![
            s("B1", Gender::Male, 3, 3),
            s("B2", Gender::Male, 3, 3),
            s("G1", Gender::Female, 3, 3),
            s("G2", Gender::Female, 3, 3),
        ];
        let classes = vec![bucket(0, &["B1", "B2"]), bucket(1, &["G1", "G2"])];
        let constraints = vec![Constraint::separate(["G1", "B1"])];
        let out = SuggestionGenerator::new().suggest(&classes, &students, &constraints);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].students, vec!["B2".to_string(), "G2".to_string()]);

        let constraints = vec![Constraint::together(["G1", "G2"]), Constraint::together(["B1", "B2"])];
        let out = SuggestionGenerator::new().suggest(&classes, &students, &constraints);
        assert!(out.is_empty());
    }

    #[test]
    fn test_academic_swap_extremes() {
        let students = vec![
            s("H1", Gender::Male, 5, 3),
            s("H2", Gender::Female, 4, 3),
            s("L1", Gender::Male, 1, 3),
            s("L2", Gender::Female, 2, 3),
        ];
        let classes = vec![bucket(0, &["H2", "H1"]), bucket(1, &["L2", "L1"])];
        let out = SuggestionGenerator::new().suggest(&classes, &students, &[]);
        let academic: Vec<&Suggestion> = out
            .iter()
            .filter(|x| x.focus == BalanceFactor::Academic)
            .collect();
        assert_eq!(academic.len(), 1);
        assert_eq!(academic[0].students, vec!["H1", "L1"]);
        assert!(academic[0].reason.contains("academic 5"));
    }

    #[test]
    fn test_small_gap_ignored() {
        let students = vec![
            s("A", Gender::Male, 3, 3),
            s("B", Gender::Female, 4, 3),
            s("C", Gender::Male, 3, 3),
            s("D", Gender::Female, 3, 3),
        ];
        // Means 3.5 vs 3.0 → gap 0.5, not above threshold.
        let classes = vec![bucket(0, &["A", "B"]), bucket(1, &["C", "D"])];
        let out = SuggestionGenerator::new().suggest(&classes, &students, &[]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_behavioral_swap() {
        let students = vec![
            s("A", Gender::Male, 3, 5),
            s("B", Gender::Female, 3, 5),
            s("C", Gender::Male, 3, 1),
            s("D", Gender::Female, 3, 2),
        ];
        let classes = vec![bucket(0, &["A", "B"]), bucket(1, &["C", "D"])];
        let out = SuggestionGenerator::new().suggest(&classes, &students, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].focus, BalanceFactor::Behavioral);
        assert_eq!(out[0].students, vec!["A", "C"]);
    }

    #[test]
    fn test_special_needs_move() {
        let students = vec![
            s("A", Gender::Male, 3, 3).with_special_needs(SupportPlan::Iep),
            s("B", Gender::Female, 3, 3).with_special_needs(SupportPlan::Section504),
            s("C", Gender::Male, 3, 3),
            s("D", Gender::Female, 3, 3),
        ];
        let classes = vec![bucket(0, &["A", "B"]), bucket(1, &["C", "D"])];
        let out = SuggestionGenerator::new().suggest(&classes, &students, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, SuggestionKind::Move);
        assert_eq!(out[0].students, vec!["A"]);
        assert_eq!(out[0].to_class, "class-2");
        assert!(out[0].impact.special_needs > 0.0);
    }

    #[test]
    fn test_size_gap_skips_pair() {
        let students: Vec<Student> = (0..8)
            .map(|i| s(&format!("S{i}"), Gender::Male, 3, 3))
            .chain([s("G", Gender::Female, 3, 3), s("H", Gender::Female, 3, 3)])
            .collect();
        let classes = vec![
            bucket(0, &["S0", "S1", "S2", "S3", "S4", "S5", "S6", "G"]),
            bucket(1, &["H", "S7"]),
        ];
        let out = SuggestionGenerator::new().suggest(&classes, &students, &[]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_bounded_count() {
        let mut students = Vec::new();
        let mut classes = Vec::new();
        for c in 0..6 {
            let ids: Vec<String> = (0..4).map(|i| format!("C{c}S{i}")).collect();
            for (i, id) in ids.iter().enumerate() {
                let gender = if (c % 2 == 0) == (i < 3) {
                    Gender::Male
                } else {
                    Gender::Female
                };
                students.push(s(id, gender, 3, 3));
            }
            classes.push(bucket(c, &ids.iter().map(String::as_str).collect::<Vec<_>>()));
        }
        let out = SuggestionGenerator::new()
            .with_max_suggestions(3)
            .suggest(&classes, &students, &[]);
        assert_eq!(out.len(), 3);
    }
}
