//! Constraint resolution.
//!
//! Turns the flat constraint list into the indexed form the placement
//! engine consumes:
//!
//! - **Together groups**: overlapping `must_be_together` groups are merged
//!   into connected components, so "A with B" and "B with C" places A, B, C
//!   in one class.
//! - **Separate groups**: every pair inside a `must_be_separate` group must
//!   be split.
//! - **Teacher preferences**: per-student preferred/avoided teachers.
//! - **Directives**: emphasized balance factors and the equal-size flag.
//!
//! # Ordering
//! Competing constraints are ordered `required > high > medium > low`;
//! equal priorities keep input (creation) order.
//!
//! # Conflicts
//! A separate pair whose two members land in the same together component
//! (directly or through a chain) is rejected with
//! [`PlacementError::Conflict`] before any placement work starts.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlacementError, Result};
use crate::models::{BalanceFactor, Constraint, ConstraintKind, Priority};

/// A set of two or more students bound by a grouping rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Members, in first-mention order.
    pub students: Vec<String>,
    /// Strongest priority among the contributing constraints.
    pub priority: Priority,
    /// Input position of the earliest contributing constraint.
    pub order: usize,
}

/// Teachers a student asked for or asked to avoid, strongest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherPreference {
    pub preferred: Vec<String>,
    pub avoided: Vec<String>,
}

/// Indexed constraints for one placement run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConstraints {
    /// Merged together components, strongest first.
    pub together: Vec<Group>,
    /// Separate groups, strongest first.
    pub separate: Vec<Group>,
    /// Per-student teacher preferences.
    pub teacher_prefs: BTreeMap<String, TeacherPreference>,
    /// Balance factors named by distribution directives (deduplicated).
    pub emphasized: Vec<BalanceFactor>,
    /// Whether an equal-class-size directive was given.
    pub equal_class_size: bool,
    /// Number of constraints consumed.
    pub applied: usize,
    separation: HashMap<String, BTreeSet<String>>,
    constrained: HashSet<String>,
}

impl ResolvedConstraints {
    /// Students `student_id` must not share a class with.
    pub fn separated_from(&self, student_id: &str) -> Option<&BTreeSet<String>> {
        self.separation.get(student_id)
    }

    /// Whether two students must be kept apart.
    pub fn must_separate(&self, a: &str, b: &str) -> bool {
        self.separation
            .get(a)
            .is_some_and(|peers| peers.contains(b))
    }

    /// Whether the student appears in any together/separate rule.
    pub fn is_constrained(&self, student_id: &str) -> bool {
        self.constrained.contains(student_id)
    }

    /// Every unordered separate pair once, as `(smaller, larger)`.
    pub fn separate_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = BTreeSet::new();
        for (a, peers) in &self.separation {
            for b in peers {
                let pair = if a.as_str() < b.as_str() {
                    (a.as_str(), b.as_str())
                } else {
                    (b.as_str(), a.as_str())
                };
                pairs.insert(pair);
            }
        }
        pairs.into_iter().collect()
    }

    pub fn is_emphasized(&self, factor: BalanceFactor) -> bool {
        self.emphasized.contains(&factor)
    }
}

/// Resolves a constraint list.
///
/// # Errors
/// [`PlacementError::Conflict`] if any student pair is both required
/// together and required apart.
pub fn resolve(constraints: &[Constraint]) -> Result<ResolvedConstraints> {
    let mut ordered: Vec<(usize, &Constraint)> = constraints.iter().enumerate().collect();
    // Stable: equal priorities keep creation order.
    ordered.sort_by(|a, b| b.1.priority.cmp(&a.1.priority));

    let mut together_raw = Vec::new();
    let mut separate = Vec::new();
    let mut resolved = ResolvedConstraints {
        applied: constraints.len(),
        ..Default::default()
    };

    for &(order, c) in &ordered {
        match &c.kind {
            ConstraintKind::MustBeTogether { students } => {
                together_raw.push(make_group(students, c.priority, order));
            }
            ConstraintKind::MustBeSeparate { students } => {
                separate.push(make_group(students, c.priority, order));
            }
            ConstraintKind::PreferredTeacher { student, teacher } => {
                let pref = resolved.teacher_prefs.entry(student.clone()).or_default();
                if !pref.preferred.contains(teacher) {
                    pref.preferred.push(teacher.clone());
                }
            }
            ConstraintKind::AvoidTeacher { student, teacher } => {
                let pref = resolved.teacher_prefs.entry(student.clone()).or_default();
                if !pref.avoided.contains(teacher) {
                    pref.avoided.push(teacher.clone());
                }
            }
            ConstraintKind::BalancedDistribution { factor } => {
                if !resolved.emphasized.contains(factor) {
                    resolved.emphasized.push(*factor);
                }
            }
            ConstraintKind::EqualClassSize => resolved.equal_class_size = true,
        }
    }

    let (together, owner) = merge_components(together_raw);

    for group in &separate {
        for (i, a) in group.students.iter().enumerate() {
            for b in &group.students[i + 1..] {
                if let (Some(ca), Some(cb)) = (owner.get(a), owner.get(b)) {
                    if ca == cb {
                        return Err(PlacementError::Conflict {
                            first: a.clone(),
                            second: b.clone(),
                        });
                    }
                }
                resolved
                    .separation
                    .entry(a.clone())
                    .or_default()
                    .insert(b.clone());
                resolved
                    .separation
                    .entry(b.clone())
                    .or_default()
                    .insert(a.clone());
            }
        }
    }

    resolved.constrained = together
        .iter()
        .chain(separate.iter())
        .flat_map(|g| g.students.iter().cloned())
        .collect();
    resolved.together = together;
    resolved.separate = separate;

    debug!(
        event = "constraints_resolved",
        together_groups = resolved.together.len(),
        separate_groups = resolved.separate.len(),
        teacher_prefs = resolved.teacher_prefs.len(),
    );

    Ok(resolved)
}

fn make_group(students: &[String], priority: Priority, order: usize) -> Group {
    let mut seen = HashSet::new();
    Group {
        students: students
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect(),
        priority,
        order,
    }
}

/// Merges overlapping groups. Input must already be priority-ordered.
///
/// Returns the components and a student → component index map.
fn merge_components(groups: Vec<Group>) -> (Vec<Group>, HashMap<String, usize>) {
    let mut components: Vec<Group> = Vec::new();
    let mut owner: HashMap<String, usize> = HashMap::new();

    for group in groups {
        let mut hits: Vec<usize> = group
            .students
            .iter()
            .filter_map(|s| owner.get(s).copied())
            .collect();
        hits.sort_unstable();
        hits.dedup();

        let target = match hits.first() {
            Some(&t) => t,
            None => {
                components.push(Group {
                    students: Vec::new(),
                    priority: group.priority,
                    order: group.order,
                });
                components.len() - 1
            }
        };

        for &other in hits.iter().skip(1) {
            let moved = std::mem::take(&mut components[other].students);
            let (priority, order) = (components[other].priority, components[other].order);
            for s in moved {
                owner.insert(s.clone(), target);
                components[target].students.push(s);
            }
            let merged = &mut components[target];
            merged.priority = merged.priority.max(priority);
            merged.order = merged.order.min(order);
        }

        let merged = &mut components[target];
        merged.priority = merged.priority.max(group.priority);
        merged.order = merged.order.min(group.order);
        for s in group.students {
            if owner.get(&s) != Some(&target) {
                owner.insert(s.clone(), target);
                components[target].students.push(s);
            }
        }
    }

    // Reindex after dropping emptied components.
    let mut result = Vec::new();
    let mut remap = HashMap::new();
    for (old, comp) in components.into_iter().enumerate() {
        if !comp.students.is_empty() {
            remap.insert(old, result.len());
            result.push(comp);
        }
    }
    for idx in owner.values_mut() {
        if let Some(&new) = remap.get(idx) {
            *idx = new;
        }
    }

    // Stable: merged components keep the earlier creation order on ties.
    let mut indexed: Vec<(usize, Group)> = result.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| {
        b.1.priority
            .cmp(&a.1.priority)
            .then(a.1.order.cmp(&b.1.order))
    });
    let position: HashMap<usize, usize> = indexed
        .iter()
        .enumerate()
        .map(|(new, (old, _))| (*old, new))
        .collect();
    for idx in owner.values_mut() {
        if let Some(&new) = position.get(idx) {
            *idx = new;
        }
    }

    (indexed.into_iter().map(|(_, g)| g).collect(), owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let r = resolve(&[]).unwrap();
        assert!(r.together.is_empty());
        assert!(r.separate.is_empty());
        assert_eq!(r.applied, 0);
        assert!(!r.equal_class_size);
    }

    #[test]
    fn test_groups_indexed() {
        let constraints = vec![
            Constraint::together(["S1", "S2"]),
            Constraint::separate(["S3", "S4", "S5"]),
        ];
        let r = resolve(&constraints).unwrap();
        assert_eq!(r.together.len(), 1);
        assert_eq!(r.together[0].students, vec!["S1", "S2"]);
        assert!(r.must_separate("S3", "S5"));
        assert!(r.must_separate("S5", "S4"));
        assert!(!r.must_separate("S1", "S3"));
        assert_eq!(r.separate_pairs().len(), 3);
        assert!(r.is_constrained("S1"));
        assert!(r.is_constrained("S4"));
        assert!(!r.is_constrained("S9"));
    }

    #[test]
    fn test_direct_conflict() {
        let constraints = vec![
            Constraint::together(["S1", "S2"]),
            Constraint::separate(["S2", "S1"]),
        ];
        match resolve(&constraints) {
            Err(PlacementError::Conflict { first, second }) => {
                assert_eq!((first.as_str(), second.as_str()), ("S2", "S1"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_transitive_conflict() {
        // S1~S2, S2~S3 → S1, S3 implied together.
        let constraints = vec![
            Constraint::together(["S1", "S2"]),
            Constraint::together(["S2", "S3"]),
            Constraint::separate(["S1", "S3"]),
        ];
        assert!(matches!(
            resolve(&constraints),
            Err(PlacementError::Conflict { .. })
        ));
    }

    #[test]
    fn test_overlapping_groups_merged() {
        let constraints = vec![
            Constraint::together(["S1", "S2"]),
            Constraint::together(["S3", "S4"]),
            Constraint::together(["S2", "S3"]).with_priority(Priority::Required),
        ];
        let r = resolve(&constraints).unwrap();
        assert_eq!(r.together.len(), 1);
        let members: BTreeSet<&str> = r.together[0].students.iter().map(String::as_str).collect();
        assert_eq!(members, BTreeSet::from(["S1", "S2", "S3", "S4"]));
        assert_eq!(r.together[0].priority, Priority::Required);
        assert_eq!(r.together[0].order, 0);
    }

    #[test]
    fn test_priority_ordering_stable() {
        let constraints = vec![
            Constraint::together(["A1", "A2"]).with_priority(Priority::Low),
            Constraint::together(["B1", "B2"]),
            Constraint::together(["C1", "C2"]).with_priority(Priority::Required),
            Constraint::together(["D1", "D2"]),
        ];
        let r = resolve(&constraints).unwrap();
        let firsts: Vec<&str> = r.together.iter().map(|g| g.students[0].as_str()).collect();
        assert_eq!(firsts, vec!["C1", "B1", "D1", "A1"]);
    }

    #[test]
    fn test_teacher_preferences_ordered() {
        let constraints = vec![
            Constraint::preferred_teacher("S1", "T1").with_priority(Priority::Low),
            Constraint::preferred_teacher("S1", "T2").with_priority(Priority::High),
            Constraint::avoid_teacher("S1", "T3"),
            Constraint::avoid_teacher("S1", "T3"),
        ];
        let r = resolve(&constraints).unwrap();
        let pref = &r.teacher_prefs["S1"];
        assert_eq!(pref.preferred, vec!["T2", "T1"]);
        assert_eq!(pref.avoided, vec!["T3"]);
        assert_eq!(r.applied, 4);
    }

    #[test]
    fn test_directives() {
        let constraints = vec![
            Constraint::balanced(BalanceFactor::Gender),
            Constraint::balanced(BalanceFactor::Gender),
            Constraint::equal_class_size(),
        ];
        let r = resolve(&constraints).unwrap();
        assert_eq!(r.emphasized, vec![BalanceFactor::Gender]);
        assert!(r.is_emphasized(BalanceFactor::Gender));
        assert!(!r.is_emphasized(BalanceFactor::Academic));
        assert!(r.equal_class_size);
    }
}
