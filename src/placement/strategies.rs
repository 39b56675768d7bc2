//! Built-in placement strategies.
//!
//! Each strategy distributes the students left over after together
//! groups are placed. All of them are deterministic: ties always fall to
//! the lower bucket index and to roster order.
//!
//! | Strategy | Idea |
//! |----------|------|
//! | `Balanced` | Strongest first into the emptiest bucket, avoiding separations |
//! | `AcademicFocus` | Round-robin within each academic level |
//! | `ParentRequests` | Requesters join a preferred classmate's bucket |
//! | `RoundRobin` | Plain rotation, no optimization |

use std::collections::BTreeMap;

use tracing::warn;

use super::{PlacementState, PlacementStrategy};
use crate::models::Student;
use crate::resolver::ResolvedConstraints;

/// Highest academic level first; each student goes to the least-populated
/// bucket that holds nobody they must be separated from.
///
/// When every bucket holds a separated peer, the student is forced into
/// the least-populated bucket and the violation is left for the run audit.
#[derive(Debug, Clone, Copy)]
pub struct Balanced;

impl PlacementStrategy for Balanced {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn place(
        &self,
        remaining: &[&Student],
        state: &mut PlacementState,
        constraints: &ResolvedConstraints,
    ) {
        let mut ordered = remaining.to_vec();
        // Stable: equal levels keep roster order.
        ordered.sort_by(|a, b| b.academic_level.cmp(&a.academic_level));

        for student in ordered {
            let target = state.least_populated_without_conflict(student, constraints);
            state.assign(&student.id, target);
        }
    }

    fn description(&self) -> &'static str {
        "Academic-descending fill of the least-populated bucket"
    }
}

/// Groups students by academic level (highest first) and rotates each
/// level across buckets by position modulo the class count.
#[derive(Debug, Clone, Copy)]
pub struct AcademicFocus;

impl PlacementStrategy for AcademicFocus {
    fn name(&self) -> &'static str {
        "academic_focus"
    }

    fn place(
        &self,
        remaining: &[&Student],
        state: &mut PlacementState,
        _constraints: &ResolvedConstraints,
    ) {
        let mut by_level: BTreeMap<u8, Vec<&Student>> = BTreeMap::new();
        for &s in remaining {
            by_level.entry(s.academic_level.value()).or_default().push(s);
        }

        let k = state.class_count();
        for (_, level) in by_level.into_iter().rev() {
            for (i, student) in level.into_iter().enumerate() {
                state.assign(&student.id, i % k);
            }
        }
    }

    fn description(&self) -> &'static str {
        "Per-level round-robin"
    }
}

/// Students with a preferred-classmate request go first and join the
/// first non-full bucket holding one of their preferred classmates.
///
/// A target bucket is skipped when it holds someone the student must be
/// separated from or asked to avoid. Everyone else, and requesters with no
/// usable target, fill the least-populated bucket.
#[derive(Debug, Clone, Copy)]
pub struct ParentRequests;

impl PlacementStrategy for ParentRequests {
    fn name(&self) -> &'static str {
        "parent_requests_priority"
    }

    fn place(
        &self,
        remaining: &[&Student],
        state: &mut PlacementState,
        constraints: &ResolvedConstraints,
    ) {
        let (requesters, others): (Vec<&Student>, Vec<&Student>) =
            remaining.iter().partition(|s| s.has_peer_request());

        for student in requesters {
            let target = student
                .preferred_peers
                .iter()
                .filter_map(|peer| state.bucket_of(peer))
                .find(|&idx| {
                    !state.bucket(idx).is_full()
                        && !state.has_conflict(student, idx, constraints)
                        && !student
                            .avoid_peers
                            .iter()
                            .any(|p| state.bucket(idx).contains(p))
                });
            let target = match target {
                Some(idx) => idx,
                None => state.least_populated_without_conflict(student, constraints),
            };
            state.assign(&student.id, target);
        }

        for student in others {
            let target = state.least_populated_without_conflict(student, constraints);
            state.assign(&student.id, target);
        }
    }

    fn description(&self) -> &'static str {
        "Preferred-classmate requests first"
    }
}

/// Plain rotation by position modulo the class count.
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin;

impl PlacementStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "default"
    }

    fn place(
        &self,
        remaining: &[&Student],
        state: &mut PlacementState,
        _constraints: &ResolvedConstraints,
    ) {
        let k = state.class_count();
        for (i, student) in remaining.iter().enumerate() {
            state.assign(&student.id, i % k);
        }
    }

    fn description(&self) -> &'static str {
        "Round-robin without optimization"
    }
}

impl PlacementState {
    /// The least-populated bucket holding none of the student's separated
    /// peers, or the least-populated bucket overall if every one does.
    pub(crate) fn least_populated_without_conflict(
        &self,
        student: &Student,
        constraints: &ResolvedConstraints,
    ) -> usize {
        if let Some(idx) = self
            .by_population()
            .into_iter()
            .find(|&idx| !self.has_conflict(student, idx, constraints))
        {
            return idx;
        }

        let forced = self.least_populated();
        warn!(
            event = "separation_overridden",
            student = %student.id,
            class = %self.bucket(forced).id,
            "no class is free of separated peers"
        );
        forced
    }

    /// The least-populated bucket where no group member has a separated
    /// peer, or the least-populated bucket overall if every one has.
    pub(crate) fn least_populated_for_group(
        &self,
        members: &[String],
        constraints: &ResolvedConstraints,
    ) -> usize {
        let conflicts = |idx: usize| {
            members.iter().any(|m| {
                constraints
                    .separated_from(m)
                    .is_some_and(|peers| peers.iter().any(|p| self.bucket_of(p) == Some(idx)))
            })
        };
        if let Some(idx) = self.by_population().into_iter().find(|&idx| !conflicts(idx)) {
            return idx;
        }

        let forced = self.least_populated();
        warn!(
            event = "separation_overridden",
            group = ?members,
            class = %self.bucket(forced).id,
            "no class is free of separated peers"
        );
        forced
    }
}
