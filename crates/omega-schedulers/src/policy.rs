use std::collections::BTreeMap;

use omega_cell::Snapshot;
use omega_resource_model::{MachineId, ResourceVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    FirstFit,
    BestFit,
    WorstFit,
}

impl Default for PlacementStrategy {
    fn default() -> Self {
        PlacementStrategy::BestFit
    }
}

/// A scheduler's local tentative-allocation overlay on top of a snapshot
/// (spec.md §4.2.1): tracks what this plan has provisionally committed to a
/// machine so far, so multiple tasks from the same job don't over-commit
/// one machine within a single transaction. Discarded after the transaction
/// is submitted.
pub struct Overlay<'a> {
    snapshot: &'a Snapshot,
    tentative: BTreeMap<MachineId, ResourceVector>,
}

impl<'a> Overlay<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            tentative: BTreeMap::new(),
        }
    }

    pub fn remaining(&self, machine_id: MachineId) -> Option<ResourceVector> {
        let view = self.snapshot.machine(machine_id)?;
        if !view.is_healthy() {
            return None;
        }
        let used = self.tentative.get(&machine_id).copied().unwrap_or(ResourceVector::ZERO);
        Some(view.remaining().saturating_sub(&used))
    }

    pub fn reserve(&mut self, machine_id: MachineId, requirement: ResourceVector) {
        let entry = self.tentative.entry(machine_id).or_insert(ResourceVector::ZERO);
        *entry = *entry + requirement;
    }
}

/// Picks a target machine for `requirement` among healthy machines with
/// enough remaining capacity in `overlay`, per `strategy` (spec.md
/// §4.2.1). Ties within best-fit/worst-fit broken by lowest machine id for
/// determinism, matching the service scheduler's tie-break rule.
pub fn select_machine(overlay: &Overlay, requirement: ResourceVector, strategy: PlacementStrategy) -> Option<MachineId> {
    let candidates = overlay
        .snapshot
        .machines()
        .filter_map(|(id, _view)| {
            let remaining = overlay.remaining(*id)?;
            requirement.fits(&remaining).then_some((*id, remaining))
        });

    match strategy {
        PlacementStrategy::FirstFit => candidates.map(|(id, _)| id).next(),
        PlacementStrategy::BestFit => candidates
            .min_by(|(id_a, rem_a), (id_b, rem_b)| {
                rem_a
                    .magnitude()
                    .partial_cmp(&rem_b.magnitude())
                    .unwrap()
                    .then_with(|| id_a.cmp(id_b))
            })
            .map(|(id, _)| id),
        PlacementStrategy::WorstFit => candidates
            .max_by(|(id_a, rem_a), (id_b, rem_b)| {
                rem_a
                    .magnitude()
                    .partial_cmp(&rem_b.magnitude())
                    .unwrap()
                    .then_with(|| id_b.cmp(id_a))
            })
            .map(|(id, _)| id),
    }
}

/// Service-placement scoring (spec.md §4.2.2). `tasks_already_on_domain`
/// counts tasks from the same job already placed in that machine's failure
/// domain *by this plan*, so the first placement on a new domain scores the
/// full diversity bonus.
pub fn service_score(
    remaining_cpu: f64,
    capacity_cpu: f64,
    tasks_on_machine: usize,
    tasks_already_on_domain: usize,
    wants_gpu: bool,
    machine_has_gpu: bool,
    hard_anti_affinity_violated: bool,
) -> f64 {
    if hard_anti_affinity_violated {
        return f64::NEG_INFINITY;
    }
    let headroom = if capacity_cpu > 0.0 { 100.0 * (remaining_cpu / capacity_cpu) } else { 0.0 };
    let load_penalty = -5.0 * tasks_on_machine as f64;
    let diversity = 20.0 / (tasks_already_on_domain + 1) as f64;
    let gpu_bonus = if wants_gpu && machine_has_gpu { 50.0 } else { 0.0 };
    headroom + load_penalty + diversity + gpu_bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_placement_on_new_domain_scores_full_diversity_bonus() {
        let score = service_score(4.0, 8.0, 0, 0, false, false, false);
        // headroom 50 + diversity 20, no load penalty or gpu bonus.
        assert_eq!(score, 70.0);
    }

    #[test]
    fn anti_affinity_violation_scores_negative_infinity() {
        let score = service_score(4.0, 8.0, 0, 0, false, false, true);
        assert_eq!(score, f64::NEG_INFINITY);
    }

    #[test]
    fn gpu_bonus_applies_only_when_both_want_and_have() {
        let with_gpu = service_score(4.0, 8.0, 0, 0, true, true, false);
        let without_machine_gpu = service_score(4.0, 8.0, 0, 0, true, false, false);
        assert_eq!(with_gpu - without_machine_gpu, 50.0);
    }
}
