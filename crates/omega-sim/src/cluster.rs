use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use omega_cell::CellState;
use omega_config::ClusterConfig;
use omega_resource_model::{FailureDomain, MachineId, MachineType, ResourceVector};

/// Machines per failure domain when spreading the cluster across racks.
/// spec.md §6 names `cluster.num_machines` and `cluster.heterogeneous` but
/// never a domain count; four machines per rack is this project's reading,
/// matching the teacher's own habit of picking a small, named constant over
/// threading another config knob through for something this incidental.
const MACHINES_PER_DOMAIN: u32 = 4;

/// Registers `config.num_machines` machines into a fresh cell, round-robin
/// across synthetic failure domains, typed per `config.heterogeneous`
/// (spec.md §6's 50/30/15/5 mix, or all-`STANDARD` otherwise). `seed` is
/// only consulted for the heterogeneous type draw, so a homogeneous cluster
/// never depends on the RNG at all.
pub fn build_cluster(config: &ClusterConfig, seed: u64) -> Arc<CellState> {
    let cell = CellState::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let domain_count = (config.num_machines / MACHINES_PER_DOMAIN).max(1);
    let mix = MachineType::heterogeneous_mix();
    let total_weight: u32 = mix.iter().map(|(_, _, weight)| weight).sum();

    for index in 0..config.num_machines {
        let machine_id = MachineId(index as u64);
        let domain = FailureDomain::from(format!("rack-{}", index % domain_count).as_str());
        let (machine_type, capacity) = if config.heterogeneous {
            pick_weighted(&mut rng, &mix, total_weight)
        } else {
            (MachineType::STANDARD, MachineType::standard_capacity())
        };
        cell.register_machine(machine_id, machine_type, capacity, domain)
            .expect("machine ids 0..num_machines are freshly minted and unique");
    }
    cell
}

fn pick_weighted(
    rng: &mut StdRng,
    mix: &[(MachineType, ResourceVector, u32); 4],
    total_weight: u32,
) -> (MachineType, ResourceVector) {
    let mut roll = rng.gen_range(0..total_weight);
    for (machine_type, capacity, weight) in mix {
        if roll < *weight {
            return (*machine_type, *capacity);
        }
        roll -= weight;
    }
    let (machine_type, capacity, _) = mix.last().expect("mix is non-empty");
    (*machine_type, *capacity)
}
