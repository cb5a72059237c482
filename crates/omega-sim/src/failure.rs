use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};

/// Pre-computes every failure firing timestamp for the whole run at
/// initialization (spec.md §4.5: failures are an exogenous Poisson process,
/// independent of which jobs happen to be running). `rate_per_machine_second`
/// is `failures.rate` from config; the aggregate process over the whole
/// cluster fires at `rate_per_machine_second * num_machines` events per
/// second, so the mean time between firings shrinks as the cluster grows.
///
/// Firings don't carry a machine id: spec.md asks for failures to land on a
/// currently-healthy machine, but "healthy" is a property of simulated
/// time, not of this pre-computation — the simulator draws the machine
/// uniformly among the currently-healthy ones when each timestamp is
/// actually dispatched.
pub(crate) fn schedule_failure_times(rng: &mut StdRng, rate_per_machine_second: f64, num_machines: u32, horizon: f64) -> Vec<f64> {
    if rate_per_machine_second <= 0.0 || num_machines == 0 {
        return Vec::new();
    }
    let aggregate_rate = rate_per_machine_second * num_machines as f64;
    let dist = Exp::new(aggregate_rate).expect("aggregate failure rate must be positive");

    let mut times = Vec::new();
    let mut t = dist.sample(rng);
    while t <= horizon {
        times.push(t);
        t += dist.sample(rng);
    }
    times
}

/// Downtime for one failed machine before its scheduled recovery (spec.md
/// §4.5), exponentially distributed around `recovery_mean`.
pub(crate) fn sample_recovery_downtime(rng: &mut StdRng, recovery_mean: f64) -> f64 {
    let dist = Exp::new(1.0 / recovery_mean).expect("recovery_mean must be positive");
    dist.sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn no_rate_produces_no_failures() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(schedule_failure_times(&mut rng, 0.0, 10, 1000.0).is_empty());
    }

    #[test]
    fn firings_stay_within_the_horizon_and_increase() {
        let mut rng = StdRng::seed_from_u64(2);
        let times = schedule_failure_times(&mut rng, 0.001, 50, 2000.0);
        assert!(!times.is_empty());
        for window in times.windows(2) {
            assert!(window[1] > window[0]);
        }
        assert!(times.iter().all(|&t| t <= 2000.0));
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        let a = schedule_failure_times(&mut rng_a, 0.002, 20, 5000.0);
        let b = schedule_failure_times(&mut rng_b, 0.002, 20, 5000.0);
        assert_eq!(a, b);
    }
}
