use rand::Rng;
use rand_distr::{Distribution, Exp, LogNormal, Normal};

/// Exponential inter-arrival draw for a Poisson process with the given mean
/// (spec.md §4.3 "Arrival: Poisson process per job type").
pub(crate) fn exponential_interarrival(rng: &mut impl Rng, mean_seconds: f64) -> f64 {
    let dist = Exp::new(1.0 / mean_seconds).expect("mean_seconds must be > 0");
    dist.sample(rng)
}

/// Log-normal draw parameterized by the *desired* mean and standard
/// deviation of the distribution itself (not of the underlying normal),
/// truncated to `floor`. Used for task counts and task durations (spec.md
/// §4.3).
pub(crate) fn log_normal_truncated(rng: &mut impl Rng, mean: f64, std: f64, floor: f64) -> f64 {
    let variance = std * std;
    let sigma_sq = (1.0 + variance / (mean * mean)).ln();
    let sigma = sigma_sq.sqrt();
    let mu = mean.ln() - sigma_sq / 2.0;
    let dist = LogNormal::new(mu, sigma).expect("log-normal parameters must be finite");
    dist.sample(rng).max(floor)
}

/// Normal draw clamped to `floor`, used for resource requirements (spec.md
/// §4.3: "clamped to >= 1 cpu core and >= 0.5 GB memory").
pub(crate) fn normal_clamped(rng: &mut impl Rng, mean: f64, std: f64, floor: f64) -> f64 {
    let dist = Normal::new(mean, std).expect("normal std must be finite and >= 0");
    dist.sample(rng).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn log_normal_truncated_never_goes_below_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let sample = log_normal_truncated(&mut rng, 5.0, 2.0, 1.0);
            assert!(sample >= 1.0);
        }
    }

    #[test]
    fn normal_clamped_never_goes_below_floor() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let sample = normal_clamped(&mut rng, 2.0, 5.0, 1.0);
            assert!(sample >= 1.0);
        }
    }

    #[test]
    fn exponential_interarrival_is_always_positive() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!(exponential_interarrival(&mut rng, 10.0) > 0.0);
        }
    }
}
