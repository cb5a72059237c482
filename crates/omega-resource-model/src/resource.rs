use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A `(cpu_cores, gpu_count, memory_gb)` triple. Used both as a machine's
/// capacity/allocation and as a task's resource requirement; comparisons and
/// arithmetic are always componentwise (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceVector {
    pub cpu_cores: u32,
    pub gpu_count: u32,
    pub memory_gb: f64,
}

impl ResourceVector {
    pub const ZERO: ResourceVector = ResourceVector {
        cpu_cores: 0,
        gpu_count: 0,
        memory_gb: 0.0,
    };

    pub fn new(cpu_cores: u32, gpu_count: u32, memory_gb: f64) -> Self {
        Self {
            cpu_cores,
            gpu_count,
            memory_gb,
        }
    }

    /// `true` if every component of `self` is <= the corresponding
    /// component of `capacity`.
    pub fn fits(&self, capacity: &ResourceVector) -> bool {
        self.cpu_cores <= capacity.cpu_cores
            && self.gpu_count <= capacity.gpu_count
            && self.memory_gb <= capacity.memory_gb
    }

    /// `true` if `self` is componentwise <= `other`. Distinct from `fits`
    /// only in naming — kept separate because invariant checks read more
    /// clearly as `allocated.le_componentwise(capacity)` than
    /// `allocated.fits(capacity)` at a call site that isn't about placement.
    pub fn le_componentwise(&self, other: &ResourceVector) -> bool {
        self.fits(other)
    }

    /// Euclidean magnitude, used by best-fit/worst-fit scoring (spec.md
    /// §4.2.1) to rank leftover capacity after a tentative placement.
    pub fn magnitude(&self) -> f64 {
        let cpu = self.cpu_cores as f64;
        let gpu = self.gpu_count as f64;
        (cpu * cpu + gpu * gpu + self.memory_gb * self.memory_gb).sqrt()
    }

    pub fn saturating_sub(&self, other: &ResourceVector) -> ResourceVector {
        ResourceVector {
            cpu_cores: self.cpu_cores.saturating_sub(other.cpu_cores),
            gpu_count: self.gpu_count.saturating_sub(other.gpu_count),
            memory_gb: (self.memory_gb - other.memory_gb).max(0.0),
        }
    }
}

impl Add for ResourceVector {
    type Output = ResourceVector;

    fn add(self, rhs: ResourceVector) -> ResourceVector {
        ResourceVector {
            cpu_cores: self.cpu_cores + rhs.cpu_cores,
            gpu_count: self.gpu_count + rhs.gpu_count,
            memory_gb: self.memory_gb + rhs.memory_gb,
        }
    }
}

impl Sub for ResourceVector {
    type Output = ResourceVector;

    fn sub(self, rhs: ResourceVector) -> ResourceVector {
        ResourceVector {
            cpu_cores: self.cpu_cores - rhs.cpu_cores,
            gpu_count: self.gpu_count - rhs.gpu_count,
            memory_gb: self.memory_gb - rhs.memory_gb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_is_componentwise() {
        let cap = ResourceVector::new(4, 0, 8.0);
        assert!(ResourceVector::new(4, 0, 8.0).fits(&cap));
        assert!(ResourceVector::new(2, 0, 4.0).fits(&cap));
        assert!(!ResourceVector::new(5, 0, 1.0).fits(&cap));
        assert!(!ResourceVector::new(1, 1, 1.0).fits(&cap));
    }

    #[test]
    fn exact_fit_leaves_zero_remaining() {
        let cap = ResourceVector::new(4, 0, 8.0);
        let req = ResourceVector::new(4, 0, 8.0);
        let remaining = cap - req;
        assert_eq!(remaining, ResourceVector::ZERO);
    }
}
