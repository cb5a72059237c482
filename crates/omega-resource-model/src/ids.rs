use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(MachineId);
numeric_id!(TaskId);
numeric_id!(JobId);

/// Scheduler identity as configured in `schedulers[].id` (spec.md §6): a
/// unique string, not an integer, since schedulers are named by operators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchedulerId(pub String);

impl fmt::Display for SchedulerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SchedulerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SchedulerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Groups machines whose failures are assumed correlated (e.g. a rack).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FailureDomain(pub String);

impl fmt::Display for FailureDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FailureDomain {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
