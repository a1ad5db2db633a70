use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    ZeroMoveCostRatio,
    ZeroExtractRatio,
    ZeroCapacity,
    ZeroTurnBudget,
    DelayFactorBelowOne { found: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMoveCostRatio => write!(f, "move cost ratio must be non-zero"),
            Self::ZeroExtractRatio => write!(f, "extract ratio must be non-zero"),
            Self::ZeroCapacity => write!(f, "unit capacity must be non-zero"),
            Self::ZeroTurnBudget => write!(f, "turn budget must be non-zero"),
            Self::DelayFactorBelowOne { found } => {
                write!(f, "delay factor must be >= 1.0, got {found}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioError {
    EmptyGrid { width: u32, height: u32 },
    NoBaseForOwner { owner: u8 },
    OutOfSpawnRoom,
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { width, height } => {
                write!(f, "grid dimensions must be positive, got {width}x{height}")
            }
            Self::NoBaseForOwner { owner } => {
                write!(f, "owner {owner} has no base on the map")
            }
            Self::OutOfSpawnRoom => write!(f, "no unoccupied cell left for placement"),
        }
    }
}

impl std::error::Error for ScenarioError {}
