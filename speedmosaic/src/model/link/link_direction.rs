use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// travel direction permitted on a link relative to the order of its coordinates.
///
/// textual codes accepted when reading datasets:
///   - both: `both`, `0`, `two_way`, empty
///   - forward: `forward`, `1`, `oneway`, `f`
///   - backward: `backward`, `2`, `reverse`, `b`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    #[default]
    Both,
    Forward,
    Backward,
}

impl LinkDirection {
    pub fn allows_forward(&self) -> bool {
        matches!(self, LinkDirection::Both | LinkDirection::Forward)
    }

    pub fn allows_backward(&self) -> bool {
        matches!(self, LinkDirection::Both | LinkDirection::Backward)
    }
}

impl FromStr for LinkDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "both" | "0" | "two_way" => Ok(LinkDirection::Both),
            "forward" | "1" | "oneway" | "f" => Ok(LinkDirection::Forward),
            "backward" | "2" | "reverse" | "b" => Ok(LinkDirection::Backward),
            other => Err(format!("unknown link direction '{other}'")),
        }
    }
}

impl Display for LinkDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkDirection::Both => write!(f, "both"),
            LinkDirection::Forward => write!(f, "forward"),
            LinkDirection::Backward => write!(f, "backward"),
        }
    }
}
