//! Construction stage selection policy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MonitorError;

/// Historical default: the 59th distinct stage of the load table
pub const DEFAULT_STAGE_INDEX: usize = 58;

/// How the "current" construction stage is chosen when the user names none.
///
/// Stages are ordered as they first appear in the load table, so an index is
/// only meaningful for a particular table. The policy is kept explicit for that
/// reason rather than being buried in the caller.
///
/// ## JSON Example
///
/// ```json
/// { "policy": "fixed_index", "index": 58 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StageSelection {
    /// The stage at this position, or the first stage when the table is shorter
    FixedIndex { index: usize },
    /// The first listed stage
    First,
    /// The last listed stage
    Last,
    /// A specific stage identifier; resolves to nothing if the table lacks it
    Named { stage: String },
}

impl Default for StageSelection {
    fn default() -> Self {
        StageSelection::FixedIndex {
            index: DEFAULT_STAGE_INDEX,
        }
    }
}

impl StageSelection {
    /// Pick a stage from `stages`, or `None` if the list is empty or a named stage is absent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pier_core::loads::StageSelection;
    ///
    /// let stages = vec!["S1".to_string(), "S2".to_string()];
    /// assert_eq!(StageSelection::Last.resolve(&stages), Some("S2"));
    /// assert_eq!(StageSelection::default().resolve(&stages), Some("S1"));
    /// ```
    pub fn resolve<'a>(&self, stages: &'a [String]) -> Option<&'a str> {
        match self {
            StageSelection::FixedIndex { index } => {
                stages.get(*index).or_else(|| stages.first()).map(String::as_str)
            }
            StageSelection::First => stages.first().map(String::as_str),
            StageSelection::Last => stages.last().map(String::as_str),
            StageSelection::Named { stage } => stages
                .iter()
                .find(|s| *s == stage)
                .map(String::as_str),
        }
    }
}

/// Command-line form: `first`, `last`, `index:<n>` or `stage:<name>`.
///
/// ```rust
/// use pier_core::loads::StageSelection;
///
/// assert_eq!("last".parse::<StageSelection>().unwrap(), StageSelection::Last);
/// assert_eq!(
///     "index:58".parse::<StageSelection>().unwrap(),
///     StageSelection::FixedIndex { index: 58 }
/// );
/// ```
impl FromStr for StageSelection {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| MonitorError::invalid_input("stage_policy", s, reason);
        match s.trim().split_once(':') {
            None => match s.trim() {
                "first" => Ok(StageSelection::First),
                "last" => Ok(StageSelection::Last),
                _ => Err(invalid("expected first, last, index:<n> or stage:<name>")),
            },
            Some(("index", n)) => n
                .trim()
                .parse()
                .map(|index| StageSelection::FixedIndex { index })
                .map_err(|_| invalid("index must be a non-negative integer")),
            Some(("stage", name)) if !name.trim().is_empty() => Ok(StageSelection::Named {
                stage: name.trim().to_string(),
            }),
            Some(_) => Err(invalid("expected first, last, index:<n> or stage:<name>")),
        }
    }
}
