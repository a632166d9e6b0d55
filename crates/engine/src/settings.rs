use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use eyre::eyre;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Which slots the conflict detector compares a candidate against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictScope {
    /// Only slots of the candidate's own group.
    Group,
    /// Slots of every group at the same instant.
    #[default]
    AllGroups,
}

impl ConflictScope {
    /// The group filter to pass to the store for this scope.
    pub fn restrict_to(self, group_id: Uuid) -> Option<Uuid> {
        match self {
            ConflictScope::Group => Some(group_id),
            ConflictScope::AllGroups => None,
        }
    }
}

impl FromStr for ConflictScope {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(ConflictScope::Group),
            "all_groups" => Ok(ConflictScope::AllGroups),
            other => Err(eyre!(
                "Unknown conflict scope '{}', expected 'group' or 'all_groups'",
                other
            )),
        }
    }
}

impl fmt::Display for ConflictScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictScope::Group => write!(f, "group"),
            ConflictScope::AllGroups => write!(f, "all_groups"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Upper bound on a whole mutating transaction, lock waits included.
    pub transaction_timeout: Duration,
    pub conflict_scope: ConflictScope,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            conflict_scope: ConflictScope::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_scope_parsing() {
        assert_eq!("group".parse::<ConflictScope>().unwrap(), ConflictScope::Group);
        assert_eq!(
            " ALL_GROUPS ".parse::<ConflictScope>().unwrap(),
            ConflictScope::AllGroups
        );
        assert!("everything".parse::<ConflictScope>().is_err());
    }

    #[test]
    fn test_scope_filter() {
        let group = Uuid::new_v4();
        assert_eq!(ConflictScope::Group.restrict_to(group), Some(group));
        assert_eq!(ConflictScope::AllGroups.restrict_to(group), None);
    }
}
