use crate::error::BuildError;
use serde::{Deserialize, Serialize};

/// How the partitioner chooses the axis to split a range on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// Split on the axis with the greatest extent within the current range.
    #[default]
    WidestSpread,
    /// Split on axis `depth % dim`.
    RoundRobin,
}

/// Build parameters for a [`crate::KdTree`].
///
/// The configuration is passed explicitly into every build; there is no
/// process-wide tuning state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Maximum number of points per leaf.
    pub leafsize: usize,
    /// Tree depth above which subtrees are built on separate workers.
    pub par_split_level: usize,
    pub split_rule: SplitRule,
    /// Size of a dedicated worker pool owned by the tree. `None` uses the
    /// global rayon pool.
    pub num_threads: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            leafsize: 32,
            par_split_level: 0,
            split_rule: SplitRule::WidestSpread,
            num_threads: None,
        }
    }
}

impl BuildConfig {
    pub fn new(leafsize: usize, par_split_level: usize) -> Self {
        Self {
            leafsize,
            par_split_level,
            ..Self::default()
        }
    }

    pub fn with_leafsize(mut self, leafsize: usize) -> Self {
        self.leafsize = leafsize;
        self
    }

    pub fn with_par_split_level(mut self, level: usize) -> Self {
        self.par_split_level = level;
        self
    }

    pub fn with_split_rule(mut self, rule: SplitRule) -> Self {
        self.split_rule = rule;
        self
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.leafsize == 0 {
            return Err(BuildError::InvalidLeafSize);
        }
        if self.num_threads == Some(0) {
            return Err(BuildError::ThreadPool("worker pool size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BuildConfig::default();
        assert_eq!(config.leafsize, 32);
        assert_eq!(config.split_rule, SplitRule::WidestSpread);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_leafsize_rejected() {
        let config = BuildConfig::default().with_leafsize(0);
        assert_eq!(config.validate(), Err(BuildError::InvalidLeafSize));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = BuildConfig::default().with_num_threads(0);
        assert!(matches!(config.validate(), Err(BuildError::ThreadPool(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BuildConfig =
            serde_json::from_str(r#"{"leafsize": 8, "split_rule": "round_robin"}"#).unwrap();
        assert_eq!(config.leafsize, 8);
        assert_eq!(config.par_split_level, 0);
        assert_eq!(config.split_rule, SplitRule::RoundRobin);
        assert_eq!(config.num_threads, None);
    }
}
