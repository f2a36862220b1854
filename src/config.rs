//! Analysis configuration

use serde::{Serialize, Deserialize};

/// Configuration shared by the matching and component analyses
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Cap on fixed-point rounds; can only lower the vertex-count bound
    pub max_rounds: Option<u64>,

    /// Run `SetGraph::validate` before analysing
    pub validate_input: bool,

    /// Log intermediate maps at trace level after every round
    pub trace_rounds: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_rounds: None,
            validate_input: true,
            trace_rounds: false,
        }
    }
}

impl AnalysisConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the round cap
    pub fn max_rounds(mut self, rounds: u64) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Enable/disable input validation
    pub fn validate_input(mut self, v: bool) -> Self {
        self.validate_input = v;
        self
    }

    /// Enable/disable per-round tracing
    pub fn trace_rounds(mut self, v: bool) -> Self {
        self.trace_rounds = v;
        self
    }

    /// Skip validation, for inputs produced by a trusted front end
    pub fn trusted() -> Self {
        Self {
            validate_input: false,
            ..Default::default()
        }
    }

    /// Round bound for a graph with `vertex_count` vertex points
    pub fn round_bound(&self, vertex_count: u64) -> u64 {
        let nmax = vertex_count.saturating_add(1);
        match self.max_rounds {
            Some(cap) => cap.min(nmax),
            None => nmax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_bound_only_lowers() {
        let config = AnalysisConfig::new().max_rounds(5);
        assert_eq!(config.round_bound(100), 5);
        assert_eq!(config.round_bound(2), 3);
        assert_eq!(AnalysisConfig::default().round_bound(10), 11);
    }

    #[test]
    fn test_trusted_preset() {
        let config = AnalysisConfig::trusted();
        assert!(!config.validate_input);
        assert_eq!(config.max_rounds, None);
    }
}
