//! Component configuration.

use serde::{Deserialize, Serialize};

/// Configuration for an [`AnimComponent`](crate::component::AnimComponent).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Divide every layer weight by the sum of all layer weights before composition.
    pub normalize_weights: bool,
    /// Start playback automatically once every layer is playable.
    pub activate: bool,
    /// Samples whose final weight is not above this are left out of the outputs.
    pub weight_epsilon: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            normalize_weights: false,
            activate: true,
            weight_epsilon: 1e-6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "normalizeWeights": true }"#).unwrap();
        assert!(cfg.normalize_weights);
        assert!(cfg.activate);
        assert_eq!(cfg.weight_epsilon, 1e-6);
    }
}
