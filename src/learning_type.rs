//! Supervision regime of a model variant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Learning type implemented by an anomaly model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningType {
    /// Trained on normal samples only
    #[default]
    OneClass,
    /// No training samples at all
    ZeroShot,
    /// A handful of normal reference samples
    FewShot,
}

impl LearningType {
    /// Canonical lowercase name, as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneClass => "one_class",
            Self::ZeroShot => "zero_shot",
            Self::FewShot => "few_shot",
        }
    }
}

impl fmt::Display for LearningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_type_serialization() {
        let yaml = serde_yaml::to_string(&LearningType::ZeroShot).expect("serialize");
        assert_eq!(yaml.trim(), "zero_shot");

        let parsed: LearningType = serde_yaml::from_str("few_shot").expect("deserialize");
        assert_eq!(parsed, LearningType::FewShot);
    }

    #[test]
    fn test_display_matches_serde_name() {
        for lt in [LearningType::OneClass, LearningType::ZeroShot, LearningType::FewShot] {
            let json = serde_json::to_string(&lt).expect("serialize");
            assert_eq!(json, format!("\"{lt}\""));
        }
    }
}
