//! Resolution of the four component slots

use crate::callback::ComponentSlot;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

/// Value supplied for a component slot.
///
/// `Flag(true)` asks for the model's default, `Flag(false)` leaves the slot
/// empty and `Instance` uses the given component as-is.
#[derive(Debug, Clone)]
pub enum ComponentArg<T> {
    /// Enable or disable the default component
    Flag(bool),
    /// Use this component
    Instance(T),
}

impl<T> Default for ComponentArg<T> {
    fn default() -> Self {
        Self::Flag(true)
    }
}

impl<T> From<bool> for ComponentArg<T> {
    fn from(enabled: bool) -> Self {
        Self::Flag(enabled)
    }
}

/// How a slot ended up being filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotResolution {
    /// Slot left empty
    Disabled,
    /// Filled by the model's default factory
    Default,
    /// Filled by a caller-supplied component
    Custom,
}

impl fmt::Display for SlotResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Default => f.write_str("default"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

impl<T> ComponentArg<T> {
    /// Resolve the slot, calling `default` only for `Flag(true)`.
    pub fn resolve(self, default: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
        match self {
            Self::Flag(true) => default().map(Some),
            Self::Flag(false) => Ok(None),
            Self::Instance(component) => Ok(Some(component)),
        }
    }

    /// How this argument will fill its slot
    pub fn resolution(&self) -> SlotResolution {
        match self {
            Self::Flag(true) => SlotResolution::Default,
            Self::Flag(false) => SlotResolution::Disabled,
            Self::Instance(_) => SlotResolution::Custom,
        }
    }

    /// Interpret a configuration value for `slot`.
    ///
    /// Booleans become flags and mappings are handed to `build`. Any other
    /// value is rejected with [`Error::InvalidComponent`].
    pub fn from_value(
        slot: ComponentSlot,
        value: &Value,
        build: impl FnOnce(&Value) -> Result<T>,
    ) -> Result<Self> {
        match value {
            Value::Bool(enabled) => Ok(Self::Flag(*enabled)),
            Value::Mapping(_) => build(value).map(Self::Instance),
            other => Err(Error::InvalidComponent {
                slot,
                found: value_type_name(other).to_string(),
            }),
        }
    }
}

/// YAML type name used in error messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_true_uses_default() {
        let resolved = ComponentArg::<u32>::from(true)
            .resolve(|| Ok(7))
            .expect("resolve");
        assert_eq!(resolved, Some(7));
    }

    #[test]
    fn test_flag_false_skips_default() {
        let resolved = ComponentArg::<u32>::Flag(false)
            .resolve(|| panic!("default must not be built"))
            .expect("resolve");
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_instance_is_kept() {
        let resolved = ComponentArg::Instance(3u32)
            .resolve(|| panic!("default must not be built"))
            .expect("resolve");
        assert_eq!(resolved, Some(3));
    }

    #[test]
    fn test_default_errors_propagate() {
        let err = ComponentArg::<u32>::Flag(true)
            .resolve(|| {
                Err(Error::Serialization {
                    message: "boom".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn test_resolution_record() {
        assert_eq!(
            ComponentArg::<u8>::Flag(true).resolution(),
            SlotResolution::Default
        );
        assert_eq!(
            ComponentArg::<u8>::Flag(false).resolution(),
            SlotResolution::Disabled
        );
        assert_eq!(
            ComponentArg::Instance(1u8).resolution(),
            SlotResolution::Custom
        );
    }

    #[test]
    fn test_from_value_kinds() {
        let slot = ComponentSlot::Evaluator;
        let flag = ComponentArg::<u8>::from_value(slot, &Value::Bool(false), |_| Ok(0))
            .expect("bool");
        assert_eq!(flag.resolution(), SlotResolution::Disabled);

        let mapping: Value = serde_yaml::from_str("a: 1").expect("yaml");
        let instance = ComponentArg::<u8>::from_value(slot, &mapping, |_| Ok(5)).expect("map");
        assert!(matches!(instance, ComponentArg::Instance(5)));

        let number: Value = serde_yaml::from_str("3").expect("yaml");
        let err = ComponentArg::<u8>::from_value(slot, &number, |_| Ok(0)).unwrap_err();
        match err {
            Error::InvalidComponent { slot: s, found } => {
                assert_eq!(s, ComponentSlot::Evaluator);
                assert_eq!(found, "number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
