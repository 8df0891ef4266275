//! Property-based tests for overrides and slot parsing

use super::*;
use crate::module::SlotResolution;
use proptest::prelude::*;
use serde_yaml::{Mapping, Value};

fn arb_key() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z][a-z_]{0,8}", 1..4)
}

fn resolution(enabled: bool) -> SlotResolution {
    if enabled {
        SlotResolution::Default
    } else {
        SlotResolution::Disabled
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_override_sets_integer_leaf(path in arb_key(), value in any::<i64>()) {
        let mut document = Value::Null;
        apply_override(&mut document, &format!("{}={value}", path.join("."))).unwrap();

        let mut node = &document;
        for segment in &path {
            node = &node[segment.as_str()];
        }
        prop_assert_eq!(node.as_i64(), Some(value));
    }

    #[test]
    fn prop_last_override_wins(path in arb_key(), first in any::<bool>(), second in any::<bool>()) {
        let key = path.join(".");
        let mut document = Value::Null;
        let overrides = [format!("{key}={first}"), format!("{key}={second}")];
        apply_overrides(&mut document, &overrides).unwrap();

        let mut node = &document;
        for segment in &path {
            node = &node[segment.as_str()];
        }
        prop_assert_eq!(node.as_bool(), Some(second));
    }

    #[test]
    fn prop_boolean_slots_resolve_to_flags(
        pre in any::<bool>(),
        post in any::<bool>(),
        evaluator in any::<bool>(),
        visualizer in any::<bool>(),
    ) {
        let mut init_args = Mapping::new();
        init_args.insert("pre_processor".into(), pre.into());
        init_args.insert("post_processor".into(), post.into());
        init_args.insert("evaluator".into(), evaluator.into());
        init_args.insert("visualizer".into(), visualizer.into());

        let slots = ComponentArgs::take_from(&mut init_args, None).unwrap();
        prop_assert!(init_args.is_empty());
        prop_assert_eq!(slots.pre_processor.resolution(), resolution(pre));
        prop_assert_eq!(slots.post_processor.resolution(), resolution(post));
        prop_assert_eq!(slots.evaluator.resolution(), resolution(evaluator));
        prop_assert_eq!(slots.visualizer.resolution(), resolution(visualizer));
    }
}
