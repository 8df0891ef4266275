//! Tests for loading pipelines from configuration files

use super::*;
use crate::data::{Batch, InferenceBatch};
use crate::error::{Error, ErrorKind, Result};
use crate::learning_type::LearningType;
use crate::models::PixelStats;
use crate::module::{
    AnomalyModel, AnomalyModule, ModulePipeline, SlotResolution, TrainerArguments,
};
use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array4};
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

/// Model scoring every image with the same constant.
#[derive(Debug)]
struct Constant;

impl AnomalyModel for Constant {
    fn name(&self) -> &str {
        "Constant"
    }

    fn learning_type(&self) -> LearningType {
        LearningType::OneClass
    }

    fn trainer_arguments(&self) -> TrainerArguments {
        TrainerArguments::default()
    }

    fn forward(&self, images: &Array4<f32>) -> Result<InferenceBatch> {
        let scores = Array1::from_elem(images.shape()[0], 0.5);
        Ok(InferenceBatch::from_scores(scores))
    }

    fn validation_step(&mut self, mut batch: Batch, _batch_idx: usize) -> Result<Batch> {
        batch.update(self.forward(&batch.image)?);
        Ok(batch)
    }
}

fn load_err(file: &NamedTempFile, overrides: &[String]) -> Error {
    match load_module(file.path(), &ModelRegistry::with_builtin(), overrides) {
        Ok(module) => panic!("expected an error, loaded {}", module.name()),
        Err(e) => e,
    }
}

#[test]
fn test_from_config_builds_typed_pipeline() {
    let file = config_file(
        r"
model:
  class_path: PixelStats
  init_args:
    eps: 0.01
",
    );
    let registry = ModelRegistry::with_builtin();
    let pipeline = ModulePipeline::<PixelStats>::from_config(file.path(), &registry, &[]).unwrap();

    assert_eq!(pipeline.model().config().eps, 0.01);
    assert!(pipeline.pre_processor().is_some());
    assert!(pipeline.post_processor().is_some());
    let eps = pipeline.hparams().init_args["eps"].as_f64().unwrap();
    assert_abs_diff_eq!(eps, 0.01, epsilon = 1e-6);
}

#[test]
fn test_missing_file_is_not_found() {
    let err = ModulePipeline::<PixelStats>::from_config(
        "/nonexistent/anomalo/config.yaml",
        &ModelRegistry::with_builtin(),
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_malformed_yaml_is_a_parsing_error() {
    let file = config_file("model: [unclosed");
    let err = load_config(file.path(), &[]).unwrap_err();
    assert!(matches!(err, Error::ConfigParsing { .. }));
}

#[test]
fn test_missing_model_section_is_invalid_model() {
    let file = config_file("trainer:\n  max_epochs: 2\n");
    let err = load_err(&file, &[]);
    assert!(matches!(err, Error::InvalidModel { .. }));
}

#[test]
fn test_non_module_class_is_invalid_model() {
    let mut registry = ModelRegistry::with_builtin();
    registry.register_factory("Tokenizer", |_, _| {
        Ok(Instance::Other {
            type_name: "Tokenizer".into(),
        })
    });
    let file = config_file("model:\n  class_path: Tokenizer\n");

    let err = ModulePipeline::<PixelStats>::from_config(file.path(), &registry, &[]).unwrap_err();
    match err {
        Error::InvalidModel { expected, found } => {
            assert!(expected.contains("ModulePipeline"));
            assert_eq!(found, "Tokenizer");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_pipeline_of_another_model_is_invalid_model() {
    let file = config_file("model:\n  class_path: PixelStats\n");
    let registry = ModelRegistry::with_builtin();
    let err = ModulePipeline::<Constant>::from_config(file.path(), &registry, &[]).unwrap_err();
    match err {
        Error::InvalidModel { found, .. } => assert_eq!(found, "PixelStats"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_registered_custom_model() {
    let mut registry = ModelRegistry::new();
    registry.register("Constant", |_| Ok(Constant));
    let file = config_file(
        "model:\n  class_path: Constant\n  init_args:\n    visualizer: false\n",
    );

    let pipeline = ModulePipeline::<Constant>::from_config(file.path(), &registry, &[]).unwrap();
    assert!(pipeline.visualizer().is_none());
    let out = pipeline.forward(Array4::zeros((2, 3, 4, 4))).unwrap();
    assert_eq!(out.pred_score.unwrap().len(), 2);
}

#[test]
fn test_unknown_class_path() {
    let file = config_file("model:\n  class_path: Patchcore\n");
    let err = load_err(&file, &[]);
    assert!(matches!(err, Error::UnknownClassPath { .. }));
    assert_eq!(err.code(), "E013");
}

#[test]
fn test_overrides_apply_before_instantiation() {
    let file = config_file("model:\n  class_path: PixelStats\n");
    let overrides = vec![
        "model.init_args.evaluator=false".to_string(),
        "model.init_args.pre_processor.image_size=[64, 32]".to_string(),
    ];
    let registry = ModelRegistry::with_builtin();
    let module = load_module(file.path(), &registry, &overrides).unwrap();

    assert_eq!(module.hparams().evaluator, SlotResolution::Disabled);
    assert_eq!(module.hparams().pre_processor, SlotResolution::Custom);
    assert_eq!(module.input_size().unwrap(), Some((64, 32)));
}

#[test]
fn test_invalid_slot_value_in_file() {
    let file = config_file(
        "model:\n  class_path: PixelStats\n  init_args:\n    evaluator: yes please\n",
    );
    let err = load_err(&file, &[]);
    assert!(matches!(err, Error::InvalidComponent { .. }));
}

#[test]
fn test_metrics_section_configures_evaluator() {
    let file = config_file(
        r"
model:
  class_path: PixelStats
metrics:
  image: [AUROC]
  pixel: [AUROC, F1Score]
trainer:
  max_epochs: 5
",
    );
    let config = load_config(file.path(), &[]).unwrap();
    assert_eq!(config.trainer.max_epochs, Some(5));

    let registry = ModelRegistry::with_builtin();
    let pipeline = ModulePipeline::<PixelStats>::from_config(file.path(), &registry, &[]).unwrap();
    let names: Vec<String> = pipeline
        .evaluator()
        .unwrap()
        .test_metrics()
        .iter()
        .map(|m| m.name())
        .collect();
    assert_eq!(names, vec!["image_AUROC", "pixel_AUROC", "pixel_F1Score"]);
    assert_eq!(pipeline.hparams().evaluator, SlotResolution::Custom);
}

#[test]
fn test_invalid_init_args() {
    let file = config_file(
        "model:\n  class_path: PixelStats\n  init_args:\n    eps: tiny\n",
    );
    let err = load_err(&file, &[]);
    assert!(matches!(err, Error::Serialization { .. }));
}
