//! Data records flowing through the module pipeline

mod batch;

pub use batch::{
    Batch, InferenceBatch, ANOMALY_MAP, GT_LABEL, GT_MASK, IMAGE, PRED_LABEL, PRED_MASK,
    PRED_SCORE,
};
