//! Training pipeline: mini-batch data plan, reconstruction losses,
//! per-epoch metrics with health checks, and the AdamW training loop.

pub mod data;
pub mod loss;
pub mod metrics;
pub mod trainer;
