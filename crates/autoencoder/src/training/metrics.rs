//! Per-epoch training metrics with health checks.

/// Metrics for one training epoch.
#[derive(Debug, Clone)]
pub struct EpochMetrics {
    pub epoch: usize,
    /// Average mini-batch loss over the epoch.
    pub train_loss: f64,
    /// Loss on the held-out validation set, when one was provided.
    pub val_loss: Option<f64>,
}

impl EpochMetrics {
    /// Flag conditions that indicate a broken training run.
    pub fn health_check(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.train_loss.is_finite() {
            warnings.push(format!("train loss is not finite: {}", self.train_loss));
        }
        if let Some(val) = self.val_loss {
            if !val.is_finite() {
                warnings.push(format!("validation loss is not finite: {val}"));
            } else if self.train_loss.is_finite() && val > self.train_loss * 10.0 && val > 0.1 {
                warnings.push(format!(
                    "validation loss {val:.4} far above train loss {:.4} — likely overfitting",
                    self.train_loss
                ));
            }
        }
        warnings
    }
}

/// Chronological record of epoch metrics for one training run.
#[derive(Debug, Default)]
pub struct MetricsHistory {
    entries: Vec<EpochMetrics>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metrics: EpochMetrics) {
        self.entries.push(metrics);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[EpochMetrics] {
        &self.entries
    }
}
