use crate::mode::Mode;
use tensor::{Tensor, TensorError};

const EPS: f32 = 1e-5;
const MOMENTUM: f32 = 0.1;

/// Batch normalization over the feature axis of `[batch, features]` inputs.
///
/// `Mode::Train` normalizes with batch statistics and folds them into the
/// running population estimates; `Mode::Eval` normalizes with the frozen
/// running statistics only.
#[derive(Clone)]
pub struct BatchNorm1d {
    pub gamma: Tensor,
    pub beta: Tensor,
    pub running_mean: Tensor,
    pub running_var: Tensor,
    pub num_features: usize,
}

impl BatchNorm1d {
    pub fn new(num_features: usize) -> Self {
        Self {
            gamma: Tensor::from_vec(vec![num_features], vec![1.0; num_features]),
            beta: Tensor::zeros(vec![num_features]),
            running_mean: Tensor::zeros(vec![num_features]),
            running_var: Tensor::from_vec(vec![num_features], vec![1.0; num_features]),
            num_features,
        }
    }

    pub fn forward(&mut self, x: &Tensor, mode: Mode) -> Result<Tensor, TensorError> {
        if x.shape.len() != 2 {
            return Err(TensorError::Rank {
                op: "batch_norm1d",
                expected: 2,
                shape: x.shape.clone(),
            });
        }
        if x.shape[1] != self.num_features {
            return Err(TensorError::ShapeMismatch {
                op: "batch_norm1d",
                lhs: vec![self.num_features],
                rhs: x.shape.clone(),
            });
        }
        let batch = x.shape[0];
        let dim = self.num_features;
        let mut out = vec![0.0f32; batch * dim];
        for f in 0..dim {
            let (mean, var) = if mode.is_train() {
                let n = batch as f32;
                let mean = (0..batch).map(|k| x.data[k * dim + f]).sum::<f32>() / n;
                let var = (0..batch)
                    .map(|k| (x.data[k * dim + f] - mean).powi(2))
                    .sum::<f32>()
                    / n;
                // unbiased estimate feeds the running average
                let unbiased = if batch > 1 { var * n / (n - 1.0) } else { var };
                self.running_mean.data[f] =
                    (1.0 - MOMENTUM) * self.running_mean.data[f] + MOMENTUM * mean;
                self.running_var.data[f] =
                    (1.0 - MOMENTUM) * self.running_var.data[f] + MOMENTUM * unbiased;
                (mean, var)
            } else {
                (self.running_mean.data[f], self.running_var.data[f])
            };
            let inv = 1.0 / (var + EPS).sqrt();
            for k in 0..batch {
                let norm = (x.data[k * dim + f] - mean) * inv;
                out[k * dim + f] = self.gamma.data[f] * norm + self.beta.data[f];
            }
        }
        Ok(Tensor::from_vec(vec![batch, dim], out))
    }
}

/// Batch normalization over the channel axis of `[batch, ch, h, w]` inputs.
#[derive(Clone)]
pub struct BatchNorm2d {
    pub gamma: Tensor,
    pub beta: Tensor,
    pub running_mean: Tensor,
    pub running_var: Tensor,
    pub num_features: usize,
}

impl BatchNorm2d {
    pub fn new(num_features: usize) -> Self {
        Self {
            gamma: Tensor::from_vec(vec![num_features], vec![1.0; num_features]),
            beta: Tensor::zeros(vec![num_features]),
            running_mean: Tensor::zeros(vec![num_features]),
            running_var: Tensor::from_vec(vec![num_features], vec![1.0; num_features]),
            num_features,
        }
    }

    pub fn forward(&mut self, x: &Tensor, mode: Mode) -> Result<Tensor, TensorError> {
        if x.shape.len() != 4 {
            return Err(TensorError::Rank {
                op: "batch_norm2d",
                expected: 4,
                shape: x.shape.clone(),
            });
        }
        if x.shape[1] != self.num_features {
            return Err(TensorError::ShapeMismatch {
                op: "batch_norm2d",
                lhs: vec![self.num_features],
                rhs: x.shape.clone(),
            });
        }
        let (batch, ch, h, w) = (x.shape[0], x.shape[1], x.shape[2], x.shape[3]);
        let plane = h * w;
        let mut out = vec![0.0f32; batch * ch * plane];
        for c in 0..ch {
            let (mean, var) = if mode.is_train() {
                let n = (batch * plane) as f32;
                let mut sum = 0.0;
                for k in 0..batch {
                    let base = (k * ch + c) * plane;
                    for i in 0..plane {
                        sum += x.data[base + i];
                    }
                }
                let mean = sum / n;
                let mut sq = 0.0;
                for k in 0..batch {
                    let base = (k * ch + c) * plane;
                    for i in 0..plane {
                        sq += (x.data[base + i] - mean).powi(2);
                    }
                }
                let var = sq / n;
                let unbiased = if n > 1.0 { var * n / (n - 1.0) } else { var };
                self.running_mean.data[c] =
                    (1.0 - MOMENTUM) * self.running_mean.data[c] + MOMENTUM * mean;
                self.running_var.data[c] =
                    (1.0 - MOMENTUM) * self.running_var.data[c] + MOMENTUM * unbiased;
                (mean, var)
            } else {
                (self.running_mean.data[c], self.running_var.data[c])
            };
            let inv = 1.0 / (var + EPS).sqrt();
            for k in 0..batch {
                let base = (k * ch + c) * plane;
                for i in 0..plane {
                    let norm = (x.data[base + i] - mean) * inv;
                    out[base + i] = self.gamma.data[c] * norm + self.beta.data[c];
                }
            }
        }
        Ok(Tensor::from_vec(vec![batch, ch, h, w], out))
    }
}
