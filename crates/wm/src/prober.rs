use crate::error::ModelError;
use nn::Dense;
use tensor::Tensor;

/// Auxiliary read-out network mapping embeddings to a downstream target.
///
/// Hidden widths come from a hyphen-delimited list such as `"128-64"`; the
/// empty string yields a single linear layer. ReLU sits between hidden
/// layers only. Independent of the predictor state; trained against frozen
/// or fine-tuned representations by an external harness.
pub struct Prober {
    pub layers: Vec<Dense>,
    pub output_shape: Vec<usize>,
}

impl Prober {
    pub fn new(embedding: usize, arch: &str, output_shape: &[usize]) -> Result<Self, ModelError> {
        let output_dim: usize = output_shape.iter().product();
        let mut widths = vec![embedding];
        if !arch.is_empty() {
            for token in arch.split('-') {
                let width: usize = token.parse().unwrap_or(0);
                if width == 0 {
                    return Err(ModelError::Configuration {
                        arch: arch.to_string(),
                        token: token.to_string(),
                    });
                }
                widths.push(width);
            }
        }
        widths.push(output_dim);
        let layers = widths
            .windows(2)
            .map(|pair| Dense::random(pair[0], pair[1]))
            .collect();
        Ok(Self {
            layers,
            output_shape: output_shape.to_vec(),
        })
    }

    /// Maps embeddings `[B, embedding]` to `[B] + output_shape`.
    pub fn forward(&self, e: &Tensor) -> Result<Tensor, ModelError> {
        let mut x = e.clone();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x)?;
            if i < last {
                x = x.relu();
            }
        }
        let mut shape = vec![e.shape[0]];
        shape.extend_from_slice(&self.output_shape);
        Ok(x.reshape(shape)?)
    }
}
