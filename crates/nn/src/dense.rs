use tensor::{Tensor, TensorError};

/// A fully connected neural network layer.
#[derive(Clone)]
pub struct Dense {
    /// The weight matrix for the layer, `[out_dim, in_dim]`.
    pub w: Tensor,
    /// The bias vector for the layer.
    pub b: Tensor,
    /// The number of input dimensions.
    pub in_dim: usize,
    /// The number of output dimensions.
    pub out_dim: usize,
}

impl Dense {
    /// Creates a new `Dense` layer with the given weights and biases.
    pub fn new(weights: Vec<f32>, bias: Vec<f32>, in_dim: usize, out_dim: usize) -> Self {
        assert_eq!(weights.len(), in_dim * out_dim);
        assert_eq!(bias.len(), out_dim);
        Self {
            w: Tensor::from_vec(vec![out_dim, in_dim], weights),
            b: Tensor::from_vec(vec![out_dim], bias),
            in_dim,
            out_dim,
        }
    }

    pub fn random(in_dim: usize, out_dim: usize) -> Self {
        // Glorot initialization
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| fastrand::f32() * 2.0 * limit - limit)
            .collect();
        let bias = vec![0.0; out_dim];
        Self::new(weights, bias, in_dim, out_dim)
    }

    /// Performs the forward pass for a batch of rows `[batch, in_dim]`.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        let wx = self.w.matmul(x)?;
        wx.add_broadcast(&self.b)
    }
}
