#![deny(clippy::all)]

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("{op}: shape mismatch between {lhs:?} and {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },
    #[error("{op}: expected rank {expected}, got shape {shape:?}")]
    Rank {
        op: &'static str,
        expected: usize,
        shape: Vec<usize>,
    },
    #[error("{op}: index {index} out of bounds for axis {axis} of {shape:?}")]
    Index {
        op: &'static str,
        index: usize,
        axis: usize,
        shape: Vec<usize>,
    },
}

/// A dense, row-major tensor of `f32` values.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Tensor {
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { data, shape }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            data: vec![0.0; len],
            shape,
        }
    }

    pub fn zeros_like(other: &Tensor) -> Self {
        Self::zeros(other.shape.clone())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Overwrites every element with zero, keeping the shape.
    pub fn zero_in_place(&mut self) {
        self.data.fill(0.0);
    }

    /// Element-wise addition. Shapes must match exactly.
    pub fn add(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        if self.shape != other.shape {
            return Err(TensorError::ShapeMismatch {
                op: "add",
                lhs: self.shape.clone(),
                rhs: other.shape.clone(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a + b)
            .collect();
        Ok(Tensor::from_vec(self.shape.clone(), data))
    }

    /// Matrix product of a weight matrix `self` of shape `[out, in]` with a
    /// batch of rows `x` of shape `[batch, in]`, producing `[batch, out]`.
    pub fn matmul(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        if self.shape.len() != 2 {
            return Err(TensorError::Rank {
                op: "matmul",
                expected: 2,
                shape: self.shape.clone(),
            });
        }
        if x.shape.len() != 2 {
            return Err(TensorError::Rank {
                op: "matmul",
                expected: 2,
                shape: x.shape.clone(),
            });
        }
        let (out_dim, in_dim) = (self.shape[0], self.shape[1]);
        let batch = x.shape[0];
        if x.shape[1] != in_dim {
            return Err(TensorError::ShapeMismatch {
                op: "matmul",
                lhs: self.shape.clone(),
                rhs: x.shape.clone(),
            });
        }
        let mut y = vec![0.0f32; batch * out_dim];
        for k in 0..batch {
            for o in 0..out_dim {
                let mut sum = 0.0;
                for i in 0..in_dim {
                    sum += self.data[o * in_dim + i] * x.data[k * in_dim + i];
                }
                y[k * out_dim + o] = sum;
            }
        }
        Ok(Tensor::from_vec(vec![batch, out_dim], y))
    }

    /// Adds a `[dim]` vector to every row of a `[batch, dim]` tensor.
    pub fn add_broadcast(&self, bias: &Tensor) -> Result<Tensor, TensorError> {
        if self.shape.len() != 2 {
            return Err(TensorError::Rank {
                op: "add_broadcast",
                expected: 2,
                shape: self.shape.clone(),
            });
        }
        if bias.shape.len() != 1 || bias.shape[0] != self.shape[1] {
            return Err(TensorError::ShapeMismatch {
                op: "add_broadcast",
                lhs: self.shape.clone(),
                rhs: bias.shape.clone(),
            });
        }
        let dim = self.shape[1];
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, &v)| v + bias.data[i % dim])
            .collect();
        Ok(Tensor::from_vec(self.shape.clone(), data))
    }

    /// Concatenates two `[batch, d]` tensors along the last axis.
    pub fn cat(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        if self.shape.len() != 2 || other.shape.len() != 2 || self.shape[0] != other.shape[0] {
            return Err(TensorError::ShapeMismatch {
                op: "cat",
                lhs: self.shape.clone(),
                rhs: other.shape.clone(),
            });
        }
        let batch = self.shape[0];
        let (da, db) = (self.shape[1], other.shape[1]);
        let mut data = Vec::with_capacity(batch * (da + db));
        for k in 0..batch {
            data.extend_from_slice(&self.data[k * da..(k + 1) * da]);
            data.extend_from_slice(&other.data[k * db..(k + 1) * db]);
        }
        Ok(Tensor::from_vec(vec![batch, da + db], data))
    }

    /// Indexes one position along `axis`, removing that axis from the shape.
    pub fn select(&self, axis: usize, index: usize) -> Result<Tensor, TensorError> {
        if axis >= self.shape.len() || index >= self.shape[axis] {
            return Err(TensorError::Index {
                op: "select",
                index,
                axis,
                shape: self.shape.clone(),
            });
        }
        let outer: usize = self.shape[..axis].iter().product();
        let dim = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product();
        let mut data = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            let start = (o * dim + index) * inner;
            data.extend_from_slice(&self.data[start..start + inner]);
        }
        let mut shape = self.shape.clone();
        shape.remove(axis);
        Ok(Tensor::from_vec(shape, data))
    }

    /// Reinterprets the data under a new shape with the same element count.
    pub fn reshape(&self, shape: Vec<usize>) -> Result<Tensor, TensorError> {
        if shape.iter().product::<usize>() != self.data.len() {
            return Err(TensorError::ShapeMismatch {
                op: "reshape",
                lhs: self.shape.clone(),
                rhs: shape,
            });
        }
        Ok(Tensor::from_vec(shape, self.data.clone()))
    }

    pub fn relu(&self) -> Tensor {
        let data = self.data.iter().map(|&v| v.max(0.0)).collect();
        Tensor::from_vec(self.shape.clone(), data)
    }

    pub fn tanh(&self) -> Tensor {
        let data = self.data.iter().map(|&v| v.tanh()).collect();
        Tensor::from_vec(self.shape.clone(), data)
    }

    pub fn sigmoid(&self) -> Tensor {
        let data = self.data.iter().map(|&v| 1.0 / (1.0 + (-v).exp())).collect();
        Tensor::from_vec(self.shape.clone(), data)
    }
}
