use tensor::{Tensor, TensorError};

/// A 2-D convolution over `[batch, channels, height, width]` inputs.
///
/// Stride is fixed at 1; padding defaults to `kernel / 2` so odd kernels
/// preserve the spatial resolution.
#[derive(Clone)]
pub struct Conv2d {
    /// Kernel weights, `[out_channels, in_channels, kernel, kernel]`.
    pub w: Tensor,
    /// Per-output-channel bias.
    pub b: Tensor,
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel: usize,
    pub padding: usize,
}

impl Conv2d {
    pub fn new(
        weights: Vec<f32>,
        bias: Vec<f32>,
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
    ) -> Self {
        assert_eq!(weights.len(), out_channels * in_channels * kernel * kernel);
        assert_eq!(bias.len(), out_channels);
        Self {
            w: Tensor::from_vec(vec![out_channels, in_channels, kernel, kernel], weights),
            b: Tensor::from_vec(vec![out_channels], bias),
            in_channels,
            out_channels,
            kernel,
            padding: kernel / 2,
        }
    }

    pub fn random(in_channels: usize, out_channels: usize, kernel: usize) -> Self {
        let fan_in = in_channels * kernel * kernel;
        let fan_out = out_channels * kernel * kernel;
        let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
        let weights = (0..out_channels * in_channels * kernel * kernel)
            .map(|_| fastrand::f32() * 2.0 * limit - limit)
            .collect();
        let bias = vec![0.0; out_channels];
        Self::new(weights, bias, in_channels, out_channels, kernel)
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        if x.shape.len() != 4 {
            return Err(TensorError::Rank {
                op: "conv2d",
                expected: 4,
                shape: x.shape.clone(),
            });
        }
        if x.shape[1] != self.in_channels {
            return Err(TensorError::ShapeMismatch {
                op: "conv2d",
                lhs: self.w.shape.clone(),
                rhs: x.shape.clone(),
            });
        }
        let (batch, _, h, w) = (x.shape[0], x.shape[1], x.shape[2], x.shape[3]);
        let k = self.kernel;
        let pad = self.padding as isize;
        let mut out = vec![0.0f32; batch * self.out_channels * h * w];
        for n in 0..batch {
            for oc in 0..self.out_channels {
                for oh in 0..h {
                    for ow in 0..w {
                        let mut sum = self.b.data[oc];
                        for ic in 0..self.in_channels {
                            for kh in 0..k {
                                let ih = oh as isize + kh as isize - pad;
                                if ih < 0 || ih >= h as isize {
                                    continue;
                                }
                                for kw in 0..k {
                                    let iw = ow as isize + kw as isize - pad;
                                    if iw < 0 || iw >= w as isize {
                                        continue;
                                    }
                                    let xi = ((n * self.in_channels + ic) * h
                                        + ih as usize)
                                        * w
                                        + iw as usize;
                                    let wi = ((oc * self.in_channels + ic) * k + kh) * k + kw;
                                    sum += self.w.data[wi] * x.data[xi];
                                }
                            }
                        }
                        out[((n * self.out_channels + oc) * h + oh) * w + ow] = sum;
                    }
                }
            }
        }
        Ok(Tensor::from_vec(vec![batch, self.out_channels, h, w], out))
    }
}

/// Max pooling over square windows of `[batch, channels, height, width]`.
#[derive(Clone, Copy)]
pub struct MaxPool2d {
    pub kernel: usize,
    pub stride: usize,
}

impl MaxPool2d {
    pub fn new(kernel: usize, stride: usize) -> Self {
        assert!(kernel > 0 && stride > 0);
        Self { kernel, stride }
    }

    /// Output spatial extent for one axis: `(len - kernel) / stride + 1`.
    pub fn out_len(&self, len: usize) -> Option<usize> {
        if len < self.kernel {
            None
        } else {
            Some((len - self.kernel) / self.stride + 1)
        }
    }

    pub fn forward(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        if x.shape.len() != 4 {
            return Err(TensorError::Rank {
                op: "max_pool2d",
                expected: 4,
                shape: x.shape.clone(),
            });
        }
        let (batch, ch, h, w) = (x.shape[0], x.shape[1], x.shape[2], x.shape[3]);
        let (oh, ow) = match (self.out_len(h), self.out_len(w)) {
            (Some(oh), Some(ow)) => (oh, ow),
            _ => {
                return Err(TensorError::ShapeMismatch {
                    op: "max_pool2d",
                    lhs: vec![self.kernel, self.kernel],
                    rhs: x.shape.clone(),
                })
            }
        };
        let mut out = vec![0.0f32; batch * ch * oh * ow];
        for n in 0..batch {
            for c in 0..ch {
                for py in 0..oh {
                    for px in 0..ow {
                        let mut best = f32::NEG_INFINITY;
                        for ky in 0..self.kernel {
                            for kx in 0..self.kernel {
                                let iy = py * self.stride + ky;
                                let ix = px * self.stride + kx;
                                let v = x.data[((n * ch + c) * h + iy) * w + ix];
                                if v > best {
                                    best = v;
                                }
                            }
                        }
                        out[((n * ch + c) * oh + py) * ow + px] = best;
                    }
                }
            }
        }
        Ok(Tensor::from_vec(vec![batch, ch, oh, ow], out))
    }
}
