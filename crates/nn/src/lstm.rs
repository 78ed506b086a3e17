use tensor::{Tensor, TensorError};

/// A single gated recurrent cell (LSTM).
///
/// Gate layout follows the usual `[input, forget, cell, output]` stacking in
/// the `[4 * hidden, _]` weight matrices.
#[derive(Clone)]
pub struct LstmCell {
    /// Input-to-hidden weights, `[4 * hidden, input]`.
    pub w_ih: Tensor,
    /// Hidden-to-hidden weights, `[4 * hidden, hidden]`.
    pub w_hh: Tensor,
    pub b_ih: Tensor,
    pub b_hh: Tensor,
    pub input_size: usize,
    pub hidden_size: usize,
}

impl LstmCell {
    pub fn new(
        w_ih: Vec<f32>,
        w_hh: Vec<f32>,
        b_ih: Vec<f32>,
        b_hh: Vec<f32>,
        input_size: usize,
        hidden_size: usize,
    ) -> Self {
        assert_eq!(w_ih.len(), 4 * hidden_size * input_size);
        assert_eq!(w_hh.len(), 4 * hidden_size * hidden_size);
        assert_eq!(b_ih.len(), 4 * hidden_size);
        assert_eq!(b_hh.len(), 4 * hidden_size);
        Self {
            w_ih: Tensor::from_vec(vec![4 * hidden_size, input_size], w_ih),
            w_hh: Tensor::from_vec(vec![4 * hidden_size, hidden_size], w_hh),
            b_ih: Tensor::from_vec(vec![4 * hidden_size], b_ih),
            b_hh: Tensor::from_vec(vec![4 * hidden_size], b_hh),
            input_size,
            hidden_size,
        }
    }

    pub fn random(input_size: usize, hidden_size: usize) -> Self {
        let limit = (1.0 / hidden_size as f32).sqrt();
        let mut sample = |len: usize| -> Vec<f32> {
            (0..len)
                .map(|_| fastrand::f32() * 2.0 * limit - limit)
                .collect()
        };
        let w_ih = sample(4 * hidden_size * input_size);
        let w_hh = sample(4 * hidden_size * hidden_size);
        let b_ih = sample(4 * hidden_size);
        let b_hh = sample(4 * hidden_size);
        Self::new(w_ih, w_hh, b_ih, b_hh, input_size, hidden_size)
    }

    /// Advances the cell by one step.
    ///
    /// `x` is `[batch, input]`, `h` and `c` are `[batch, hidden]`; returns
    /// the new `(h, c)` pair.
    pub fn forward(
        &self,
        x: &Tensor,
        h: &Tensor,
        c: &Tensor,
    ) -> Result<(Tensor, Tensor), TensorError> {
        let gates_x = self.w_ih.matmul(x)?.add_broadcast(&self.b_ih)?;
        let gates_h = self.w_hh.matmul(h)?.add_broadcast(&self.b_hh)?;
        let gates = gates_x.add(&gates_h)?;

        let batch = x.shape[0];
        let hd = self.hidden_size;
        let mut new_h = vec![0.0f32; batch * hd];
        let mut new_c = vec![0.0f32; batch * hd];
        for k in 0..batch {
            let row = k * 4 * hd;
            for j in 0..hd {
                let i_g = sigmoid(gates.data[row + j]);
                let f_g = sigmoid(gates.data[row + hd + j]);
                let g_g = gates.data[row + 2 * hd + j].tanh();
                let o_g = sigmoid(gates.data[row + 3 * hd + j]);
                let cell = f_g * c.data[k * hd + j] + i_g * g_g;
                new_c[k * hd + j] = cell;
                new_h[k * hd + j] = o_g * cell.tanh();
            }
        }
        Ok((
            Tensor::from_vec(vec![batch, hd], new_h),
            Tensor::from_vec(vec![batch, hd], new_c),
        ))
    }
}

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}
