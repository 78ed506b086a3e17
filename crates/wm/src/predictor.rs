use crate::error::ModelError;
use nn::{Dense, LstmCell};
use tensor::Tensor;

/// Recurrent state threaded through predictor steps.
///
/// Produced only by seeding; a step consumes one state and returns the next,
/// so reset points and lifetime stay explicit.
#[derive(Clone, Debug, PartialEq)]
pub enum PredictorState {
    /// Hidden/cell pair of the gated recurrent variant, each `[B, H]`.
    Recurrent { h: Tensor, c: Tensor },
    /// Stored previous embedding of the linear variant, `[B, D]`.
    Anchor { prev: Tensor },
}

impl PredictorState {
    /// Zeroes the state in place, preserving its shape.
    pub fn zero_in_place(&mut self) {
        match self {
            PredictorState::Recurrent { h, c } => {
                h.zero_in_place();
                c.zero_in_place();
            }
            PredictorState::Anchor { prev } => prev.zero_in_place(),
        }
    }
}

/// Predictor driven by a gated recurrent cell over the action sequence.
pub struct RecurrentPredictor {
    cell: LstmCell,
}

impl RecurrentPredictor {
    pub fn new(action_dim: usize, hidden_size: usize) -> Self {
        Self {
            cell: LstmCell::random(action_dim, hidden_size),
        }
    }

    pub fn from_cell(cell: LstmCell) -> Self {
        Self { cell }
    }

    pub fn hidden_size(&self) -> usize {
        self.cell.hidden_size
    }

    pub fn action_dim(&self) -> usize {
        self.cell.input_size
    }

    /// Installs an externally supplied `(hidden, cell)` seed.
    pub fn seed(&self, h: Tensor, c: Tensor) -> Result<PredictorState, ModelError> {
        let want = self.hidden_size();
        for t in [&h, &c] {
            if t.shape.len() != 2 || t.shape[1] != want {
                return Err(ModelError::ShapeMismatch {
                    context: "recurrent predictor seed",
                    expected: vec![want],
                    got: t.shape.clone(),
                });
            }
        }
        if h.shape[0] != c.shape[0] {
            return Err(ModelError::ShapeMismatch {
                context: "recurrent predictor seed",
                expected: h.shape.clone(),
                got: c.shape.clone(),
            });
        }
        Ok(PredictorState::Recurrent { h, c })
    }

    /// One transition: `(h', c') = cell(action, (h, c))`; the predicted
    /// representation is `h'`.
    pub fn step(
        &self,
        h: &Tensor,
        c: &Tensor,
        action: &Tensor,
    ) -> Result<(Tensor, PredictorState), ModelError> {
        check_action(action, self.action_dim(), h.shape[0])?;
        let (new_h, new_c) = self.cell.forward(action, h, c)?;
        Ok((
            new_h.clone(),
            PredictorState::Recurrent { h: new_h, c: new_c },
        ))
    }
}

/// Stateless-recurrence predictor driven by the stored previous embedding.
///
/// `concat(prev, action)` passes through a two-layer feed-forward network.
/// With `closed_loop` off the stored embedding stays anchored to the seed,
/// reproducing the observed open-loop behavior; with it on, each prediction
/// becomes the next stored embedding.
pub struct LinearPredictor {
    l1: Dense,
    l2: Dense,
    embed_dim: usize,
    action_dim: usize,
    closed_loop: bool,
}

impl LinearPredictor {
    pub fn new(embed_dim: usize, hidden_dim: usize, action_dim: usize, closed_loop: bool) -> Self {
        Self {
            l1: Dense::random(embed_dim + action_dim, hidden_dim),
            l2: Dense::random(hidden_dim, embed_dim),
            embed_dim,
            action_dim,
            closed_loop,
        }
    }

    /// Builds the predictor from explicit layers; `l1` must accept
    /// `embed + action` inputs and `l2` must emit `embed` outputs.
    pub fn from_layers(
        l1: Dense,
        l2: Dense,
        action_dim: usize,
        closed_loop: bool,
    ) -> Result<Self, ModelError> {
        let embed_dim = l2.out_dim;
        if l1.in_dim != embed_dim + action_dim {
            return Err(ModelError::ShapeMismatch {
                context: "linear predictor layers",
                expected: vec![embed_dim + action_dim],
                got: vec![l1.in_dim],
            });
        }
        Ok(Self {
            l1,
            l2,
            embed_dim,
            action_dim,
            closed_loop,
        })
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn is_closed_loop(&self) -> bool {
        self.closed_loop
    }

    /// Installs the initial embedding.
    pub fn seed(&self, embedding: Tensor) -> Result<PredictorState, ModelError> {
        if embedding.shape.len() != 2 || embedding.shape[1] != self.embed_dim {
            return Err(ModelError::ShapeMismatch {
                context: "linear predictor seed",
                expected: vec![self.embed_dim],
                got: embedding.shape.clone(),
            });
        }
        Ok(PredictorState::Anchor { prev: embedding })
    }

    pub fn step(
        &self,
        prev: &Tensor,
        action: &Tensor,
    ) -> Result<(Tensor, PredictorState), ModelError> {
        check_action(action, self.action_dim, prev.shape[0])?;
        let x = prev.cat(action)?;
        let x = self.l1.forward(&x)?.relu();
        let y = self.l2.forward(&x)?;
        let next = if self.closed_loop {
            PredictorState::Anchor { prev: y.clone() }
        } else {
            PredictorState::Anchor { prev: prev.clone() }
        };
        Ok((y, next))
    }
}

/// Predictor variant, fixed at construction.
pub enum Predictor {
    Recurrent(RecurrentPredictor),
    Linear(LinearPredictor),
}

impl Predictor {
    /// Dimension of the representations this predictor emits.
    pub fn repr_dim(&self) -> usize {
        match self {
            Predictor::Recurrent(p) => p.hidden_size(),
            Predictor::Linear(p) => p.embed_dim(),
        }
    }

    pub fn action_dim(&self) -> usize {
        match self {
            Predictor::Recurrent(p) => p.action_dim(),
            Predictor::Linear(p) => p.action_dim(),
        }
    }

    /// Builds the state variant matching this predictor from a seed value.
    ///
    /// For the recurrent variant `alt_cell` supplies the cell seed, defaulting
    /// to zeros of the seed's shape; the linear variant ignores it.
    pub fn seed_state(
        &self,
        seed: Tensor,
        alt_cell: Option<Tensor>,
    ) -> Result<PredictorState, ModelError> {
        match self {
            Predictor::Recurrent(p) => {
                let cell = alt_cell.unwrap_or_else(|| Tensor::zeros_like(&seed));
                p.seed(seed, cell)
            }
            Predictor::Linear(p) => p.seed(seed),
        }
    }

    /// Consumes a state and an action, returning the predicted representation
    /// and the successor state.
    pub fn step(
        &self,
        state: &PredictorState,
        action: &Tensor,
    ) -> Result<(Tensor, PredictorState), ModelError> {
        match (self, state) {
            (Predictor::Recurrent(p), PredictorState::Recurrent { h, c }) => p.step(h, c, action),
            (Predictor::Linear(p), PredictorState::Anchor { prev }) => p.step(prev, action),
            _ => Err(ModelError::MismatchedState),
        }
    }
}

fn check_action(action: &Tensor, action_dim: usize, batch: usize) -> Result<(), ModelError> {
    if action.shape.len() != 2 || action.shape[1] != action_dim || action.shape[0] != batch {
        return Err(ModelError::ShapeMismatch {
            context: "predictor action",
            expected: vec![batch, action_dim],
            got: action.shape.clone(),
        });
    }
    Ok(())
}
