use crate::config::{PredictorKind, WorldModelConfig};
use crate::encoder::{Backbone, Encoder, ProjectionHead};
use crate::error::ModelError;
use crate::predictor::{LinearPredictor, Predictor, PredictorState, RecurrentPredictor};
use nn::Mode;
use tensor::Tensor;

/// Orchestrates the encoder and one predictor variant.
///
/// Owns the seeding and rollout protocol: the predictor state does not exist
/// before the first seed, reuse across trajectories requires a fresh seed,
/// and `rollout` reseeds unconditionally from the first observation.
pub struct WorldModel {
    encoder: Encoder,
    predictor: Predictor,
    state: Option<PredictorState>,
    seed_from_expander: bool,
}

impl WorldModel {
    pub fn new(config: &WorldModelConfig) -> Result<Self, ModelError> {
        let backbone = Backbone::new(
            config.embed_size,
            config.in_channels,
            config.frame_height,
            config.frame_width,
            config.conv_channels,
            config.fc_hidden,
        )?;
        let projection = ProjectionHead::new(
            config.embed_size,
            config.projection_hidden,
            config.projection_dim,
            config.projection_layers,
        );
        let encoder = Encoder::new(backbone, projection)?;
        let predictor = match config.predictor {
            PredictorKind::Recurrent => Predictor::Recurrent(RecurrentPredictor::new(
                config.action_dim,
                config.hidden_size,
            )),
            PredictorKind::Linear => Predictor::Linear(LinearPredictor::new(
                config.embed_size,
                config.hidden_size,
                config.action_dim,
                config.closed_loop,
            )),
        };
        Self::from_parts(encoder, predictor, config.seed_from_expander)
    }

    /// Composes an externally built encoder and predictor.
    ///
    /// The seed dimension (representation or projection, per
    /// `seed_from_expander`) must match the predictor's own dimension; the
    /// check runs here so the mismatch surfaces before any numeric work.
    pub fn from_parts(
        encoder: Encoder,
        predictor: Predictor,
        seed_from_expander: bool,
    ) -> Result<Self, ModelError> {
        let seed_dim = if seed_from_expander {
            encoder.proj_dim()
        } else {
            encoder.repr_dim()
        };
        if seed_dim != predictor.repr_dim() {
            return Err(ModelError::ShapeMismatch {
                context: "world model seed dimension",
                expected: vec![predictor.repr_dim()],
                got: vec![seed_dim],
            });
        }
        tracing::info!(
            repr_dim = predictor.repr_dim(),
            action_dim = predictor.action_dim(),
            seed_from_expander,
            "world model assembled"
        );
        Ok(Self {
            encoder,
            predictor,
            state: None,
            seed_from_expander,
        })
    }

    /// Dimension of the representations the predictor emits.
    pub fn repr_dim(&self) -> usize {
        self.predictor.repr_dim()
    }

    pub fn state(&self) -> Option<&PredictorState> {
        self.state.as_ref()
    }

    /// Encodes a frame batch and installs the predictor seed.
    ///
    /// Selects the representation or the projection per `use_expander`; for
    /// the recurrent variant `alt_seed_cell` supplies the cell seed. Returns
    /// the seed value.
    pub fn seed_from_observation(
        &mut self,
        frames: &Tensor,
        alt_seed_cell: Option<Tensor>,
        use_expander: bool,
        mode: Mode,
    ) -> Result<Tensor, ModelError> {
        let (repr, proj) = self.encoder.forward(frames, mode)?;
        let seed = if use_expander { proj } else { repr };
        self.state = Some(self.predictor.seed_state(seed.clone(), alt_seed_cell)?);
        Ok(seed)
    }

    /// Zeroes the current predictor state in place, preserving its shape.
    ///
    /// The state is not usable again until the next seed; calling this before
    /// any seed is an error rather than a fabricated state of undefined shape.
    pub fn reset_state(&mut self) -> Result<(), ModelError> {
        match self.state.as_mut() {
            Some(state) => {
                state.zero_in_place();
                Ok(())
            }
            None => Err(ModelError::UninitializedState(
                "reset requested before any seed",
            )),
        }
    }

    /// One teacher-forced step.
    ///
    /// With an action, advances the predictor and returns the predicted
    /// representation; with an observation, independently runs the encoder
    /// and returns `(representation, projection)`. Either, both, or neither
    /// may be supplied; only the predict branch touches the predictor state.
    #[allow(clippy::type_complexity)]
    pub fn step(
        &mut self,
        action: Option<&Tensor>,
        observation: Option<&Tensor>,
        mode: Mode,
    ) -> Result<(Option<Tensor>, Option<(Tensor, Tensor)>), ModelError> {
        let predicted = match action {
            Some(action) => {
                let state = self.state.as_ref().ok_or(ModelError::UninitializedState(
                    "step requested before any seed",
                ))?;
                let (y, next) = self.predictor.step(state, action)?;
                self.state = Some(next);
                Some(y)
            }
            None => None,
        };
        let encoded = match observation {
            Some(observation) => Some(self.encoder.forward(observation, mode)?),
            None => None,
        };
        Ok((predicted, encoded))
    }

    /// Full autoregressive rollout.
    ///
    /// `actions` is `[B, L, A]`; `observations` is `[B, T, C, H, W]`, of
    /// which only the first frame is encoded, to seed the state. Slot 0 of
    /// the result holds the seed unmodified; slot i is the representation
    /// after consuming `actions[:, i-1]`. Output is `[B, L+1, D]`.
    pub fn rollout(
        &mut self,
        actions: &Tensor,
        observations: &Tensor,
        mode: Mode,
    ) -> Result<Tensor, ModelError> {
        if observations.shape.len() != 5 {
            return Err(ModelError::ShapeMismatch {
                context: "rollout observations rank",
                expected: vec![5],
                got: observations.shape.clone(),
            });
        }
        if actions.shape.len() != 3 || actions.shape[0] != observations.shape[0] {
            return Err(ModelError::ShapeMismatch {
                context: "rollout actions",
                expected: vec![observations.shape[0], 0, self.predictor.action_dim()],
                got: actions.shape.clone(),
            });
        }
        let batch = observations.shape[0];
        let horizon = actions.shape[1];
        let dim = self.repr_dim();
        tracing::debug!(batch, horizon, dim, "rollout");

        let first = observations.select(1, 0)?;
        let alt_cell = match &self.predictor {
            Predictor::Recurrent(p) => Some(Tensor::zeros(vec![batch, p.hidden_size()])),
            Predictor::Linear(_) => None,
        };
        let seed = self.seed_from_observation(&first, alt_cell, self.seed_from_expander, mode)?;

        let mut result = vec![0.0f32; batch * (horizon + 1) * dim];
        for b in 0..batch {
            result[(b * (horizon + 1)) * dim..(b * (horizon + 1) + 1) * dim]
                .copy_from_slice(&seed.data[b * dim..(b + 1) * dim]);
        }
        for i in 1..=horizon {
            let action = actions.select(1, i - 1)?;
            let state = self.state.as_ref().ok_or(ModelError::UninitializedState(
                "rollout state lost between steps",
            ))?;
            let (predicted, next) = self.predictor.step(state, &action)?;
            self.state = Some(next);
            for b in 0..batch {
                result[(b * (horizon + 1) + i) * dim..(b * (horizon + 1) + i + 1) * dim]
                    .copy_from_slice(&predicted.data[b * dim..(b + 1) * dim]);
            }
        }
        Ok(Tensor::from_vec(vec![batch, horizon + 1, dim], result))
    }
}
