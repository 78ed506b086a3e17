/// Which predictor variant a [`crate::WorldModel`] is built with.
///
/// Chosen once at construction, never dispatched per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictorKind {
    /// Gated recurrent cell carrying a (hidden, cell) state pair.
    Recurrent,
    /// Feed-forward network over the stored previous embedding and the
    /// action.
    Linear,
}

/// Construction parameters for a [`crate::WorldModel`].
#[derive(Clone, Debug)]
pub struct WorldModelConfig {
    /// Observation channels, 2 or 3.
    pub in_channels: usize,
    pub frame_height: usize,
    pub frame_width: usize,
    /// Backbone embedding size D, the representation dimension.
    pub embed_size: usize,
    /// Recurrent hidden size H, or the feed-forward width of the linear
    /// predictor.
    pub hidden_size: usize,
    pub action_dim: usize,
    /// Width of the backbone's channel planes.
    pub conv_channels: usize,
    /// Width of the first fully connected backbone layer.
    pub fc_hidden: usize,
    pub projection_hidden: usize,
    /// Expander output size P.
    pub projection_dim: usize,
    /// Total linear layers in the expander head.
    pub projection_layers: usize,
    pub predictor: PredictorKind,
    /// Seed the predictor from the projection instead of the representation.
    pub seed_from_expander: bool,
    /// Linear variant only: feed each prediction back as the next stored
    /// embedding instead of staying anchored to the seed.
    pub closed_loop: bool,
}

impl Default for WorldModelConfig {
    fn default() -> Self {
        Self {
            in_channels: 2,
            frame_height: 65,
            frame_width: 65,
            embed_size: 512,
            hidden_size: 1024,
            action_dim: 2,
            conv_channels: 12,
            fc_hidden: 4096,
            projection_hidden: 1024,
            projection_dim: 1024,
            projection_layers: 3,
            predictor: PredictorKind::Recurrent,
            seed_from_expander: true,
            closed_loop: false,
        }
    }
}
