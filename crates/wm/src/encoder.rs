use crate::error::ModelError;
use nn::{BatchNorm1d, BatchNorm2d, Conv2d, Dense, MaxPool2d, Mode};
use tensor::Tensor;

/// Convolutional feature extractor.
///
/// Three 3x3 stride-1 same-padding stages at a constant channel width, each
/// conv -> batch norm -> ReLU. Stages 2 and 3 add a residual skip from their
/// stage input before a spatial max pool (5x5/2, then 5x5/5). The pooled map
/// is flattened and passed through two fully connected layers to the
/// embedding size. A 65x65 frame reduces 65 -> 31 -> 6 spatially.
pub struct Backbone {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    bn1: BatchNorm2d,
    bn2: BatchNorm2d,
    bn3: BatchNorm2d,
    pool1: MaxPool2d,
    pool2: MaxPool2d,
    fc1: Dense,
    fc2: Dense,
    in_channels: usize,
    frame_height: usize,
    frame_width: usize,
    flat_features: usize,
    embed_size: usize,
}

impl Backbone {
    pub fn new(
        embed_size: usize,
        in_channels: usize,
        frame_height: usize,
        frame_width: usize,
        conv_channels: usize,
        fc_hidden: usize,
    ) -> Result<Self, ModelError> {
        if in_channels != 2 && in_channels != 3 {
            return Err(ModelError::ShapeMismatch {
                context: "backbone input channels",
                expected: vec![2, 3],
                got: vec![in_channels],
            });
        }
        let pool1 = MaxPool2d::new(5, 2);
        let pool2 = MaxPool2d::new(5, 5);
        let pooled = pool1
            .out_len(frame_height)
            .zip(pool1.out_len(frame_width))
            .and_then(|(h, w)| pool2.out_len(h).zip(pool2.out_len(w)));
        let (h2, w2) = pooled.ok_or_else(|| ModelError::ShapeMismatch {
            context: "backbone frame size",
            expected: vec![65, 65],
            got: vec![frame_height, frame_width],
        })?;
        let flat_features = conv_channels * h2 * w2;
        Ok(Self {
            conv1: Conv2d::random(in_channels, conv_channels, 3),
            conv2: Conv2d::random(conv_channels, conv_channels, 3),
            conv3: Conv2d::random(conv_channels, conv_channels, 3),
            bn1: BatchNorm2d::new(conv_channels),
            bn2: BatchNorm2d::new(conv_channels),
            bn3: BatchNorm2d::new(conv_channels),
            pool1,
            pool2,
            fc1: Dense::random(flat_features, fc_hidden),
            fc2: Dense::random(fc_hidden, embed_size),
            in_channels,
            frame_height,
            frame_width,
            flat_features,
            embed_size,
        })
    }

    /// Number of flattened features entering the first fully connected layer.
    pub fn flat_features(&self) -> usize {
        self.flat_features
    }

    pub fn embed_size(&self) -> usize {
        self.embed_size
    }

    /// Maps a frame batch `[B, C, H, W]` to embeddings `[B, embed_size]`.
    pub fn forward(&mut self, x: &Tensor, mode: Mode) -> Result<Tensor, ModelError> {
        if x.shape.len() != 4
            || x.shape[1] != self.in_channels
            || x.shape[2] != self.frame_height
            || x.shape[3] != self.frame_width
        {
            return Err(ModelError::ShapeMismatch {
                context: "backbone input",
                expected: vec![
                    self.in_channels,
                    self.frame_height,
                    self.frame_width,
                ],
                got: x.shape.clone(),
            });
        }
        let x1 = self.bn1.forward(&self.conv1.forward(x)?, mode)?.relu();

        let x2 = self.bn2.forward(&self.conv2.forward(&x1)?, mode)?.relu();
        let x2 = x2.add(&x1)?;
        let x2 = self.pool1.forward(&x2)?;

        let x3 = self.bn3.forward(&self.conv3.forward(&x2)?, mode)?.relu();
        let x3 = x3.add(&x2)?;
        let x3 = self.pool2.forward(&x3)?;

        let batch = x3.shape[0];
        let flat = x3.reshape(vec![batch, self.flat_features])?;
        let hidden = self.fc1.forward(&flat)?.relu();
        Ok(self.fc2.forward(&hidden)?)
    }
}

/// Expander head producing the projection used by the regularization loss.
///
/// (Dense -> batch norm -> ReLU) repeated, final layer linear only.
pub struct ProjectionHead {
    blocks: Vec<(Dense, BatchNorm1d)>,
    out: Dense,
    input_dim: usize,
    output_dim: usize,
}

impl ProjectionHead {
    pub fn new(input_dim: usize, hidden_dim: usize, output_dim: usize, num_layers: usize) -> Self {
        assert!(num_layers >= 2);
        let mut blocks = Vec::with_capacity(num_layers - 1);
        let mut in_dim = input_dim;
        for _ in 0..num_layers - 1 {
            blocks.push((Dense::random(in_dim, hidden_dim), BatchNorm1d::new(hidden_dim)));
            in_dim = hidden_dim;
        }
        let out = Dense::random(in_dim, output_dim);
        Self {
            blocks,
            out,
            input_dim,
            output_dim,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn forward(&mut self, x: &Tensor, mode: Mode) -> Result<Tensor, ModelError> {
        let mut h = x.clone();
        for (dense, norm) in &mut self.blocks {
            h = norm.forward(&dense.forward(&h)?, mode)?.relu();
        }
        Ok(self.out.forward(&h)?)
    }
}

/// Composition of the backbone and the expander head.
pub struct Encoder {
    backbone: Backbone,
    projection: ProjectionHead,
}

impl Encoder {
    pub fn new(backbone: Backbone, projection: ProjectionHead) -> Result<Self, ModelError> {
        if projection.input_dim() != backbone.embed_size() {
            return Err(ModelError::ShapeMismatch {
                context: "projection head input",
                expected: vec![backbone.embed_size()],
                got: vec![projection.input_dim()],
            });
        }
        Ok(Self {
            backbone,
            projection,
        })
    }

    pub fn repr_dim(&self) -> usize {
        self.backbone.embed_size()
    }

    pub fn proj_dim(&self) -> usize {
        self.projection.output_dim()
    }

    /// Maps a frame batch to `(representation, projection)`.
    ///
    /// The representation is the flattened backbone output; the projection is
    /// consumed only by the external regularization loss unless explicitly
    /// configured as the predictor seed.
    pub fn forward(&mut self, x: &Tensor, mode: Mode) -> Result<(Tensor, Tensor), ModelError> {
        let repr = self.backbone.forward(x, mode)?;
        let proj = self.projection.forward(&repr, mode)?;
        Ok((repr, proj))
    }
}
