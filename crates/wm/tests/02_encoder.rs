use nn::Mode;
use tensor::Tensor;
use wm::{Backbone, Encoder, ModelError, ProjectionHead};

#[test]
fn backbone_flat_feature_arithmetic() {
    // 65 -> 31 -> 6 through the two pooling stages, 12 channels: 12*6*6.
    fastrand::seed(5);
    let backbone = Backbone::new(64, 3, 65, 65, 12, 128).unwrap();
    assert_eq!(backbone.flat_features(), 432);
}

#[test]
fn backbone_forward_shape() {
    fastrand::seed(5);
    let mut backbone = Backbone::new(64, 3, 65, 65, 12, 128).unwrap();
    let x = Tensor::zeros(vec![2, 3, 65, 65]);
    let y = backbone.forward(&x, Mode::Eval).unwrap();
    assert_eq!(y.shape(), &[2, 64]);
}

#[test]
fn backbone_rejects_wrong_channel_count() {
    fastrand::seed(5);
    let mut backbone = Backbone::new(16, 2, 17, 17, 4, 32).unwrap();
    let x = Tensor::zeros(vec![1, 3, 17, 17]);
    assert!(matches!(
        backbone.forward(&x, Mode::Eval),
        Err(ModelError::ShapeMismatch { .. })
    ));
}

#[test]
fn backbone_rejects_unsupported_channel_config() {
    assert!(matches!(
        Backbone::new(16, 4, 65, 65, 12, 32),
        Err(ModelError::ShapeMismatch { .. })
    ));
}

#[test]
fn backbone_rejects_frames_too_small_to_pool() {
    assert!(matches!(
        Backbone::new(16, 2, 8, 8, 4, 32),
        Err(ModelError::ShapeMismatch { .. })
    ));
}

#[test]
fn encoder_emits_representation_and_projection() {
    fastrand::seed(5);
    let backbone = Backbone::new(16, 2, 17, 17, 4, 32).unwrap();
    let projection = ProjectionHead::new(16, 24, 24, 3);
    let mut encoder = Encoder::new(backbone, projection).unwrap();
    assert_eq!(encoder.repr_dim(), 16);
    assert_eq!(encoder.proj_dim(), 24);

    let x = Tensor::from_vec(
        vec![2, 2, 17, 17],
        (0..2 * 2 * 17 * 17).map(|v| (v % 7) as f32 * 0.1).collect(),
    );
    let (repr, proj) = encoder.forward(&x, Mode::Eval).unwrap();
    assert_eq!(repr.shape(), &[2, 16]);
    assert_eq!(proj.shape(), &[2, 24]);
}

#[test]
fn encoder_eval_is_deterministic() {
    fastrand::seed(5);
    let backbone = Backbone::new(16, 2, 17, 17, 4, 32).unwrap();
    let projection = ProjectionHead::new(16, 24, 24, 3);
    let mut encoder = Encoder::new(backbone, projection).unwrap();
    let x = Tensor::from_vec(
        vec![1, 2, 17, 17],
        (0..2 * 17 * 17).map(|v| (v % 5) as f32 * 0.2 - 0.4).collect(),
    );
    let (r1, p1) = encoder.forward(&x, Mode::Eval).unwrap();
    let (r2, p2) = encoder.forward(&x, Mode::Eval).unwrap();
    assert_eq!(r1.data(), r2.data());
    assert_eq!(p1.data(), p2.data());
}

#[test]
fn encoder_rejects_projection_input_mismatch() {
    fastrand::seed(5);
    let backbone = Backbone::new(16, 2, 17, 17, 4, 32).unwrap();
    let projection = ProjectionHead::new(32, 24, 24, 3);
    assert!(matches!(
        Encoder::new(backbone, projection),
        Err(ModelError::ShapeMismatch { .. })
    ));
}
