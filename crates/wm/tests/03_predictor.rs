use nn::{Dense, LstmCell};
use tensor::Tensor;
use wm::{LinearPredictor, ModelError, Predictor, PredictorState, RecurrentPredictor};

fn zero_cell(hidden: usize) -> LstmCell {
    LstmCell::new(
        vec![0.0; 4 * hidden],
        vec![0.0; 4 * hidden * hidden],
        vec![0.0; 4 * hidden],
        vec![0.0; 4 * hidden],
        1,
        hidden,
    )
}

#[test]
fn recurrent_step_returns_hidden() {
    let predictor = RecurrentPredictor::from_cell(zero_cell(2));
    let state = predictor
        .seed(
            Tensor::zeros(vec![1, 2]),
            Tensor::from_vec(vec![1, 2], vec![1.0, 2.0]),
        )
        .unwrap();
    let action = Tensor::from_vec(vec![1, 1], vec![0.5]);
    let predictor = Predictor::Recurrent(predictor);
    let (y, next) = predictor.step(&state, &action).unwrap();

    // zero cell: c' = 0.5*c, h' = 0.5*tanh(c')
    assert!((y.data()[0] - 0.5 * 0.5f32.tanh()).abs() < 1e-6);
    assert!((y.data()[1] - 0.5 * 1.0f32.tanh()).abs() < 1e-6);
    match next {
        PredictorState::Recurrent { h, c } => {
            assert_eq!(h.data(), y.data());
            assert!((c.data()[0] - 0.5).abs() < 1e-6);
        }
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn recurrent_seed_dimension_checked() {
    let predictor = RecurrentPredictor::new(2, 4);
    let err = predictor
        .seed(Tensor::zeros(vec![1, 3]), Tensor::zeros(vec![1, 3]))
        .unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { .. }));
}

/// Linear predictor computing exactly prev + action for any sign, via
/// relu(v) - relu(-v) decomposition.
fn passthrough_linear(closed_loop: bool) -> LinearPredictor {
    let l1 = Dense::new(
        vec![
            1.0, 0.0, //
            -1.0, 0.0, //
            0.0, 1.0, //
            0.0, -1.0,
        ],
        vec![0.0; 4],
        2,
        4,
    );
    let l2 = Dense::new(vec![1.0, -1.0, 1.0, -1.0], vec![0.0], 4, 1);
    LinearPredictor::from_layers(l1, l2, 1, closed_loop).unwrap()
}

#[test]
fn linear_open_loop_stays_anchored_to_seed() {
    let predictor = passthrough_linear(false);
    let seed = Tensor::from_vec(vec![1, 1], vec![-0.3]);
    let state = predictor.seed(seed.clone()).unwrap();
    let predictor = Predictor::Linear(predictor);

    let a1 = Tensor::from_vec(vec![1, 1], vec![0.4]);
    let (y1, state) = predictor.step(&state, &a1).unwrap();
    assert!((y1.data()[0] - 0.1).abs() < 1e-6);

    // the stored embedding did not move, so the second step still composes
    // with the original seed
    let a2 = Tensor::from_vec(vec![1, 1], vec![1.0]);
    let (y2, state) = predictor.step(&state, &a2).unwrap();
    assert!((y2.data()[0] - 0.7).abs() < 1e-6);
    match state {
        PredictorState::Anchor { prev } => assert_eq!(prev.data(), seed.data()),
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn linear_closed_loop_composes() {
    let predictor = passthrough_linear(true);
    let state = predictor
        .seed(Tensor::from_vec(vec![1, 1], vec![-0.3]))
        .unwrap();
    let predictor = Predictor::Linear(predictor);

    let a = Tensor::from_vec(vec![1, 1], vec![0.4]);
    let (y1, state) = predictor.step(&state, &a).unwrap();
    assert!((y1.data()[0] - 0.1).abs() < 1e-6);
    let (y2, _) = predictor.step(&state, &a).unwrap();
    assert!((y2.data()[0] - 0.5).abs() < 1e-6);
}

#[test]
fn linear_seed_dimension_checked() {
    let predictor = LinearPredictor::new(8, 16, 2, false);
    assert!(predictor.seed(Tensor::zeros(vec![1, 4])).is_err());
}

#[test]
fn action_shape_checked() {
    let predictor = Predictor::Linear(passthrough_linear(false));
    let state = predictor
        .seed_state(Tensor::zeros(vec![2, 1]), None)
        .unwrap();
    // wrong action width
    let bad = Tensor::zeros(vec![2, 3]);
    assert!(predictor.step(&state, &bad).is_err());
    // wrong batch
    let bad = Tensor::zeros(vec![1, 1]);
    assert!(predictor.step(&state, &bad).is_err());
}

#[test]
fn mismatched_state_variant_rejected() {
    let recurrent = Predictor::Recurrent(RecurrentPredictor::from_cell(zero_cell(1)));
    let anchor = PredictorState::Anchor {
        prev: Tensor::zeros(vec![1, 1]),
    };
    let action = Tensor::zeros(vec![1, 1]);
    assert_eq!(
        recurrent.step(&anchor, &action).unwrap_err(),
        ModelError::MismatchedState
    );
}

#[test]
fn zero_in_place_preserves_shape() {
    let mut state = PredictorState::Recurrent {
        h: Tensor::from_vec(vec![2, 3], vec![1.0; 6]),
        c: Tensor::from_vec(vec![2, 3], vec![2.0; 6]),
    };
    state.zero_in_place();
    match state {
        PredictorState::Recurrent { h, c } => {
            assert_eq!(h.shape(), &[2, 3]);
            assert_eq!(c.shape(), &[2, 3]);
            assert!(h.data().iter().chain(c.data()).all(|&v| v == 0.0));
        }
        other => panic!("unexpected state {other:?}"),
    }
}
