use tensor::TensorError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A predictor step or reset was requested before any seed was installed.
    #[error("predictor state is uninitialized: {0}")]
    UninitializedState(&'static str),

    /// A dimension disagreement caught at construction or first call.
    #[error("shape mismatch in {context}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// A prober architecture string contained a token that is not a positive
    /// integer.
    #[error("invalid prober architecture {arch:?}: token {token:?} is not a positive integer")]
    Configuration { arch: String, token: String },

    /// A predictor state belonging to the other predictor variant.
    #[error("predictor state does not match the predictor variant")]
    MismatchedState,

    #[error(transparent)]
    Tensor(#[from] TensorError),
}
