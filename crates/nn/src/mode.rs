/// Execution context for a forward pass.
///
/// Threaded explicitly through every call instead of being carried as hidden
/// instance state. The only observable divergence is in the normalization
/// layers: `Train` accumulates running population statistics, `Eval` uses the
/// frozen ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }
}
