#![deny(clippy::all)]

pub mod conv;
pub mod dense;
pub mod lstm;
pub mod mode;
pub mod norm;

pub use conv::{Conv2d, MaxPool2d};
pub use dense::Dense;
pub use lstm::LstmCell;
pub use mode::Mode;
pub use norm::{BatchNorm1d, BatchNorm2d};
