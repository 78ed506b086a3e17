#![deny(clippy::all)]

//! Action-conditioned latent world model in the JEPA family.
//!
//! An [`Encoder`] maps observation frames into latent representations, and a
//! [`Predictor`] propagates that latent state forward in time conditioned on
//! actions, without ever decoding back to pixel space. The encoder also
//! exposes a higher-dimensional expander projection for an external
//! VICReg-style regularization loss.

pub mod config;
pub mod encoder;
pub mod error;
pub mod predictor;
pub mod prober;
pub mod world;

pub use config::{PredictorKind, WorldModelConfig};
pub use encoder::{Backbone, Encoder, ProjectionHead};
pub use error::ModelError;
pub use predictor::{LinearPredictor, Predictor, PredictorState, RecurrentPredictor};
pub use prober::Prober;
pub use world::WorldModel;
