//! # cfact-model
//!
//! Per-cell statistical model of the detrending workflow. A cell's daily
//! series and the global mean temperature (GMT) regressor are aligned into a
//! [`RegressionFrame`], fitted as a harmonic regression whose seasonal cycle
//! is modulated by GMT ([`DetrendModel`]), and turned back into original
//! units with the GMT-driven change removed ([`Reconstruction`]).
//!
//! ```mermaid
//! graph LR
//!     A[TimeAxis + series + GMT] --> B[RegressionFrame]
//!     B --> C[HarmonicBasis]
//!     B --> D[DetrendModel]
//!     C --> D
//!     D -->|LogDensity| E[Sampler]
//!     E --> F[Trace]
//!     F --> G[Reconstruction]
//! ```
//!
//! Everything is fitted on min-max scaled data; [`ModelConfig`] priors are
//! therefore relative to a unit range.

mod config;
mod design;
mod error;
mod fourier;
mod frame;
mod linalg;
mod model;
mod reconstruct;
mod time;

pub use config::{MAX_MODES, ModelConfig};
pub use error::ModelError;
pub use fourier::{DAYS_PER_YEAR, HarmonicBasis, fourier_series, yearly_period};
pub use frame::{RegressionFrame, check_regressor};
pub use model::{
    BETA_TREND, BETA_YEARLY, DetrendModel, INTERCEPT, REQUIRED_PARAMS, SIGMA, SLOPE,
};
pub use reconstruct::{Reconstruction, ValueBounds};
pub use time::{TimeAxis, TimeUnit, TimeUnits, check_calendar};
