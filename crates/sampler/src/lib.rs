//! # cfact-sampler
//!
//! Posterior sampling behind a small capability interface. A model exposes
//! itself as a [`LogDensity`] over unconstrained reals, and any [`Sampler`]
//! turns it into a [`Trace`] of constrained draws.
//!
//! The shipped sampler drives the `emcee` crate's affine-invariant ensemble,
//! one ensemble per chain. Chains run in parallel on a rayon pool owned by the
//! sampler and check a shared [`Deadline`] between short segments.
//!
//! ```mermaid
//! graph LR
//!     A[LogDensity] --> B[init: centre point]
//!     B --> C[EnsembleSampler chains]
//!     C --> D[Trace]
//!     D --> E[Diagnostics]
//! ```

mod config;
mod deadline;
mod diagnostics;
mod ensemble;
mod error;
mod init;
mod sampler;
mod target;
mod trace;

pub use config::{InitStrategy, SamplerConfig};
pub use deadline::Deadline;
pub use diagnostics::{Diagnostics, rhat};
pub use ensemble::EnsembleSampler;
pub use error::SamplerError;
pub use sampler::Sampler;
pub use target::{LogDensity, ParamBlock, Transform, layout_width};
pub use trace::Trace;
