//! The sampling capability seam.

use crate::deadline::Deadline;
use crate::error::SamplerError;
use crate::target::LogDensity;
use crate::trace::Trace;

/// Draws posterior samples from a [`LogDensity`].
///
/// Implementations must honour `deadline` by returning
/// [`SamplerError::Timeout`] once it has passed, and must not leave partial
/// state behind when they fail.
pub trait Sampler: Sync {
    /// Samples `target` and returns every chain's draws.
    ///
    /// # Errors
    ///
    /// [`SamplerError::InvalidConfig`] is fatal for a whole run; every other
    /// variant only concerns this target.
    fn sample(&self, target: &dyn LogDensity, deadline: &Deadline) -> Result<Trace, SamplerError>;
}
