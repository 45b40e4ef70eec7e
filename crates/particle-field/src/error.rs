//! Errors raised while validating or building a particle field

/// Configuration errors. Frame updates never fail; only generation inputs
/// and panel-supplied names can be rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("particle count must be at least 1")]
    NoParticles,
    #[error("particle count {0} exceeds the maximum of {max}", max = crate::MAX_PARTICLES)]
    TooManyParticles(usize),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite")]
    NonFinite { name: &'static str },
    #[error("galaxy needs at least one segment")]
    ZeroSegments,
    #[error("return speed must lie in (0, 1], got {0}")]
    InvalidReturnSpeed(f32),
    #[error("unknown field function `{0}`")]
    UnknownFunction(String),
    #[error("unknown experiment `{0}`")]
    UnknownExperiment(String),
}

pub type FieldResult<T> = Result<T, FieldError>;

/// Reject zero, negative and non-finite values for a named parameter.
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> FieldResult<()> {
    if !value.is_finite() {
        return Err(FieldError::NonFinite { name });
    }
    if value <= 0.0 {
        return Err(FieldError::NonPositive { name, value });
    }
    Ok(())
}

pub(crate) fn ensure_count(count: usize) -> FieldResult<()> {
    match count {
        0 => Err(FieldError::NoParticles),
        n if n > crate::MAX_PARTICLES => Err(FieldError::TooManyParticles(n)),
        _ => Ok(()),
    }
}
