use crate::energy_field::EnergyFieldError;

/// Errors returned by bakers.
#[derive(Debug, PartialEq)]
pub enum BakeError {
    /// Another bake operation is already in progress on this baker.
    BakeInProgress,

    /// The worker threads could not be created.
    ThreadPoolCreation(String),

    /// An energy field could not be created for simulation.
    EnergyField(EnergyFieldError),
}

impl std::error::Error for BakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EnergyField(error) => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for BakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::BakeInProgress => {
                write!(f, "another bake operation is already in progress")
            }
            Self::ThreadPoolCreation(reason) => {
                write!(f, "failed to create bake thread pool: {reason}")
            }
            Self::EnergyField(error) => write!(f, "failed to create energy field: {error}"),
        }
    }
}

impl From<EnergyFieldError> for BakeError {
    fn from(error: EnergyFieldError) -> Self {
        Self::EnergyField(error)
    }
}

impl From<rayon::ThreadPoolBuildError> for BakeError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPoolCreation(error.to_string())
    }
}
