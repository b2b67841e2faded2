//! Centralized error type for the multitau umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] multitau_core::Error),

    #[error("Simulation: {0}")]
    Sim(#[from] multitau_sim::Error),

    #[error("Thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<multitau_core::ConfigurationError> for Error {
    fn from(e: multitau_core::ConfigurationError) -> Self {
        Error::Core(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
