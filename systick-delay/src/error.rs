//! Harness errors

use crate::config::ConfigError;

/// Harness error
///
/// `E` is the error type of the report sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error<E> {
    /// The configuration was rejected
    Config(ConfigError),

    /// The report sink failed
    Write(E),

    /// A report line could not be formatted
    Format,
}

impl<E> From<ConfigError> for Error<E> {
    #[inline]
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}
