// This file is part of Opsigner.
//
// Opsigner is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Opsigner is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Opsigner.
// If not, see https://www.gnu.org/licenses/.

//! Helper traits for logging errors as they are propagated.

use std::fmt::{Debug, Display};

use anyhow::Context;
use tracing::Level;

/// Log an error and wrap it with context in an `anyhow::Error`.
pub trait LogWithContext<T> {
    /// Logs the original error at error level, then attaches `context`.
    fn log_context<C>(self, context: C) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static;
}

/// Log an error while keeping the original error type.
pub trait LogOnError: Sized {
    /// Logs at error level if this is an error.
    fn log_on_error<C: Display>(self, context: C) -> Self {
        self.log_on_error_level(Level::ERROR, context)
    }

    /// Logs at `level` if this is an error.
    fn log_on_error_level<C: Display>(self, level: Level, context: C) -> Self;
}

impl<T, E> LogWithContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn log_context<C>(self, context: C) -> anyhow::Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|error| {
            tracing::error!("{context}: {error:?}");
            error
        })
        .context(context)
    }
}

impl<T, E: Debug> LogOnError for Result<T, E> {
    fn log_on_error_level<C: Display>(self, level: Level, context: C) -> Self {
        if let Err(error) = &self {
            log_at_level(level, &format!("{context}: {error:?}"));
        }
        self
    }
}

fn log_at_level(level: Level, s: &str) {
    match level {
        Level::TRACE => tracing::trace!("{s}"),
        Level::DEBUG => tracing::debug!("{s}"),
        Level::INFO => tracing::info!("{s}"),
        Level::WARN => tracing::warn!("{s}"),
        Level::ERROR => tracing::error!("{s}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    #[test]
    fn test_log_context() {
        let result: Result<(), Refused> = Err(Refused);
        let error = result.log_context("node unreachable").unwrap_err();
        assert_eq!(error.to_string(), "node unreachable");
        assert!(error.downcast_ref::<Refused>().is_some());
    }

    #[test]
    fn test_log_on_error_keeps_value() {
        let ok: Result<u32, String> = Ok(3);
        assert_eq!(ok.log_on_error("unused").unwrap(), 3);
        let err: Result<u32, String> = Err("bad".to_string());
        assert_eq!(
            err.log_on_error_level(Level::WARN, "context").unwrap_err(),
            "bad"
        );
    }
}
