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

use alloy_signer_local::LocalSignerError;
use opsigner_types::KeyRole;

/// Error type for the signer crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key could not produce a signature
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),
    /// Key material could not be loaded
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// The operation requires a different key role
    #[error("operation not permitted for {0} key")]
    NotPermitted(KeyRole),
    /// Other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for the signer crate
pub type Result<T> = std::result::Result<T, Error>;

impl From<alloy_signer::Error> for Error {
    fn from(value: alloy_signer::Error) -> Self {
        Error::KeyUnavailable(value.to_string())
    }
}

impl From<LocalSignerError> for Error {
    fn from(value: LocalSignerError) -> Self {
        Error::InvalidKey(value.to_string())
    }
}
