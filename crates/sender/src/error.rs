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

use alloy_primitives::Address;
use opsigner_provider::ProviderError;

/// Result of a sender call
pub type SenderResult<T> = Result<T, SenderError>;

/// Sender errors
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    /// The operation carries no signature
    #[error("operation is not signed")]
    MissingSignature,
    /// The relay does not accept operations for the entry point
    #[error("relay does not support entry point {entry_point:?}, supported: {supported:?}")]
    UnsupportedDispatchContract {
        /// Configured entry point
        entry_point: Address,
        /// Entry points the relay reported
        supported: Vec<Address>,
    },
    /// The entry point or the relay refused the operation
    #[error("operation rejected: {0}")]
    SubmissionRejected(String),
    /// Provider error
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
