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
use opsigner_sender::SenderError;
use opsigner_types::KeyRole;

/// Result of an account signer call
pub type Result<T> = std::result::Result<T, Error>;

/// Account signer errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The signer has no account address, or the account belongs to another factory
    #[error("account address is not resolved")]
    UnresolvedAccount,
    /// The account nonce could not be read
    #[error("failed to read account nonce: {0}")]
    StaleNonce(ProviderError),
    /// The signing key could not sign
    #[error("key unavailable: {0}")]
    KeyUnavailable(String),
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
    /// An operation reached a sender without a signature
    #[error("operation is not signed")]
    MissingSignature,
    /// Only the owner may deploy the account
    #[error("{0} key cannot deploy the account")]
    DeployNotPermitted(KeyRole),
    /// Only the owner may manage device keys
    #[error("{0} key cannot manage device keys")]
    NotPermitted(KeyRole),
    /// No code at the address the signer was asked to connect to
    #[error("no account deployed at {0:?}")]
    NotDeployed(Address),
    /// Provider error
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SenderError> for Error {
    fn from(value: SenderError) -> Self {
        match value {
            SenderError::MissingSignature => Error::MissingSignature,
            SenderError::UnsupportedDispatchContract {
                entry_point,
                supported,
            } => Error::UnsupportedDispatchContract {
                entry_point,
                supported,
            },
            SenderError::SubmissionRejected(reason) => Error::SubmissionRejected(reason),
            SenderError::Provider(error) => Error::Provider(error),
            SenderError::Other(error) => Error::Other(error),
        }
    }
}

impl From<opsigner_signer::Error> for Error {
    fn from(value: opsigner_signer::Error) -> Self {
        match value {
            opsigner_signer::Error::KeyUnavailable(reason)
            | opsigner_signer::Error::InvalidKey(reason) => Error::KeyUnavailable(reason),
            opsigner_signer::Error::NotPermitted(role) => Error::NotPermitted(role),
            opsigner_signer::Error::Other(error) => Error::Other(error),
        }
    }
}
