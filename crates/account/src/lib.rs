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

#![warn(missing_docs, unreachable_pub, unused_crate_dependencies)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
//! HumanAccount signers.
//!
//! An account signer turns a [`CallIntent`] into a signed ERC-4337 operation for one smart
//! account and hands it to a [`opsigner_sender::Sender`]. The owner key can deploy the account
//! and register device keys, device keys can only act on an account that already exists.

use alloy_primitives::{Address, Signature, B256};
use async_trait::async_trait;
use opsigner_types::{CallIntent, KeyRole, SubmissionReceipt};

mod builder;
pub use builder::OperationBuilder;

mod device;
pub use device::DeviceAccountSigner;

mod error;
pub use error::{Error, Result};

mod owner;
pub use owner::OwnerAccountSigner;

mod resolver;
pub use resolver::AddressResolver;

mod signer;
pub use signer::{AccountSettings, AccountSigner, SignerState};

/// A key acting for a smart account
#[async_trait]
pub trait SmartAccountSigner: Send + Sync {
    /// Role of the key on the account
    fn role(&self) -> KeyRole;

    /// Address of the account
    async fn address(&mut self) -> Result<Address>;

    /// Execute `call` from the account
    async fn execute(&mut self, call: CallIntent) -> Result<SubmissionReceipt>;

    /// Sign an application hash
    async fn sign_hash(&self, hash: B256) -> Result<Signature>;
}
