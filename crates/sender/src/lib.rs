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

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
//! Submission of signed user operations.
//!
//! A [`LocalSender`] calls the entry point directly from a funded EOA, a [`RelaySender`] hands
//! the operation to a relay node over the ERC-4337 RPC namespace. Both wait for inclusion up to a
//! configured timeout.

use std::time::Duration;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use opsigner_provider::{EntryPoint, EvmProvider, RelayProvider};
use opsigner_types::{GasSpec, SubmissionReceipt, UserOperation};

mod error;
pub use error::{SenderError, SenderResult};

mod local;
pub use local::LocalSender;

mod metrics;

mod relay;
pub use relay::RelaySender;

/// How long, and how often, to look for an operation's inclusion
#[derive(Clone, Copy, Debug)]
pub struct InclusionSettings {
    /// Give up waiting after this long and report the status as unknown
    pub timeout: Duration,
    /// Delay between inclusion checks
    pub poll_interval: Duration,
}

impl Default for InclusionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Submits signed operations and reports their inclusion
#[async_trait]
#[enum_dispatch(SenderEnum<_E,_V,_R>)]
pub trait Sender: Send + Sync + 'static {
    /// Entry point operations are submitted to
    fn entry_point(&self) -> Address;

    /// Submit a signed operation and wait for its inclusion.
    ///
    /// Returns a receipt with status `Unknown` if the wait times out.
    async fn submit(&self, op: UserOperation) -> SenderResult<SubmissionReceipt>;

    /// Gas limits for `op`, or `None` if this sender does not estimate
    async fn estimate_gas(&self, op: &UserOperation) -> SenderResult<Option<GasSpec>>;

    /// Look up the inclusion of a previously submitted operation
    async fn get_receipt(&self, op_hash: B256) -> SenderResult<SubmissionReceipt>;
}

/// Either sender kind
#[enum_dispatch]
#[derive(Clone)]
pub enum SenderEnum<E, V, R>
where
    E: EntryPoint + Clone,
    V: EvmProvider + Clone + 'static,
    R: RelayProvider + Clone,
{
    /// Direct entry point submission
    Local(LocalSender<E, V>),
    /// Relay submission
    Relay(RelaySender<R>),
}

fn ensure_signed(op: &UserOperation) -> SenderResult<()> {
    if op.is_signed() {
        Ok(())
    } else {
        Err(SenderError::MissingSignature)
    }
}
