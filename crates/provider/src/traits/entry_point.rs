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

use alloy_primitives::{aliases::U192, Address, TxHash, B256, U256};
#[cfg(feature = "test-utils")]
use mockall::automock;
use opsigner_types::{UserOperation, UserOperationReceipt};

use crate::ProviderResult;

/// Result of an entry point handle ops submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleOpsOut {
    /// Call passed and the transaction was sent
    Sent(TxHash),
    /// Call failed due to a failed operation at index `usize` with reason `String`
    FailedOp(usize, String),
    /// Call failed due to a signature validation failure
    SignatureValidationFailed(Address),
}

/// Trait for interacting with an entry point contract.
/// Implemented for the v0.6 version of the entry point contract.
/// [Contracts can be found here](https://github.com/eth-infinitism/account-abstraction/tree/v0.6.0).
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait EntryPoint: Send + Sync + 'static {
    /// Get the address of the entry point contract
    fn address(&self) -> Address;

    /// Get the next nonce of `sender` for nonce `key`
    async fn get_nonce(&self, sender: Address, key: U192) -> ProviderResult<U256>;

    /// Get the deposit of an address
    async fn balance_of(&self, address: Address) -> ProviderResult<U256>;

    /// Deposit `value` for `address`
    async fn deposit_to(&self, address: Address, value: U256) -> ProviderResult<TxHash>;

    /// Call `handleOps` and, if the call passes, send it as a transaction
    async fn send_handle_ops(
        &self,
        ops: Vec<UserOperation>,
        beneficiary: Address,
    ) -> ProviderResult<HandleOpsOut>;

    /// Find the `UserOperationEvent` for an operation hash, searching from `from_block`
    async fn find_user_operation_event(
        &self,
        op_hash: B256,
        from_block: u64,
    ) -> ProviderResult<Option<UserOperationReceipt>>;
}
