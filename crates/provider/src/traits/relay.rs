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

use alloy_primitives::{Address, B256};
#[cfg(feature = "test-utils")]
use mockall::automock;
use opsigner_types::{GasSpec, UserOperation, UserOperationReceipt};

use crate::ProviderResult;

/// Trait for the ERC-4337 JSON-RPC methods of a relay node (bundler).
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait RelayProvider: Send + Sync + 'static {
    /// `eth_supportedEntryPoints`
    async fn supported_entry_points(&self) -> ProviderResult<Vec<Address>>;

    /// `eth_sendUserOperation`, returns the operation hash computed by the relay
    async fn send_user_operation(
        &self,
        op: UserOperation,
        entry_point: Address,
    ) -> ProviderResult<B256>;

    /// `eth_estimateUserOperationGas`
    async fn estimate_user_operation_gas(
        &self,
        op: UserOperation,
        entry_point: Address,
    ) -> ProviderResult<GasSpec>;

    /// `eth_getUserOperationReceipt`
    async fn get_user_operation_receipt(
        &self,
        op_hash: B256,
    ) -> ProviderResult<Option<UserOperationReceipt>>;
}
