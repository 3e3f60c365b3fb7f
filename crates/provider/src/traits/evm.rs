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

//! Trait for interacting with chain data.

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_rpc_types_eth::TransactionRequest;
#[cfg(feature = "test-utils")]
use mockall::automock;

use super::error::ProviderResult;

/// Status of a sent transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// No receipt yet
    Pending,
    /// Mined in a block
    Mined {
        /// Block number
        block_number: u64,
        /// False if the transaction reverted
        success: bool,
    },
}

/// Trait for interacting with chain data.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait EvmProvider: Send + Sync {
    /// Get the chain id
    async fn get_chain_id(&self) -> ProviderResult<u64>;

    /// Get the current block number
    async fn get_block_number(&self) -> ProviderResult<u64>;

    /// Get the balance of an address
    async fn get_balance(&self, address: Address) -> ProviderResult<U256>;

    /// Get the code at an address
    async fn get_code(&self, address: Address) -> ProviderResult<Bytes>;

    /// Send a transaction through the node, signed by the provider's wallet if it has one
    async fn send_transaction(&self, tx: TransactionRequest) -> ProviderResult<TxHash>;

    /// Get the status of a sent transaction
    async fn get_transaction_status(&self, tx_hash: TxHash) -> ProviderResult<TxStatus>;
}
