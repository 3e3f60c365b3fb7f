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

use std::marker::PhantomData;

use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::Provider as AlloyProvider;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_transport::Transport;

use crate::{EvmProvider, ProviderResult, TxStatus};

/// Evm Provider implementation using [alloy-provider](https://github.com/alloy-rs/alloy-rs)
#[derive(Clone)]
pub struct AlloyEvmProvider<AP, T> {
    inner: AP,
    _marker: PhantomData<T>,
}

impl<AP, T> AlloyEvmProvider<AP, T> {
    /// Create a new `AlloyEvmProvider`
    pub fn new(inner: AP) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<AP, T> From<AP> for AlloyEvmProvider<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T>,
{
    fn from(inner: AP) -> Self {
        Self::new(inner)
    }
}

#[async_trait::async_trait]
impl<AP, T> EvmProvider for AlloyEvmProvider<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T>,
{
    async fn get_chain_id(&self) -> ProviderResult<u64> {
        Ok(self.inner.get_chain_id().await?)
    }

    async fn get_block_number(&self) -> ProviderResult<u64> {
        Ok(self.inner.get_block_number().await?)
    }

    async fn get_balance(&self, address: Address) -> ProviderResult<U256> {
        Ok(self.inner.get_balance(address).await?)
    }

    async fn get_code(&self, address: Address) -> ProviderResult<Bytes> {
        Ok(self.inner.get_code_at(address).await?)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> ProviderResult<TxHash> {
        let pending = self.inner.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn get_transaction_status(&self, tx_hash: TxHash) -> ProviderResult<TxStatus> {
        let status = match self.inner.get_transaction_receipt(tx_hash).await? {
            Some(receipt) => TxStatus::Mined {
                block_number: receipt.block_number.unwrap_or_default(),
                success: receipt.status(),
            },
            None => TxStatus::Pending,
        };
        Ok(status)
    }
}
