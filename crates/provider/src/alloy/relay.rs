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

use alloy_primitives::{Address, Bytes, B256, U128, U256, U64};
use alloy_provider::Provider as AlloyProvider;
use alloy_transport::Transport;
use opsigner_types::{GasSpec, UserOperation, UserOperationReceipt};
use serde::{Deserialize, Serialize};

use crate::{ProviderResult, RelayProvider};

/// Relay (bundler) provider speaking the ERC-4337 `eth_` namespace
#[derive(Clone)]
pub struct AlloyRelayProvider<AP, T> {
    inner: AP,
    _marker: PhantomData<T>,
}

impl<AP, T> AlloyRelayProvider<AP, T> {
    /// Create a new `AlloyRelayProvider`
    pub fn new(inner: AP) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<AP, T> RelayProvider for AlloyRelayProvider<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T> + 'static,
{
    async fn supported_entry_points(&self) -> ProviderResult<Vec<Address>> {
        Ok(self
            .inner
            .raw_request("eth_supportedEntryPoints".into(), ())
            .await?)
    }

    async fn send_user_operation(
        &self,
        op: UserOperation,
        entry_point: Address,
    ) -> ProviderResult<B256> {
        Ok(self
            .inner
            .raw_request(
                "eth_sendUserOperation".into(),
                (RpcUserOperation::from(op), entry_point),
            )
            .await?)
    }

    async fn estimate_user_operation_gas(
        &self,
        op: UserOperation,
        entry_point: Address,
    ) -> ProviderResult<GasSpec> {
        let estimate: RpcGasEstimate = self
            .inner
            .raw_request(
                "eth_estimateUserOperationGas".into(),
                (RpcUserOperation::from(op), entry_point),
            )
            .await?;
        Ok(estimate.into())
    }

    async fn get_user_operation_receipt(
        &self,
        op_hash: B256,
    ) -> ProviderResult<Option<UserOperationReceipt>> {
        let receipt: Option<RpcUserOperationReceipt> = self
            .inner
            .raw_request("eth_getUserOperationReceipt".into(), (op_hash,))
            .await?;
        Ok(receipt.map(Into::into))
    }
}

/// User operation as sent over RPC
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct RpcUserOperation {
    sender: Address,
    nonce: U256,
    init_code: Bytes,
    call_data: Bytes,
    call_gas_limit: U128,
    verification_gas_limit: U128,
    pre_verification_gas: U128,
    max_fee_per_gas: U128,
    max_priority_fee_per_gas: U128,
    paymaster_and_data: Bytes,
    signature: Bytes,
}

impl From<UserOperation> for RpcUserOperation {
    fn from(op: UserOperation) -> Self {
        RpcUserOperation {
            sender: op.sender,
            nonce: op.nonce,
            init_code: op.init_code,
            call_data: op.call_data,
            call_gas_limit: U128::from(op.call_gas_limit),
            verification_gas_limit: U128::from(op.verification_gas_limit),
            pre_verification_gas: U128::from(op.pre_verification_gas),
            max_fee_per_gas: U128::from(op.max_fee_per_gas),
            max_priority_fee_per_gas: U128::from(op.max_priority_fee_per_gas),
            paymaster_and_data: op.paymaster_and_data,
            signature: op.signature,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcGasEstimate {
    pre_verification_gas: U256,
    verification_gas_limit: U256,
    call_gas_limit: U256,
}

impl From<RpcGasEstimate> for GasSpec {
    fn from(estimate: RpcGasEstimate) -> Self {
        GasSpec {
            verification_gas_limit: estimate.verification_gas_limit.saturating_to(),
            call_gas_limit: estimate.call_gas_limit.saturating_to(),
            pre_verification_gas: estimate.pre_verification_gas.saturating_to(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcUserOperationReceipt {
    user_op_hash: B256,
    sender: Address,
    nonce: U256,
    actual_gas_cost: U256,
    actual_gas_used: U256,
    success: bool,
    #[serde(default)]
    reason: String,
    receipt: RpcTransactionReceipt,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransactionReceipt {
    transaction_hash: B256,
    block_number: U64,
}

impl From<RpcUserOperationReceipt> for UserOperationReceipt {
    fn from(receipt: RpcUserOperationReceipt) -> Self {
        UserOperationReceipt {
            op_hash: receipt.user_op_hash,
            sender: receipt.sender,
            nonce: receipt.nonce,
            success: receipt.success,
            actual_gas_cost: receipt.actual_gas_cost,
            actual_gas_used: receipt.actual_gas_used,
            reason: parse_reason(receipt.reason),
            transaction_hash: receipt.receipt.transaction_hash,
            block_number: receipt.receipt.block_number.to(),
        }
    }
}

// relays report the revert reason either as hex revert data or as plain text
fn parse_reason(reason: String) -> Option<Bytes> {
    if reason.is_empty() || reason == "0x" {
        return None;
    }
    Some(
        reason
            .parse::<Bytes>()
            .unwrap_or_else(|_| Bytes::from(reason.into_bytes())),
    )
}
