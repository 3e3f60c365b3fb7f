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
use alloy_provider::Provider as AlloyProvider;
use alloy_rpc_types_eth::Filter;
use alloy_sol_types::{ContractError as SolContractError, SolEvent};
use alloy_transport::{Transport, TransportError};
use anyhow::Context;
use opsigner_contracts::v0_6::{
    IEntryPoint::{
        FailedOp, IEntryPointErrors, IEntryPointInstance, UserOperationEvent,
        UserOperationRevertReason,
    },
    UserOperation as ContractUserOperation,
};
use opsigner_types::{UserOperation, UserOperationReceipt};

use crate::{EntryPoint, HandleOpsOut, ProviderResult};

/// Entry point provider for v0.6
#[derive(Clone)]
pub struct AlloyEntryPoint<AP, T> {
    i_entry_point: IEntryPointInstance<T, AP>,
}

impl<AP, T> AlloyEntryPoint<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T>,
{
    /// Create a new `EntryPoint` instance for v0.6
    pub fn new(entry_point_address: Address, provider: AP) -> Self {
        Self {
            i_entry_point: IEntryPointInstance::new(entry_point_address, provider),
        }
    }

    async fn find_revert_reason(
        &self,
        op_hash: B256,
        block_number: u64,
    ) -> ProviderResult<Option<alloy_primitives::Bytes>> {
        let filter = Filter::new()
            .address(*self.i_entry_point.address())
            .event_signature(UserOperationRevertReason::SIGNATURE_HASH)
            .topic1(op_hash)
            .from_block(block_number)
            .to_block(block_number);
        let logs = self.i_entry_point.provider().get_logs(&filter).await?;
        let Some(log) = logs.into_iter().next() else {
            return Ok(None);
        };
        let event = log
            .log_decode::<UserOperationRevertReason>()
            .context("should decode user operation revert reason")?;
        Ok(Some(event.inner.data.revertReason))
    }
}

#[async_trait::async_trait]
impl<AP, T> EntryPoint for AlloyEntryPoint<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T> + 'static,
{
    fn address(&self) -> Address {
        *self.i_entry_point.address()
    }

    async fn get_nonce(&self, sender: Address, key: U192) -> ProviderResult<U256> {
        Ok(self.i_entry_point.getNonce(sender, key).call().await?.nonce)
    }

    async fn balance_of(&self, address: Address) -> ProviderResult<U256> {
        Ok(self.i_entry_point.balanceOf(address).call().await?._0)
    }

    async fn deposit_to(&self, address: Address, value: U256) -> ProviderResult<TxHash> {
        let call = self.i_entry_point.depositTo(address).value(value);
        let pending = call.send().await?;
        Ok(*pending.tx_hash())
    }

    async fn send_handle_ops(
        &self,
        ops: Vec<UserOperation>,
        beneficiary: Address,
    ) -> ProviderResult<HandleOpsOut> {
        let ops: Vec<ContractUserOperation> = ops.into_iter().map(Into::into).collect();
        let tx = self
            .i_entry_point
            .handleOps(ops, beneficiary)
            .into_transaction_request();
        let provider = self.i_entry_point.provider();

        match provider.call(&tx).await {
            Ok(_) => {}
            Err(TransportError::ErrorResp(resp)) => {
                return match resp.as_decoded_error::<SolContractError<IEntryPointErrors>>(false) {
                    Some(SolContractError::CustomError(IEntryPointErrors::FailedOp(FailedOp {
                        opIndex,
                        reason,
                    }))) => Ok(HandleOpsOut::FailedOp(
                        opIndex
                            .try_into()
                            .context("returned opIndex out of bounds")?,
                        reason,
                    )),
                    Some(SolContractError::CustomError(
                        IEntryPointErrors::SignatureValidationFailed(err),
                    )) => Ok(HandleOpsOut::SignatureValidationFailed(err.aggregator)),
                    _ => Err(TransportError::ErrorResp(resp).into()),
                };
            }
            Err(error) => return Err(error.into()),
        }

        let pending = provider.send_transaction(tx).await?;
        Ok(HandleOpsOut::Sent(*pending.tx_hash()))
    }

    async fn find_user_operation_event(
        &self,
        op_hash: B256,
        from_block: u64,
    ) -> ProviderResult<Option<UserOperationReceipt>> {
        let filter = Filter::new()
            .address(self.address())
            .event_signature(UserOperationEvent::SIGNATURE_HASH)
            .topic1(op_hash)
            .from_block(from_block);
        let logs = self.i_entry_point.provider().get_logs(&filter).await?;
        let Some(log) = logs.into_iter().next() else {
            return Ok(None);
        };

        let transaction_hash = log
            .transaction_hash
            .context("user operation event should have a transaction hash")?;
        let block_number = log
            .block_number
            .context("user operation event should have a block number")?;
        let event = log
            .log_decode::<UserOperationEvent>()
            .context("should decode user operation event")?
            .inner
            .data;

        let reason = if event.success {
            None
        } else {
            self.find_revert_reason(op_hash, block_number).await?
        };

        Ok(Some(UserOperationReceipt {
            op_hash,
            sender: event.sender,
            nonce: event.nonce,
            success: event.success,
            actual_gas_cost: event.actualGasCost,
            actual_gas_used: event.actualGasUsed,
            reason,
            transaction_hash,
            block_number,
        }))
    }
}
