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

use alloy_primitives::{Address, TxHash, B256};
use async_trait::async_trait;
use opsigner_provider::{EntryPoint, EvmProvider, HandleOpsOut, TxStatus};
use opsigner_types::{GasSpec, SubmissionReceipt, UserOperation};
use tracing::{info, warn};

use crate::{
    ensure_signed, metrics::SenderMetrics, InclusionSettings, Sender, SenderError, SenderResult,
};

/// Submits operations by calling `handleOps` on the entry point from a funded EOA.
///
/// The entry point provider must be backed by a wallet, its signer pays for the transaction and
/// `beneficiary` receives the operation fees.
#[derive(Clone)]
pub struct LocalSender<E, V> {
    entry_point: E,
    evm: V,
    chain_id: u64,
    beneficiary: Address,
    settings: InclusionSettings,
    metrics: SenderMetrics,
}

impl<E, V> LocalSender<E, V>
where
    E: EntryPoint,
    V: EvmProvider,
{
    /// Create a new local sender
    pub fn new(
        entry_point: E,
        evm: V,
        chain_id: u64,
        beneficiary: Address,
        settings: InclusionSettings,
    ) -> Self {
        Self {
            entry_point,
            evm,
            chain_id,
            beneficiary,
            settings,
            metrics: SenderMetrics::for_kind("local"),
        }
    }

    async fn wait_until_mined(&self, tx_hash: TxHash) -> SenderResult<bool> {
        loop {
            match self.evm.get_transaction_status(tx_hash).await? {
                TxStatus::Mined { success, .. } => return Ok(success),
                TxStatus::Pending => tokio::time::sleep(self.settings.poll_interval).await,
            }
        }
    }
}

#[async_trait]
impl<E, V> Sender for LocalSender<E, V>
where
    E: EntryPoint,
    V: EvmProvider + 'static,
{
    fn entry_point(&self) -> Address {
        self.entry_point.address()
    }

    async fn submit(&self, op: UserOperation) -> SenderResult<SubmissionReceipt> {
        ensure_signed(&op)?;
        let op_hash = op.hash(self.entry_point.address(), self.chain_id);
        let from_block = self.evm.get_block_number().await?;

        let tx_hash = match self
            .entry_point
            .send_handle_ops(vec![op], self.beneficiary)
            .await?
        {
            HandleOpsOut::Sent(tx_hash) => tx_hash,
            HandleOpsOut::FailedOp(_, reason) => {
                self.metrics.rejected.increment(1);
                return Err(SenderError::SubmissionRejected(reason));
            }
            HandleOpsOut::SignatureValidationFailed(aggregator) => {
                self.metrics.rejected.increment(1);
                return Err(SenderError::SubmissionRejected(format!(
                    "signature validation failed for aggregator {aggregator:?}"
                )));
            }
        };
        self.metrics.submitted.increment(1);
        info!("Sent handleOps transaction {tx_hash:?} for operation {op_hash:?}");

        let wait = tokio::time::timeout(self.settings.timeout, self.wait_until_mined(tx_hash));
        let Ok(mined) = wait.await else {
            warn!("Timed out waiting for handleOps transaction {tx_hash:?}");
            self.metrics.timed_out.increment(1);
            return Ok(SubmissionReceipt::unknown(op_hash, Some(tx_hash)));
        };
        if !mined? {
            return Err(SenderError::SubmissionRejected(format!(
                "handleOps transaction {tx_hash:?} reverted"
            )));
        }

        match self
            .entry_point
            .find_user_operation_event(op_hash, from_block)
            .await?
        {
            Some(receipt) => {
                self.metrics.included.increment(1);
                info!(
                    "Operation {op_hash:?} included in block {} success: {}",
                    receipt.block_number, receipt.success
                );
                Ok(receipt.into())
            }
            None => {
                warn!("No UserOperationEvent found for {op_hash:?} in {tx_hash:?}");
                Ok(SubmissionReceipt::unknown(op_hash, Some(tx_hash)))
            }
        }
    }

    async fn estimate_gas(&self, _op: &UserOperation) -> SenderResult<Option<GasSpec>> {
        Ok(None)
    }

    async fn get_receipt(&self, op_hash: B256) -> SenderResult<SubmissionReceipt> {
        Ok(self
            .entry_point
            .find_user_operation_event(op_hash, 0)
            .await?
            .map_or_else(|| SubmissionReceipt::unknown(op_hash, None), Into::into))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy_primitives::{address, Bytes, U256};
    use opsigner_provider::{MockEntryPoint, MockEvmProvider};
    use opsigner_types::{InclusionStatus, UserOperationReceipt};

    use super::*;

    const ENTRY_POINT: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

    fn signed_op() -> UserOperation {
        UserOperation {
            sender: Address::repeat_byte(1),
            signature: Bytes::from(vec![1; 65]),
            ..Default::default()
        }
    }

    fn entry_point() -> MockEntryPoint {
        let mut entry_point = MockEntryPoint::new();
        entry_point.expect_address().return_const(ENTRY_POINT);
        entry_point
    }

    fn sender(
        entry_point: MockEntryPoint,
        evm: MockEvmProvider,
    ) -> LocalSender<MockEntryPoint, MockEvmProvider> {
        LocalSender::new(
            entry_point,
            evm,
            1337,
            Address::repeat_byte(0xbb),
            InclusionSettings {
                timeout: Duration::from_millis(100),
                poll_interval: Duration::from_millis(10),
            },
        )
    }

    #[tokio::test]
    async fn test_unsigned_operation() {
        let sender = sender(entry_point(), MockEvmProvider::new());
        let ret = sender.submit(UserOperation::default()).await;
        assert!(matches!(ret, Err(SenderError::MissingSignature)));
    }

    #[tokio::test]
    async fn test_submit_included() {
        let op = signed_op();
        let op_hash = op.hash(ENTRY_POINT, 1337);
        let tx_hash = B256::repeat_byte(0x11);

        let mut entry_point = entry_point();
        entry_point
            .expect_send_handle_ops()
            .withf(|ops, beneficiary| {
                ops.len() == 1 && *beneficiary == Address::repeat_byte(0xbb)
            })
            .times(1)
            .returning(move |_, _| Ok(HandleOpsOut::Sent(tx_hash)));
        entry_point
            .expect_find_user_operation_event()
            .withf(move |hash, from_block| *hash == op_hash && *from_block == 5)
            .returning(move |hash, _| {
                Ok(Some(UserOperationReceipt {
                    op_hash: hash,
                    sender: Address::repeat_byte(1),
                    nonce: U256::ZERO,
                    success: true,
                    actual_gas_cost: U256::from(100),
                    actual_gas_used: U256::from(10),
                    reason: None,
                    transaction_hash: tx_hash,
                    block_number: 6,
                }))
            });

        let mut evm = MockEvmProvider::new();
        evm.expect_get_block_number().returning(|| Ok(5));
        evm.expect_get_transaction_status()
            .returning(|_| {
                Ok(TxStatus::Mined {
                    block_number: 6,
                    success: true,
                })
            });

        let receipt = sender(entry_point, evm).submit(op).await.unwrap();
        assert!(receipt.included());
        assert_eq!(receipt.op_hash, op_hash);
        assert_eq!(receipt.transaction_hash, Some(tx_hash));
        assert_eq!(receipt.block_number, Some(6));
    }

    #[tokio::test]
    async fn test_submit_failed_op() {
        let mut entry_point = entry_point();
        entry_point.expect_send_handle_ops().returning(|_, _| {
            Ok(HandleOpsOut::FailedOp(
                0,
                "AA24 signature error".to_string(),
            ))
        });
        let mut evm = MockEvmProvider::new();
        evm.expect_get_block_number().returning(|| Ok(5));

        let ret = sender(entry_point, evm).submit(signed_op()).await;
        match ret {
            Err(SenderError::SubmissionRejected(reason)) => {
                assert_eq!(reason, "AA24 signature error")
            }
            _ => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn test_submit_timeout() {
        let tx_hash = B256::repeat_byte(0x22);
        let mut entry_point = entry_point();
        entry_point
            .expect_send_handle_ops()
            .returning(move |_, _| Ok(HandleOpsOut::Sent(tx_hash)));
        let mut evm = MockEvmProvider::new();
        evm.expect_get_block_number().returning(|| Ok(5));
        evm.expect_get_transaction_status()
            .returning(|_| Ok(TxStatus::Pending));

        let receipt = sender(entry_point, evm).submit(signed_op()).await.unwrap();
        assert_eq!(receipt.status, InclusionStatus::Unknown);
        assert_eq!(receipt.transaction_hash, Some(tx_hash));
    }

    #[tokio::test]
    async fn test_reverted_transaction() {
        let mut entry_point = entry_point();
        entry_point
            .expect_send_handle_ops()
            .returning(|_, _| Ok(HandleOpsOut::Sent(B256::ZERO)));
        let mut evm = MockEvmProvider::new();
        evm.expect_get_block_number().returning(|| Ok(5));
        evm.expect_get_transaction_status().returning(|_| {
            Ok(TxStatus::Mined {
                block_number: 6,
                success: false,
            })
        });

        let ret = sender(entry_point, evm).submit(signed_op()).await;
        assert!(matches!(ret, Err(SenderError::SubmissionRejected(_))));
    }

    #[tokio::test]
    async fn test_no_estimate() {
        let sender = sender(entry_point(), MockEvmProvider::new());
        assert_eq!(sender.estimate_gas(&signed_op()).await.unwrap(), None);
    }
}
