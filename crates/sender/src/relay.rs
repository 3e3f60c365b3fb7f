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

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use opsigner_provider::{ProviderError, RelayProvider};
use opsigner_types::{GasSpec, SubmissionReceipt, UserOperation, UserOperationReceipt};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{
    ensure_signed, metrics::SenderMetrics, InclusionSettings, Sender, SenderError, SenderResult,
};

/// Submits operations to a relay node (bundler) over JSON-RPC.
///
/// The relay must list the configured entry point in `eth_supportedEntryPoints`. The check
/// runs before the first payload is sent and a successful result is shared by clones.
#[derive(Clone)]
pub struct RelaySender<R> {
    relay: R,
    entry_point: Address,
    settings: InclusionSettings,
    supported: Arc<OnceCell<()>>,
    metrics: SenderMetrics,
}

impl<R> RelaySender<R>
where
    R: RelayProvider,
{
    /// Create a new relay sender
    pub fn new(relay: R, entry_point: Address, settings: InclusionSettings) -> Self {
        Self {
            relay,
            entry_point,
            settings,
            supported: Arc::new(OnceCell::new()),
            metrics: SenderMetrics::for_kind("relay"),
        }
    }

    /// Fails with `UnsupportedDispatchContract` if the relay does not serve the entry point.
    pub async fn check_supported(&self) -> SenderResult<()> {
        self.supported
            .get_or_try_init(|| self.query_supported())
            .await?;
        Ok(())
    }

    async fn query_supported(&self) -> SenderResult<()> {
        let supported = self.relay.supported_entry_points().await?;
        info!("node supported EntryPoints={supported:?}");
        if supported.contains(&self.entry_point) {
            Ok(())
        } else {
            Err(SenderError::UnsupportedDispatchContract {
                entry_point: self.entry_point,
                supported,
            })
        }
    }

    async fn wait_for_receipt(&self, op_hash: B256) -> SenderResult<UserOperationReceipt> {
        loop {
            if let Some(receipt) = self.relay.get_user_operation_receipt(op_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

#[async_trait]
impl<R> Sender for RelaySender<R>
where
    R: RelayProvider,
{
    fn entry_point(&self) -> Address {
        self.entry_point
    }

    async fn submit(&self, op: UserOperation) -> SenderResult<SubmissionReceipt> {
        ensure_signed(&op)?;
        self.check_supported().await?;

        let op_hash = match self.relay.send_user_operation(op, self.entry_point).await {
            Ok(op_hash) => op_hash,
            Err(ProviderError::Rpc { message, .. }) => {
                self.metrics.rejected.increment(1);
                return Err(SenderError::SubmissionRejected(message));
            }
            Err(error) => return Err(error.into()),
        };
        self.metrics.submitted.increment(1);
        info!("Relay accepted operation {op_hash:?}");

        let wait = tokio::time::timeout(self.settings.timeout, self.wait_for_receipt(op_hash));
        let Ok(receipt) = wait.await else {
            warn!("Timed out waiting for receipt of operation {op_hash:?}");
            self.metrics.timed_out.increment(1);
            return Ok(SubmissionReceipt::unknown(op_hash, None));
        };
        let receipt = receipt?;
        self.metrics.included.increment(1);
        info!(
            "Operation {op_hash:?} included in block {} success: {}",
            receipt.block_number, receipt.success
        );
        Ok(receipt.into())
    }

    async fn estimate_gas(&self, op: &UserOperation) -> SenderResult<Option<GasSpec>> {
        self.check_supported().await?;
        match self
            .relay
            .estimate_user_operation_gas(op.clone(), self.entry_point)
            .await
        {
            Ok(gas) => Ok(Some(gas)),
            Err(ProviderError::Rpc { message, .. }) => {
                Err(SenderError::SubmissionRejected(message))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn get_receipt(&self, op_hash: B256) -> SenderResult<SubmissionReceipt> {
        Ok(self
            .relay
            .get_user_operation_receipt(op_hash)
            .await?
            .map_or_else(|| SubmissionReceipt::unknown(op_hash, None), Into::into))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use alloy_primitives::{address, Bytes, U256};
    use opsigner_provider::MockRelayProvider;
    use opsigner_types::InclusionStatus;

    use super::*;

    const ENTRY_POINT: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

    fn signed_op() -> UserOperation {
        UserOperation {
            sender: Address::repeat_byte(1),
            signature: Bytes::from(vec![1; 65]),
            ..Default::default()
        }
    }

    fn settings() -> InclusionSettings {
        InclusionSettings {
            timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn receipt(op_hash: B256) -> UserOperationReceipt {
        UserOperationReceipt {
            op_hash,
            sender: Address::repeat_byte(1),
            nonce: U256::ZERO,
            success: true,
            actual_gas_cost: U256::from(100),
            actual_gas_used: U256::from(10),
            reason: None,
            transaction_hash: B256::repeat_byte(0x33),
            block_number: 12,
        }
    }

    #[tokio::test]
    async fn test_unsupported_entry_point() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_supported_entry_points()
            .returning(|| Ok(vec![Address::repeat_byte(9)]));
        relay.expect_send_user_operation().never();

        let sender = RelaySender::new(relay, ENTRY_POINT, settings());
        match sender.submit(signed_op()).await {
            Err(SenderError::UnsupportedDispatchContract {
                entry_point,
                supported,
            }) => {
                assert_eq!(entry_point, ENTRY_POINT);
                assert_eq!(supported, vec![Address::repeat_byte(9)]);
            }
            _ => panic!("expected unsupported entry point"),
        }
    }

    #[tokio::test]
    async fn test_unsigned_operation_sends_nothing() {
        let mut relay = MockRelayProvider::new();
        relay.expect_supported_entry_points().never();
        relay.expect_send_user_operation().never();

        let sender = RelaySender::new(relay, ENTRY_POINT, settings());
        assert!(matches!(
            sender.submit(UserOperation::default()).await,
            Err(SenderError::MissingSignature)
        ));
    }

    #[tokio::test]
    async fn test_submit_polls_receipt_and_checks_once() {
        let op_hash = B256::repeat_byte(0x44);
        let mut relay = MockRelayProvider::new();
        relay
            .expect_supported_entry_points()
            .times(1)
            .returning(|| Ok(vec![ENTRY_POINT]));
        relay
            .expect_send_user_operation()
            .withf(|_, entry_point| *entry_point == ENTRY_POINT)
            .times(2)
            .returning(move |_, _| Ok(op_hash));
        let polls = AtomicUsize::new(0);
        relay
            .expect_get_user_operation_receipt()
            .returning(move |hash| {
                if polls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                    Ok(None)
                } else {
                    Ok(Some(receipt(hash)))
                }
            });

        let sender = RelaySender::new(relay, ENTRY_POINT, settings());
        for _ in 0..2 {
            let receipt = sender.submit(signed_op()).await.unwrap();
            assert!(receipt.included());
            assert_eq!(receipt.op_hash, op_hash);
            assert_eq!(receipt.block_number, Some(12));
        }
    }

    #[tokio::test]
    async fn test_rpc_error_is_rejection() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_supported_entry_points()
            .returning(|| Ok(vec![ENTRY_POINT]));
        relay.expect_send_user_operation().returning(|_, _| {
            Err(ProviderError::Rpc {
                code: -32507,
                message: "Invalid UserOperation signature or paymaster signature".to_string(),
                revert_data: None,
            })
        });

        let sender = RelaySender::new(relay, ENTRY_POINT, settings());
        match sender.submit(signed_op()).await {
            Err(SenderError::SubmissionRejected(message)) => {
                assert!(message.contains("signature"))
            }
            _ => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_unknown() {
        let op_hash = B256::repeat_byte(0x55);
        let mut relay = MockRelayProvider::new();
        relay
            .expect_supported_entry_points()
            .returning(|| Ok(vec![ENTRY_POINT]));
        relay
            .expect_send_user_operation()
            .returning(move |_, _| Ok(op_hash));
        relay
            .expect_get_user_operation_receipt()
            .returning(|_| Ok(None));

        let sender = RelaySender::new(relay, ENTRY_POINT, settings());
        let receipt = sender.submit(signed_op()).await.unwrap();
        assert_eq!(receipt.status, InclusionStatus::Unknown);
        assert_eq!(receipt.op_hash, op_hash);
    }

    #[tokio::test]
    async fn test_estimate_gas() {
        let gas = GasSpec {
            verification_gas_limit: 100_000,
            call_gas_limit: 50_000,
            pre_verification_gas: 45_000,
        };
        let mut relay = MockRelayProvider::new();
        relay
            .expect_supported_entry_points()
            .returning(|| Ok(vec![ENTRY_POINT]));
        relay
            .expect_estimate_user_operation_gas()
            .returning(move |_, _| Ok(gas));

        let sender = RelaySender::new(relay, ENTRY_POINT, settings());
        assert_eq!(sender.estimate_gas(&signed_op()).await.unwrap(), Some(gas));
    }
}
