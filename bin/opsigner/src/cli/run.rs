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

use std::time::Duration;

use alloy_primitives::{Address, TxHash, TxKind, U256};
use alloy_sol_types::SolCall;
use anyhow::{bail, Context};
use clap::Args;
use opsigner_account::{
    DeviceAccountSigner, Error as AccountError, OwnerAccountSigner, SmartAccountSigner,
};
use opsigner_contracts::test_counter::ITestCounter::justemitCall;
use opsigner_provider::{EntryPoint, EvmProvider, TransactionRequest, TxStatus};
use opsigner_sender::Sender;
use opsigner_signer::PrivateKeySigner;
use opsigner_types::CallIntent;
use opsigner_utils::eth::{ether, format_gwei};

use super::log_receipt;

/// CLI options for the run command
#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Contract called through the device key, a TestCounter exposing `justemit()`
    #[arg(long = "target", name = "target", env = "TEST_COUNTER")]
    target: Address,

    /// Mnemonic index of the device key
    #[arg(
        long = "device_key_index",
        name = "device_key_index",
        env = "DEVICE_KEY_INDEX",
        default_value = "1"
    )]
    device_key_index: u32,

    /// Top up the account balance to this amount, in ether, when it is lower
    #[arg(
        long = "prefund",
        name = "prefund",
        default_value = "0.01",
        value_parser = ether
    )]
    prefund: U256,

    /// Deposit this amount, in ether, when the entry point deposit is at most half of it
    #[arg(
        long = "deposit",
        name = "deposit",
        default_value = "0.01",
        value_parser = ether
    )]
    deposit: U256,

    /// Remove the device key afterwards and check the next device call is refused
    #[arg(long = "remove_device", name = "remove_device", env = "REMOVE_DEVICE")]
    remove_device: bool,
}

impl RunArgs {
    pub(crate) fn device_key_index(&self) -> u32 {
        self.device_key_index
    }
}

/// Fund the owner's account, register a device key and call the target through it.
pub(crate) async fn run_scenario<E, V, Snd>(
    args: &RunArgs,
    mut owner: OwnerAccountSigner<E, V, Snd, PrivateKeySigner>,
    mut device: DeviceAccountSigner<E, V, Snd, PrivateKeySigner>,
    evm: &V,
    timeout: Duration,
) -> anyhow::Result<()>
where
    E: EntryPoint,
    V: EvmProvider,
    Snd: Sender,
{
    let account = owner.get_factory_deployment_address()?;
    tracing::info!("Account address {account:?}");

    let balance = owner.signer_mut().balance().await?;
    if balance < args.prefund {
        tracing::info!("Prefunding account with {} gwei", format_gwei(args.prefund));
        let tx_hash = evm
            .send_transaction(TransactionRequest {
                to: Some(TxKind::Call(account)),
                value: Some(args.prefund),
                ..Default::default()
            })
            .await
            .context("prefund transaction should be accepted")?;
        wait_for_transaction(evm, tx_hash, timeout).await?;
    }

    let mut deposit = owner.signer_mut().deposit().await?;
    if deposit <= args.deposit / U256::from(2) {
        tracing::info!("Depositing {} gwei for account", format_gwei(args.deposit));
        let tx_hash = owner.signer_mut().add_deposit(args.deposit).await?;
        wait_for_transaction(evm, tx_hash, timeout).await?;
        deposit = owner.signer_mut().deposit().await?;
    }
    tracing::info!(
        "Account balance {} gwei, deposit {} gwei",
        format_gwei(owner.signer_mut().balance().await?),
        format_gwei(deposit)
    );

    let device_key = device.key_address();
    tracing::info!("Registering device key {device_key:?}");
    let receipt = owner.register_device_key(device_key).await?;
    log_receipt("register device key", &receipt);
    if receipt.success != Some(true) {
        bail!("device key registration was not confirmed");
    }

    device.connect_existing(account).await?;
    let call = CallIntent::new(args.target, justemitCall {}.abi_encode());
    let receipt = device.execute(call.clone()).await?;
    log_receipt("device call", &receipt);

    if args.remove_device {
        let receipt = owner.remove_device_key(device_key).await?;
        log_receipt("remove device key", &receipt);
        match device.execute(call).await {
            Err(AccountError::SubmissionRejected(reason)) => {
                tracing::info!("Removed device key refused as expected: {reason}");
            }
            Err(error) => return Err(error.into()),
            Ok(receipt) => {
                log_receipt("removed device call", &receipt);
                bail!("removed device key was still accepted");
            }
        }
    }

    Ok(())
}

async fn wait_for_transaction<V: EvmProvider>(
    evm: &V,
    tx_hash: TxHash,
    timeout: Duration,
) -> anyhow::Result<()> {
    tokio::time::timeout(timeout, poll_transaction(evm, tx_hash))
        .await
        .with_context(|| format!("transaction {tx_hash:?} not mined in time"))?
}

async fn poll_transaction<V: EvmProvider>(evm: &V, tx_hash: TxHash) -> anyhow::Result<()> {
    loop {
        match evm.get_transaction_status(tx_hash).await? {
            TxStatus::Mined { success: true, .. } => return Ok(()),
            TxStatus::Mined { success: false, .. } => bail!("transaction {tx_hash:?} reverted"),
            TxStatus::Pending => tokio::time::sleep(Duration::from_secs(1)).await,
        }
    }
}
