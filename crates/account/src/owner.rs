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

use alloy_primitives::{Address, Bytes, Signature, B256};
use alloy_sol_types::SolCall;
use anyhow::anyhow;
use async_trait::async_trait;
use opsigner_contracts::human_account::IHumanAccount::{
    registerDeviceKeyCall, removeDeviceKeyCall,
};
use opsigner_provider::{AccountFactory, EntryPoint, EvmProvider};
use opsigner_sender::Sender;
use opsigner_signer::{Signer, SigningStrategy};
use opsigner_types::{CallIntent, KeyRole, SubmissionReceipt};
use tracing::info;

use crate::{AccountSettings, AccountSigner, Result, SmartAccountSigner};

/// Account signer holding the owner key.
///
/// The owner deploys the account and manages its device keys.
pub struct OwnerAccountSigner<E, V, Snd, S> {
    inner: AccountSigner<E, V, Snd, S>,
}

impl<E, V, Snd, S> OwnerAccountSigner<E, V, Snd, S>
where
    E: EntryPoint,
    V: EvmProvider,
    Snd: Sender,
    S: Signer + Send + Sync,
{
    /// Create a signer for the account `owner` gets at `settings.index`
    pub fn new(
        settings: AccountSettings,
        owner: S,
        entry_point: E,
        evm: V,
        sender: Snd,
    ) -> Result<Self> {
        Ok(Self {
            inner: AccountSigner::new(
                settings,
                SigningStrategy::Owner(owner),
                entry_point,
                evm,
                sender,
            )?,
        })
    }

    /// Account address, resolved on first call
    pub fn get_address(&mut self) -> Result<Address> {
        self.inner.resolve_address()
    }

    /// Address the factory deploys the account to
    pub fn get_factory_deployment_address(&mut self) -> Result<Address> {
        self.get_address()
    }

    /// Check the resolved address against the factory's `getAddress`
    pub async fn verify_address<F: AccountFactory>(&mut self, factory: &F) -> Result<Address> {
        let address = self.get_address()?;
        if factory.address() != self.inner.account().factory() {
            return Err(anyhow!(
                "factory {:?} does not deploy this account",
                factory.address()
            )
            .into());
        }
        self.inner
            .resolver()
            .verify_with_factory(factory, self.inner.key_address(), self.inner.account().index())
            .await?;
        Ok(address)
    }

    /// Latest deployment logged by the factory for the owner, if any
    pub async fn find_deployment<F: AccountFactory>(&self, factory: &F) -> Result<Option<Address>> {
        self.inner
            .resolver()
            .find_deployment(factory, self.inner.key_address(), self.inner.account().index())
            .await
    }

    /// Deploy the account if it does not exist yet
    pub async fn deploy(&mut self) -> Result<Option<SubmissionReceipt>> {
        self.inner.deploy().await
    }

    /// Authorize `device` to sign operations for the account.
    pub async fn register_device_key(&mut self, device: Address) -> Result<SubmissionReceipt> {
        let signature = self.inner.strategy().sign_device_key_request(device).await?;
        let data = registerDeviceKeyCall {
            deviceKey: device,
            signature,
        }
        .abi_encode();
        let receipt = self.execute_on_self(data.into()).await?;
        if succeeded(&receipt) {
            self.inner.account_mut().add_device_key(device);
            info!("Registered device key {device:?}");
        }
        Ok(receipt)
    }

    /// Revoke `device`.
    pub async fn remove_device_key(&mut self, device: Address) -> Result<SubmissionReceipt> {
        let signature = self.inner.strategy().sign_device_key_request(device).await?;
        let data = removeDeviceKeyCall {
            deviceKey: device,
            signature,
        }
        .abi_encode();
        let receipt = self.execute_on_self(data.into()).await?;
        if succeeded(&receipt) {
            self.inner.account_mut().remove_device_key(device);
            info!("Removed device key {device:?}");
        }
        Ok(receipt)
    }

    async fn execute_on_self(&mut self, data: Bytes) -> Result<SubmissionReceipt> {
        let address = self.get_address()?;
        self.inner.execute(CallIntent::new(address, data)).await
    }

    /// The underlying signer
    pub fn signer(&self) -> &AccountSigner<E, V, Snd, S> {
        &self.inner
    }

    /// The underlying signer, mutably
    pub fn signer_mut(&mut self) -> &mut AccountSigner<E, V, Snd, S> {
        &mut self.inner
    }
}

fn succeeded(receipt: &SubmissionReceipt) -> bool {
    receipt.included() && receipt.success == Some(true)
}

#[async_trait]
impl<E, V, Snd, S> SmartAccountSigner for OwnerAccountSigner<E, V, Snd, S>
where
    E: EntryPoint,
    V: EvmProvider,
    Snd: Sender,
    S: Signer + Send + Sync,
{
    fn role(&self) -> KeyRole {
        KeyRole::Owner
    }

    async fn address(&mut self) -> Result<Address> {
        self.get_address()
    }

    async fn execute(&mut self, call: CallIntent) -> Result<SubmissionReceipt> {
        self.inner.execute(call).await
    }

    async fn sign_hash(&self, hash: B256) -> Result<Signature> {
        self.inner.sign_hash(hash).await
    }
}
