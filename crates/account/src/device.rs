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

use alloy_primitives::{Address, Signature, B256};
use async_trait::async_trait;
use opsigner_provider::{EntryPoint, EvmProvider};
use opsigner_sender::Sender;
use opsigner_signer::{Signer, SigningStrategy};
use opsigner_types::{CallIntent, KeyRole, SubmissionReceipt};

use crate::{AccountSettings, AccountSigner, Error, Result, SmartAccountSigner};

/// Account signer holding a device key registered by the owner.
///
/// Must be connected to a deployed account with [`Self::connect_existing`] before use. The
/// account decides whether the key is still registered, a removed key surfaces as a rejected
/// submission.
pub struct DeviceAccountSigner<E, V, Snd, S> {
    inner: AccountSigner<E, V, Snd, S>,
}

impl<E, V, Snd, S> DeviceAccountSigner<E, V, Snd, S>
where
    E: EntryPoint,
    V: EvmProvider,
    Snd: Sender,
    S: Signer + Send + Sync,
{
    /// Create an unconnected device signer
    pub fn new(
        settings: AccountSettings,
        device: S,
        entry_point: E,
        evm: V,
        sender: Snd,
    ) -> Result<Self> {
        Ok(Self {
            inner: AccountSigner::new(
                settings,
                SigningStrategy::Device(device),
                entry_point,
                evm,
                sender,
            )?,
        })
    }

    /// Bind to the deployed account at `address`
    pub async fn connect_existing(&mut self, address: Address) -> Result<()> {
        self.inner.connect_existing(address).await
    }

    /// Address of the device key
    pub fn key_address(&self) -> Address {
        self.inner.key_address()
    }

    /// The underlying signer
    pub fn signer(&self) -> &AccountSigner<E, V, Snd, S> {
        &self.inner
    }
}

#[async_trait]
impl<E, V, Snd, S> SmartAccountSigner for DeviceAccountSigner<E, V, Snd, S>
where
    E: EntryPoint,
    V: EvmProvider,
    Snd: Sender,
    S: Signer + Send + Sync,
{
    fn role(&self) -> KeyRole {
        KeyRole::Device
    }

    async fn address(&mut self) -> Result<Address> {
        self.inner.account().address().ok_or(Error::UnresolvedAccount)
    }

    async fn execute(&mut self, call: CallIntent) -> Result<SubmissionReceipt> {
        self.inner.execute(call).await
    }

    async fn sign_hash(&self, hash: B256) -> Result<Signature> {
        self.inner.sign_hash(hash).await
    }
}
