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
use alloy_signer::Signer;
use opsigner_types::{device_key_request_hash, KeyRole, UserOperation};

use crate::{Error, Result};

/// The key an account signer signs with, tagged with its role on the account.
///
/// Signatures use EIP-191 personal message semantics over the raw 32 hash bytes, which is what
/// HumanAccount recovers against.
#[derive(Clone, Debug)]
pub enum SigningStrategy<S> {
    /// The account owner
    Owner(S),
    /// A registered device key
    Device(S),
}

impl<S> SigningStrategy<S>
where
    S: Signer + Send + Sync,
{
    /// Role of the key
    pub fn role(&self) -> KeyRole {
        match self {
            SigningStrategy::Owner(_) => KeyRole::Owner,
            SigningStrategy::Device(_) => KeyRole::Device,
        }
    }

    /// Underlying signer
    pub fn signer(&self) -> &S {
        match self {
            SigningStrategy::Owner(signer) | SigningStrategy::Device(signer) => signer,
        }
    }

    /// Address of the key
    pub fn address(&self) -> Address {
        self.signer().address()
    }

    /// Sign a hash
    pub async fn sign(&self, hash: B256) -> Result<Signature> {
        Ok(self.signer().sign_message(hash.as_slice()).await?)
    }

    /// Hash `op` for `entry_point` on `chain_id`, sign it and attach the signature.
    ///
    /// Returns the operation hash.
    pub async fn sign_user_operation(
        &self,
        op: &mut UserOperation,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<B256> {
        let hash = op.hash(entry_point, chain_id);
        let signature = self.sign(hash).await?;
        op.signature = Bytes::from(signature.as_bytes());
        tracing::debug!(
            "signed operation {hash:?} for {:?} with {} key {:?}",
            op.sender,
            self.role(),
            self.address()
        );
        Ok(hash)
    }

    /// Owner signature authorizing registration or removal of `device`
    pub async fn sign_device_key_request(&self, device: Address) -> Result<Bytes> {
        if self.role() != KeyRole::Owner {
            return Err(Error::NotPermitted(self.role()));
        }
        let signature = self.sign(device_key_request_hash(device)).await?;
        Ok(Bytes::from(signature.as_bytes()))
    }
}
