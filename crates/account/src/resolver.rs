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

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use anyhow::anyhow;
use opsigner_provider::AccountFactory;
use tracing::warn;

use crate::Result;

/// Computes HumanAccount addresses before deployment.
///
/// Mirrors the factory's CREATE2 derivation:
/// `salt = keccak256(abi.encode(owner, uint256(index)))` and
/// `address = keccak256(0xff ++ factory ++ salt ++ init_code_hash)[12..]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressResolver {
    account_init_code_hash: B256,
}

impl AddressResolver {
    /// Resolver for a factory deploying accounts whose creation code hashes to `init_code_hash`
    pub fn new(account_init_code_hash: B256) -> Self {
        Self {
            account_init_code_hash,
        }
    }

    /// Resolver for a factory deploying `init_code`
    pub fn from_init_code(init_code: &[u8]) -> Self {
        Self::new(keccak256(init_code))
    }

    /// CREATE2 salt the factory uses for `owner` at `index`
    pub fn account_salt(owner: Address, index: u64) -> B256 {
        keccak256((owner, U256::from(index)).abi_encode())
    }

    /// Address of the account of `owner` at `index` deployed by `factory`
    pub fn resolve(&self, factory: Address, owner: Address, index: u64) -> Address {
        self.address_for_salt(factory, Self::account_salt(owner, index))
    }

    /// CREATE2 address for a raw salt
    pub fn address_for_salt(&self, factory: Address, salt: B256) -> Address {
        factory.create2(salt, self.account_init_code_hash)
    }

    /// Compare the resolved address with the factory's own `getAddress`.
    ///
    /// A mismatch means the configured init code hash does not belong to this factory.
    pub async fn verify_with_factory<F: AccountFactory>(
        &self,
        factory: &F,
        owner: Address,
        index: u64,
    ) -> Result<Address> {
        let resolved = self.resolve(factory.address(), owner, index);
        let predicted = factory.get_address(owner, index).await?;
        if resolved != predicted {
            return Err(anyhow!(
                "resolved account address {resolved:?} does not match factory prediction {predicted:?}"
            )
            .into());
        }
        Ok(resolved)
    }

    /// Look up the latest `DeployedHumanAccount` event for `owner`.
    ///
    /// Only a cross-check: logs a warning if the deployed account is not the resolved one.
    pub async fn find_deployment<F: AccountFactory>(
        &self,
        factory: &F,
        owner: Address,
        index: u64,
    ) -> Result<Option<Address>> {
        let Some(deployment) = factory.find_deployed_account(owner).await? else {
            return Ok(None);
        };
        let resolved = self.resolve(factory.address(), owner, index);
        if deployment.account != resolved {
            warn!(
                "Latest deployment for owner {owner:?} is {:?} ({}), resolved address is {resolved:?}",
                deployment.account, deployment.username
            );
        }
        Ok(Some(deployment.account))
    }
}
