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

use alloy_primitives::Address;
#[cfg(feature = "test-utils")]
use mockall::automock;

use crate::ProviderResult;

/// An account deployment found in the factory's logs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployedAccount {
    /// Account address
    pub account: Address,
    /// Owner the account was created for
    pub owner: Address,
    /// Username given at creation
    pub username: String,
    /// Block of the deployment
    pub block_number: Option<u64>,
}

/// Trait for interacting with a HumanAccount factory.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait AccountFactory: Send + Sync + 'static {
    /// Address of the factory
    fn address(&self) -> Address;

    /// Address the factory predicts for `owner` at `index`
    async fn get_address(&self, owner: Address, index: u64) -> ProviderResult<Address>;

    /// Most recent deployment made for `owner`, if any
    async fn find_deployed_account(&self, owner: Address)
        -> ProviderResult<Option<DeployedAccount>>;
}
