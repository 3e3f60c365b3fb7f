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

use alloy_primitives::{Address, U256};
use alloy_provider::Provider as AlloyProvider;
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter};
use alloy_sol_types::SolEvent;
use alloy_transport::Transport;
use anyhow::Context;
use opsigner_contracts::human_account::IHumanAccountFactory::{
    DeployedHumanAccount, IHumanAccountFactoryInstance,
};

use crate::{AccountFactory, DeployedAccount, ProviderResult};

/// HumanAccount factory provider
#[derive(Clone)]
pub struct AlloyAccountFactory<AP, T> {
    factory: IHumanAccountFactoryInstance<T, AP>,
}

impl<AP, T> AlloyAccountFactory<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T>,
{
    /// Create a new factory provider
    pub fn new(factory_address: Address, provider: AP) -> Self {
        Self {
            factory: IHumanAccountFactoryInstance::new(factory_address, provider),
        }
    }
}

#[async_trait::async_trait]
impl<AP, T> AccountFactory for AlloyAccountFactory<AP, T>
where
    T: Transport + Clone,
    AP: AlloyProvider<T> + 'static,
{
    fn address(&self) -> Address {
        *self.factory.address()
    }

    async fn get_address(&self, owner: Address, index: u64) -> ProviderResult<Address> {
        Ok(self
            .factory
            .getAddress(owner, U256::from(index))
            .call()
            .await?
            .account)
    }

    async fn find_deployed_account(
        &self,
        owner: Address,
    ) -> ProviderResult<Option<DeployedAccount>> {
        let filter = Filter::new()
            .address(self.address())
            .event_signature(DeployedHumanAccount::SIGNATURE_HASH)
            .topic2(owner.into_word())
            .from_block(BlockNumberOrTag::Earliest);
        let logs = self.factory.provider().get_logs(&filter).await?;
        let Some(log) = logs.into_iter().last() else {
            return Ok(None);
        };

        let block_number = log.block_number;
        let event = log
            .log_decode::<DeployedHumanAccount>()
            .context("should decode deployed account event")?
            .inner
            .data;

        Ok(Some(DeployedAccount {
            account: event.account,
            owner: event.owner,
            username: event.username,
            block_number,
        }))
    }
}
