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

use alloy_primitives::{aliases::U192, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use opsigner_contracts::human_account::{
    IHumanAccount::executeCall, IHumanAccountFactory::createAccountCall,
};
use opsigner_provider::EntryPoint;
use opsigner_types::{Account, CallIntent, GasSettings, UserOperation};
use tracing::debug;

use crate::{Error, Result};

/// Builds unsigned operations for accounts of one factory.
#[derive(Clone, Debug)]
pub struct OperationBuilder {
    factory: Address,
    gas: GasSettings,
}

impl OperationBuilder {
    /// Builder for accounts deployed by `factory`
    pub fn new(factory: Address, gas: GasSettings) -> Self {
        Self { factory, gas }
    }

    /// Gas defaults used when a call has no override
    pub fn gas_settings(&self) -> &GasSettings {
        &self.gas
    }

    /// Build the operation executing `call` from `account`.
    ///
    /// An undeployed account gets nonce 0 and the factory bootstrap as init code, a deployed one
    /// reads its nonce from `nonce_source`. The signature is left empty.
    pub async fn build<E: EntryPoint>(
        &self,
        account: &Account,
        call: &CallIntent,
        nonce_source: &E,
    ) -> Result<UserOperation> {
        let sender = account.address().ok_or(Error::UnresolvedAccount)?;
        if account.factory() != self.factory {
            return Err(Error::UnresolvedAccount);
        }

        let (nonce, init_code) = if account.is_deployed() {
            let nonce = nonce_source
                .get_nonce(sender, U192::ZERO)
                .await
                .map_err(Error::StaleNonce)?;
            (nonce, Bytes::new())
        } else {
            (U256::ZERO, self.init_code(account)?)
        };

        let mut op = UserOperation {
            sender,
            nonce,
            init_code,
            call_data: Self::call_data(call),
            ..Default::default()
        };
        op.set_gas(
            call.gas
                .unwrap_or_else(|| self.gas.gas_spec(!account.is_deployed())),
        );
        op.set_fees(call.fees.unwrap_or(self.gas.fees));

        debug!(
            "built operation for {sender:?} nonce {nonce} bootstrap {}",
            op.has_bootstrap()
        );
        Ok(op)
    }

    /// `factory ++ createAccount(label, index, owner)`
    fn init_code(&self, account: &Account) -> Result<Bytes> {
        // accounts bound by address have no owner to deploy for
        let owner = account.owner().ok_or(Error::UnresolvedAccount)?;
        let create = createAccountCall {
            username: account.label().to_string(),
            index: U256::from(account.index()),
            owner,
        };
        let mut init_code = self.factory.to_vec();
        init_code.extend(create.abi_encode());
        Ok(init_code.into())
    }

    fn call_data(call: &CallIntent) -> Bytes {
        executeCall {
            dest: call.target,
            value: call.value,
            func: call.data.clone(),
        }
        .abi_encode()
        .into()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes};
    use anyhow::anyhow;
    use opsigner_provider::{MockEntryPoint, ProviderError};
    use opsigner_types::{GasFees, GasSpec};

    use super::*;

    const FACTORY: Address = address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");
    const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const SENDER: Address = address!("1111111111111111111111111111111111111111");

    fn account(deployed: bool) -> Account {
        let mut account = Account::new(FACTORY, OWNER, 2, "HumanAccount_1");
        account.bind_address(SENDER);
        if deployed {
            account.mark_deployed();
        }
        account
    }

    fn builder() -> OperationBuilder {
        OperationBuilder::new(FACTORY, GasSettings::default())
    }

    #[tokio::test]
    async fn test_undeployed_has_bootstrap() {
        let mut entry_point = MockEntryPoint::new();
        entry_point.expect_get_nonce().never();

        let call = CallIntent::new(Address::repeat_byte(9), bytes!("abcd"));
        let op = builder()
            .build(&account(false), &call, &entry_point)
            .await
            .unwrap();

        assert_eq!(op.sender, SENDER);
        assert_eq!(op.nonce, U256::ZERO);
        assert_eq!(op.factory(), Some(FACTORY));
        let create = createAccountCall::abi_decode(&op.init_code[20..], true).unwrap();
        assert_eq!(create.username, "HumanAccount_1");
        assert_eq!(create.index, U256::from(2));
        assert_eq!(create.owner, OWNER);
        assert_eq!(
            op.verification_gas_limit,
            GasSettings::default().deploy_verification_gas_limit
        );
        assert!(op.signature.is_empty());
    }

    #[tokio::test]
    async fn test_deployed_reads_nonce() {
        let mut entry_point = MockEntryPoint::new();
        entry_point
            .expect_get_nonce()
            .withf(|sender, key| *sender == SENDER && *key == U192::ZERO)
            .returning(|_, _| Ok(U256::from(5)));

        let call = CallIntent::new(Address::repeat_byte(9), bytes!("abcd"))
            .with_value(U256::from(100));
        let op = builder()
            .build(&account(true), &call, &entry_point)
            .await
            .unwrap();

        assert_eq!(op.nonce, U256::from(5));
        assert!(op.init_code.is_empty());
        let execute = executeCall::abi_decode(&op.call_data, true).unwrap();
        assert_eq!(execute.dest, Address::repeat_byte(9));
        assert_eq!(execute.value, U256::from(100));
        assert_eq!(execute.func, bytes!("abcd"));
        assert_eq!(
            op.verification_gas_limit,
            GasSettings::default().verification_gas_limit
        );
    }

    #[tokio::test]
    async fn test_overrides() {
        let mut entry_point = MockEntryPoint::new();
        entry_point
            .expect_get_nonce()
            .returning(|_, _| Ok(U256::from(1)));

        let gas = GasSpec {
            verification_gas_limit: 1,
            call_gas_limit: 2,
            pre_verification_gas: 3,
        };
        let fees = GasFees {
            max_fee_per_gas: 4,
            max_priority_fee_per_gas: 5,
        };
        let call = CallIntent::noop(SENDER).with_gas(gas).with_fees(fees);
        let op = builder()
            .build(&account(true), &call, &entry_point)
            .await
            .unwrap();
        assert_eq!(op.gas(), gas);
        assert_eq!(op.fees(), fees);
    }

    #[tokio::test]
    async fn test_unresolved() {
        let entry_point = MockEntryPoint::new();
        let call = CallIntent::noop(SENDER);

        let unbound = Account::new(FACTORY, OWNER, 0, "HumanAccount_1");
        assert!(matches!(
            builder().build(&unbound, &call, &entry_point).await,
            Err(Error::UnresolvedAccount)
        ));

        let mut other_factory = Account::new(Address::repeat_byte(7), OWNER, 0, "HumanAccount_1");
        other_factory.bind_address(SENDER);
        assert!(matches!(
            builder().build(&other_factory, &call, &entry_point).await,
            Err(Error::UnresolvedAccount)
        ));
    }

    #[tokio::test]
    async fn test_nonce_failure() {
        let mut entry_point = MockEntryPoint::new();
        entry_point
            .expect_get_nonce()
            .returning(|_, _| Err(ProviderError::Other(anyhow!("connection refused"))));

        let result = builder()
            .build(&account(true), &CallIntent::noop(SENDER), &entry_point)
            .await;
        assert!(matches!(result, Err(Error::StaleNonce(_))));
    }
}
