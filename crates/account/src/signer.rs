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

use alloy_primitives::{bytes, Address, Bytes, Signature, B256, U256};
use anyhow::anyhow;
use opsigner_provider::{EntryPoint, EvmProvider};
use opsigner_sender::{Sender, SenderError};
use opsigner_signer::{Signer, SigningStrategy};
use opsigner_types::{Account, CallIntent, GasSettings, KeyRole, SubmissionReceipt, UserOperation};
use opsigner_utils::log::LogOnError;
use parse_display::Display;
use tracing::{info, Level};

use crate::{AddressResolver, Error, OperationBuilder, Result};

/// Settings for one account
#[derive(Clone, Debug)]
pub struct AccountSettings {
    /// Entry point the account trusts
    pub entry_point: Address,
    /// HumanAccount factory
    pub factory: Address,
    /// Chain the operations are signed for
    pub chain_id: u64,
    /// Account index for the owner
    pub index: u64,
    /// Username given to the factory on deployment
    pub label: String,
    /// Hash of the account creation code used by the factory
    pub account_init_code_hash: B256,
    /// Gas defaults
    pub gas: GasSettings,
}

/// Lifecycle of an account signer
#[derive(Display, Debug, Clone, Copy, Eq, PartialEq)]
#[display(style = "snake_case")]
pub enum SignerState {
    /// No account address yet
    Unresolved,
    /// Address bound, idle
    AddressKnown,
    /// An operation is being built, signed or submitted
    OperationInFlight,
}

/// Signs and submits operations for a single HumanAccount with one key.
///
/// Every state changing call takes `&mut self`, so a signer handles one operation at a time.
/// Use [`crate::OwnerAccountSigner`] or [`crate::DeviceAccountSigner`] for the role specific
/// helpers.
pub struct AccountSigner<E, V, Snd, S> {
    resolver: AddressResolver,
    builder: OperationBuilder,
    strategy: SigningStrategy<S>,
    entry_point: E,
    evm: V,
    sender: Snd,
    account: Account,
    state: SignerState,
    chain_id: u64,
    estimate_buffer_percent: u32,
}

impl<E, V, Snd, S> AccountSigner<E, V, Snd, S>
where
    E: EntryPoint,
    V: EvmProvider,
    Snd: Sender,
    S: Signer + Send + Sync,
{
    /// Create a signer for the account of `strategy`.
    ///
    /// An owner key identifies its account through the factory derivation, a device key must be
    /// connected to an existing account before use.
    pub fn new(
        settings: AccountSettings,
        strategy: SigningStrategy<S>,
        entry_point: E,
        evm: V,
        sender: Snd,
    ) -> Result<Self> {
        if entry_point.address() != settings.entry_point {
            return Err(anyhow!(
                "entry point provider is for {:?}, account uses {:?}",
                entry_point.address(),
                settings.entry_point
            )
            .into());
        }
        if sender.entry_point() != settings.entry_point {
            return Err(anyhow!(
                "sender submits to {:?}, account uses {:?}",
                sender.entry_point(),
                settings.entry_point
            )
            .into());
        }

        let account = match strategy.role() {
            KeyRole::Owner => Account::new(
                settings.factory,
                strategy.address(),
                settings.index,
                settings.label,
            ),
            KeyRole::Device => Account::unbound(settings.factory, settings.index, settings.label),
        };

        Ok(Self {
            resolver: AddressResolver::new(settings.account_init_code_hash),
            builder: OperationBuilder::new(settings.factory, settings.gas),
            strategy,
            entry_point,
            evm,
            sender,
            account,
            state: SignerState::Unresolved,
            chain_id: settings.chain_id,
            estimate_buffer_percent: settings.gas.estimate_buffer_percent,
        })
    }

    /// Role of the signing key
    pub fn role(&self) -> KeyRole {
        self.strategy.role()
    }

    /// Address of the signing key
    pub fn key_address(&self) -> Address {
        self.strategy.address()
    }

    /// The account as currently known
    pub fn account(&self) -> &Account {
        &self.account
    }

    pub(crate) fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }

    /// Current lifecycle state
    pub fn state(&self) -> SignerState {
        self.state
    }

    pub(crate) fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub(crate) fn strategy(&self) -> &SigningStrategy<S> {
        &self.strategy
    }

    /// The account address, computing it from the owner key on first use.
    pub fn resolve_address(&mut self) -> Result<Address> {
        if let Some(address) = self.account.address() {
            return Ok(address);
        }
        let owner = self.account.owner().ok_or(Error::UnresolvedAccount)?;
        let resolved = self
            .resolver
            .resolve(self.account.factory(), owner, self.account.index());
        let address = self.account.bind_address(resolved);
        self.state = SignerState::AddressKnown;
        info!(
            "Resolved account {address:?} for owner {owner:?} index {}",
            self.account.index()
        );
        Ok(address)
    }

    /// Bind to an account that is already deployed at `address`.
    pub async fn connect_existing(&mut self, address: Address) -> Result<()> {
        if let Some(bound) = self.account.address() {
            if bound != address {
                return Err(anyhow!("signer is already bound to {bound:?}").into());
            }
        }
        if self.evm.get_code(address).await?.is_empty() {
            return Err(Error::NotDeployed(address));
        }
        self.account.bind_address(address);
        self.account.mark_deployed();
        self.state = SignerState::AddressKnown;
        info!(
            "Connected {} key {:?} to account {address:?}",
            self.role(),
            self.key_address()
        );
        Ok(())
    }

    /// Check the chain for the account code, returns whether the account is deployed.
    pub async fn refresh_deployment(&mut self) -> Result<bool> {
        if self.account.is_deployed() {
            return Ok(true);
        }
        let address = self.resolve_address()?;
        if !self.evm.get_code(address).await?.is_empty() {
            self.account.mark_deployed();
        }
        Ok(self.account.is_deployed())
    }

    /// Deploy the account by executing an empty call to itself.
    ///
    /// Returns `None` if the account already exists. Only the owner can deploy.
    pub async fn deploy(&mut self) -> Result<Option<SubmissionReceipt>> {
        if self.role() != KeyRole::Owner {
            return Err(Error::DeployNotPermitted(self.role()));
        }
        if self.refresh_deployment().await? {
            return Ok(None);
        }
        let address = self.resolve_address()?;
        self.execute(CallIntent::noop(address)).await.map(Some)
    }

    /// Build, sign and submit an operation executing `call` from the account.
    ///
    /// The first included operation of an undeployed account also deploys it.
    pub async fn execute(&mut self, call: CallIntent) -> Result<SubmissionReceipt> {
        self.resolve_address()?;
        if !self.refresh_deployment().await? && self.role() != KeyRole::Owner {
            return Err(Error::DeployNotPermitted(self.role()));
        }

        self.state = SignerState::OperationInFlight;
        let result = self.build_sign_submit(&call).await;
        self.state = SignerState::AddressKnown;

        let (op, receipt) = result?;
        if receipt.included() && op.has_bootstrap() && !self.account.is_deployed() {
            self.account.mark_deployed();
            info!("Account {:?} deployed", op.sender);
        }
        Ok(receipt)
    }

    async fn build_sign_submit(
        &self,
        call: &CallIntent,
    ) -> Result<(UserOperation, SubmissionReceipt)> {
        let mut op = self
            .builder
            .build(&self.account, call, &self.entry_point)
            .await?;
        if call.gas.is_none() {
            self.apply_estimate(&mut op).await?;
        }

        let op_hash = self
            .strategy
            .sign_user_operation(&mut op, self.entry_point.address(), self.chain_id)
            .await?;
        info!(
            "Submitting operation {op_hash:?} from {:?} nonce {} signed by {} key",
            op.sender,
            op.nonce,
            self.role()
        );
        let receipt = self.sender.submit(op.clone()).await?;
        Ok((op, receipt))
    }

    async fn apply_estimate(&self, op: &mut UserOperation) -> Result<()> {
        let mut probe = op.clone();
        probe.signature = dummy_signature();
        let estimate = self
            .sender
            .estimate_gas(&probe)
            .await
            .log_on_error_level(Level::WARN, "gas estimation failed, using defaults");
        match estimate {
            Ok(Some(gas)) => op.set_gas(gas.increase_by_percent(self.estimate_buffer_percent)),
            Ok(None) => {}
            Err(error @ SenderError::UnsupportedDispatchContract { .. }) => {
                return Err(error.into())
            }
            Err(_) => {}
        }
        Ok(())
    }

    /// Sign an application hash with the active key
    pub async fn sign_hash(&self, hash: B256) -> Result<Signature> {
        Ok(self.strategy.sign(hash).await?)
    }

    /// Inclusion of a previously submitted operation
    pub async fn get_receipt(&self, op_hash: B256) -> Result<SubmissionReceipt> {
        Ok(self.sender.get_receipt(op_hash).await?)
    }

    /// Deposit the account holds in the entry point
    pub async fn deposit(&mut self) -> Result<U256> {
        let address = self.resolve_address()?;
        Ok(self.entry_point.balance_of(address).await?)
    }

    /// Add `value` to the account deposit, paid by the entry point provider's wallet
    pub async fn add_deposit(&mut self, value: U256) -> Result<B256> {
        let address = self.resolve_address()?;
        let tx_hash = self.entry_point.deposit_to(address, value).await?;
        info!("Deposited {value} for {address:?} in {tx_hash:?}");
        Ok(tx_hash)
    }

    /// Native balance of the account
    pub async fn balance(&mut self) -> Result<U256> {
        let address = self.resolve_address()?;
        Ok(self.evm.get_balance(address).await?)
    }
}

/// Signature of the right length that a relay can simulate against.
fn dummy_signature() -> Bytes {
    bytes!("fffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy_primitives::{address, bytes, ChainId, B256};
    use async_trait::async_trait;
    use opsigner_provider::{MockEntryPoint, MockEvmProvider};
    use opsigner_sender::SenderResult;
    use opsigner_signer::PrivateKeySigner;
    use opsigner_types::{GasSpec, InclusionStatus};

    use super::*;

    const ENTRY_POINT: Address = address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");
    const FACTORY: Address = address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");
    const CHAIN_ID: u64 = 1337;

    enum Estimate {
        Defaults,
        Gas(GasSpec),
        Fail,
    }

    struct FakeSender {
        estimate: Estimate,
        status: InclusionStatus,
        submitted: Mutex<Vec<UserOperation>>,
    }

    impl FakeSender {
        fn new(estimate: Estimate) -> Self {
            Self {
                estimate,
                status: InclusionStatus::Included,
                submitted: Mutex::new(vec![]),
            }
        }

        fn submitted(&self) -> Vec<UserOperation> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sender for FakeSender {
        fn entry_point(&self) -> Address {
            ENTRY_POINT
        }

        async fn submit(&self, op: UserOperation) -> SenderResult<SubmissionReceipt> {
            let op_hash = op.hash(ENTRY_POINT, CHAIN_ID);
            self.submitted.lock().unwrap().push(op);
            Ok(match self.status {
                InclusionStatus::Included => SubmissionReceipt {
                    op_hash,
                    transaction_hash: Some(B256::repeat_byte(1)),
                    status: InclusionStatus::Included,
                    block_number: Some(10),
                    success: Some(true),
                    actual_gas_used: Some(U256::from(50_000)),
                },
                InclusionStatus::Unknown => SubmissionReceipt::unknown(op_hash, None),
            })
        }

        async fn estimate_gas(&self, op: &UserOperation) -> SenderResult<Option<GasSpec>> {
            assert_eq!(op.signature.len(), 65);
            match self.estimate {
                Estimate::Defaults => Ok(None),
                Estimate::Gas(gas) => Ok(Some(gas)),
                Estimate::Fail => Err(SenderError::Other(anyhow!("estimation reverted"))),
            }
        }

        async fn get_receipt(&self, op_hash: B256) -> SenderResult<SubmissionReceipt> {
            Ok(SubmissionReceipt::unknown(op_hash, None))
        }
    }

    struct DisconnectedKey(Address);

    #[async_trait]
    impl Signer for DisconnectedKey {
        async fn sign_hash(&self, _hash: &B256) -> alloy_signer::Result<Signature> {
            Err(alloy_signer::Error::other("device disconnected"))
        }

        fn address(&self) -> Address {
            self.0
        }

        fn chain_id(&self) -> Option<ChainId> {
            None
        }

        fn set_chain_id(&mut self, _chain_id: Option<ChainId>) {}
    }

    fn settings() -> AccountSettings {
        AccountSettings {
            entry_point: ENTRY_POINT,
            factory: FACTORY,
            chain_id: CHAIN_ID,
            index: 0,
            label: "HumanAccount_1".to_string(),
            account_init_code_hash: B256::repeat_byte(0xab),
            gas: GasSettings::default(),
        }
    }

    fn entry_point() -> MockEntryPoint {
        let mut entry_point = MockEntryPoint::new();
        entry_point.expect_address().return_const(ENTRY_POINT);
        entry_point
    }

    fn evm_with_code(code: Bytes) -> MockEvmProvider {
        let mut evm = MockEvmProvider::new();
        evm.expect_get_code().returning(move |_| Ok(code.clone()));
        evm
    }

    type TestSigner = AccountSigner<MockEntryPoint, MockEvmProvider, FakeSender, PrivateKeySigner>;

    fn owner_signer(
        entry_point: MockEntryPoint,
        evm: MockEvmProvider,
        sender: FakeSender,
    ) -> TestSigner {
        AccountSigner::new(
            settings(),
            SigningStrategy::Owner(PrivateKeySigner::random()),
            entry_point,
            evm,
            sender,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_mismatched_entry_point() {
        let mut entry_point = MockEntryPoint::new();
        entry_point
            .expect_address()
            .return_const(Address::repeat_byte(1));
        let result = AccountSigner::new(
            settings(),
            SigningStrategy::Owner(PrivateKeySigner::random()),
            entry_point,
            MockEvmProvider::new(),
            FakeSender::new(Estimate::Defaults),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_address_cached() {
        let mut signer = owner_signer(
            entry_point(),
            MockEvmProvider::new(),
            FakeSender::new(Estimate::Defaults),
        );
        assert_eq!(signer.state(), SignerState::Unresolved);

        let address = signer.resolve_address().unwrap();
        assert_eq!(signer.state(), SignerState::AddressKnown);
        assert_eq!(signer.resolve_address().unwrap(), address);
        assert_eq!(
            address,
            AddressResolver::new(B256::repeat_byte(0xab)).resolve(FACTORY, signer.key_address(), 0)
        );
    }

    #[tokio::test]
    async fn test_execute_deploys() {
        let mut entry_point = entry_point();
        entry_point
            .expect_get_nonce()
            .times(1)
            .returning(|_, _| Ok(U256::from(1)));
        // code check only runs while the account is undeployed
        let mut evm = MockEvmProvider::new();
        evm.expect_get_code()
            .times(1)
            .returning(|_| Ok(Bytes::new()));

        let mut signer = owner_signer(entry_point, evm, FakeSender::new(Estimate::Defaults));
        let address = signer.resolve_address().unwrap();

        let receipt = signer.execute(CallIntent::noop(address)).await.unwrap();
        assert!(receipt.included());
        assert!(signer.account().is_deployed());
        assert_eq!(signer.state(), SignerState::AddressKnown);

        signer.execute(CallIntent::noop(address)).await.unwrap();

        let submitted = signer.sender.submitted();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].nonce, U256::ZERO);
        assert!(submitted[0].has_bootstrap());
        assert_eq!(submitted[1].nonce, U256::from(1));
        assert!(!submitted[1].has_bootstrap());

        let signature = Signature::try_from(submitted[1].signature.as_ref()).unwrap();
        let hash = submitted[1].hash(ENTRY_POINT, CHAIN_ID);
        assert_eq!(
            signature.recover_address_from_msg(hash.as_slice()).unwrap(),
            signer.key_address()
        );
    }

    #[tokio::test]
    async fn test_unknown_inclusion_keeps_undeployed() {
        let mut sender = FakeSender::new(Estimate::Defaults);
        sender.status = InclusionStatus::Unknown;
        let mut signer = owner_signer(entry_point(), evm_with_code(Bytes::new()), sender);
        let address = signer.resolve_address().unwrap();

        let receipt = signer.execute(CallIntent::noop(address)).await.unwrap();
        assert_eq!(receipt.status, InclusionStatus::Unknown);
        assert!(!signer.account().is_deployed());
    }

    #[tokio::test]
    async fn test_estimate_applied_with_buffer() {
        let gas = GasSpec {
            verification_gas_limit: 100_000,
            call_gas_limit: 50_000,
            pre_verification_gas: 40_000,
        };
        let mut signer = owner_signer(
            entry_point(),
            evm_with_code(Bytes::new()),
            FakeSender::new(Estimate::Gas(gas)),
        );
        let address = signer.resolve_address().unwrap();
        signer.execute(CallIntent::noop(address)).await.unwrap();

        let op = &signer.sender.submitted()[0];
        assert_eq!(op.gas(), gas.increase_by_percent(10));
    }

    #[tokio::test]
    async fn test_estimate_failure_uses_defaults() {
        let mut signer = owner_signer(
            entry_point(),
            evm_with_code(Bytes::new()),
            FakeSender::new(Estimate::Fail),
        );
        let address = signer.resolve_address().unwrap();
        signer.execute(CallIntent::noop(address)).await.unwrap();

        let op = &signer.sender.submitted()[0];
        assert_eq!(op.gas(), GasSettings::default().gas_spec(true));
    }

    #[tokio::test]
    async fn test_device_requires_connection() {
        let mut signer: TestSigner = AccountSigner::new(
            settings(),
            SigningStrategy::Device(PrivateKeySigner::random()),
            entry_point(),
            evm_with_code(Bytes::new()),
            FakeSender::new(Estimate::Defaults),
        )
        .unwrap();

        assert!(matches!(
            signer.execute(CallIntent::noop(Address::ZERO)).await,
            Err(Error::UnresolvedAccount)
        ));
        assert!(matches!(
            signer.deploy().await,
            Err(Error::DeployNotPermitted(KeyRole::Device))
        ));
        assert!(matches!(
            signer.connect_existing(Address::repeat_byte(3)).await,
            Err(Error::NotDeployed(_))
        ));
        assert_eq!(signer.state(), SignerState::Unresolved);
    }

    #[tokio::test]
    async fn test_device_connects() {
        let mut entry_point = entry_point();
        entry_point
            .expect_get_nonce()
            .returning(|_, _| Ok(U256::from(4)));
        let mut signer: TestSigner = AccountSigner::new(
            settings(),
            SigningStrategy::Device(PrivateKeySigner::random()),
            entry_point,
            evm_with_code(bytes!("6080")),
            FakeSender::new(Estimate::Defaults),
        )
        .unwrap();

        let account = Address::repeat_byte(3);
        signer.connect_existing(account).await.unwrap();
        assert!(signer.account().is_deployed());
        assert!(signer
            .connect_existing(Address::repeat_byte(4))
            .await
            .is_err());

        signer.execute(CallIntent::noop(account)).await.unwrap();
        let op = &signer.sender.submitted()[0];
        assert_eq!(op.sender, account);
        assert_eq!(op.nonce, U256::from(4));
        assert!(!op.has_bootstrap());
    }

    #[tokio::test]
    async fn test_deploy_skips_deployed() {
        let mut signer = owner_signer(
            entry_point(),
            evm_with_code(bytes!("6080")),
            FakeSender::new(Estimate::Defaults),
        );
        assert!(signer.deploy().await.unwrap().is_none());
        assert!(signer.sender.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_key_unavailable_submits_nothing() {
        let mut signer = AccountSigner::new(
            settings(),
            SigningStrategy::Owner(DisconnectedKey(Address::repeat_byte(9))),
            entry_point(),
            evm_with_code(Bytes::new()),
            FakeSender::new(Estimate::Defaults),
        )
        .unwrap();
        let address = signer.resolve_address().unwrap();

        match signer.execute(CallIntent::noop(address)).await {
            Err(Error::KeyUnavailable(reason)) => assert!(reason.contains("device disconnected")),
            other => panic!("unexpected result {other:?}"),
        }
        assert!(signer.sender.submitted().is_empty());
        assert_eq!(signer.state(), SignerState::AddressKnown);
        assert!(!signer.account().is_deployed());
    }
}
