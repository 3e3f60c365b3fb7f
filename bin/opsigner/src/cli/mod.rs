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

use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use opsigner_account::{
    AccountSettings, DeviceAccountSigner, OwnerAccountSigner, SmartAccountSigner,
};
use opsigner_provider::{
    AlloyAccountFactory, AlloyEntryPoint, AlloyEvmProvider, AlloyRelayProvider, EthereumWallet,
    EvmProvider, ProviderSettings, RpcTransport,
};
use opsigner_sender::{InclusionSettings, LocalSender, RelaySender, SenderEnum};
use opsigner_signer::signer_from_mnemonic;
use opsigner_types::{CallIntent, GasSettings, SubmissionReceipt};
use opsigner_utils::{eth::ether, log::LogWithContext};
use secrecy::SecretString;

mod run;
mod tracing;

use run::RunArgs;

/// Main entry point for the CLI
///
/// Parses the CLI arguments, connects to the node (and relay, if configured) and runs the
/// subcommand.
pub async fn run() -> anyhow::Result<()> {
    let opt = Cli::parse();
    let _guard = tracing::configure_logging(&opt.logs)?;
    let common = &opt.common;
    tracing::info!(
        "node {}, relay {:?}, factory {:?}, account index {}",
        common.node_http,
        common.aa_url,
        common.factory,
        common.aa_index
    );

    let mnemonic = SecretString::from(common.mnemonic.clone());
    let timeout = Duration::from_secs(common.provider_client_timeout_seconds);

    let funder = signer_from_mnemonic(&mnemonic, common.funder_key_index, None)
        .context("funder key should derive from mnemonic")?;
    let owner = signer_from_mnemonic(&mnemonic, common.owner_key_index, None)
        .context("owner key should derive from mnemonic")?;
    tracing::info!(
        "Using funder {:?}, owner {:?}",
        funder.address(),
        owner.address()
    );

    let provider = opsigner_provider::new_alloy_wallet_provider(
        &ProviderSettings {
            rpc_url: common.node_http.clone(),
            timeout,
        },
        EthereumWallet::from(funder.clone()),
    )?;
    let evm = AlloyEvmProvider::<_, RpcTransport>::new(provider.clone());
    let chain_id = evm
        .get_chain_id()
        .await
        .log_context("node should report chain id")?;
    let entry_point = AlloyEntryPoint::<_, RpcTransport>::new(common.entry_point, provider.clone());
    tracing::info!("Connected to chain {chain_id}, entry point {:?}", common.entry_point);

    let inclusion = InclusionSettings {
        timeout: Duration::from_secs(common.inclusion_timeout_seconds),
        poll_interval: Duration::from_millis(common.inclusion_poll_interval_millis),
    };
    let sender = match &common.aa_url {
        Some(aa_url) => {
            let relay = AlloyRelayProvider::<_, RpcTransport>::new(
                opsigner_provider::new_alloy_provider(&ProviderSettings {
                    rpc_url: aa_url.clone(),
                    timeout,
                })?,
            );
            let sender = RelaySender::new(relay, common.entry_point, inclusion);
            sender
                .check_supported()
                .await
                .log_context(format!("relay {aa_url} cannot be used"))?;
            SenderEnum::Relay(sender)
        }
        None => SenderEnum::Local(LocalSender::new(
            entry_point.clone(),
            evm.clone(),
            chain_id,
            funder.address(),
            inclusion,
        )),
    };

    let settings = common.account_settings(chain_id);
    let mut owner_signer = OwnerAccountSigner::new(
        settings.clone(),
        owner,
        entry_point.clone(),
        evm.clone(),
        sender.clone(),
    )?;

    match opt.command {
        Command::Address(args) => {
            let address = owner_signer.get_factory_deployment_address()?;
            tracing::info!("Account address {address:?}");
            if args.verify {
                let factory =
                    AlloyAccountFactory::<_, RpcTransport>::new(common.factory, provider.clone());
                owner_signer
                    .verify_address(&factory)
                    .await
                    .context("factory prediction should match resolved address")?;
                match owner_signer.find_deployment(&factory).await? {
                    Some(deployed) => tracing::info!("Factory logged deployment at {deployed:?}"),
                    None => tracing::info!("No deployment logged for the owner"),
                }
            }
            println!("{address}");
        }
        Command::Execute(args) => {
            let call = CallIntent::new(args.target, args.data).with_value(args.value);
            let receipt = owner_signer.execute(call).await?;
            log_receipt("execute", &receipt);
        }
        Command::Run(args) => {
            let device = signer_from_mnemonic(&mnemonic, args.device_key_index(), None)
                .context("device key should derive from mnemonic")?;
            let device_signer =
                DeviceAccountSigner::new(settings, device, entry_point, evm.clone(), sender)?;
            run::run_scenario(&args, owner_signer, device_signer, &evm, inclusion.timeout)
                .await?;
        }
    }

    Ok(())
}

pub(crate) fn log_receipt(label: &str, receipt: &SubmissionReceipt) {
    tracing::info!(
        "{label}: operation {:?} status {} tx {:?} block {:?} success {:?} gas used {:?}",
        receipt.op_hash,
        receipt.status,
        receipt.transaction_hash,
        receipt.block_number,
        receipt.success,
        receipt.actual_gas_used
    );
}

/// CLI options
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    #[clap(flatten)]
    common: CommonArgs,

    #[clap(flatten)]
    logs: LogsArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Address command
    ///
    /// Prints the counterfactual address of the owner's account
    #[command(name = "address")]
    Address(AddressArgs),

    /// Execute command
    ///
    /// Executes a call from the account with the owner key
    #[command(name = "execute")]
    Execute(ExecuteArgs),

    /// Run command
    ///
    /// Funds the account, registers a device key and executes a call through it
    #[command(name = "run")]
    Run(RunArgs),
}

/// Options shared by all commands
#[derive(Debug, Args)]
#[command(next_help_heading = "Common")]
struct CommonArgs {
    /// Node HTTP JSON-RPC endpoint
    #[arg(
        long = "node_http",
        name = "node_http",
        env = "NODE_HTTP",
        default_value = "http://localhost:8545",
        global = true
    )]
    node_http: String,

    /// Relay (bundler) endpoint
    ///
    /// If not set, operations are submitted to the entry point directly by the funder
    #[arg(long = "aa_url", name = "aa_url", env = "AA_URL", global = true)]
    aa_url: Option<String>,

    #[arg(
        long = "entry_point",
        name = "entry_point",
        env = "ENTRY_POINT",
        default_value = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789",
        global = true
    )]
    entry_point: Address,

    #[arg(long = "factory", name = "factory", env = "FACTORY", global = true)]
    factory: Address,

    /// Hash of the account creation code the factory deploys
    #[arg(
        long = "account_init_code_hash",
        name = "account_init_code_hash",
        env = "ACCOUNT_INIT_CODE_HASH",
        global = true
    )]
    account_init_code_hash: B256,

    /// Account index, one owner can have several accounts
    #[arg(
        long = "aa_index",
        name = "aa_index",
        env = "AA_INDEX",
        default_value = "0",
        global = true
    )]
    aa_index: u64,

    #[arg(
        long = "label",
        name = "label",
        env = "AA_LABEL",
        default_value = "HumanAccount_1",
        global = true
    )]
    label: String,

    #[arg(
        long = "mnemonic",
        name = "mnemonic",
        env = "MNEMONIC",
        default_value = "test test test test test test test test test test test junk",
        hide_default_value = true,
        hide_env_values = true,
        global = true
    )]
    mnemonic: String,

    #[arg(
        long = "owner_key_index",
        name = "owner_key_index",
        env = "OWNER_KEY_INDEX",
        default_value = "0",
        global = true
    )]
    owner_key_index: u32,

    /// Mnemonic index of the EOA paying for funding, deposits and local submission
    #[arg(
        long = "funder_key_index",
        name = "funder_key_index",
        env = "FUNDER_KEY_INDEX",
        default_value = "0",
        global = true
    )]
    funder_key_index: u32,

    #[arg(
        long = "provider_client_timeout_seconds",
        name = "provider_client_timeout_seconds",
        env = "PROVIDER_CLIENT_TIMEOUT_SECONDS",
        default_value = "10",
        global = true
    )]
    provider_client_timeout_seconds: u64,

    #[arg(
        long = "inclusion_timeout_seconds",
        name = "inclusion_timeout_seconds",
        env = "INCLUSION_TIMEOUT_SECONDS",
        default_value = "120",
        global = true
    )]
    inclusion_timeout_seconds: u64,

    #[arg(
        long = "inclusion_poll_interval_millis",
        name = "inclusion_poll_interval_millis",
        env = "INCLUSION_POLL_INTERVAL_MILLIS",
        default_value = "2000",
        global = true
    )]
    inclusion_poll_interval_millis: u64,
}

impl CommonArgs {
    fn account_settings(&self, chain_id: u64) -> AccountSettings {
        AccountSettings {
            entry_point: self.entry_point,
            factory: self.factory,
            chain_id,
            index: self.aa_index,
            label: self.label.clone(),
            account_init_code_hash: self.account_init_code_hash,
            gas: GasSettings::default(),
        }
    }
}

#[derive(Debug, Args)]
struct AddressArgs {
    /// Compare with the factory's getAddress and look up logged deployments
    #[arg(long = "verify", name = "verify", env = "VERIFY")]
    verify: bool,
}

#[derive(Debug, Args)]
struct ExecuteArgs {
    #[arg(long = "target", name = "target")]
    target: Address,

    /// Value in ether
    #[arg(
        long = "value",
        name = "value",
        default_value = "0",
        value_parser = ether
    )]
    value: U256,

    /// Calldata, hex encoded
    #[arg(long = "data", name = "data", default_value = "0x")]
    data: Bytes,
}

/// CLI options for logging
#[derive(Debug, Args)]
#[command(next_help_heading = "Logging")]
pub struct LogsArgs {
    /// Log file
    ///
    /// If not provided, logs will be written to stdout
    #[arg(long = "log.file", name = "log.file", env = "LOG_FILE", global = true)]
    file: Option<String>,

    /// Log format
    #[arg(
        long = "log.format",
        name = "log.format",
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    format: LogFormat,
}

/// Output format of the log lines
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single line per event
    #[default]
    Compact,
    /// Multi-line, human readable
    Pretty,
    /// One JSON object per event
    Json,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_address_command() {
        let cli = Cli::try_parse_from([
            "opsigner",
            "--factory",
            "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
            "--account_init_code_hash",
            "0x0101010101010101010101010101010101010101010101010101010101010101",
            "--aa_index",
            "3",
            "address",
            "--verify",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Address(AddressArgs { verify: true })));
        assert_eq!(
            cli.common.factory,
            address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0")
        );
        assert_eq!(cli.common.aa_index, 3);
        assert_eq!(cli.common.label, "HumanAccount_1");

        let settings = cli.common.account_settings(1337);
        assert_eq!(settings.index, 3);
        assert_eq!(settings.chain_id, 1337);
        assert_eq!(
            settings.entry_point,
            address!("5FF137D4b0FDCD49DcA30c7CF57E578a026d2789")
        );
    }

    #[test]
    fn test_parse_execute_value() {
        let cli = Cli::try_parse_from([
            "opsigner",
            "execute",
            "--factory",
            "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
            "--account_init_code_hash",
            "0x0101010101010101010101010101010101010101010101010101010101010101",
            "--target",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "--value",
            "0.5",
        ])
        .unwrap();
        let Command::Execute(args) = cli.command else {
            panic!("expected execute command");
        };
        assert_eq!(args.value, U256::from(500_000_000_000_000_000u64));
        assert_eq!(args.value, ether("0.5").unwrap());
        assert!(args.data.is_empty());

        assert!(Cli::try_parse_from([
            "opsigner",
            "execute",
            "--factory",
            "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
            "--account_init_code_hash",
            "0x0101010101010101010101010101010101010101010101010101010101010101",
            "--target",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "--value",
            "half",
        ])
        .is_err());
    }

    #[test]
    fn test_parse_log_format() {
        let args = [
            "opsigner",
            "--factory",
            "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
            "--account_init_code_hash",
            "0x0101010101010101010101010101010101010101010101010101010101010101",
            "address",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.logs.format, LogFormat::Compact);
        assert!(cli.logs.file.is_none());

        let cli = Cli::try_parse_from(args.into_iter().chain(["--log.format", "pretty"])).unwrap();
        assert_eq!(cli.logs.format, LogFormat::Pretty);

        assert!(Cli::try_parse_from(args.into_iter().chain(["--log.format", "xml"])).is_err());
    }
}
