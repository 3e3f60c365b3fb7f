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

use alloy_network::EthereumWallet;
use alloy_provider::{Provider as AlloyProvider, ProviderBuilder};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_transport::{
    layers::{RetryBackoffLayer, RetryBackoffService},
    utils::guess_local_url,
};
use alloy_transport_http::Http;
use anyhow::Context;
use reqwest::Client;
use url::Url;

pub(crate) mod entry_point;
pub(crate) mod evm;
pub(crate) mod factory;
pub(crate) mod relay;

/// Transport used by the providers built here
pub type RpcTransport = RetryBackoffService<Http<Client>>;

/// Connection settings for a node or relay
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,
    /// Timeout of a single HTTP request
    pub timeout: Duration,
}

/// Create a new alloy provider from the given settings
pub fn new_alloy_provider(
    settings: &ProviderSettings,
) -> anyhow::Result<impl AlloyProvider<RpcTransport> + Clone> {
    let client = new_rpc_client(settings)?;
    Ok(ProviderBuilder::new().on_client(client))
}

/// Create a new alloy provider that fills, signs and sends transactions with `wallet`
pub fn new_alloy_wallet_provider(
    settings: &ProviderSettings,
    wallet: EthereumWallet,
) -> anyhow::Result<impl AlloyProvider<RpcTransport> + Clone> {
    let client = new_rpc_client(settings)?;
    Ok(ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_client(client))
}

fn new_rpc_client(
    settings: &ProviderSettings,
) -> anyhow::Result<RpcClient<RpcTransport>> {
    let url = Url::parse(&settings.rpc_url).context("invalid rpc url")?;
    let http_client = Client::builder()
        .timeout(settings.timeout)
        .build()
        .context("failed to build http client")?;
    let is_local = guess_local_url(&url);
    // TODO: expose retry count and backoff in ProviderSettings
    let retry_layer = RetryBackoffLayer::new(10, 500, 1_000_000);
    Ok(ClientBuilder::default()
        .layer(retry_layer)
        .transport(Http::with_client(http_client, url), is_local))
}
