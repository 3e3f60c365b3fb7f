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

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Opsigner providers
//! A provider is a type that provides access to chain state, the account contracts and relays

mod alloy;
pub use alloy::{
    entry_point::AlloyEntryPoint, evm::AlloyEvmProvider, factory::AlloyAccountFactory,
    new_alloy_provider, new_alloy_wallet_provider, relay::AlloyRelayProvider, ProviderSettings,
    RpcTransport,
};

mod traits;
// re-export alloy RPC types
pub use alloy_network::EthereumWallet;
pub use alloy_rpc_types_eth::TransactionRequest;
pub use traits::*;
