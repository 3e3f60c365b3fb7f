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

use std::collections::BTreeSet;

use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolValue;
use parse_display::Display;

/// Role of a key allowed to sign for an account
#[derive(Display, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[display(style = "lowercase")]
pub enum KeyRole {
    /// Key the account was created for, can manage device keys
    Owner,
    /// Key registered by the owner, valid until removed
    Device,
}

/// Hash the owner signs to register or remove `device`.
///
/// `keccak256(abi.encode(device))`. The same hash authorizes both registration and removal and
/// is not bound to an account or chain, matching the on-chain verification.
pub fn device_key_request_hash(device: Address) -> B256 {
    keccak256(device.abi_encode())
}

/// A HumanAccount as seen by a signer.
///
/// The address is fixed once bound and `deployed` only moves from false to true.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    address: Option<Address>,
    factory: Address,
    owner: Option<Address>,
    index: u64,
    label: String,
    device_keys: BTreeSet<Address>,
    deployed: bool,
}

impl Account {
    /// Account of `owner` at `index` under `factory`, address not yet computed.
    pub fn new(factory: Address, owner: Address, index: u64, label: impl Into<String>) -> Self {
        Self {
            address: None,
            factory,
            owner: Some(owner),
            index,
            label: label.into(),
            device_keys: BTreeSet::new(),
            deployed: false,
        }
    }

    /// Account with unknown owner, bound to an address later, as used by device keys.
    pub fn unbound(factory: Address, index: u64, label: impl Into<String>) -> Self {
        Self {
            address: None,
            factory,
            owner: None,
            index,
            label: label.into(),
            device_keys: BTreeSet::new(),
            deployed: false,
        }
    }

    /// Address if bound
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Binds the address. An address that is already bound is kept and returned.
    pub fn bind_address(&mut self, address: Address) -> Address {
        *self.address.get_or_insert(address)
    }

    /// Factory deploying the account
    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Owner key, if known
    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    /// Account index
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Username passed to the factory on deployment
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True once the account code has been observed or created
    pub fn is_deployed(&self) -> bool {
        self.deployed
    }

    /// Records that the account exists on chain
    pub fn mark_deployed(&mut self) {
        self.deployed = true;
    }

    /// Device keys registered through this handle
    pub fn device_keys(&self) -> &BTreeSet<Address> {
        &self.device_keys
    }

    /// Track a registered device key, returns false if already tracked
    pub fn add_device_key(&mut self, device: Address) -> bool {
        self.device_keys.insert(device)
    }

    /// Stop tracking a device key, returns false if it was not tracked
    pub fn remove_device_key(&mut self, device: Address) -> bool {
        self.device_keys.remove(&device)
    }
}
