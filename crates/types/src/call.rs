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

use alloy_primitives::{Address, Bytes, U256};

use crate::{GasFees, GasSpec};

/// A contract call to be executed by a smart account.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallIntent {
    /// Contract or EOA called by the account
    pub target: Address,
    /// Wei sent with the call
    pub value: U256,
    /// Calldata for the target
    pub data: Bytes,
    /// Gas limits overriding estimation and defaults
    pub gas: Option<GasSpec>,
    /// Fees overriding defaults
    pub fees: Option<GasFees>,
}

impl CallIntent {
    /// Call `target` with `data` and no value.
    pub fn new(target: Address, data: impl Into<Bytes>) -> Self {
        Self {
            target,
            data: data.into(),
            ..Default::default()
        }
    }

    /// Empty call to `target`.
    pub fn noop(target: Address) -> Self {
        Self::new(target, Bytes::new())
    }

    /// Attach a value
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Attach explicit gas limits
    pub fn with_gas(mut self, gas: GasSpec) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Attach explicit fees
    pub fn with_fees(mut self, fees: GasFees) -> Self {
        self.fees = Some(fees);
        self
    }
}
