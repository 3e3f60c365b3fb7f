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

use opsigner_utils::math;

/// Gas limits of a user operation
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GasSpec {
    /// Gas limit for the validation phase, including account deployment
    pub verification_gas_limit: u128,
    /// Gas limit for the account's execution of the call
    pub call_gas_limit: u128,
    /// Gas paid to the submitter to cover calldata and overhead
    pub pre_verification_gas: u128,
}

impl GasSpec {
    /// Increase every limit by a percentage, rounding up
    pub fn increase_by_percent(self, percent: u32) -> Self {
        Self {
            verification_gas_limit: math::increase_by_percent_ceil(
                self.verification_gas_limit,
                percent,
            ),
            call_gas_limit: math::increase_by_percent_ceil(self.call_gas_limit, percent),
            pre_verification_gas: math::increase_by_percent_ceil(
                self.pre_verification_gas,
                percent,
            ),
        }
    }
}

/// Gas fees for a user operation or transaction
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GasFees {
    /// EIP-1559 max fee per gas
    pub max_fee_per_gas: u128,
    /// EIP-1559 max priority fee per gas
    pub max_priority_fee_per_gas: u128,
}

/// Gas values used when a call does not carry its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GasSettings {
    /// Call gas limit
    pub call_gas_limit: u128,
    /// Verification gas limit for deployed accounts
    pub verification_gas_limit: u128,
    /// Verification gas limit for operations that also deploy the account
    pub deploy_verification_gas_limit: u128,
    /// Pre-verification gas
    pub pre_verification_gas: u128,
    /// Fees
    pub fees: GasFees,
    /// Percentage added on top of sender-provided estimates
    pub estimate_buffer_percent: u32,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            call_gas_limit: 200_000,
            verification_gas_limit: 150_000,
            deploy_verification_gas_limit: 1_000_000,
            pre_verification_gas: 60_000,
            fees: GasFees {
                max_fee_per_gas: 3_000_000_000,
                max_priority_fee_per_gas: 1_000_000_000,
            },
            estimate_buffer_percent: 10,
        }
    }
}

impl GasSettings {
    /// Default limits for an operation, `deploying` selects the larger verification limit.
    pub fn gas_spec(&self, deploying: bool) -> GasSpec {
        GasSpec {
            verification_gas_limit: if deploying {
                self.deploy_verification_gas_limit
            } else {
                self.verification_gas_limit
            },
            call_gas_limit: self.call_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
        }
    }
}
