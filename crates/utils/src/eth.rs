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

//! Ether amount helpers used when reporting balances.

use alloy_primitives::{
    utils::{format_units, parse_ether},
    U256,
};

/// Parses a decimal ether amount such as `"0.01"` into wei.
pub fn ether(amount: &str) -> anyhow::Result<U256> {
    Ok(parse_ether(amount)?)
}

/// Formats a wei amount in gwei, the unit balances and deposits are logged in.
pub fn format_gwei(amount: U256) -> String {
    format_units(amount, "gwei").unwrap_or_else(|_| amount.to_string())
}
