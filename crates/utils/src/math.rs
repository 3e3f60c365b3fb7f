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

//! Math utilities

use alloy_primitives::U256;

/// Increases a number by a percentage, rounding up.
///
/// Saturates at `u128::MAX`.
pub fn increase_by_percent_ceil(n: u128, percent: u32) -> u128 {
    let hundred = U256::from(100);
    let increased = (U256::from(n) * (hundred + U256::from(percent)) + U256::from(99)) / hundred;
    increased.saturating_to()
}
