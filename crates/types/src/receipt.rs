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

use alloy_primitives::{Address, Bytes, B256, U256};
use parse_display::Display;

/// Whether a submitted operation was seen on chain
#[derive(Display, Debug, Clone, Copy, Eq, PartialEq)]
#[display(style = "snake_case")]
pub enum InclusionStatus {
    /// Included in a block
    Included,
    /// Not observed before the wait timed out
    Unknown,
}

/// Outcome of an operation event emitted by the entry point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserOperationReceipt {
    /// Operation hash
    pub op_hash: B256,
    /// Account that sent the operation
    pub sender: Address,
    /// Operation nonce
    pub nonce: U256,
    /// True if the account's call did not revert
    pub success: bool,
    /// Gas cost charged to the account
    pub actual_gas_cost: U256,
    /// Gas used by the operation
    pub actual_gas_used: U256,
    /// Revert data of the call, if any
    pub reason: Option<Bytes>,
    /// Bundle transaction
    pub transaction_hash: B256,
    /// Block of the bundle transaction
    pub block_number: u64,
}

/// What a sender reports back for a submitted operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmissionReceipt {
    /// Operation hash
    pub op_hash: B256,
    /// Transaction carrying the operation, when known
    pub transaction_hash: Option<B256>,
    /// Inclusion status
    pub status: InclusionStatus,
    /// Block the operation was included in
    pub block_number: Option<u64>,
    /// True if the account's call did not revert
    pub success: Option<bool>,
    /// Gas used by the operation
    pub actual_gas_used: Option<U256>,
}

impl SubmissionReceipt {
    /// Receipt for an operation whose inclusion could not be confirmed in time.
    pub fn unknown(op_hash: B256, transaction_hash: Option<B256>) -> Self {
        Self {
            op_hash,
            transaction_hash,
            status: InclusionStatus::Unknown,
            block_number: None,
            success: None,
            actual_gas_used: None,
        }
    }

    /// True iff the operation was included
    pub fn included(&self) -> bool {
        self.status == InclusionStatus::Included
    }
}

impl From<UserOperationReceipt> for SubmissionReceipt {
    fn from(receipt: UserOperationReceipt) -> Self {
        Self {
            op_hash: receipt.op_hash,
            transaction_hash: Some(receipt.transaction_hash),
            status: InclusionStatus::Included,
            block_number: Some(receipt.block_number),
            success: Some(receipt.success),
            actual_gas_used: Some(receipt.actual_gas_used),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_operation_receipt() {
        let receipt = SubmissionReceipt::from(UserOperationReceipt {
            op_hash: B256::repeat_byte(1),
            sender: Address::repeat_byte(2),
            nonce: U256::ZERO,
            success: true,
            actual_gas_cost: U256::from(10),
            actual_gas_used: U256::from(5),
            reason: None,
            transaction_hash: B256::repeat_byte(3),
            block_number: 7,
        });
        assert!(receipt.included());
        assert_eq!(receipt.block_number, Some(7));
        assert_eq!(receipt.transaction_hash, Some(B256::repeat_byte(3)));
    }

    #[test]
    fn test_unknown() {
        let receipt = SubmissionReceipt::unknown(B256::ZERO, None);
        assert!(!receipt.included());
        assert_eq!(receipt.status.to_string(), "unknown");
    }
}
