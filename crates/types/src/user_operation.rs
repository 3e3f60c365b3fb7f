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

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use opsigner_contracts::v0_6::UserOperation as ContractUserOperation;

use crate::{GasFees, GasSpec};

/// ERC-4337 v0.6 user operation
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserOperation {
    /// Account sending the operation
    pub sender: Address,
    /// Anti-replay nonce, key in the upper 192 bits
    pub nonce: U256,
    /// Factory address followed by the factory calldata, empty for deployed accounts
    pub init_code: Bytes,
    /// Calldata executed by the account
    pub call_data: Bytes,
    /// Call gas limit
    pub call_gas_limit: u128,
    /// Verification gas limit
    pub verification_gas_limit: u128,
    /// Pre-verification gas
    pub pre_verification_gas: u128,
    /// EIP-1559 max fee per gas
    pub max_fee_per_gas: u128,
    /// EIP-1559 max priority fee per gas
    pub max_priority_fee_per_gas: u128,
    /// Paymaster address followed by paymaster data, empty when the account pays
    pub paymaster_and_data: Bytes,
    /// Signature over the operation hash
    pub signature: Bytes,
}

impl UserOperation {
    /// Hash of the operation bound to an entry point and chain.
    ///
    /// Matches `EntryPoint.getUserOpHash`. The signature is not part of the hash.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> B256 {
        keccak256(
            (
                keccak256(self.pack_for_hash()),
                entry_point,
                U256::from(chain_id),
            )
                .abi_encode(),
        )
    }

    fn pack_for_hash(&self) -> Vec<u8> {
        (
            self.sender,
            self.nonce,
            keccak256(&self.init_code),
            keccak256(&self.call_data),
            U256::from(self.call_gas_limit),
            U256::from(self.verification_gas_limit),
            U256::from(self.pre_verification_gas),
            U256::from(self.max_fee_per_gas),
            U256::from(self.max_priority_fee_per_gas),
            keccak256(&self.paymaster_and_data),
        )
            .abi_encode()
    }

    /// Factory named by the init code, if the operation deploys its sender.
    pub fn factory(&self) -> Option<Address> {
        (self.init_code.len() >= 20).then(|| Address::from_slice(&self.init_code[..20]))
    }

    /// True if the operation carries a deployment payload
    pub fn has_bootstrap(&self) -> bool {
        !self.init_code.is_empty()
    }

    /// True once a signature has been attached
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Gas limits of the operation
    pub fn gas(&self) -> GasSpec {
        GasSpec {
            verification_gas_limit: self.verification_gas_limit,
            call_gas_limit: self.call_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
        }
    }

    /// Replace the gas limits
    pub fn set_gas(&mut self, gas: GasSpec) {
        self.verification_gas_limit = gas.verification_gas_limit;
        self.call_gas_limit = gas.call_gas_limit;
        self.pre_verification_gas = gas.pre_verification_gas;
    }

    /// Fees of the operation
    pub fn fees(&self) -> GasFees {
        GasFees {
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
        }
    }

    /// Replace the fees
    pub fn set_fees(&mut self, fees: GasFees) {
        self.max_fee_per_gas = fees.max_fee_per_gas;
        self.max_priority_fee_per_gas = fees.max_priority_fee_per_gas;
    }
}

impl From<UserOperation> for ContractUserOperation {
    fn from(op: UserOperation) -> Self {
        ContractUserOperation {
            sender: op.sender,
            nonce: op.nonce,
            initCode: op.init_code,
            callData: op.call_data,
            callGasLimit: U256::from(op.call_gas_limit),
            verificationGasLimit: U256::from(op.verification_gas_limit),
            preVerificationGas: U256::from(op.pre_verification_gas),
            maxFeePerGas: U256::from(op.max_fee_per_gas),
            maxPriorityFeePerGas: U256::from(op.max_priority_fee_per_gas),
            paymasterAndData: op.paymaster_and_data,
            signature: op.signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256, bytes};

    use super::*;

    #[test]
    fn test_hash_zeroed() {
        // Testing a user operation hash against the hash generated by the
        // entrypoint contract getUserOpHash() function with entrypoint address
        // at 0x66a15edcc3b50a663e72f1457ffd49b9ae284ddc and chain ID 1337.
        let operation = UserOperation::default();
        let entry_point = address!("66a15edcc3b50a663e72f1457ffd49b9ae284ddc");
        let hash = operation.hash(entry_point, 1337);
        assert_eq!(
            hash,
            b256!("dca97c3b49558ab360659f6ead939773be8bf26631e61bb17045bb70dc983b2d")
        );
    }

    fn populated() -> UserOperation {
        UserOperation {
            sender: address!("1306b01bc3e4ad202612d3843387e94737673f53"),
            nonce: U256::from(8942),
            init_code: bytes!("6942069420694206942069420694206942069420"),
            call_data: bytes!("0000000000000000000000000000000000000000080085"),
            call_gas_limit: 10000,
            verification_gas_limit: 100000,
            pre_verification_gas: 100,
            max_fee_per_gas: 99999,
            max_priority_fee_per_gas: 9999999,
            paymaster_and_data: bytes!(
                "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
            ),
            signature: bytes!("da0929f527cded8d0a1eaf2e8861d7f7e2d8160b7b13942f99dd367df4473a"),
        }
    }

    #[test]
    fn test_hash() {
        let entry_point = address!("66a15edcc3b50a663e72f1457ffd49b9ae284ddc");
        assert_eq!(
            populated().hash(entry_point, 1337),
            b256!("484add9e4d8c3172d11b5feb6a3cc712280e176d278027cfa02ee396eb28afa1")
        );
    }

    #[test]
    fn test_hash_ignores_signature() {
        let entry_point = address!("66a15edcc3b50a663e72f1457ffd49b9ae284ddc");
        let mut op = populated();
        let before = op.hash(entry_point, 1337);
        op.signature = Bytes::new();
        assert_eq!(op.hash(entry_point, 1337), before);
    }

    #[test]
    fn test_hash_binds_entry_point_and_chain() {
        let op = populated();
        let entry_point = address!("66a15edcc3b50a663e72f1457ffd49b9ae284ddc");
        let base = op.hash(entry_point, 1337);
        assert_ne!(op.hash(entry_point, 1), base);
        assert_ne!(op.hash(Address::ZERO, 1337), base);
    }

    #[test]
    fn test_factory() {
        let op = populated();
        assert_eq!(
            op.factory(),
            Some(address!("6942069420694206942069420694206942069420"))
        );
        assert!(op.has_bootstrap());
        assert_eq!(UserOperation::default().factory(), None);
        assert!(!UserOperation::default().has_bootstrap());
    }

    #[test]
    fn test_into_contract_type() {
        let op: ContractUserOperation = populated().into();
        assert_eq!(op.callGasLimit, U256::from(10000));
        assert_eq!(op.maxPriorityFeePerGas, U256::from(9999999));
        assert_eq!(op.initCode, populated().init_code);
    }
}
