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

use alloy_signer::Signer;
use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use secrecy::{ExposeSecret, SecretString};

use crate::Result;

/// Load a signer from a hex encoded private key
pub fn signer_from_private_key(
    private_key: &SecretString,
    chain_id: Option<u64>,
) -> Result<PrivateKeySigner> {
    Ok(private_key
        .expose_secret()
        .parse::<PrivateKeySigner>()?
        .with_chain_id(chain_id))
}

/// Derive the signer at `index` of a BIP-39 mnemonic, using the default derivation path
pub fn signer_from_mnemonic(
    mnemonic: &SecretString,
    index: u32,
    chain_id: Option<u64>,
) -> Result<PrivateKeySigner> {
    Ok(MnemonicBuilder::<English>::default()
        .phrase(mnemonic.expose_secret())
        .index(index)?
        .build()?
        .with_chain_id(chain_id))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

    #[test]
    fn test_mnemonic_accounts() {
        let mnemonic = SecretString::from(TEST_MNEMONIC.to_string());
        assert_eq!(
            signer_from_mnemonic(&mnemonic, 0, None).unwrap().address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(
            signer_from_mnemonic(&mnemonic, 1, None).unwrap().address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn test_private_key() {
        let key = SecretString::from(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        );
        let signer = signer_from_private_key(&key, Some(1337)).unwrap();
        assert_eq!(
            signer.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(signer.chain_id(), Some(1337));
    }

    #[test]
    fn test_invalid_private_key() {
        let key = SecretString::from("not a key".to_string());
        assert!(matches!(
            signer_from_private_key(&key, None),
            Err(crate::Error::InvalidKey(_))
        ));
    }
}
