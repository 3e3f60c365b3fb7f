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

//! HumanAccount and its factory.
//!
//! The factory deploys accounts with CREATE2 using
//! `salt = keccak256(abi.encode(owner, index))`, so an account address depends only on the
//! factory, the owner and the index.

use alloy_sol_macro::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Default, Debug, PartialEq, Eq)]
    interface IHumanAccountFactory {
        event DeployedHumanAccount(address indexed account, address indexed owner, string username);

        function createAccount(string calldata username, uint256 index, address owner) external returns (address account);

        function getAddress(address owner, uint256 salt) external view returns (address account);
    }

    #[allow(missing_docs)]
    #[derive(Default, Debug, PartialEq, Eq)]
    interface IHumanAccount {
        event DeviceKeyRegistered(address indexed deviceKey);

        event DeviceKeyRemoved(address indexed deviceKey);

        function execute(address dest, uint256 value, bytes calldata func) external;

        function registerDeviceKey(address deviceKey, bytes calldata signature) external;

        function removeDeviceKey(address deviceKey, bytes calldata signature) external;
    }
}
