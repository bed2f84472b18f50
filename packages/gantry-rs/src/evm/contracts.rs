//! EVM bridge contract ABI definitions.
//!
//! Uses alloy's sol! macro to generate type-safe bindings. Calls are
//! encoded to raw calldata and submitted through an [`EvmProvider`], so
//! the bindings carry no RPC plumbing.
//!
//! [`EvmProvider`]: crate::evm::provider::EvmProvider

use alloy::sol;
use alloy::sol_types::SolInterface;

use crate::error::WalletError;

sol! {
    /// Bridge contract surface used by the client.
    #[derive(Debug, PartialEq, Eq)]
    contract GantryBridge {
        // ====================================================================
        // Transfer Methods
        // ====================================================================

        /// Locks tokens on this chain to start a cross-chain transfer,
        /// authorized by a gateway-issued signature.
        function bridgeIn(
            address token,
            uint256 amount,
            uint256 gasCommission,
            string destinationChain,
            string destinationAddress,
            uint256 deadline,
            uint256 nonce,
            bytes signature
        ) external;

        /// Returns locked tokens to the recipient, cancelling a transfer
        /// that has not been executed on the destination chain yet.
        function transferOut(
            address token,
            address recipient,
            uint256 amount,
            uint256 commission,
            uint256 nonce,
            bytes signature
        ) external;

        // ====================================================================
        // Errors
        // ====================================================================

        /// The gateway signature was already consumed by an earlier call.
        error AlreadyUsedSignature();

        /// The bridge pool cannot cover the requested amount.
        error AmountExceedBridgePool();

        /// The commission pool cannot cover the requested commission.
        error AmountExceedCommissionPool();

        /// The gateway signature's deadline has passed.
        error ExpiredSignature();

        /// The signature does not verify against the call parameters.
        error InvalidSignature();
    }
}

sol! {
    /// Minimal ERC-20 surface needed to fund bridge-in calls.
    #[derive(Debug, PartialEq, Eq)]
    contract ERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Maps revert data from a failed bridge call to a wallet error, decoding
/// the bridge's custom errors where possible.
pub fn decode_revert(data: &[u8], nonce: u64) -> WalletError {
    use GantryBridge::GantryBridgeErrors as Errors;

    if data.is_empty() {
        return WalletError::Revert {
            reason: "transaction reverted".to_string(),
        };
    }

    match Errors::abi_decode(data, true) {
        Ok(Errors::AlreadyUsedSignature(_)) => WalletError::AlreadyUsedSignature { nonce },
        Ok(Errors::AmountExceedBridgePool(_)) => WalletError::Revert {
            reason: "amount exceeds the bridge pool".to_string(),
        },
        Ok(Errors::AmountExceedCommissionPool(_)) => WalletError::Revert {
            reason: "amount exceeds the commission pool".to_string(),
        },
        Ok(Errors::ExpiredSignature(_)) => WalletError::Revert {
            reason: "bridge signature has expired".to_string(),
        },
        Ok(Errors::InvalidSignature(_)) => WalletError::Revert {
            reason: "bridge rejected the signature".to_string(),
        },
        Err(_) => WalletError::Revert {
            reason: format!("0x{}", hex::encode(data)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{SolCall, SolError};

    #[test]
    fn already_used_signature_keeps_the_nonce() {
        let data = GantryBridge::AlreadyUsedSignature {}.abi_encode();
        match decode_revert(&data, 42) {
            WalletError::AlreadyUsedSignature { nonce } => assert_eq!(nonce, 42),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn named_errors_decode_to_readable_reasons() {
        let cases: Vec<(Vec<u8>, &str)> = vec![
            (
                GantryBridge::AmountExceedBridgePool {}.abi_encode(),
                "bridge pool",
            ),
            (
                GantryBridge::AmountExceedCommissionPool {}.abi_encode(),
                "commission pool",
            ),
            (GantryBridge::ExpiredSignature {}.abi_encode(), "expired"),
            (
                GantryBridge::InvalidSignature {}.abi_encode(),
                "rejected the signature",
            ),
        ];
        for (data, needle) in cases {
            match decode_revert(&data, 0) {
                WalletError::Revert { reason } => {
                    assert!(reason.contains(needle), "reason {reason:?} missing {needle:?}")
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_revert_data_is_reported_as_hex() {
        match decode_revert(&[0xde, 0xad, 0xbe, 0xef], 0) {
            WalletError::Revert { reason } => assert_eq!(reason, "0xdeadbeef"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_revert_data_is_reported_plainly() {
        match decode_revert(&[], 0) {
            WalletError::Revert { reason } => assert_eq!(reason, "transaction reverted"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn call_encodings_carry_their_selectors() {
        use alloy::primitives::{Address, U256};

        let approve = ERC20::approveCall {
            spender: Address::ZERO,
            amount: U256::from(1u64),
        }
        .abi_encode();
        assert_eq!(&approve[..4], ERC20::approveCall::SELECTOR);

        let transfer_out = GantryBridge::transferOutCall {
            token: Address::ZERO,
            recipient: Address::ZERO,
            amount: U256::from(1u64),
            commission: U256::from(0u64),
            nonce: U256::from(7u64),
            signature: vec![0xde, 0xad].into(),
        }
        .abi_encode();
        assert_eq!(&transfer_out[..4], GantryBridge::transferOutCall::SELECTOR);
    }
}
