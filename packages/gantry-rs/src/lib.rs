//! Gantry-RS: Cross-Chain Bridge Client Library
//!
//! This crate provides everything a bridge frontend or headless tool needs
//! to move tokens between EVM chains and Casper through the bridge gateway:
//!
//! - **Types** - Wire types for chains, tokens, transfers and signatures
//! - **Address Codec** - Address validation and account-hash tagging
//! - **Hash** - Blake2b digests and Casper key material
//! - **API Module** - REST clients for the gateway directory, the transfer
//!   protocol and the deploy relay
//! - **Wallet Module** - The five-capability wallet abstraction and the
//!   service routing calls per chain family
//! - **EVM Module** - Provider abstraction, bridge contract bindings and
//!   the EVM wallet adapter
//! - **Casper Module** - Signer abstraction, deploy serialization and the
//!   Casper wallet adapter
//! - **Orchestrator** - The transfer state machine tying it all together
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! gantry-rs = { path = "../gantry-rs" }
//! ```
//!
//! ## Feature Flags
//!
//! - `evm` - Enable EVM chain support (default)
//! - `casper` - Enable Casper chain support (default)
//! - `full` - Enable all features

// Core modules (always available)
pub mod address_codec;
pub mod api;
pub mod contracts;
pub mod error;
pub mod hash;
pub mod orchestrator;
pub mod session;
pub mod types;
pub mod wallet;

// Chain-specific modules (feature-gated)
#[cfg(feature = "evm")]
pub mod evm;

#[cfg(feature = "casper")]
pub mod casper;

// Re-export commonly used items at the crate root
pub use contracts::{ChainContracts, ContractTable};
pub use error::{ApiError, ProviderError, TransferError, WalletError};
pub use orchestrator::{EstimateParams, TransferOrchestrator, TransferPhase};
pub use session::{shared_session, SessionState, SharedSession, TransferRoute, WalletSession};
pub use types::{
    BridgeInSignature, CancelSignature, ChainAddress, ChainDescriptor, ChainFamily,
    SignatureRequest, Token, TokenWrap, Transfer, TransferEstimate, TransferPage,
    TransferPagination, TransferStatus, TxPointer, TxSubmission,
};
pub use wallet::{install_url_for, Wallet, WalletService};
