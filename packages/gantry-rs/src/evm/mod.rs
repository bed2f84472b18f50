//! EVM wallet support: provider abstraction, contract bindings and the
//! bridge wallet adapter.

pub mod contracts;
pub mod provider;
pub mod wallet;

pub use provider::{EvmCall, EvmProvider, LocalEvmSigner};
pub use wallet::{EvmWalletAdapter, EvmWalletConfig};
