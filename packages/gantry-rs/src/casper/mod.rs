//! Casper wallet support: signer abstraction, deploy serialization and the
//! bridge wallet adapter.

pub mod bytes;
pub mod deploy;
pub mod provider;
pub mod wallet;

pub use provider::{CasperSigner, LocalCasperSigner};
pub use wallet::{CasperWalletAdapter, CasperWalletConfig};
