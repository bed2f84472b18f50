//! Gantry console.
//!
//! Headless driver for the bridge client: lists networks and tokens,
//! estimates fees, runs transfers end to end, cancels waiting transfers
//! and pages through history, using locally-configured signing keys
//! instead of a browser wallet.

mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;

use gantry_rs::api::networks::{BridgeDirectoryClient, DirectoryApi};
use gantry_rs::api::relay::DeployRelayClient;
use gantry_rs::api::transfers::TransferProtocolClient;
use gantry_rs::casper::{CasperWalletAdapter, CasperWalletConfig, LocalCasperSigner};
use gantry_rs::evm::{EvmWalletAdapter, EvmWalletConfig, LocalEvmSigner};
use gantry_rs::{
    shared_session, ChainFamily, EstimateParams, TransferOrchestrator, WalletService,
};

use config::Config;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Headless console for the Gantry bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the chains connected to the bridge
    Networks,

    /// List the tokens supported on a chain
    Tokens {
        /// Gateway id of the chain
        chain_id: u32,
    },

    /// Estimate the fee for a transfer
    Estimate {
        sender_chain_id: u32,
        recipient_chain_id: u32,
        /// Recipient address on the destination chain
        recipient: String,
        /// Token amount in display units
        amount: String,
    },

    /// Run a transfer end to end: estimate, obtain the bridge-in
    /// signature and submit it through the sender wallet
    Transfer {
        sender_chain_id: u32,
        recipient_chain_id: u32,
        recipient: String,
        amount: String,
    },

    /// Cancel a waiting transfer on its source chain
    Cancel {
        transfer_id: u64,
        /// Gateway id of the transfer's source chain
        chain_id: u32,

        /// Wallet family the transfer was sent from
        #[arg(long, value_enum, default_value_t = Family::Evm)]
        family: Family,
    },

    /// Show the wallet's transfer history
    History {
        /// Gateway id of the chain to filter by
        chain_id: u32,

        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, value_enum, default_value_t = Family::Evm)]
        family: Family,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Family {
    Evm,
    Casper,
}

impl From<Family> for ChainFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::Evm => ChainFamily::Evm,
            Family::Casper => ChainFamily::Casper,
        }
    }
}

struct Console {
    directory: BridgeDirectoryClient,
    wallets: Arc<WalletService>,
    orchestrator: TransferOrchestrator,
}

impl Console {
    fn build(config: &Config) -> Result<Self> {
        let session = shared_session();
        let contracts = Arc::new(config.contract_table());

        let mut wallets = WalletService::new(session.clone());
        if let Some(private_key) = &config.evm_private_key {
            let signer =
                LocalEvmSigner::from_private_key_hex(private_key, config.evm_endpoints())?;
            let adapter = EvmWalletAdapter::new(
                EvmWalletConfig {
                    provider_name: "local".to_string(),
                    gas_limit: config.evm_gas_limit,
                    ..EvmWalletConfig::default()
                },
                contracts.clone(),
                session.clone(),
            )
            .with_provider(Arc::new(signer));
            wallets.register(ChainFamily::Evm, Arc::new(adapter));
            tracing::info!("local EVM wallet enabled");
        }
        if let Some(secret_key) = &config.casper_secret_key {
            let relay = config.relay_address.as_ref().ok_or_else(|| {
                eyre!("GANTRY_RELAY_ADDRESS is required when CASPER_SECRET_KEY is set")
            })?;
            let signer =
                LocalCasperSigner::from_secret_key_hex(config.casper_key_algorithm, secret_key)?;
            let adapter = CasperWalletAdapter::new(
                Arc::new(signer),
                DeployRelayClient::new(relay)?,
                contracts.clone(),
                session.clone(),
                CasperWalletConfig::new(&config.casper_node_address),
            );
            wallets.register(ChainFamily::Casper, Arc::new(adapter));
            tracing::info!("local Casper wallet enabled");
        }
        let wallets = Arc::new(wallets);

        let directory = BridgeDirectoryClient::new(&config.gateway_address)?;
        let transfers = TransferProtocolClient::new(&config.gateway_address)?;
        let orchestrator = TransferOrchestrator::new(
            Arc::new(directory.clone()),
            Arc::new(transfers),
            wallets.clone(),
        );

        Ok(Self {
            directory,
            wallets,
            orchestrator,
        })
    }

    /// Family of a chain the gateway reports as connected.
    async fn family_of(&self, chain_id: u32) -> Result<ChainFamily> {
        let chains = self.orchestrator.chains().await?;
        let chain = chains
            .iter()
            .find(|chain| chain.id == chain_id)
            .ok_or_else(|| eyre!("chain {chain_id} is not connected to the bridge"))?;
        Ok(chain.family)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load()?;
    tracing::debug!(?config, "configuration loaded");
    let console = Console::build(&config)?;

    match cli.command {
        Commands::Networks => {
            let chains = console.directory.connected_chains().await?;
            println!("{}", serde_json::to_string_pretty(&chains)?);
        }

        Commands::Tokens { chain_id } => {
            let tokens = console.directory.supported_tokens(chain_id).await?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }

        Commands::Estimate {
            sender_chain_id,
            recipient_chain_id,
            recipient,
            amount,
        } => {
            let family = console.family_of(sender_chain_id).await?;
            console.wallets.connect(family).await?;

            let estimate = console
                .orchestrator
                .estimate(&EstimateParams {
                    sender_chain_id,
                    recipient_chain_id,
                    recipient_address: recipient,
                    amount,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&estimate)?);
        }

        Commands::Transfer {
            sender_chain_id,
            recipient_chain_id,
            recipient,
            amount,
        } => {
            let family = console.family_of(sender_chain_id).await?;
            console.wallets.connect(family).await?;

            let submission = console
                .orchestrator
                .transfer(&EstimateParams {
                    sender_chain_id,
                    recipient_chain_id,
                    recipient_address: recipient,
                    amount,
                })
                .await?;
            tracing::info!(hash = %submission.hash, "transfer submitted");
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }

        Commands::Cancel {
            transfer_id,
            chain_id,
            family,
        } => {
            let family = ChainFamily::from(family);
            console.wallets.connect(family).await?;
            console.wallets.authenticate(family).await?;

            let submission = console
                .orchestrator
                .cancel(family, transfer_id, chain_id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }

        Commands::History {
            chain_id,
            page,
            family,
        } => {
            let family = ChainFamily::from(family);
            console.wallets.connect(family).await?;
            console.wallets.authenticate(family).await?;

            let history = console.orchestrator.history(family, chain_id, page).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }

    Ok(())
}
