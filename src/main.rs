//! Quorum Custody CLI Application
//!
//! A command-line interface for a quorum-controlled custody wallet.

use clap::{Parser, Subcommand};
use quorum_custody::api::{create_router, ApiState};
use quorum_custody::cli::{self, AppState};
use quorum_custody::storage::{Storage, StorageConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "custody")]
#[command(version = "0.1.0")]
#[command(about = "Quorum multi-signature custody wallet", long_about = None)]
struct Cli {
    /// Data directory for custody state
    #[arg(short, long, default_value = ".custody_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new custody wallet
    Init {
        /// Approvals required to release funds
        #[arg(short, long)]
        quorum: usize,

        /// Signer identity (repeat for each signer)
        #[arg(short, long = "signer", required = true)]
        signers: Vec<String>,

        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,

        /// Overwrite an existing wallet
        #[arg(long)]
        force: bool,
    },

    /// Generate a signer key pair
    Keygen,

    /// Credit native coins to an account
    Fund {
        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: u128,
    },

    /// Deposit funds into custody
    Deposit {
        #[command(subcommand)]
        action: DepositCommands,
    },

    /// Token operations
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Propose a transfer out of custody
    Propose {
        #[command(subcommand)]
        action: ProposeCommands,
    },

    /// Approve a pending transfer
    Approve {
        #[command(subcommand)]
        action: ApproveCommands,
    },

    /// Show the wallet or a transaction
    Show {
        /// Transaction id
        #[arg(short, long)]
        id: Option<u64>,
    },

    /// Show custody balances
    Balance,

    /// Show the event log
    Events,

    /// Export custody state to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import custody state from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum DepositCommands {
    /// Deposit native coins
    Native {
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        amount: u128,
    },
    /// Deposit tokens
    Asset {
        /// Token address
        #[arg(long)]
        asset: String,

        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        amount: u128,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Create a new token
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        symbol: String,

        #[arg(short, long, default_value = "18")]
        decimals: u8,

        /// Initial supply credited to the creator
        #[arg(long, default_value = "0")]
        supply: u128,

        #[arg(short, long)]
        creator: String,
    },
    /// Transfer tokens between accounts
    Transfer {
        #[arg(long)]
        token: String,

        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: u128,
    },
    /// Mint tokens (creator only)
    Mint {
        #[arg(long)]
        token: String,

        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: u128,
    },
    /// Show a token balance
    Balance {
        #[arg(long)]
        token: String,

        #[arg(long)]
        holder: String,
    },
    /// List all tokens
    List,
}

#[derive(Subcommand)]
enum ProposeCommands {
    /// Propose a native transfer
    Native {
        #[arg(short, long)]
        caller: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: u128,
    },
    /// Propose a token transfer
    Asset {
        #[arg(short, long)]
        caller: String,

        /// Token address
        #[arg(long)]
        asset: String,

        #[arg(short, long)]
        to: String,

        #[arg(short, long)]
        amount: u128,
    },
}

#[derive(Subcommand)]
enum ApproveCommands {
    /// Approve a native transfer
    Native {
        #[arg(short, long)]
        id: u64,

        #[arg(short, long)]
        caller: String,
    },
    /// Approve a token transfer
    Asset {
        #[arg(short, long)]
        id: u64,

        #[arg(short, long)]
        caller: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need saved state
    match &cli.command {
        Commands::Init {
            quorum,
            signers,
            label,
            force,
        } => {
            return cli::cmd_init(&cli.data_dir, *quorum, signers, label.clone(), *force);
        }
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Serve { port } => return run_server(&cli.data_dir, *port),
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Keygen | Commands::Serve { .. } => unreachable!(),
        Commands::Fund { to, amount } => {
            cli::cmd_fund(&mut state, &to, amount)?;
        }
        Commands::Deposit { action } => match action {
            DepositCommands::Native { from, amount } => {
                cli::cmd_deposit_native(&mut state, &from, amount)?;
            }
            DepositCommands::Asset {
                asset,
                from,
                amount,
            } => {
                cli::cmd_deposit_asset(&mut state, &asset, &from, amount)?;
            }
        },
        Commands::Token { action } => match action {
            TokenCommands::Create {
                name,
                symbol,
                decimals,
                supply,
                creator,
            } => {
                cli::cmd_token_create(&mut state, &name, &symbol, decimals, supply, &creator)?;
            }
            TokenCommands::Transfer {
                token,
                from,
                to,
                amount,
            } => {
                cli::cmd_token_transfer(&mut state, &token, &from, &to, amount)?;
            }
            TokenCommands::Mint {
                token,
                caller,
                to,
                amount,
            } => {
                cli::cmd_token_mint(&mut state, &token, &caller, &to, amount)?;
            }
            TokenCommands::Balance { token, holder } => {
                cli::cmd_token_balance(&state, &token, &holder)?;
            }
            TokenCommands::List => {
                cli::cmd_token_list(&state)?;
            }
        },
        Commands::Propose { action } => match action {
            ProposeCommands::Native { caller, to, amount } => {
                cli::cmd_propose_native(&mut state, &caller, &to, amount)?;
            }
            ProposeCommands::Asset {
                caller,
                asset,
                to,
                amount,
            } => {
                cli::cmd_propose_asset(&mut state, &caller, &asset, &to, amount)?;
            }
        },
        Commands::Approve { action } => match action {
            ApproveCommands::Native { id, caller } => {
                cli::cmd_approve_native(&mut state, id, &caller)?;
            }
            ApproveCommands::Asset { id, caller } => {
                cli::cmd_approve_asset(&mut state, id, &caller)?;
            }
        },
        Commands::Show { id } => {
            cli::cmd_show(&state, id)?;
        }
        Commands::Balance => {
            cli::cmd_balance(&state)?;
        }
        Commands::Events => {
            cli::cmd_events(&state)?;
        }
        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }
        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }
    }

    Ok(())
}

fn run_server(data_dir: &Path, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    let storage = Storage::new(storage_config)?;

    if !storage.exists() {
        return Err(format!(
            "No custody wallet in {:?}. Create one with: custody init",
            data_dir
        )
        .into());
    }

    // Held until the server has shut down and saved
    let _lock = storage.lock()?;

    println!("📂 Loading custody state...");
    let custody = storage.load()?;
    let state = ApiState::new(custody, storage);
    let shutdown_state = state.clone();
    let app = create_router(state);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let addr = format!("0.0.0.0:{}", port);
        println!("🚀 REST API server starting on http://localhost:{}", port);
        println!();
        println!("📖 Available endpoints:");
        println!("   GET  /health                                 - Health check");
        println!("   GET  /api/wallet                             - Wallet info");
        println!("   GET  /api/transactions                       - List transactions");
        println!("   GET  /api/transactions/{{id}}                  - Get transaction");
        println!("   POST /api/transactions/native                - Propose native transfer");
        println!("   POST /api/transactions/asset                 - Propose asset transfer");
        println!("   POST /api/transactions/native/{{id}}/approve   - Approve native transfer");
        println!("   POST /api/transactions/asset/{{id}}/approve    - Approve asset transfer");
        println!("   POST /api/deposits/native                    - Deposit native");
        println!("   POST /api/deposits/asset                     - Deposit asset");
        println!("   GET  /api/tokens                             - List tokens");
        println!("   GET  /api/events                             - Event log");
        println!();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::signal::ctrl_c().await.ok();
                println!("\n📴 Shutting down API server...");
                println!("💾 Saving data...");
                let custody = shutdown_state.custody.read().await;
                if let Err(e) = shutdown_state.storage.save(&custody) {
                    log::error!("Failed to save custody state: {}", e);
                }
            })
            .await?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
