//! CLI commands for the custody wallet
//!
//! Every command loads the saved state, applies one operation and saves it
//! back. The data directory stays locked while the state is open, so a
//! command fails instead of racing a running `serve` on the same directory.

use crate::core::Address;
use crate::crypto::KeyPair;
use crate::multisig::{ApprovalOutcome, CustodyManager, Transaction, WalletConfig};
use crate::storage::{Storage, StorageConfig, StorageLock};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub custody: CustodyManager,
    pub storage: Storage,
    pub data_dir: PathBuf,
    _lock: StorageLock,
}

impl AppState {
    /// Load the saved custody state
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "No custody wallet in {:?}. Create one with: custody init",
                data_dir
            )
            .into());
        }

        let lock = storage.lock()?;
        let custody = storage.load()?;

        Ok(Self {
            custody,
            storage,
            data_dir,
            _lock: lock,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.custody)?;
        Ok(())
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Create a new custody wallet
pub fn cmd_init(
    data_dir: &Path,
    quorum: usize,
    signers: &[String],
    label: Option<String>,
    force: bool,
) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Custody wallet already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let signers: Vec<Address> = signers.iter().map(Address::new).collect();
    let custody = CustodyManager::new(WalletConfig::new(quorum, signers, label))?;
    let _lock = storage.lock()?;
    storage.save(&custody)?;

    let wallet = custody.wallet();
    println!("✅ Custody wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🔐 Policy: {}", wallet.registry().description());
    println!("   📍 Custody address: {}", wallet.custody_address());
    for signer in wallet.signers() {
        println!("   └─ Signer: {}", signer);
    }

    Ok(())
}

/// Generate a signer key pair
pub fn cmd_keygen() -> CliResult<()> {
    let keypair = KeyPair::generate();

    println!("🔑 New signer key");
    println!("   📍 Identity: {}", keypair.address());
    println!("   Public key: {}", keypair.public_key_hex());
    println!("   Private key: {}", keypair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: Store the private key somewhere safe.");

    Ok(())
}

/// Credit native coins to an account
pub fn cmd_fund(state: &mut AppState, to: &str, amount: u128) -> CliResult<()> {
    let to = Address::new(to);
    let balance = state.custody.native_mut().credit(&to, amount)?;
    state.save()?;

    println!("💰 Credited {} to {}", amount, to);
    println!("   New balance: {}", balance);
    Ok(())
}

/// Deposit native coins into custody
pub fn cmd_deposit_native(state: &mut AppState, from: &str, amount: u128) -> CliResult<()> {
    state.custody.deposit_native(&Address::new(from), amount)?;
    state.save()?;

    println!("📥 Deposited {} native into custody", amount);
    println!(
        "   Custody balance: {}",
        state.custody.native_custody_balance()
    );
    Ok(())
}

/// Deposit tokens into custody
pub fn cmd_deposit_asset(
    state: &mut AppState,
    asset: &str,
    from: &str,
    amount: u128,
) -> CliResult<()> {
    let asset = Address::new(asset);
    state
        .custody
        .deposit_asset(&asset, &Address::new(from), amount)?;
    state.save()?;

    println!("📥 Deposited {} of {} into custody", amount, asset);
    println!(
        "   Custody balance: {}",
        state.custody.asset_custody_balance(&asset)
    );
    Ok(())
}

/// Create a token
pub fn cmd_token_create(
    state: &mut AppState,
    name: &str,
    symbol: &str,
    decimals: u8,
    supply: u128,
    creator: &str,
) -> CliResult<()> {
    let token = state.custody.tokens_mut().create_token(
        name.to_string(),
        symbol.to_string(),
        decimals,
        supply,
        &Address::new(creator),
    )?;
    state.save()?;

    println!("🪙 Token created!");
    println!("   📍 Address: {}", token.address);
    println!("   Name: {} ({})", token.name(), token.symbol());
    println!("   Supply: {}", token.total_supply());
    Ok(())
}

/// Transfer tokens between accounts
pub fn cmd_token_transfer(
    state: &mut AppState,
    token: &str,
    from: &str,
    to: &str,
    amount: u128,
) -> CliResult<()> {
    state.custody.tokens_mut().transfer(
        &Address::new(token),
        &Address::new(from),
        &Address::new(to),
        amount,
    )?;
    state.save()?;

    println!("📤 Transferred {} of {} from {} to {}", amount, token, from, to);
    Ok(())
}

/// Mint tokens (creator only)
pub fn cmd_token_mint(
    state: &mut AppState,
    token: &str,
    caller: &str,
    to: &str,
    amount: u128,
) -> CliResult<()> {
    state.custody.tokens_mut().mint(
        &Address::new(token),
        &Address::new(caller),
        &Address::new(to),
        amount,
    )?;
    state.save()?;

    println!("🪙 Minted {} of {} to {}", amount, token, to);
    Ok(())
}

/// Show a token balance
pub fn cmd_token_balance(state: &AppState, token: &str, holder: &str) -> CliResult<()> {
    let balance = state
        .custody
        .tokens()
        .balance_of(&Address::new(token), &Address::new(holder))?;

    println!("💰 {} holds {} of {}", holder, balance, token);
    Ok(())
}

/// List tokens
pub fn cmd_token_list(state: &AppState) -> CliResult<()> {
    let tokens = state.custody.tokens().list();

    if tokens.is_empty() {
        println!("📭 No tokens found. Create one with: custody token create");
        return Ok(());
    }

    println!("📋 Tokens:");
    for token in tokens {
        println!(
            "   {} {} ({}) - supply {}, {} holders",
            token.address,
            token.name(),
            token.symbol(),
            token.total_supply(),
            token.holder_count()
        );
    }
    Ok(())
}

/// Propose a native transfer out of custody
pub fn cmd_propose_native(
    state: &mut AppState,
    caller: &str,
    to: &str,
    amount: u128,
) -> CliResult<()> {
    let id = state.custody.initiate_native_transfer(
        &Address::new(caller),
        &Address::new(to),
        amount,
    )?;
    state.save()?;

    print_proposal(state, id)
}

/// Propose a token transfer out of custody
pub fn cmd_propose_asset(
    state: &mut AppState,
    caller: &str,
    asset: &str,
    to: &str,
    amount: u128,
) -> CliResult<()> {
    let id = state.custody.initiate_asset_transfer(
        &Address::new(caller),
        &Address::new(asset),
        &Address::new(to),
        amount,
    )?;
    state.save()?;

    print_proposal(state, id)
}

fn print_proposal(state: &AppState, id: u64) -> CliResult<()> {
    let tx = state.custody.wallet().transaction(id)?;

    println!("📝 Transaction {} proposed", id);
    print_transaction(tx, state.custody.wallet().quorum());
    Ok(())
}

/// Approve a native transfer
pub fn cmd_approve_native(state: &mut AppState, id: u64, caller: &str) -> CliResult<()> {
    let outcome = state
        .custody
        .approve_native_transfer(id, &Address::new(caller))?;
    state.save()?;

    print_outcome(id, caller, &outcome);
    Ok(())
}

/// Approve a token transfer
pub fn cmd_approve_asset(state: &mut AppState, id: u64, caller: &str) -> CliResult<()> {
    let outcome = state
        .custody
        .approve_asset_transfer(id, &Address::new(caller))?;
    state.save()?;

    print_outcome(id, caller, &outcome);
    Ok(())
}

fn print_outcome(id: u64, caller: &str, outcome: &ApprovalOutcome) {
    match outcome {
        ApprovalOutcome::Pending {
            approval_count,
            quorum,
        } => {
            println!("✍️  {} approved transaction {}", caller, id);
            println!("   Approvals: {}/{}", approval_count, quorum);
        }
        ApprovalOutcome::Executed(receipt) => {
            println!("✅ Transaction {} executed!", id);
            println!(
                "   Released {} {} to {}",
                receipt.amount, receipt.asset, receipt.recipient
            );
        }
    }
}

fn print_transaction(tx: &Transaction, quorum: usize) {
    println!("   ├─ Asset: {}", tx.asset);
    println!("   ├─ Recipient: {}", tx.recipient);
    println!("   ├─ Amount: {}", tx.amount);
    println!("   ├─ Initiator: {}", tx.initiator);
    println!("   ├─ Approvals: {}/{}", tx.approval_count(), quorum);
    println!(
        "   └─ Status: {}",
        if tx.is_executed() { "executed" } else { "pending" }
    );
}

/// Show the wallet, or one transaction
pub fn cmd_show(state: &AppState, id: Option<u64>) -> CliResult<()> {
    let wallet = state.custody.wallet();

    if let Some(id) = id {
        let tx = wallet.transaction(id)?;
        println!("📄 Transaction {}", id);
        print_transaction(tx, wallet.quorum());
        for signer in tx.approved_by() {
            println!("   ✍️  {}", signer);
        }
        return Ok(());
    }

    println!("🔐 Custody wallet");
    if let Some(label) = &wallet.registry().config().label {
        println!("   🏷️  Label: {}", label);
    }
    println!("   ├─ Address: {}", wallet.custody_address());
    println!("   ├─ Policy: {}", wallet.registry().description());
    println!("   └─ Transactions: {}", wallet.transaction_count());

    let pending = wallet.pending();
    if !pending.is_empty() {
        println!("\n   Pending:");
        for tx in pending {
            println!(
                "   #{} | {} {} to {} | {}/{}",
                tx.id,
                tx.amount,
                tx.asset,
                tx.recipient,
                tx.approval_count(),
                wallet.quorum()
            );
        }
    }
    Ok(())
}

/// Show custody balances
pub fn cmd_balance(state: &AppState) -> CliResult<()> {
    let custody_address = state.custody.custody_address();

    println!("💰 Custody balances for {}", custody_address);
    println!("   Native: {}", state.custody.native_custody_balance());
    for (token, balance) in state.custody.tokens().tokens_for_holder(custody_address) {
        println!("   {} ({}): {}", token.symbol(), token.address, balance);
    }
    Ok(())
}

/// Print the event log
pub fn cmd_events(state: &AppState) -> CliResult<()> {
    let events = state.custody.wallet().events();

    println!("📜 {} events", events.len());
    for event in events {
        println!(
            "   {} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            serde_json::to_string(&event.kind)?
        );
    }
    Ok(())
}

/// Export custody state to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.custody, path)?;
    println!("📦 Custody state exported to {:?}", path);
    Ok(())
}

/// Import custody state from file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    state.custody = crate::storage::load_from_file(path)?;
    state.save()?;

    println!("📥 Custody state imported from {:?}", path);
    println!(
        "   Transactions: {}",
        state.custody.wallet().transaction_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signers() -> Vec<String> {
        vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
    }

    #[test]
    fn test_state_requires_init() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::new(temp_dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_init_rejects_bad_quorum() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(cmd_init(temp_dir.path(), 4, &signers(), None, false).is_err());
        assert!(AppState::new(temp_dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_native_workflow_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        cmd_init(&data_dir, 2, &signers(), Some("ops".into()), false).unwrap();

        {
            let mut state = AppState::new(data_dir.clone()).unwrap();
            cmd_fund(&mut state, "funder", 500).unwrap();
            cmd_deposit_native(&mut state, "funder", 500).unwrap();
            cmd_propose_native(&mut state, "alice", "dave", 200).unwrap();
        }

        // Each command works against freshly loaded state
        {
            let mut state = AppState::new(data_dir.clone()).unwrap();
            assert!(cmd_approve_native(&mut state, 1, "alice").is_err());
            cmd_approve_native(&mut state, 1, "bob").unwrap();
        }

        let state = AppState::new(data_dir).unwrap();
        assert_eq!(state.custody.native_custody_balance(), 300);
        assert_eq!(state.custody.native().balance_of(&Address::new("dave")), 200);
        cmd_show(&state, Some(1)).unwrap();
        cmd_balance(&state).unwrap();
    }

    #[test]
    fn test_reinit_requires_force() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        cmd_init(&data_dir, 2, &signers(), None, false).unwrap();

        let mut state = AppState::new(data_dir.clone()).unwrap();
        cmd_fund(&mut state, "funder", 5).unwrap();
        drop(state);

        cmd_init(&data_dir, 3, &signers(), None, false).unwrap();
        assert_eq!(AppState::new(data_dir.clone()).unwrap().custody.wallet().quorum(), 2);

        cmd_init(&data_dir, 3, &signers(), None, true).unwrap();
        let state = AppState::new(data_dir).unwrap();
        assert_eq!(state.custody.wallet().quorum(), 3);
        assert_eq!(state.custody.native().total_supply(), 0);
    }

    #[test]
    fn test_export_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        let export = temp_dir.path().join("export.json");

        cmd_init(&first, 2, &signers(), None, false).unwrap();
        cmd_init(&second, 1, &signers(), None, false).unwrap();

        let mut state = AppState::new(first).unwrap();
        cmd_fund(&mut state, "funder", 42).unwrap();
        cmd_export(&state, &export).unwrap();

        let mut other = AppState::new(second.clone()).unwrap();
        cmd_import(&mut other, &export).unwrap();
        drop(other);

        let reloaded = AppState::new(second).unwrap();
        assert_eq!(reloaded.custody.wallet().quorum(), 2);
        assert_eq!(reloaded.custody.native().total_supply(), 42);
    }

    #[test]
    fn test_state_locks_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().to_path_buf();
        cmd_init(&data_dir, 2, &signers(), None, false).unwrap();

        let mut state = AppState::new(data_dir.clone()).unwrap();

        // A second writer is refused while the first holds the directory
        assert!(AppState::new(data_dir.clone()).is_err());
        assert!(cmd_init(&data_dir, 3, &signers(), None, true).is_err());

        cmd_fund(&mut state, "funder", 7).unwrap();
        drop(state);

        let state = AppState::new(data_dir).unwrap();
        assert_eq!(state.custody.native().total_supply(), 7);
        assert_eq!(state.custody.wallet().quorum(), 2);
    }
}
