//! REST API handlers for custody operations

use crate::core::Address;
use crate::multisig::{ApprovalOutcome, CustodyManager, MultisigError, Transaction, WalletEvent};
use crate::storage::Storage;
use crate::token::Token;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
///
/// The write lock serializes every mutation of the custody state.
#[derive(Clone)]
pub struct ApiState {
    pub custody: Arc<RwLock<CustodyManager>>,
    pub storage: Arc<Storage>,
}

impl ApiState {
    pub fn new(custody: CustodyManager, storage: Storage) -> Self {
        Self {
            custody: Arc::new(RwLock::new(custody)),
            storage: Arc::new(storage),
        }
    }

    fn persist(&self, custody: &CustodyManager) {
        if let Err(e) = self.storage.save(custody) {
            log::error!("Failed to save custody state: {}", e);
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct WalletInfo {
    pub custody_address: Address,
    pub quorum: usize,
    pub signer_count: usize,
    pub signers: Vec<Address>,
    pub label: Option<String>,
    pub description: String,
    pub native_balance: String,
    pub transaction_count: u64,
    pub pending_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct TransactionInfo {
    pub id: u64,
    pub asset_kind: String,
    pub asset_id: Option<Address>,
    pub recipient: Address,
    pub amount: String,
    pub initiator: Address,
    pub approval_count: usize,
    pub approved_by: Vec<Address>,
    pub executed: bool,
    pub created_at: String,
    pub executed_at: Option<String>,
}

impl From<&Transaction> for TransactionInfo {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            asset_kind: tx.asset_kind().to_string(),
            asset_id: tx.asset.asset_id().cloned(),
            recipient: tx.recipient.clone(),
            amount: tx.amount.to_string(),
            initiator: tx.initiator.clone(),
            approval_count: tx.approval_count(),
            approved_by: tx.approved_by().to_vec(),
            executed: tx.is_executed(),
            created_at: tx.created_at.to_rfc3339(),
            executed_at: tx.executed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub id: u64,
    pub transaction: TransactionInfo,
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub executed: bool,
    pub approval_count: usize,
    pub quorum: usize,
    pub transaction: TransactionInfo,
}

#[derive(Debug, Serialize)]
pub struct HasApprovedResponse {
    pub id: u64,
    pub signer: Address,
    pub approved: bool,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub from: Address,
    pub amount: String,
    pub custody_balance: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: Address,
    pub balance: String,
}

#[derive(Debug, Serialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
    pub creator: Address,
    pub created_at: String,
    pub holder_count: usize,
    pub custody_balance: String,
}

impl TokenInfo {
    fn new(token: &Token, custody: &Address) -> Self {
        Self {
            address: token.address.clone(),
            name: token.name().to_string(),
            symbol: token.symbol().to_string(),
            decimals: token.decimals(),
            total_supply: token.total_supply().to_string(),
            creator: token.metadata.creator.clone(),
            created_at: token.metadata.created_at.to_rfc3339(),
            holder_count: token.holder_count(),
            custody_balance: token.balance_of(custody).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenBalanceResponse {
    pub token: Address,
    pub holder: Address,
    pub balance: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct NativeTransferRequest {
    pub caller: String,
    pub recipient: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct AssetTransferRequest {
    pub caller: String,
    pub asset: String,
    pub recipient: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub caller: String,
}

#[derive(Deserialize)]
pub struct NativeDepositRequest {
    pub from: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct AssetDepositRequest {
    pub asset: String,
    pub from: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct FundRequest {
    pub to: String,
    pub amount: String,
}

#[derive(Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_supply: String,
    pub creator: String,
}

#[derive(Deserialize)]
pub struct MintRequest {
    pub caller: String,
    pub to: String,
    pub amount: String,
}

// ============================================================================
// Error mapping
// ============================================================================

fn api_error(status: StatusCode, error: impl ToString) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.to_string(),
        }),
    )
}

fn multisig_status(e: &MultisigError) -> StatusCode {
    match e {
        MultisigError::InvalidSigner(_) => StatusCode::FORBIDDEN,
        MultisigError::TransactionNotFound(_) => StatusCode::NOT_FOUND,
        MultisigError::AlreadySigned { .. }
        | MultisigError::TransactionAlreadyCompleted(_)
        | MultisigError::AssetKindMismatch { .. } => StatusCode::CONFLICT,
        MultisigError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        MultisigError::InvalidQuorum { .. }
        | MultisigError::DuplicateSigner(_)
        | MultisigError::InvalidIdentity(_)
        | MultisigError::InvalidAmount => StatusCode::BAD_REQUEST,
    }
}

fn multisig_error(e: MultisigError) -> (StatusCode, Json<ApiError>) {
    api_error(multisig_status(&e), e)
}

fn parse_amount(amount: &str) -> Result<u128, (StatusCode, Json<ApiError>)> {
    amount
        .trim()
        .parse()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid amount"))
}

fn transaction_info(
    custody: &CustodyManager,
    id: u64,
) -> Result<TransactionInfo, (StatusCode, Json<ApiError>)> {
    custody
        .wallet()
        .transaction(id)
        .map(TransactionInfo::from)
        .map_err(multisig_error)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/wallet - Wallet configuration and balances
pub async fn get_wallet(State(state): State<ApiState>) -> Json<WalletInfo> {
    let custody = state.custody.read().await;
    let wallet = custody.wallet();

    Json(WalletInfo {
        custody_address: wallet.custody_address().clone(),
        quorum: wallet.quorum(),
        signer_count: wallet.signers().len(),
        signers: wallet.signers().to_vec(),
        label: wallet.registry().config().label.clone(),
        description: wallet.registry().description(),
        native_balance: custody.native_custody_balance().to_string(),
        transaction_count: wallet.transaction_count(),
        pending_count: wallet.pending().len(),
    })
}

/// GET /api/transactions - List all transactions
pub async fn list_transactions(State(state): State<ApiState>) -> Json<Vec<TransactionInfo>> {
    let custody = state.custody.read().await;
    Json(
        custody
            .wallet()
            .transactions()
            .map(TransactionInfo::from)
            .collect(),
    )
}

/// GET /api/transactions/{id} - Get a transaction
pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> ApiResult<TransactionInfo> {
    let custody = state.custody.read().await;
    transaction_info(&custody, id).map(Json)
}

/// GET /api/transactions/{id}/approvals/{signer} - Has a signer approved
pub async fn has_approved(
    State(state): State<ApiState>,
    Path((id, signer)): Path<(u64, String)>,
) -> Json<HasApprovedResponse> {
    let custody = state.custody.read().await;
    let signer = Address::new(signer);

    Json(HasApprovedResponse {
        id,
        approved: custody.wallet().has_approved(id, &signer),
        signer,
    })
}

/// POST /api/transactions/native - Propose a native transfer
pub async fn initiate_native(
    State(state): State<ApiState>,
    Json(req): Json<NativeTransferRequest>,
) -> ApiResult<InitiateResponse> {
    let amount = parse_amount(&req.amount)?;
    let mut custody = state.custody.write().await;

    let id = custody
        .initiate_native_transfer(
            &Address::new(&req.caller),
            &Address::new(&req.recipient),
            amount,
        )
        .map_err(multisig_error)?;
    state.persist(&custody);

    Ok(Json(InitiateResponse {
        id,
        transaction: transaction_info(&custody, id)?,
    }))
}

/// POST /api/transactions/asset - Propose an asset transfer
pub async fn initiate_asset(
    State(state): State<ApiState>,
    Json(req): Json<AssetTransferRequest>,
) -> ApiResult<InitiateResponse> {
    let amount = parse_amount(&req.amount)?;
    let mut custody = state.custody.write().await;

    let id = custody
        .initiate_asset_transfer(
            &Address::new(&req.caller),
            &Address::new(&req.asset),
            &Address::new(&req.recipient),
            amount,
        )
        .map_err(multisig_error)?;
    state.persist(&custody);

    Ok(Json(InitiateResponse {
        id,
        transaction: transaction_info(&custody, id)?,
    }))
}

fn approval_response(
    custody: &CustodyManager,
    id: u64,
    outcome: ApprovalOutcome,
) -> ApiResult<ApprovalResponse> {
    let transaction = transaction_info(custody, id)?;
    let quorum = custody.wallet().quorum();

    Ok(Json(ApprovalResponse {
        executed: matches!(outcome, ApprovalOutcome::Executed(_)),
        approval_count: transaction.approval_count,
        quorum,
        transaction,
    }))
}

/// POST /api/transactions/native/{id}/approve - Approve a native transfer
pub async fn approve_native(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<ApprovalResponse> {
    let mut custody = state.custody.write().await;

    let outcome = custody
        .approve_native_transfer(id, &Address::new(&req.caller))
        .map_err(multisig_error)?;
    state.persist(&custody);

    approval_response(&custody, id, outcome)
}

/// POST /api/transactions/asset/{id}/approve - Approve an asset transfer
pub async fn approve_asset(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<ApprovalResponse> {
    let mut custody = state.custody.write().await;

    let outcome = custody
        .approve_asset_transfer(id, &Address::new(&req.caller))
        .map_err(multisig_error)?;
    state.persist(&custody);

    approval_response(&custody, id, outcome)
}

/// POST /api/deposits/native - Move native funds into custody
pub async fn deposit_native(
    State(state): State<ApiState>,
    Json(req): Json<NativeDepositRequest>,
) -> ApiResult<DepositResponse> {
    let amount = parse_amount(&req.amount)?;
    let from = Address::new(&req.from);
    let mut custody = state.custody.write().await;

    custody
        .deposit_native(&from, amount)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    state.persist(&custody);

    Ok(Json(DepositResponse {
        from,
        amount: amount.to_string(),
        custody_balance: custody.native_custody_balance().to_string(),
    }))
}

/// POST /api/deposits/asset - Move asset funds into custody
pub async fn deposit_asset(
    State(state): State<ApiState>,
    Json(req): Json<AssetDepositRequest>,
) -> ApiResult<DepositResponse> {
    let amount = parse_amount(&req.amount)?;
    let asset = Address::new(&req.asset);
    let from = Address::new(&req.from);
    let mut custody = state.custody.write().await;

    custody
        .deposit_asset(&asset, &from, amount)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    state.persist(&custody);

    Ok(Json(DepositResponse {
        from,
        amount: amount.to_string(),
        custody_balance: custody.asset_custody_balance(&asset).to_string(),
    }))
}

/// POST /api/fund - Credit native funds to an account
pub async fn fund(
    State(state): State<ApiState>,
    Json(req): Json<FundRequest>,
) -> ApiResult<BalanceResponse> {
    let amount = parse_amount(&req.amount)?;
    let to = Address::new(&req.to);
    let mut custody = state.custody.write().await;

    let balance = custody
        .native_mut()
        .credit(&to, amount)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    state.persist(&custody);

    Ok(Json(BalanceResponse {
        address: to,
        balance: balance.to_string(),
    }))
}

/// GET /api/tokens - List all tokens
pub async fn list_tokens(State(state): State<ApiState>) -> Json<Vec<TokenInfo>> {
    let custody = state.custody.read().await;
    let vault = custody.custody_address();

    Json(
        custody
            .tokens()
            .list()
            .into_iter()
            .map(|t| TokenInfo::new(t, vault))
            .collect(),
    )
}

/// POST /api/tokens - Create a new token
pub async fn create_token(
    State(state): State<ApiState>,
    Json(req): Json<CreateTokenRequest>,
) -> ApiResult<TokenInfo> {
    let initial_supply = parse_amount(&req.initial_supply)?;
    let mut custody = state.custody.write().await;

    let token = custody
        .tokens_mut()
        .create_token(
            req.name,
            req.symbol,
            req.decimals,
            initial_supply,
            &Address::new(&req.creator),
        )
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Failed to create token: {}", e)))?;
    state.persist(&custody);

    Ok(Json(TokenInfo::new(&token, custody.custody_address())))
}

/// POST /api/tokens/{address}/mint - Mint tokens (creator only)
pub async fn mint_tokens(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    Json(req): Json<MintRequest>,
) -> ApiResult<TokenBalanceResponse> {
    let amount = parse_amount(&req.amount)?;
    let token = Address::new(address);
    let to = Address::new(&req.to);
    let mut custody = state.custody.write().await;

    custody
        .tokens_mut()
        .mint(&token, &Address::new(&req.caller), &to, amount)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    state.persist(&custody);

    let balance = custody
        .tokens()
        .balance_of(&token, &to)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e))?;

    Ok(Json(TokenBalanceResponse {
        token,
        holder: to,
        balance: balance.to_string(),
    }))
}

/// GET /api/tokens/{address}/balance/{holder} - Token balance
pub async fn get_token_balance(
    State(state): State<ApiState>,
    Path((address, holder)): Path<(String, String)>,
) -> ApiResult<TokenBalanceResponse> {
    let custody = state.custody.read().await;
    let token = Address::new(address);
    let holder = Address::new(holder);

    let balance = custody
        .tokens()
        .balance_of(&token, &holder)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e))?;

    Ok(Json(TokenBalanceResponse {
        token,
        holder,
        balance: balance.to_string(),
    }))
}

/// GET /api/events - Wallet event log
pub async fn list_events(State(state): State<ApiState>) -> Json<Vec<WalletEvent>> {
    let custody = state.custody.read().await;
    Json(custody.wallet().events().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::{WalletConfig, WalletEventKind};
    use crate::storage::StorageConfig;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    /// 2-of-3 wallet holding 100 native coins
    fn create_test_state(dir: &std::path::Path) -> ApiState {
        let signers = vec![addr("alice"), addr("bob"), addr("carol")];
        let mut custody = CustodyManager::new(WalletConfig::new(2, signers, None)).unwrap();
        custody.native_mut().credit(&addr("funder"), 100).unwrap();
        custody.deposit_native(&addr("funder"), 100).unwrap();

        let storage = Storage::new(StorageConfig {
            data_dir: dir.to_path_buf(),
            ..Default::default()
        })
        .unwrap();

        ApiState::new(custody, storage)
    }

    fn native_request(caller: &str, amount: &str) -> Json<NativeTransferRequest> {
        Json(NativeTransferRequest {
            caller: caller.to_string(),
            recipient: "dave".to_string(),
            amount: amount.to_string(),
        })
    }

    fn approve_request(caller: &str) -> Json<ApproveRequest> {
        Json(ApproveRequest {
            caller: caller.to_string(),
        })
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            multisig_status(&MultisigError::InvalidSigner(addr("x"))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            multisig_status(&MultisigError::TransactionNotFound(9)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            multisig_status(&MultisigError::TransactionAlreadyCompleted(1)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            multisig_status(&MultisigError::InsufficientFunds {
                available: 0,
                required: 1
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            multisig_status(&MultisigError::InvalidAmount),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_propose_and_approve_native() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = create_test_state(temp_dir.path());

        let Json(created) = initiate_native(State(state.clone()), native_request("alice", "60"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.transaction.approval_count, 1);
        assert!(!created.transaction.executed);

        let Json(approved) = approve_native(State(state.clone()), Path(1), approve_request("bob"))
            .await
            .unwrap();
        assert!(approved.executed);
        assert_eq!(approved.approval_count, 2);
        assert_eq!(approved.quorum, 2);

        let Json(wallet) = get_wallet(State(state.clone())).await;
        assert_eq!(wallet.native_balance, "40");
        assert_eq!(wallet.pending_count, 0);

        // Every mutation was persisted
        assert!(state.storage.exists());
        let saved = state.storage.load().unwrap();
        assert_eq!(saved.native().balance_of(&addr("dave")), 60);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = create_test_state(temp_dir.path());

        let (status, _) = initiate_native(State(state.clone()), native_request("mallory", "1"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = initiate_native(State(state.clone()), native_request("alice", "abc"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = initiate_native(State(state.clone()), native_request("alice", "500"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = approve_native(State(state.clone()), Path(7), approve_request("bob"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let Json(created) = initiate_native(State(state.clone()), native_request("alice", "10"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        let (status, Json(body)) =
            approve_asset(State(state.clone()), Path(1), approve_request("bob"))
                .await
                .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.error.contains("expected external-asset"));

        let (status, _) = approve_native(State(state.clone()), Path(1), approve_request("alice"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_asset_flow() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = create_test_state(temp_dir.path());

        let Json(token) = create_token(
            State(state.clone()),
            Json(CreateTokenRequest {
                name: "Test Token A".to_string(),
                symbol: "TTA".to_string(),
                decimals: 18,
                initial_supply: "10000".to_string(),
                creator: "issuer".to_string(),
            }),
        )
        .await
        .unwrap();

        let Json(deposit) = deposit_asset(
            State(state.clone()),
            Json(AssetDepositRequest {
                asset: token.address.to_string(),
                from: "issuer".to_string(),
                amount: "10000".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(deposit.custody_balance, "10000");

        let Json(created) = initiate_asset(
            State(state.clone()),
            Json(AssetTransferRequest {
                caller: "carol".to_string(),
                asset: token.address.to_string(),
                recipient: "dave".to_string(),
                amount: "2500".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(created.transaction.asset_kind, "external-asset");

        let Json(pending) = has_approved(
            State(state.clone()),
            Path((created.id, "alice".to_string())),
        )
        .await;
        assert!(!pending.approved);

        let Json(approved) =
            approve_asset(State(state.clone()), Path(created.id), approve_request("alice"))
                .await
                .unwrap();
        assert!(approved.executed);

        let Json(balance) = get_token_balance(
            State(state.clone()),
            Path((token.address.to_string(), "dave".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(balance.balance, "2500");

        let Json(tokens) = list_tokens(State(state.clone())).await;
        assert_eq!(tokens[0].custody_balance, "7500");

        let Json(events) = list_events(State(state)).await;
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_token_balance() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = create_test_state(temp_dir.path());

        let (status, _) = get_token_balance(
            State(state),
            Path(("0xmissing".to_string(), "dave".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_approvals_execute_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = create_test_state(temp_dir.path());

        initiate_native(State(state.clone()), native_request("alice", "60"))
            .await
            .unwrap();

        let handles: Vec<_> = ["bob", "carol"]
            .into_iter()
            .map(|caller| {
                let state = state.clone();
                tokio::spawn(async move {
                    approve_native(State(state), Path(1), approve_request(caller)).await
                })
            })
            .collect();

        let mut executed = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(Json(resp)) if resp.executed => executed += 1,
                Err((status, _)) if status == StatusCode::CONFLICT => conflicts += 1,
                other => panic!("unexpected approval result: {:?}", other),
            }
        }
        assert_eq!(executed, 1);
        assert_eq!(conflicts, 1);

        let custody = state.custody.read().await;
        let tx = custody.wallet().transaction(1).unwrap();
        assert!(tx.is_executed());
        assert_eq!(tx.approval_count(), 2);
        assert_eq!(custody.native().balance_of(&addr("dave")), 60);
        assert_eq!(custody.native_custody_balance(), 40);

        let executions = custody
            .wallet()
            .events()
            .iter()
            .filter(|e| matches!(e.kind, WalletEventKind::TransactionExecuted { .. }))
            .count();
        assert_eq!(executions, 1);

        let saved = state.storage.load().unwrap();
        assert!(saved.wallet().transaction(1).unwrap().is_executed());
    }
}
