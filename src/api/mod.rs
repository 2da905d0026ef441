//! REST API module
//!
//! HTTP access to the custody wallet. Amounts travel as decimal strings.
//!
//! # Endpoints
//!
//! ## Wallet
//! - `GET /api/wallet` - Configuration, custody address and native balance
//! - `GET /api/events` - Event log
//!
//! ## Transactions
//! - `GET /api/transactions` - List transactions
//! - `GET /api/transactions/{id}` - Get transaction
//! - `GET /api/transactions/{id}/approvals/{signer}` - Has a signer approved
//! - `POST /api/transactions/native` - Propose a native transfer
//! - `POST /api/transactions/asset` - Propose an asset transfer
//! - `POST /api/transactions/native/{id}/approve` - Approve a native transfer
//! - `POST /api/transactions/asset/{id}/approve` - Approve an asset transfer
//!
//! ## Funding
//! - `POST /api/deposits/native`, `POST /api/deposits/asset` - Deposit into custody
//! - `POST /api/fund` - Credit native coins to an account
//!
//! ## Tokens
//! - `GET /api/tokens`, `POST /api/tokens` - List / create tokens
//! - `POST /api/tokens/{address}/mint` - Mint (creator only)
//! - `GET /api/tokens/{address}/balance/{holder}` - Token balance

pub mod handlers;
pub mod routes;

pub use handlers::ApiState;
pub use routes::create_router;
