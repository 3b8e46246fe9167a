//! Simulated crypto vault: casino outcome engine, wallet ledger, passive
//! mining yield and a drifting price board.

pub mod config;
pub mod error;
pub mod games;
pub mod ledger;
pub mod market;
pub mod mining;
pub mod oracle;
pub mod persist;
pub mod rng;
pub mod schedule;
pub mod session;
pub mod wallet;

pub use error::{CoreError, CoreResult};
pub use games::{EdgePolicy, GameId, GameParams, GameRound, Settlement, resolve_round};
pub use ledger::{StakeHold, Transaction, TransactionKind, TransactionLog, Vault};
pub use session::Session;
