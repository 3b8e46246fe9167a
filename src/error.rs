use thiserror::Error;

use crate::games::GameId;

/// Every way a core operation can refuse to run. A rejected operation leaves
/// wallet, mining and log state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid stake: {0}")]
    InvalidStake(String),
    #[error("insufficient {asset} balance: needed {needed}, available {available}")]
    InsufficientBalance {
        asset: String,
        needed: f64,
        available: f64,
    },
    #[error("unknown game: {0}")]
    UnknownGame(String),
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
    #[error("invalid parameters for {game}: {reason}")]
    InvalidParams { game: GameId, reason: String },
    #[error("{0} is not available yet")]
    Unavailable(GameId),
    #[error("invalid edge policy: {0}")]
    InvalidEdge(String),
    #[error("malformed transaction: {0}")]
    InvalidTransaction(String),
}

impl CoreError {
    pub(crate) fn params(game: GameId, reason: impl Into<String>) -> Self {
        CoreError::InvalidParams {
            game,
            reason: reason.into(),
        }
    }

    pub(crate) fn insufficient(asset: &str, needed: f64, available: f64) -> Self {
        CoreError::InsufficientBalance {
            asset: asset.to_string(),
            needed,
            available,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
