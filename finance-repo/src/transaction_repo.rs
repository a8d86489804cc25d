use crate::user_repo::UserId;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug)]
pub struct PageOptions {
    pub offset: i64,
    pub limit: i64,
}

/// Share accounting for users. Every buy and sell appends a [Transaction] and adjusts the user's
/// cash in the same unit of work, so either both are stored or neither is.
#[async_trait]
pub trait TransactionRepo: Sync + Send {
    /// Records a purchase and debits `trade.amount()` from the user's cash.
    ///
    /// Fails with [TransactionRepoError::InsufficientFunds] when the cost exceeds the cash.
    async fn buy(&self, user: UserId, trade: Trade) -> Result<Transaction, TransactionRepoError>;

    /// Records a sale and credits `trade.amount()` to the user's cash.
    ///
    /// Fails with [TransactionRepoError::InsufficientShares] when the user holds fewer shares of
    /// the symbol than requested.
    async fn sell(&self, user: UserId, trade: Trade) -> Result<Transaction, TransactionRepoError>;

    /// Net shares (purchases minus sales) for every symbol the user still holds, ordered by symbol.
    async fn get_holdings(&self, user: UserId) -> Result<Vec<Holding>, TransactionRepoError>;

    async fn get_holding(&self, user: UserId, symbol: &str) -> Result<i64, TransactionRepoError>;

    /// All transactions of the user, newest first.
    async fn get_all_transactions(
        &self,
        user: UserId,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Transaction>, TransactionRepoError>;
}

#[derive(Error, Debug)]
pub enum TransactionRepoError {
    #[error("User {0} not found")]
    UserNotFound(UserId),
    #[error("Share count must be positive, got {0}")]
    InvalidShares(i64),
    #[error("Insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: Decimal, available: Decimal },
    #[error("Insufficient shares of {symbol}: {requested} requested, {held} held")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Purchase,
    Sale,
}

impl TransactionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Sale => "sale",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(TransactionKind::Purchase),
            "sale" => Ok(TransactionKind::Sale),
            _ => Err(anyhow!("Unknown transaction kind {}", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Transaction {
    pub id: i64,
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub time: DateTime<Utc>,
}

impl Transaction {
    pub const fn new(
        id: i64,
        symbol: String,
        shares: i64,
        price: Decimal,
        amount: Decimal,
        kind: TransactionKind,
        time: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id,
            symbol,
            shares,
            price,
            amount,
            kind,
            time,
        }
    }
}

/// A request to move `shares` of `symbol` at `price` per share.
#[derive(Clone, Debug)]
pub struct Trade {
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
}

impl Trade {
    pub const fn new(symbol: String, shares: i64, price: Decimal) -> Trade {
        Trade {
            symbol,
            shares,
            price,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.price * Decimal::from(self.shares)
    }

    pub(crate) fn check_shares(&self) -> Result<(), TransactionRepoError> {
        if self.shares > 0 {
            Ok(())
        } else {
            Err(TransactionRepoError::InvalidShares(self.shares))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Holding {
    pub symbol: String,
    pub shares: i64,
}

impl Holding {
    pub const fn new(symbol: String, shares: i64) -> Holding {
        Holding { symbol, shares }
    }
}
