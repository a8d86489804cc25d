use crate::sqlx_repo::SQLxRepo;
use crate::transaction_repo::TransactionRepoError::{
    InsufficientFunds, InsufficientShares, UserNotFound,
};
use crate::transaction_repo::{
    Holding, PageOptions, Trade, Transaction, TransactionKind, TransactionRepo,
    TransactionRepoError,
};
use crate::user_repo::UserId;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{query, query_as, query_scalar, Executor, QueryBuilder, Sqlite};
use std::str::FromStr;
use tracing::instrument;

const NET_SHARES: &str =
    "SUM(CASE WHEN transaction_type = 'purchase' THEN shares ELSE -shares END)";

// decimals are read back as text so databases that declared them NUMERIC still decode exactly
const SELECT_TRANSACTION: &str = "SELECT id, company_symbol, shares, CAST(price AS TEXT) AS price, \
     CAST(amount AS TEXT) AS amount, transaction_type, transaction_time FROM transactions";

#[derive(sqlx::FromRow)]
struct TransactionEntry {
    id: i64,
    company_symbol: String,
    shares: i64,
    price: String,
    amount: String,
    transaction_type: String,
    transaction_time: DateTime<Utc>,
}

impl TryFrom<TransactionEntry> for Transaction {
    type Error = anyhow::Error;

    fn try_from(value: TransactionEntry) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&value.price)
            .with_context(|| format!("Invalid price stored for transaction {}", value.id))?;
        let amount = Decimal::from_str(&value.amount)
            .with_context(|| format!("Invalid amount stored for transaction {}", value.id))?;
        let kind = TransactionKind::from_str(&value.transaction_type)?;
        Ok(Transaction::new(
            value.id,
            value.company_symbol,
            value.shares,
            price,
            amount,
            kind,
            value.transaction_time,
        ))
    }
}

impl SQLxRepo {
    /// Writes to the user's row so the db transaction holds the write lock before anything is
    /// read. A concurrent trade then waits on the busy timeout instead of failing on upgrade.
    #[instrument(skip(db_executor))]
    async fn lock_user<'e, E>(db_executor: E, user: UserId) -> Result<(), TransactionRepoError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = query("UPDATE users SET cash = cash WHERE id = ?")
            .bind(user)
            .execute(db_executor)
            .await
            .with_context(|| format!("Unable to lock user {}", user))?;
        if result.rows_affected() == 0 {
            Err(UserNotFound(user))
        } else {
            Ok(())
        }
    }

    #[instrument(skip(db_executor))]
    async fn select_cash<'e, E>(db_executor: E, user: UserId) -> Result<Decimal, TransactionRepoError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let cash: String = query_scalar("SELECT CAST(cash AS TEXT) FROM users WHERE id = ?")
            .bind(user)
            .fetch_optional(db_executor)
            .await
            .with_context(|| format!("Unable to get cash for user {}", user))?
            .ok_or(UserNotFound(user))?;
        let cash = Decimal::from_str(&cash)
            .with_context(|| format!("Invalid cash value stored for user {}", user))?;
        Ok(cash)
    }

    #[instrument(skip(db_executor))]
    async fn update_cash<'e, E>(
        db_executor: E,
        user: UserId,
        cash: Decimal,
    ) -> Result<(), TransactionRepoError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = query("UPDATE users SET cash = ? WHERE id = ?")
            .bind(cash.to_string())
            .bind(user)
            .execute(db_executor)
            .await
            .with_context(|| format!("Unable to update cash for user {}", user))?;
        if result.rows_affected() == 0 {
            Err(UserNotFound(user))
        } else {
            Ok(())
        }
    }

    #[instrument(skip(db_executor))]
    async fn select_holding<'e, E>(
        db_executor: E,
        user: UserId,
        symbol: &str,
    ) -> Result<i64, TransactionRepoError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT COALESCE({}, 0) FROM transactions WHERE user_id = ? AND company_symbol = ?",
            NET_SHARES
        );
        let held: i64 = query_scalar(&sql)
            .bind(user)
            .bind(symbol)
            .fetch_one(db_executor)
            .await
            .with_context(|| format!("Unable to get holding of {} for user {}", symbol, user))?;
        Ok(held)
    }

    #[instrument(skip(db_executor))]
    async fn insert_transaction_entry<'e, E>(
        db_executor: E,
        user: UserId,
        trade: &Trade,
        kind: TransactionKind,
    ) -> Result<Transaction, TransactionRepoError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let amount = trade.amount();
        let time = Utc::now();
        let result = query(
            "INSERT INTO transactions(user_id, company_symbol, shares, price, amount, transaction_type, transaction_time) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user)
        .bind(&trade.symbol)
        .bind(trade.shares)
        .bind(trade.price.to_string())
        .bind(amount.to_string())
        .bind(kind.as_str())
        .bind(time)
        .execute(db_executor)
        .await
        .context("Unable to insert transaction")?;

        Ok(Transaction::new(
            result.last_insert_rowid(),
            trade.symbol.clone(),
            trade.shares,
            trade.price,
            amount,
            kind,
            time,
        ))
    }
}

#[async_trait]
impl TransactionRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn buy(&self, user: UserId, trade: Trade) -> Result<Transaction, TransactionRepoError> {
        trade.check_shares()?;

        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin db transaction")?;

        Self::lock_user(&mut *db_transaction, user).await?;
        let cash = Self::select_cash(&mut *db_transaction, user).await?;
        let cost = trade.amount();
        if cost > cash {
            return Err(InsufficientFunds {
                required: cost,
                available: cash,
            });
        }

        let transaction = Self::insert_transaction_entry(
            &mut *db_transaction,
            user,
            &trade,
            TransactionKind::Purchase,
        )
        .await?;
        Self::update_cash(&mut *db_transaction, user, cash - cost).await?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit db transaction")?;
        Ok(transaction)
    }

    #[instrument(skip(self))]
    async fn sell(&self, user: UserId, trade: Trade) -> Result<Transaction, TransactionRepoError> {
        trade.check_shares()?;

        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin db transaction")?;

        Self::lock_user(&mut *db_transaction, user).await?;
        let held = Self::select_holding(&mut *db_transaction, user, &trade.symbol).await?;
        if trade.shares > held {
            return Err(InsufficientShares {
                symbol: trade.symbol,
                requested: trade.shares,
                held,
            });
        }

        let cash = Self::select_cash(&mut *db_transaction, user).await?;
        let transaction = Self::insert_transaction_entry(
            &mut *db_transaction,
            user,
            &trade,
            TransactionKind::Sale,
        )
        .await?;
        Self::update_cash(&mut *db_transaction, user, cash + transaction.amount).await?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit db transaction")?;
        Ok(transaction)
    }

    #[instrument(skip(self))]
    async fn get_holdings(&self, user: UserId) -> Result<Vec<Holding>, TransactionRepoError> {
        let sql = format!(
            "SELECT company_symbol, {net} AS shares FROM transactions WHERE user_id = ? GROUP BY company_symbol HAVING {net} > 0 ORDER BY company_symbol",
            net = NET_SHARES
        );
        let holdings: Vec<(String, i64)> = query_as(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Unable to get holdings for user {}", user))?;
        Ok(holdings
            .into_iter()
            .map(|(symbol, shares)| Holding::new(symbol, shares))
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_holding(&self, user: UserId, symbol: &str) -> Result<i64, TransactionRepoError> {
        Self::select_holding(&self.pool, user, symbol).await
    }

    #[instrument(skip(self))]
    async fn get_all_transactions(
        &self,
        user: UserId,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Transaction>, TransactionRepoError> {
        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_TRANSACTION);
        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(user);
        query_builder.push(" ORDER BY id DESC");
        if let Some(po) = page_options {
            query_builder
                .push(" LIMIT ")
                .push_bind(po.limit)
                .push(" OFFSET ")
                .push_bind(po.offset);
        }
        let query = query_builder.build_query_as();
        let transaction_entries: Vec<TransactionEntry> = query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Unable to get transactions for user {}", user))?;

        let transactions = transaction_entries
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<Transaction>, anyhow::Error>>()?;
        Ok(transactions)
    }
}
