use crate::mem_repo::{MemRepo, State};
use crate::transaction_repo::TransactionRepoError::{
    InsufficientFunds, InsufficientShares, UserNotFound,
};
use crate::transaction_repo::{
    Holding, PageOptions, Trade, Transaction, TransactionKind, TransactionRepo,
    TransactionRepoError,
};
use crate::user_repo::UserId;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;

impl State {
    fn net_shares(&self, user: UserId) -> BTreeMap<&str, i64> {
        let mut shares = BTreeMap::new();
        for transaction in self.transactions.get(&user).into_iter().flatten() {
            let entry = shares.entry(transaction.symbol.as_str()).or_insert(0);
            match transaction.kind {
                TransactionKind::Purchase => *entry += transaction.shares,
                TransactionKind::Sale => *entry -= transaction.shares,
            }
        }
        shares
    }

    fn append(&mut self, user: UserId, trade: Trade, kind: TransactionKind) -> Transaction {
        let amount = trade.amount();
        let transaction = Transaction::new(
            self.next_transaction_id,
            trade.symbol,
            trade.shares,
            trade.price,
            amount,
            kind,
            Utc::now(),
        );
        self.next_transaction_id += 1;
        self.transactions
            .entry(user)
            .or_default()
            .push(transaction.clone());
        transaction
    }
}

#[async_trait]
impl TransactionRepo for MemRepo {
    async fn buy(&self, user: UserId, trade: Trade) -> Result<Transaction, TransactionRepoError> {
        trade.check_shares()?;
        let mut write_guard = self.write_lock()?;
        let state = &mut *write_guard;

        let cash = state.users.get(&user).ok_or(UserNotFound(user))?.cash;
        let cost = trade.amount();
        if cost > cash {
            return Err(InsufficientFunds {
                required: cost,
                available: cash,
            });
        }

        let transaction = state.append(user, trade, TransactionKind::Purchase);
        if let Some(u) = state.users.get_mut(&user) {
            u.cash = cash - cost;
        }
        Ok(transaction)
    }

    async fn sell(&self, user: UserId, trade: Trade) -> Result<Transaction, TransactionRepoError> {
        trade.check_shares()?;
        let mut write_guard = self.write_lock()?;
        let state = &mut *write_guard;

        let cash = state.users.get(&user).ok_or(UserNotFound(user))?.cash;
        let held = state
            .net_shares(user)
            .get(trade.symbol.as_str())
            .copied()
            .unwrap_or(0);
        if trade.shares > held {
            return Err(InsufficientShares {
                symbol: trade.symbol,
                requested: trade.shares,
                held,
            });
        }

        let transaction = state.append(user, trade, TransactionKind::Sale);
        if let Some(u) = state.users.get_mut(&user) {
            u.cash = cash + transaction.amount;
        }
        Ok(transaction)
    }

    async fn get_holdings(&self, user: UserId) -> Result<Vec<Holding>, TransactionRepoError> {
        let read_guard = self.read_lock()?;

        let holdings = read_guard
            .net_shares(user)
            .into_iter()
            .filter(|(_, shares)| *shares > 0)
            .map(|(symbol, shares)| Holding::new(symbol.to_owned(), shares))
            .collect();
        Ok(holdings)
    }

    async fn get_holding(&self, user: UserId, symbol: &str) -> Result<i64, TransactionRepoError> {
        let read_guard = self.read_lock()?;

        Ok(read_guard.net_shares(user).get(symbol).copied().unwrap_or(0))
    }

    async fn get_all_transactions(
        &self,
        user: UserId,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Transaction>, TransactionRepoError> {
        let read_guard = self.read_lock()?;

        let Some(transactions) = read_guard.transactions.get(&user) else {
            return Ok(Vec::new());
        };

        let transactions: Vec<Transaction> = transactions.iter().rev().cloned().collect();
        let mut transactions: Box<dyn Iterator<Item = Transaction>> =
            Box::new(transactions.into_iter());
        if let Some(page_options) = page_options {
            transactions = Box::new(
                transactions
                    .skip(page_options.offset as usize)
                    .take(page_options.limit as usize),
            );
        }

        Ok(transactions.collect())
    }
}
