use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::error::{EkstreError, Result};
use crate::models::{Account, DateRange, NewTransaction, Transaction, User};

/// What the statement parsers need to know about the ledger.
pub trait LedgerStore {
    fn resolve_account_id(&self, account_name: &str, owner_id: i64) -> Result<Option<i64>>;

    /// `None` when the account has no transactions yet.
    fn date_range(&self, account_id: i64) -> Result<Option<DateRange>>;
}

impl LedgerStore for Connection {
    fn resolve_account_id(&self, account_name: &str, owner_id: i64) -> Result<Option<i64>> {
        let id = self
            .query_row(
                "SELECT id FROM accounts WHERE name = ?1 AND user_id = ?2",
                rusqlite::params![account_name, owner_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn date_range(&self, account_id: i64) -> Result<Option<DateRange>> {
        let (oldest, newest): (Option<DateTime<Utc>>, Option<DateTime<Utc>>) = self.query_row(
            "SELECT MIN(timestamp), MAX(timestamp) FROM transactions WHERE account_id = ?1",
            [account_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(match (oldest, newest) {
            (Some(oldest), Some(newest)) => Some(DateRange { oldest, newest }),
            _ => None,
        })
    }
}

fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

fn map_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
    })
}

/// Trimmed `email`, provided no other user already has it.
fn available_email<'a>(conn: &Connection, email: &'a str, exclude_id: Option<i64>) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(EkstreError::Other("Email is required".into()));
    }
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND id != ?2)",
        rusqlite::params![email, exclude_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    if taken {
        return Err(EkstreError::Other(format!("User already exists: {email}")));
    }
    Ok(email)
}

pub fn add_user(conn: &Connection, email: &str) -> Result<i64> {
    let email = available_email(conn, email, None)?;
    conn.execute("INSERT INTO users (email) VALUES (?1)", [email])?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user(conn: &Connection, email: &str) -> Result<User> {
    conn.query_row(
        "SELECT id, email FROM users WHERE email = ?1",
        [email.trim()],
        map_user,
    )
    .optional()?
    .ok_or_else(|| EkstreError::UnknownUser(email.to_string()))
}

pub fn get_user(conn: &Connection, id: i64) -> Result<User> {
    conn.query_row("SELECT id, email FROM users WHERE id = ?1", [id], map_user)
        .optional()?
        .ok_or_else(|| EkstreError::UnknownUser(id.to_string()))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, email FROM users ORDER BY email")?;
    let users = stmt
        .query_map([], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn update_user(conn: &Connection, id: i64, email: &str) -> Result<User> {
    get_user(conn, id)?;
    let email = available_email(conn, email, Some(id))?;
    conn.execute("UPDATE users SET email = ?1 WHERE id = ?2", rusqlite::params![email, id])?;
    get_user(conn, id)
}

/// Removes the user with all of their accounts and transactions.
pub fn delete_user(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(EkstreError::UnknownUser(id.to_string()));
    }
    tracing::info!(user_id = id, "deleted user");
    Ok(())
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

fn account_category_id(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM account_categories WHERE name = ?1",
        [name],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| EkstreError::InvalidCategory(name.to_string()))
}

fn currency_id(conn: &Connection, symbol: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM currencies WHERE symbol = ?1", [symbol], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| EkstreError::InvalidCurrency(symbol.to_string()))
}

fn ensure_unique_account_name(
    conn: &Connection,
    user_id: i64,
    name: &str,
    except_id: Option<i64>,
) -> Result<()> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE user_id = ?1 AND name = ?2 AND id != ?3)",
        rusqlite::params![user_id, name, except_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    if taken {
        return Err(EkstreError::Other(format!(
            "An account named '{name}' already exists"
        )));
    }
    Ok(())
}

pub fn add_account(
    conn: &Connection,
    user_id: i64,
    name: &str,
    category: &str,
    currency: &str,
) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EkstreError::Other("Name is required".into()));
    }
    let category_id = account_category_id(conn, category)?;
    let currency_id = currency_id(conn, currency)?;
    ensure_unique_account_name(conn, user_id, name, None)?;
    conn.execute(
        "INSERT INTO accounts (name, user_id, account_category_id, currency_id) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![name, user_id, category_id, currency_id],
    )?;
    Ok(conn.last_insert_rowid())
}

const ACCOUNT_SELECT: &str = "SELECT a.id, a.name, a.user_id, c.name, cur.symbol \
     FROM accounts a \
     JOIN account_categories c ON c.id = a.account_category_id \
     JOIN currencies cur ON cur.id = a.currency_id";

fn map_account(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        category: row.get(3)?,
        currency: row.get(4)?,
    })
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Account> {
    conn.query_row(&format!("{ACCOUNT_SELECT} WHERE a.id = ?1"), [id], map_account)
        .optional()?
        .ok_or_else(|| EkstreError::Other(format!("Account not found: {id}")))
}

pub fn list_accounts(conn: &Connection, user_id: i64) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!("{ACCOUNT_SELECT} WHERE a.user_id = ?1 ORDER BY a.name"))?;
    let accounts = stmt
        .query_map([user_id], map_account)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(accounts)
}

pub fn update_account(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    category: Option<&str>,
    currency: Option<&str>,
) -> Result<Account> {
    let current = get_account(conn, id)?;

    let name = match name.map(str::trim) {
        Some("") => return Err(EkstreError::Other("Name is required".into())),
        Some(name) => name.to_string(),
        None => current.name.clone(),
    };
    ensure_unique_account_name(conn, current.user_id, &name, Some(id))?;
    let category_id = account_category_id(conn, category.unwrap_or(&current.category))?;
    let currency_id = currency_id(conn, currency.unwrap_or(&current.currency))?;

    conn.execute(
        "UPDATE accounts SET name = ?1, account_category_id = ?2, currency_id = ?3 WHERE id = ?4",
        rusqlite::params![name, category_id, currency_id, id],
    )?;
    get_account(conn, id)
}

/// Removes the account together with its transactions and import history.
pub fn delete_account(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(EkstreError::Other(format!("Account not found: {id}")));
    }
    tracing::info!(account_id = id, "deleted account");
    Ok(())
}

// ---------------------------------------------------------------------------
// Transactions and import batches
// ---------------------------------------------------------------------------

pub struct ImportMeta<'a> {
    pub account_id: i64,
    pub filename: &'a str,
    pub bank: &'a str,
    pub checksum: &'a str,
}

/// Record an import batch and insert its transactions atomically.
///
/// Returns the id of the new `imports` row.
pub fn persist_import(
    conn: &Connection,
    meta: &ImportMeta,
    transactions: &[NewTransaction],
) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;

    let oldest = transactions.iter().map(|t| t.timestamp).min();
    let newest = transactions.iter().map(|t| t.timestamp).max();
    tx.execute(
        "INSERT INTO imports (account_id, filename, bank, checksum, record_count, date_range_start, date_range_end) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            meta.account_id,
            meta.filename,
            meta.bank,
            meta.checksum,
            transactions.len() as i64,
            oldest,
            newest,
        ],
    )?;
    let import_id = tx.last_insert_rowid();

    insert_transactions(&tx, Some(import_id), transactions)?;
    tx.commit()?;

    tracing::info!(
        import_id,
        account_id = meta.account_id,
        count = transactions.len(),
        "persisted import batch"
    );
    Ok(import_id)
}

/// Whether this exact file was already imported into the account.
pub fn import_exists(conn: &Connection, account_id: i64, checksum: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1 AND account_id = ?2")?;
    Ok(stmt.exists(rusqlite::params![checksum, account_id])?)
}

pub fn insert_transactions(
    conn: &Connection,
    import_id: Option<i64>,
    transactions: &[NewTransaction],
) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions \
         (account_id, timestamp, amount, balance, description, transaction_category_id, sort_order, import_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for t in transactions {
        stmt.execute(rusqlite::params![
            t.account_id,
            t.timestamp,
            t.amount.to_string(),
            t.balance.to_string(),
            t.description,
            t.transaction_category_id,
            t.order,
            import_id,
        ])?;
    }
    Ok(transactions.len())
}

const TRANSACTION_COLUMNS: &str = "t.id, t.account_id, t.timestamp, t.amount, t.balance, \
     t.description, t.transaction_category_id, t.sort_order, t.import_id";

fn map_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        timestamp: row.get(2)?,
        amount: decimal_column(row, 3)?,
        balance: decimal_column(row, 4)?,
        description: row.get(5)?,
        transaction_category_id: row.get(6)?,
        order: row.get(7)?,
        import_id: row.get(8)?,
    })
}

/// Oldest first, same-timestamp rows by their order.
pub fn list_transactions(conn: &Connection, account_id: i64) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions t \
         WHERE t.account_id = ?1 ORDER BY t.timestamp ASC, t.sort_order ASC"
    ))?;
    let rows = stmt
        .query_map([account_id], map_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct RecentTransaction {
    pub account_name: String,
    pub currency: String,
    pub transaction: Transaction,
}

pub fn recent_transactions(
    conn: &Connection,
    user_id: i64,
    limit: usize,
) -> Result<Vec<RecentTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS}, a.name, cur.symbol FROM transactions t \
         JOIN accounts a ON a.id = t.account_id \
         JOIN currencies cur ON cur.id = a.currency_id \
         WHERE a.user_id = ?1 \
         ORDER BY t.timestamp DESC, t.sort_order DESC LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, limit as i64], |row| {
            Ok(RecentTransaction {
                transaction: map_transaction(row)?,
                account_name: row.get(9)?,
                currency: row.get(10)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct AccountSummary {
    pub account: Account,
    pub latest_balance: Option<Decimal>,
    pub transaction_count: i64,
}

pub fn account_summaries(conn: &Connection, user_id: i64) -> Result<Vec<AccountSummary>> {
    let mut summaries = Vec::new();
    for account in list_accounts(conn, user_id)? {
        let latest_balance = conn
            .query_row(
                "SELECT balance FROM transactions WHERE account_id = ?1 \
                 ORDER BY timestamp DESC, sort_order DESC LIMIT 1",
                [account.id],
                |row| decimal_column(row, 0),
            )
            .optional()?;
        let transaction_count: i64 = conn.query_row(
            "SELECT count(*) FROM transactions WHERE account_id = ?1",
            [account.id],
            |row| row.get(0),
        )?;
        summaries.push(AccountSummary {
            account,
            latest_balance,
            transaction_count,
        });
    }
    Ok(summaries)
}
