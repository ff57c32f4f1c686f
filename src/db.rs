use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS account_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS currencies (
    id INTEGER PRIMARY KEY,
    symbol TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS transaction_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    user_id INTEGER NOT NULL,
    account_category_id INTEGER NOT NULL,
    currency_id INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (user_id, name),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (account_category_id) REFERENCES account_categories(id),
    FOREIGN KEY (currency_id) REFERENCES currencies(id)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    bank TEXT NOT NULL,
    checksum TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    date_range_start TEXT,
    date_range_end TEXT,
    imported_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    amount TEXT NOT NULL,
    balance TEXT NOT NULL,
    description TEXT NOT NULL,
    transaction_category_id INTEGER NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    import_id INTEGER,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE,
    FOREIGN KEY (transaction_category_id) REFERENCES transaction_categories(id),
    FOREIGN KEY (import_id) REFERENCES imports(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_account_timestamp
    ON transactions (account_id, timestamp);
";

/// Category assigned to every imported transaction.
pub const DEFAULT_TRANSACTION_CATEGORY_ID: i64 = 1;

const ACCOUNT_CATEGORIES: &[(i64, &str)] = &[(1, "Checking")];

const CURRENCIES: &[(i64, &str)] = &[(1, "₺"), (2, "$"), (3, "€")];

const TRANSACTION_CATEGORIES: &[(i64, &str)] = &[(DEFAULT_TRANSACTION_CATEGORY_ID, "Other")];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    for (id, name) in ACCOUNT_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO account_categories (id, name) VALUES (?1, ?2)",
            rusqlite::params![id, name],
        )?;
    }
    for (id, symbol) in CURRENCIES {
        conn.execute(
            "INSERT OR IGNORE INTO currencies (id, symbol) VALUES (?1, ?2)",
            rusqlite::params![id, symbol],
        )?;
    }
    for (id, name) in TRANSACTION_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO transaction_categories (id, name) VALUES (?1, ?2)",
            rusqlite::params![id, name],
        )?;
    }
    Ok(())
}
