use chrono_tz::Tz;
use comfy_table::{Cell, Table};

use crate::cli::{amount_cell, settings_and_db};
use crate::error::{EkstreError, Result};
use crate::fmt::{local_time, money};
use crate::models::{Account, Transaction};
use crate::store::{self, list_transactions, LedgerStore};

pub fn run(account_name: &str, user: &str) -> Result<()> {
    let (settings, conn) = settings_and_db()?;
    let owner = store::find_user(&conn, user)?;
    let account_id = conn
        .resolve_account_id(account_name, owner.id)?
        .ok_or_else(|| EkstreError::UnknownAccount {
            name: account_name.to_string(),
            owner: owner.id,
        })?;
    let account = store::get_account(&conn, account_id)?;
    let transactions = list_transactions(&conn, account_id)?;

    if transactions.is_empty() {
        println!("No transactions in {}.", account.name);
        return Ok(());
    }
    let table = register(&account, &transactions, settings.display_tz()?);
    println!("{} ({} transactions)\n{table}", account.name, transactions.len());
    Ok(())
}

fn register(account: &Account, transactions: &[Transaction], tz: Tz) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "#", "Description", "Amount", "Balance"]);
    for t in transactions {
        table.add_row(vec![
            Cell::new(local_time(t.timestamp, tz)),
            Cell::new(t.order),
            Cell::new(&t.description),
            amount_cell(t.amount, &account.currency),
            Cell::new(money(t.balance, &account.currency)),
        ]);
    }
    table
}
