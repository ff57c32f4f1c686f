use chrono_tz::Tz;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::cli::{amount_cell, settings_and_db};
use crate::error::Result;
use crate::fmt::{local_time, money};
use crate::store::{self, account_summaries, recent_transactions};

pub fn run(user: &str, limit: usize) -> Result<()> {
    let (settings, conn) = settings_and_db()?;
    let owner = store::find_user(&conn, user)?;
    let tz = settings.display_tz()?;
    let (cards, recent) = render(&conn, owner.id, limit, tz)?;

    println!("Accounts for {}\n{cards}", owner.email);
    match recent {
        Some(table) => println!("\nRecent transactions\n{table}"),
        None => println!("\nNo transactions yet."),
    }
    Ok(())
}

/// Account cards and, when there are any, the most recent transactions.
pub(crate) fn render(
    conn: &Connection,
    owner_id: i64,
    limit: usize,
    tz: Tz,
) -> Result<(Table, Option<Table>)> {
    let mut cards = Table::new();
    cards.set_header(vec!["Account", "Category", "Balance", "Transactions"]);
    for summary in account_summaries(conn, owner_id)? {
        let balance = summary
            .latest_balance
            .map(|b| money(b, &summary.account.currency))
            .unwrap_or_else(|| "-".to_string());
        cards.add_row(vec![
            Cell::new(&summary.account.name),
            Cell::new(&summary.account.category),
            Cell::new(balance),
            Cell::new(summary.transaction_count),
        ]);
    }

    let rows = recent_transactions(conn, owner_id, limit)?;
    if rows.is_empty() {
        return Ok((cards, None));
    }
    let mut recent = Table::new();
    recent.set_header(vec!["Date", "Account", "Description", "Amount"]);
    for row in rows {
        let t = row.transaction;
        recent.add_row(vec![
            Cell::new(local_time(t.timestamp, tz)),
            Cell::new(row.account_name),
            Cell::new(t.description),
            amount_cell(t.amount, &row.currency),
        ]);
    }
    Ok((cards, Some(recent)))
}
