use comfy_table::{Cell, Table};

use crate::cli::settings_and_db;
use crate::error::Result;
use crate::store;

pub fn add(name: &str, user: &str, category: &str, currency: &str) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let owner = store::find_user(&conn, user)?;
    let id = store::add_account(&conn, owner.id, name, category, currency)?;
    println!("Added account: {} (id {id})", name.trim());
    Ok(())
}

pub fn list(user: &str) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let owner = store::find_user(&conn, user)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Category", "Currency"]);
    for account in store::list_accounts(&conn, owner.id)? {
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(account.name),
            Cell::new(account.category),
            Cell::new(account.currency),
        ]);
    }
    println!("Accounts for {}\n{table}", owner.email);
    Ok(())
}

pub fn update(
    id: i64,
    name: Option<&str>,
    category: Option<&str>,
    currency: Option<&str>,
) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let account = store::update_account(&conn, id, name, category, currency)?;
    println!(
        "Updated account {}: {} ({}, {})",
        account.id, account.name, account.category, account.currency
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let account = store::get_account(&conn, id)?;
    store::delete_account(&conn, id)?;
    println!("Deleted account: {}", account.name);
    Ok(())
}
