use comfy_table::{Cell, Table};

use crate::cli::settings_and_db;
use crate::error::Result;
use crate::store;

pub fn add(email: &str) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let id = store::add_user(&conn, email)?;
    println!("Added user {email} (id {id})");
    Ok(())
}

pub fn list() -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Email"]);
    for user in store::list_users(&conn)? {
        table.add_row(vec![Cell::new(user.id), Cell::new(user.email)]);
    }
    println!("Users\n{table}");
    Ok(())
}

pub fn update(id: i64, email: &str) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let user = store::update_user(&conn, id, email)?;
    println!("Updated user {}: {}", user.id, user.email);
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let user = store::get_user(&conn, id)?;
    store::delete_user(&conn, id)?;
    println!("Deleted user {} and their accounts", user.email);
    Ok(())
}
