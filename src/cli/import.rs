use crate::cli::{settings_and_db, upload::PendingStatement, StatementArgs};
use crate::error::Result;
use crate::importer::materialize;
use crate::store::{import_exists, persist_import, ImportMeta};

pub fn run(target: &StatementArgs) -> Result<()> {
    let (settings, conn) = settings_and_db()?;
    let pending = PendingStatement::resolve(&conn, target)?;

    let checksum = pending.upload.checksum();
    if import_exists(&conn, pending.account.id, &checksum)? {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    let records = pending.parse(&conn, &settings.upload_dir())?;
    if records.is_empty() {
        println!("No new transactions in {}.", pending.upload.file_name);
        return Ok(());
    }

    let transactions = materialize(&conn, &records, &pending.account.name, pending.owner_id)?;
    let meta = ImportMeta {
        account_id: pending.account.id,
        filename: &pending.upload.file_name,
        bank: pending.format.key(),
        checksum: &checksum,
    };
    persist_import(&conn, &meta, &transactions)?;

    println!(
        "{} transactions imported into {}",
        transactions.len(),
        pending.account.name
    );
    Ok(())
}
