use std::path::Path;

use rusqlite::Connection;

use crate::cli::{records_table, settings_and_db, StatementArgs};
use crate::error::{EkstreError, Result};
use crate::importer::{parse_statement, BankFormat};
use crate::intake::{check_extension, with_source, Upload};
use crate::models::{Account, ParsedRecord};
use crate::store::{self, LedgerStore};

/// A statement whose bank, owner and account have all been resolved.
pub(crate) struct PendingStatement {
    pub format: BankFormat,
    pub owner_id: i64,
    pub account: Account,
    pub upload: Upload,
}

impl PendingStatement {
    pub fn resolve(conn: &Connection, target: &StatementArgs) -> Result<Self> {
        let format = BankFormat::lookup(&target.bank)?;
        let owner = store::find_user(conn, &target.user)?;
        let account_id = conn
            .resolve_account_id(&target.account, owner.id)?
            .ok_or_else(|| EkstreError::UnknownAccount {
                name: target.account.clone(),
                owner: owner.id,
            })?;
        let account = store::get_account(conn, account_id)?;
        let upload = Upload::from_path(Path::new(&target.file))?;
        check_extension(&upload, format)?;
        Ok(Self {
            format,
            owner_id: owner.id,
            account,
            upload,
        })
    }

    pub fn parse(&self, conn: &Connection, upload_dir: &Path) -> Result<Vec<ParsedRecord>> {
        let records = with_source(&self.upload, self.format, upload_dir, |source| {
            parse_statement(conn, self.format, source, &self.account.name, self.owner_id)
        })?;
        tracing::info!(
            file = %self.upload.file_name,
            bank = self.format.key(),
            account = %self.account.name,
            count = records.len(),
            "parsed statement"
        );
        Ok(records)
    }
}

pub fn run(target: &StatementArgs, json: bool) -> Result<()> {
    let (settings, conn) = settings_and_db()?;
    let pending = PendingStatement::resolve(&conn, target)?;
    let records = pending.parse(&conn, &settings.upload_dir())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No new transactions in {}.", pending.upload.file_name);
        return Ok(());
    }

    let table = records_table(&records, &pending.account.currency, settings.display_tz()?);
    println!(
        "{} new transactions for {}\n{table}",
        records.len(),
        pending.account.name
    );
    Ok(())
}
