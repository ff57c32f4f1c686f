use std::path::Path;

use rusqlite::Connection;

use crate::cli::settings_and_db;
use crate::error::Result;
use crate::importer::materialize;
use crate::intake::Upload;
use crate::models::ParsedRecord;
use crate::store::{self, import_exists, persist_import, ImportMeta};

/// Marks batches saved from a reviewed JSON file rather than a bank export.
const REVIEWED_BATCH: &str = "reviewed";

#[derive(Debug)]
pub enum CommitOutcome {
    Saved { import_id: i64, count: usize },
    Empty,
    AlreadyCommitted,
}

pub(crate) fn commit_batch(
    conn: &Connection,
    batch: &Upload,
    account_name: &str,
    owner_id: i64,
) -> Result<CommitOutcome> {
    let records: Vec<ParsedRecord> = serde_json::from_slice(&batch.bytes)?;
    let transactions = materialize(conn, &records, account_name, owner_id)?;
    let Some(account_id) = transactions.first().map(|t| t.account_id) else {
        return Ok(CommitOutcome::Empty);
    };

    let checksum = batch.checksum();
    if import_exists(conn, account_id, &checksum)? {
        return Ok(CommitOutcome::AlreadyCommitted);
    }

    let meta = ImportMeta {
        account_id,
        filename: &batch.file_name,
        bank: REVIEWED_BATCH,
        checksum: &checksum,
    };
    let import_id = persist_import(conn, &meta, &transactions)?;
    Ok(CommitOutcome::Saved {
        import_id,
        count: transactions.len(),
    })
}

pub fn run(file: &str, account: &str, user: &str) -> Result<()> {
    let (_, conn) = settings_and_db()?;
    let owner = store::find_user(&conn, user)?;
    let batch = Upload::from_path(Path::new(file))?;

    match commit_batch(&conn, &batch, account, owner.id)? {
        CommitOutcome::Saved { import_id, count } => {
            println!("{count} transactions saved to {account} (import {import_id})")
        }
        CommitOutcome::Empty => println!("Nothing to commit in {}.", batch.file_name),
        CommitOutcome::AlreadyCommitted => {
            println!("This batch has already been committed (duplicate checksum).")
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EkstreError;
    use crate::store::list_transactions;
    use crate::store::tests::{add_test_account, test_db};

    const BATCH: &str = r#"[
        {"amount": "100", "balance": "900", "timestamp": "2024-01-01T07:00:00Z",
         "description": "Coffee", "order": 0},
        {"tempId": "6f1c2a9e-3f43-4d2b-9a59-0d0c7d1f2a10", "amount": "-50.25",
         "balance": "849.75", "timestamp": "2024-01-01T07:00:00Z",
         "description": "ATM", "order": 1}
    ]"#;

    fn batch(json: &str) -> Upload {
        Upload {
            file_name: "batch.json".into(),
            bytes: json.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_commit_saves_reviewed_records() {
        let (_dir, conn) = test_db();
        let (user_id, account_id) = add_test_account(&conn);

        let outcome = commit_batch(&conn, &batch(BATCH), "Vadesiz TL", user_id).unwrap();
        assert!(matches!(outcome, CommitOutcome::Saved { count: 2, .. }));

        let stored = list_transactions(&conn, account_id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].description, "Coffee");
        assert_eq!(stored[1].description, "ATM");
        assert_eq!(stored[1].amount.to_string(), "-50.25");
        assert_eq!(stored[1].order, 1);
    }

    #[test]
    fn test_commit_twice_is_rejected() {
        let (_dir, conn) = test_db();
        let (user_id, account_id) = add_test_account(&conn);
        commit_batch(&conn, &batch(BATCH), "Vadesiz TL", user_id).unwrap();
        let again = commit_batch(&conn, &batch(BATCH), "Vadesiz TL", user_id).unwrap();
        assert!(matches!(again, CommitOutcome::AlreadyCommitted));
        assert_eq!(list_transactions(&conn, account_id).unwrap().len(), 2);
    }

    #[test]
    fn test_commit_empty_batch() {
        let (_dir, conn) = test_db();
        let (user_id, _) = add_test_account(&conn);
        let outcome = commit_batch(&conn, &batch("[]"), "Vadesiz TL", user_id).unwrap();
        assert!(matches!(outcome, CommitOutcome::Empty));
    }

    #[test]
    fn test_commit_unknown_account() {
        let (_dir, conn) = test_db();
        let (user_id, _) = add_test_account(&conn);
        let err = commit_batch(&conn, &batch(BATCH), "Birikim", user_id).unwrap_err();
        assert!(matches!(err, EkstreError::UnknownAccount { .. }));
    }

    #[test]
    fn test_commit_rejects_malformed_json() {
        let (_dir, conn) = test_db();
        let (user_id, _) = add_test_account(&conn);
        let err = commit_batch(&conn, &batch("{\"nope\": 1}"), "Vadesiz TL", user_id).unwrap_err();
        assert!(matches!(err, EkstreError::Json(_)));
    }
}
