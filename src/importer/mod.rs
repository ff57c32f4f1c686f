//! Bank statement importers.
//!
//! Each supported bank has a [`BankFormat`] variant that knows what kind of
//! source it reads and how its sheet is laid out. Parsing never writes to
//! the ledger; it only asks the [`LedgerStore`] which span of the account
//! has already been imported.

mod isbank;
mod scan;
mod sheet;
mod ziraat;

use std::io::{Read, Seek};
use std::path::Path;

use crate::db::DEFAULT_TRANSACTION_CATEGORY_ID;
use crate::error::{EkstreError, Result};
use crate::models::{DateRange, NewTransaction, ParsedRecord};
use crate::store::LedgerStore;

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// What a bank format reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Path,
    Stream,
}

pub enum StatementSource<'a> {
    Path(&'a Path),
    Stream(Box<dyn ReadSeek + 'a>),
}

impl StatementSource<'_> {
    fn kind(&self) -> SourceKind {
        match self {
            Self::Path(_) => SourceKind::Path,
            Self::Stream(_) => SourceKind::Stream,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankFormat {
    Ziraat,
    IsBank,
}

const ALL_FORMATS: &[BankFormat] = &[BankFormat::Ziraat, BankFormat::IsBank];

impl BankFormat {
    pub fn all() -> &'static [BankFormat] {
        ALL_FORMATS
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Ziraat => "ziraat",
            Self::IsBank => "isbank",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ziraat => "Ziraat Bank",
            Self::IsBank => "Is Bank",
        }
    }

    pub fn file_type(&self) -> &'static str {
        match self {
            Self::Ziraat => "xlsx",
            Self::IsBank => "xls",
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Ziraat => SourceKind::Path,
            Self::IsBank => SourceKind::Stream,
        }
    }

    /// Find a format by key or display name, ignoring case.
    pub fn lookup(identifier: &str) -> Result<BankFormat> {
        let wanted = identifier.trim();
        ALL_FORMATS
            .iter()
            .find(|f| f.key().eq_ignore_ascii_case(wanted) || f.name().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| EkstreError::UnknownBank(identifier.to_string()))
    }

    pub fn parse(
        &self,
        source: StatementSource<'_>,
        known: Option<DateRange>,
    ) -> Result<Vec<ParsedRecord>> {
        match (self, source) {
            (Self::Ziraat, StatementSource::Path(path)) => ziraat::parse(path, known),
            (Self::IsBank, StatementSource::Stream(reader)) => isbank::parse(reader, known),
            (format, source) => Err(EkstreError::Other(format!(
                "{} statements are read from a {:?} source, got {:?}",
                format.name(),
                format.source_kind(),
                source.kind()
            ))),
        }
    }
}

/// Parse a statement for `account_name`, leaving out rows from the span the
/// account already holds.
///
/// `Ok` with an empty list means the statement had nothing new.
pub fn parse_statement(
    store: &impl LedgerStore,
    format: BankFormat,
    source: StatementSource<'_>,
    account_name: &str,
    owner_id: i64,
) -> Result<Vec<ParsedRecord>> {
    let account_id = resolve_account(store, account_name, owner_id)?;
    let known = store.date_range(account_id)?;
    tracing::debug!(
        account_id,
        bank = format.key(),
        oldest = ?known.map(|r| r.oldest),
        newest = ?known.map(|r| r.newest),
        "parsing statement"
    );
    format.parse(source, known)
}

/// Turn reviewed records into transactions for `account_name`.
pub fn materialize(
    store: &impl LedgerStore,
    records: &[ParsedRecord],
    account_name: &str,
    owner_id: i64,
) -> Result<Vec<NewTransaction>> {
    let account_id = resolve_account(store, account_name, owner_id)?;
    Ok(records
        .iter()
        .map(|record| NewTransaction {
            account_id,
            timestamp: record.timestamp,
            amount: record.amount,
            balance: record.balance,
            description: record.description.clone(),
            transaction_category_id: DEFAULT_TRANSACTION_CATEGORY_ID,
            order: record.order,
        })
        .collect())
}

fn resolve_account(store: &impl LedgerStore, account_name: &str, owner_id: i64) -> Result<i64> {
    store
        .resolve_account_id(account_name, owner_id)?
        .ok_or_else(|| EkstreError::UnknownAccount {
            name: account_name.to_string(),
            owner: owner_id,
        })
}
