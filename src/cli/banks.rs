use comfy_table::Table;

use crate::error::Result;
use crate::importer::BankFormat;

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Bank", "File type"]);
    for format in BankFormat::all() {
        table.add_row(vec![format.key(), format.name(), format.file_type()]);
    }
    println!("Supported banks\n{table}");
    Ok(())
}
