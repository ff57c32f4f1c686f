use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Uploads:    {}", settings.upload_dir().display());
    println!("Database:   {}", db_path.display());
    println!("Time zone:  {}", settings.display_timezone);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
        };

        println!();
        println!("Users:         {}", count("users")?);
        println!("Accounts:      {}", count("accounts")?);
        println!("Transactions:  {}", count("transactions")?);
        println!("Imports:       {}", count("imports")?);
    } else {
        println!();
        println!("Database not found. Run `ekstre init` to set up.");
    }

    Ok(())
}
