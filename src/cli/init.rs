use crate::cli::expand_data_dir;
use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let resolved = expand_data_dir(data_dir);
    std::fs::create_dir_all(&resolved)?;

    let mut settings = load_settings();
    settings.data_dir = resolved.to_string_lossy().to_string();
    std::fs::create_dir_all(settings.upload_dir())?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;
    save_settings(&settings)?;

    println!("Initialized ekstre at {}", resolved.display());
    Ok(())
}
