use std::path::PathBuf;

use crate::db::{get_connection, init_db, validate_table_name};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path, Settings};

pub fn run(
    data_dir: Option<String>,
    church: Option<String>,
    member_table: Option<String>,
    user: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    let defaults = Settings::default();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    } else if settings.data_dir == defaults.data_dir && settings.church_name.is_empty() {
        // First run: prompt for data dir
        println!("Data directory [{}]: ", settings.data_dir);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
        let chosen = input.trim();
        if !chosen.is_empty() {
            settings.data_dir = shellexpand_path(chosen);
        }
    }
    if let Some(name) = church {
        settings.church_name = name;
    }
    if let Some(name) = user {
        settings.user_name = name;
    }
    if let Some(table) = member_table {
        validate_table_name(&table)?;
        settings.member_table_name = table;
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(settings.exports_dir())?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn, &settings.member_table_name)?;

    log::info!("initialized schema with member table {}", settings.member_table_name);
    println!("Initialized steward at {}", resolved.display());
    Ok(())
}
