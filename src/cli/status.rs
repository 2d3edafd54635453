use crate::db::{count_rows, get_connection};
use crate::error::Result;
use crate::settings::load_settings;

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Church:       {}", or_unset(&settings.church_name));
    println!("Prepared by:  {}", or_unset(&settings.user_name));
    println!("Data dir:     {}", settings.data_dir);
    println!("Database:     {}", db_path.display());
    println!("Member table: {}", settings.member_table_name);

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let members = count_rows(&conn, &settings.member_table_name)?;
        let events = count_rows(&conn, "events")?;
        let tithes = count_rows(&conn, "tithes")?;
        let (first, last): (Option<String>, Option<String>) = conn.query_row(
            "SELECT min(date_paid), max(date_paid) FROM tithes",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        println!();
        println!("Members:       {members}");
        println!("Events:        {events}");
        println!("Contributions: {tithes}");
        if let (Some(first), Some(last)) = (first, last) {
            println!("Date range:    {first} to {last}");
        }
    } else {
        println!();
        println!("Database not found. Run `steward init` to set up.");
    }

    Ok(())
}
