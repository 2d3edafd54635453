use rusqlite::Connection;

use crate::db::validate_table_name;
use crate::error::Result;
use crate::models::{ContributionRecord, DateRange, EventRecord, MemberRecord};

/// Everything the report engine needs from the backing store.
pub trait DataSource {
    fn fetch_contributions(&self, range: &DateRange) -> Result<Vec<ContributionRecord>>;
    fn fetch_members(&self) -> Result<Vec<MemberRecord>>;
    fn fetch_events(&self) -> Result<Vec<EventRecord>>;
}

pub struct SqliteSource {
    conn: Connection,
    member_table: String,
}

impl SqliteSource {
    pub fn new(conn: Connection, member_table: &str) -> Result<Self> {
        validate_table_name(member_table)?;
        Ok(Self {
            conn,
            member_table: member_table.to_string(),
        })
    }
}

impl DataSource for SqliteSource {
    fn fetch_contributions(&self, range: &DateRange) -> Result<Vec<ContributionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, member_id, event_id, date_paid, amount, notes FROM tithes \
             WHERE date_paid BETWEEN ?1 AND ?2 ORDER BY date_paid, id",
        )?;
        // Upper bound is padded so timestamp-style values on the last day match.
        let start = range.start.format("%Y-%m-%d").to_string();
        let end = format!("{}~", range.end.format("%Y-%m-%d"));
        let rows = stmt
            .query_map([start, end], |row| {
                Ok(ContributionRecord {
                    id: row.get(0)?,
                    member_id: row.get(1)?,
                    event_id: row.get(2)?,
                    date_paid: row.get(3)?,
                    amount: row.get(4)?,
                    notes: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn fetch_members(&self) -> Result<Vec<MemberRecord>> {
        let sql = format!(
            "SELECT id, first_name, last_name, email, COALESCE(type, '') FROM {} ORDER BY id",
            self.member_table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MemberRecord {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    email: row.get(3)?,
                    member_type: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn fetch_events(&self) -> Result<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, event_type, start_date, location FROM events ORDER BY start_date, event_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EventRecord {
                    event_id: row.get(0)?,
                    event_type: row.get(1)?,
                    start_date: row.get(2)?,
                    location: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// In-memory source for tests. Any fetch named in `fail` returns an error.
#[cfg(test)]
#[derive(Default, Clone)]
pub(crate) struct MemorySource {
    pub contributions: Vec<ContributionRecord>,
    pub members: Vec<MemberRecord>,
    pub events: Vec<EventRecord>,
    pub fail: Vec<&'static str>,
}

#[cfg(test)]
impl DataSource for MemorySource {
    fn fetch_contributions(&self, range: &DateRange) -> Result<Vec<ContributionRecord>> {
        if self.fail.contains(&"contributions") {
            return Err(crate::error::StewardError::Other("connection reset".into()));
        }
        Ok(self
            .contributions
            .iter()
            .filter(|c| c.paid_on().is_some_and(|d| range.contains(d)))
            .cloned()
            .collect())
    }

    fn fetch_members(&self) -> Result<Vec<MemberRecord>> {
        if self.fail.contains(&"members") {
            return Err(crate::error::StewardError::Other("permission denied".into()));
        }
        Ok(self.members.clone())
    }

    fn fetch_events(&self) -> Result<Vec<EventRecord>> {
        if self.fail.contains(&"events") {
            return Err(crate::error::StewardError::Other("timeout".into()));
        }
        Ok(self.events.clone())
    }
}
