use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use rusqlite::Connection;

use crate::db::{count_rows, get_connection, init_db, insert_event, insert_member, insert_tithe};
use crate::error::{Result, StewardError};
use crate::range::first_of_month;
use crate::settings::load_settings;

const MONTHS: u32 = 18;

struct DemoMember {
    first: &'static str,
    last: &'static str,
    member_type: &'static str,
    /// Weekly base gift; zero for members who only give at special events.
    weekly: f64,
    /// Gives on every n-th Sunday.
    every: u32,
}

const MEMBERS: &[DemoMember] = &[
    DemoMember { first: "Ruth", last: "Abernathy", member_type: "Member", weekly: 120.0, every: 1 },
    DemoMember { first: "Samuel", last: "Okafor", member_type: "Member", weekly: 95.0, every: 1 },
    DemoMember { first: "Grace", last: "Lindqvist", member_type: "Member", weekly: 210.0, every: 2 },
    DemoMember { first: "Daniel", last: "Reyes", member_type: "Member", weekly: 60.0, every: 1 },
    DemoMember { first: "Esther", last: "Nakamura", member_type: "Member", weekly: 400.0, every: 4 },
    DemoMember { first: "Joseph", last: "Mensah", member_type: "Member", weekly: 45.0, every: 2 },
    DemoMember { first: "Miriam", last: "Castillo", member_type: "Member", weekly: 75.0, every: 1 },
    DemoMember { first: "Caleb", last: "Hartman", member_type: "Member", weekly: 150.0, every: 4 },
    DemoMember { first: "Lydia", last: "Park", member_type: "Member", weekly: 35.0, every: 2 },
    DemoMember { first: "Tobias", last: "Fischer", member_type: "Visitor", weekly: 0.0, every: 0 },
    DemoMember { first: "Naomi", last: "Adeyemi", member_type: "Visitor", weekly: 20.0, every: 8 },
    DemoMember { first: "Silas", last: "Brennan", member_type: "Visitor", weekly: 0.0, every: 0 },
    DemoMember { first: "Priscilla", last: "Vance", member_type: "Staff", weekly: 50.0, every: 2 },
];

/// Special events cycled through the year, one per month.
const SPECIAL_EVENTS: &[(&str, &str)] = &[
    ("Mission Sunday", "Sanctuary"),
    ("Building Fund Drive", "Fellowship Hall"),
    ("Harvest Festival", "Church Grounds"),
    ("Youth Camp Offering", "Fellowship Hall"),
    ("Christmas Service", "Sanctuary"),
    ("Easter Service", "Sanctuary"),
];

pub(crate) struct DemoEvent {
    pub event_type: &'static str,
    pub date: NaiveDate,
    pub location: &'static str,
}

pub(crate) struct DemoTithe {
    pub member: usize,
    pub event: Option<usize>,
    pub date: NaiveDate,
    pub amount: f64,
    pub notes: Option<&'static str>,
}

fn sundays(month_start: NaiveDate) -> Vec<NaiveDate> {
    let offset = (7 - month_start.weekday().num_days_from_sunday()) % 7;
    let mut day = month_start + Days::new(offset as u64);
    let mut out = Vec::new();
    while day.month() == month_start.month() {
        out.push(day);
        day = day + Days::new(7);
    }
    out
}

fn cents(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

/// Events and contributions for the 18 months ending with `today`'s month.
/// Nothing is dated after `today`.
pub(crate) fn generate(today: NaiveDate) -> Result<(Vec<DemoEvent>, Vec<DemoTithe>)> {
    let this_month = first_of_month(today);
    let mut events = Vec::new();
    let mut tithes = Vec::new();

    for i in 0..MONTHS {
        let month_start = this_month
            .checked_sub_months(Months::new(MONTHS - 1 - i))
            .ok_or_else(|| StewardError::InvalidDate(today.to_string()))?;
        let idx = i as usize;
        let sundays = sundays(month_start);

        // First Sunday is a communion service; the third hosts the month's special event.
        let service = events.len();
        events.push(DemoEvent { event_type: "Communion Service", date: sundays[0], location: "Sanctuary" });
        let special_day = sundays[2.min(sundays.len() - 1)];
        let (special_name, special_loc) = SPECIAL_EVENTS[idx % SPECIAL_EVENTS.len()];
        let special = events.len();
        events.push(DemoEvent { event_type: special_name, date: special_day, location: special_loc });

        for (n, sunday) in sundays.iter().enumerate() {
            let week = idx * 5 + n;
            for (m, member) in MEMBERS.iter().enumerate() {
                if member.every == 0 || (week + m) % member.every as usize != 0 {
                    continue;
                }
                let vary = 1.0 + (((week * 7 + m * 3) % 9) as f64 - 4.0) * 0.025;
                let event = match n {
                    0 => Some(service),
                    2 => Some(special),
                    _ => None,
                };
                tithes.push(DemoTithe {
                    member: m,
                    event,
                    date: *sunday,
                    amount: cents(member.weekly * member.every as f64 * vary),
                    notes: None,
                });
            }
        }

        // Special-event offerings from everyone, including occasional visitors.
        for (m, _) in MEMBERS.iter().enumerate() {
            if (idx + m) % 3 != 0 {
                continue;
            }
            tithes.push(DemoTithe {
                member: m,
                event: Some(special),
                date: special_day,
                amount: cents(25.0 + ((idx * 11 + m * 17) % 10) as f64 * 12.5),
                notes: Some("special offering"),
            });
        }

        // A Wednesday online gift mid-month keeps the weekday chart interesting.
        let wednesday = month_start + Days::new(((Weekday::Wed.num_days_from_sunday() + 7
            - month_start.weekday().num_days_from_sunday())
            % 7
            + 7) as u64);
        tithes.push(DemoTithe {
            member: idx % MEMBERS.len(),
            event: None,
            date: wednesday,
            amount: cents(40.0 + (idx % 4) as f64 * 15.0),
            notes: Some("online"),
        });
    }

    // Later events in the current month stay on the calendar; only their gifts are dropped.
    tithes.retain(|t| t.date <= today);
    Ok((events, tithes))
}

fn insert_demo_data(conn: &Connection, member_table: &str, today: NaiveDate) -> Result<(usize, usize, usize)> {
    let (events, tithes) = generate(today)?;

    let mut member_ids = Vec::with_capacity(MEMBERS.len());
    for m in MEMBERS {
        let email = format!("{}.{}@example.org", m.first.to_lowercase(), m.last.to_lowercase());
        member_ids.push(insert_member(conn, member_table, m.first, m.last, Some(&email), m.member_type)?);
    }

    let mut event_ids = Vec::with_capacity(events.len());
    for e in &events {
        let date = e.date.format("%Y-%m-%d").to_string();
        event_ids.push(insert_event(conn, e.event_type, &date, Some(e.location))?);
    }

    for t in &tithes {
        let date = t.date.format("%Y-%m-%d").to_string();
        insert_tithe(
            conn,
            member_ids[t.member],
            t.event.map(|e| event_ids[e]),
            &date,
            t.amount,
            t.notes,
        )?;
    }

    Ok((member_ids.len(), event_ids.len(), tithes.len()))
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    if !db_path.exists() {
        return Err(StewardError::Settings("no database found. Run `steward init` first.".into()));
    }

    let conn = get_connection(&db_path)?;
    init_db(&conn, &settings.member_table_name)?;

    // Idempotency guard
    if count_rows(&conn, "tithes")? > 0 {
        println!("Contributions already present; demo data not loaded.");
        return Ok(());
    }

    let (members, events, tithes) = insert_demo_data(&conn, &settings.member_table_name, crate::cli::today())?;
    log::info!("seeded {members} members, {events} events, {tithes} contributions");

    println!("Demo data loaded!");
    println!("  Members:       {members}");
    println!("  Events:        {events}");
    println!("  Contributions: {tithes}");
    println!();
    println!("Try these next:");
    println!("  steward report");
    println!("  steward report --from {} --to {}", first_of_month(crate::cli::today()), crate::cli::today());
    println!("  steward export all");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    #[test]
    fn test_sundays() {
        let june = sundays(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(june.len(), 5);
        assert_eq!(june[0], NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert!(june.iter().all(|d| d.weekday() == Weekday::Sun));
    }

    #[test]
    fn test_generate_spans_18_months() {
        let (events, tithes) = generate(today()).unwrap();
        assert_eq!(events.len(), 36);
        let min = tithes.iter().map(|t| t.date).min().unwrap();
        let max = tithes.iter().map(|t| t.date).max().unwrap();
        assert_eq!(first_of_month(min), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert!(max <= today());
        assert!(tithes.iter().all(|t| t.amount > 0.0));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let (_, a) = generate(today()).unwrap();
        let (_, b) = generate(today()).unwrap();
        assert_eq!(a.len(), b.len());
        let total_a: f64 = a.iter().map(|t| t.amount).sum();
        let total_b: f64 = b.iter().map(|t| t.amount).sum();
        assert_eq!(total_a, total_b);
    }

    #[test]
    fn test_wednesday_gift_falls_on_wednesday() {
        let (_, tithes) = generate(today()).unwrap();
        let online: Vec<_> = tithes.iter().filter(|t| t.notes == Some("online")).collect();
        assert!(!online.is_empty());
        assert!(online.iter().all(|t| t.date.weekday() == Weekday::Wed));
    }

    #[test]
    fn test_insert_demo_data() {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn, "members").unwrap();
        let (members, events, tithes) = insert_demo_data(&conn, "members", today()).unwrap();
        assert_eq!(members, MEMBERS.len());
        assert_eq!(count_rows(&conn, "members").unwrap(), members as i64);
        assert_eq!(count_rows(&conn, "events").unwrap(), events as i64);
        assert_eq!(count_rows(&conn, "tithes").unwrap(), tithes as i64);
    }
}
