pub mod text;
pub mod view;

use std::io::IsTerminal;

use crate::cli::{open_session, RangeArgs, ReportMode};
use crate::error::Result;
use crate::settings::load_settings;

pub fn run(range: RangeArgs, mode: Option<ReportMode>) -> Result<()> {
    let settings = load_settings();
    let session = open_session(&settings, &range)?;

    let mode = mode.unwrap_or(if std::io::stdout().is_terminal() {
        ReportMode::View
    } else {
        ReportMode::Text
    });
    match mode {
        ReportMode::View => view::run(session, settings),
        ReportMode::Text => {
            println!("{}", text::format_report(session.bundle(), &settings.church_name));
            Ok(())
        }
    }
}
