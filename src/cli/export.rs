use std::path::{Path, PathBuf};

use crate::cli::{open_session, RangeArgs};
use crate::csv_export::CsvKind;
use crate::error::Result;
use crate::reports::ReportBundle;
use crate::settings::{load_settings, Settings};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Render the PDF for `bundle`. Without `output` it lands in the exports
/// directory, named after today's date.
#[cfg(feature = "pdf")]
pub(crate) fn write_pdf(bundle: &ReportBundle, settings: &Settings, output: Option<&Path>) -> Result<PathBuf> {
    use crate::chart::VectorCapture;
    use crate::pdf::{report_file_name, save_report, DocumentInfo};

    let generated = bundle.windows.today;
    let path = match output {
        Some(p) => p.to_path_buf(),
        None => settings.exports_dir().join(report_file_name(generated)),
    };
    ensure_parent(&path)?;
    let info = DocumentInfo {
        church_name: &settings.church_name,
        prepared_by: &settings.user_name,
        generated,
    };
    save_report(bundle, &info, &mut VectorCapture, &path)?;
    Ok(path)
}

fn write_csv(kind: CsvKind, bundle: &ReportBundle, settings: &Settings, output: Option<&Path>) -> Result<PathBuf> {
    let path = match output {
        Some(p) => p.to_path_buf(),
        None => settings.exports_dir().join(kind.file_name()),
    };
    ensure_parent(&path)?;
    kind.save(bundle, &path)?;
    Ok(path)
}

#[cfg(feature = "pdf")]
pub fn pdf(range: RangeArgs, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let session = open_session(&settings, &range)?;
    let path = write_pdf(session.bundle(), &settings, output.as_deref().map(Path::new))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn csv(kind: CsvKind, range: RangeArgs, output: Option<String>) -> Result<()> {
    let settings = load_settings();
    let session = open_session(&settings, &range)?;
    let path = write_csv(kind, session.bundle(), &settings, output.as_deref().map(Path::new))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Every export for one range into `output_dir`. The report is computed once.
pub fn all(range: RangeArgs, output_dir: Option<String>) -> Result<()> {
    let settings = load_settings();
    let session = open_session(&settings, &range)?;
    let dir = output_dir.map(PathBuf::from).unwrap_or_else(|| settings.exports_dir());
    let written = write_all(session.bundle(), &settings, &dir)?;
    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn write_all(bundle: &ReportBundle, settings: &Settings, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    #[cfg(feature = "pdf")]
    {
        let name = crate::pdf::report_file_name(bundle.windows.today);
        written.push(write_pdf(bundle, settings, Some(&dir.join(name)))?);
    }
    for kind in CsvKind::ALL {
        written.push(write_csv(kind, bundle, settings, Some(&dir.join(kind.file_name())))?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::sample_bundle;

    fn settings(dir: &Path) -> Settings {
        Settings {
            data_dir: dir.to_string_lossy().to_string(),
            church_name: "Grace Fellowship".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_csv_defaults_to_exports_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(CsvKind::EventSummary, &sample_bundle(), &settings(dir.path()), None).unwrap();
        assert_eq!(path, dir.path().join("exports").join("event-summary.csv"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Event ID,"));
    }

    #[test]
    fn test_write_all() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let written = write_all(&sample_bundle(), &settings(dir.path()), &out).unwrap();
        let expected = if cfg!(feature = "pdf") { 4 } else { 3 };
        assert_eq!(written.len(), expected);
        assert!(out.join("member-summary.csv").exists());
        assert!(out.join("all-tithes.csv").exists());
        assert!(written.iter().all(|p| p.starts_with(&out)));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_pdf_named_after_today() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = sample_bundle();
        let path = write_pdf(&bundle, &settings(dir.path()), None).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            crate::pdf::report_file_name(bundle.windows.today)
        );
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
