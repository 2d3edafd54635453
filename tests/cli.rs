use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    config: TempDir,
    data: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            config: tempfile::tempdir().unwrap(),
            data: tempfile::tempdir().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("steward").unwrap();
        cmd.env("STEWARD_CONFIG_DIR", self.config.path());
        cmd
    }

    fn init(&self) {
        self.cmd()
            .args(["init", "--church", "Grace Fellowship", "--user", "Treasurer", "--data-dir"])
            .arg(self.data.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized steward"));
    }

    fn seeded() -> Self {
        let env = Self::new();
        env.init();
        env.cmd()
            .arg("demo")
            .assert()
            .success()
            .stdout(predicate::str::contains("Demo data loaded"));
        env
    }
}

#[test]
fn report_before_init_fails() {
    let env = Env::new();
    env.cmd()
        .args(["init", "--data-dir"])
        .arg(env.data.path().join("nested"))
        .assert()
        .success();
    std::fs::remove_file(env.data.path().join("nested").join("steward.db")).unwrap();
    env.cmd()
        .args(["report", "--mode", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn status_shows_counts_after_demo() {
    let env = Env::seeded();
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Grace Fellowship"))
        .stdout(predicate::str::contains("Members:       13"));
}

#[test]
fn demo_is_idempotent() {
    let env = Env::seeded();
    env.cmd()
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("already present"));
}

#[test]
fn text_report_for_explicit_range() {
    let env = Env::seeded();
    let today = chrono::Local::now().date_naive();
    let from = today - chrono::Days::new(90);
    env.cmd()
        .args(["report", "--mode", "text", "--from"])
        .arg(from.format("%Y-%m-%d").to_string())
        .arg("--to")
        .arg(today.format("%Y-%m-%d").to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("Tithes report:"))
        .stdout(predicate::str::contains("Communion Service"))
        .stdout(predicate::str::contains("Monthly Giving"));
}

#[test]
fn export_all_writes_every_file() {
    let env = Env::seeded();
    let out = env.data.path().join("out");
    env.cmd()
        .args(["export", "all", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("member-summary.csv"));

    for name in ["member-summary.csv", "event-summary.csv", "all-tithes.csv"] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    let members = std::fs::read_to_string(out.join("member-summary.csv")).unwrap();
    assert!(members.starts_with("Member ID,First Name,Last Name,Type"));

    let pdfs: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "pdf"))
        .collect();
    assert_eq!(pdfs.len(), 1);
}

#[test]
fn invalid_range_is_rejected() {
    let env = Env::seeded();
    env.cmd()
        .args(["export", "tithes", "--from", "2024-03-31", "--to", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn from_without_to_is_a_usage_error() {
    let env = Env::new();
    env.cmd()
        .args(["report", "--from", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--to"));
}

#[test]
fn rejects_bad_member_table_name() {
    let env = Env::new();
    env.cmd()
        .args(["init", "--member-table", "members; drop", "--data-dir"])
        .arg(env.data.path())
        .assert()
        .failure();
}
