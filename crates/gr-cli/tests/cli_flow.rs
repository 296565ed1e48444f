//! End-to-end tests driving the `git-report` binary.
//!
//! Repositories are built with fixed commit dates in a temp directory. Tests
//! that need `git` return early when it is not installed.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn git_report_binary() -> String {
    env!("CARGO_BIN_EXE_git-report").to_string()
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn run_git(dir: &Path, args: &[&str], envs: &[(&str, &str)]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("HOME", dir)
        .envs(envs.iter().copied())
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn commit(dir: &Path, author: &str, date: &str, message: &str) {
    let email = format!("{}@example.com", author.to_lowercase());
    run_git(
        dir,
        &["-c", "commit.gpgsign=false", "commit", "--quiet", "--allow-empty", "-m", message],
        &[
            ("GIT_AUTHOR_NAME", author),
            ("GIT_AUTHOR_EMAIL", email.as_str()),
            ("GIT_AUTHOR_DATE", date),
            ("GIT_COMMITTER_NAME", author),
            ("GIT_COMMITTER_EMAIL", email.as_str()),
            ("GIT_COMMITTER_DATE", date),
        ],
    );
}

/// Builds `repos/api` and `repos/web` plus an externals file excluding Zed.
fn setup_workspace(temp: &Path) {
    let api = temp.join("repos/api");
    std::fs::create_dir_all(&api).unwrap();
    run_git(&api, &["init", "--quiet"], &[]);
    commit(&api, "Ana", "2025-01-29T09:00:00Z", "Fix ABC-12 bug");
    commit(&api, "Ana", "2025-01-29T09:30:00Z", "abc-12 followup");
    commit(&api, "Ana", "2025-01-29T10:00:00Z", "refactor");
    commit(&api, "Ana", "2025-01-29T14:00:00Z", "XY-3 start");
    commit(&api, "Ben", "2025-01-29T09:30:00Z", "ABC-12 review");
    commit(&api, "Zed", "2025-01-29T11:00:00Z", "ABC-12 contractor fix");

    let web = temp.join("repos/web");
    std::fs::create_dir_all(&web).unwrap();
    run_git(&web, &["init", "--quiet"], &[]);
    commit(&web, "Carla", "2025-01-30T10:00:00Z", "WEB-7 layout");
    commit(&web, "Carla", "2025-01-30T11:00:00Z", "WEB-7 polish");

    std::fs::create_dir(temp.join("repos/notes")).unwrap();
    std::fs::write(temp.join("externals.txt"), "# contractors\nzed\n").unwrap();
}

/// Runs git-report in `temp` with an isolated config directory.
fn git_report(temp: &Path, args: &[&str]) -> Output {
    Command::new(git_report_binary())
        .current_dir(temp)
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join(".config"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run git-report")
}

#[test]
fn test_terminal_summary_report() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());

    let output = git_report(temp.path(), &["repos"]);
    assert!(
        output.status.success(),
        "git-report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("REPOSITORY: api"));
    assert!(stdout.contains("REPOSITORY: web"));
    assert!(!stdout.contains("notes"));
    assert!(stdout.contains("  Total hours:   3.00"));
    assert!(stdout.contains("Excluded 1 commit(s) by external authors"));
}

#[test]
fn test_csv_detailed_report() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());

    let output = git_report(
        temp.path(),
        &["-t", "detailed", "-o", "csv", "--csv-file", "out.csv", "repos"],
    );
    assert!(
        output.status.success(),
        "git-report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("Report saved to out.csv"));
    assert!(output.stdout.is_empty());

    let csv = std::fs::read_to_string(temp.path().join("out.csv")).unwrap();
    let csv = csv.strip_prefix('\u{feff}').expect("CSV should start with a BOM");
    let lines: Vec<&str> = csv.lines().collect();

    assert!(lines[0].starts_with("Repository,Developer,Hours"));
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("api,Ana,1.50,2,2,"));
    assert!(lines[2].starts_with("api,Ben,0.50,1,1,"));
    assert!(lines[3].starts_with("web,Carla,1.00,1,1,"));
    assert!(!csv.contains("Zed"));
}

#[test]
fn test_json_tasks_report() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());

    let output = git_report(temp.path(), &["-t", "tasks", "-o", "json", "repos"]);
    assert!(
        output.status.success(),
        "git-report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["report_type"], "tasks");
    assert_eq!(value["totals"]["repository_count"], 2);
    assert_eq!(value["totals"]["unique_task_count"], 3);
    assert_eq!(value["repositories"]["api"]["tasks"]["ABC-12"]["commit_count"], 3);
    assert_eq!(value["diagnostics"]["excluded_commits"], 1);
}

#[test]
fn test_date_range_filters_commits() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());

    let output = git_report(
        temp.path(),
        &["-o", "json", "--since", "2025-01-30", "--until", "2025-01-30", "repos"],
    );
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["totals"]["repository_count"], 1);
    assert!(value["repositories"]["web"].is_object());
    assert_eq!(value["diagnostics"]["out_of_range_commits"], 6);
}

#[test]
fn test_config_file_sets_gap_threshold() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());
    std::fs::write(temp.path().join("report.toml"), "gap_threshold_minutes = 300\n").unwrap();

    let output = git_report(
        temp.path(),
        &["-c", "report.toml", "-t", "detailed", "-o", "json", "repos"],
    );
    assert!(output.status.success());

    // A five-hour gap joins Ana's 10:00 and 14:00 commits into one session.
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["repositories"]["api"]["developers"]["Ana"]["session_count"], 1);
    assert_eq!(value["repositories"]["api"]["developers"]["Ana"]["total_hours"], 5.0);
}

#[test]
fn test_invalid_task_pattern_fails_fast() {
    let temp = TempDir::new().unwrap();

    let output = git_report(temp.path(), &["--task-pattern", "([A-Z]+", "does-not-exist"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid task pattern"), "stderr: {stderr}");
}

#[test]
fn test_inverted_date_range_fails() {
    let temp = TempDir::new().unwrap();

    let output = git_report(
        temp.path(),
        &["--since", "2025-02-01", "--until", "2025-01-01", "."],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid date range"), "stderr: {stderr}");
}

#[test]
fn test_missing_path_fails() {
    let temp = TempDir::new().unwrap();

    let output = git_report(temp.path(), &["does-not-exist"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("path does not exist"), "stderr: {stderr}");
}

#[test]
fn test_identity_email_still_honors_name_externals() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());

    let output = git_report(
        temp.path(),
        &["--identity", "email", "-t", "detailed", "-o", "json", "repos"],
    );
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let developers = &value["repositories"]["api"]["developers"];
    assert!(developers["ana@example.com"].is_object());
    assert!(developers["zed@example.com"].is_null());
    assert_eq!(value["diagnostics"]["excluded_commits"], 1);
}

#[test]
fn test_unreadable_repository_is_warned_once() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());

    // Dropping the only commit object leaves a repository git can open but not log.
    let broken = temp.path().join("repos/broken");
    std::fs::create_dir_all(&broken).unwrap();
    run_git(&broken, &["init", "--quiet"], &[]);
    commit(&broken, "Ana", "2025-01-29T09:00:00Z", "lost");
    let head = Command::new("git")
        .arg("-C")
        .arg(&broken)
        .args(["rev-parse", "HEAD"])
        .output()
        .unwrap();
    let head = String::from_utf8(head.stdout).unwrap();
    let head = head.trim();
    std::fs::remove_file(broken.join(".git/objects").join(&head[..2]).join(&head[2..])).unwrap();

    let output = git_report(temp.path(), &["repos"]);
    assert!(
        output.status.success(),
        "git-report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("failed to read history").count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("broken"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("REPOSITORY: api"));
}

#[test]
fn test_failed_update_is_warned_and_report_continues() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    setup_workspace(temp.path());
    let missing = temp.path().join("gone.git");
    run_git(
        &temp.path().join("repos/api"),
        &["remote", "add", "origin", missing.to_str().unwrap()],
        &[],
    );

    let output = git_report(temp.path(), &["-u", "--timeout", "60", "repos"]);
    assert!(
        output.status.success(),
        "git-report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("failed to update repository").count(), 1, "stderr: {stderr}");
    assert!(!stderr.contains("Warning:"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("REPOSITORY: api"));
}
