//! Work tree discovery and `git` invocation.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::GitError;
use crate::log::{IdentityKey, LOG_FORMAT, LogEntry, parse_log};

/// How often a running fetch is polled for completion.
const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Options for reading commit history.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Read every ref (remote branches, tags) instead of local branches only.
    pub all_refs: bool,
    /// Which author field becomes the developer identity.
    pub identity: IdentityKey,
}

/// A git work tree on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepository {
    path: PathBuf,
    name: String,
}

impl GitRepository {
    /// Opens the work tree rooted at `path`.
    ///
    /// `path` must contain a `.git` entry and be accepted by `git rev-parse`.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        if !path.join(".git").exists() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }

        let output = git(path).args(["rev-parse", "--git-dir"]).output()?;
        if !output.status.success() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }

        let canonical = path.canonicalize()?;
        let name = canonical
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            path: canonical,
            name,
        })
    }

    /// Directory basename, used as the repository identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetches all remotes including tags, killing `git` after `timeout`.
    pub fn fetch(&self, timeout: Duration) -> Result<(), GitError> {
        tracing::info!(repository = %self.name, "fetching remotes");

        let child = git(&self.path)
            .args(["fetch", "--all", "--tags", "--prune", "--quiet"])
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let Some((status, stderr)) = wait_with_timeout(child, timeout)? else {
            return Err(GitError::Timeout {
                repository: self.name.clone(),
                seconds: timeout.as_secs(),
            });
        };

        if !status.success() {
            return Err(GitError::CommandFailed {
                command: "git fetch".to_string(),
                repository: self.name.clone(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        tracing::info!(repository = %self.name, "fetch complete");
        Ok(())
    }

    /// Reads every commit reachable from local branches (or all refs).
    ///
    /// A commit reachable from several branches is returned once.
    pub fn read_commits(&self, options: &LogOptions) -> Result<Vec<LogEntry>, GitError> {
        let refs = if options.all_refs { "--all" } else { "--branches" };
        let output = git(&self.path)
            .args(["-c", "log.showSignature=false", "log", refs, "--no-color", LOG_FORMAT])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("does not have any commits") {
                return Ok(Vec::new());
            }
            return Err(GitError::CommandFailed {
                command: "git log".to_string(),
                repository: self.name.clone(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_log(&self.name, &stdout, options.identity);
        tracing::debug!(repository = %self.name, commits = entries.len(), "read history");
        Ok(entries)
    }
}

/// Commits read from several repositories.
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub entries: Vec<LogEntry>,
    /// Repositories that could not be read, with the reason.
    pub failures: Vec<(String, GitError)>,
}

/// Reads all `repositories` in parallel. A failing repository does not stop
/// the others; it is reported in [`ReadOutcome::failures`].
pub fn read_all(repositories: &[GitRepository], options: &LogOptions) -> ReadOutcome {
    let results: Vec<_> = repositories
        .par_iter()
        .map(|repo| (repo.name().to_string(), repo.read_commits(options)))
        .collect();

    let mut outcome = ReadOutcome::default();
    for (name, result) in results {
        match result {
            Ok(entries) => outcome.entries.extend(entries),
            Err(e) => {
                tracing::warn!(repository = %name, error = %e, "failed to read history");
                outcome.failures.push((name, e));
            }
        }
    }
    outcome
}

/// Finds the repositories to analyze under `path`.
///
/// If `path` is itself a work tree, only it is returned. Otherwise its
/// immediate subdirectories that are work trees are returned, sorted by path.
pub fn discover_repositories(path: &Path) -> Result<Vec<GitRepository>, GitError> {
    if !path.exists() {
        return Err(GitError::NotFound(path.to_path_buf()));
    }

    if path.join(".git").exists() {
        return Ok(vec![GitRepository::open(path)?]);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();
    candidates.sort();

    let mut repositories = Vec::new();
    for candidate in candidates {
        match GitRepository::open(&candidate) {
            Ok(repo) => repositories.push(repo),
            Err(GitError::NotARepository(p)) => {
                tracing::debug!(path = %p.display(), "skipping non-repository directory");
            }
            Err(e) => {
                tracing::warn!(path = %candidate.display(), error = %e, "failed to open repository");
            }
        }
    }

    Ok(repositories)
}

/// Waits for `child` to exit, killing it once `timeout` has passed.
///
/// Stderr is drained on a separate thread while waiting, so a child that
/// writes more than the pipe buffer still exits. Returns `None` on timeout.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
) -> std::io::Result<Option<(ExitStatus, String)>> {
    let stderr = child.stderr.take();
    let reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            let stderr = reader.join().unwrap_or_default();
            return Ok(Some((status, stderr)));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            // Not joined: processes spawned by the child may still hold the pipe.
            return Ok(None);
        }
        thread::sleep(FETCH_POLL_INTERVAL);
    }
}

fn git(path: &Path) -> Command {
    let mut cmd = Command::new("git");
    // read_commits matches on English stderr.
    cmd.arg("-C").arg(path).env("LC_ALL", "C");
    cmd
}
