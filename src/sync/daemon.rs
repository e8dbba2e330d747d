//! Mirror sync daemon
//!
//! One cycle re-reads the list file and, strictly in file order, clones
//! each missing mirror or fetch-and-prunes each existing one, waiting for
//! every git process before starting the next. Failures of individual
//! entries are logged and retried on the next cycle.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::thread;

use log::{error, info, warn};

use super::config::SyncConfig;
use super::git::{GitRunner, MirrorAction, SystemGit, display_args, safe_directory_args};
use super::list::{ListReader, mirror_name};

/// Counters for one pass over the list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cloned: usize,
    pub updated: usize,
    /// git exited non-zero or could not be started
    pub failed: usize,
    /// URLs with no usable mirror name
    pub skipped: usize,
}

impl CycleReport {
    /// Number of git operations attempted
    pub fn attempted(&self) -> usize {
        self.cloned + self.updated + self.failed
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cloned, {} updated, {} failed, {} skipped",
            self.cloned, self.updated, self.failed, self.skipped
        )
    }
}

/// One list entry resolved against the mirror root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub url: String,
    pub name: String,
    pub action: MirrorAction,
}

/// Result of the startup guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// List file present, trust step done
    Ready,
    /// No list file: nothing to mirror
    NothingToDo,
}

pub struct SyncDaemon<G: GitRunner> {
    config: SyncConfig,
    git: G,
}

impl SyncDaemon<SystemGit> {
    /// Daemon running the configured git executable
    pub fn with_system_git(config: SyncConfig) -> Self {
        let git = SystemGit::new(&config.git_binary);
        Self::new(config, git)
    }
}

impl<G: GitRunner> SyncDaemon<G> {
    pub fn new(config: SyncConfig, git: G) -> Self {
        Self { config, git }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    /// Check for the list file and, when present, run the one-time trust
    /// configuration. The file is not checked again after this.
    pub fn prepare(&self) -> Startup {
        if !self.config.list_file.exists() {
            info!("No repo list found at {}", self.config.list_file.display());
            return Startup::NothingToDo;
        }
        self.trust_all_directories();
        Startup::Ready
    }

    /// Mark every directory as safe for git. Failure is tolerated; git's
    /// own stderr is the only report.
    pub fn trust_all_directories(&self) {
        let args = safe_directory_args();
        match self.git.run(&args) {
            Ok(status) if !status.success() => warn!("git {} exited with {}", display_args(&args), status),
            Ok(_) => {}
            Err(e) => warn!("Failed to run {}: {}", self.config.git_binary.display(), e),
        }
    }

    /// Resolve a URL to its mirror name and the action it needs right now
    pub fn plan_entry(&self, url: &str) -> Option<PlannedEntry> {
        let Some(name) = mirror_name(url) else {
            warn!("Skipping {:?}: no usable mirror name", url);
            return None;
        };
        let target = self.config.mirror_root.join(&name);
        Some(PlannedEntry {
            url: url.to_string(),
            action: MirrorAction::for_target(url, target),
            name,
        })
    }

    /// Resolve the whole list without running git
    pub fn plan_cycle(&self) -> io::Result<Vec<PlannedEntry>> {
        let file = File::open(&self.config.list_file)?;
        let mut planned = Vec::new();
        for url in ListReader::new(BufReader::new(file)) {
            if let Some(entry) = self.plan_entry(&url?) {
                planned.push(entry);
            }
        }
        Ok(planned)
    }

    /// One pass over the list file.
    ///
    /// Returns `Err` only when the list cannot be opened. Each entry is
    /// planned just before it runs, so a repository listed twice is cloned
    /// once and then updated.
    pub fn run_cycle(&self) -> io::Result<CycleReport> {
        let file = File::open(&self.config.list_file)?;
        let mut report = CycleReport::default();

        for url in ListReader::new(BufReader::new(file)) {
            let url = match url {
                Ok(url) => url,
                Err(e) => {
                    error!("Error reading {}: {}", self.config.list_file.display(), e);
                    break;
                }
            };
            let Some(entry) = self.plan_entry(&url) else {
                report.skipped += 1;
                continue;
            };
            self.apply(&entry, &mut report);
        }

        Ok(report)
    }

    fn apply(&self, entry: &PlannedEntry, report: &mut CycleReport) {
        match entry.action {
            MirrorAction::Clone { .. } => info!("Cloning {}", entry.name),
            MirrorAction::Update { .. } => info!("Updating {}", entry.name),
        }
        match self.git.run(&entry.action.args()) {
            Ok(status) if status.success() => match entry.action {
                MirrorAction::Clone { .. } => report.cloned += 1,
                MirrorAction::Update { .. } => report.updated += 1,
            },
            Ok(status) => {
                warn!("git {} of {} exited with {}", entry.action.verb(), entry.name, status);
                report.failed += 1;
            }
            Err(e) => {
                error!("Failed to run {}: {}", self.config.git_binary.display(), e);
                report.failed += 1;
            }
        }
    }

    /// Log, run one cycle, log the outcome
    pub fn cycle(&self) -> Option<CycleReport> {
        info!("Starting cgit sync");
        match self.run_cycle() {
            Ok(report) => {
                info!("Sync finished: {}", report);
                Some(report)
            }
            Err(e) => {
                error!("Failed to open {}: {}", self.config.list_file.display(), e);
                None
            }
        }
    }

    /// Startup guard, trust step and a single cycle; no sleep
    pub fn run_once(&self) -> Option<CycleReport> {
        match self.prepare() {
            Startup::NothingToDo => None,
            Startup::Ready => self.cycle(),
        }
    }

    /// Run forever. Returns only when the list file is absent at startup.
    pub fn run(&self) {
        if self.prepare() == Startup::NothingToDo {
            return;
        }
        loop {
            self.cycle();
            info!("Sleeping for {} seconds...", self.config.interval.as_secs());
            thread::sleep(self.config.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::os::unix::process::ExitStatusExt;
    use std::path::{Path, PathBuf};
    use std::process::ExitStatus;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Records every invocation; clones create the target directory
    #[derive(Default)]
    struct RecordingGit {
        calls: RefCell<Vec<Vec<String>>>,
        fail_with: Option<i32>,
    }

    impl RecordingGit {
        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }

        fn mirror_calls(&self) -> Vec<Vec<String>> {
            self.calls().into_iter().filter(|c| c[0] != "config").collect()
        }
    }

    impl GitRunner for RecordingGit {
        fn run(&self, args: &[OsString]) -> io::Result<ExitStatus> {
            let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
            if let Some(code) = self.fail_with {
                self.calls.borrow_mut().push(args);
                return Ok(ExitStatus::from_raw(code << 8));
            }
            if args[0] == "clone" {
                std::fs::create_dir_all(&args[4])?;
            }
            self.calls.borrow_mut().push(args);
            Ok(ExitStatus::from_raw(0))
        }
    }

    struct Fixture {
        temp: TempDir,
    }

    impl Fixture {
        fn new(list: &str) -> Self {
            let temp = TempDir::new().unwrap();
            std::fs::create_dir(temp.path().join("git")).unwrap();
            std::fs::write(temp.path().join("repos.list"), list).unwrap();
            Self { temp }
        }

        fn root(&self) -> PathBuf {
            self.temp.path().join("git")
        }

        fn list(&self) -> PathBuf {
            self.temp.path().join("repos.list")
        }

        fn config(&self) -> SyncConfig {
            SyncConfig {
                list_file: self.list(),
                mirror_root: self.root(),
                interval: Duration::from_secs(1),
                git_binary: PathBuf::from("/bin/git"),
            }
        }

        fn daemon(&self, git: RecordingGit) -> SyncDaemon<RecordingGit> {
            SyncDaemon::new(self.config(), git)
        }
    }

    fn target(root: &Path, name: &str) -> String {
        root.join(name).display().to_string()
    }

    #[test]
    fn test_comments_only_invokes_no_git() {
        let fx = Fixture::new("# nothing here\n\n# still nothing\n");
        let daemon = fx.daemon(RecordingGit::default());
        let report = daemon.run_cycle().unwrap();
        assert_eq!(report, CycleReport::default());
        assert!(daemon.git().calls().is_empty());
    }

    #[test]
    fn test_empty_list_is_noop_cycle() {
        let fx = Fixture::new("");
        let daemon = fx.daemon(RecordingGit::default());
        assert_eq!(daemon.run_cycle().unwrap().attempted(), 0);
    }

    #[test]
    fn test_missing_mirror_is_cloned() {
        let fx = Fixture::new("https://example.org/foo.git\n");
        let daemon = fx.daemon(RecordingGit::default());
        let report = daemon.run_cycle().unwrap();
        assert_eq!(report.cloned, 1);
        assert_eq!(
            daemon.git().calls(),
            vec![vec![
                "clone".to_string(),
                "-4".to_string(),
                "--mirror".to_string(),
                "https://example.org/foo.git".to_string(),
                target(&fx.root(), "foo"),
            ]]
        );
    }

    #[test]
    fn test_existing_mirror_is_updated() {
        let fx = Fixture::new("https://example.org/bar\n");
        std::fs::create_dir(fx.root().join("bar")).unwrap();
        let daemon = fx.daemon(RecordingGit::default());
        let report = daemon.run_cycle().unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.cloned, 0);
        assert_eq!(
            daemon.git().calls(),
            vec![vec![
                "-C".to_string(),
                target(&fx.root(), "bar"),
                "remote".to_string(),
                "update".to_string(),
                "--prune".to_string(),
            ]]
        );
    }

    #[test]
    fn test_second_cycle_updates_instead_of_cloning() {
        let fx = Fixture::new("https://example.org/foo.git\nhttps://example.org/bar\n");
        let daemon = fx.daemon(RecordingGit::default());

        let first = daemon.run_cycle().unwrap();
        assert_eq!((first.cloned, first.updated), (2, 0));

        let second = daemon.run_cycle().unwrap();
        assert_eq!((second.cloned, second.updated), (0, 2));

        let verbs: Vec<String> = daemon.git().calls().iter().map(|c| c[0].clone()).collect();
        assert_eq!(verbs, vec!["clone", "clone", "-C", "-C"]);
    }

    #[test]
    fn test_entries_processed_in_file_order() {
        let fx = Fixture::new("https://e.org/c.git\nhttps://e.org/a.git\nhttps://e.org/b.git\n");
        let daemon = fx.daemon(RecordingGit::default());
        daemon.run_cycle().unwrap();
        let targets: Vec<String> = daemon.git().calls().iter().map(|c| c[4].clone()).collect();
        assert_eq!(
            targets,
            vec![target(&fx.root(), "c"), target(&fx.root(), "a"), target(&fx.root(), "b")]
        );
    }

    #[test]
    fn test_duplicate_entry_cloned_then_updated() {
        let fx = Fixture::new("https://e.org/dup.git\nhttps://mirror.e.org/dup\n");
        let daemon = fx.daemon(RecordingGit::default());
        let report = daemon.run_cycle().unwrap();
        assert_eq!((report.cloned, report.updated), (1, 1));
    }

    #[test]
    fn test_failures_do_not_stop_the_cycle() {
        let fx = Fixture::new("https://e.org/a.git\nhttps://e.org/b.git\n");
        let git = RecordingGit {
            fail_with: Some(128),
            ..Default::default()
        };
        let daemon = fx.daemon(git);
        let report = daemon.run_cycle().unwrap();
        assert_eq!(report.failed, 2);
        assert_eq!(daemon.git().calls().len(), 2);
    }

    #[test]
    fn test_unusable_name_is_skipped() {
        let fx = Fixture::new("https://e.org/.git\nhttps://e.org/ok.git\n");
        let daemon = fx.daemon(RecordingGit::default());
        let report = daemon.run_cycle().unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.cloned, 1);
    }

    #[test]
    fn test_missing_list_is_open_error() {
        let fx = Fixture::new("");
        std::fs::remove_file(fx.list()).unwrap();
        let daemon = fx.daemon(RecordingGit::default());
        assert!(daemon.run_cycle().is_err());
        assert!(daemon.cycle().is_none());
    }

    #[test]
    fn test_prepare_without_list_does_nothing() {
        let fx = Fixture::new("");
        std::fs::remove_file(fx.list()).unwrap();
        let daemon = fx.daemon(RecordingGit::default());
        assert_eq!(daemon.prepare(), Startup::NothingToDo);
        assert!(daemon.run_once().is_none());
        // run() must return instead of looping or sleeping
        daemon.run();
        assert!(daemon.git().calls().is_empty());
    }

    #[test]
    fn test_prepare_runs_trust_step_once_before_mirroring() {
        let fx = Fixture::new("https://e.org/a.git\n");
        let daemon = fx.daemon(RecordingGit::default());
        let report = daemon.run_once().unwrap();
        assert_eq!(report.cloned, 1);

        let calls = daemon.git().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec!["config", "--global", "--add", "safe.directory", "*"]);
        assert_eq!(calls[1][0], "clone");
        assert_eq!(daemon.git().mirror_calls().len(), 1);
    }

    #[test]
    fn test_trust_step_failure_is_tolerated() {
        let fx = Fixture::new("https://e.org/a.git\n");
        let git = RecordingGit {
            fail_with: Some(1),
            ..Default::default()
        };
        let daemon = fx.daemon(git);
        assert_eq!(daemon.prepare(), Startup::Ready);
    }

    #[test]
    fn test_plan_cycle_does_not_run_git() {
        let fx = Fixture::new("https://e.org/new.git\nhttps://e.org/old.git\n# off\n");
        std::fs::create_dir(fx.root().join("old")).unwrap();
        let daemon = fx.daemon(RecordingGit::default());

        let planned = daemon.plan_cycle().unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].name, "new");
        assert_eq!(planned[0].action.verb(), "clone");
        assert_eq!(planned[1].name, "old");
        assert_eq!(planned[1].action.verb(), "update");
        assert!(daemon.git().calls().is_empty());
    }

    #[test]
    fn test_cycle_report_display() {
        let report = CycleReport {
            cloned: 1,
            updated: 2,
            failed: 3,
            skipped: 4,
        };
        assert_eq!(report.to_string(), "1 cloned, 2 updated, 3 failed, 4 skipped");
        assert_eq!(report.attempted(), 6);
    }
}
