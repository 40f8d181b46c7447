use std::path::{Path, PathBuf};

/// Outcome of a stale-log sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub scanned: usize,
    pub deleted: Vec<PathBuf>,
    pub kept: Vec<PathBuf>,
    pub errors: usize,
}

impl CleanupStats {
    /// Folds the result of sweeping another directory into this one.
    pub fn merge(&mut self, other: CleanupStats) {
        self.scanned += other.scanned;
        self.deleted.extend(other.deleted);
        self.kept.extend(other.kept);
        self.errors += other.errors;
    }
}

/// Deletes `codeagent.<pid>.log` files in `dir` whose process is gone.
///
/// Our own log is always kept. Files that do not follow the naming scheme
/// are not counted.
pub fn cleanup_logs<F>(dir: &Path, is_alive: F) -> std::io::Result<CleanupStats>
where
    F: Fn(u32) -> bool,
{
    let mut stats = CleanupStats::default();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stats),
        Err(e) => return Err(e),
    };

    let own_pid = std::process::id();
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    for path in paths {
        let Some(pid) = log_pid(&path) else {
            continue;
        };
        stats.scanned += 1;

        if pid == own_pid || is_alive(pid) {
            stats.kept.push(path);
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => stats.deleted.push(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to delete stale log");
                stats.errors += 1;
            }
        }
    }
    Ok(stats)
}

fn log_pid(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("codeagent.")?
        .strip_suffix(".log")?
        .parse()
        .ok()
}

#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    true
}

pub fn print_stats(stats: &CleanupStats) {
    println!("Cleanup completed");
    println!("Files scanned: {}", stats.scanned);
    println!("Files deleted: {}", stats.deleted.len());
    for path in &stats.deleted {
        println!("  - {}", path.display());
    }
    println!("Files kept: {}", stats.kept.len());
    for path in &stats.kept {
        println!("  - {}", path.display());
    }
    if stats.errors > 0 {
        println!("Deletion errors: {}", stats.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn deletes_logs_of_dead_processes_only() {
        let dir = TempDir::new().unwrap();
        let dead = touch(&dir, "codeagent.100.log");
        let alive = touch(&dir, "codeagent.200.log");
        let other = touch(&dir, "notes.txt");

        let stats = cleanup_logs(dir.path(), |pid| pid == 200).unwrap();

        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.deleted, vec![dead.clone()]);
        assert_eq!(stats.kept, vec![alive.clone()]);
        assert!(!dead.exists());
        assert!(alive.exists());
        assert!(other.exists());
    }

    #[test]
    fn own_log_is_kept() {
        let dir = TempDir::new().unwrap();
        let own = touch(&dir, &format!("codeagent.{}.log", std::process::id()));

        let stats = cleanup_logs(dir.path(), |_| false).unwrap();

        assert_eq!(stats.kept, vec![own]);
        assert!(stats.deleted.is_empty());
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let stats = cleanup_logs(&dir.path().join("absent"), |_| false).unwrap();
        assert_eq!(stats, CleanupStats::default());
    }

    #[test]
    fn stats_from_several_directories_add_up() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let dead = touch(&first, "codeagent.100.log");
        let alive = touch(&second, "codeagent.200.log");

        let mut stats = CleanupStats::default();
        for dir in [&first, &second] {
            stats.merge(cleanup_logs(dir.path(), |pid| pid == 200).unwrap());
        }

        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.deleted, vec![dead]);
        assert_eq!(stats.kept, vec![alive]);
    }

    #[test]
    fn parses_pid_from_name() {
        assert_eq!(log_pid(Path::new("/x/codeagent.77.log")), Some(77));
        assert_eq!(log_pid(Path::new("/x/codeagent.abc.log")), None);
        assert_eq!(log_pid(Path::new("/x/other.77.log")), None);
    }

    #[cfg(unix)]
    #[test]
    fn current_process_is_alive() {
        assert!(process_alive(std::process::id()));
    }
}
