use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Live progress on stderr: one overall bar plus a spinner per running task.
///
/// Methods take `&self` so concurrently running tasks can report through a
/// shared reference. Disabled monitors draw nothing.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: Mutex<HashMap<String, ProgressBar>>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: Mutex::new(HashMap::new()),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        overall.set_message("starting");

        Self {
            multi,
            overall,
            task_bars: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    pub fn start_task(&self, task_id: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg} {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(task_id.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bars) = self.task_bars.lock() {
            bars.insert(task_id.to_string(), bar);
        }
    }

    pub fn complete_task(&self, task_id: &str, exit_code: i32, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        let bar = self.task_bars.lock().ok().and_then(|mut b| b.remove(task_id));
        if let Some(bar) = bar {
            let mark = if exit_code == 0 { "ok" } else { "failed" };
            bar.finish_with_message(format!("{task_id} {mark} (exit {exit_code}, {duration_ms}ms)"));
        }
        self.overall.inc(1);
    }

    /// Count a task that never started.
    pub fn skip_task(&self, task_id: &str) {
        if !self.enabled {
            return;
        }
        self.overall.println(format!("  - {task_id} not run"));
        self.overall.inc(1);
    }

    pub fn update_layer(&self, layer: usize, total_layers: usize) {
        if self.enabled {
            self.overall
                .set_message(format!("layer {}/{}", layer + 1, total_layers));
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let msg = if success { "done" } else { "finished with failures" };
        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        // Ensure all spinners are cleaned up
        if let Ok(mut bars) = self.task_bars.lock() {
            for (_, bar) in bars.drain() {
                bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_monitor_is_inert() {
        let monitor = ProgressMonitor::new(3, false);
        monitor.start_task("task1");
        monitor.complete_task("task1", 0, 100);
        monitor.skip_task("task2");
        monitor.update_layer(0, 2);
        monitor.finish(true);
        assert!(monitor.task_bars.lock().unwrap().is_empty());
    }

    #[test]
    fn enabled_monitor_tracks_running_tasks() {
        let monitor = ProgressMonitor::new(2, true);
        monitor.start_task("task1");
        monitor.start_task("task2");
        assert_eq!(monitor.task_bars.lock().unwrap().len(), 2);

        monitor.complete_task("task1", 0, 100);
        monitor.complete_task("task2", 1, 200);
        assert!(monitor.task_bars.lock().unwrap().is_empty());
        monitor.finish(false);
    }
}
