use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::RunnerError;
use crate::executor::types::{EXIT_INTERRUPTED, EXIT_TIMEOUT};
use crate::util::RingBytes;

use super::io_pump::{pump_lines, LineStream, LineTap};
use super::stream::StreamDecoder;
use super::supervise::{normalize_exit, Supervised};
use super::types::{Interrupt, LaunchSpec, ProcessOutcome, RunControl};

/// How long to wait for each trailing line once the child has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Spawn one backend process and supervise it to completion.
///
/// The deadline and the cancellation token both lead to the same two-phase
/// stop (SIGTERM, then a forced kill after `ctl.grace`). A spawn failure is
/// returned as an error; everything after a successful spawn is reported in
/// the outcome.
pub async fn run_process(spec: LaunchSpec, ctl: RunControl) -> Result<ProcessOutcome, RunnerError> {
    let started_at = Instant::now();

    let mut cmd = Command::new(&spec.cmd);
    cmd.args(&spec.args)
        .envs(&spec.envs)
        .stdin(if spec.stdin_payload.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }

    tracing::debug!(task_id = %ctl.task_id, command = %spec.display_command(), cwd = ?spec.cwd, "spawning");

    let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
        cmd: spec.cmd.clone(),
        source,
    })?;

    let stdin_task = match (child.stdin.take(), spec.stdin_payload) {
        (Some(stdin), Some(payload)) => Some(spawn_stdin_writer(stdin, payload, ctl.task_id.clone())),
        _ => None,
    };

    let stdout = child.stdout.take().ok_or(RunnerError::NotPiped("stdout"))?;
    let stderr = child.stderr.take().ok_or(RunnerError::NotPiped("stderr"))?;

    let ring_out = RingBytes::new(ctl.stdout_capture_bytes);
    let ring_err = RingBytes::new(ctl.stderr_capture_bytes);

    let (line_tx, mut line_rx) = mpsc::channel::<LineTap>(ctl.line_channel_capacity.max(1));
    let out_task = pump_lines(stdout, ring_out.clone(), line_tx.clone(), LineStream::Stdout);
    let err_task = pump_lines(stderr, ring_err.clone(), line_tx, LineStream::Stderr);

    let mut supervised = Supervised::new(child);
    let mut decoder = StreamDecoder::new();
    let mut interrupt: Option<Interrupt> = None;
    let mut lines_open = true;

    let status = loop {
        let kill_at = supervised.kill_deadline();

        // Exit is checked first so a child that already finished is never
        // reported as timed out or cancelled.
        tokio::select! {
            biased;

            res = supervised.wait() => {
                break res.map_err(RunnerError::Wait)?;
            }

            tap = line_rx.recv(), if lines_open => {
                match tap {
                    Some(tap) => handle_line(&ctl, &mut decoder, tap),
                    None => lines_open = false,
                }
            }

            _ = tokio::time::sleep_until(ctl.deadline), if interrupt.is_none() => {
                tracing::warn!(task_id = %ctl.task_id, error.kind = "task.timeout", "deadline reached, terminating");
                interrupt = Some(Interrupt::Timeout);
                supervised.begin_termination(ctl.grace);
            }

            _ = ctl.cancel.cancelled(), if interrupt.is_none() => {
                tracing::warn!(task_id = %ctl.task_id, error.kind = "task.cancelled", "run cancelled, terminating");
                interrupt = Some(Interrupt::Cancelled);
                supervised.begin_termination(ctl.grace);
            }

            _ = async {
                match kill_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            } => {
                tracing::warn!(task_id = %ctl.task_id, pid = ?supervised.id(), "grace window expired, killing");
                supervised.force_kill();
            }
        }
    };

    // Trailing output. A grandchild holding the pipes open must not stall us.
    while lines_open {
        match tokio::time::timeout(DRAIN_TIMEOUT, line_rx.recv()).await {
            Ok(Some(tap)) => handle_line(&ctl, &mut decoder, tap),
            Ok(None) | Err(_) => lines_open = false,
        }
    }
    finish_pump(out_task, &ctl.task_id).await;
    finish_pump(err_task, &ctl.task_id).await;
    if let Some(task) = stdin_task {
        if !task.is_finished() {
            task.abort();
        }
    }

    let exit_code = match interrupt {
        Some(Interrupt::Timeout) => EXIT_TIMEOUT,
        Some(Interrupt::Cancelled) => EXIT_INTERRUPTED,
        None => normalize_exit(status),
    };

    let mut message = decoder.message();
    if message.trim().is_empty() {
        message = String::from_utf8_lossy(&ring_out.to_bytes()).trim().to_string();
    }

    let outcome = ProcessOutcome {
        exit_code,
        message,
        session_id: decoder.session_id().map(str::to_string),
        stderr_tail: String::from_utf8_lossy(&ring_err.to_bytes())
            .trim_end()
            .to_string(),
        duration_ms: started_at.elapsed().as_millis() as u64,
        interrupt,
        lifecycle: supervised.lifecycle(),
    };

    tracing::debug!(
        task_id = %ctl.task_id,
        exit_code = outcome.exit_code,
        lifecycle = ?outcome.lifecycle,
        json_lines = decoder.json_lines(),
        duration_ms = outcome.duration_ms,
        "process finished"
    );

    Ok(outcome)
}

fn handle_line(ctl: &RunControl, decoder: &mut StreamDecoder, tap: LineTap) {
    ctl.sink.emit(&ctl.task_id, tap.stream, &tap.line);
    if tap.stream == LineStream::Stdout {
        decoder.push_line(&tap.line);
    }
}

fn spawn_stdin_writer(
    mut stdin: tokio::process::ChildStdin,
    payload: String,
    task_id: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let res = async {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.shutdown().await
        }
        .await;
        // Dropping `stdin` closes the pipe either way.
        if let Err(e) = res {
            tracing::debug!(task_id = %task_id, error = %e, "stdin write failed");
        }
    })
}

async fn finish_pump(task: JoinHandle<Result<u64, RunnerError>>, task_id: &str) {
    if !task.is_finished() {
        task.abort();
        return;
    }
    match task.await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!(task_id = %task_id, error = %e, "output pump failed"),
        Err(e) => tracing::warn!(task_id = %task_id, error = %e, "output pump panicked"),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::runner::output::OutputSink;
    use crate::runner::supervise::Lifecycle;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(LineStream, String)>>);

    impl OutputSink for Collect {
        fn emit(&self, _task_id: &str, stream: LineStream, line: &str) {
            if let Ok(mut g) = self.0.lock() {
                g.push((stream, line.to_string()));
            }
        }
    }

    fn control(timeout: Duration, grace: Duration, sink: Arc<Collect>) -> RunControl {
        RunControl {
            task_id: "t".into(),
            deadline: Instant::now() + timeout,
            grace,
            cancel: CancellationToken::new(),
            sink,
            stdout_capture_bytes: 64 * 1024,
            stderr_capture_bytes: 4096,
            line_channel_capacity: 16,
        }
    }

    fn sh(script: &str) -> LaunchSpec {
        LaunchSpec {
            cmd: "/bin/sh".into(),
            args: vec!["-c".into(), script.into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn captures_stdout_stderr_and_exit_code() {
        let sink = Arc::new(Collect::default());
        let out = run_process(
            sh("echo hello; echo oops 1>&2; exit 3"),
            control(Duration::from_secs(10), Duration::from_secs(1), sink.clone()),
        )
        .await
        .unwrap();

        assert_eq!(out.exit_code, 3);
        assert_eq!(out.message, "hello");
        assert_eq!(out.stderr_tail, "oops");
        assert_eq!(out.lifecycle, Lifecycle::Exited);

        let lines = sink.0.lock().unwrap().clone();
        assert!(lines.contains(&(LineStream::Stdout, "hello".to_string())));
        assert!(lines.contains(&(LineStream::Stderr, "oops".to_string())));
    }

    #[tokio::test]
    async fn stdin_payload_is_delivered_and_closed() {
        let mut spec = sh("cat");
        spec.stdin_payload = Some("line one\n$HOME `x`".into());
        let out = run_process(
            spec,
            control(Duration::from_secs(10), Duration::from_secs(1), Arc::default()),
        )
        .await
        .unwrap();

        assert_eq!(out.exit_code, 0);
        assert_eq!(out.message, "line one\n$HOME `x`");
    }

    #[tokio::test]
    async fn deadline_terminates_with_124() {
        let started = Instant::now();
        let out = run_process(
            sh("sleep 30"),
            control(Duration::from_millis(200), Duration::from_secs(5), Arc::default()),
        )
        .await
        .unwrap();

        assert_eq!(out.exit_code, EXIT_TIMEOUT);
        assert_eq!(out.interrupt, Some(Interrupt::Timeout));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn sigterm_ignoring_child_is_force_killed_after_grace() {
        let out = run_process(
            sh("trap '' TERM; while :; do sleep 0.05; done"),
            control(Duration::from_millis(100), Duration::from_millis(300), Arc::default()),
        )
        .await
        .unwrap();

        assert_eq!(out.exit_code, EXIT_TIMEOUT);
        assert_eq!(out.lifecycle, Lifecycle::ForceKilled);
    }

    /// Blocks the supervisor on the first line it forwards.
    struct StallingSink(Duration);

    impl OutputSink for StallingSink {
        fn emit(&self, _task_id: &str, _stream: LineStream, _line: &str) {
            std::thread::sleep(self.0);
        }
    }

    #[tokio::test]
    async fn finished_child_wins_over_expired_deadline() {
        let mut ctl = control(Duration::from_millis(100), Duration::from_secs(1), Arc::default());
        ctl.sink = Arc::new(StallingSink(Duration::from_millis(400)));

        let out = run_process(sh("echo done"), ctl).await.unwrap();

        assert_eq!(out.exit_code, 0);
        assert_eq!(out.interrupt, None);
        assert_eq!(out.lifecycle, Lifecycle::Exited);
    }

    #[tokio::test]
    async fn cancellation_yields_130() {
        let ctl = control(Duration::from_secs(30), Duration::from_secs(1), Arc::default());
        let cancel = ctl.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let out = run_process(sh("sleep 30"), ctl).await.unwrap();
        assert_eq!(out.exit_code, EXIT_INTERRUPTED);
        assert_eq!(out.interrupt, Some(Interrupt::Cancelled));
    }

    #[tokio::test]
    async fn missing_binary_is_a_not_found_spawn_error() {
        let err = run_process(
            LaunchSpec::new("codeagent-definitely-missing-binary"),
            control(Duration::from_secs(1), Duration::from_secs(1), Arc::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }

    #[tokio::test]
    async fn working_directory_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = sh("pwd");
        spec.cwd = Some(dir.path().to_path_buf());
        let out = run_process(
            spec,
            control(Duration::from_secs(10), Duration::from_secs(1), Arc::default()),
        )
        .await
        .unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(&out.message).canonicalize().unwrap(),
            expected
        );
    }
}
