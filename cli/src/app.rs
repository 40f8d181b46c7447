//! Wires configuration, planner and sink together and dispatches between
//! single-task and parallel runs.
use std::path::PathBuf;

use tokio::io::AsyncReadExt;

use codeagent_core::api as core_api;
use core_api::{AppConfig, AppContext, Backend, CliError, ReportMode, Task, STDIN_SENTINEL};
use codeagent_plugins::backend::InputSource;
use codeagent_plugins::factory;

use crate::commands::cli::{Args, Commands};

/// Everything needed to run one task outside of a task document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleRequest {
    pub task: String,
    pub workdir: PathBuf,
    pub session_id: Option<String>,
}

pub fn single_request(args: &Args) -> Result<SingleRequest, CliError> {
    match &args.command {
        Some(Commands::Resume {
            session_id,
            task,
            workdir,
        }) => Ok(SingleRequest {
            task: task.clone(),
            workdir: workdir.clone().unwrap_or_else(|| PathBuf::from(".")),
            session_id: Some(session_id.clone()),
        }),
        _ => {
            let task = args.task.clone().ok_or_else(|| {
                CliError::Command("missing task (see `codeagent --help`)".to_string())
            })?;
            Ok(SingleRequest {
                task,
                workdir: args.workdir.clone().unwrap_or_else(|| PathBuf::from(".")),
                session_id: None,
            })
        }
    }
}

/// `--parallel` takes its tasks from stdin only.
pub fn check_parallel_args(args: &Args) -> Result<(), CliError> {
    if args.task.is_none() && args.workdir.is_none() && args.command.is_none() {
        return Ok(());
    }
    eprintln!(
        "ERROR: --parallel reads its task document from stdin; only --backend and --full-output are allowed."
    );
    eprintln!("Usage examples:");
    eprintln!("  codeagent --parallel < tasks.txt");
    eprintln!("  echo '...' | codeagent --parallel");
    eprintln!("  codeagent --parallel <<'EOF'");
    eprintln!("  codeagent --parallel --full-output <<'EOF'  # include full task output");
    Err(CliError::Command("unexpected arguments with --parallel".to_string()))
}

#[tracing::instrument(name = "cli.run_app", skip(args, cfg))]
pub async fn run_app(args: Args, mut cfg: AppConfig) -> Result<i32, CliError> {
    let backend_name = args
        .backend
        .clone()
        .unwrap_or_else(|| cfg.backend.default.clone());
    let backend = Backend::from_name(&backend_name)?;
    tracing::info!(backend = %backend, parallel = args.parallel, "selected backend");

    if args.parallel {
        check_parallel_args(&args)?;
        return run_parallel(&args, cfg, backend).await;
    }

    let req = single_request(&args)?;
    cfg.executor.progress_bar = false;
    run_single(req, cfg, backend).await
}

fn build_context(cfg: AppConfig) -> AppContext {
    let sink = factory::build_sink(&cfg);
    let ctx = AppContext::new(cfg, sink);

    let token = ctx.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling running tasks");
            token.cancel();
        }
    });
    ctx
}

async fn read_stdin() -> Result<String, CliError> {
    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    Ok(buf)
}

async fn run_single(req: SingleRequest, cfg: AppConfig, backend: Backend) -> Result<i32, CliError> {
    let (text, input) = if req.task == STDIN_SENTINEL {
        let text = read_stdin().await?;
        if text.trim().is_empty() {
            return Err(CliError::Command(
                "explicit stdin mode requires task input on stdin".to_string(),
            ));
        }
        (text, InputSource::ExplicitStdin)
    } else if !atty::is(atty::Stream::Stdin) {
        let piped = read_stdin().await?;
        if piped.trim().is_empty() {
            (req.task.clone(), InputSource::Inline)
        } else {
            (piped, InputSource::Piped)
        }
    } else {
        (req.task.clone(), InputSource::Inline)
    };

    let task_id = core_api::generate_task_id();
    let body = factory::build_role_injector().apply(&task_id, &text);
    let mut task = Task::new(task_id, backend, body).with_workdir(req.workdir);
    if let Some(sid) = req.session_id {
        task = task.resume(sid);
    }

    let planner = factory::build_planner(&cfg, input);
    let ctx = build_context(cfg);
    let report = core_api::execute_tasks(&ctx, std::slice::from_ref(&task), planner.as_ref()).await?;

    let Some(result) = report.results.first() else {
        return Ok(core_api::EXIT_GENERAL_ERROR);
    };
    if !result.is_success() {
        tracing::error!(
            task_id = %result.task_id,
            exit_code = result.exit_code,
            error = result.error.as_deref().unwrap_or(""),
            "task failed"
        );
        return Ok(result.exit_code);
    }

    println!("{}", result.message);
    if let Some(sid) = &result.session_id {
        println!("\n---\nSESSION_ID: {sid}");
    }
    Ok(core_api::EXIT_SUCCESS)
}

async fn run_parallel(args: &Args, cfg: AppConfig, backend: Backend) -> Result<i32, CliError> {
    let input = read_stdin().await?;
    let injector = factory::build_role_injector();
    let tasks: Vec<Task> = core_api::parse_task_document(&input, backend)?
        .into_iter()
        .map(|mut task| {
            task.body = injector.apply(&task.id, &task.body);
            task
        })
        .collect();
    if tasks.is_empty() {
        return Err(CliError::Command("task document contains no tasks".to_string()));
    }
    tracing::info!(tasks = tasks.len(), "parsed task document");

    let mode = if args.full_output {
        ReportMode::Verbose
    } else {
        ReportMode::Compact
    };
    let ascii = cfg.report.ascii;
    let planner = factory::build_planner(&cfg, InputSource::Inline);
    let ctx = build_context(cfg);

    let report = core_api::execute_tasks(&ctx, &tasks, planner.as_ref()).await?;
    print!("{}", report_text(&report.results, mode, ascii));

    let failed: Vec<&str> = report
        .results
        .iter()
        .filter(|r| !r.is_success())
        .map(|r| r.task_id.as_str())
        .collect();
    if !failed.is_empty() {
        tracing::warn!(failed = ?failed, "some tasks did not succeed");
    }
    Ok(report.exit_code())
}

/// The report as written to stdout, newline-terminated.
fn report_text(results: &[core_api::ExecutionResult], mode: ReportMode, ascii: bool) -> String {
    let mut text = core_api::render_report(results, mode, ascii);
    text.push('\n');
    text
}
