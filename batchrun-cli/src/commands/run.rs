//! Run command handler
//!
//! Maps flags onto a [`WorkflowConfig`], drives the orchestrator and prints
//! the final report.

use anyhow::{Context, Result};
use batchrun_client::{BatchProvider, InMemoryProvider, TaskScript};
use batchrun_core::domain::job::Job;
use batchrun_core::domain::pool::{MachineProfile, PackageRef, StartTask};
use batchrun_core::dto::pool::PoolSpec;
use batchrun_workflow::{
    ExitCodePolicy, Orchestrator, PollPolicy, PoolStatus, RunOutcome, RunReport, TaskTemplate,
    TeardownAction, TeardownPolicy, WorkItem, WorkflowConfig,
};
use chrono::Local;
use clap::Args;
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::prompt::StdinConfirm;

/// Upper bound of `--timeout-mins`
const MAX_TIMEOUT_MINS: u64 = 7 * 24 * 60;

/// Arguments of `batchrun run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pool to create or reuse
    #[arg(long, env = "BATCHRUN_POOL_ID", default_value = "TutorialPool")]
    pool_id: String,

    /// Target number of nodes in the pool
    #[arg(long, default_value_t = 3)]
    nodes: u32,

    /// Node size
    #[arg(long, default_value = "small")]
    vm_size: String,

    /// Operating system family of the nodes
    #[arg(long, default_value = "4")]
    os_family: String,

    /// Command run on every node when it joins the pool
    #[arg(long)]
    start_task: Option<String>,

    /// Let nodes accept tasks even if the start task failed
    #[arg(long)]
    no_wait_for_start_task: bool,

    /// Application package as ID#VERSION, installed on the pool and referenced by tasks
    #[arg(long = "package", value_parser = parse_package)]
    packages: Vec<PackageRef>,

    /// Job to create; generated when omitted
    #[arg(long, env = "BATCHRUN_JOB_ID")]
    job_id: Option<String>,

    /// Task command line; {payload} and {index} are substituted per work item
    #[arg(long, default_value = "TaskApplication {payload}")]
    command: String,

    /// Work item payload, one task each
    #[arg(long = "input")]
    inputs: Vec<String>,

    /// Number of tasks to run when no --input is given
    #[arg(long, default_value_t = 2)]
    tasks: usize,

    /// Minutes to wait for all tasks to complete, at most one week
    #[arg(
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_MINS)
    )]
    timeout_mins: u64,

    /// Initial seconds between task state polls
    #[arg(long, default_value_t = 1)]
    poll_interval_secs: u64,

    /// Upper bound of seconds between task state polls
    #[arg(long, default_value_t = 30)]
    max_poll_interval_secs: u64,

    /// Delete job and pool afterwards: always, never or ask
    #[arg(long, default_value = "ask")]
    teardown: TeardownPolicy,

    /// How exit codes count: diagnostic or strict
    #[arg(long, default_value = "diagnostic")]
    exit_codes: ExitCodePolicy,

    /// With --simulate, make the given task fail with exit code 1
    #[arg(long = "simulate-fail")]
    simulate_fail: Vec<String>,
}

impl RunArgs {
    fn workflow_config(&self) -> WorkflowConfig {
        let mut pool = PoolSpec::new(&self.pool_id, self.nodes).with_machine(MachineProfile {
            vm_size: self.vm_size.clone(),
            os_family: self.os_family.clone(),
        });
        if let Some(command) = &self.start_task {
            let mut start_task = StartTask::new(command);
            start_task.wait_for_success = !self.no_wait_for_start_task;
            pool = pool.with_start_task(start_task);
        }

        let mut template = TaskTemplate::new(&self.command);
        for package in &self.packages {
            pool = pool.with_package(package.clone());
            template = template.with_package(package.clone());
        }

        let job_id = self.job_id.clone().unwrap_or_else(Job::generate_id);

        WorkflowConfig::new(pool, job_id, template)
            .with_timeout(Duration::from_secs(self.timeout_mins * 60))
            .with_poll(PollPolicy {
                interval: Duration::from_secs(self.poll_interval_secs),
                max_interval: Duration::from_secs(self.max_poll_interval_secs),
                backoff_factor: 2,
            })
            .with_teardown(self.teardown)
            .with_exit_codes(self.exit_codes)
    }

    fn work_items(&self) -> Vec<WorkItem> {
        if self.inputs.is_empty() {
            (0..self.tasks).map(|_| WorkItem::new("")).collect()
        } else {
            self.inputs.iter().map(WorkItem::new).collect()
        }
    }

    fn simulated_provider(&self) -> InMemoryProvider {
        self.simulate_fail
            .iter()
            .fold(InMemoryProvider::new(), |provider, task_id| {
                provider.with_script(
                    task_id.as_str(),
                    TaskScript::fails(1, "The task exited with an exit code representing a failure"),
                )
            })
    }
}

fn parse_package(s: &str) -> Result<PackageRef, String> {
    match s.split_once('#') {
        Some((id, version)) if !id.is_empty() && !version.is_empty() => {
            Ok(PackageRef::new(id, version))
        }
        _ => Err(format!("expected ID#VERSION, got '{}'", s)),
    }
}

/// Handle `batchrun run`
pub async fn handle_run_command(args: RunArgs, config: &Config) -> Result<ExitCode> {
    let workflow = args.workflow_config();
    workflow.validate().context("Invalid run configuration")?;

    let provider: Arc<dyn BatchProvider> = if config.simulate {
        Arc::new(args.simulated_provider())
    } else {
        config.provider()?
    };

    println!(
        "{} {}",
        "Run start:".bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    let orchestrator =
        Orchestrator::new(provider, workflow).with_teardown_confirm(Arc::new(StdinConfirm));
    let report = orchestrator.run(&args.work_items()).await?;

    print_report(&report);

    println!();
    println!(
        "{} {}",
        "Run end:".bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &RunReport) {
    let pool_status = match report.pool_status {
        PoolStatus::Created => "created",
        PoolStatus::AlreadyExisted => "already existed",
    };

    println!();
    println!("{}", "Run Summary:".bold());
    println!("  Pool:     {} ({})", report.pool_id.cyan(), pool_status.dimmed());
    println!("  Job:      {}", report.job_id.cyan());
    println!("  Tasks:    {}", report.tasks.len());
    println!("  Elapsed:  {}s", report.elapsed().num_seconds());

    match &report.outcome {
        RunOutcome::Completed(verdict) if verdict.succeeded() => {
            println!(
                "  Result:   {}",
                "✓ All tasks completed successfully within the timeout period".green()
            );
        }
        RunOutcome::Completed(verdict) => {
            println!(
                "  Result:   {}",
                format!(
                    "✗ {} of {} task(s) failed",
                    verdict.failures().len(),
                    verdict.outcomes().len()
                )
                .red()
            );
            println!("\n{}", "Failures:".bold());
            for failure in verdict.failures() {
                let exit_code = failure
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {} {}  exit code {}  {}",
                    "▸".red(),
                    failure.task_id.to_string().bold(),
                    exit_code,
                    failure.failure_message().unwrap_or("no failure information")
                );
            }
        }
        RunOutcome::TimedOut(timeout) => {
            println!("  Result:   {}", format!("✗ {}", timeout).red());
            let incomplete: Vec<String> =
                timeout.incomplete.iter().map(|id| id.to_string()).collect();
            println!("  Pending:  {}", incomplete.join(", ").yellow());
        }
    }

    println!("\n{}", "Teardown:".bold());
    println!("  Job:      {}", describe_teardown(&report.teardown.job));
    println!("  Pool:     {}", describe_teardown(&report.teardown.pool));
}

fn describe_teardown(action: &TeardownAction) -> ColoredString {
    match action {
        TeardownAction::Deleted => "deleted".green(),
        TeardownAction::Skipped => "kept".dimmed(),
        TeardownAction::Failed(reason) => format!("delete failed: {}", reason).red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["batchrun"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).run
    }

    #[test]
    fn test_defaults_match_tutorial_setup() {
        let args = parse(&["--job-id", "TutorialJob"]);
        let config = args.workflow_config();

        assert_eq!(config.pool.id, "TutorialPool");
        assert_eq!(config.pool.target_nodes, 3);
        assert_eq!(config.job_id, "TutorialJob");
        assert_eq!(config.timeout, Duration::from_secs(30 * 60));
        assert_eq!(config.teardown, TeardownPolicy::Ask);
        assert_eq!(args.work_items().len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_packages_go_to_pool_and_tasks() {
        let args = parse(&["--package", "test1#1.0", "--start-task", "setup"]);
        let config = args.workflow_config();

        assert_eq!(config.pool.packages, vec![PackageRef::new("test1", "1.0")]);
        assert_eq!(config.task_template.packages, config.pool.packages);
        assert!(config.pool.start_task.as_ref().unwrap().wait_for_success);
        assert!(config.job_id.starts_with("job-"));
    }

    #[test]
    fn test_inputs_override_task_count() {
        let args = parse(&["--input", "a.txt", "--input", "b.txt", "--input", "c.txt"]);
        let items = args.work_items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2], WorkItem::new("c.txt"));
    }

    #[test]
    fn test_policies_parse() {
        let args = parse(&["--teardown", "always", "--exit-codes", "strict"]);
        assert_eq!(args.teardown, TeardownPolicy::Always);
        assert_eq!(args.exit_codes, ExitCodePolicy::Strict);
    }

    #[test]
    fn test_timeout_flag_is_bounded() {
        let parsed = TestCli::try_parse_from(["batchrun", "--timeout-mins", "18446744073709551615"]);
        assert!(parsed.is_err());
        assert!(TestCli::try_parse_from(["batchrun", "--timeout-mins", "0"]).is_err());

        let args = parse(&["--timeout-mins", "10080"]);
        assert_eq!(args.workflow_config().timeout, Duration::from_secs(10080 * 60));
    }

    #[test]
    fn test_parse_package() {
        assert_eq!(parse_package("app#2.1"), Ok(PackageRef::new("app", "2.1")));
        assert!(parse_package("app").is_err());
        assert!(parse_package("#1.0").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_run_reports_failures() {
        let args = parse(&[
            "--job-id",
            "job",
            "--teardown",
            "never",
            "--simulate-fail",
            "task1",
        ]);
        let provider = Arc::new(args.simulated_provider());
        let report = Orchestrator::new(provider, args.workflow_config())
            .run(&args.work_items())
            .await
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.failures().len(), 1);
    }
}
