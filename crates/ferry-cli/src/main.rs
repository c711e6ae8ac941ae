//! Ferry CLI - natural-language feature delivery
//!
//! Usage:
//!   ferry "add a contact form"    Run the pipeline for one request
//!   ferry                         Prompt for the request first
//!   ferry --auto "..."            Approve the generated plan without asking

use anyhow::{bail, Context, Result};
use clap::Parser;
use ferry_agent::{AgentClient, Model};
use ferry_core::FerryConfig;
use ferry_git::{GitCommand, GitRepo};
use ferry_github::{host_token, GitHubClient, PollConfig, Publisher};
use ferry_orchestrator::{
    ApprovalGate, DeployConfig, Deployment, FeatureCoder, FeaturePlanner, ProcessTestRunner,
    ProjectContext, RunOutcome,
};
use std::io::{self, Write};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(author, version, about = "Carries a feature request to a merged pull request")]
struct Cli {
    /// Feature request in plain language (prompted for when omitted)
    feature: Option<String>,

    /// Approve the generated plan without asking
    #[arg(long)]
    auto: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let request = match cli.feature {
        Some(text) => {
            println!("Feature: {}", text);
            text
        }
        None => prompt_for_request()?,
    };
    if request.trim().is_empty() {
        bail!("no feature request given");
    }

    run(&request, cli.auto).await
}

async fn run(request: &str, auto: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let config = FerryConfig::load_or_default(&cwd)?;

    let context = ProjectContext::load(&config).await;

    let executor = GitCommand::new(config.workspace.root.clone());
    let repo = GitRepo::new(executor);

    let host = GitHubClient::new(
        &config.github.api_base,
        config.github.resolved_owner()?,
        config.github.resolved_repo()?,
        host_token()?,
    )?;
    let publisher = Publisher::new(&host, PollConfig::from_settings(&config.poll));

    let model: Model = config.agent.model.parse().map_err(anyhow::Error::msg)?;
    let planner =
        FeaturePlanner::new(AgentClient::new(model).with_max_tokens(config.agent.plan_max_tokens));
    let coder = FeatureCoder::new(AgentClient::new(model).with_max_tokens(config.agent.max_tokens));
    let tests = ProcessTestRunner::new(config.workspace.test_command.clone());

    let gate: Box<dyn ApprovalGate> = if auto {
        Box::new(AutoGate)
    } else {
        Box::new(InteractiveGate)
    };

    let mut deployment = Deployment::new(
        &planner,
        &coder,
        &tests,
        gate.as_ref(),
        &repo,
        publisher,
        DeployConfig::from_config(&config),
    );

    match deployment.run(request, &context).await? {
        RunOutcome::Merged { pr, attempts } => {
            println!("\nMerged {} after {} attempt(s)", pr.html_url, attempts);
            Ok(())
        }
        RunOutcome::Aborted => {
            println!("Aborted.");
            Ok(())
        }
        RunOutcome::Exhausted { attempts } => {
            bail!("no attempt out of {} produced a mergeable change", attempts)
        }
    }
}

fn prompt_for_request() -> Result<String> {
    print!("Describe the feature you want to build: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn print_plan(plan: &str) {
    println!("{}", "=".repeat(60));
    println!("IMPLEMENTATION PLAN");
    println!("{}", "=".repeat(60));
    println!("{}", plan);
    println!("{}", "=".repeat(60));
}

/// Shows the plan and asks for a literal "yes" on stdin
struct InteractiveGate;

impl ApprovalGate for InteractiveGate {
    fn approve_plan(&self, plan: &str) -> ferry_core::Result<bool> {
        print_plan(plan);

        print!("\nProceed with implementation? (yes/no): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("yes"))
    }
}

/// Shows the plan and approves it without asking
struct AutoGate;

impl ApprovalGate for AutoGate {
    fn approve_plan(&self, plan: &str) -> ferry_core::Result<bool> {
        print_plan(plan);
        info!("Plan approved automatically (--auto)");
        Ok(true)
    }
}
