//! webinspector - Autonomous QA agent for web applications
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use webinspector::cli::{CaseReport, TestCase};
use webinspector::core::{Variable, VariableSet};
use webinspector::{Config, Runner};

/// webinspector - Tests a website against a user story with a local vision model
#[derive(Parser, Debug)]
#[command(name = "webinspector")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page the test starts on
    #[arg(long, short = 'u', requires = "story", conflicts_with = "file")]
    url: Option<String>,

    /// User story with its success condition
    #[arg(long, short = 's', requires = "url")]
    story: Option<String>,

    /// Batch file of test cases (JSON)
    #[arg(long, short = 'f', required_unless_present_any = ["url", "init_config"])]
    file: Option<PathBuf>,

    /// Variable usable as {{name}} in the story (name=value)
    #[arg(long = "var", value_parser = parse_key_value)]
    vars: Vec<(String, String)>,

    /// Secret variable, never shown to the models or in logs (name=value)
    #[arg(long = "secret", value_parser = parse_key_value)]
    secrets: Vec<(String, String)>,

    /// Planner model
    #[arg(long)]
    planner_model: Option<String>,

    /// Evaluator model
    #[arg(long)]
    evaluator_model: Option<String>,

    /// Consecutive failures allowed before giving up
    #[arg(long)]
    max_retries: Option<usize>,

    /// Cases run at the same time in batch mode
    #[arg(long)]
    concurrency: Option<usize>,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long, conflicts_with_all = ["url", "file"])]
    init_config: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.debug {
            "webinspector=debug"
        } else {
            "webinspector=warn"
        })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(model) = args.planner_model {
        config.models.planner = model;
    }
    if let Some(model) = args.evaluator_model {
        config.models.evaluator = model;
    }
    if let Some(max_retries) = args.max_retries {
        config.agent.max_retries = max_retries;
    }
    if let Some(concurrency) = args.concurrency {
        config.batch.concurrency = concurrency;
    }
    if args.headed {
        config.browser.headed = true;
    }
    if args.debug {
        config.agent.debug = true;
    }
    config.validate()?;

    if args.init_config {
        let path = config.save()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let runner = Runner::new(config)?.quiet(args.json);
    runner.check_dependencies().await?;

    let reports = match (args.file, args.url, args.story) {
        (Some(path), _, _) => runner.run_file(&path).await?,
        (None, Some(start_url), Some(user_story)) => {
            let variables: VariableSet = args
                .vars
                .into_iter()
                .map(|(name, value)| Variable::new(name, value))
                .chain(
                    args.secrets
                        .into_iter()
                        .map(|(name, value)| Variable::secret(name, value)),
                )
                .collect::<Vec<_>>()
                .into();
            let session = runner.config().browser.session_name.clone();
            let case = TestCase {
                start_url,
                user_story,
            };
            vec![runner.run_case(1, session, case, variables).await]
        }
        _ => anyhow::bail!("either --file or both --url and --story are required"),
    };

    print_reports(&reports, args.json)?;

    if reports.iter().any(|r| !r.result.is_passed()) {
        std::process::exit(1);
    }
    Ok(())
}

fn print_reports(reports: &[CaseReport], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for report in reports {
        let symbol = if report.result.is_passed() { "✓" } else { "✗" };
        println!(
            "{} Case {} [{}] {}\n  {}\n  {}",
            symbol,
            report.case,
            report.result.status,
            report.start_url,
            report.user_story,
            report.result.reason
        );
    }

    let passed = reports.iter().filter(|r| r.result.is_passed()).count();
    println!("\n{}/{} passed", passed, reports.len());
    Ok(())
}
