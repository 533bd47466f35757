//! Junos provider CLI entrypoint.
//!
//! This is the main entrypoint for the junos-provider command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use junos_provider::cli::{Cli, Commands, OutputFormatter, ResourceReport};
use junos_provider::config::{find_config_file, ConfigParser, ConfigValidator, ProviderFile};
use junos_provider::error::{ProviderError, Result};
use junos_provider::guard::ReadGuard;
use junos_provider::planner::ChangePlan;
use junos_provider::reconciler::{FakeMode, Reconciler};
use junos_provider::resource::{Resource, Security, SystemLoginUser, SystemRootAuthentication};
use junos_provider::session::{DetachedSessions, MemoryDevice, SessionFactory};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Platform model simulated when neither the command line nor the resources
/// file names one.
const DEFAULT_SIMULATED_MODEL: &str = "vsrx";

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point. Returns false when a resource failed.
async fn run(cli: Cli) -> Result<bool> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { warnings } => {
            cmd_validate(cli.config.as_ref(), warnings, &formatter)
        }
        Commands::Plan { update } => cmd_plan(cli.config.as_ref(), update, &formatter),
        Commands::Export { set_file, update } => {
            cmd_export(cli.config.as_ref(), set_file, update, &formatter).await
        }
        Commands::Simulate { model } => {
            cmd_simulate(cli.config.as_ref(), model, &formatter).await
        }
    }
}

/// Validate the resources file.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let file = load_config(config_path)?;
    let result = ConfigValidator::new().collect(&file);

    emit(&formatter.format_validation(&result, show_warnings))?;
    if result.is_valid() {
        debug!(
            resources = file.resources.count(),
            "Configuration summary"
        );
    }
    Ok(result.is_valid())
}

/// Show the lines every resource renders to.
fn cmd_plan(config_path: Option<&PathBuf>, update: bool, formatter: &OutputFormatter) -> Result<bool> {
    let file = load_validated(config_path)?;
    let plan = ChangePlan::from_resources(&file.resources, update)?;

    info!(actions = plan.action_count(), "Plan computed");
    emit(&formatter.format_plan(&plan))?;
    Ok(true)
}

/// Append every resource's lines to a set file.
async fn cmd_export(
    config_path: Option<&PathBuf>,
    set_file: Option<PathBuf>,
    update: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let mut file = load_validated(config_path)?;
    if let Some(path) = set_file {
        file.provider.fake_create_set_file = Some(path);
    }
    if update {
        file.provider.fake_update_also = true;
    }

    let fake = FakeMode::required(&file.provider)?;
    info!("Exporting to set file: {}", fake.writer().path().display());

    let reconciler = Reconciler::new(DetachedSessions, ReadGuard::new()).with_fake_mode(Some(fake));
    let mut reports = Vec::with_capacity(file.resources.count());

    if let Some(security) = &file.resources.security {
        reports.push(export_one::<Security, _>(&reconciler, security, update).await);
    }
    if let Some(root) = &file.resources.root_authentication {
        reports.push(export_one::<SystemRootAuthentication, _>(&reconciler, root, update).await);
    }
    for user in &file.resources.login_users {
        reports.push(export_one::<SystemLoginUser, _>(&reconciler, user, update).await);
    }

    emit(&formatter.format_reports("Set File Export", &reports))?;
    Ok(reports.iter().all(ResourceReport::is_ok))
}

async fn export_one<R: Resource, F: SessionFactory>(
    reconciler: &Reconciler<F>,
    options: &R::Options,
    update: bool,
) -> ResourceReport {
    let id = R::identifier(options);
    let outcome = if update {
        reconciler.update::<R>(&id, options).await
    } else {
        reconciler.create::<R>(options).await
    };
    match outcome {
        Ok(outcome) => ResourceReport::from_outcome(R::KIND, &outcome),
        Err(e) => ResourceReport::failed(R::KIND, id, &e),
    }
}

/// Apply every resource to an in-memory device, then check for drift.
async fn cmd_simulate(
    config_path: Option<&PathBuf>,
    model: Option<String>,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let file = load_validated(config_path)?;
    let model = model
        .or_else(|| file.provider.platform_model.clone())
        .unwrap_or_else(|| String::from(DEFAULT_SIMULATED_MODEL));
    info!("Simulating device model: {model}");

    let reconciler = Reconciler::new(MemoryDevice::new().with_model(&model), ReadGuard::new());
    let mut reports = Vec::with_capacity(file.resources.count());

    if let Some(security) = &file.resources.security {
        reports.push(simulate_one::<Security, _>(&reconciler, security).await);
    }
    if let Some(root) = &file.resources.root_authentication {
        reports.push(simulate_one::<SystemRootAuthentication, _>(&reconciler, root).await);
    }
    for user in &file.resources.login_users {
        reports.push(simulate_one::<SystemLoginUser, _>(&reconciler, user).await);
    }

    emit(&formatter.format_reports(&format!("Simulation on {model}"), &reports))?;
    Ok(reports.iter().all(ResourceReport::is_ok))
}

async fn simulate_one<R: Resource, F: SessionFactory>(
    reconciler: &Reconciler<F>,
    options: &R::Options,
) -> ResourceReport {
    let id = R::identifier(options);
    let outcome = match reconciler.create::<R>(options).await {
        Ok(outcome) => outcome,
        Err(e) => return ResourceReport::failed(R::KIND, id, &e),
    };
    let report = ResourceReport::from_outcome(R::KIND, &outcome);
    match reconciler.check_drift::<R>(&outcome.id, options).await {
        Ok(drift) => report.with_drift(drift),
        Err(e) => ResourceReport::failed(R::KIND, id, &e),
    }
}

/// Loads the resources file and fails on the first validation error.
fn load_validated(config_path: Option<&PathBuf>) -> Result<ProviderFile> {
    let file = load_config(config_path)?;
    let result = ConfigValidator::new().validate(&file)?;
    for warning in &result.warnings {
        tracing::warn!("{warning}");
    }
    Ok(file)
}

/// Loads the resources file with `.env` and environment overrides.
fn load_config(config_path: Option<&PathBuf>) -> Result<ProviderFile> {
    let config_file = resolve_config_path(config_path)?;
    let parser = ConfigParser::new()
        .with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")));
    parser.load_dotenv()?;
    parser.load_with_env(&config_file)
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        return Ok(path.clone());
    }
    let cwd = std::env::current_dir().map_err(ProviderError::Io)?;
    find_config_file(cwd)
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output.trim_end())?;
    Ok(())
}
