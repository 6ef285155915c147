//! vpcplan CLI entrypoint.
//!
//! This is the main entrypoint for the vpcplan command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vpcplan::cli::{Cli, Commands, OutputFormatter, PlanInputs, StateCommands};
use vpcplan::config::{PlannerConfig, Project, StateBackend, ENV_STATE_BUCKET};
use vpcplan::error::{ConfigError, Result, StateError, VpcPlanError};
use vpcplan::state::{LocalStateStore, PlanState, S3StateStore, StateStore, STATE_DIR};
use vpcplan::topology::{
    DiffEngine, Environment, PlanHasher, ResourceNamer, StackOutputs, TopologyPlan,
    TopologyPlanner,
};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
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

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let load = || Project::load(cli.config.as_deref(), cli.env.as_deref());

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate { warnings } => cmd_validate(&load()?, warnings),
        Commands::Plan {
            inputs,
            save,
            detailed,
        } => cmd_plan(&load()?, &inputs, save, detailed, &formatter).await,
        Commands::Diff { inputs } => cmd_diff(&load()?, &inputs, &formatter).await,
        Commands::Outputs { stack_id, inputs } => {
            cmd_outputs(&load()?, &inputs, &stack_id, &formatter)
        }
        Commands::State { command } => cmd_state(&load()?, command, &formatter).await,
    }
}

/// Initialize a new project.
fn cmd_init(path: &Path, force: bool) -> Result<()> {
    info!("Initializing new vpcplan project in: {}", path.display());

    let config_path = path.join("vpcplan.yaml");
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    // Check if files exist
    if !force && config_path.exists() {
        eprintln!("Configuration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    // Create directory if needed
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    std::fs::write(&config_path, include_str!("../templates/vpcplan.yaml"))?;
    eprintln!("Created: {}", config_path.display());

    std::fs::write(&env_path, include_str!("../templates/.env.example"))?;
    eprintln!("Created: {}", env_path.display());

    // Write/update .gitignore
    let state_entry = format!("{STATE_DIR}/");
    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        let missing: Vec<&str> = [".env", state_entry.as_str()]
            .into_iter()
            .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
            .collect();
        if !missing.is_empty() {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&gitignore_path)?;
            writeln!(file, "\n# vpcplan")?;
            for entry in missing {
                writeln!(file, "{entry}")?;
            }
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, format!(".env\n{state_entry}\n"))?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nProject initialized successfully!");
    eprintln!("Next steps:");
    eprintln!("  1. Copy .env.example to .env and set ENV_NAME");
    eprintln!("  2. Edit vpcplan.yaml with your zones and tiers");
    eprintln!("  3. Run 'vpcplan validate' to check your configuration");
    eprintln!("  4. Run 'vpcplan plan' to see the topology");
    eprintln!("  5. Run 'vpcplan plan --save' to record it");

    Ok(())
}

/// Validate configuration.
fn cmd_validate(project: &Project, show_warnings: bool) -> Result<()> {
    match &project.config_file {
        Some(path) => info!("Validating configuration: {}", path.display()),
        None => info!("Validating default configuration"),
    }

    eprintln!("Configuration is valid!");
    if show_warnings && !project.warnings.is_empty() {
        eprintln!("\nWarnings:");
        for warning in &project.warnings {
            eprintln!("  - {warning}");
        }
    }

    // Check that the topology itself can be planned
    let plan = plan_for(&project.config, project.environment, &PlanInputs::default())?;

    eprintln!("\nConfiguration summary:");
    eprintln!("  System: {}", project.config.system.name);
    eprintln!("  Environment: {}", project.environment);
    eprintln!("  Region: {}", project.config.network.region);
    eprintln!("  Zones: {}", plan.zones.len());
    eprintln!("  VPC block: {}", plan.vpc_block);
    eprintln!("  Subnets: {}", plan.subnet_count());

    Ok(())
}

/// Show the topology plan, optionally recording it.
async fn cmd_plan(
    project: &Project,
    inputs: &PlanInputs,
    save: bool,
    detailed: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let plan = plan_for(&project.config, project.environment, inputs)?;

    println!("{}", formatter.format_plan(&plan, &namer(project), detailed));

    if save {
        let store = create_state_store(project).await?;
        let store = store.as_ref();
        let fingerprint = PlanHasher::new().fingerprint(&plan);

        let recorded = with_lock(store, || async move {
            let mut state = store
                .load()
                .await?
                .unwrap_or_else(|| PlanState::new(&project.config.system.name, project.environment));
            let recorded = state.record(plan, &fingerprint);
            if recorded {
                store.save(&state).await?;
            }
            Ok::<_, VpcPlanError>(recorded)
        })
        .await?;

        if recorded {
            eprintln!("Plan recorded at {}", store.location());
        } else {
            eprintln!("Plan unchanged; nothing recorded.");
        }
    }

    Ok(())
}

/// Compare the recorded plan with the current one.
async fn cmd_diff(project: &Project, inputs: &PlanInputs, formatter: &OutputFormatter) -> Result<()> {
    let plan = plan_for(&project.config, project.environment, inputs)?;
    let store = create_state_store(project).await?;

    let state = store.load().await?;
    let previous = state.as_ref().and_then(|s| s.plan.as_ref());
    if previous.is_none() {
        info!("No recorded plan for {}; every resource is new", project.environment);
    }

    let diff = DiffEngine::new().compute_diff(previous, &plan);
    println!("{}", formatter.format_diff(&diff));

    Ok(())
}

/// List the stack exports.
fn cmd_outputs(
    project: &Project,
    inputs: &PlanInputs,
    stack_id: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let plan = plan_for(&project.config, project.environment, inputs)?;
    let outputs = StackOutputs::from_plan(&plan, &namer(project), stack_id);

    println!("{}", formatter.format_outputs(&outputs));
    Ok(())
}

/// State management commands.
async fn cmd_state(
    project: &Project,
    command: StateCommands,
    formatter: &OutputFormatter,
) -> Result<()> {
    let store = create_state_store(project).await?;

    match command {
        StateCommands::Show => {
            let Some(state) = store.load().await? else {
                eprintln!("No state recorded at {}", store.location());
                return Ok(());
            };
            let lock = store.get_lock_info().await?.filter(|l| !l.is_expired());
            println!("{}", formatter.format_state(&state, lock.as_ref()));
        }
        StateCommands::Lock { holder } => {
            let lock = store.acquire_lock(holder.as_deref().unwrap_or_default()).await?;
            println!("{}", formatter.format_lock(&lock));
        }
        StateCommands::Unlock { lock_id, force } => {
            let lock_id = match (lock_id, force) {
                (Some(id), _) => id,
                (None, true) => match store.get_lock_info().await? {
                    Some(lock) => {
                        warn!("Force-unlocking lock held by {}", lock.holder);
                        lock.lock_id
                    }
                    None => {
                        eprintln!("State is not locked.");
                        return Ok(());
                    }
                },
                (None, false) => {
                    return Err(VpcPlanError::Config(ConfigError::validation(
                        "--lock-id is required unless --force is given",
                        "lock_id",
                    )));
                }
            };

            if store.release_lock(&lock_id).await? {
                eprintln!("Lock {lock_id} released.");
            } else {
                eprintln!("Lock {lock_id} is not the current lock; nothing released.");
            }
        }
        StateCommands::Discard => {
            let store = store.as_ref();
            let discarded = with_lock(store, || async move {
                let mut state = store.load().await?.ok_or_else(|| {
                    VpcPlanError::State(StateError::NotFound {
                        path: PathBuf::from(store.location()),
                    })
                })?;
                let discarded = state.discard();
                if discarded.is_some() {
                    store.save(&state).await?;
                }
                Ok::<_, VpcPlanError>(discarded)
            })
            .await?;

            match discarded {
                Some(plan) => eprintln!(
                    "Discarded recorded plan ({} subnets in {}).",
                    plan.subnet_count(),
                    plan.vpc_block
                ),
                None => eprintln!("No recorded plan to discard."),
            }
        }
    }

    Ok(())
}

/// Runs `operation` while holding the state lock, releasing it afterwards.
async fn with_lock<T, F, Fut>(store: &dyn StateStore, operation: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let lock = store.acquire_lock("").await?;
    let result = operation().await;

    if let Err(e) = store.release_lock(&lock.lock_id).await {
        warn!("Failed to release state lock {}: {e}", lock.lock_id);
    }

    result
}

/// Computes the plan for `environment` with per-run overrides applied.
fn plan_for(
    config: &PlannerConfig,
    environment: Environment,
    inputs: &PlanInputs,
) -> Result<TopologyPlan> {
    let zones = inputs
        .zones()?
        .unwrap_or_else(|| config.network.zones.clone());
    let protected = inputs.protected || config.network.create_protected_tier;

    let planner = TopologyPlanner::with_params(environment, config.environment_params(environment));
    debug!("Planning with parameters: {:?}", planner.params());
    planner.plan(&zones, protected)
}

/// Creates the resource namer for a project.
fn namer(project: &Project) -> ResourceNamer {
    ResourceNamer::new(
        project.config.system.name.clone(),
        project.environment,
        project.config.network.region.clone(),
    )
}

/// Creates the state store configured for the project.
async fn create_state_store(project: &Project) -> Result<Box<dyn StateStore>> {
    let state = &project.config.state;

    let store: Box<dyn StateStore> = match state.backend {
        StateBackend::Local => Box::new(LocalStateStore::with_root(
            project.state_root(),
            project.environment,
        )),
        StateBackend::S3 => {
            let bucket = state.bucket.as_deref().ok_or_else(|| {
                VpcPlanError::Config(ConfigError::MissingEnvVar {
                    name: ENV_STATE_BUCKET.to_string(),
                })
            })?;
            let region = state
                .region
                .as_deref()
                .unwrap_or(&project.config.network.region);
            Box::new(
                S3StateStore::new(bucket, state.prefix.as_deref(), Some(region), project.environment)
                    .await?,
            )
        }
    };

    debug!("Using {} state backend at {}", store.backend_type(), store.location());
    Ok(store)
}
