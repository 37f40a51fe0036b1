//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{SensorFailurePolicy, SessionBlueprint};
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{DriverConfig, SessionDriver};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(args)?;

    info!(
        working_dir = %blueprint.session.working_dir.display(),
        headless = blueprint.session.headless,
        vehicles = blueprint.vehicles.len(),
        props = blueprint.props.len(),
        policy = ?blueprint.session.sensor_failure_policy,
        "Scenario loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - scenario is valid, exiting");
        print_scenario_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let driver = SessionDriver::new(DriverConfig {
        blueprint,
        max_steps: (args.max_steps != 0).then_some(args.max_steps),
        real_time: !args.fast,
    });
    let stop = driver.stop_handle();

    info!("Starting session...");
    let mut task = tokio::task::spawn_blocking(move || driver.run());

    // The loop always finishes its own stop/close, so the task is awaited
    // in both branches.
    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping session...");
            stop.request_stop();
            task.await
        }
    };

    let stats = joined
        .map_err(|e| CliError::shutdown(e.to_string()))?
        .context("Session execution failed")?;

    info!(
        steps = stats.session.steps,
        sim_time = stats.session.sim_time,
        duration_secs = stats.duration.as_secs_f64(),
        "Session completed"
    );
    stats.print_summary();

    info!("Sim Scenario finished");
    Ok(())
}

/// Scenario from file or the built-in reference, with CLI overrides applied
fn load_blueprint(args: &RunArgs) -> Result<SessionBlueprint> {
    let mut blueprint = if args.reference {
        info!("Using built-in reference scene");
        SessionBlueprint::reference()
    } else {
        info!(config = %args.config.display(), "Loading scenario");
        if !args.config.exists() {
            return Err(CliError::scenario_not_found(&args.config).into());
        }
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load scenario from {}", args.config.display()))?
    };

    if let Some(ref dir) = args.working_dir {
        info!(working_dir = %dir.display(), "Overriding working directory from CLI");
        blueprint.session.working_dir = dir.clone();
    }
    if args.headless {
        blueprint.session.headless = true;
    }
    if let Some(policy) = args.sensor_policy {
        let policy = SensorFailurePolicy::from(policy);
        info!(?policy, "Overriding sensor failure policy from CLI");
        blueprint.session.sensor_failure_policy = policy;
    }
    if args.cache_sensor_config {
        blueprint.session.cache_sensor_config = true;
    }

    Ok(blueprint)
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print scenario summary for dry-run mode
fn print_scenario_summary(blueprint: &SessionBlueprint) {
    println!("\n=== Scenario Summary ===\n");
    println!("Session:");
    println!("  Working dir: {}", blueprint.session.working_dir.display());
    println!("  Sensor config: {}", blueprint.session.sensor_config);
    println!("  Topic prefix: {}", blueprint.session.topic_prefix);
    println!(
        "  Physics dt: {:.4}s, rendering dt: {:.4}s",
        blueprint.world.physics_dt, blueprint.world.rendering_dt
    );

    println!("\nProps ({}):", blueprint.props.len());
    for prop in &blueprint.props {
        println!("  - {} at {} ({})", prop.name, prop.prim_path, prop.asset);
    }

    println!("\nVehicles ({}):", blueprint.vehicles.len());
    for vehicle in &blueprint.vehicles {
        let sensors: Vec<_> = vehicle
            .requested_sensors()
            .map(|kind| kind.config_key())
            .collect();
        println!(
            "  - {} ({}) at {:?} - sensors: {:?}",
            vehicle.id, vehicle.robot, vehicle.position, sensors
        );
    }

    println!();
}
