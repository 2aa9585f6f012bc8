//! Provision command - run the full pipeline

use crate::cache::FsWheelStore;
use crate::cli::args::ProvisionArgs;
use crate::cli::commands::{manifest_paths, resolve_project_dir, wheel_store_root};
use crate::config::Config;
use crate::engine::{self, ScriptEngineInstaller};
use crate::error::WheelwrightResult;
use crate::pipeline::{Collaborators, ProvisionPlan, Provisioner, RunReport, StageOutcome};
use crate::toolchain::{AptInstaller, Flake8, Pip, Pytest, Ruleset};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

/// Execute the provision command
pub async fn execute(args: ProvisionArgs, config: &Config) -> WheelwrightResult<()> {
    let pb = create_progress_bar("Planning run...");

    let project_dir = resolve_project_dir(args.project.as_deref(), config)?;
    debug!("Project directory: {}", project_dir.display());

    let engine = engine::select_entry(&config.engine.matrix, args.engine.as_deref())?.clone();
    let python = args
        .python
        .clone()
        .unwrap_or_else(|| config.python.interpreter.clone());

    let installer_script = if config.engine.installer_script.is_absolute() {
        config.engine.installer_script.clone()
    } else {
        project_dir.join(&config.engine.installer_script)
    };

    let plan = ProvisionPlan {
        manifests: manifest_paths(&project_dir, config),
        project_dir,
        system_packages: config.system.packages.clone(),
        engine,
        extra_package: config.project.extra_package.clone(),
        gate: Ruleset::gate(config.lint.gate_select.clone()),
        advisory: Ruleset::advisory(config.lint.max_complexity, config.lint.max_line_length),
        namespace: config.cache.namespace.clone(),
        fresh: args.fresh,
    };

    let collaborators = Collaborators {
        system: Box::new(AptInstaller::new(config.system.use_sudo)),
        engine: Box::new(ScriptEngineInstaller::new(installer_script)),
        wheels: Box::new(Pip::new(python.clone())),
        deps: Box::new(Pip::new(python.clone())),
        analyzer: Box::new(Flake8::new(python.clone())),
        tests: Box::new(Pytest::new(python, config.project.package.clone())),
        store: Box::new(FsWheelStore::new(wheel_store_root(config))),
    };

    // Stage output streams to the terminal, so the spinner stops here
    pb.finish_and_clear();

    let report = Provisioner::new(plan, collaborators).run().await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!(
        "{} Run {} succeeded",
        style("✓").green(),
        style(&report.run_id).cyan()
    );
    println!("  Engine:       {}", report.engine);
    println!(
        "  Cache key:    {} ({})",
        report.cache_key,
        if report.cache_hit {
            style("hit").green().to_string()
        } else {
            style("miss").yellow().to_string()
        }
    );
    println!("  Requirements: {}", report.requirement_count);
    println!();

    for stage in &report.stages {
        let (symbol, detail) = match &stage.outcome {
            StageOutcome::Passed => (style("✓").green(), String::new()),
            StageOutcome::Skipped { reason } => (style("→").dim(), format!(" ({reason})")),
            StageOutcome::Advisory { findings } => {
                (style("!").yellow(), format!(" ({findings} advisory)"))
            }
        };
        println!(
            "  {} {:<20} {:.1?}{}",
            symbol,
            stage.stage.label(),
            stage.duration,
            detail
        );
    }

    if report.advisory_findings > 0 {
        println!();
        println!(
            "  {} {} advisory finding(s) reported, not blocking",
            style("!").yellow(),
            report.advisory_findings
        );
    }
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
