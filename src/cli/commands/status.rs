//! Status command - check external collaborator availability

use crate::cli::commands::resolve_project_dir;
use crate::config::Config;
use crate::engine::{EngineInstaller, ScriptEngineInstaller};
use crate::error::WheelwrightResult;
use crate::toolchain::{process, AptInstaller, Flake8, Pip, Pytest, SystemInstaller};
use crate::toolchain::{Analyzer, TestRunner};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(config: &Config) -> WheelwrightResult<()> {
    println!("{}", style("Wheelwright Status").bold().cyan());
    println!();

    let mut all_ok = true;

    println!("{}", style("System:").bold());
    let apt = AptInstaller::new(config.system.use_sudo);
    all_ok &= report("apt-get", apt.is_available().await, "install apt (Debian/Ubuntu)");

    println!();
    println!("{}", style("Python toolchain:").bold());
    let python = &config.python.interpreter;
    all_ok &= report(
        python,
        process::available(python).await,
        "install the configured interpreter",
    );
    all_ok &= report(
        "pip",
        Pip::new(python.clone()).is_available().await,
        "python3 -m ensurepip",
    );
    all_ok &= report(
        "flake8",
        Flake8::new(python.clone()).is_available().await,
        "pip install flake8",
    );
    all_ok &= report(
        "pytest",
        Pytest::new(python.clone(), config.project.package.clone())
            .is_available()
            .await,
        "pip install pytest pytest-cov",
    );

    println!();
    println!("{}", style("Engine installer:").bold());
    let project_dir = resolve_project_dir(None, config)?;
    let script = if config.engine.installer_script.is_absolute() {
        config.engine.installer_script.clone()
    } else {
        project_dir.join(&config.engine.installer_script)
    };
    let installer = ScriptEngineInstaller::new(script);
    all_ok &= report(
        &installer.installer_name(),
        installer.is_available().await,
        "set engine.installer_script in the config",
    );
    for entry in &config.engine.matrix {
        println!("  {} matrix entry {}", CHECK, entry);
    }

    println!();
    if all_ok {
        println!("{}", style("All collaborators available").green().bold());
    } else {
        println!(
            "{}",
            style("Some collaborators missing - see above").yellow().bold()
        );
    }

    Ok(())
}

fn report(name: &str, ok: bool, hint: &str) -> bool {
    if ok {
        println!("  {} {}", CHECK, name);
    } else {
        println!("  {} {} - {}", CROSS, style(name).red(), style(hint).dim());
    }
    ok
}
