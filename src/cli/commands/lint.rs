//! Lint command - run the two static-analysis passes

use crate::cli::args::LintArgs;
use crate::cli::commands::resolve_project_dir;
use crate::config::Config;
use crate::error::{WheelwrightError, WheelwrightResult};
use crate::toolchain::{Analyzer, Flake8, Ruleset};
use console::style;

/// Execute the lint command
pub async fn execute(args: LintArgs, config: &Config) -> WheelwrightResult<()> {
    let project_dir = resolve_project_dir(args.project.as_deref(), config)?;
    let analyzer = Flake8::new(config.python.interpreter.clone());

    // Gate pass: syntax errors and undefined names abort
    let gate = Ruleset::gate(config.lint.gate_select.clone());
    let report = analyzer.analyze(&project_dir, &gate).await?;
    if report.findings > 0 {
        print!("{}", report.output);
        return Err(WheelwrightError::AnalysisGate {
            count: report.findings,
        });
    }
    println!("{} Gate pass clean", style("✓").green());

    if args.gate_only {
        return Ok(());
    }

    // Advisory pass: reported, never fatal
    let advisory = Ruleset::advisory(config.lint.max_complexity, config.lint.max_line_length);
    let report = analyzer.analyze(&project_dir, &advisory).await?;
    if report.findings > 0 {
        print!("{}", report.output);
        println!(
            "{} {} advisory finding(s), not blocking",
            style("!").yellow(),
            report.findings
        );
    } else {
        println!("{} Advisory pass clean", style("✓").green());
    }

    Ok(())
}
