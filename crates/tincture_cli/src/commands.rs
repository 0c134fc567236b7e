//! Subcommand implementations.

use std::fmt::Write as _;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tincture::validator::validate_document;
use tincture::{
    EngineConfig, InMemoryTarget, JsonDirStorage, RenderTarget, Theme, ThemeEngine, ThemeStorage,
    ValidationResult, accessibility_score, compress, decompress, merge_with_defaults, read_document,
    theme_health,
};
use tracing::{debug, warn};

use crate::cli::{ListArgs, ThemeArgs, ValidateArgs};

fn load(path: &Path) -> Result<Value> {
    read_document(path).with_context(|| format!("failed to read theme file {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

pub fn validate(args: &ValidateArgs, config: &EngineConfig) -> Result<ExitCode> {
    let document = load(&args.file)?;
    let options = args.options(&config.validation);
    let result = validate_document(&document, &options);

    if args.json {
        print_json(&result)?;
    } else {
        print!("{}", render_result(&args.file, &result));
    }

    Ok(if result.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn render_result(path: &Path, result: &ValidationResult) -> String {
    let mut out = String::new();
    let verdict = if result.is_valid { "valid" } else { "invalid" };
    let _ = writeln!(
        out,
        "{}: {verdict} ({} errors, {} warnings)",
        path.display(),
        result.errors.len(),
        result.warnings.len()
    );
    for issue in &result.errors {
        let _ = writeln!(
            out,
            "  error   [{:?}] {}: {}",
            issue.severity, issue.field, issue.message
        );
    }
    for issue in &result.warnings {
        let _ = writeln!(out, "  warning {}: {}", issue.field, issue.message);
    }
    out
}

pub fn score(args: &ThemeArgs, config: &EngineConfig) -> Result<ExitCode> {
    let document = load(&args.file)?;
    let theme = merge_with_defaults(&document, &Theme::extract());
    let report = accessibility_score(&theme);
    let health = theme_health(&theme, &config.validation);

    println!("{}: accessibility {}/100", theme.id, report.score);
    for check in &report.checks {
        println!("  {:<28} {:>6.2}  {:?}", check.label, check.ratio, check.level);
    }
    println!(
        "health {} ({:?}): {} errors, {} warnings",
        health.score, health.grade, health.error_count, health.warning_count
    );
    Ok(ExitCode::SUCCESS)
}

pub fn vars(args: &ThemeArgs, config: &EngineConfig) -> Result<ExitCode> {
    let document = load(&args.file)?;
    let target = Arc::new(InMemoryTarget::new());
    let engine = ThemeEngine::builder()
        .config(config.clone())
        .target(Arc::clone(&target) as Arc<dyn RenderTarget>)
        .build();

    let outcome = engine.apply_theme(&document);
    for error in &outcome.errors {
        warn!(
            theme.id = %outcome.theme.id,
            error.code = %error.code,
            error.field = error.field.as_deref().unwrap_or(""),
            recovery.action = error.fallback_action.as_deref().unwrap_or("none"),
            "{}",
            error.message
        );
    }

    let mut css = String::from(":root {\n");
    for (name, value) in target.snapshot() {
        let _ = writeln!(css, "  {name}: {value};");
    }
    css.push_str("}\n");
    print!("{css}");
    Ok(ExitCode::SUCCESS)
}

pub fn compress_file(args: &ThemeArgs) -> Result<ExitCode> {
    let document = load(&args.file)?;
    let theme: Theme = serde_json::from_value(document)
        .with_context(|| format!("{} is not a complete theme", args.file.display()))?;
    print_json(&compress(&theme)?)?;
    Ok(ExitCode::SUCCESS)
}

pub fn decompress_file(args: &ThemeArgs) -> Result<ExitCode> {
    let document = load(&args.file)?;
    let theme = decompress(&document)
        .with_context(|| format!("{} is not a compressed theme", args.file.display()))?;
    print_json(&theme)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn list(args: &ListArgs) -> Result<ExitCode> {
    let storage = JsonDirStorage::new(&args.dir);
    let themes = storage
        .list()
        .await
        .with_context(|| format!("failed to list themes in {}", args.dir.display()))?;
    debug!(dir = %args.dir.display(), themes = themes.len(), "Listed stored themes");
    for meta in themes {
        println!("{}\t{}\t{}", meta.name, meta.version, meta.author);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn default_theme() -> Result<ExitCode> {
    print_json(&Theme::extract())?;
    Ok(ExitCode::SUCCESS)
}
