use super::{display_path, find_documents, OutputFormat};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use plinth_guardrails::{Diagnostic, DiagnosticLevel, GuardrailResult, Guardrails};
use plinth_registry::SurfaceRegistry;
use plinth_schema::parse_document;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Request documents, or directories searched for .json files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Outcome of checking one document file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCheck {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GuardrailResult>,
    /// Parse failure, when the document never reached the guardrails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.result.as_ref().map_or(true, GuardrailResult::is_ok)
    }
}

pub fn check(args: CheckArgs, config: &Config, cwd: &Path) -> Result<()> {
    let registry = config.registry(cwd)?;
    let guardrails = config.guardrails();

    let checks = find_documents(&args.paths, cwd)?
        .iter()
        .map(|path| check_file(path, cwd, &registry, &guardrails))
        .collect::<Result<Vec<_>>>()?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&checks)?),
        OutputFormat::Text => print_checks(&checks),
    }

    let failed = checks.iter().filter(|c| !c.is_ok()).count();
    if failed > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} documents failed the check",
            failed,
            checks.len()
        ));
    }

    Ok(())
}

pub fn check_file(
    path: &Path,
    cwd: &Path,
    registry: &SurfaceRegistry,
    guardrails: &Guardrails,
) -> Result<FileCheck> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let path = display_path(path, cwd);

    let document = match parse_document(&source) {
        Ok(document) => document,
        Err(err) => {
            return Ok(FileCheck {
                path,
                surface_id: None,
                result: None,
                error: Some(err.to_string()),
            })
        }
    };

    let surface = registry.resolve_surface_config(&document.meta);
    let result = guardrails.evaluate(&document, source.len(), surface);

    Ok(FileCheck {
        path,
        surface_id: Some(surface.id.clone()),
        result: Some(result),
        error: None,
    })
}

fn print_checks(checks: &[FileCheck]) {
    let mut errors = 0;
    let mut warnings = 0;

    for check in checks {
        let mark = if check.is_ok() { "✓".green() } else { "✗".red() };

        if let Some(error) = &check.error {
            println!("{} {}", mark, check.path);
            println!("  {} [parse] {}", "error".red().bold(), error);
            errors += 1;
            continue;
        }

        if let Some(result) = &check.result {
            println!(
                "{} {} {}",
                mark,
                check.path,
                format!(
                    "(surface {}, {} nodes, depth {}, {} bytes)",
                    check.surface_id.as_deref().unwrap_or("default"),
                    result.metrics.node_count,
                    result.metrics.depth,
                    result.metrics.file_size
                )
                .dimmed()
            );
            for diagnostic in result.errors.iter().chain(&result.warnings) {
                print_diagnostic(diagnostic);
            }
            errors += result.errors.len();
            warnings += result.warnings.len();
        }
    }

    println!();
    println!("   Documents checked: {}", checks.len());
    if errors > 0 {
        println!("   {} {}", "Errors:".red(), errors);
    }
    if warnings > 0 {
        println!("   {} {}", "Warnings:".yellow(), warnings);
    }
    if errors == 0 && warnings == 0 {
        println!("   {} No issues found!", "✓".green());
    }
}

pub fn print_diagnostic(diagnostic: &Diagnostic) {
    let level = match diagnostic.level {
        DiagnosticLevel::Error => "error".red().bold(),
        DiagnosticLevel::Warning => "warning".yellow().bold(),
    };
    println!("  {} [{}] {}", level, diagnostic.rule, diagnostic.message);

    if let Some(suggestion) = &diagnostic.suggestion {
        println!("    {} {}", "💡".dimmed(), suggestion.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_check_file_reports_guardrails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "page.json",
            r#"{ "nodes": [ { "type": "text", "name": "Title", "content": "Hi" } ] }"#,
        );

        let check = check_file(&path, dir.path(), &SurfaceRegistry::new(), &Guardrails::default()).unwrap();
        assert!(check.is_ok());
        assert_eq!(check.path, "page.json");
        assert_eq!(check.surface_id.as_deref(), Some("default"));
        assert_eq!(check.result.unwrap().metrics.node_count, 1);
    }

    #[test]
    fn test_check_file_keeps_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.json", "{ nodes: ");

        let check = check_file(&path, dir.path(), &SurfaceRegistry::new(), &Guardrails::default()).unwrap();
        assert!(!check.is_ok());
        assert!(check.result.is_none());
        assert!(check.error.is_some());
    }

    #[test]
    fn test_check_fails_when_any_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.json", r#"{ "nodes": [] }"#);
        write(dir.path(), "bad.json", "[]");

        let args = CheckArgs {
            paths: vec![PathBuf::from(".")],
            format: OutputFormat::Json,
        };
        assert!(check(args, &Config::default(), dir.path()).is_err());
    }
}
