use super::run::{execute, report};
use super::{OutputFormat, TargetArgs};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use plinth_registry::SectionEntry;
use std::path::Path;

#[derive(Args, Debug)]
pub struct SectionsArgs {
    /// Only sections of this surface
    #[arg(long)]
    pub surface: Option<String>,

    /// Only sections placed in this slot
    #[arg(long)]
    pub slot: Option<String>,

    /// Execute the listed sections as one batch
    #[arg(long)]
    pub run: bool,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn sections(args: SectionsArgs, config: &Config, cwd: &Path) -> Result<()> {
    let registry = config.registry(cwd)?;
    let entries = registry.sections(args.surface.as_deref(), args.slot.as_deref());

    if !args.run {
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Text => print_sections(&entries),
        }
        return Ok(());
    }

    if entries.is_empty() {
        return Err(anyhow::anyhow!("No catalog sections match"));
    }

    let labels: Vec<String> = entries.iter().map(|s| s.id.clone()).collect();
    let documents: Vec<String> = entries.iter().map(|s| s.document.clone()).collect();
    let request = args.target.request(documents)?;

    let (outcome, notices) = execute(&request, config, cwd).await?;
    report(&outcome, &labels, &notices, args.format)
}

fn print_sections(entries: &[&SectionEntry]) {
    if entries.is_empty() {
        println!("No sections found");
        return;
    }

    for section in entries {
        println!(
            "{:>4}  {}  {}{}",
            section.order,
            section.id.bright_white(),
            format!(
                "{}/{}",
                section.surface,
                section.slot.as_deref().unwrap_or("root")
            )
            .dimmed(),
            section
                .title
                .as_deref()
                .map(|t| format!("  {}", t))
                .unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG_NAME;
    use plinth_engine::{Canvas, MemoryCanvas};
    use std::fs;

    const CATALOG: &str = r#"{
        "surfaces": {
            "docs": { "label": "Docs", "slots": [ { "id": "body" } ] }
        },
        "sections": [
            {
                "id": "outro", "surface": "docs", "slot": "body", "order": 2,
                "document": "{\"meta\":{\"designSurface\":\"docs\",\"slot\":\"body\"},\"nodes\":[{\"type\":\"text\",\"name\":\"Outro\",\"content\":\"Bye\"}]}"
            },
            {
                "id": "intro", "surface": "docs", "slot": "body", "order": 1,
                "document": "{\"meta\":{\"designSurface\":\"docs\",\"slot\":\"body\"},\"nodes\":[{\"type\":\"text\",\"name\":\"Intro\",\"content\":\"Hi\"}]}"
            }
        ]
    }"#;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "catalog": "catalog.json", "canvas": "canvas.json" }"#,
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_run_sections_in_catalog_order() {
        let dir = workspace();
        let config = Config::load(dir.path()).unwrap();
        let args = SectionsArgs {
            surface: Some("docs".to_string()),
            slot: None,
            run: true,
            target: TargetArgs {
                frame: Some("Docs Page".to_string()),
                ..TargetArgs::default()
            },
            format: OutputFormat::Json,
        };

        sections(args, &config, dir.path()).await.unwrap();

        let canvas = MemoryCanvas::load_or_default(&dir.path().join("canvas.json")).unwrap();
        let frame = canvas.children(canvas.current_page())[0];
        assert_eq!(canvas.node_name(frame).as_deref(), Some("Docs Page"));
        let body = canvas.children(frame)[0];
        let names: Vec<String> = canvas
            .children(body)
            .into_iter()
            .filter_map(|id| canvas.node_name(id))
            .collect();
        assert_eq!(names, vec!["Intro".to_string(), "Outro".to_string()]);
    }

    #[tokio::test]
    async fn test_run_without_matches_fails() {
        let dir = workspace();
        let config = Config::load(dir.path()).unwrap();
        let args = SectionsArgs {
            surface: Some("marketing".to_string()),
            slot: None,
            run: true,
            target: TargetArgs::default(),
            format: OutputFormat::Text,
        };

        assert!(sections(args, &config, dir.path()).await.is_err());
        assert!(!dir.path().join("canvas.json").exists());
    }
}
