use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use vyoma_config::ConfigLayer;

use crate::cli::CiPlatform;

pub const DEFAULT_CONFIG_FILE: &str = "vyoma.json";

const GITHUB_TEMPLATE: &str = include_str!("../templates/ci_github.yml");
const GITLAB_TEMPLATE: &str = include_str!("../templates/ci_gitlab.yml");
const JENKINS_TEMPLATE: &str = include_str!("../templates/Jenkinsfile");

struct CiTemplate {
    label: &'static str,
    path: &'static str,
    body: &'static str,
    /// Where the pipeline expects the target URL to come from.
    target_source: &'static str,
}

fn templates_for(platform: CiPlatform) -> Vec<CiTemplate> {
    let github = CiTemplate {
        label: "GitHub Actions workflow",
        path: ".github/workflows/vyoma-scan.yml",
        body: GITHUB_TEMPLATE,
        target_source: "repository secret TARGET_URL",
    };
    let gitlab = CiTemplate {
        label: "GitLab CI configuration",
        path: ".gitlab-ci.yml",
        body: GITLAB_TEMPLATE,
        target_source: "CI/CD variable CI_TARGET_URL",
    };
    let jenkins = CiTemplate {
        label: "Jenkinsfile",
        path: "Jenkinsfile",
        body: JENKINS_TEMPLATE,
        target_source: "environment variable TARGET_URL",
    };

    match platform {
        CiPlatform::Github => vec![github],
        CiPlatform::Gitlab => vec![gitlab],
        CiPlatform::Jenkins => vec![jenkins],
        CiPlatform::All => vec![github, gitlab, jenkins],
    }
}

pub fn init(ci: Option<CiPlatform>, target_url: Option<&str>, force: bool) -> Result<()> {
    match ci {
        Some(platform) => generate_ci_templates(Path::new("."), platform, target_url, force),
        None => generate_config(Path::new(DEFAULT_CONFIG_FILE), target_url, force),
    }
}

fn generate_config(path: &Path, target_url: Option<&str>, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists! Use --force to overwrite.",
            path.display()
        );
    }

    let defaults = ConfigLayer::defaults();
    let layer = ConfigLayer {
        target_url: target_url.map(str::to_string).or(defaults.target_url),
        scan_mode: defaults.scan_mode,
        report_format: defaults.report_format,
        output_dir: defaults.output_dir,
        threshold_critical: defaults.threshold_critical,
        threshold_high: defaults.threshold_high,
        ..ConfigLayer::default()
    };

    let content = serde_json::to_string_pretty(&layer)?;
    fs::write(path, format!("{content}\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{}",
        format!("Generated configuration at {}", path.display()).green()
    );
    println!(
        "{}",
        format!("Tip: Run `vyoma-ci gate --config {}`.", path.display()).dimmed()
    );
    Ok(())
}

fn generate_ci_templates(
    root: &Path,
    platform: CiPlatform,
    target_url: Option<&str>,
    force: bool,
) -> Result<()> {
    let templates = templates_for(platform);

    // Refuse before writing anything so a partial `all` never happens.
    if !force {
        let existing: Vec<PathBuf> = templates
            .iter()
            .map(|t| root.join(t.path))
            .filter(|p| p.exists())
            .collect();
        if !existing.is_empty() {
            let names: Vec<String> = existing.iter().map(|p| p.display().to_string()).collect();
            anyhow::bail!(
                "{} already exists! Use --force to overwrite.",
                names.join(", ")
            );
        }
    }

    let version = env!("CARGO_PKG_VERSION");
    for template in &templates {
        let file_path = root.join(template.path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = render_template(template.body, version);
        fs::write(&file_path, content)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;
        println!(
            "{}",
            format!("Generated {} at {}", template.label, template.path).green()
        );
    }

    println!("\n{}", "Next steps:".bold());
    println!("1. Review the generated pipeline files");
    println!("2. Provide the target URL to your pipelines:");
    for template in &templates {
        println!("   - {}: {}", template.label, template.target_source);
    }
    if let Some(url) = target_url {
        println!("   Target URL: {}", url);
    }
    println!("3. Default thresholds: 0 critical, 5 high vulnerabilities");
    println!(
        "{}",
        "Tip: Run `vyoma-ci gate --help` for all options.".dimmed()
    );

    Ok(())
}

fn render_template(body: &str, version: &str) -> String {
    body.replace("{{VYOMA_CI_VERSION}}", version)
}
