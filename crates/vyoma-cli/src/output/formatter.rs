use colored::*;
use vyoma_gate::{GateSummary, Severity, Stage};

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "Critical".red().bold(),
        Severity::High => "High".red(),
        Severity::Medium => "Medium".truecolor(255, 165, 0), // Orange
        Severity::Low => "Low".yellow(),
        Severity::Info => "Info".dimmed(),
    }
}

/// Count lines for the gated severities, e.g. `Critical: 1 (threshold: 0)`.
pub fn count_lines(summary: &GateSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if let (Some(count), Some(threshold)) = (summary.critical_count, summary.threshold_critical) {
        lines.push(format!(
            "{}: {} (threshold: {})",
            severity_label(Severity::Critical),
            count,
            threshold
        ));
    }
    if let (Some(count), Some(threshold)) = (summary.high_count, summary.threshold_high) {
        lines.push(format!(
            "{}: {} (threshold: {})",
            severity_label(Severity::High),
            count,
            threshold
        ));
    }
    lines
}

pub fn print_summary(summary: &GateSummary, quiet: bool) {
    if !quiet {
        let counts = count_lines(summary);
        if !counts.is_empty() {
            println!("\n📊 Vulnerability Summary:");
            for line in counts {
                println!("   {}", line);
            }
            if let Some(all) = &summary.severity_counts {
                let others: Vec<String> = [Severity::Medium, Severity::Low, Severity::Info]
                    .into_iter()
                    .filter_map(|s| all.get(&s).map(|n| format!("{} {}", n, s.as_str())))
                    .collect();
                if !others.is_empty() {
                    println!("   {}", format!("Also found: {}", others.join(", ")).dimmed());
                }
            }
        }
        if let Some(path) = &summary.report_path {
            println!("   {}", format!("Report: {}", path.display()).dimmed());
        }

        if summary.passed() {
            println!("\n{} {}", "✅".green(), summary.message.green());
        } else if summary.stage == Stage::Decided {
            println!("\n{} {}", "❌".red(), summary.message.red());
        } else {
            println!("\n{} Security scan failed: {}", "❌".red(), summary.message.red());
        }
    }

    println!("{}", decision_line(summary));
}

fn decision_line(summary: &GateSummary) -> ColoredString {
    let line = summary.decision_line();
    if summary.passed() {
        line.green().bold()
    } else {
        line.red().bold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vyoma_gate::GateStatus;

    #[test]
    fn count_lines_show_thresholds() {
        colored::control::set_override(false);
        let mut summary =
            GateSummary::new(GateStatus::Failed, Stage::Decided, "exceeded".to_string());
        summary.critical_count = Some(2);
        summary.threshold_critical = Some(0);
        summary.high_count = Some(1);
        summary.threshold_high = Some(5);

        assert_eq!(
            count_lines(&summary),
            vec![
                "Critical: 2 (threshold: 0)".to_string(),
                "High: 1 (threshold: 5)".to_string()
            ]
        );
    }

    #[test]
    fn no_counts_before_evaluation() {
        let summary = GateSummary::new(GateStatus::Failed, Stage::Failed, "boom".to_string());
        assert!(count_lines(&summary).is_empty());
    }
}
