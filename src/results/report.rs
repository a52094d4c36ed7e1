//! Report generation from merged feature results
//!
//! Renders the merged behave JSON document as an HTML page or a console
//! summary.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Deserialize;
use std::fmt::Write;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Report output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Html,
}

/// Free text that the runner may emit as one string or as a list of lines
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TextBlock {
    Text(String),
    Lines(Vec<String>),
}

impl TextBlock {
    pub fn joined(&self) -> String {
        match self {
            TextBlock::Text(text) => text.clone(),
            TextBlock::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Tag entry, either a bare name or an object carrying one
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    Name(String),
    Object { name: String },
}

impl TagEntry {
    pub fn name(&self) -> &str {
        match self {
            TagEntry::Name(name) | TagEntry::Object { name } => name,
        }
    }
}

/// One feature of the merged result document
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeatureReport {
    pub name: Option<String>,
    pub description: Option<TextBlock>,
    pub tags: Vec<TagEntry>,
    pub status: Option<String>,
    pub elements: Vec<ScenarioReport>,
}

impl FeatureReport {
    fn scenarios(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.elements.iter().filter(|e| e.is_scenario())
    }
}

/// Scenario or background of a feature
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioReport {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub duration: Option<f64>,
    pub tags: Vec<TagEntry>,
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    pub fn is_scenario(&self) -> bool {
        self.kind.as_deref() == Some("scenario")
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StepReport {
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub result: Option<StepOutcome>,
    pub embeddings: Vec<Embedding>,
}

impl StepReport {
    pub fn status(&self) -> &str {
        self.result
            .as_ref()
            .and_then(|r| r.status.as_deref())
            .unwrap_or("unknown")
    }

    pub fn duration(&self) -> f64 {
        self.result.as_ref().and_then(|r| r.duration).unwrap_or(0.0)
    }

    pub fn error_message(&self) -> Option<String> {
        self.result
            .as_ref()
            .and_then(|r| r.error_message.as_ref())
            .map(TextBlock::joined)
            .filter(|msg| !msg.is_empty())
    }

    fn screenshots(&self) -> impl Iterator<Item = &str> {
        self.embeddings
            .iter()
            .filter(|e| e.mime_type.as_deref() == Some("image/png"))
            .map(|e| e.data.as_deref().unwrap_or_default())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StepOutcome {
    pub status: Option<String>,
    pub duration: Option<f64>,
    pub error_message: Option<TextBlock>,
}

/// Attachment recorded by a step
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Embedding {
    pub mime_type: Option<String>,
    pub data: Option<String>,
}

/// Scenario and step counts over the merged document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportStatistics {
    pub total_features: usize,
    pub total_scenarios: usize,
    pub passed_scenarios: usize,
    pub failed_scenarios: usize,
    pub skipped_scenarios: usize,
    pub total_steps: usize,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
    pub undefined_steps: usize,
    /// Sum of scenario durations in seconds
    pub total_duration: f64,
    /// Indices of features with at least one failed scenario
    pub failed_features: Vec<usize>,
    /// Indices of features whose scenarios all avoided failure
    pub passed_features: Vec<usize>,
}

impl ReportStatistics {
    pub fn calculate(features: &[FeatureReport]) -> Self {
        let mut stats = Self {
            total_features: features.len(),
            ..Default::default()
        };

        for (index, feature) in features.iter().enumerate() {
            let mut scenarios = 0;
            let mut feature_failed = false;

            for scenario in feature.scenarios() {
                scenarios += 1;
                stats.total_scenarios += 1;
                stats.total_duration += scenario.duration.unwrap_or(0.0);

                match scenario.status() {
                    "passed" => stats.passed_scenarios += 1,
                    "failed" => {
                        stats.failed_scenarios += 1;
                        feature_failed = true;
                    }
                    "skipped" => stats.skipped_scenarios += 1,
                    _ => {}
                }

                for step in &scenario.steps {
                    stats.total_steps += 1;
                    match step.status() {
                        "passed" => stats.passed_steps += 1,
                        "failed" => stats.failed_steps += 1,
                        "skipped" => stats.skipped_steps += 1,
                        "undefined" => stats.undefined_steps += 1,
                        _ => {}
                    }
                }
            }

            if scenarios > 0 {
                if feature_failed {
                    stats.failed_features.push(index);
                } else {
                    stats.passed_features.push(index);
                }
            }
        }

        stats
    }

    /// Percentage of scenarios that passed
    pub fn success_rate(&self) -> f64 {
        if self.total_scenarios == 0 {
            0.0
        } else {
            self.passed_scenarios as f64 / self.total_scenarios as f64 * 100.0
        }
    }

    fn share(&self, count: usize) -> f64 {
        if self.total_scenarios == 0 {
            0.0
        } else {
            count as f64 / self.total_scenarios as f64 * 100.0
        }
    }
}

/// Report generator over a merged result document
pub struct ReportGenerator {
    features: Vec<FeatureReport>,
    stats: ReportStatistics,
    project: Option<String>,
}

impl ReportGenerator {
    pub fn new(features: Vec<FeatureReport>) -> Self {
        let stats = ReportStatistics::calculate(&features);
        Self {
            features,
            stats,
            project: None,
        }
    }

    /// Load the merged document written by the result merger
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open results: {}", path.display()))?;
        let features: Vec<FeatureReport> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse results: {}", path.display()))?;
        Ok(Self::new(features))
    }

    /// Name shown under the report title
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn statistics(&self) -> &ReportStatistics {
        &self.stats
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        let mut output = String::new();
        match format {
            ReportFormat::Text => self.format_text_report(&mut output)?,
            ReportFormat::Html => self.format_html_report(&mut output)?,
        }
        Ok(output)
    }

    /// Render the HTML report to a file
    pub fn write_html(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let html = self.render(ReportFormat::Html)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        info!("HTML report written to {}", path.display());
        Ok(())
    }

    fn format_text_report(&self, output: &mut String) -> std::fmt::Result {
        let stats = &self.stats;

        writeln!(output, "{}", "=".repeat(80))?;
        writeln!(output, "  Test Execution Summary")?;
        writeln!(output, "{}", "=".repeat(80))?;
        writeln!(output, "Total Features:     {}", stats.total_features)?;
        writeln!(output, "Total Scenarios:    {}", stats.total_scenarios)?;
        writeln!(output, "Passed:             {}", stats.passed_scenarios)?;
        writeln!(output, "Failed:             {}", stats.failed_scenarios)?;
        writeln!(output, "Skipped:            {}", stats.skipped_scenarios)?;
        writeln!(
            output,
            "Steps:              {} ({} passed, {} failed, {} skipped, {} undefined)",
            stats.total_steps,
            stats.passed_steps,
            stats.failed_steps,
            stats.skipped_steps,
            stats.undefined_steps
        )?;
        writeln!(output, "Success Rate:       {:.1}%", stats.success_rate())?;
        writeln!(
            output,
            "Execution Time:     {}",
            format_duration(stats.total_duration)
        )?;
        writeln!(output, "{}", "=".repeat(80))
    }

    fn format_html_report(&self, output: &mut String) -> std::fmt::Result {
        let stats = &self.stats;
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let subtitle = match &self.project {
            Some(project) => format!("<p>{}</p>", escape_html(project)),
            None => String::new(),
        };

        writeln!(
            output,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Test Execution Report</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Test Execution Report</h1>
            {subtitle}
            <p class="generated">Generated on {timestamp}</p>
        </div>
        <div class="stats-grid">"#
        )?;

        let duration = format_duration(stats.total_duration);
        let cards = [
            (
                "success",
                "Success Rate",
                format!("{:.1}%", stats.success_rate()),
                "Overall Performance".to_string(),
            ),
            (
                "info",
                "Total Scenarios",
                stats.total_scenarios.to_string(),
                format!("{} Features", stats.total_features),
            ),
            (
                "success",
                "Passed",
                stats.passed_scenarios.to_string(),
                format!("{} Steps", stats.passed_steps),
            ),
            (
                "danger",
                "Failed",
                stats.failed_scenarios.to_string(),
                format!("{} Steps", stats.failed_steps),
            ),
            (
                "warning",
                "Skipped",
                stats.skipped_scenarios.to_string(),
                format!("{} Steps", stats.skipped_steps),
            ),
            ("info", "Duration", duration.clone(), "Execution Time".to_string()),
        ];
        for (class, label, value, subtitle) in cards {
            writeln!(
                output,
                r#"            <div class="stat-card {class}">
                <h3>{label}</h3>
                <div class="value">{value}</div>
                <div class="subtitle">{subtitle}</div>
            </div>"#
            )?;
        }

        writeln!(
            output,
            r#"        </div>
        <div class="content">
            <div class="section">
                <h2>Test Results Overview</h2>
                <div class="progress-bar">"#
        )?;
        let segments = [
            ("success", stats.passed_scenarios, "Passed"),
            ("danger", stats.failed_scenarios, "Failed"),
            ("warning", stats.skipped_scenarios, "Skipped"),
        ];
        for (class, count, label) in segments {
            if count > 0 {
                writeln!(
                    output,
                    r#"                    <div class="progress-segment progress-{class}" style="width: {:.1}%">{count} {label}</div>"#,
                    stats.share(count)
                )?;
            }
        }
        writeln!(output, "                </div>\n            </div>")?;

        if !stats.failed_features.is_empty() {
            writeln!(
                output,
                r#"            <div class="section">
                <h2>Failed Features</h2>"#
            )?;
            for &index in &stats.failed_features {
                self.format_feature(output, &self.features[index], false)?;
            }
            writeln!(output, "            </div>")?;
        }

        if !stats.passed_features.is_empty() {
            writeln!(
                output,
                r#"            <div class="section">
                <h2>Passed Features</h2>"#
            )?;
            for &index in &stats.passed_features {
                self.format_feature(output, &self.features[index], true)?;
            }
            writeln!(output, "            </div>")?;
        }

        writeln!(
            output,
            r#"        </div>
        <div class="footer">
            <p>Total execution time: {duration} | {} scenarios | {} steps</p>
        </div>
    </div>
</body>
</html>"#,
            stats.total_scenarios, stats.total_steps
        )
    }

    fn format_feature(
        &self,
        output: &mut String,
        feature: &FeatureReport,
        show_passed: bool,
    ) -> std::fmt::Result {
        let name = feature.name.as_deref().unwrap_or("Unnamed Feature");

        writeln!(output, r#"<div class="feature-card">"#)?;
        writeln!(output, r#"<div class="feature-header">"#)?;
        writeln!(output, "<h3>{}</h3>", escape_html(name))?;
        if let Some(description) = feature.description.as_ref().map(TextBlock::joined) {
            if !description.is_empty() {
                writeln!(
                    output,
                    r#"<div class="description">{}</div>"#,
                    escape_html(&description)
                )?;
            }
        }
        format_tags(output, &feature.tags)?;
        writeln!(output, "</div>")?;

        writeln!(output, r#"<div class="scenario-list">"#)?;
        for scenario in feature.scenarios() {
            let status = scenario.status();
            if !show_passed && status == "passed" {
                continue;
            }

            writeln!(output, r#"<div class="scenario">"#)?;
            writeln!(
                output,
                r#"<div class="scenario-header"><span class="scenario-name">{}</span>{}</div>"#,
                escape_html(scenario.name.as_deref().unwrap_or("Unnamed Scenario")),
                status_badge(status)
            )?;
            format_tags(output, &scenario.tags)?;

            writeln!(output, r#"<table class="steps-table">"#)?;
            writeln!(
                output,
                "<thead><tr><th>Keyword</th><th>Step</th><th>Duration</th><th>Status</th></tr></thead>"
            )?;
            writeln!(output, "<tbody>")?;
            for step in &scenario.steps {
                let step_status = step.status();
                writeln!(
                    output,
                    r#"<tr><td><strong>{}</strong></td><td class="step-{}">{}</td><td>{}</td><td>{}</td></tr>"#,
                    escape_html(step.keyword.as_deref().unwrap_or_default()),
                    escape_html(step_status),
                    escape_html(step.name.as_deref().unwrap_or_default()),
                    format_duration(step.duration()),
                    status_badge(step_status)
                )?;

                if step_status == "failed" {
                    if let Some(message) = step.error_message() {
                        writeln!(
                            output,
                            r#"<tr><td colspan="4"><div class="error-message">{}</div></td></tr>"#,
                            escape_html(&message)
                        )?;
                    }
                }

                let mut screenshots = step.screenshots().peekable();
                if screenshots.peek().is_some() {
                    write!(output, r#"<tr><td colspan="4">"#)?;
                    for data in screenshots {
                        write!(
                            output,
                            r#"<img src="data:image/png;base64,{}" class="screenshot" alt="Screenshot">"#,
                            escape_html(data)
                        )?;
                    }
                    writeln!(output, "</td></tr>")?;
                }
            }
            writeln!(output, "</tbody></table>")?;
            writeln!(output, "</div>")?;
        }
        writeln!(output, "</div></div>")
    }
}

fn format_tags(output: &mut String, tags: &[TagEntry]) -> std::fmt::Result {
    if tags.is_empty() {
        return Ok(());
    }

    write!(output, r#"<div class="feature-tags">"#)?;
    for tag in tags {
        write!(output, r#"<span class="tag">{}</span>"#, escape_html(tag.name()))?;
    }
    writeln!(output, "</div>")
}

fn status_badge(status: &str) -> String {
    match status {
        "passed" => r#"<span class="badge badge-success">&#10003; PASSED</span>"#.to_string(),
        "failed" => r#"<span class="badge badge-danger">&#10007; FAILED</span>"#.to_string(),
        "skipped" => r#"<span class="badge badge-warning">&#8856; SKIPPED</span>"#.to_string(),
        "undefined" => r#"<span class="badge badge-secondary">? UNDEFINED</span>"#.to_string(),
        other => format!(
            r#"<span class="badge badge-secondary">{}</span>"#,
            escape_html(other)
        ),
    }
}

/// Human-readable duration: seconds below a minute, minutes and seconds above
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.2}s")
    } else {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {:.2}s", minutes as u64, seconds - minutes * 60.0)
    }
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 20px; color: #333; }
        .container { max-width: 1400px; margin: 0 auto; background: white; border-radius: 10px; box-shadow: 0 10px 40px rgba(0,0,0,0.2); overflow: hidden; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; }
        .header h1 { font-size: 2.5em; margin-bottom: 10px; }
        .header .generated { font-size: 0.9em; margin-top: 10px; opacity: 0.9; }
        .stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 20px; padding: 30px; background: #f8f9fa; }
        .stat-card { background: white; padding: 25px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); text-align: center; }
        .stat-card h3 { color: #666; font-size: 0.9em; text-transform: uppercase; letter-spacing: 1px; margin-bottom: 10px; }
        .stat-card .value { font-size: 2.5em; font-weight: bold; margin: 10px 0; }
        .stat-card .subtitle { color: #999; font-size: 0.9em; }
        .stat-card.success .value { color: #28a745; }
        .stat-card.danger .value { color: #dc3545; }
        .stat-card.warning .value { color: #ffc107; }
        .stat-card.info .value { color: #17a2b8; }
        .content { padding: 30px; }
        .section { margin-bottom: 40px; }
        .section h2 { color: #667eea; margin-bottom: 20px; padding-bottom: 10px; border-bottom: 2px solid #667eea; }
        .progress-bar { display: flex; height: 40px; border-radius: 20px; overflow: hidden; background: #e9ecef; }
        .progress-segment { display: flex; align-items: center; justify-content: center; color: white; font-weight: bold; }
        .progress-success { background: #28a745; }
        .progress-danger { background: #dc3545; }
        .progress-warning { background: #ffc107; }
        .feature-card { border: 1px solid #ddd; border-radius: 8px; margin-bottom: 20px; overflow: hidden; }
        .feature-header { background: #f8f9fa; padding: 20px; }
        .feature-header h3 { font-size: 1.3em; margin-bottom: 5px; }
        .feature-header .description { color: #666; font-size: 0.9em; margin-top: 5px; white-space: pre-wrap; }
        .feature-tags { margin-top: 10px; }
        .tag { display: inline-block; background: #667eea; color: white; padding: 3px 10px; border-radius: 12px; font-size: 0.75em; margin-right: 5px; }
        .scenario { border-top: 1px solid #eee; padding: 20px; }
        .scenario-header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 15px; }
        .scenario-name { font-weight: bold; font-size: 1.1em; }
        .badge { padding: 5px 12px; border-radius: 12px; font-size: 0.8em; font-weight: bold; color: white; }
        .badge-success { background: #28a745; }
        .badge-danger { background: #dc3545; }
        .badge-warning { background: #ffc107; color: #333; }
        .badge-secondary { background: #6c757d; }
        .steps-table { width: 100%; border-collapse: collapse; margin-top: 10px; }
        .steps-table th, .steps-table td { padding: 10px; text-align: left; border-bottom: 1px solid #eee; }
        .steps-table th { background: #f8f9fa; }
        .step-passed { color: #28a745; }
        .step-failed { color: #dc3545; }
        .step-skipped { color: #ffc107; }
        .step-undefined { color: #6c757d; }
        .error-message { background: #f8d7da; color: #721c24; padding: 15px; border-radius: 5px; font-family: monospace; white-space: pre-wrap; }
        .screenshot { max-width: 100%; margin-top: 10px; border: 1px solid #ddd; border-radius: 5px; }
        .footer { background: #f8f9fa; padding: 20px; text-align: center; color: #666; }
    "#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"[
        {
            "name": "Homepage",
            "description": ["Visitors land on the homepage"],
            "tags": ["smoke"],
            "status": "passed",
            "elements": [
                {"type": "background", "name": "Open site", "steps": [
                    {"keyword": "Given", "name": "the browser is open", "result": {"status": "passed", "duration": 0.5}}
                ]},
                {"type": "scenario", "name": "Hero banner", "status": "passed", "duration": 12.5, "steps": [
                    {"keyword": "Then", "name": "the banner is visible", "result": {"status": "passed", "duration": 1.25}}
                ]}
            ]
        },
        {
            "name": "Contact <form>",
            "tags": [{"name": "regression"}],
            "elements": [
                {"type": "scenario", "name": "Submit empty form", "status": "failed", "duration": 20.0, "steps": [
                    {"keyword": "When", "name": "I submit", "result": {"status": "passed", "duration": 2.0}},
                    {"keyword": "Then", "name": "an error shows", "result": {"status": "failed", "duration": 3.0,
                        "error_message": ["Assertion Failed: expected <div>", "got nothing"]},
                        "embeddings": [{"mime_type": "image/png", "data": "iVBORw0KGgo="}]},
                    {"keyword": "And", "name": "it is red", "result": {"status": "skipped"}}
                ]},
                {"type": "scenario", "name": "Skipped check", "status": "skipped", "steps": [
                    {"keyword": "Given", "name": "a missing step", "result": {"status": "undefined"}}
                ]}
            ]
        },
        {"name": "Empty", "elements": []}
    ]"#;

    fn sample() -> ReportGenerator {
        ReportGenerator::new(serde_json::from_str(SAMPLE).unwrap())
    }

    #[test]
    fn test_statistics() {
        let generator = sample();
        let stats = generator.statistics();

        assert_eq!(stats.total_features, 3);
        assert_eq!(stats.total_scenarios, 3);
        assert_eq!(stats.passed_scenarios, 1);
        assert_eq!(stats.failed_scenarios, 1);
        assert_eq!(stats.skipped_scenarios, 1);
        assert_eq!(stats.total_steps, 5);
        assert_eq!(stats.passed_steps, 2);
        assert_eq!(stats.failed_steps, 1);
        assert_eq!(stats.skipped_steps, 1);
        assert_eq!(stats.undefined_steps, 1);
        assert!((stats.total_duration - 32.5).abs() < 1e-9);
        assert_eq!(stats.failed_features, vec![1]);
        assert_eq!(stats.passed_features, vec![0]);
        assert!((stats.success_rate() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_document() {
        let stats = ReportStatistics::calculate(&[]);
        assert_eq!(stats.total_scenarios, 0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_html_report() {
        let html = sample()
            .with_project("shop-site")
            .render(ReportFormat::Html)
            .unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p>shop-site</p>"));
        assert!(html.contains("Failed Features"));
        assert!(html.contains("Passed Features"));
        assert!(html.contains("Contact &lt;form&gt;"));
        assert!(html.contains("expected &lt;div&gt;\ngot nothing"));
        assert!(html.contains("data:image/png;base64,iVBORw0KGgo="));
        assert!(html.contains(r#"<span class="tag">regression</span>"#));
        assert!(html.contains("Submit empty form"));
        assert!(html.contains("Hero banner"));
        assert!(!html.contains("Contact <form>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_failed_section_hides_passed_scenarios() {
        let features: Vec<FeatureReport> = serde_json::from_str(
            r#"[{"name": "Mixed", "elements": [
                {"type": "scenario", "name": "Works fine", "status": "passed", "steps": []},
                {"type": "scenario", "name": "Breaks", "status": "failed", "steps": []}
            ]}]"#,
        )
        .unwrap();
        let html = ReportGenerator::new(features)
            .render(ReportFormat::Html)
            .unwrap();

        assert!(html.contains("Breaks"));
        assert!(!html.contains("Works fine"));
    }

    #[test]
    fn test_text_report() {
        let text = sample().render(ReportFormat::Text).unwrap();
        assert!(text.contains("Total Scenarios:    3"));
        assert!(text.contains("Success Rate:       33.3%"));
        assert!(text.contains("Execution Time:     32.50s"));
    }

    #[test]
    fn test_load_and_write() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("test_results.json");
        let output = dir.path().join("out/test_report.html");
        fs::write(&input, SAMPLE).unwrap();

        let generator = ReportGenerator::load(&input).unwrap();
        generator.write_html(&output).unwrap();
        assert!(fs::read_to_string(&output).unwrap().contains("Hero banner"));

        fs::write(&input, r#"{"not": "a list"}"#).unwrap();
        assert!(ReportGenerator::load(&input).is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5.0), "5.00s");
        assert_eq!(format_duration(59.999), "60.00s");
        assert_eq!(format_duration(125.5), "2m 5.50s");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }
}
