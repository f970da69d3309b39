use crate::config::EstimatorConfig;
use crate::pipeline::{CurrentStepInfo, StepResult, StepStatus};
use crate::pricing::PriceEstimate;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    /// Human-readable summary
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn serialize<T: Serialize>(&self, value: &T, what: &str) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => {
                serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
            }
            _ => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
        }
    }

    pub fn format_step_result(&self, result: &StepResult) -> Result<String> {
        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => self.serialize(result, "step result"),
            OutputFormat::Human => Ok(self.step_result_human(result)),
        }
    }

    pub fn format_status(&self, info: &CurrentStepInfo) -> Result<String> {
        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => self.serialize(info, "job status"),
            OutputFormat::Human => {
                let step = match (info.current_step, info.label.as_deref()) {
                    (Some(n), Some(label)) => format!("{} ({})", n, label),
                    (Some(n), None) => format!("{} (unknown)", n),
                    (None, _) => "(not set)".to_string(),
                };
                Ok(format!(
                    "Current step:  {}\nCompleted:     {}\n",
                    step,
                    if info.all_process_completed { "yes" } else { "no" }
                ))
            }
        }
    }

    /// A persisted step output. The human format prints the CSV or markdown
    /// table the step stored, when it has one.
    pub fn format_value(&self, value: &Value) -> Result<String> {
        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => self.serialize(value, "step output"),
            OutputFormat::Human => {
                for table in ["parts_markdown", "products_csv"] {
                    if let Some(text) = value.get(table).and_then(Value::as_str) {
                        return Ok(format!("{}\n", text.trim_end()));
                    }
                }
                self.serialize(value, "step output")
            }
        }
    }

    pub fn format_price(&self, name: &str, estimate: &PriceEstimate) -> Result<String> {
        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => {
                let output = serde_json::json!({
                    "part_name": name,
                    "estimate": estimate,
                });
                self.serialize(&output, "price estimate")
            }
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str(&format!("{}: \u{00A5}{}\n", name, estimate.price));
                output.push_str(&format!(
                    "\u{251C}\u{2500} Category:   {}\n",
                    estimate.category.as_deref().unwrap_or("(not in database)")
                ));
                output.push_str(&format!(
                    "\u{251C}\u{2500} Part type:  {}\n",
                    estimate.part_type.as_deref().unwrap_or("(category default)")
                ));
                output.push_str(&format!(
                    "\u{2514}\u{2500} Size tier:  {}\n",
                    estimate.tier.map(|t| t.as_str()).unwrap_or("-")
                ));
                Ok(output)
            }
        }
    }

    pub fn format_config(&self, config: &EstimatorConfig) -> Result<String> {
        let mut entries: Vec<(String, String)> = config.to_display_map().into_iter().collect();
        entries.sort();
        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => {
                let map: serde_json::Map<String, Value> = entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                self.serialize(&map, "config")
            }
            OutputFormat::Human => Ok(entries
                .iter()
                .map(|(k, v)| format!("{:<22} {}\n", k, v))
                .collect()),
        }
    }

    fn step_result_human(&self, result: &StepResult) -> String {
        let mut output = String::new();
        match result.status {
            StepStatus::Success => {
                output.push_str(&format!("\u{2713} Step {} completed\n", result.step));
            }
            StepStatus::Error => {
                output.push_str(&format!("\u{2717} Step {} failed\n", result.step));
            }
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        if let Some(message) = &result.message {
            output.push_str(&format!("{}\n\n", message));
        }
        if let Some(error) = &result.error_message {
            output.push_str(&format!(
                "Error ({}): {}\n\n",
                result.error_kind.as_deref().unwrap_or("unknown"),
                error
            ));
        }

        if let Some(data) = &result.data {
            if let Some(table) = data
                .get("parts_markdown")
                .or_else(|| data.get("products_csv"))
                .and_then(Value::as_str)
            {
                output.push_str(table.trim_end());
                output.push_str("\n\n");
            }
            if let Some(method) = data.get("extraction_method").and_then(Value::as_str) {
                output.push_str(&format!("Extraction:  {}\n", method));
            }
            if let Some(reason) = data.get("fallback_reason").and_then(Value::as_str) {
                output.push_str(&format!("\u{26A0} Fallback:  {}\n", reason));
            }
        }

        match result.next_step {
            Some(next) => output.push_str(&format!("Next step:   {}\n", next)),
            None if result.is_success() => output.push_str("All steps completed\n"),
            None => {}
        }
        output.push_str(&format!("Run id:      {}\n", result.run_id));
        output
    }
}
