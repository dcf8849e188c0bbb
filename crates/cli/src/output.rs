//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use tfprobe_common::teardown::TeardownOutcome;
use tfprobe_harness::report::{PhaseOutcome, RunReport};
use tfprobe_harness::verify::PoolCheck;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for PhaseOutcome {
    fn headers() -> Vec<&'static str> {
        vec!["PHASE", "STATUS", "DURATION", "ERROR"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            status_word(self.success),
            format!("{} ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

impl TableDisplay for TeardownOutcome {
    fn headers() -> Vec<&'static str> {
        vec!["TEARDOWN", "STATUS", "DURATION", "ERROR"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            status_word(self.success),
            format!("{} ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

impl TableDisplay for PoolCheck {
    fn headers() -> Vec<&'static str> {
        vec!["POOL", "NODES CHECKED"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.pool.clone(), self.nodes_checked.to_string()]
    }
}

fn status_word(success: bool) -> String {
    if success { "ok" } else { "failed" }.to_string()
}

/// Print a full run report
pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(report).unwrap_or_default());
        }
        OutputFormat::Table | OutputFormat::Plain => {
            print_list(&report.phases, format);
            if !report.teardown.is_empty() {
                print_list(&report.teardown, format);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                for (header, value) in T::headers().iter().zip(item.row().iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Print a simple message
pub fn print_message(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(r#"{{"message": "{}"}}"#, message);
        }
        _ => {
            println!("{}", message);
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
