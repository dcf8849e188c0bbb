//! Run-variable inspection command

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use tfprobe_harness::HarnessConfig;

use crate::output::{print_list, OutputFormat, TableDisplay};

/// Variable display wrapper for the table view
#[derive(Serialize)]
struct VarRow {
    variable: String,
    value: String,
}

impl TableDisplay for VarRow {
    fn headers() -> Vec<&'static str> {
        vec!["VARIABLE", "VALUE"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.variable.clone(), self.value.clone()]
    }
}

pub fn execute(config: HarnessConfig, format: OutputFormat) -> Result<()> {
    let vars = &config.run;
    match format {
        OutputFormat::Json => {
            let value = json!({
                "vars": vars,
                "cluster_name": vars.cluster_name(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Yaml => {
            let value = json!({
                "vars": vars,
                "cluster_name": vars.cluster_name(),
            });
            println!("{}", serde_yaml::to_string(&value)?);
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let pools: Vec<&str> = vars
                .additional_node_pools
                .keys()
                .map(String::as_str)
                .collect();
            let mut rows = vec![
                row("name", &vars.name),
                row("environment", &vars.environment),
                row("location", &vars.location),
                row("resource_group_name", &vars.resource_group_name),
                row("dns_prefix", &vars.dns_prefix),
                row("resource_count", &vars.resource_count.to_string()),
                row("additional_node_pools", &pools.join(", ")),
            ];
            if let Some(law) = vars.create_telemetry_law {
                rows.push(row("create_telemetry_law", &law.to_string()));
            }
            rows.push(row("cluster name (derived)", &vars.cluster_name()));
            print_list(&rows, format);
        }
    }
    Ok(())
}

fn row(variable: &str, value: &str) -> VarRow {
    VarRow {
        variable: variable.to_string(),
        value: value.to_string(),
    }
}
