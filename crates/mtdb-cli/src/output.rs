//! Output formatting for mtdb (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use mtdb_client::{Campaign, Sensor, Test, Timeseries};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => print!("{}", to_csv(data)),
        }
    }

    /// Print key-value pairs (for summaries and statistics)
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Render rows as CSV, header first, columns sorted by name
fn to_csv<T: Serialize>(data: &[T]) -> String {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = data
        .iter()
        .filter_map(|item| match serde_json::to_value(item) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        })
        .collect();

    let Some(first) = rows.first() else {
        return String::new();
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut out = headers
        .iter()
        .map(|h| h.as_str())
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for row in &rows {
        let values: Vec<String> = headers
            .iter()
            .map(|h| match row.get(h.as_str()) {
                Some(serde_json::Value::String(s)) => escape_csv(s),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => escape_csv(&other.to_string()),
            })
            .collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn display<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// =============================================================================
// Display types for the list and data commands
// =============================================================================

#[derive(Debug, Tabled, Serialize)]
pub struct CampaignRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Scale")]
    pub scale_factor: f64,
    #[tabled(rename = "Depth [m]")]
    pub water_depth: f64,
}

impl From<&Campaign> for CampaignRow {
    fn from(c: &Campaign) -> Self {
        Self {
            id: display(c.id),
            name: c.name.clone(),
            location: display(c.location.as_deref()),
            scale_factor: c.scale_factor,
            water_depth: c.water_depth,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct SensorRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Unit")]
    pub unit: String,
    #[tabled(rename = "Campaign")]
    pub campaign_id: i64,
    #[tabled(rename = "Position")]
    pub position: String,
}

impl From<&Sensor> for SensorRow {
    fn from(s: &Sensor) -> Self {
        let position = match s.z {
            Some(z) => format!("({}, {}, {}) {}", s.x, s.y, z, s.position_reference),
            None => format!("({}, {}) {}", s.x, s.y, s.position_reference),
        };
        Self {
            id: display(s.id),
            name: s.name.clone(),
            kind: s.kind.to_string(),
            unit: s.unit.clone(),
            campaign_id: s.campaign_id,
            position,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct TestRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Number")]
    pub number: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub kind: String,
    #[tabled(rename = "Campaign")]
    pub campaign_id: i64,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&Test> for TestRow {
    fn from(t: &Test) -> Self {
        let base = t.base();
        Self {
            id: display(base.id),
            number: base.number.clone(),
            kind: t.kind().to_string(),
            campaign_id: base.campaign_id,
            description: display(base.description.as_deref()),
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct TimeseriesRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Sensor")]
    pub sensor_id: i64,
    #[tabled(rename = "Test")]
    pub test_id: i64,
    #[tabled(rename = "fs [Hz]")]
    pub fs: f64,
    #[tabled(rename = "Window [s]")]
    pub window: String,
}

impl From<&Timeseries> for TimeseriesRow {
    fn from(t: &Timeseries) -> Self {
        let window = match (t.default_start_time, t.default_end_time) {
            (Some(start), Some(end)) => format!("{} - {}", start, end),
            _ => "-".to_string(),
        };
        Self {
            id: display(t.id),
            sensor_id: t.sensor_id,
            test_id: t.test_id,
            fs: t.fs,
            window,
        }
    }
}

#[derive(Debug, Tabled, Serialize)]
pub struct SampleRow {
    #[tabled(rename = "Time [s]")]
    pub time: f64,
    #[tabled(rename = "Value")]
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtdb_client::{SensorKind, TestBase};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_escapes_and_blanks() {
        let rows = vec![
            CampaignRow {
                id: "1".into(),
                name: "North Sea, 2023".into(),
                location: "-".into(),
                scale_factor: 50.0,
                water_depth: 1.5,
            },
            CampaignRow {
                id: "2".into(),
                name: "say \"hi\"".into(),
                location: "Trondheim".into(),
                scale_factor: 40.0,
                water_depth: 2.0,
            },
        ];
        assert_eq!(
            to_csv(&rows),
            "id,location,name,scale_factor,water_depth\n\
             1,-,\"North Sea, 2023\",50.0,1.5\n\
             2,Trondheim,\"say \"\"hi\"\"\",40.0,2.0\n"
        );
        assert_eq!(to_csv::<CampaignRow>(&[]), "");
    }

    #[test]
    fn test_rows_from_models() {
        let mut sensor = Sensor::new("wave probe 1", 3, SensorKind::Length, "m");
        sensor.id = Some(7);
        let row = SensorRow::from(&sensor);
        assert_eq!(row.id, "7");
        assert_eq!(row.kind, SensorKind::Length.to_string());
        assert_eq!(row.campaign_id, 3);

        let test = Test::Base(TestBase::new("A001", 3));
        let row = TestRow::from(&test);
        assert_eq!(row.id, "-");
        assert_eq!(row.number, "A001");
        assert_eq!(row.description, "-");
    }
}
