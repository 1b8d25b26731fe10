//! Data and statistics commands

use anyhow::{Context, Result};
use clap::Args;
use mtdb_client::{DataPoints, DataRequest, FroudeScale, Id, MtdbClient, StatisticsRequest};

use crate::output::{OutputContext, SampleRow};

/// Server-side read window and scaling
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Window start [s]
    #[arg(long)]
    pub start: Option<f64>,

    /// Window end [s]
    #[arg(long)]
    pub end: Option<f64>,

    /// Length scale for server-side Froude scaling to full scale
    #[arg(long, value_name = "LAMBDA")]
    pub scaling_length: Option<f64>,
}

impl WindowArgs {
    pub fn data_request(&self, all_data: bool) -> DataRequest {
        DataRequest {
            start_time: self.start,
            end_time: self.end,
            scaling_length: self.scaling_length,
            all_data,
        }
    }

    pub fn statistics_request(&self) -> StatisticsRequest {
        StatisticsRequest {
            start_time: self.start,
            end_time: self.end,
            scaling_length: self.scaling_length,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Return the whole series instead of its default analysis window
    #[arg(long)]
    pub all: bool,

    /// Scale to full scale locally by the sensor's kind with this length scale
    #[arg(long, value_name = "LAMBDA", conflicts_with = "scaling_length")]
    pub froude: Option<f64>,

    /// Print min/max/mean/std instead of the samples
    #[arg(long)]
    pub summary: bool,

    /// Bypass the data cache
    #[arg(long)]
    pub no_cache: bool,
}

pub async fn data(
    client: &MtdbClient,
    id: Id,
    args: &DataArgs,
    ctx: &OutputContext,
) -> Result<()> {
    let request = args.window.data_request(args.all);
    let mut points = client
        .timeseries()
        .get_data(id, &request, !args.no_cache)
        .await
        .with_context(|| format!("Failed to read data of timeseries {}", id))?;

    if let Some(lambda) = args.froude {
        let series = client.timeseries().get_by_id(id).await?;
        let sensor = series
            .sensor()
            .await
            .with_context(|| format!("Failed to resolve sensor of timeseries {}", id))?;
        points = points.froude_scaled(sensor.kind, &FroudeScale::new(lambda));
    }

    if points.is_empty() {
        ctx.warn(&format!("Timeseries {} has no samples in this window", id));
        return Ok(());
    }

    if args.summary {
        ctx.print_kv(&summary_pairs(&points));
    } else {
        let rows: Vec<SampleRow> = points
            .time
            .iter()
            .zip(&points.value)
            .map(|(&time, &value)| SampleRow { time, value })
            .collect();
        ctx.print(&rows);
    }
    Ok(())
}

pub async fn stats(
    client: &MtdbClient,
    id: Id,
    window: &WindowArgs,
    use_cache: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let stats = client
        .timeseries()
        .get_statistics(id, &window.statistics_request(), use_cache)
        .await
        .with_context(|| format!("Failed to read statistics of timeseries {}", id))?;

    ctx.print_kv(&[
        ("min", stats.min.to_string()),
        ("max", stats.max.to_string()),
        ("mean", stats.mean.to_string()),
        ("std", stats.std.to_string()),
        ("hm0", optional(stats.hm0())),
        ("tp", optional(stats.tp)),
        ("tz", optional(stats.tz())),
    ]);
    Ok(())
}

fn summary_pairs(points: &DataPoints) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("samples", points.len().to_string()),
        ("duration", points.duration().to_string()),
    ];
    if let Some(summary) = points.summary() {
        pairs.extend([
            ("min", summary.min.to_string()),
            ("max", summary.max.to_string()),
            ("mean", summary.mean.to_string()),
            ("std", summary.std.to_string()),
        ]);
    }
    pairs
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
