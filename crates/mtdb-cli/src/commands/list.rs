//! List commands for campaigns, sensors, tests and time series

use anyhow::{Context, Result};
use clap::Args;
use mtdb_client::query::{Field, Filter, Query, Sort};
use mtdb_client::MtdbClient;

use crate::output::{CampaignRow, OutputContext, SensorRow, TestRow, TimeseriesRow};

/// Query options shared by the list commands
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Filter clause `name[op]=value` (e.g. `name[co]=probe`), repeatable
    #[arg(short, long = "filter", value_name = "CLAUSE")]
    pub filters: Vec<String>,

    /// Sort clause `asc(name)` or `desc(name)`, repeatable
    #[arg(short, long = "sort", value_name = "CLAUSE")]
    pub sorts: Vec<String>,

    /// Number of records to skip
    #[arg(long)]
    pub skip: Option<u64>,

    /// Maximum number of records to return
    #[arg(short, long)]
    pub limit: Option<u64>,
}

impl ListArgs {
    /// Build a query, rejecting clauses that name unknown attributes
    pub fn query<F: Field>(&self) -> Result<Query<F>> {
        let mut query = Query::new();
        for clause in &self.filters {
            let filter: Filter<F> = clause
                .parse()
                .with_context(|| format!("Invalid filter '{}'", clause))?;
            query = query.filter(filter);
        }
        for clause in &self.sorts {
            let sort: Sort<F> = clause
                .parse()
                .with_context(|| format!("Invalid sort '{}'", clause))?;
            query = query.sort(sort);
        }
        if let Some(skip) = self.skip {
            query = query.skip(skip);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }
}

pub async fn list_campaigns(
    client: &MtdbClient,
    args: &ListArgs,
    ctx: &OutputContext,
) -> Result<()> {
    let campaigns = client
        .campaigns()
        .get(&args.query()?)
        .await
        .context("Failed to list campaigns")?;

    let rows: Vec<CampaignRow> = campaigns
        .iter()
        .map(|c| CampaignRow::from(c.model()))
        .collect();
    ctx.print(&rows);
    Ok(())
}

pub async fn list_sensors(
    client: &MtdbClient,
    args: &ListArgs,
    ctx: &OutputContext,
) -> Result<()> {
    let sensors = client
        .sensors()
        .get(&args.query()?)
        .await
        .context("Failed to list sensors")?;

    let rows: Vec<SensorRow> = sensors
        .iter()
        .map(|s| SensorRow::from(s.model()))
        .collect();
    ctx.print(&rows);
    Ok(())
}

pub async fn list_tests(
    client: &MtdbClient,
    args: &ListArgs,
    ctx: &OutputContext,
) -> Result<()> {
    let tests = client
        .tests()
        .get(&args.query()?)
        .await
        .context("Failed to list tests")?;

    let rows: Vec<TestRow> = tests
        .iter()
        .map(|t| TestRow::from(t.model()))
        .collect();
    ctx.print(&rows);
    Ok(())
}

pub async fn list_timeseries(
    client: &MtdbClient,
    args: &ListArgs,
    ctx: &OutputContext,
) -> Result<()> {
    let series = client
        .timeseries()
        .get(&args.query()?)
        .await
        .context("Failed to list time series")?;

    let rows: Vec<TimeseriesRow> = series
        .iter()
        .map(|t| TimeseriesRow::from(t.model()))
        .collect();
    ctx.print(&rows);
    Ok(())
}
