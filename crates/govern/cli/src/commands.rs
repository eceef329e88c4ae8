//! Subcommand implementations

use std::path::Path;

use anyhow::{Context, Result};
use govern_runtime::{run_scenario, GovernanceConfig, Scenario, ScenarioReport};
use govern_types::{AssetId, PriceQuote};
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::output::{self, format_credit, OutputFormat};

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    op: &'static str,
    at: String,
    events: String,
    result: String,
}

#[derive(Tabled)]
struct BalanceRow {
    account: String,
    credit: String,
}

/// Run a scenario file and print its report.
pub fn run(config: &GovernanceConfig, path: &Path, format: OutputFormat) -> Result<()> {
    let scenario = Scenario::load(path)
        .with_context(|| format!("loading scenario {}", path.display()))?;
    info!(path = %path.display(), steps = scenario.steps.len(), "Scenario loaded");

    let report = run_scenario(config, &scenario)
        .with_context(|| format!("running scenario {}", path.display()))?;

    match format {
        OutputFormat::Table => print_tables(&report),
        _ => output::print_single(&report, format)?,
    }
    output::print_success(&format!(
        "{} steps, credit supply {}",
        report.steps.len(),
        format_credit(report.credit_supply)
    ));
    Ok(())
}

fn print_tables(report: &ScenarioReport) {
    let steps: Vec<StepRow> = report
        .steps
        .iter()
        .map(|s| StepRow {
            index: s.index,
            op: s.op,
            at: s.at.to_string(),
            events: s
                .events
                .iter()
                .map(|e| e.name())
                .collect::<Vec<_>>()
                .join(", "),
            result: match &s.error {
                Some(err) => format!("reverted: {}", err),
                None => "ok".to_string(),
            },
        })
        .collect();
    let balances: Vec<BalanceRow> = report
        .credit
        .iter()
        .map(|(account, amount)| BalanceRow {
            account: account.clone(),
            credit: format_credit(*amount),
        })
        .collect();

    println!("{}", tabled::Table::new(steps));
    if !balances.is_empty() {
        println!("{}", tabled::Table::new(balances));
    }
}

/// Print the effective configuration.
pub fn show_config(config: &GovernanceConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => output::print_single(config, format),
        _ => output::print_single(config, OutputFormat::Json),
    }
}

#[derive(Clone, Serialize, Tabled)]
struct QuoteRow {
    quantity: String,
    price: String,
    decimals: u8,
    credit: String,
}

/// Credit a deposit would yield at the given quote.
pub fn quote(quantity: u128, price: u128, decimals: u8, format: OutputFormat) -> Result<()> {
    let credit = govern_treasury::credit_for(AssetId::NATIVE, quantity, PriceQuote::new(price, decimals))?;
    let row = QuoteRow {
        quantity: quantity.to_string(),
        price: price.to_string(),
        decimals,
        credit: credit.to_string(),
    };
    output::print_report(&row, vec![row.clone()], format)
}
