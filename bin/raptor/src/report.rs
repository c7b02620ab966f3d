//! Console tables.

use comfy_table::{Table, presets::UTF8_FULL};
use raptor_deploy::{DeploymentReport, GasReport, PlanStep};
use serde_json::Value;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

pub fn plan_table(order: &[&PlanStep]) -> Table {
    let mut table = table(vec!["#", "Step", "Action", "Depends on"]);
    for (i, step) in order.iter().enumerate() {
        let deps: Vec<String> = step.dependencies().iter().map(|d| d.to_string()).collect();
        table.add_row(vec![
            (i + 1).to_string(),
            step.name.to_string(),
            step.describe(),
            deps.join(", "),
        ]);
    }
    table
}

pub fn deployment_table(report: &DeploymentReport) -> Table {
    let mut table = table(vec!["Step", "Address", "Transaction", "Gas used"]);
    for contract in report.contracts.iter() {
        table.add_row(vec![
            contract.name.to_string(),
            contract.address.to_string(),
            contract.tx_hash.to_string(),
            contract.gas_used.to_string(),
        ]);
    }
    for call in &report.calls {
        table.add_row(vec![
            call.name.to_string(),
            format!("{} ({})", call.target, call.function),
            call.tx_hash.to_string(),
            call.gas_used.to_string(),
        ]);
    }
    table
}

/// Gas per kind of call, with a cost column when a gas price (gwei) is given.
pub fn gas_table(report: &GasReport, gas_price: Option<f64>) -> Table {
    let mut header = vec!["Operation", "Calls", "Total gas", "Min", "Max", "Mean"];
    if gas_price.is_some() {
        header.push("Cost (ETH)");
    }

    let mut table = table(header);
    for stats in report.stats() {
        let mut row = vec![
            stats.kind.to_string(),
            stats.count.to_string(),
            stats.total.to_string(),
            stats.min.to_string(),
            stats.max.to_string(),
            stats.mean.to_string(),
        ];
        if let Some(price) = gas_price {
            row.push(format!("{:.6}", stats.cost_eth(price)));
        }
        table.add_row(row);
    }
    table
}

/// Gas statistics as JSON, each entry carrying `cost_eth` when a gas price is given.
pub fn gas_json(report: &GasReport, gas_price: Option<f64>) -> serde_json::Result<Value> {
    let entries = report
        .stats()
        .iter()
        .map(|stats| -> serde_json::Result<Value> {
            let mut entry = serde_json::to_value(stats)?;
            if let (Some(price), Value::Object(fields)) = (gas_price, &mut entry) {
                fields.insert("cost_eth".to_string(), stats.cost_eth(price).into());
            }
            Ok(entry)
        })
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok(Value::Array(entries))
}
