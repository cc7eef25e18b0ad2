//! 線上補貨建議示例
//!
//! 需要環境變數 `RESTOCK_APP_ID`、`RESTOCK_APP_SECRET`。

use chrono::Local;
use restock::{run, Aggregator, DataSource, ErpClient, ErpConfig, PlanningConfig, RunOptions};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ErpConfig::from_env()?;
    let options = RunOptions::from_config(&config, Local::now().date_naive());
    let aggregator_config = config.clone();

    let client = ErpClient::new(config)?;
    let status = client.test_connection()?;
    println!("連線成功：店鋪 {} 個，權杖 {}", status.account_count, status.token_masked);

    let aggregator = Aggregator::from_config(DataSource::Live(client), &aggregator_config);
    let outcome = run(&aggregator, &PlanningConfig::default(), &options)?;

    println!(
        "共 {} 筆，緊急 {} 筆，建議採購 {}",
        outcome.summary.total_items, outcome.summary.urgent_items, outcome.summary.total_suggested_purchase
    );
    for (fact, decision) in outcome.urgent.iter().take(20) {
        println!("  - [{}] {} 可售天數 {:?}", fact.account_id, fact.sku, decision.available_sale_days);
    }

    if let Some(partial) = outcome.partial_error() {
        println!("\n注意：{}", partial);
    }

    Ok(())
}
