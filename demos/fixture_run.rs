//! 離線補貨建議示例（使用內建的範例資料）

use anyhow::Context;
use chrono::Local;
use restock::{
    run, Aggregator, DataSource, Dimension, FixtureSource, PlanningConfig, RunOptions,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

const SAMPLE: &str = include_str!("fixtures/sample.json");

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== 離線補貨建議示例 ===\n");

    let document: serde_json::Value = serde_json::from_str(SAMPLE).context("範例資料格式錯誤")?;
    let fixture = FixtureSource::from_wire(&document, Dimension::Msku)?;
    let aggregator = Aggregator::new(DataSource::fixture(fixture)).with_page_size(2);

    let planning = PlanningConfig::new(Decimal::from(7), Decimal::from(10))
        .with_target_cover_days(30)
        .with_purchase_lead_days(2)
        .with_local_ship_lead_days(1)
        .with_overseas_ship_lead_days(3);
    let options = RunOptions::new(Local::now().date_naive()).with_enrich(true);

    let outcome = run(&aggregator, &planning, &options)?;

    println!("執行編號: {}", outcome.run_id);
    println!("\n建議清單:");
    for (fact, decision) in &outcome.decisions {
        println!(
            "  - [{}] {} 分類: {}, 日均: {}, 可售天數: {:?}, 採購: {}, 本地→FBA: {}, 本地→海外: {}, 海外→FBA: {}",
            fact.account_id,
            fact.sku,
            decision.tier().label(),
            decision.effective_velocity,
            decision.available_sale_days,
            decision.purchase_qty,
            decision.local_to_fba_qty,
            decision.local_to_overseas_qty,
            decision.overseas_to_fba_qty
        );
    }

    println!("\n緊急清單:");
    for (fact, decision) in &outcome.urgent {
        println!("  - {} 可售天數 {:?}", fact.sku, decision.available_sale_days);
    }

    let summary = &outcome.summary;
    println!("\n彙總:");
    println!("  總筆數: {}", summary.total_items);
    println!("  緊急: {}, 斷貨: {}, 高銷量: {}", summary.urgent_items, summary.out_of_stock_items, summary.high_sales_items);
    println!("  建議採購總量: {}", summary.total_suggested_purchase);
    println!("  平均可售天數: {}", summary.avg_available_days);
    for (account_id, stats) in &summary.account_stats {
        println!(
            "  店鋪 {}: {} 筆，緊急 {} 筆，建議採購 {}",
            account_id, stats.items, stats.urgent_items, stats.suggested_purchase
        );
    }

    Ok(())
}
