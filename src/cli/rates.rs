use crate::cli::ui::{
    StyleType, format_age, freshness_cell, header_cell, new_spinner, new_styled_table,
    number_cell, style_text,
};
use crate::converter::CurrencyConverter;
use crate::core::currency::{Currency, ExchangeRateTable, PIVOT};
use anyhow::Result;
use chrono::DateTime;

/// Shows the current rates, fetching them if the cache calls for it.
pub async fn run(converter: &CurrencyConverter) -> Result<()> {
    let spinner = new_spinner("Loading exchange rates...");
    let rates = converter.get_exchange_rates().await;
    spinner.finish_and_clear();

    display(converter, &rates);
    Ok(())
}

/// Forces a refresh against `base`, then shows the result.
pub async fn refresh(converter: &CurrencyConverter, base: Currency) -> Result<()> {
    let spinner = new_spinner("Refreshing exchange rates...");
    let rates = converter.refresh_rates(base).await;
    spinner.finish_and_clear();

    display(converter, &rates);
    Ok(())
}

pub fn clear(converter: &CurrencyConverter) -> Result<()> {
    converter.clear_cache();
    println!("{}", style_text("Exchange rate cache cleared", StyleType::Subtle));
    Ok(())
}

fn display(converter: &CurrencyConverter, rates: &ExchangeRateTable) {
    let base = converter.cached_base().unwrap_or(PIVOT);
    println!(
        "\n{}",
        style_text(&format!("Exchange rates per 1 {base}"), StyleType::Title)
    );

    let mut table = new_styled_table();
    table.set_header(vec![header_cell("Currency"), header_cell("Rate")]);
    for (currency, rate) in rates.iter() {
        table.add_row(vec![
            comfy_table::Cell::new(format!("{currency} {}", currency.symbol())),
            number_cell(rate, 4),
        ]);
    }
    println!("{table}");

    let info = converter.get_cache_info();
    let fetched = DateTime::from_timestamp_millis(info.last_fetch_ms)
        .filter(|_| info.has_rates)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut summary = new_styled_table();
    summary.add_row(vec![
        comfy_table::Cell::new(style_text("Last fetch", StyleType::TotalLabel)),
        comfy_table::Cell::new(fetched),
    ]);
    summary.add_row(vec![
        comfy_table::Cell::new(style_text("Age", StyleType::TotalLabel)),
        comfy_table::Cell::new(format_age(info.age_ms)),
    ]);
    summary.add_row(vec![
        comfy_table::Cell::new(style_text("Status", StyleType::TotalLabel)),
        freshness_cell(converter.are_rates_fresh()),
    ]);
    println!("{summary}");
}
