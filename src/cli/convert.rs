use crate::cli::ui::{StyleType, style_text};
use crate::converter::CurrencyConverter;
use crate::format::{format_price, format_price_with_currency};
use crate::providers::ConvertPriceRequest;
use anyhow::{Context, Result, bail};

pub async fn run(converter: &CurrencyConverter, amount: f64, from: &str, to: &str) -> Result<()> {
    let converted = converter.convert(amount, from, to).await;
    println!(
        "{} = {}",
        format_price_with_currency(amount, from),
        style_text(&format_price_with_currency(converted, to), StyleType::TotalValue)
    );
    Ok(())
}

pub async fn run_remote(
    converter: &CurrencyConverter,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<()> {
    let request = ConvertPriceRequest {
        amount,
        from_currency: from.to_uppercase(),
        to_currency: to.to_uppercase(),
    };
    let response = converter
        .convert_price_via_api(&request)
        .await
        .context("Server-side conversion failed")?;

    if !response.success {
        let reason = response.error.unwrap_or_else(|| "unknown error".to_string());
        println!("{}", style_text(&reason, StyleType::Error));
        bail!("Server rejected conversion: {reason}");
    }

    println!(
        "{} = {}",
        format_price_with_currency(response.original_amount, &response.original_currency),
        style_text(
            &format_price_with_currency(response.converted_amount, &response.target_currency),
            StyleType::TotalValue
        )
    );
    Ok(())
}

pub async fn price(converter: &CurrencyConverter, amount: f64, currency: &str) -> Result<()> {
    println!("{}", format_price(converter, amount, currency).await);
    Ok(())
}
