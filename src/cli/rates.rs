use super::ui;
use crate::core::cache::RateCache;
use crate::core::currency::{CurrencyCode, ExchangeRateSet, convert};
use chrono::SecondsFormat;
use comfy_table::Cell;

impl ExchangeRateSet {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Market"), ui::header_cell("ARS per USD")]);

        for (market, rate) in [
            ("Oficial", self.usd_official),
            ("CCL", self.usd_ccl),
            ("Blue", self.usd_blue),
        ] {
            table.add_row(vec![Cell::new(market), ui::amount_cell(rate)]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Exchange rates", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!(
                    "Last updated: {}",
                    self.retrieved_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                ),
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

async fn fetch_with_spinner(cache: &RateCache) -> ExchangeRateSet {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let rates = cache.get_rates().await;
    pb.finish_and_clear();
    rates
}

pub async fn run(cache: &RateCache) {
    let rates = fetch_with_spinner(cache).await;
    println!("{}", rates.display_as_table());
}

pub async fn run_convert(cache: &RateCache, amount: f64, from: &CurrencyCode, to: &CurrencyCode) {
    let rates = fetch_with_spinner(cache).await;
    let result = convert(amount, from, to, &rates);
    println!(
        "{} {} = {}",
        ui::style_text(&format!("{amount:.2}"), ui::StyleType::TotalLabel),
        from,
        ui::style_text(&format!("{result:.2} {to}"), ui::StyleType::TotalValue)
    );
}
