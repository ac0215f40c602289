use crate::api::AppState;
use crate::core::config::AppConfig;
use anyhow::Result;

/// One-shot USD→KRW check, handy for verifying provider connectivity from
/// a terminal.
pub async fn rate(config: &AppConfig) -> Result<()> {
    let state = AppState::from_config(config)?;
    let value = state.rates.get_rate().await;

    match state.rates.snapshot() {
        Some(rate) => println!("USD/KRW: {:.2} (fetched {})", value, rate.last_updated),
        None => println!("USD/KRW: {value:.2} (fallback, all sources failed)"),
    }
    Ok(())
}
