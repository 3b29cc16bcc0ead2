//! Backtest engine: the buy/sell state machine over annotated bars.
//!
//! Seeking entry, a bar whose open is below its buy-window average buys as
//! many whole shares as the cash allows. Holding, a bar whose close is above
//! its sell-window average sells everything. Shares still held after the last
//! bar are sold at that bar's close.

use log::info;
use rust_decimal::Decimal;

use crate::ports::data_port::DataPort;

use super::error::MacrossError;
use super::moving_average::{annotate, AnnotatedBar};
use super::position::{Mode, PositionState};
use super::price_bar::PriceBar;
use super::request::BacktestRequest;
use super::trade_event::{TradeAction, TradeEvent};

/// Result of one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
    /// final_cash - starting cash; negative on a loss.
    pub profit: Decimal,
    pub final_cash: Decimal,
    pub events: Vec<TradeEvent>,
}

impl BacktestOutcome {
    /// Event log rendered as `Bought/Sold <N> stocks on <date> for <price>`.
    pub fn event_lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }
}

/// Wire shape of an outcome: profit as a JSON number plus the event lines.
///
/// The number carries every digit of the decimal profit, so large runs are
/// not rounded through a float on the way out.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BacktestReport {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub profit: Decimal,
    pub events: Vec<String>,
}

impl From<&BacktestOutcome> for BacktestReport {
    fn from(outcome: &BacktestOutcome) -> Self {
        Self {
            profit: outcome.profit,
            events: outcome.event_lines(),
        }
    }
}

/// Walk `bars` in order and trade a single position.
///
/// `bars` must already be sorted ascending by time, as [`annotate`] returns
/// them. A zero `starting_cash` halts the walk before the first bar; the check
/// is made against the starting amount, not the live balance.
///
/// Fails with `Arithmetic` when a trade cannot be computed exactly, such as
/// a share count beyond the decimal range.
pub fn run_backtest(
    bars: &[AnnotatedBar],
    starting_cash: u64,
) -> Result<BacktestOutcome, MacrossError> {
    let mut state = PositionState::new(starting_cash);
    let mut events = Vec::new();

    for annotated in bars {
        if starting_cash == 0 {
            break;
        }

        let bar = &annotated.bar;
        match state.mode {
            Mode::SeekingEntry => {
                let Some(buying_average) = annotated.buying_moving_average else {
                    continue;
                };
                if bar.open < buying_average {
                    let shares = state.buy_max(bar.open)?;
                    events.push(TradeEvent {
                        action: TradeAction::Bought,
                        share_count: shares,
                        time: bar.time,
                        price_per_share: bar.open,
                    });
                }
            }
            Mode::Holding => {
                let Some(selling_average) = annotated.selling_moving_average else {
                    continue;
                };
                if bar.close > selling_average {
                    let shares = state.liquidate(bar.close)?;
                    events.push(TradeEvent {
                        action: TradeAction::Sold,
                        share_count: shares,
                        time: bar.time,
                        price_per_share: bar.close,
                    });
                }
            }
        }
    }

    if state.shares_held > 0 {
        if let Some(last) = bars.last() {
            let shares = state.liquidate(last.bar.close)?;
            events.push(TradeEvent {
                action: TradeAction::Sold,
                share_count: shares,
                time: last.bar.time,
                price_per_share: last.bar.close,
            });
        }
    }

    Ok(BacktestOutcome {
        profit: state.cash - Decimal::from(starting_cash),
        final_cash: state.cash,
        events,
    })
}

/// Annotate raw store bars with the request's windows and run the engine.
pub fn evaluate(
    bars: &[PriceBar],
    request: &BacktestRequest,
) -> Result<BacktestOutcome, MacrossError> {
    let annotated = annotate(bars, request.buy_period, request.sell_period)?;
    run_backtest(&annotated, request.investing_amount)
}

/// Fetch every stored bar for `symbol` and evaluate `request` over them.
///
/// An empty store is not an error: the outcome is zero profit, no events.
pub fn backtest_from_store(
    data_port: &dyn DataPort,
    symbol: &str,
    request: &BacktestRequest,
) -> Result<BacktestOutcome, MacrossError> {
    let bars = data_port.fetch_bars(symbol)?;
    let outcome = evaluate(&bars, request)?;
    info!(
        "backtest {}: {} bars, amount={} buy={} sell={}, profit {}, {} events",
        symbol,
        bars.len(),
        request.investing_amount,
        request.buy_period,
        request.sell_period,
        outcome.profit,
        outcome.events.len()
    );
    Ok(outcome)
}
