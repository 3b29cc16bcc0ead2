//! Trailing simple moving averages attached to each bar.
//!
//! SMA(n)[i] = (C[i-n+1] + ... + C[i]) / n
//! Warmup: the first (n-1) bars carry no average.
//!
//! Sums are kept in a sliding window of exact decimals, so every average is
//! computed in O(1) from the previous one without accumulating rounding.

use rust_decimal::Decimal;

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;

/// A price bar with the buy-window and sell-window averages of its close.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedBar {
    pub bar: PriceBar,
    pub buying_moving_average: Option<Decimal>,
    pub selling_moving_average: Option<Decimal>,
}

/// Trailing SMA of `values` over `period` entries, one slot per input.
/// A zero period yields no averages at all.
///
/// Fails with `Arithmetic` when a window sum leaves the decimal range.
pub fn simple_moving_average(
    values: &[Decimal],
    period: usize,
) -> Result<Vec<Option<Decimal>>, MacrossError> {
    if period == 0 {
        return Ok(vec![None; values.len()]);
    }

    let divisor = Decimal::from(period);
    let mut window_sum = Decimal::ZERO;

    let overflow = || MacrossError::Arithmetic {
        reason: format!("moving average window sum over {period} closes"),
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            window_sum = window_sum.checked_add(value).ok_or_else(overflow)?;
            if i >= period {
                window_sum = window_sum
                    .checked_sub(values[i - period])
                    .ok_or_else(overflow)?;
            }
            Ok((i + 1 >= period).then(|| window_sum / divisor))
        })
        .collect()
}

/// Sort `bars` by time and attach both moving averages.
///
/// The input is left untouched. When two bars share a date the one that
/// appears later in the input is kept.
pub fn annotate(
    bars: &[PriceBar],
    buy_period: usize,
    sell_period: usize,
) -> Result<Vec<AnnotatedBar>, MacrossError> {
    let sorted = sort_unique_by_time(bars);
    let closes: Vec<Decimal> = sorted.iter().map(|b| b.close).collect();

    let buying = simple_moving_average(&closes, buy_period)?;
    let selling = simple_moving_average(&closes, sell_period)?;

    Ok(sorted
        .into_iter()
        .zip(buying)
        .zip(selling)
        .map(|((bar, buying_moving_average), selling_moving_average)| AnnotatedBar {
            bar,
            buying_moving_average,
            selling_moving_average,
        })
        .collect())
}

fn sort_unique_by_time(bars: &[PriceBar]) -> Vec<PriceBar> {
    let mut sorted = bars.to_vec();
    // stable: equal dates keep their input order
    sorted.sort_by_key(|b| b.time);

    let mut unique: Vec<PriceBar> = Vec::with_capacity(sorted.len());
    for bar in sorted {
        match unique.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => unique.push(bar),
        }
    }
    unique
}
