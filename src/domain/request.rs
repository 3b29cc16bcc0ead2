//! Typed parsing of the three raw backtest parameters.
//!
//! Rules, first failure wins:
//! 1. all three present and non-empty
//! 2. all three are plain ASCII digit strings (no sign, point or exponent)
//! 3. sell_period and buy_period are strictly positive
//! 4. investing_amount is non-negative and fits the amount type

use super::error::ValidationError;

pub const INVESTING_AMOUNT: &str = "investing_amount";
pub const SELL_PERIOD: &str = "sell_period";
pub const BUY_PERIOD: &str = "buy_period";

/// Validated backtest parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestRequest {
    pub investing_amount: u64,
    pub sell_period: usize,
    pub buy_period: usize,
}

pub fn validate(
    investing_amount: Option<&str>,
    sell_period: Option<&str>,
    buy_period: Option<&str>,
) -> Result<BacktestRequest, ValidationError> {
    let investing_amount = require(INVESTING_AMOUNT, investing_amount)?;
    let sell_period = require(SELL_PERIOD, sell_period)?;
    let buy_period = require(BUY_PERIOD, buy_period)?;

    require_digits(INVESTING_AMOUNT, investing_amount)?;
    require_digits(SELL_PERIOD, sell_period)?;
    require_digits(BUY_PERIOD, buy_period)?;

    let sell_period = parse_period(SELL_PERIOD, sell_period)?;
    let buy_period = parse_period(BUY_PERIOD, buy_period)?;

    let investing_amount =
        investing_amount
            .parse::<u64>()
            .map_err(|_| ValidationError::OutOfRangeParameter {
                name: INVESTING_AMOUNT,
                reason: format!("must be at most {}", u64::MAX),
            })?;

    Ok(BacktestRequest {
        investing_amount,
        sell_period,
        buy_period,
    })
}

fn require<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingParameter { name }),
    }
}

fn require_digits(name: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::NonNumericParameter {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_period(name: &'static str, value: &str) -> Result<usize, ValidationError> {
    match value.parse::<usize>() {
        Ok(0) => Err(ValidationError::OutOfRangeParameter {
            name,
            reason: "window length must be positive".into(),
        }),
        Ok(period) => Ok(period),
        Err(_) => Err(ValidationError::OutOfRangeParameter {
            name,
            reason: format!("must be at most {}", usize::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_parameters() {
        let request = validate(Some("10000"), Some("5"), Some("10")).unwrap();
        assert_eq!(
            request,
            BacktestRequest {
                investing_amount: 10000,
                sell_period: 5,
                buy_period: 10,
            }
        );
    }

    #[test]
    fn zero_investing_amount_is_allowed() {
        let request = validate(Some("0"), Some("5"), Some("10")).unwrap();
        assert_eq!(request.investing_amount, 0);
    }

    #[test]
    fn leading_zeros_are_digits() {
        let request = validate(Some("007"), Some("05"), Some("010")).unwrap();
        assert_eq!(request.investing_amount, 7);
        assert_eq!(request.sell_period, 5);
        assert_eq!(request.buy_period, 10);
    }

    #[test]
    fn missing_parameter() {
        assert_eq!(
            validate(None, Some("5"), Some("10")),
            Err(ValidationError::MissingParameter {
                name: INVESTING_AMOUNT
            })
        );
        assert_eq!(
            validate(Some("100"), Some("5"), None),
            Err(ValidationError::MissingParameter { name: BUY_PERIOD })
        );
    }

    #[test]
    fn empty_string_counts_as_missing() {
        assert_eq!(
            validate(Some("100"), Some(""), Some("10")),
            Err(ValidationError::MissingParameter { name: SELL_PERIOD })
        );
    }

    #[test]
    fn missing_wins_over_non_numeric() {
        assert_eq!(
            validate(Some("abc"), Some("def"), None),
            Err(ValidationError::MissingParameter { name: BUY_PERIOD })
        );
    }

    #[test]
    fn non_numeric_parameters() {
        for raw in ["abc", "1.5", "1e3", "+5", " 5", "٣"] {
            let result = validate(Some("100"), Some(raw), Some("10"));
            assert_eq!(
                result,
                Err(ValidationError::NonNumericParameter {
                    name: SELL_PERIOD,
                    value: raw.to_string(),
                }),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn negative_amount_is_non_numeric() {
        assert!(matches!(
            validate(Some("-1"), Some("5"), Some("10")),
            Err(ValidationError::NonNumericParameter {
                name: INVESTING_AMOUNT,
                ..
            })
        ));
    }

    #[test]
    fn non_numeric_wins_over_range() {
        assert!(matches!(
            validate(Some("x"), Some("0"), Some("10")),
            Err(ValidationError::NonNumericParameter { .. })
        ));
    }

    #[test]
    fn zero_periods_are_out_of_range() {
        assert!(matches!(
            validate(Some("100"), Some("0"), Some("10")),
            Err(ValidationError::OutOfRangeParameter {
                name: SELL_PERIOD,
                ..
            })
        ));
        assert!(matches!(
            validate(Some("100"), Some("5"), Some("0")),
            Err(ValidationError::OutOfRangeParameter {
                name: BUY_PERIOD,
                ..
            })
        ));
    }

    #[test]
    fn overflowing_amount_is_out_of_range() {
        assert!(matches!(
            validate(Some("99999999999999999999999"), Some("5"), Some("10")),
            Err(ValidationError::OutOfRangeParameter {
                name: INVESTING_AMOUNT,
                ..
            })
        ));
    }
}
