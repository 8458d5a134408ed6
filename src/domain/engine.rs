//! Batch indicator computation: bars in, fully enriched series out.

use crate::domain::error::TurtlescanError;
use crate::domain::indicator::atr::AtrAccumulator;
use crate::domain::indicator::bullish::bullish_arrangement;
use crate::domain::indicator::moving_average::moving_average_at;
use crate::domain::indicator::rolling_extrema::{n_days_high_at, n_days_low_at};
use crate::domain::indicator::true_range::true_range_at;
use crate::domain::ohlcv::Bar;
use crate::domain::schema::IndicatorSchema;
use crate::domain::series::EnrichedSeries;

/// Compute every schema column for `bars` in one causal forward pass.
///
/// Pure and deterministic: identical input yields identical output, and the
/// value at index i reads bars 0..=i only. Fails with `DataUnavailable` on
/// an empty input; no column is ever partially populated.
pub fn enrich(
    symbol: &str,
    bars: &[Bar],
    schema: &IndicatorSchema,
) -> Result<EnrichedSeries, TurtlescanError> {
    if bars.is_empty() {
        return Err(TurtlescanError::DataUnavailable {
            symbol: symbol.to_string(),
        });
    }
    schema
        .validate()
        .map_err(|reason| TurtlescanError::Computation {
            symbol: symbol.to_string(),
            reason,
        })?;

    let mut series = EnrichedSeries::empty(symbol.to_string(), schema.clone());
    series.bars = bars.to_vec();

    let mut atr_state: Vec<AtrAccumulator> = schema
        .atr_periods
        .iter()
        .map(|&period| AtrAccumulator::new(period))
        .collect();

    for index in 0..series.bars.len() {
        compute_row(&mut series, schema, &mut atr_state, index);
    }

    Ok(series)
}

/// Derive row `index` of every column from the bars already in the series
/// and the carried ATR state. Shared by the batch path (all rows) and the
/// incremental path (appended rows only) — the append-consistency contract
/// holds because both run exactly this routine.
pub(crate) fn compute_row(
    series: &mut EnrichedSeries,
    schema: &IndicatorSchema,
    atr_state: &mut [AtrAccumulator],
    index: usize,
) {
    let tr = true_range_at(&series.bars, index);
    series.true_range.push(tr);

    for acc in atr_state.iter_mut() {
        let value = acc.update(tr);
        series.atr.entry(acc.period()).or_default().push(value);
    }

    let mut row_mas = Vec::with_capacity(schema.ma_periods.len());
    for &period in &schema.ma_periods {
        let value = moving_average_at(&series.bars, index, period);
        series.ma.entry(period).or_default().push(value);
        row_mas.push(value);
    }

    for &period in &schema.high_periods {
        let value = n_days_high_at(&series.bars, index, period);
        series.n_days_high.entry(period).or_default().push(value);
    }
    for &period in &schema.low_periods {
        let value = n_days_low_at(&series.bars, index, period);
        series.n_days_low.entry(period).or_default().push(value);
    }

    series.bullish.push(bullish_arrangement(&row_mas));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn small_schema() -> IndicatorSchema {
        IndicatorSchema {
            atr_periods: vec![3],
            ma_periods: vec![2, 4],
            high_periods: vec![3],
            low_periods: vec![3],
        }
    }

    #[test]
    fn empty_bars_is_data_unavailable() {
        let err = enrich("AAPL", &[], &small_schema()).unwrap_err();
        assert!(matches!(
            err,
            TurtlescanError::DataUnavailable { symbol } if symbol == "AAPL"
        ));
    }

    #[test]
    fn every_column_covers_every_row() {
        let bars: Vec<Bar> = (1..=6)
            .map(|i| make_bar(i, 100.0 + i as f64, 95.0 + i as f64, 98.0 + i as f64))
            .collect();
        let series = enrich("AAPL", &bars, &small_schema()).unwrap();

        assert_eq!(series.len(), 6);
        assert_eq!(series.true_range.len(), 6);
        assert_eq!(series.atr_column(3).unwrap().len(), 6);
        assert_eq!(series.ma_column(2).unwrap().len(), 6);
        assert_eq!(series.ma_column(4).unwrap().len(), 6);
        assert_eq!(series.high_column(3).unwrap().len(), 6);
        assert_eq!(series.low_column(3).unwrap().len(), 6);
        assert_eq!(series.bullish.len(), 6);
        assert!(series.validate().is_ok());
    }

    #[test]
    fn true_range_column_matches_formula() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 112.0, 104.0, 110.0), // H-L = 8 dominates
            make_bar(3, 109.0, 99.0, 100.0),  // |99-110| = 11 dominates
        ];
        let series = enrich("AAPL", &bars, &small_schema()).unwrap();
        assert_eq!(series.true_range, vec![10.0, 8.0, 11.0]);
    }

    #[test]
    fn atr_warmup_then_recursion() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0), // TR 10
            make_bar(2, 111.0, 103.0, 107.0), // TR 8
            make_bar(3, 113.0, 101.0, 104.0), // TR 12
            make_bar(4, 110.0, 104.0, 108.0), // TR 6
        ];
        let series = enrich("AAPL", &bars, &small_schema()).unwrap();
        let atr = series.atr_column(3).unwrap();

        assert_eq!(atr[0], 10.0);
        assert_eq!(atr[1], 9.0);
        assert_eq!(atr[2], 10.0);
        // (10 * 2 + 6) / 3 = 8.6667
        assert_eq!(atr[3], 8.6667);
    }

    #[test]
    fn ma_shrink_rule() {
        let bars = vec![
            make_bar(1, 11.0, 9.0, 10.0),
            make_bar(2, 21.0, 19.0, 20.0),
            make_bar(3, 31.0, 29.0, 30.0),
            make_bar(4, 41.0, 39.0, 40.0),
            make_bar(5, 51.0, 49.0, 50.0),
        ];
        let series = enrich("AAPL", &bars, &small_schema()).unwrap();
        let ma4 = series.ma_column(4).unwrap();

        assert_eq!(ma4[0], 10.0);
        assert_eq!(ma4[1], 15.0);
        assert_eq!(ma4[2], 20.0);
        assert_eq!(ma4[3], 25.0);
        assert_eq!(ma4[4], 35.0);
    }

    #[test]
    fn bullish_requires_strict_descending_mas() {
        // steadily rising closes: MA-2 > MA-4 once enough history exists
        let bars: Vec<Bar> = (1..=6)
            .map(|i| {
                let close = 100.0 + (i as f64) * 2.0;
                make_bar(i, close + 1.0, close - 1.0, close)
            })
            .collect();
        let series = enrich("AAPL", &bars, &small_schema()).unwrap();

        // at index 0 all MAs equal the close → tie → not bullish
        assert!(!series.bullish[0]);
        assert!(series.bullish[5]);
    }

    #[test]
    fn enrich_is_idempotent() {
        let bars: Vec<Bar> = (1..=20)
            .map(|i| {
                let base = 100.0 + (i as f64 * 1.7) % 13.0;
                make_bar(i, base + 2.0, base - 2.0, base)
            })
            .collect();
        let schema = IndicatorSchema::default();

        let first = enrich("AAPL", &bars, &schema).unwrap();
        let second = enrich("AAPL", &bars, &schema).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_schema_is_rejected() {
        let bars = vec![make_bar(1, 110.0, 100.0, 105.0)];
        let schema = IndicatorSchema {
            atr_periods: vec![0],
            ..IndicatorSchema::default()
        };
        assert!(enrich("AAPL", &bars, &schema).is_err());
    }
}
