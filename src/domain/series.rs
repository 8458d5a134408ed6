//! Enriched per-instrument series: bars plus every derived column.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::error::TurtlescanError;
use crate::domain::ohlcv::Bar;
use crate::domain::schema::{self, IndicatorSchema};

/// A bar series together with all derived indicator columns.
///
/// Columns are parallel to `bars` (one value per row) and keyed by window
/// length within each family. Owned exclusively by one instrument;
/// append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    pub symbol: String,
    pub schema: IndicatorSchema,
    pub bars: Vec<Bar>,
    pub true_range: Vec<f64>,
    pub atr: HashMap<usize, Vec<f64>>,
    pub ma: HashMap<usize, Vec<f64>>,
    pub n_days_high: HashMap<usize, Vec<f64>>,
    pub n_days_low: HashMap<usize, Vec<f64>>,
    pub bullish: Vec<bool>,
}

impl EnrichedSeries {
    /// An empty shell ready for row-by-row computation.
    pub fn empty(symbol: String, schema: IndicatorSchema) -> Self {
        let column = |periods: &[usize]| {
            periods
                .iter()
                .map(|&p| (p, Vec::new()))
                .collect::<HashMap<usize, Vec<f64>>>()
        };
        Self {
            symbol,
            bars: Vec::new(),
            true_range: Vec::new(),
            atr: column(&schema.atr_periods),
            ma: column(&schema.ma_periods),
            n_days_high: column(&schema.high_periods),
            n_days_low: column(&schema.low_periods),
            bullish: Vec::new(),
            schema,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_bar(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn atr_column(&self, period: usize) -> Result<&[f64], TurtlescanError> {
        self.column(&self.atr, period, schema::atr_column(period))
    }

    pub fn ma_column(&self, period: usize) -> Result<&[f64], TurtlescanError> {
        self.column(&self.ma, period, schema::ma_column(period))
    }

    pub fn high_column(&self, period: usize) -> Result<&[f64], TurtlescanError> {
        self.column(&self.n_days_high, period, schema::high_column(period))
    }

    pub fn low_column(&self, period: usize) -> Result<&[f64], TurtlescanError> {
        self.column(&self.n_days_low, period, schema::low_column(period))
    }

    fn column<'a>(
        &self,
        family: &'a HashMap<usize, Vec<f64>>,
        period: usize,
        name: String,
    ) -> Result<&'a [f64], TurtlescanError> {
        family
            .get(&period)
            .map(|v| v.as_slice())
            .ok_or_else(|| TurtlescanError::Computation {
                symbol: self.symbol.clone(),
                reason: format!("missing column {name}"),
            })
    }

    /// Structural checks on a series read back from storage: non-empty,
    /// strictly ascending dates, every schema column present and aligned
    /// with the bar count.
    pub fn validate(&self) -> Result<(), TurtlescanError> {
        if self.bars.is_empty() {
            return Err(self.malformed("series has no bars"));
        }
        for pair in self.bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(self.malformed(format!(
                    "dates not strictly ascending at {}",
                    pair[1].date
                )));
            }
        }

        let rows = self.bars.len();
        if self.true_range.len() != rows {
            return Err(self.malformed("True Range column misaligned"));
        }
        if self.bullish.len() != rows {
            return Err(self.malformed("Bullish column misaligned"));
        }
        for (family, periods, name) in [
            (&self.atr, self.schema.atr_periods.as_slice(), schema::atr_column as fn(usize) -> String),
            (&self.ma, self.schema.ma_periods.as_slice(), schema::ma_column),
            (&self.n_days_high, self.schema.high_periods.as_slice(), schema::high_column),
            (&self.n_days_low, self.schema.low_periods.as_slice(), schema::low_column),
        ] {
            for &period in periods {
                match family.get(&period) {
                    None => return Err(self.malformed(format!("missing column {}", name(period)))),
                    Some(values) if values.len() != rows => {
                        return Err(self.malformed(format!("column {} misaligned", name(period))));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn malformed(&self, reason: impl Into<String>) -> TurtlescanError {
        TurtlescanError::Computation {
            symbol: self.symbol.clone(),
            reason: reason.into(),
        }
    }
}
