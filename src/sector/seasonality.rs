//! Calendar-month seasonality factors

use chrono::Month;
use serde::{Deserialize, Serialize};

/// Multiplicative demand factor per calendar month.
///
/// Months absent from a serialized record default to 1.0 (no seasonality).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seasonality {
    pub january: f64,
    pub february: f64,
    pub march: f64,
    pub april: f64,
    pub may: f64,
    pub june: f64,
    pub july: f64,
    pub august: f64,
    pub september: f64,
    pub october: f64,
    pub november: f64,
    pub december: f64,
}

impl Default for Seasonality {
    fn default() -> Self {
        Self::flat()
    }
}

impl Seasonality {
    /// No seasonality: every month weighs 1.0
    pub fn flat() -> Self {
        Self::from_factors([1.0; 12])
    }

    /// Build from January..December factors
    pub fn from_factors(f: [f64; 12]) -> Self {
        Self {
            january: f[0],
            february: f[1],
            march: f[2],
            april: f[3],
            may: f[4],
            june: f[5],
            july: f[6],
            august: f[7],
            september: f[8],
            october: f[9],
            november: f[10],
            december: f[11],
        }
    }

    /// Factors in calendar order
    pub fn factors(&self) -> [f64; 12] {
        [
            self.january,
            self.february,
            self.march,
            self.april,
            self.may,
            self.june,
            self.july,
            self.august,
            self.september,
            self.october,
            self.november,
            self.december,
        ]
    }

    /// Factor for a 1-indexed calendar month. Out-of-range months get 1.0.
    pub fn factor_for(&self, calendar_month: u32) -> f64 {
        match calendar_month {
            1..=12 => self.factors()[(calendar_month - 1) as usize],
            _ => 1.0,
        }
    }

    pub fn factor(&self, month: Month) -> f64 {
        self.factor_for(month.number_from_month())
    }

    /// Month with the highest factor (earliest wins ties)
    pub fn peak(&self) -> (u32, f64) {
        self.extreme(|candidate, best| candidate > best)
    }

    /// Month with the lowest factor (earliest wins ties)
    pub fn trough(&self) -> (u32, f64) {
        self.extreme(|candidate, best| candidate < best)
    }

    fn extreme(&self, better: impl Fn(f64, f64) -> bool) -> (u32, f64) {
        let factors = self.factors();
        let mut best = (1, factors[0]);
        for (idx, &factor) in factors.iter().enumerate().skip(1) {
            if better(factor, best.1) {
                best = (idx as u32 + 1, factor);
            }
        }
        best
    }

    /// Every factor must be finite and non-negative
    pub fn validate(&self) -> Result<(), String> {
        for (idx, factor) in self.factors().iter().enumerate() {
            if !factor.is_finite() || *factor < 0.0 {
                return Err(format!(
                    "seasonality factor for {} is {}",
                    month_name(idx as u32 + 1),
                    factor
                ));
            }
        }
        Ok(())
    }
}

/// Calendar month reached `offset` months after `start_month` (both 1-indexed)
pub fn calendar_month(start_month: u32, offset: u32) -> u32 {
    (start_month.clamp(1, 12) - 1 + offset) % 12 + 1
}

/// English month name for a 1-indexed calendar month
pub fn month_name(calendar_month: u32) -> &'static str {
    u8::try_from(calendar_month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_months_default_to_one() {
        let s: Seasonality = serde_json::from_str(r#"{"january": 1.4, "august": 0.5}"#).unwrap();
        assert_eq!(s.factor_for(1), 1.4);
        assert_eq!(s.factor_for(8), 0.5);
        assert_eq!(s.factor_for(3), 1.0);
        assert_eq!(s.factor(Month::December), 1.0);
    }

    #[test]
    fn test_calendar_month_wraps() {
        assert_eq!(calendar_month(1, 0), 1);
        assert_eq!(calendar_month(1, 11), 12);
        assert_eq!(calendar_month(1, 12), 1);
        assert_eq!(calendar_month(10, 5), 3);
    }

    #[test]
    fn test_peak_and_trough() {
        let mut f = [1.0; 12];
        f[0] = 1.4;
        f[7] = 0.5;
        let s = Seasonality::from_factors(f);
        assert_eq!(s.peak(), (1, 1.4));
        assert_eq!(s.trough(), (8, 0.5));
        assert_eq!(month_name(8), "August");
    }

    #[test]
    fn test_negative_factor_rejected() {
        let mut f = [1.0; 12];
        f[4] = -0.1;
        assert!(Seasonality::from_factors(f).validate().is_err());
    }
}
