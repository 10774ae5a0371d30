//! Discounted cash flow measures: NPV, IRR and payback
//!
//! Cash flow slices are per period with index 0 at the plan start (the
//! negative investment). Rates are per period.

/// Newton-Raphson seed
const IRR_SEED: f64 = 0.10;
const IRR_TOLERANCE: f64 = 1e-7;
const IRR_MAX_ITERATIONS: usize = 100;
/// Residual NPV accepted at the root, relative to the largest flow
const IRR_NPV_TOLERANCE: f64 = 1e-6;
const IRR_MIN_RATE: f64 = -0.99;
const IRR_MAX_RATE: f64 = 10.0;

/// Net present value at a per-period rate
pub fn npv(rate: f64, cashflows: &[f64]) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// NPV and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        npv += cf / discount;
        if t > 0 {
            dnpv -= (t as f64) * cf / ((1.0 + rate).powi(t as i32 + 1));
        }
    }

    (npv, dnpv)
}

/// Per-period internal rate of return by Newton-Raphson.
///
/// Returns `None` when the flows never change sign, the derivative vanishes,
/// the iteration does not settle within the iteration budget, or it settles
/// on a rate bound where NPV is not zero.
pub fn irr(cashflows: &[f64]) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }

    // At least one sign change is required for a root
    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    let mut rate = IRR_SEED;
    for _ in 0..IRR_MAX_ITERATIONS {
        let (npv, dnpv) = npv_and_derivative(cashflows, rate);
        if !npv.is_finite() || !dnpv.is_finite() || dnpv.abs() < 1e-20 {
            return None;
        }

        // Keep the rate inside (-1, 10]
        let new_rate = (rate - npv / dnpv).clamp(IRR_MIN_RATE, IRR_MAX_RATE);

        if (new_rate - rate).abs() < IRR_TOLERANCE {
            return is_root(cashflows, new_rate).then_some(new_rate);
        }
        rate = new_rate;
    }

    None
}

/// NPV at `rate` vanishes within tolerance of the flow scale
fn is_root(cashflows: &[f64], rate: f64) -> bool {
    let scale = cashflows.iter().fold(1.0_f64, |m, cf| m.max(cf.abs()));
    npv(rate, cashflows).abs() <= IRR_NPV_TOLERANCE * scale
}

/// Annualize a monthly rate by compounding
pub fn annualize(monthly_rate: f64) -> f64 {
    (1.0 + monthly_rate).powi(12) - 1.0
}

/// First period (1-indexed) whose running sum of `cashflows` is non-negative.
/// `cashflows[0]` is the opening position.
pub fn payback_period(cashflows: &[f64]) -> Option<u32> {
    let mut cumulative = 0.0;
    for (t, &cf) in cashflows.iter().enumerate() {
        cumulative += cf;
        if t > 0 && cumulative >= 0.0 {
            return Some(t as u32);
        }
    }
    None
}

/// Payback period on flows discounted at `rate`
pub fn discounted_payback_period(rate: f64, cashflows: &[f64]) -> Option<u32> {
    let discounted: Vec<f64> = cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .collect();
    payback_period(&discounted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn plan_flows() -> Vec<f64> {
        let mut flows = vec![-100_000.0];
        flows.extend((1..=36).map(|m| -3_000.0 + 400.0 * m as f64));
        flows
    }

    #[test]
    fn test_npv_simple() {
        let flows = [-1_000.0, 1_100.0];
        assert_abs_diff_eq!(npv(0.10, &flows), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(npv(0.0, &flows), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simple_irr() {
        let irr = irr(&[-1_000.0, 1_100.0]).unwrap();
        assert_abs_diff_eq!(irr, 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_npv_at_irr_is_zero() {
        let flows = plan_flows();
        let rate = irr(&flows).unwrap();
        assert_abs_diff_eq!(npv(rate, &flows), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_irr_undefined_without_sign_change() {
        assert_eq!(irr(&[-1_000.0, -10.0, -10.0]), None);
        assert_eq!(irr(&[]), None);
    }

    #[test]
    fn test_irr_undefined_when_pinned_at_rate_bound() {
        // Losses outweigh the late positive months: Newton runs into the upper bound
        let mut flows = vec![-115_000.0];
        flows.extend((0..36).map(|m| -7_700.0 + 300.0 * m as f64));
        assert_eq!(flows[36], 2_800.0);
        assert_eq!(irr(&flows), None);

        // The only root lies below -99% per period
        assert_eq!(irr(&[-1_000.0, 1.0]), None);
    }

    #[test]
    fn test_defined_irr_is_a_root() {
        for flows in [plan_flows(), vec![-1_000.0, 1_100.0], vec![-500.0, 100.0, 200.0, 300.0]] {
            if let Some(rate) = irr(&flows) {
                assert!(rate > IRR_MIN_RATE && rate < IRR_MAX_RATE);
                assert_abs_diff_eq!(npv(rate, &flows), 0.0, epsilon = 1e-4);
            }
        }
        assert!(irr(&[-500.0, 100.0, 200.0, 300.0]).is_some());
    }

    #[test]
    fn test_payback() {
        let flows = [-1_000.0, 400.0, 400.0, 200.0, 200.0];
        assert_eq!(payback_period(&flows), Some(3));
        assert_eq!(payback_period(&[-1_000.0, 100.0]), None);
        // Discounting pushes recovery later
        assert_eq!(discounted_payback_period(0.05, &flows), Some(4));
    }

    #[test]
    fn test_annualize() {
        assert_abs_diff_eq!(annualize(0.01), 0.126_825_030_131_969_77, epsilon = 1e-12);
    }
}
