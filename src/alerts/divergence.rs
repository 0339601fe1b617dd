// DEX vs index divergence

/// Percentage divergence of the DEX price from the reference price:
/// `(dex - reference) / reference * 100`.
///
/// `None` when the reference is absent, zero, negative or not finite, and
/// when the result itself is not finite. Never returns NaN.
pub fn divergence_percent(dex_price: f64, reference_price: Option<f64>) -> Option<f64> {
    let reference = reference_price.filter(|p| p.is_finite() && *p > 0.0)?;
    let divergence = (dex_price - reference) / reference * 100.0;
    divergence.is_finite().then_some(divergence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_prices_zero() {
        for p in [0.0001, 0.485, 1.0, 612.3] {
            assert_eq!(divergence_percent(p, Some(p)), Some(0.0));
        }
    }

    #[test]
    fn test_dex_above_index() {
        let d = divergence_percent(0.50, Some(0.485)).unwrap();
        assert!((d - 3.0927835).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_dex_below_index() {
        let d = divergence_percent(0.485, Some(0.50)).unwrap();
        assert!((d + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_undefined_reference() {
        assert_eq!(divergence_percent(0.5, None), None);
        assert_eq!(divergence_percent(0.5, Some(0.0)), None);
        assert_eq!(divergence_percent(0.5, Some(-0.4)), None);
        assert_eq!(divergence_percent(0.5, Some(f64::NAN)), None);
    }

    #[test]
    fn test_non_finite_dex_price() {
        assert_eq!(divergence_percent(f64::INFINITY, Some(0.5)), None);
    }
}
