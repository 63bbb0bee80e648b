//! Pure pricing arithmetic: volumetric weight, billable weight, and
//! multiplier application. No storage access, no I/O.

/// Carrier-industry volumetric divisor: cm³ per kg.
const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Volumetric weight in kg for a package of L×W×H centimeters.
pub fn volumetric_weight_kg(length_cm: f64, width_cm: f64, height_cm: f64) -> f64 {
    (length_cm * width_cm * height_cm) / VOLUMETRIC_DIVISOR
}

/// Billable weight: max(actual, volumetric), rounded to 2 decimal places
/// half-up. This is the value carriers actually charge against.
pub fn billable_weight_kg(
    actual_kg: f64,
    length_cm: f64,
    width_cm: f64,
    height_cm: f64,
) -> f64 {
    let volumetric = volumetric_weight_kg(length_cm, width_cm, height_cm);
    round2_half_up(actual_kg.max(volumetric))
}

/// Round to 2 decimal places, half-up.
pub fn round2_half_up(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Billable weight in integer grams, the unit used for tier lookups.
/// Since billable weight is rounded to 2 decimals, this is always a
/// multiple of 10.
pub fn billable_grams(billable_kg: f64) -> i64 {
    (billable_kg * 1000.0).round() as i64
}

/// Apply a customer multiplier to an integer minor-unit price, rounding
/// to the nearest minor unit.
///
/// The multiplier acts on integer cents directly — never on a floating
/// major-unit value — so repeated computation of the same quote always
/// yields the same cent amount.
pub fn apply_multiplier(price_minor_units: i64, multiplier: f64) -> i64 {
    (price_minor_units as f64 * multiplier).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volumetric_standard_divisor() {
        // 30×20×15 / 5000 = 1.8 kg
        assert_eq!(volumetric_weight_kg(30.0, 20.0, 15.0), 1.8);
    }

    #[test]
    fn billable_takes_max_of_actual_and_volumetric() {
        // Actual 2 kg beats volumetric 1.8 kg.
        assert_eq!(billable_weight_kg(2.0, 30.0, 20.0, 15.0), 2.0);
        // Bulky, light package: volumetric wins.
        assert_eq!(billable_weight_kg(0.5, 50.0, 40.0, 30.0), 12.0);
    }

    #[test]
    fn billable_rounds_to_two_decimals() {
        // 31×20×15 / 5000 = 1.86 kg
        assert_eq!(billable_weight_kg(1.0, 31.0, 20.0, 15.0), 1.86);
        // 10×10×13 / 5000 = 0.26
        assert_eq!(billable_weight_kg(0.1, 10.0, 10.0, 13.0), 0.26);
    }

    #[test]
    fn round_half_up() {
        assert_eq!(round2_half_up(1.855), 1.86);
        assert_eq!(round2_half_up(1.854), 1.85);
        assert_eq!(round2_half_up(2.0), 2.0);
    }

    #[test]
    fn billable_grams_is_multiple_of_ten() {
        assert_eq!(billable_grams(1.86), 1860);
        assert_eq!(billable_grams(2.0), 2000);
        assert_eq!(billable_grams(0.26), 260);
    }

    #[test]
    fn multiplier_exact_on_cents() {
        assert_eq!(apply_multiplier(1000, 1.5), 1500);
        assert_eq!(apply_multiplier(999, 1.1), 1099);
        assert_eq!(apply_multiplier(1250, 1.0), 1250);
    }

    #[test]
    fn multiplier_stable_over_repeated_computation() {
        // Same inputs must yield the same cents every time — no drift.
        for _ in 0..10_000 {
            assert_eq!(apply_multiplier(1000, 1.5), 1500);
        }
    }
}
