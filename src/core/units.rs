//! Fuel economy unit conversion. All factors use the US gallon
//! (3.785411784 L) and the international mile (1.609344 km).

use crate::domain::model::EconomyUnit;

/// MPG = this / (L/100km)
pub const L_PER_100KM_TO_MPG: f64 = 235.214_583_3;

/// MPG = this × (km/L)
pub const KM_PER_L_TO_MPG: f64 = 2.352_145_833;

/// Converts a raw economy figure to miles per gallon.
///
/// Returns `None` for zero, negative or non-finite input: a consumption of
/// 0 L/100km has no MPG equivalent and is treated as a missing value.
pub fn to_mpg(value: f64, unit: EconomyUnit) -> Option<f64> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let mpg = match unit {
        EconomyUnit::MilesPerGallon => value,
        EconomyUnit::LitersPer100Km => L_PER_100KM_TO_MPG / value,
        EconomyUnit::KilometersPerLiter => KM_PER_L_TO_MPG * value,
    };
    Some(mpg)
}

/// Rounds to one decimal place, the precision profiles report MPG in.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
