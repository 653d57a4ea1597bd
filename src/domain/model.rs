use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Vehicle Identification Number. Opaque aggregation key: trimmed and
/// upper-cased, never checksum-validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "auto_dev")]
    AutoDev,
    #[serde(rename = "nhtsa")]
    Nhtsa,
    #[serde(rename = "carquery")]
    CarQuery,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::AutoDev => "auto_dev",
            ProviderId::Nhtsa => "nhtsa",
            ProviderId::CarQuery => "carquery",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldGroup {
    Identity,
    Engine,
    Economy,
}

/// A semantic attribute with one agreed meaning across all providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Year,
    Make,
    Model,
    Trim,
    BodyType,
    Origin,
    DisplacementL,
    Cylinders,
    Horsepower,
    Drivetrain,
    FuelType,
    CityMpg,
    HighwayMpg,
    CombinedMpg,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 14] = [
        CanonicalField::Year,
        CanonicalField::Make,
        CanonicalField::Model,
        CanonicalField::Trim,
        CanonicalField::BodyType,
        CanonicalField::Origin,
        CanonicalField::DisplacementL,
        CanonicalField::Cylinders,
        CanonicalField::Horsepower,
        CanonicalField::Drivetrain,
        CanonicalField::FuelType,
        CanonicalField::CityMpg,
        CanonicalField::HighwayMpg,
        CanonicalField::CombinedMpg,
    ];

    pub fn as_str(self) -> &'static str {
        use CanonicalField::*;
        match self {
            Year => "year",
            Make => "make",
            Model => "model",
            Trim => "trim",
            BodyType => "body_type",
            Origin => "origin",
            DisplacementL => "displacement_l",
            Cylinders => "cylinders",
            Horsepower => "horsepower",
            Drivetrain => "drivetrain",
            FuelType => "fuel_type",
            CityMpg => "city_mpg",
            HighwayMpg => "highway_mpg",
            CombinedMpg => "combined_mpg",
        }
    }

    pub fn group(self) -> FieldGroup {
        use CanonicalField::*;
        match self {
            Year | Make | Model | Trim | BodyType | Origin => FieldGroup::Identity,
            DisplacementL | Cylinders | Horsepower | Drivetrain | FuelType => FieldGroup::Engine,
            CityMpg | HighwayMpg | CombinedMpg => FieldGroup::Economy,
        }
    }
}

/// Unit an economy figure was reported in, before conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomyUnit {
    MilesPerGallon,
    LitersPer100Km,
    KilometersPerLiter,
}

/// One trim/fuel economy observation, still in provider units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyEntry {
    pub trim: Option<String>,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub fuel_type: Option<String>,
    pub unit: EconomyUnit,
    pub city: Option<f64>,
    pub highway: Option<f64>,
    pub combined: Option<f64>,
}

/// Normalized output of one provider for one VIN. Every value is implicitly
/// tagged with `provider`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub provider: ProviderId,
    pub vin: Vin,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub body_type: Option<String>,
    pub origin: Option<String>,
    pub displacement_l: Option<f64>,
    pub cylinders: Option<u8>,
    pub horsepower: Option<u32>,
    pub drivetrain: Option<String>,
    pub fuel_type: Option<String>,
    pub economy: Vec<EconomyEntry>,
}

impl ProviderRecord {
    pub fn empty(provider: ProviderId, vin: Vin) -> Self {
        Self {
            provider,
            vin,
            year: None,
            make: None,
            model: None,
            trim: None,
            body_type: None,
            origin: None,
            displacement_l: None,
            cylinders: None,
            horsepower: None,
            drivetrain: None,
            fuel_type: None,
            economy: Vec::new(),
        }
    }

    /// True when at least one of year/make/model is present.
    pub fn has_identity(&self) -> bool {
        self.year.is_some() || self.make.is_some() || self.model.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub displacement_l: Option<f64>,
    pub cylinders: Option<u8>,
    #[serde(rename = "hp")]
    pub horsepower: Option<u32>,
    pub drivetrain: Option<String>,
    pub fuel_type: Option<String>,
}

impl EngineSummary {
    pub fn is_empty(&self) -> bool {
        self.displacement_l.is_none()
            && self.cylinders.is_none()
            && self.horsepower.is_none()
            && self.drivetrain.is_none()
            && self.fuel_type.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomySummary {
    pub city_mpg: Option<f64>,
    pub highway_mpg: Option<f64>,
    pub combined_mpg: Option<f64>,
    pub source: Option<ProviderId>,
    pub trim_used: Option<String>,
}

impl EconomySummary {
    pub fn is_empty(&self) -> bool {
        self.city_mpg.is_none() && self.highway_mpg.is_none() && self.combined_mpg.is_none()
    }
}

/// Merged, canonical profile for one VIN. Rebuilt on every request.
///
/// Unset fields stay `None`; nothing is defaulted to zero or "".
/// `sources` maps every populated field to the provider that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarProfile {
    pub vin: Vin,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    #[serde(rename = "type")]
    pub body_type: Option<String>,
    pub origin: Option<String>,
    pub engine: EngineSummary,
    pub economy: EconomySummary,
    pub sources: BTreeMap<CanonicalField, ProviderId>,
    pub generated_at: DateTime<Utc>,
}

impl CarProfile {
    /// True when year, make and model are all present.
    pub fn has_full_identity(&self) -> bool {
        self.year.is_some() && self.make.is_some() && self.model.is_some()
    }

    pub fn source_of(&self, field: CanonicalField) -> Option<ProviderId> {
        self.sources.get(&field).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vin_is_trimmed_and_uppercased() {
        let vin = Vin::new("  wp0ab2a99ks114523 ");
        assert_eq!(vin.as_str(), "WP0AB2A99KS114523");
        assert_eq!(vin.to_string(), "WP0AB2A99KS114523");
    }

    #[test]
    fn test_provider_id_serde_names() {
        let json = serde_json::to_string(&[ProviderId::AutoDev, ProviderId::Nhtsa, ProviderId::CarQuery])
            .unwrap();
        assert_eq!(json, r#"["auto_dev","nhtsa","carquery"]"#);
    }

    #[test]
    fn test_field_groups() {
        assert_eq!(CanonicalField::Trim.group(), FieldGroup::Identity);
        assert_eq!(CanonicalField::FuelType.group(), FieldGroup::Engine);
        assert_eq!(CanonicalField::CombinedMpg.group(), FieldGroup::Economy);
    }

    #[test]
    fn test_record_identity_detection() {
        let mut record = ProviderRecord::empty(ProviderId::Nhtsa, Vin::new("X"));
        assert!(!record.has_identity());
        record.make = Some("Porsche".to_string());
        assert!(record.has_identity());
    }
}
