use super::{lenient, require_object};
use crate::domain::model::{EconomyEntry, EconomyUnit, ProviderId, ProviderRecord, Vin};
use crate::utils::error::ProviderFailure;
use serde::Deserialize;

/// `cmd=getTrims` body. Consumption figures are litres per 100 km.
#[derive(Debug, Deserialize)]
pub struct CarQueryTrimsResponse {
    #[serde(rename = "Trims", default)]
    pub trims: Vec<CarQueryTrim>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CarQueryTrim {
    #[serde(default, deserialize_with = "lenient::year")]
    pub model_year: Option<u16>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model_make_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model_trim: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model_engine_fuel: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub model_lkm_city: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub model_lkm_hwy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub model_lkm_mixed: Option<f64>,
}

impl From<CarQueryTrim> for EconomyEntry {
    fn from(trim: CarQueryTrim) -> Self {
        EconomyEntry {
            trim: trim.model_trim,
            year: trim.model_year,
            make: trim.model_make_id,
            model: trim.model_name,
            fuel_type: trim.model_engine_fuel,
            unit: EconomyUnit::LitersPer100Km,
            city: trim.model_lkm_city,
            highway: trim.model_lkm_hwy,
            combined: trim.model_lkm_mixed,
        }
    }
}

/// Every trim becomes one `EconomyEntry`; picking one is the merge
/// policy's job, not this function's.
pub fn normalize(vin: &Vin, raw: serde_json::Value) -> Result<ProviderRecord, ProviderFailure> {
    let raw = require_object(raw)?;
    let response: CarQueryTrimsResponse = serde_json::from_value(raw)
        .map_err(|e| ProviderFailure::malformed(format!("CarQuery trims body: {e}")))?;

    if response.trims.is_empty() {
        return Err(ProviderFailure::not_found("CarQuery has no trims for this make/model/year"));
    }

    let mut record = ProviderRecord::empty(ProviderId::CarQuery, vin.clone());
    record.economy = response.trims.into_iter().map(EconomyEntry::from).collect();
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vin() -> Vin {
        Vin::new("WP0AB2A99KS114523")
    }

    #[test]
    fn test_each_trim_becomes_an_entry() {
        let raw = json!({
            "Trims": [
                {
                    "model_id": "1",
                    "model_make_id": "porsche",
                    "model_name": "911",
                    "model_trim": "Carrera",
                    "model_year": "2019",
                    "model_engine_fuel": "Premium Unleaded (Required)",
                    "model_lkm_city": "11.8",
                    "model_lkm_hwy": "8.4",
                    "model_lkm_mixed": "10.2"
                },
                {
                    "model_make_id": "porsche",
                    "model_name": "911",
                    "model_trim": "Carrera S",
                    "model_year": "2019",
                    "model_lkm_city": null,
                    "model_lkm_hwy": "",
                    "model_lkm_mixed": "10.6"
                }
            ]
        });

        let record = normalize(&vin(), raw).unwrap();

        assert_eq!(record.provider, ProviderId::CarQuery);
        assert!(!record.has_identity());
        assert_eq!(record.economy.len(), 2);

        let first = &record.economy[0];
        assert_eq!(first.trim.as_deref(), Some("Carrera"));
        assert_eq!(first.year, Some(2019));
        assert_eq!(first.make.as_deref(), Some("porsche"));
        assert_eq!(first.unit, EconomyUnit::LitersPer100Km);
        assert_eq!(first.city, Some(11.8));
        assert_eq!(first.highway, Some(8.4));
        assert_eq!(first.combined, Some(10.2));
        assert_eq!(first.fuel_type.as_deref(), Some("Premium Unleaded (Required)"));

        let second = &record.economy[1];
        assert!(second.city.is_none());
        assert!(second.highway.is_none());
        assert_eq!(second.combined, Some(10.6));
    }

    #[test]
    fn test_no_trims_is_not_found() {
        let err = normalize(&vin(), json!({"Trims": []})).unwrap_err();
        assert!(err.is_not_found());

        let err = normalize(&vin(), json!({})).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_string_body_is_malformed() {
        let err = normalize(&vin(), json!("?({\"Trims\": []});")).unwrap_err();
        assert!(matches!(err, ProviderFailure::MalformedResponse { .. }));
    }
}
