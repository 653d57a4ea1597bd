use super::{lenient, require_object};
use crate::domain::model::{ProviderId, ProviderRecord, Vin};
use crate::utils::error::ProviderFailure;
use serde::Deserialize;

/// `DecodeVinValues` body: a flat, all-string row inside `Results`.
#[derive(Debug, Deserialize)]
pub struct NhtsaDecodeResponse {
    #[serde(rename = "Results", default)]
    pub results: Vec<NhtsaDecodedVin>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NhtsaDecodedVin {
    #[serde(default, deserialize_with = "lenient::year")]
    pub model_year: Option<u16>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub trim: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub body_class: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub plant_country: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub displacement_l: Option<f64>,
    #[serde(default, deserialize_with = "lenient::small_count")]
    pub engine_cylinders: Option<u8>,
    #[serde(default, rename = "EngineHP", deserialize_with = "lenient::count")]
    pub engine_hp: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub drive_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fuel_type_primary: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub error_text: Option<String>,
}

pub fn normalize(vin: &Vin, raw: serde_json::Value) -> Result<ProviderRecord, ProviderFailure> {
    let raw = require_object(raw)?;
    let response: NhtsaDecodeResponse = serde_json::from_value(raw)
        .map_err(|e| ProviderFailure::malformed(format!("vPIC decode body: {e}")))?;

    let Some(row) = response.results.into_iter().next() else {
        return Err(ProviderFailure::not_found("vPIC returned no result rows"));
    };

    let mut record = ProviderRecord::empty(ProviderId::Nhtsa, vin.clone());
    record.year = row.model_year;
    record.make = row.make;
    record.model = row.model;
    record.trim = row.trim;
    record.body_type = row.body_class;
    record.origin = row.plant_country;
    record.displacement_l = row.displacement_l.filter(|litres| *litres > 0.0);
    record.cylinders = row.engine_cylinders;
    record.horsepower = row.engine_hp;
    record.drivetrain = row.drive_type;
    record.fuel_type = row.fuel_type_primary;

    if !record.has_identity() {
        let reason = row
            .error_text
            .unwrap_or_else(|| "vPIC decoded no year, make or model".to_string());
        return Err(ProviderFailure::not_found(reason));
    }
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
    fn test_normalize_decoded_row() {
        let raw = json!({
            "Count": 1,
            "Message": "Results returned successfully",
            "Results": [{
                "ModelYear": "2019",
                "Make": "PORSCHE",
                "Model": "911",
                "Trim": "Carrera S",
                "BodyClass": "Coupe",
                "PlantCountry": "GERMANY",
                "DisplacementL": "2.981",
                "EngineCylinders": "6",
                "EngineHP": "443",
                "DriveType": "RWD/Rear-Wheel Drive",
                "FuelTypePrimary": "Gasoline",
                "ErrorCode": "0",
                "ErrorText": "0 - VIN decoded clean."
            }]
        });

        let record = normalize(&vin(), raw).unwrap();

        assert_eq!(record.provider, ProviderId::Nhtsa);
        assert_eq!(record.year, Some(2019));
        assert_eq!(record.make.as_deref(), Some("PORSCHE"));
        assert_eq!(record.body_type.as_deref(), Some("Coupe"));
        assert_eq!(record.origin.as_deref(), Some("GERMANY"));
        assert_eq!(record.displacement_l, Some(2.981));
        assert_eq!(record.cylinders, Some(6));
        assert_eq!(record.horsepower, Some(443));
        assert_eq!(record.drivetrain.as_deref(), Some("RWD/Rear-Wheel Drive"));
        assert_eq!(record.fuel_type.as_deref(), Some("Gasoline"));
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let raw = json!({
            "Results": [{
                "ModelYear": "2019",
                "Make": "PORSCHE",
                "Model": "911",
                "DisplacementL": "",
                "EngineCylinders": "",
                "EngineHP": "",
                "Trim": ""
            }]
        });

        let record = normalize(&vin(), raw).unwrap();
        assert!(record.trim.is_none());
        assert!(record.displacement_l.is_none());
        assert!(record.cylinders.is_none());
        assert!(record.horsepower.is_none());
    }

    #[test]
    fn test_undecodable_vin_is_not_found() {
        let raw = json!({
            "Results": [{
                "ModelYear": "",
                "Make": "",
                "Model": "",
                "ErrorCode": "11",
                "ErrorText": "11 - Incorrect Model Year, decoded data may not be accurate!"
            }]
        });

        let err = normalize(&vin(), raw).unwrap_err();
        assert_eq!(
            err,
            ProviderFailure::not_found("11 - Incorrect Model Year, decoded data may not be accurate!")
        );
    }

    #[test]
    fn test_no_rows_is_not_found() {
        let err = normalize(&vin(), json!({"Results": []})).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_results_of_wrong_type_is_malformed() {
        let err = normalize(&vin(), json!({"Results": "oops"})).unwrap_err();
        assert!(matches!(err, ProviderFailure::MalformedResponse { .. }));
    }
}
