use super::{lenient, require_object};
use crate::domain::model::{ProviderId, ProviderRecord, Vin};
use crate::utils::error::ProviderFailure;
use serde::Deserialize;

/// `GET /vin/{vin}` body. Only the keys used downstream are modelled.
#[derive(Debug, Default, Deserialize)]
pub struct AutoDevVinResponse {
    #[serde(default, deserialize_with = "lenient::text")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub trim: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub body_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub origin: Option<String>,
    #[serde(default)]
    pub vehicle: Option<AutoDevVehicle>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AutoDevVehicle {
    #[serde(default, deserialize_with = "lenient::year")]
    pub year: Option<u16>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model: Option<String>,
}

pub fn normalize(vin: &Vin, raw: serde_json::Value) -> Result<ProviderRecord, ProviderFailure> {
    let raw = require_object(raw)?;
    let response: AutoDevVinResponse = serde_json::from_value(raw)
        .map_err(|e| ProviderFailure::malformed(format!("auto.dev VIN body: {e}")))?;

    let vehicle = response.vehicle.unwrap_or_default();
    let mut record = ProviderRecord::empty(ProviderId::AutoDev, vin.clone());
    // The nested vehicle object is the better-structured source.
    record.year = vehicle.year;
    record.make = vehicle.make.or(response.make);
    record.model = vehicle.model.or(response.model);
    record.trim = response.trim;
    record.body_type = response.body_type;
    record.origin = response.origin;

    if !record.has_identity() {
        return Err(ProviderFailure::not_found("auto.dev returned no year, make or model"));
    }
    Ok(record)
}
