//! Renders a `CarProfile` as one or more short sentences. Absent fields drop
//! their clause entirely; nothing here can fail.

use crate::domain::model::{CarProfile, EconomySummary, EngineSummary};

pub fn summarize(profile: &CarProfile) -> String {
    let (Some(year), Some(make), Some(model)) = (profile.year, &profile.make, &profile.model) else {
        return incomplete(profile);
    };

    let mut summary = format!("{} {} {}", year, make, model);
    if let Some(trim) = &profile.trim {
        summary.push(' ');
        summary.push_str(trim);
    }
    if let Some(body) = &profile.body_type {
        summary.push_str(&format!(" ({})", body));
    }
    if let Some(origin) = &profile.origin {
        summary.push_str(&format!(", built in {}", origin));
    }
    summary.push('.');

    if let Some(engine) = engine_clause(&profile.engine) {
        summary.push_str(" Engine: ");
        summary.push_str(&engine);
        summary.push('.');
    }
    if let Some(economy) = economy_clause(&profile.economy) {
        summary.push_str(" Estimated fuel economy: ");
        summary.push_str(&economy);
        summary.push_str(" MPG.");
    }

    summary
}

fn engine_clause(engine: &EngineSummary) -> Option<String> {
    let parts: Vec<String> = [
        engine.displacement_l.map(|litres| format!("{:.1}L", litres)),
        engine.cylinders.map(|count| format!("{}-cylinder", count)),
        engine.horsepower.map(|hp| format!("{} hp", hp)),
        engine.drivetrain.clone(),
        engine.fuel_type.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

fn economy_clause(economy: &EconomySummary) -> Option<String> {
    let parts: Vec<String> = [
        (economy.city_mpg, "city"),
        (economy.highway_mpg, "highway"),
        (economy.combined_mpg, "combined"),
    ]
    .into_iter()
    .filter_map(|(mpg, label)| mpg.map(|value| format!("{:.0} {}", value, label)))
    .collect();

    (!parts.is_empty()).then(|| parts.join(" / "))
}

fn incomplete(profile: &CarProfile) -> String {
    let known: Vec<String> = [
        profile.year.map(|year| year.to_string()),
        profile.make.clone(),
        profile.model.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if known.is_empty() {
        format!("Incomplete vehicle profile for VIN {}.", profile.vin)
    } else {
        format!(
            "Incomplete vehicle profile for VIN {} (known: {}).",
            profile.vin,
            known.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ProviderId, Vin};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn profile() -> CarProfile {
        CarProfile {
            vin: Vin::new("WP0AB2A99KS114523"),
            year: Some(2019),
            make: Some("Porsche".to_string()),
            model: Some("911".to_string()),
            trim: None,
            body_type: None,
            origin: None,
            engine: EngineSummary::default(),
            economy: EconomySummary::default(),
            sources: BTreeMap::new(),
            generated_at: Utc::now(),
        }
    }

    fn assert_no_placeholders(summary: &str) {
        for placeholder in ["None", "null", "()", ",,"] {
            assert!(!summary.contains(placeholder), "{:?} in {:?}", placeholder, summary);
        }
    }

    #[test]
    fn test_full_profile() {
        let mut profile = profile();
        profile.trim = Some("Carrera S".to_string());
        profile.body_type = Some("Coupe".to_string());
        profile.origin = Some("Germany".to_string());
        profile.engine = EngineSummary {
            displacement_l: Some(3.0),
            cylinders: Some(6),
            horsepower: Some(443),
            drivetrain: Some("RWD".to_string()),
            fuel_type: Some("Gasoline".to_string()),
        };
        profile.economy = EconomySummary {
            city_mpg: Some(19.6),
            highway_mpg: Some(27.8),
            combined_mpg: None,
            source: Some(ProviderId::CarQuery),
            trim_used: Some("Carrera S".to_string()),
        };

        assert_eq!(
            summarize(&profile),
            "2019 Porsche 911 Carrera S (Coupe), built in Germany. \
             Engine: 3.0L, 6-cylinder, 443 hp, RWD, Gasoline. \
             Estimated fuel economy: 20 city / 28 highway MPG."
        );
    }

    #[test]
    fn test_engine_clause_omitted_when_absent() {
        let mut profile = profile();
        profile.economy.combined_mpg = Some(22.0);

        let summary = summarize(&profile);

        assert_eq!(summary, "2019 Porsche 911. Estimated fuel economy: 22 combined MPG.");
        assert!(!summary.contains("Engine"));
        assert_no_placeholders(&summary);
    }

    #[test]
    fn test_identity_only() {
        let summary = summarize(&profile());
        assert_eq!(summary, "2019 Porsche 911.");
    }

    #[test]
    fn test_partial_engine() {
        let mut profile = profile();
        profile.engine.cylinders = Some(4);

        assert_eq!(summarize(&profile), "2019 Porsche 911. Engine: 4-cylinder.");
    }

    #[test]
    fn test_incomplete_identity_fallback() {
        let mut profile = profile();
        profile.model = None;
        profile.engine.cylinders = Some(6);

        let summary = summarize(&profile);

        assert_eq!(
            summary,
            "Incomplete vehicle profile for VIN WP0AB2A99KS114523 (known: 2019 Porsche)."
        );
        assert_no_placeholders(&summary);
    }

    #[test]
    fn test_nothing_known() {
        let mut profile = profile();
        profile.year = None;
        profile.make = None;
        profile.model = None;

        assert_eq!(
            summarize(&profile),
            "Incomplete vehicle profile for VIN WP0AB2A99KS114523."
        );
    }
}
