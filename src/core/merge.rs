//! Field-precedence merge of provider records into one `CarProfile`.
//!
//! For every canonical field the providers are visited in the policy's
//! order and the first present value wins. No averaging, no voting.

use crate::config::toml_config::PrecedenceConfig;
use crate::core::units::{round_tenths, to_mpg};
use crate::domain::model::{
    CanonicalField, CarProfile, EconomyEntry, EconomySummary, EngineSummary, FieldGroup,
    ProviderId, ProviderRecord, Vin,
};
use crate::domain::ports::LookupQuery;
use chrono::Utc;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PrecedencePolicy {
    identity: Vec<ProviderId>,
    engine: Vec<ProviderId>,
    economy: Vec<ProviderId>,
    overrides: BTreeMap<CanonicalField, Vec<ProviderId>>,
}

impl Default for PrecedencePolicy {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        // The selected economy entry's fuel label is a last-resort fallback.
        overrides.insert(
            CanonicalField::FuelType,
            vec![ProviderId::AutoDev, ProviderId::Nhtsa, ProviderId::CarQuery],
        );

        Self {
            identity: vec![ProviderId::AutoDev, ProviderId::Nhtsa],
            engine: vec![ProviderId::AutoDev, ProviderId::Nhtsa],
            economy: vec![ProviderId::CarQuery],
            overrides,
        }
    }
}

impl PrecedencePolicy {
    pub fn from_config(config: &PrecedenceConfig) -> Self {
        let mut policy = Self::default();
        if let Some(identity) = &config.identity {
            policy.identity = identity.clone();
        }
        if let Some(engine) = &config.engine {
            policy.engine = engine.clone();
        }
        if let Some(economy) = &config.economy {
            policy.economy = economy.clone();
        }
        for (field, order) in &config.overrides {
            policy.overrides.insert(*field, order.clone());
        }
        policy
    }

    pub fn with_group(mut self, group: FieldGroup, order: Vec<ProviderId>) -> Self {
        match group {
            FieldGroup::Identity => self.identity = order,
            FieldGroup::Engine => self.engine = order,
            FieldGroup::Economy => self.economy = order,
        }
        self
    }

    pub fn with_override(mut self, field: CanonicalField, order: Vec<ProviderId>) -> Self {
        self.overrides.insert(field, order);
        self
    }

    pub fn order_for(&self, field: CanonicalField) -> &[ProviderId] {
        if let Some(order) = self.overrides.get(&field) {
            return order;
        }
        match field.group() {
            FieldGroup::Identity => &self.identity,
            FieldGroup::Engine => &self.engine,
            FieldGroup::Economy => &self.economy,
        }
    }
}

struct Merger<'a> {
    records: &'a [ProviderRecord],
    policy: &'a PrecedencePolicy,
    sources: BTreeMap<CanonicalField, ProviderId>,
}

impl<'a> Merger<'a> {
    fn new(records: &'a [ProviderRecord], policy: &'a PrecedencePolicy) -> Self {
        Self {
            records,
            policy,
            sources: BTreeMap::new(),
        }
    }

    fn pick<T>(
        &mut self,
        field: CanonicalField,
        get: impl Fn(&ProviderRecord) -> Option<T>,
    ) -> Option<T> {
        for provider in self.policy.order_for(field) {
            let value = self
                .records
                .iter()
                .filter(|record| record.provider == *provider)
                .find_map(&get);
            if let Some(value) = value {
                self.sources.insert(field, *provider);
                return Some(value);
            }
        }
        None
    }

    fn identity(&mut self, vin: &Vin) -> LookupQuery {
        LookupQuery {
            vin: vin.clone(),
            year: self.pick(CanonicalField::Year, |r| r.year),
            make: self.pick(CanonicalField::Make, |r| r.make.clone()),
            model: self.pick(CanonicalField::Model, |r| r.model.clone()),
            trim: self.pick(CanonicalField::Trim, |r| r.trim.clone()),
        }
    }
}

/// Year/make/model/trim merged by precedence, used to key identity-only
/// lookups and to select economy entries.
pub fn identity_query(vin: &Vin, records: &[ProviderRecord], policy: &PrecedencePolicy) -> LookupQuery {
    Merger::new(records, policy).identity(vin)
}

/// The economy entry chosen for a profile and the provider it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomySelection<'a> {
    pub provider: ProviderId,
    pub entry: &'a EconomyEntry,
}

/// Walks the economy precedence order and returns the first provider whose
/// entries contain one consistent with the decoded identity.
pub fn select_economy<'a>(
    records: &'a [ProviderRecord],
    identity: &LookupQuery,
    policy: &PrecedencePolicy,
) -> Option<EconomySelection<'a>> {
    policy
        .order_for(CanonicalField::CityMpg)
        .iter()
        .find_map(|provider| {
            records
                .iter()
                .filter(|record| record.provider == *provider)
                .find_map(|record| select_entry(&record.economy, identity))
                .map(|entry| EconomySelection {
                    provider: *provider,
                    entry,
                })
        })
}

/// Drops entries that contradict the decoded year/make/model, then prefers
/// a case-insensitive exact trim match and otherwise takes the first entry.
pub fn select_entry<'a>(entries: &'a [EconomyEntry], identity: &LookupQuery) -> Option<&'a EconomyEntry> {
    let candidates: Vec<&EconomyEntry> = entries
        .iter()
        .filter(|entry| matches_identity(entry, identity))
        .collect();

    if let Some(wanted) = identity.trim.as_deref().map(str::trim) {
        let exact = candidates.iter().find(|entry| {
            entry
                .trim
                .as_deref()
                .is_some_and(|trim| trim.trim().eq_ignore_ascii_case(wanted))
        });
        if let Some(entry) = exact {
            return Some(*entry);
        }
    }

    candidates.first().copied()
}

fn matches_identity(entry: &EconomyEntry, identity: &LookupQuery) -> bool {
    let year_ok = match (entry.year, identity.year) {
        (Some(entry_year), Some(year)) => entry_year == year,
        _ => true,
    };
    year_ok
        && same_name(entry.make.as_deref(), identity.make.as_deref())
        && same_name(entry.model.as_deref(), identity.model.as_deref())
}

/// Compares names ignoring case and punctuation, so "land-rover" and
/// "Land Rover" agree. Absence on either side is not a contradiction.
fn same_name(entry: Option<&str>, decoded: Option<&str>) -> bool {
    match (entry, decoded) {
        (Some(a), Some(b)) => name_key(a) == name_key(b),
        _ => true,
    }
}

fn name_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Builds the canonical profile. Records from providers that are not listed
/// for a field never contribute to it.
pub fn merge_records(vin: &Vin, records: &[ProviderRecord], policy: &PrecedencePolicy) -> CarProfile {
    let mut merger = Merger::new(records, policy);
    let identity = merger.identity(vin);

    let body_type = merger.pick(CanonicalField::BodyType, |r| r.body_type.clone());
    let origin = merger.pick(CanonicalField::Origin, |r| r.origin.clone());

    let selection = select_economy(records, &identity, policy);
    let selected_fuel = |record: &ProviderRecord| {
        selection
            .as_ref()
            .filter(|s| s.provider == record.provider)
            .and_then(|s| s.entry.fuel_type.clone())
    };

    let engine = EngineSummary {
        displacement_l: merger.pick(CanonicalField::DisplacementL, |r| r.displacement_l),
        cylinders: merger.pick(CanonicalField::Cylinders, |r| r.cylinders),
        horsepower: merger.pick(CanonicalField::Horsepower, |r| r.horsepower),
        drivetrain: merger.pick(CanonicalField::Drivetrain, |r| r.drivetrain.clone()),
        fuel_type: merger.pick(CanonicalField::FuelType, |r| {
            r.fuel_type.clone().or_else(|| selected_fuel(r))
        }),
    };

    let economy = match &selection {
        Some(selection) => {
            let entry = selection.entry;
            let convert = |value: Option<f64>| value.and_then(|v| to_mpg(v, entry.unit)).map(round_tenths);
            let summary = EconomySummary {
                city_mpg: convert(entry.city),
                highway_mpg: convert(entry.highway),
                combined_mpg: convert(entry.combined),
                source: Some(selection.provider),
                trim_used: entry.trim.clone(),
            };
            let populated = [
                (CanonicalField::CityMpg, summary.city_mpg),
                (CanonicalField::HighwayMpg, summary.highway_mpg),
                (CanonicalField::CombinedMpg, summary.combined_mpg),
            ];
            for (field, value) in populated {
                if value.is_some() {
                    merger.sources.insert(field, selection.provider);
                }
            }
            if summary.is_empty() {
                EconomySummary::default()
            } else {
                summary
            }
        }
        None => EconomySummary::default(),
    };

    CarProfile {
        vin: vin.clone(),
        year: identity.year,
        make: identity.make,
        model: identity.model,
        trim: identity.trim,
        body_type,
        origin,
        engine,
        economy,
        sources: merger.sources,
        generated_at: Utc::now(),
    }
}
