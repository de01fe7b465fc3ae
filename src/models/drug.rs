use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AdministrationRoute, FormulationType};
use super::profile::{optional_text, parse_choice, required_text, ValidationError};

/// Reference catalog entry. Never consulted by the dose pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drug {
    pub id: Uuid,
    pub name: String,
    pub generic_name: Option<String>,
    pub drug_class: Option<String>,
    pub mechanism: Option<String>,
    pub indications: Option<String>,
    pub contraindications: Option<String>,
    pub side_effects: Option<String>,
    pub interactions: Option<String>,
    pub standard_dose_adult: Option<String>,
    pub standard_dose_pediatric: Option<String>,
    pub max_daily_dose: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugFormulation {
    pub id: Uuid,
    pub drug_id: Uuid,
    pub form_type: FormulationType,
    pub strength: String,
    pub route: Option<AdministrationRoute>,
    pub manufacturer: Option<String>,
    pub market_availability: bool,
}

/// Raw catalog entry form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrugSubmission {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub drug_class: Option<String>,
    pub mechanism: Option<String>,
    pub indications: Option<String>,
    pub contraindications: Option<String>,
    pub side_effects: Option<String>,
    pub interactions: Option<String>,
    pub standard_dose_adult: Option<String>,
    pub standard_dose_pediatric: Option<String>,
    pub max_daily_dose: Option<String>,
}

impl DrugSubmission {
    pub fn into_drug(self) -> Result<Drug, ValidationError> {
        let mut errors = Vec::new();
        let e = &mut errors;

        let name = required_text(e, "name", self.name, 2, 100);
        let generic_name = optional_text(e, "generic_name", self.generic_name, 100);
        let drug_class = optional_text(e, "drug_class", self.drug_class, 100);
        let mechanism = optional_text(e, "mechanism", self.mechanism, 1000);
        let indications = optional_text(e, "indications", self.indications, 1000);
        let contraindications =
            optional_text(e, "contraindications", self.contraindications, 1000);
        let side_effects = optional_text(e, "side_effects", self.side_effects, 1000);
        let interactions = optional_text(e, "interactions", self.interactions, 1000);
        let standard_dose_adult =
            optional_text(e, "standard_dose_adult", self.standard_dose_adult, 100);
        let standard_dose_pediatric =
            optional_text(e, "standard_dose_pediatric", self.standard_dose_pediatric, 100);
        let max_daily_dose = optional_text(e, "max_daily_dose", self.max_daily_dose, 100);

        match name {
            Some(name) if errors.is_empty() => {
                let now = chrono::Local::now().naive_local();
                Ok(Drug {
                    id: Uuid::new_v4(),
                    name,
                    generic_name,
                    drug_class,
                    mechanism,
                    indications,
                    contraindications,
                    side_effects,
                    interactions,
                    standard_dose_adult,
                    standard_dose_pediatric,
                    max_daily_dose,
                    created_at: now,
                    updated_at: now,
                })
            }
            _ => Err(ValidationError { fields: errors }),
        }
    }
}

/// Raw formulation form. Availability defaults to available.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormulationSubmission {
    pub form_type: Option<String>,
    pub strength: Option<String>,
    pub route: Option<String>,
    pub manufacturer: Option<String>,
    pub market_availability: Option<bool>,
}

impl FormulationSubmission {
    pub fn into_formulation(self, drug_id: Uuid) -> Result<DrugFormulation, ValidationError> {
        let mut errors = Vec::new();

        let form_type = parse_choice::<FormulationType>(&mut errors, "form_type", self.form_type);
        let strength = required_text(&mut errors, "strength", self.strength, 1, 50);
        let route = match self.route.filter(|r| !r.trim().is_empty()) {
            Some(raw) => parse_choice::<AdministrationRoute>(&mut errors, "route", Some(raw)),
            None => None,
        };
        let manufacturer = optional_text(&mut errors, "manufacturer", self.manufacturer, 100);

        match (form_type, strength) {
            (Some(form_type), Some(strength)) if errors.is_empty() => Ok(DrugFormulation {
                id: Uuid::new_v4(),
                drug_id,
                form_type,
                strength,
                route,
                manufacturer,
                market_availability: self.market_availability.unwrap_or(true),
            }),
            _ => Err(ValidationError { fields: errors }),
        }
    }
}
