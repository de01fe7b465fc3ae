use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MedicalCondition {
    Normal => "normal",
    Hypertension => "hypertension",
    DiabetesType1 => "diabetes_type1",
    DiabetesType2 => "diabetes_type2",
    KidneyDisease => "kidney_disease",
    LiverDisease => "liver_disease",
    HeartDisease => "heart_disease",
    Asthma => "asthma",
    Copd => "copd",
    Epilepsy => "epilepsy",
    Depression => "depression",
    Anxiety => "anxiety",
    Arthritis => "arthritis",
    Osteoporosis => "osteoporosis",
    Cancer => "cancer",
    ThyroidDisorder => "thyroid_disorder",
    Other => "other",
});

str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    Critical => "critical",
});

str_enum!(VerificationStatus {
    Approved => "approved",
    NeedsAdjustment => "needs_adjustment",
    Rejected => "rejected",
});

str_enum!(FormulationType {
    Tablet => "tablet",
    Capsule => "capsule",
    Syrup => "syrup",
    Injection => "injection",
    Cream => "cream",
    Drops => "drops",
    Inhaler => "inhaler",
    Patch => "patch",
    Suppository => "suppository",
});

str_enum!(AdministrationRoute {
    Oral => "oral",
    Iv => "iv",
    Im => "im",
    Sc => "sc",
    Topical => "topical",
    Inhalation => "inhalation",
    Rectal => "rectal",
    Transdermal => "transdermal",
});
