//! Historical application outcomes, the ML optimizer's training input.

use super::problem::{ApplicationMethod, NutrientType};

/// One past fertilizer application and its observed outcome.
///
/// Supplied by the caller, read-only; the core never mutates or persists
/// these. The ML optimizer trains a fresh yield-response model from a
/// slice of records on every call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoricalRecord {
    pub field_id: String,
    pub crop: String,
    /// Day offset from planting when the application happened.
    pub day: u32,
    pub nutrient: NutrientType,
    /// Amount applied, in units/acre.
    pub amount: f64,
    pub method: ApplicationMethod,
    /// Observed mean temperature on the application day, °C.
    pub temp_c: f64,
    /// Observed precipitation on the application day, mm.
    pub precip_mm: f64,
    /// Growth-stage code at application time (see [`GrowthStage::code`](super::GrowthStage::code)).
    pub growth_stage: u8,
    /// Volumetric soil moisture fraction in [0, 1].
    pub soil_moisture: f64,
    /// Observed yield outcome, normalized to the farm's reference yield.
    pub yield_outcome: f64,
    /// Realized cost of the application.
    pub cost: f64,
}

impl HistoricalRecord {
    /// A record with neutral observations, useful as a test fixture base.
    pub fn synthetic(day: u32, nutrient: NutrientType, amount: f64, yield_outcome: f64) -> Self {
        Self {
            field_id: "synthetic".into(),
            crop: "corn".into(),
            day,
            nutrient,
            amount,
            method: ApplicationMethod::Broadcast,
            temp_c: 20.0,
            precip_mm: 2.0,
            growth_stage: 1,
            soil_moisture: 0.3,
            yield_outcome,
            cost: amount,
        }
    }
}
