//! The immutable optimization input.
//!
//! A [`SchedulingProblem`] bundles the agronomic context (nutrient
//! requirements, growth curve), the external-collaborator data (weather
//! forecast, prices, equipment calendar) and the hard constraints for one
//! optimization call. It is built once, validated once, and read by every
//! algorithm; nothing in the core mutates it.

use std::collections::BTreeMap;

use crate::error::ValidationError;

/// Primary fertilizer nutrients (NPK).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NutrientType {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl NutrientType {
    /// All nutrients, in the canonical (ordinal) order.
    pub const ALL: [NutrientType; 3] = [
        NutrientType::Nitrogen,
        NutrientType::Phosphorus,
        NutrientType::Potassium,
    ];

    /// Ordinal index, used for one-hot feature encoding and DP state layout.
    pub fn index(self) -> usize {
        match self {
            NutrientType::Nitrogen => 0,
            NutrientType::Phosphorus => 1,
            NutrientType::Potassium => 2,
        }
    }
}

/// How fertilizer is physically applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApplicationMethod {
    /// Uniform surface spreading.
    Broadcast,
    /// Banded application alongside a growing crop row.
    SideDress,
    /// Liquid spray on foliage.
    Foliar,
    /// Delivery through irrigation water.
    Fertigation,
}

impl ApplicationMethod {
    /// All methods, in the canonical (ordinal) order.
    pub const ALL: [ApplicationMethod; 4] = [
        ApplicationMethod::Broadcast,
        ApplicationMethod::SideDress,
        ApplicationMethod::Foliar,
        ApplicationMethod::Fertigation,
    ];

    /// Ordinal index, used for one-hot feature encoding.
    pub fn index(self) -> usize {
        match self {
            ApplicationMethod::Broadcast => 0,
            ApplicationMethod::SideDress => 1,
            ApplicationMethod::Foliar => 2,
            ApplicationMethod::Fertigation => 3,
        }
    }
}

/// One day of the weather forecast supplied by the external provider.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DailyForecast {
    /// Day offset from the start of the horizon.
    pub day: u32,
    /// Predicted mean temperature in °C.
    pub temp_c: f64,
    /// Predicted precipitation in mm.
    pub precip_mm: f64,
    /// Forecast confidence in [0, 1]; decays with lead time.
    pub confidence: f64,
}

/// Discretized crop development phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GrowthStage {
    Emergence,
    Vegetative,
    Reproductive,
    Maturation,
}

impl GrowthStage {
    /// Numeric stage code for feature encoding.
    pub fn code(self) -> u8 {
        match self {
            GrowthStage::Emergence => 0,
            GrowthStage::Vegetative => 1,
            GrowthStage::Reproductive => 2,
            GrowthStage::Maturation => 3,
        }
    }
}

/// Growth-stage model: maps a day to a stage and a nutrient demand level.
///
/// Break days partition the season; `demand` gives the relative nutrient
/// uptake of each stage in [0, 1]. The default curve peaks during the
/// reproductive phase, which is what drives application timing toward
/// mid-season.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GrowthCurve {
    /// Stage boundaries as day offsets: emergence ends, vegetative ends,
    /// reproductive ends. Days past the last boundary are maturation.
    pub breaks: [u32; 3],
    /// Relative nutrient demand per stage, in [0, 1].
    pub demand: [f64; 4],
}

impl GrowthCurve {
    /// A generic curve sized to the given season length.
    pub fn default_for(horizon_days: u32) -> Self {
        let h = horizon_days as f64;
        Self {
            breaks: [
                (h * 0.15) as u32,
                (h * 0.45) as u32,
                (h * 0.75) as u32,
            ],
            demand: [0.3, 0.9, 1.0, 0.2],
        }
    }

    /// Stage on the given day.
    pub fn stage(&self, day: u32) -> GrowthStage {
        if day < self.breaks[0] {
            GrowthStage::Emergence
        } else if day < self.breaks[1] {
            GrowthStage::Vegetative
        } else if day < self.breaks[2] {
            GrowthStage::Reproductive
        } else {
            GrowthStage::Maturation
        }
    }

    /// Relative nutrient demand on the given day, in [0, 1].
    pub fn demand(&self, day: u32) -> f64 {
        self.demand[self.stage(day).code() as usize]
    }
}

/// Relative importance of the four optimization objectives.
///
/// Weights are normalized when the composite score is computed, so only
/// their ratios matter. All must be finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveWeights {
    pub yield_: f64,
    pub cost: f64,
    pub environment: f64,
    pub risk: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self { yield_: 0.4, cost: 0.2, environment: 0.2, risk: 0.2 }
    }
}

impl ObjectiveWeights {
    /// Returns the weights scaled to sum to 1.
    ///
    /// All-zero weights normalize to the default split.
    pub fn normalized(&self) -> Self {
        let sum = self.yield_ + self.cost + self.environment + self.risk;
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            yield_: self.yield_ / sum,
            cost: self.cost / sum,
            environment: self.environment / sum,
            risk: self.risk / sum,
        }
    }
}

/// One fertilizer timing optimization problem.
///
/// Immutable for the duration of a call. Built with the `with_*` builder
/// methods, then checked with [`validate`](Self::validate) before any
/// search runs.
///
/// # Example
///
/// ```
/// use fertisched::model::{ApplicationMethod, NutrientType, SchedulingProblem};
///
/// let problem = SchedulingProblem::new("field-7", "corn", 120)
///     .with_requirement(NutrientType::Nitrogen, 150.0)
///     .with_requirement(NutrientType::Phosphorus, 50.0)
///     .with_methods(&[ApplicationMethod::Broadcast, ApplicationMethod::SideDress]);
/// assert!(problem.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulingProblem {
    /// Caller's field identifier (opaque to the core).
    pub field_id: String,
    /// Crop type label (opaque to the core).
    pub crop: String,
    /// Planning horizon in days; day 0 is the planting date.
    pub horizon_days: u32,
    /// Required amount per nutrient, in units/acre. BTreeMap so that
    /// iteration order is deterministic for DP state layout and seeding.
    pub nutrient_requirements: BTreeMap<NutrientType, f64>,
    /// Allowed application methods.
    pub application_methods: Vec<ApplicationMethod>,
    /// Earliest day an application may happen.
    pub earliest_day: u32,
    /// Latest day an application may happen (inclusive).
    pub latest_day: u32,
    /// Inclusive day ranges where no application is allowed.
    pub restricted: Vec<(u32, u32)>,
    /// Per-day equipment/labor availability; `None` means always available.
    /// Days past the end of the vector are treated as unavailable.
    pub availability: Option<Vec<bool>>,
    /// Objective weights for the composite score.
    pub weights: ObjectiveWeights,
    /// Weather forecast over the horizon; missing days fall back to a
    /// synthetic forecast with confidence decaying over lead time.
    pub weather: Vec<DailyForecast>,
    /// Crop growth-stage model.
    pub growth: GrowthCurve,
    /// Price per unit of each nutrient; missing entries default to 1.0.
    pub prices: BTreeMap<NutrientType, f64>,
}

impl SchedulingProblem {
    /// Creates a problem with no requirements and permissive defaults:
    /// full-horizon application window, all methods allowed, default
    /// weights, synthetic weather, default growth curve, unit prices.
    pub fn new(field_id: impl Into<String>, crop: impl Into<String>, horizon_days: u32) -> Self {
        Self {
            field_id: field_id.into(),
            crop: crop.into(),
            horizon_days,
            nutrient_requirements: BTreeMap::new(),
            application_methods: ApplicationMethod::ALL.to_vec(),
            earliest_day: 0,
            latest_day: horizon_days.saturating_sub(1),
            restricted: Vec::new(),
            availability: None,
            weights: ObjectiveWeights::default(),
            weather: Vec::new(),
            growth: GrowthCurve::default_for(horizon_days),
            prices: BTreeMap::new(),
        }
    }

    /// Sets the required amount for a nutrient (units/acre).
    pub fn with_requirement(mut self, nutrient: NutrientType, amount: f64) -> Self {
        self.nutrient_requirements.insert(nutrient, amount);
        self
    }

    /// Restricts the allowed application methods.
    pub fn with_methods(mut self, methods: &[ApplicationMethod]) -> Self {
        self.application_methods = methods.to_vec();
        self
    }

    /// Sets the application window (inclusive day offsets).
    pub fn with_window(mut self, earliest: u32, latest: u32) -> Self {
        self.earliest_day = earliest;
        self.latest_day = latest;
        self
    }

    /// Adds a restricted day range (inclusive) where no application may occur.
    pub fn with_restricted(mut self, start: u32, end: u32) -> Self {
        self.restricted.push((start, end));
        self
    }

    /// Supplies the equipment/labor availability calendar.
    pub fn with_availability(mut self, calendar: Vec<bool>) -> Self {
        self.availability = Some(calendar);
        self
    }

    /// Sets the objective weights.
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Supplies the weather forecast.
    pub fn with_weather(mut self, weather: Vec<DailyForecast>) -> Self {
        self.weather = weather;
        self
    }

    /// Supplies the growth-stage model.
    pub fn with_growth(mut self, growth: GrowthCurve) -> Self {
        self.growth = growth;
        self
    }

    /// Sets the price per unit for a nutrient.
    pub fn with_price(mut self, nutrient: NutrientType, price: f64) -> Self {
        self.prices.insert(nutrient, price);
        self
    }

    /// Checks the problem for contradictions.
    ///
    /// A zero-length horizon or all-zero requirements are *not* errors;
    /// they produce an empty schedule with score 0 downstream.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (&nutrient, &amount) in &self.nutrient_requirements {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ValidationError::BadRequirement { nutrient, amount });
            }
        }
        if self.application_methods.is_empty() {
            return Err(ValidationError::NoMethods);
        }
        if self.horizon_days > 0
            && (self.earliest_day > self.latest_day || self.earliest_day >= self.horizon_days)
        {
            return Err(ValidationError::BadWindow {
                earliest: self.earliest_day,
                latest: self.latest_day,
                horizon: self.horizon_days,
            });
        }
        for &(start, end) in &self.restricted {
            if start > end || (self.horizon_days > 0 && start >= self.horizon_days) {
                return Err(ValidationError::BadRestrictedRange { start, end });
            }
        }
        for (name, value) in [
            ("yield", self.weights.yield_),
            ("cost", self.weights.cost),
            ("environment", self.weights.environment),
            ("risk", self.weights.risk),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::BadWeight { name, value });
            }
        }
        Ok(())
    }

    /// Whether the problem asks for anything at all.
    pub fn is_trivial(&self) -> bool {
        self.horizon_days == 0 || self.nutrient_requirements.values().all(|&a| a <= 0.0)
    }

    /// Nutrients with a strictly positive requirement, in canonical order.
    pub fn active_nutrients(&self) -> Vec<NutrientType> {
        self.nutrient_requirements
            .iter()
            .filter(|(_, &a)| a > 0.0)
            .map(|(&n, _)| n)
            .collect()
    }

    /// Sum of all required amounts.
    pub fn total_required(&self) -> f64 {
        self.nutrient_requirements.values().filter(|a| **a > 0.0).sum()
    }

    /// Price per unit for a nutrient (1.0 when no feed entry exists).
    pub fn price(&self, nutrient: NutrientType) -> f64 {
        self.prices.get(&nutrient).copied().unwrap_or(1.0)
    }

    /// Whether an application may happen on the given day.
    ///
    /// Combines the window, restricted ranges, and the availability calendar.
    pub fn is_feasible_day(&self, day: u32) -> bool {
        if day < self.earliest_day || day > self.latest_day || day >= self.horizon_days {
            return false;
        }
        if self.restricted.iter().any(|&(s, e)| day >= s && day <= e) {
            return false;
        }
        match &self.availability {
            Some(cal) => cal.get(day as usize).copied().unwrap_or(false),
            None => true,
        }
    }

    /// All feasible application days, ascending.
    pub fn feasible_days(&self) -> Vec<u32> {
        (0..self.horizon_days).filter(|&d| self.is_feasible_day(d)).collect()
    }

    /// Forecast for a day, synthesizing one when the provider's data does
    /// not cover it. Synthetic confidence decays linearly with lead time.
    pub fn forecast(&self, day: u32) -> DailyForecast {
        if let Some(f) = self.weather.iter().find(|f| f.day == day) {
            return *f;
        }
        let horizon = self.horizon_days.max(1) as f64;
        DailyForecast {
            day,
            temp_c: 20.0,
            precip_mm: 2.0,
            confidence: (1.0 - day as f64 / horizon).clamp(0.25, 1.0),
        }
    }

    /// Human-readable descriptions of why no feasible schedule exists.
    ///
    /// Empty when at least one feasible day is available (or the problem
    /// is trivial).
    pub fn infeasibility_diagnostics(&self) -> Vec<String> {
        if self.is_trivial() || !self.feasible_days().is_empty() {
            return Vec::new();
        }
        let mut reasons = vec![format!(
            "no feasible application day in window [{}, {}] over a {}-day horizon",
            self.earliest_day, self.latest_day, self.horizon_days
        )];
        if !self.restricted.is_empty() {
            reasons.push(format!(
                "restricted ranges {:?} cover the remaining window",
                self.restricted
            ));
        }
        if let Some(cal) = &self.availability {
            let free = cal.iter().filter(|&&b| b).count();
            reasons.push(format!(
                "equipment/labor calendar leaves {free} of {} days available",
                cal.len()
            ));
        }
        reasons
    }
}
