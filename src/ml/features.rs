//! Feature encoding for the yield-response regressor.
//!
//! Both historical records (training) and candidate placements
//! (prediction) map to the same fixed-width vector so the model can score
//! hypothetical applications it has never seen.

use crate::model::{ApplicationMethod, HistoricalRecord, NutrientType, SchedulingProblem};

/// Fixed feature width: six scalar features plus one-hot nutrient (3)
/// and one-hot method (4).
pub const FEATURE_DIM: usize = 13;

/// Days in a nominal season, used to normalize absolute day offsets.
const SEASON_DAYS: f64 = 365.0;

/// Normalization statistics fitted on the historical set.
///
/// Candidate placements have no observed soil moisture, so predictions
/// substitute the historical mean.
#[derive(Debug, Clone)]
pub struct FeatureScaler {
    temp_mean: f64,
    temp_std: f64,
    precip_mean: f64,
    precip_std: f64,
    moisture_mean: f64,
}

impl FeatureScaler {
    /// Fits the scaler on training records.
    ///
    /// # Panics
    /// Panics if `records` is empty; callers gate on the minimum record
    /// count before getting here.
    pub fn fit(records: &[HistoricalRecord]) -> Self {
        assert!(!records.is_empty(), "cannot fit a scaler on zero records");
        let n = records.len() as f64;

        let temp_mean = records.iter().map(|r| r.temp_c).sum::<f64>() / n;
        let precip_mean = records.iter().map(|r| r.precip_mm).sum::<f64>() / n;
        let moisture_mean = records.iter().map(|r| r.soil_moisture).sum::<f64>() / n;

        let temp_std = (records.iter().map(|r| (r.temp_c - temp_mean).powi(2)).sum::<f64>() / n)
            .sqrt()
            .max(1e-6);
        let precip_std = (records.iter().map(|r| (r.precip_mm - precip_mean).powi(2)).sum::<f64>()
            / n)
            .sqrt()
            .max(1e-6);

        Self { temp_mean, temp_std, precip_mean, precip_std, moisture_mean }
    }

    fn encode(
        &self,
        day: u32,
        horizon_days: u32,
        temp_c: f64,
        precip_mm: f64,
        stage_code: u8,
        moisture: f64,
        nutrient: NutrientType,
        method: ApplicationMethod,
    ) -> [f64; FEATURE_DIM] {
        let mut x = [0.0; FEATURE_DIM];
        x[0] = day as f64 / SEASON_DAYS;
        x[1] = day as f64 / horizon_days.max(1) as f64;
        x[2] = (temp_c - self.temp_mean) / self.temp_std;
        x[3] = (precip_mm - self.precip_mean) / self.precip_std;
        x[4] = stage_code as f64 / 3.0;
        x[5] = moisture;
        x[6 + nutrient.index()] = 1.0;
        x[9 + method.index()] = 1.0;
        x
    }

    /// Encodes a training record. `horizon_days` should match the season
    /// the records came from (the problem's horizon is a reasonable proxy).
    pub fn record_features(&self, record: &HistoricalRecord, horizon_days: u32) -> [f64; FEATURE_DIM] {
        self.encode(
            record.day,
            horizon_days,
            record.temp_c,
            record.precip_mm,
            record.growth_stage,
            record.soil_moisture,
            record.nutrient,
            record.method,
        )
    }

    /// Encodes a hypothetical placement against the problem's forecast and
    /// growth model.
    pub fn candidate_features(
        &self,
        problem: &SchedulingProblem,
        day: u32,
        nutrient: NutrientType,
        method: ApplicationMethod,
    ) -> [f64; FEATURE_DIM] {
        let forecast = problem.forecast(day);
        self.encode(
            day,
            problem.horizon_days,
            forecast.temp_c,
            forecast.precip_mm,
            problem.growth.stage(day).code(),
            self.moisture_mean,
            nutrient,
            method,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<HistoricalRecord> {
        (0..12)
            .map(|i| {
                let mut r = HistoricalRecord::synthetic(
                    10 + i * 9,
                    NutrientType::Nitrogen,
                    50.0,
                    0.8,
                );
                r.temp_c = 15.0 + i as f64;
                r.precip_mm = i as f64;
                r
            })
            .collect()
    }

    #[test]
    fn test_feature_width() {
        let scaler = FeatureScaler::fit(&records());
        let x = scaler.record_features(&records()[0], 120);
        assert_eq!(x.len(), FEATURE_DIM);
    }

    #[test]
    fn test_one_hot_slots() {
        let scaler = FeatureScaler::fit(&records());
        let mut r = records()[0].clone();
        r.nutrient = NutrientType::Phosphorus;
        r.method = ApplicationMethod::SideDress;
        let x = scaler.record_features(&r, 120);
        assert_eq!(x[6 + NutrientType::Phosphorus.index()], 1.0);
        assert_eq!(x[6 + NutrientType::Nitrogen.index()], 0.0);
        assert_eq!(x[9 + ApplicationMethod::SideDress.index()], 1.0);
        assert_eq!(x[9 + ApplicationMethod::Broadcast.index()], 0.0);
    }

    #[test]
    fn test_weather_z_scored() {
        let rs = records();
        let scaler = FeatureScaler::fit(&rs);
        let xs: Vec<[f64; FEATURE_DIM]> =
            rs.iter().map(|r| scaler.record_features(r, 120)).collect();
        let mean_temp_z: f64 = xs.iter().map(|x| x[2]).sum::<f64>() / xs.len() as f64;
        assert!(mean_temp_z.abs() < 1e-9, "z-scored temperature should center at 0");
    }

    #[test]
    fn test_candidate_uses_forecast_and_mean_moisture() {
        let rs = records();
        let scaler = FeatureScaler::fit(&rs);
        let problem = SchedulingProblem::new("f", "corn", 120)
            .with_requirement(NutrientType::Nitrogen, 100.0);
        let x = scaler.candidate_features(
            &problem,
            60,
            NutrientType::Nitrogen,
            ApplicationMethod::Broadcast,
        );
        let mean_moisture = rs.iter().map(|r| r.soil_moisture).sum::<f64>() / rs.len() as f64;
        assert!((x[5] - mean_moisture).abs() < 1e-12);
        assert!((x[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "zero records")]
    fn test_fit_empty_panics() {
        FeatureScaler::fit(&[]);
    }
}
