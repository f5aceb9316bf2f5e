use lazy_static::lazy_static;
use moka::sync::Cache;
use std::collections::HashMap;

pub const DEFAULT_MET: f64 = 3.5;

/// MET values by activity label. Partial matches are resolved in this order.
pub const MET_TABLE: &[(&str, f64)] = &[
    ("WALKING", 3.5),
    ("WALKING_SLOW", 2.5),
    ("WALKING_FAST", 5.0),
    ("JOGGING", 7.0),
    ("RUNNING", 9.8),
    ("RUNNING_FAST", 11.5),
    ("CYCLING_MODERATE", 6.8),
    ("CYCLING_LIGHT", 4.0),
    ("CYCLING_FAST", 10.0),
    ("SWIMMING", 6.0),
    ("SWIMMING_VIGOROUS", 10.0),
    ("YOGA", 3.0),
    ("JUMPING_ROPE", 12.0),
    ("BASKETBALL", 8.0),
    ("TENNIS", 7.0),
    ("SOCCER", 7.0),
    ("DEFAULT", DEFAULT_MET),
];

lazy_static! {
    static ref MET_INDEX: HashMap<&'static str, f64> = MET_TABLE.iter().copied().collect();
}

pub trait CalorieCalculator: Send + Sync {
    /// kcal burned for `duration_minutes` of the activity at the given body mass.
    fn calories_burned(&self, activity_type: &str, duration_minutes: f64, weight_kg: f64) -> f64;

    fn met_value(&self, activity_type: &str) -> f64;
}

/// MET-table calculator: kcal = MET x kg x hours.
pub struct StandardCalorieCalculator {
    resolved: Cache<String, f64>,
}

impl StandardCalorieCalculator {
    pub fn new() -> Self {
        StandardCalorieCalculator {
            resolved: Cache::new(1_024),
        }
    }
}

impl Default for StandardCalorieCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_met(normalized: &str) -> f64 {
    if normalized.is_empty() {
        return DEFAULT_MET;
    }
    if let Some(met) = MET_INDEX.get(normalized) {
        return *met;
    }
    MET_TABLE
        .iter()
        .find(|(key, _)| normalized.contains(key) || key.contains(normalized))
        .map(|(_, met)| *met)
        .unwrap_or(DEFAULT_MET)
}

impl CalorieCalculator for StandardCalorieCalculator {
    fn calories_burned(&self, activity_type: &str, duration_minutes: f64, weight_kg: f64) -> f64 {
        if duration_minutes <= 0.0 || weight_kg <= 0.0 {
            return 0.0;
        }
        self.met_value(activity_type) * weight_kg * (duration_minutes / 60.0)
    }

    fn met_value(&self, activity_type: &str) -> f64 {
        let normalized = activity_type.trim().to_uppercase();
        if let Some(met) = self.resolved.get(&normalized) {
            return met;
        }
        let met = resolve_met(&normalized);
        self.resolved.insert(normalized, met);
        met
    }
}
