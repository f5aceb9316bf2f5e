use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Activity {
    pub activity_id: Uuid,
    pub user_id: Uuid,
    pub activity_type: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_minutes: i32,
    pub calories_burned: f64,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Replacement values for an existing activity. Absent distance and notes keep
/// the stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPatch {
    pub activity_type: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}

impl Activity {
    pub fn new(
        user_id: Uuid,
        activity_type: impl Into<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Self {
        let now = Utc::now();
        Activity {
            activity_id: Uuid::new_v4(),
            user_id,
            activity_type: activity_type.into(),
            start_time,
            end_time,
            duration_minutes: duration_minutes(start_time, end_time),
            calories_burned: 0.0,
            distance_km: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the patch and re-derives the duration. Calories are left to the caller.
    pub fn apply_patch(&mut self, patch: ActivityPatch) {
        self.activity_type = patch.activity_type;
        self.start_time = patch.start_time;
        self.end_time = patch.end_time;
        self.duration_minutes = duration_minutes(patch.start_time, patch.end_time);
        if let Some(distance) = patch.distance_km {
            self.distance_km = Some(distance);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
    }

    /// Calendar day the activity is booked against.
    pub fn activity_date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Average speed in km/h, 0 when distance or duration is missing.
    pub fn average_pace(&self) -> f64 {
        match self.distance_km {
            Some(distance) if distance != 0.0 && self.duration_minutes != 0 => {
                distance / (f64::from(self.duration_minutes) / 60.0)
            }
            _ => 0.0,
        }
    }
}

/// Whole minutes from `start` to `end`, 0 when the interval is inverted.
pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> i32 {
    if end < start {
        return 0;
    }
    i32::try_from((end - start).num_minutes()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn duration_truncates_partial_minutes() {
        assert_eq!(duration_minutes(at(8, 0, 0), at(8, 30, 59)), 30);
    }

    #[test]
    fn inverted_interval_has_zero_duration() {
        assert_eq!(duration_minutes(at(9, 0, 0), at(8, 0, 0)), 0);
    }

    #[test]
    fn duration_matches_whole_minutes_for_random_intervals() {
        let mut rng = rand::thread_rng();
        let base = at(0, 0, 0);
        for _ in 0..500 {
            let a = base + chrono::Duration::seconds(rng.gen_range(0..200_000));
            let b = base + chrono::Duration::seconds(rng.gen_range(0..200_000));
            let expected = ((b - a).num_seconds() / 60).max(0);
            assert_eq!(i64::from(duration_minutes(a, b)), expected);
        }
    }

    #[test]
    fn patch_keeps_distance_and_notes_when_absent() {
        let mut activity = Activity::new(Uuid::new_v4(), "RUNNING", at(8, 0, 0), at(8, 30, 0));
        activity.distance_km = Some(5.0);
        activity.notes = Some("easy".to_string());
        activity.apply_patch(ActivityPatch {
            activity_type: "WALKING".to_string(),
            start_time: at(9, 0, 0),
            end_time: at(10, 0, 0),
            distance_km: None,
            notes: None,
        });
        assert_eq!(activity.activity_type, "WALKING");
        assert_eq!(activity.duration_minutes, 60);
        assert_eq!(activity.distance_km, Some(5.0));
        assert_eq!(activity.notes.as_deref(), Some("easy"));
    }

    #[test]
    fn average_pace_in_km_per_hour() {
        let mut activity = Activity::new(Uuid::new_v4(), "RUNNING", at(8, 0, 0), at(8, 30, 0));
        assert_eq!(activity.average_pace(), 0.0);
        activity.distance_km = Some(5.0);
        assert!((activity.average_pace() - 10.0).abs() < 1e-9);
    }
}
