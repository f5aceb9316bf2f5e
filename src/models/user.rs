use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
            Sex::Other => "OTHER",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Sex::Male),
            "FEMALE" => Ok(Sex::Female),
            "OTHER" => Ok(Sex::Other),
            other => Err(format!("Unknown sex '{}'", other)),
        }
    }
}

/// Self-reported activity level; each label carries a fixed TDEE multiplier.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    pub const DEFAULT_MULTIPLIER: f64 = 1.2;

    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "SEDENTARY",
            ActivityLevel::LightlyActive => "LIGHTLY_ACTIVE",
            ActivityLevel::ModeratelyActive => "MODERATELY_ACTIVE",
            ActivityLevel::VeryActive => "VERY_ACTIVE",
            ActivityLevel::ExtraActive => "EXTRA_ACTIVE",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEDENTARY" => Ok(ActivityLevel::Sedentary),
            "LIGHTLY_ACTIVE" => Ok(ActivityLevel::LightlyActive),
            "MODERATELY_ACTIVE" => Ok(ActivityLevel::ModeratelyActive),
            "VERY_ACTIVE" => Ok(ActivityLevel::VeryActive),
            "EXTRA_ACTIVE" => Ok(ActivityLevel::ExtraActive),
            other => Err(format!("Unknown activity level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Sex,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields as supplied by a client, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: Option<ActivityLevel>,
}

impl User {
    pub fn new(profile: NewUser) -> Self {
        let now = Utc::now();
        let mut user = User {
            user_id: Uuid::new_v4(),
            name: String::new(),
            email: String::new(),
            date_of_birth: None,
            sex: profile.sex,
            height_cm: None,
            weight_kg: None,
            activity_level: None,
            created_at: now,
            updated_at: now,
        };
        user.apply_profile(profile);
        user
    }

    /// Replaces every profile field; identity and timestamps are kept.
    pub fn apply_profile(&mut self, profile: NewUser) {
        self.name = profile.name;
        self.email = profile.email;
        self.date_of_birth = Some(profile.date_of_birth);
        self.sex = profile.sex;
        self.height_cm = Some(profile.height_cm);
        self.weight_kg = Some(profile.weight_kg);
        self.activity_level = profile.activity_level;
    }

    /// Age as calendar-year difference; the birthday itself is not considered.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| today.year() - dob.year())
    }

    /// Body mass index, or 0 when height or weight is missing.
    pub fn bmi(&self) -> f64 {
        match (self.height_cm, self.weight_kg) {
            (Some(height), Some(weight)) if height != 0.0 => {
                let meters = height / 100.0;
                weight / (meters * meters)
            }
            _ => 0.0,
        }
    }
}
