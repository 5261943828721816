//! Domain DTOs for the Wahoo API.
//!
//! # Design
//! Every field the API may omit or send as `null` is an `Option`, so an update
//! built from a partially filled value never overwrites server state with a
//! zero. `User` and `WorkoutSummary` carry the known wire-type quirks and are
//! decoded through their coercion tables (see `decode`); the remaining
//! entities are well typed and use plain serde derives.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::decode::{self, Coercion, FieldSpec, TolerantDecode};
use crate::form::{FormEncode, FormScope};
use crate::workout_type::WorkoutType;

/// OAuth token pair returned by `/oauth/token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: String,
    pub created_at: i64,
}

/// The authenticated user's profile.
///
/// `height` and `weight` arrive as JSON strings; `birth` is a date-only string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub first: Option<String>,
    pub last: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub birth: Option<NaiveDate>,
    pub gender: Option<i64>,
    pub heart_rate_zone: Option<HeartRateZone>,
    pub power_zone: Option<PowerZone>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TolerantDecode for User {
    const ENTITY: &'static str = "user";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec { name: "id", coercion: Coercion::Id(|u| &mut u.id) },
        FieldSpec { name: "height", coercion: Coercion::NumericString(|u| &mut u.height) },
        FieldSpec { name: "weight", coercion: Coercion::NumericString(|u| &mut u.weight) },
        FieldSpec { name: "first", coercion: Coercion::Text(|u| &mut u.first) },
        FieldSpec { name: "last", coercion: Coercion::Text(|u| &mut u.last) },
        FieldSpec { name: "email", coercion: Coercion::Text(|u| &mut u.email) },
        FieldSpec { name: "mobile", coercion: Coercion::Text(|u| &mut u.mobile) },
        FieldSpec { name: "birth", coercion: Coercion::Date(|u| &mut u.birth) },
        FieldSpec { name: "gender", coercion: Coercion::Integer(|u| &mut u.gender) },
        FieldSpec {
            name: "heart_rate_zone",
            coercion: Coercion::Object(|u, value| {
                u.heart_rate_zone = Some(serde_json::from_value(value)?);
                Ok(())
            }),
        },
        FieldSpec {
            name: "power_zone",
            coercion: Coercion::Object(|u, value| {
                u.power_zone = Some(serde_json::from_value(value)?);
                Ok(())
            }),
        },
        FieldSpec { name: "created_at", coercion: Coercion::DateTime(|u| &mut u.created_at) },
        FieldSpec { name: "updated_at", coercion: Coercion::DateTime(|u| &mut u.updated_at) },
    ];
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decode::deserialize_tolerant(deserializer)
    }
}

impl FormEncode for User {
    const ENTITY: &'static str = "user";

    fn write_fields(&self, form: &mut FormScope<'_>) {
        form.text("email", self.email.as_deref());
        form.text("first", self.first.as_deref());
        form.text("last", self.last.as_deref());
        form.text("mobile", self.mobile.as_deref());
        form.float("height", self.height);
        form.float("weight", self.weight);
        form.date("birth", self.birth);
        form.integer("gender", self.gender);
    }
}

/// Heart-rate zone boundaries in beats per minute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateZone {
    pub id: i64,
    pub zone_1: Option<i64>,
    pub zone_2: Option<i64>,
    pub zone_3: Option<i64>,
    pub zone_4: Option<i64>,
    pub zone_5: Option<i64>,
    pub resting: Option<i64>,
    pub maximum: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FormEncode for HeartRateZone {
    const ENTITY: &'static str = "heart_rate_zone";

    fn write_fields(&self, form: &mut FormScope<'_>) {
        form.integer("zone_1", self.zone_1);
        form.integer("zone_2", self.zone_2);
        form.integer("zone_3", self.zone_3);
        form.integer("zone_4", self.zone_4);
        form.integer("zone_5", self.zone_5);
        form.integer("resting", self.resting);
        form.integer("maximum", self.maximum);
    }
}

/// Power zone boundaries in watts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerZone {
    pub id: i64,
    pub zone_1: Option<i64>,
    pub zone_2: Option<i64>,
    pub zone_3: Option<i64>,
    pub zone_4: Option<i64>,
    pub zone_5: Option<i64>,
    pub zone_6: Option<i64>,
    pub zone_7: Option<i64>,
    pub ftp: Option<i64>,
    pub zone_count: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl FormEncode for PowerZone {
    const ENTITY: &'static str = "power_zone";

    fn write_fields(&self, form: &mut FormScope<'_>) {
        form.integer("zone_1", self.zone_1);
        form.integer("zone_2", self.zone_2);
        form.integer("zone_3", self.zone_3);
        form.integer("zone_4", self.zone_4);
        form.integer("zone_5", self.zone_5);
        form.integer("zone_6", self.zone_6);
        form.integer("zone_7", self.zone_7);
        form.integer("ftp", self.ftp);
        form.integer("zone_count", self.zone_count);
    }
}

/// A recorded workout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub starts: Option<DateTime<Utc>>,
    pub minutes: Option<i64>,
    pub name: Option<String>,
    pub plan_id: Option<String>,
    pub workout_token: Option<String>,
    pub workout_type_id: Option<i64>,
    #[serde(default, deserialize_with = "decode::lenient")]
    pub workout_summary: Option<WorkoutSummary>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Workout {
    /// Resolve `workout_type_id`. `None` when unset or not a known code.
    pub fn workout_type(&self) -> Option<WorkoutType> {
        self.workout_type_id
            .and_then(|code| WorkoutType::try_from(code).ok())
    }
}

impl FormEncode for Workout {
    const ENTITY: &'static str = "workout";

    fn write_fields(&self, form: &mut FormScope<'_>) {
        form.datetime("starts", self.starts);
        form.integer("minutes", self.minutes);
        form.text("name", self.name.as_deref());
        form.text("plan_id", self.plan_id.as_deref());
        form.text("workout_token", self.workout_token.as_deref());
        form.integer("workout_type_id", self.workout_type_id);
        if let Some(summary) = &self.workout_summary {
            summary.write_fields(&mut form.nested("workout_summary"));
        }
    }
}

/// Location of the recorded FIT file. A missing `url` decodes as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    #[serde(default)]
    pub url: String,
}

/// Aggregated metrics of a workout. All metrics arrive as JSON strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub id: i64,
    pub heart_rate_avg: Option<f64>,
    pub calories_accum: Option<f64>,
    pub power_avg: Option<f64>,
    pub distance_accum: Option<f64>,
    pub cadence_avg: Option<f64>,
    pub ascent_accum: Option<f64>,
    pub duration_active_accum: Option<f64>,
    pub duration_paused_accum: Option<f64>,
    pub duration_total_accum: Option<f64>,
    pub power_bike_np_last: Option<f64>,
    pub power_bike_tss_last: Option<f64>,
    pub speed_avg: Option<f64>,
    pub work_accum: Option<f64>,
    pub file: Option<File>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TolerantDecode for WorkoutSummary {
    const ENTITY: &'static str = "workout_summary";
    const FIELDS: &'static [FieldSpec<Self>] = &[
        FieldSpec { name: "id", coercion: Coercion::Id(|s| &mut s.id) },
        FieldSpec { name: "heart_rate_avg", coercion: Coercion::NumericString(|s| &mut s.heart_rate_avg) },
        FieldSpec { name: "calories_accum", coercion: Coercion::NumericString(|s| &mut s.calories_accum) },
        FieldSpec { name: "power_avg", coercion: Coercion::NumericString(|s| &mut s.power_avg) },
        FieldSpec { name: "distance_accum", coercion: Coercion::NumericString(|s| &mut s.distance_accum) },
        FieldSpec { name: "cadence_avg", coercion: Coercion::NumericString(|s| &mut s.cadence_avg) },
        FieldSpec { name: "ascent_accum", coercion: Coercion::NumericString(|s| &mut s.ascent_accum) },
        FieldSpec {
            name: "duration_active_accum",
            coercion: Coercion::NumericString(|s| &mut s.duration_active_accum),
        },
        FieldSpec {
            name: "duration_paused_accum",
            coercion: Coercion::NumericString(|s| &mut s.duration_paused_accum),
        },
        FieldSpec {
            name: "duration_total_accum",
            coercion: Coercion::NumericString(|s| &mut s.duration_total_accum),
        },
        FieldSpec {
            name: "power_bike_np_last",
            coercion: Coercion::NumericString(|s| &mut s.power_bike_np_last),
        },
        FieldSpec {
            name: "power_bike_tss_last",
            coercion: Coercion::NumericString(|s| &mut s.power_bike_tss_last),
        },
        FieldSpec { name: "speed_avg", coercion: Coercion::NumericString(|s| &mut s.speed_avg) },
        FieldSpec { name: "work_accum", coercion: Coercion::NumericString(|s| &mut s.work_accum) },
        FieldSpec {
            name: "file",
            coercion: Coercion::Object(|s, value| {
                s.file = Some(serde_json::from_value(value)?);
                Ok(())
            }),
        },
        FieldSpec { name: "created_at", coercion: Coercion::DateTime(|s| &mut s.created_at) },
        FieldSpec { name: "updated_at", coercion: Coercion::DateTime(|s| &mut s.updated_at) },
    ];
}

impl<'de> Deserialize<'de> for WorkoutSummary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decode::deserialize_tolerant(deserializer)
    }
}

impl WorkoutSummary {
    /// Writes under whatever scope the caller provides; only used nested in a
    /// workout update.
    fn write_fields(&self, form: &mut FormScope<'_>) {
        form.float("heart_rate_avg", self.heart_rate_avg);
        form.float("calories_accum", self.calories_accum);
        form.float("power_avg", self.power_avg);
        form.float("distance_accum", self.distance_accum);
        form.float("cadence_avg", self.cadence_avg);
        form.float("ascent_accum", self.ascent_accum);
        form.float("duration_active_accum", self.duration_active_accum);
        form.float("duration_paused_accum", self.duration_paused_accum);
        form.float("duration_total_accum", self.duration_total_accum);
        form.float("power_bike_np_last", self.power_bike_np_last);
        form.float("power_bike_tss_last", self.power_bike_tss_last);
        form.float("speed_avg", self.speed_avg);
        form.float("work_accum", self.work_accum);
        if let Some(file) = &self.file {
            let url = Some(file.url.as_str()).filter(|url| !url.is_empty());
            form.nested("file").text("url", url);
        }
    }
}

/// Paged envelope returned by `GET /v1/workouts`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkoutsPage {
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub per_page: i64,
    pub order: Option<String>,
    pub sort: Option<String>,
}
