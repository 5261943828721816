//! In-memory stand-in for the Wahoo cloud API.
//!
//! Serves the OAuth token endpoint and the user, workout, workout summary and
//! zone resources. Records are kept as raw JSON objects so the wire quirks of
//! the real service survive: metrics as numeric strings, explicit nulls, and
//! multipart form updates that only touch the fields they carry.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// The one authorization code the token endpoint accepts.
pub const AUTHORIZATION_CODE: &str = "mock-authorization-code";

/// Access token that is valid from startup, for tests that skip OAuth.
pub const SEEDED_ACCESS_TOKEN: &str = "mock-access-token";

pub const DEFAULT_PER_PAGE: usize = 30;

const TOKEN_LIFETIME_SECS: i64 = 7200;

pub type Record = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Store {
    pub access_tokens: HashSet<String>,
    pub refresh_tokens: HashSet<String>,
    pub user: Record,
    pub heart_rate_zone: Record,
    pub power_zone: Record,
    pub workouts: BTreeMap<i64, Record>,
}

pub type Db = Arc<RwLock<Store>>;

impl Store {
    /// One user with both zone sets and three workouts, the newest without a
    /// summary.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.access_tokens.insert(SEEDED_ACCESS_TOKEN.to_string());

        store.user = object(json!({
            "id": 1,
            "height": "1.8288",
            "weight": "79.4",
            "first": "Ada",
            "last": "Lovelace",
            "email": "ada@example.com",
            "mobile": null,
            "birth": "1985-04-12",
            "gender": 1,
            "created_at": "2023-01-05T10:00:00.000Z",
            "updated_at": "2024-02-11T08:30:00.000Z"
        }));
        store.heart_rate_zone = object(json!({
            "id": 11,
            "zone_1": 110, "zone_2": 130, "zone_3": 150, "zone_4": 165, "zone_5": 180,
            "resting": 52,
            "maximum": 190,
            "created_at": "2023-01-05T10:00:00.000Z",
            "updated_at": "2023-01-05T10:00:00.000Z"
        }));
        store.power_zone = object(json!({
            "id": 12,
            "zone_1": 140, "zone_2": 190, "zone_3": 225, "zone_4": 260,
            "zone_5": 300, "zone_6": 375, "zone_7": 450,
            "ftp": 250,
            "zone_count": 7,
            "created_at": "2023-01-05T10:00:00.000Z",
            "updated_at": "2023-01-05T10:00:00.000Z"
        }));

        store.workouts.insert(
            1,
            object(json!({
                "id": 1,
                "starts": "2024-05-01T07:00:00.000Z",
                "minutes": 45,
                "name": "Morning ride",
                "plan_id": null,
                "workout_token": "wt-0001",
                "workout_type_id": 0,
                "workout_summary": {
                    "id": 101,
                    "heart_rate_avg": "141.0",
                    "calories_accum": "612.0",
                    "power_avg": "188.5",
                    "distance_accum": "24140.2",
                    "cadence_avg": "87.0",
                    "ascent_accum": "312.0",
                    "duration_active_accum": "2640.0",
                    "duration_paused_accum": "60.0",
                    "duration_total_accum": "2700.0",
                    "power_bike_np_last": "201.0",
                    "power_bike_tss_last": "58.2",
                    "speed_avg": "9.14",
                    "work_accum": "497640.0",
                    "file": { "url": "https://cdn.example.com/fit/0001.fit" },
                    "created_at": "2024-05-01T07:50:00.000Z",
                    "updated_at": "2024-05-01T07:50:00.000Z"
                },
                "created_at": "2024-05-01T07:50:00.000Z",
                "updated_at": "2024-05-01T07:50:00.000Z"
            })),
        );
        store.workouts.insert(
            2,
            object(json!({
                "id": 2,
                "starts": "2024-05-03T18:15:00.000Z",
                "minutes": 30,
                "name": "Treadmill",
                "plan_id": "plan-7",
                "workout_token": "wt-0002",
                "workout_type_id": 5,
                "workout_summary": {
                    "id": 102,
                    "heart_rate_avg": "152.3",
                    "calories_accum": "410.0",
                    "power_avg": null,
                    "distance_accum": "6000.0",
                    "cadence_avg": null,
                    "ascent_accum": "0.0",
                    "duration_active_accum": "1800.0",
                    "duration_paused_accum": "0.0",
                    "duration_total_accum": "1800.0",
                    "power_bike_np_last": null,
                    "power_bike_tss_last": null,
                    "speed_avg": "3.33",
                    "work_accum": null,
                    "file": null,
                    "created_at": "2024-05-03T18:50:00.000Z",
                    "updated_at": "2024-05-03T18:50:00.000Z"
                },
                "created_at": "2024-05-03T18:50:00.000Z",
                "updated_at": "2024-05-03T18:50:00.000Z"
            })),
        );
        store.workouts.insert(
            3,
            object(json!({
                "id": 3,
                "starts": "2024-05-04T06:30:00.000Z",
                "minutes": 20,
                "name": null,
                "plan_id": null,
                "workout_token": "wt-0003",
                "workout_type_id": 61,
                "workout_summary": null,
                "created_at": "2024-05-04T06:55:00.000Z",
                "updated_at": "2024-05-04T06:55:00.000Z"
            })),
        );

        store
    }

    fn issue_token(&mut self) -> Value {
        let access_token = Uuid::new_v4().simple().to_string();
        let refresh_token = Uuid::new_v4().simple().to_string();
        self.access_tokens.insert(access_token.clone());
        self.refresh_tokens.insert(refresh_token.clone());
        json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": TOKEN_LIFETIME_SECS,
            "refresh_token": refresh_token,
            "scope": "user_read user_write workouts_read workouts_write power_zones_read power_zones_write",
            "created_at": Utc::now().timestamp()
        })
    }
}

pub fn app() -> Router {
    router(Arc::new(RwLock::new(Store::seeded())))
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/oauth/token", post(token))
        .route("/v1/user", get(get_user).put(update_user))
        .route("/v1/workouts", get(list_workouts))
        .route(
            "/v1/workouts/{id}",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
        .route("/v1/workouts/{id}/workout_summary", get(get_workout_summary))
        .route(
            "/v1/heart_rate_zone",
            get(get_heart_rate_zone).put(update_heart_rate_zone),
        )
        .route("/v1/power_zone", get(get_power_zone).put(update_power_zone))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TokenParams {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub refresh_token: Option<String>,
}

async fn token(
    State(db): State<Db>,
    Query(params): Query<TokenParams>,
) -> Result<Json<Value>, StatusCode> {
    if params.client_id.as_deref().unwrap_or_default().is_empty()
        || params.client_secret.as_deref().unwrap_or_default().is_empty()
    {
        tracing::warn!("token request without client credentials");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let mut store = db.write().await;
    match params.grant_type.as_deref() {
        Some("authorization_code") => {
            if params.code.as_deref() != Some(AUTHORIZATION_CODE) {
                tracing::warn!("unknown authorization code");
                return Err(StatusCode::UNAUTHORIZED);
            }
        }
        Some("refresh_token") => {
            let refresh_token = params.refresh_token.unwrap_or_default();
            if !store.refresh_tokens.remove(&refresh_token) {
                tracing::warn!("unknown refresh token");
                return Err(StatusCode::UNAUTHORIZED);
            }
        }
        _ => return Err(StatusCode::BAD_REQUEST),
    }

    tracing::info!(grant_type = params.grant_type.as_deref(), "issued token");
    Ok(Json(store.issue_token()))
}

fn authorize(headers: &HeaderMap, store: &Store) -> Result<(), StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if store.access_tokens.contains(token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

// ---------------------------------------------------------------------------
// User and zones
// ---------------------------------------------------------------------------

async fn get_user(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let mut user = store.user.clone();
    user.insert(
        "heart_rate_zone".to_string(),
        Value::Object(store.heart_rate_zone.clone()),
    );
    user.insert("power_zone".to_string(), Value::Object(store.power_zone.clone()));
    Ok(Json(Value::Object(user)))
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    update_singleton(db, headers, multipart, "user", |store| &mut store.user).await
}

async fn get_heart_rate_zone(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(Json(Value::Object(store.heart_rate_zone.clone())))
}

async fn update_heart_rate_zone(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    update_singleton(db, headers, multipart, "heart_rate_zone", |store| {
        &mut store.heart_rate_zone
    })
    .await
}

async fn get_power_zone(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(Json(Value::Object(store.power_zone.clone())))
}

async fn update_power_zone(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    update_singleton(db, headers, multipart, "power_zone", |store| &mut store.power_zone).await
}

async fn update_singleton(
    db: Db,
    headers: HeaderMap,
    multipart: Multipart,
    entity: &'static str,
    select: fn(&mut Store) -> &mut Record,
) -> Result<Json<Value>, StatusCode> {
    let fields = read_form(multipart).await?;
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let record = select(&mut *store);
    apply_form(record, entity, &fields)?;
    touch(record);
    tracing::info!(entity, fields = fields.len(), "applied form update");
    Ok(Json(Value::Object(record.clone())))
}

// ---------------------------------------------------------------------------
// Workouts
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// Newest first, wrapped in the paging envelope.
async fn list_workouts(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    authorize(&headers, &store)?;

    let page = params.page.filter(|page| *page > 0).unwrap_or(1);
    let per_page = params
        .per_page
        .filter(|per_page| *per_page > 0)
        .unwrap_or(DEFAULT_PER_PAGE);
    let workouts: Vec<Value> = store
        .workouts
        .values()
        .rev()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .map(Value::Object)
        .collect();

    Ok(Json(json!({
        "workouts": workouts,
        "total": store.workouts.len(),
        "page": page,
        "per_page": per_page,
        "order": "descending",
        "sort": "starts"
    })))
}

async fn get_workout(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    store
        .workouts
        .get(&id)
        .cloned()
        .map(|workout| Json(Value::Object(workout)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_workout(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    let fields = read_form(multipart).await?;
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let workout = store.workouts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    apply_form(workout, "workout", &fields)?;
    touch(workout);
    tracing::info!(id, fields = fields.len(), "applied workout update");
    Ok(Json(Value::Object(workout.clone())))
}

async fn delete_workout(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    store
        .workouts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_workout_summary(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let workout = store.workouts.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    match workout.get("workout_summary") {
        Some(summary @ Value::Object(_)) => Ok(Json(summary.clone())),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

// ---------------------------------------------------------------------------
// Form handling
// ---------------------------------------------------------------------------

async fn read_form(mut multipart: Multipart) -> Result<Vec<(String, String)>, StatusCode> {
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field
            .name()
            .map(str::to_string)
            .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
        let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        fields.push((name, value));
    }
    Ok(fields)
}

/// Apply `entity[a][b]=value` pairs to `record`. Any key outside `entity`
/// rejects the whole form before anything is written.
pub fn apply_form(
    record: &mut Record,
    entity: &str,
    fields: &[(String, String)],
) -> Result<(), StatusCode> {
    let mut paths = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let path = field_path(name).ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
        match path.split_first() {
            Some((root, keys)) if *root == entity && !keys.is_empty() => {
                paths.push((keys.to_vec(), value.as_str()))
            }
            _ => return Err(StatusCode::UNPROCESSABLE_ENTITY),
        }
    }
    for (keys, value) in paths {
        set_path(record, &keys, value);
    }
    Ok(())
}

/// `workout[workout_summary][file][url]` -> `["workout", "workout_summary", "file", "url"]`
pub fn field_path(name: &str) -> Option<Vec<&str>> {
    let (root, rest) = name.split_once('[')?;
    let inner = rest.strip_suffix(']')?;
    let mut path = vec![root];
    path.extend(inner.split("]["));
    if path.iter().any(|segment| segment.is_empty() || segment.contains(['[', ']'])) {
        return None;
    }
    Some(path)
}

fn set_path(record: &mut Record, keys: &[&str], text: &str) {
    match keys {
        [] => {}
        [last] => {
            let value = coerce(record.get(*last), text);
            record.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let child = record
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                set_path(map, rest, text);
            }
        }
    }
}

/// Form values are text. Fields that already hold a JSON number stay numeric;
/// everything else is stored as a string, the way the service echoes metrics.
fn coerce(existing: Option<&Value>, text: &str) -> Value {
    if let Some(Value::Number(_)) = existing {
        if let Ok(n) = text.parse::<i64>() {
            return Value::from(n);
        }
        if let Some(n) = text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(text.to_string())
}

fn touch(record: &mut Record) {
    record.insert(
        "updated_at".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
}

fn object(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn field_path_splits_nested_keys() {
        assert_eq!(field_path("user[email]"), Some(vec!["user", "email"]));
        assert_eq!(
            field_path("workout[workout_summary][file][url]"),
            Some(vec!["workout", "workout_summary", "file", "url"])
        );
        assert_eq!(field_path("email"), None);
        assert_eq!(field_path("user[]"), None);
        assert_eq!(field_path("user[email"), None);
    }

    #[test]
    fn coerce_keeps_numbers_numeric() {
        assert_eq!(coerce(Some(&json!(1)), "2"), json!(2));
        assert_eq!(coerce(Some(&json!(1.5)), "2.250000"), json!(2.25));
        assert_eq!(coerce(Some(&json!("1.0")), "2.250000"), json!("2.250000"));
        assert_eq!(coerce(None, "42"), json!("42"));
        assert_eq!(coerce(Some(&json!(1)), "abc"), json!("abc"));
    }

    #[test]
    fn apply_form_updates_only_sent_fields() {
        let mut user = Store::seeded().user;
        apply_form(&mut user, "user", &pairs(&[("user[email]", "new@example.com")])).unwrap();
        assert_eq!(user["email"], "new@example.com");
        assert_eq!(user["first"], "Ada");
        assert_eq!(user["height"], "1.8288");
    }

    #[test]
    fn apply_form_writes_nested_summary() {
        let mut workout = Store::seeded().workouts.remove(&3).unwrap();
        apply_form(
            &mut workout,
            "workout",
            &pairs(&[
                ("workout[minutes]", "25"),
                ("workout[workout_summary][ascent_accum]", "120.000000"),
            ]),
        )
        .unwrap();
        assert_eq!(workout["minutes"], 25);
        assert_eq!(workout["workout_summary"]["ascent_accum"], "120.000000");
    }

    #[test]
    fn apply_form_rejects_foreign_scope_atomically() {
        let mut user = Store::seeded().user;
        let before = user.clone();
        let result = apply_form(
            &mut user,
            "user",
            &pairs(&[("user[first]", "Grace"), ("workout[name]", "x")]),
        );
        assert_eq!(result, Err(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(user, before);
    }

    #[test]
    fn issued_tokens_are_registered() {
        let mut store = Store::default();
        let token = store.issue_token();
        let access = token["access_token"].as_str().unwrap();
        let refresh = token["refresh_token"].as_str().unwrap();
        assert!(store.access_tokens.contains(access));
        assert!(store.refresh_tokens.contains(refresh));
        assert_eq!(token["expires_in"], TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn seeded_store_has_quirky_summary() {
        let store = Store::seeded();
        let summary = &store.workouts[&1]["workout_summary"];
        assert_eq!(summary["heart_rate_avg"], "141.0");
        assert!(store.workouts[&2]["workout_summary"]["power_avg"].is_null());
        assert!(store.workouts[&3]["workout_summary"].is_null());
    }
}
