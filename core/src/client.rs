//! Stateless HTTP request builder and response parser for the Wahoo API.
//!
//! # Design
//! `WahooClient` holds only configuration and carries no mutable state
//! between calls. Each endpoint is split into a `build_*` method that
//! validates arguments and produces an `HttpRequest`, and a `parse_*` method
//! that consumes an `HttpResponse`. Argument guards run in `build_*`, so a
//! request with an empty token or a zero ID never exists, let alone reaches
//! the network. `BlockingClient` pairs the two halves with a `Transport`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::decode::{self, decode_tolerant, Decoded, Diagnostic, TolerantDecode};
use crate::error::{ApiError, StatusError};
use crate::form::{FormEncode, FormFields};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{HeartRateZone, PowerZone, Token, User, Workout, WorkoutSummary, WorkoutsPage};

/// Callback receiving `(entity, diagnostic)` for every skipped field.
pub type DiagnosticHook = Arc<dyn Fn(&str, &Diagnostic) + Send + Sync>;

/// Synchronous, stateless client for the Wahoo API.
#[derive(Clone)]
pub struct WahooClient {
    config: ClientConfig,
    base_url: String,
    diagnostic_hook: Option<DiagnosticHook>,
}

impl fmt::Debug for WahooClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WahooClient")
            .field("client_id", &self.config.client_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.config.timeout)
            .field("diagnostic_hook", &self.diagnostic_hook.is_some())
            .finish()
    }
}

impl WahooClient {
    /// Client for the host selected by `config.use_production`.
    pub fn new(config: ClientConfig) -> Self {
        let base_url = config.base_url().to_string();
        Self {
            config,
            base_url,
            diagnostic_hook: None,
        }
    }

    /// Client for an explicit host, e.g. a local mock server.
    pub fn with_base_url(config: ClientConfig, base_url: &str) -> Self {
        Self {
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            diagnostic_hook: None,
        }
    }

    /// Install a callback that sees every field skipped by tolerant decoding.
    pub fn with_diagnostic_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Diagnostic) + Send + Sync + 'static,
    {
        self.diagnostic_hook = Some(Arc::new(hook));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // OAuth
    // -----------------------------------------------------------------------

    /// Exchange an authorization code for a token pair.
    pub fn build_oauth_token(&self, code: &str) -> Result<HttpRequest, ApiError> {
        require(code, "code")?;
        let query = encode_query(&[
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
        ]);
        Ok(self.request(HttpMethod::Post, format!("/oauth/token?{query}")))
    }

    /// Trade a refresh token for a fresh token pair.
    pub fn build_refresh_token(&self, refresh_token: &str) -> Result<HttpRequest, ApiError> {
        require(refresh_token, "refresh_token")?;
        let query = encode_query(&[
            ("client_secret", self.config.client_secret.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ]);
        Ok(self.request(HttpMethod::Post, format!("/oauth/token?{query}")))
    }

    pub fn parse_token(&self, response: HttpResponse) -> Result<Token, ApiError> {
        check_status(&response)?;
        parse_json(&response)
    }

    // -----------------------------------------------------------------------
    // User
    // -----------------------------------------------------------------------

    pub fn build_get_user(&self, access_token: &str) -> Result<HttpRequest, ApiError> {
        self.authorized(HttpMethod::Get, "/v1/user".to_string(), access_token)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<Decoded<User>, ApiError> {
        check_status(&response)?;
        self.parse_tolerant(&response)
    }

    pub fn build_update_user(&self, access_token: &str, user: &User) -> Result<HttpRequest, ApiError> {
        let request = self.authorized(HttpMethod::Put, "/v1/user".to_string(), access_token)?;
        Ok(with_form(request, user.to_form_fields()))
    }

    // -----------------------------------------------------------------------
    // Workouts
    // -----------------------------------------------------------------------

    /// List workouts. `page` and `per_page` are sent only when positive.
    pub fn build_list_workouts(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<HttpRequest, ApiError> {
        let page_value = page.to_string();
        let per_page_value = per_page.to_string();
        let mut params: Vec<(&str, &str)> = Vec::new();
        if page > 0 {
            params.push(("page", page_value.as_str()));
        }
        if per_page > 0 {
            params.push(("per_page", per_page_value.as_str()));
        }

        let path = if params.is_empty() {
            "/v1/workouts".to_string()
        } else {
            format!("/v1/workouts?{}", encode_query(&params))
        };
        self.authorized(HttpMethod::Get, path, access_token)
    }

    /// Unwrap the paged envelope into its workouts. Summary anomalies are
    /// reported as `<index>.workout_summary.<field>` under `workouts`.
    pub fn parse_list_workouts(&self, response: HttpResponse) -> Result<Decoded<Vec<Workout>>, ApiError> {
        check_status(&response)?;
        let mut envelope: Map<String, Value> = parse_json(&response)?;
        let items = match envelope.remove("workouts") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ApiError::DeserializationError(
                    "workouts is not an array".to_string(),
                ))
            }
        };
        let page: WorkoutsPage = from_value(Value::Object(envelope))?;

        let mut workouts = Vec::with_capacity(items.len());
        let mut diagnostics = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let decoded = decode_workout(item)?;
            diagnostics.extend(decode::prefix_diagnostics(&index.to_string(), decoded.diagnostics));
            workouts.push(decoded.value);
        }
        tracing::debug!(
            count = workouts.len(),
            total = page.total,
            page = page.page,
            "fetched workouts page"
        );
        self.report("workouts", &diagnostics);
        Ok(Decoded {
            value: workouts,
            diagnostics,
        })
    }

    pub fn build_get_workout(&self, access_token: &str, workout_id: i64) -> Result<HttpRequest, ApiError> {
        require_id(workout_id)?;
        self.authorized(HttpMethod::Get, format!("/v1/workouts/{workout_id}"), access_token)
    }

    /// Summary anomalies are reported as `workout_summary.<field>`.
    pub fn parse_get_workout(&self, response: HttpResponse) -> Result<Decoded<Workout>, ApiError> {
        check_status(&response)?;
        let decoded = decode_workout(parse_json(&response)?)?;
        self.report("workout", &decoded.diagnostics);
        Ok(decoded)
    }

    /// Update the workout identified by `workout.id`, including any summary
    /// metrics it carries.
    pub fn build_update_workout(&self, access_token: &str, workout: &Workout) -> Result<HttpRequest, ApiError> {
        require_id(workout.id)?;
        let request = self.authorized(
            HttpMethod::Put,
            format!("/v1/workouts/{}", workout.id),
            access_token,
        )?;
        Ok(with_form(request, workout.to_form_fields()))
    }

    pub fn build_delete_workout(&self, access_token: &str, workout_id: i64) -> Result<HttpRequest, ApiError> {
        require_id(workout_id)?;
        self.authorized(HttpMethod::Delete, format!("/v1/workouts/{workout_id}"), access_token)
    }

    pub fn parse_delete_workout(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn build_get_workout_summary(
        &self,
        access_token: &str,
        workout_id: i64,
    ) -> Result<HttpRequest, ApiError> {
        require_id(workout_id)?;
        self.authorized(
            HttpMethod::Get,
            format!("/v1/workouts/{workout_id}/workout_summary"),
            access_token,
        )
    }

    pub fn parse_get_workout_summary(
        &self,
        response: HttpResponse,
    ) -> Result<Decoded<WorkoutSummary>, ApiError> {
        check_status(&response)?;
        self.parse_tolerant(&response)
    }

    // -----------------------------------------------------------------------
    // Zones
    // -----------------------------------------------------------------------

    pub fn build_get_heart_rate_zone(&self, access_token: &str) -> Result<HttpRequest, ApiError> {
        self.authorized(HttpMethod::Get, "/v1/heart_rate_zone".to_string(), access_token)
    }

    pub fn parse_get_heart_rate_zone(&self, response: HttpResponse) -> Result<HeartRateZone, ApiError> {
        check_status(&response)?;
        parse_json(&response)
    }

    pub fn build_update_heart_rate_zone(
        &self,
        access_token: &str,
        zones: &HeartRateZone,
    ) -> Result<HttpRequest, ApiError> {
        let request = self.authorized(HttpMethod::Put, "/v1/heart_rate_zone".to_string(), access_token)?;
        Ok(with_form(request, zones.to_form_fields()))
    }

    pub fn build_get_power_zone(&self, access_token: &str) -> Result<HttpRequest, ApiError> {
        self.authorized(HttpMethod::Get, "/v1/power_zone".to_string(), access_token)
    }

    pub fn parse_get_power_zone(&self, response: HttpResponse) -> Result<PowerZone, ApiError> {
        check_status(&response)?;
        parse_json(&response)
    }

    pub fn build_update_power_zone(&self, access_token: &str, zones: &PowerZone) -> Result<HttpRequest, ApiError> {
        let request = self.authorized(HttpMethod::Put, "/v1/power_zone".to_string(), access_token)?;
        Ok(with_form(request, zones.to_form_fields()))
    }

    /// Shared parser for every PUT endpoint: only the status matters.
    pub fn parse_update(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn request(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
            timeout: self.config.timeout,
        }
    }

    fn authorized(&self, method: HttpMethod, path: String, access_token: &str) -> Result<HttpRequest, ApiError> {
        require(access_token, "access_token")?;
        let mut request = self.request(method, path);
        request
            .headers
            .push(("Authorization".to_string(), format!("Bearer {access_token}")));
        Ok(request)
    }

    fn parse_tolerant<T: TolerantDecode>(&self, response: &HttpResponse) -> Result<Decoded<T>, ApiError> {
        let decoded = decode_tolerant::<T>(response.body.as_bytes())?;
        self.report(T::ENTITY, &decoded.diagnostics);
        Ok(decoded)
    }

    /// Log skipped fields and hand them to the hook, if one is installed.
    fn report(&self, entity: &str, diagnostics: &[Diagnostic]) {
        decode::log_diagnostics(entity, diagnostics);
        if let Some(hook) = &self.diagnostic_hook {
            for diagnostic in diagnostics {
                hook(entity, diagnostic);
            }
        }
    }
}

/// Decode a workout structurally, except for its summary, which goes through
/// the tolerant decoder so its anomalies are kept.
fn decode_workout(raw: Value) -> Result<Decoded<Workout>, ApiError> {
    let Value::Object(mut map) = raw else {
        return Err(ApiError::DeserializationError(
            "expected a workout object".to_string(),
        ));
    };
    let summary = decode::decode_nested::<WorkoutSummary>("workout_summary", map.remove("workout_summary"));
    let mut workout: Workout = from_value(Value::Object(map))?;
    workout.workout_summary = summary.value;
    Ok(Decoded {
        value: workout,
        diagnostics: summary.diagnostics,
    })
}

fn require(value: &str, name: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::MissingMandatoryValue(name));
    }
    Ok(())
}

fn require_id(id: i64) -> Result<(), ApiError> {
    if id <= 0 {
        return Err(ApiError::MissingMandatoryValue("workout_id"));
    }
    Ok(())
}

fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Attach a multipart body with a fresh random boundary.
fn with_form(mut request: HttpRequest, form: FormFields) -> HttpRequest {
    let boundary = Uuid::new_v4().simple().to_string();
    request
        .headers
        .push(("Content-Type".to_string(), FormFields::content_type(&boundary)));
    request.body = Some(form.to_multipart(&boundary));
    request
}

/// Map statuses of 300 and above to a classified `StatusError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status < 300 {
        return Ok(());
    }
    let status = StatusError::from_code(response.status);
    tracing::warn!(code = status.code, message = status.message, "request rejected");
    Err(ApiError::Status(status))
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::DeserializationError(e.to_string()))
}
