//! One synchronous round trip per endpoint.
//!
//! `BlockingClient` runs `build_*`, hands the request to its `Transport`, and
//! feeds the response to the matching `parse_*`. A failed argument guard
//! returns before the transport is touched.

use crate::client::WahooClient;
use crate::decode::Decoded;
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::{HeartRateZone, PowerZone, Token, User, Workout, WorkoutSummary};

#[derive(Debug, Clone)]
pub struct BlockingClient<T> {
    client: WahooClient,
    transport: T,
}

#[cfg(feature = "ureq")]
impl BlockingClient<crate::transport::UreqTransport> {
    pub fn with_ureq(client: WahooClient) -> Self {
        Self::new(client, crate::transport::UreqTransport::new())
    }
}

impl<T: Transport> BlockingClient<T> {
    pub fn new(client: WahooClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &WahooClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn oauth_token(&self, code: &str) -> Result<Token, ApiError> {
        let request = self.client.build_oauth_token(code)?;
        self.client.parse_token(self.transport.execute(request)?)
    }

    pub fn refresh_token(&self, refresh_token: &str) -> Result<Token, ApiError> {
        let request = self.client.build_refresh_token(refresh_token)?;
        self.client.parse_token(self.transport.execute(request)?)
    }

    pub fn get_user(&self, access_token: &str) -> Result<Decoded<User>, ApiError> {
        let request = self.client.build_get_user(access_token)?;
        self.client.parse_get_user(self.transport.execute(request)?)
    }

    pub fn update_user(&self, access_token: &str, user: &User) -> Result<(), ApiError> {
        let request = self.client.build_update_user(access_token, user)?;
        self.client.parse_update(self.transport.execute(request)?)
    }

    pub fn list_workouts(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Decoded<Vec<Workout>>, ApiError> {
        let request = self.client.build_list_workouts(access_token, page, per_page)?;
        self.client.parse_list_workouts(self.transport.execute(request)?)
    }

    pub fn get_workout(&self, access_token: &str, workout_id: i64) -> Result<Decoded<Workout>, ApiError> {
        let request = self.client.build_get_workout(access_token, workout_id)?;
        self.client.parse_get_workout(self.transport.execute(request)?)
    }

    pub fn update_workout(&self, access_token: &str, workout: &Workout) -> Result<(), ApiError> {
        let request = self.client.build_update_workout(access_token, workout)?;
        self.client.parse_update(self.transport.execute(request)?)
    }

    pub fn delete_workout(&self, access_token: &str, workout_id: i64) -> Result<(), ApiError> {
        let request = self.client.build_delete_workout(access_token, workout_id)?;
        self.client.parse_delete_workout(self.transport.execute(request)?)
    }

    pub fn get_workout_summary(
        &self,
        access_token: &str,
        workout_id: i64,
    ) -> Result<Decoded<WorkoutSummary>, ApiError> {
        let request = self.client.build_get_workout_summary(access_token, workout_id)?;
        self.client.parse_get_workout_summary(self.transport.execute(request)?)
    }

    pub fn get_heart_rate_zone(&self, access_token: &str) -> Result<HeartRateZone, ApiError> {
        let request = self.client.build_get_heart_rate_zone(access_token)?;
        self.client.parse_get_heart_rate_zone(self.transport.execute(request)?)
    }

    pub fn update_heart_rate_zone(
        &self,
        access_token: &str,
        zones: &HeartRateZone,
    ) -> Result<(), ApiError> {
        let request = self.client.build_update_heart_rate_zone(access_token, zones)?;
        self.client.parse_update(self.transport.execute(request)?)
    }

    pub fn get_power_zone(&self, access_token: &str) -> Result<PowerZone, ApiError> {
        let request = self.client.build_get_power_zone(access_token)?;
        self.client.parse_get_power_zone(self.transport.execute(request)?)
    }

    pub fn update_power_zone(&self, access_token: &str, zones: &PowerZone) -> Result<(), ApiError> {
        let request = self.client.build_update_power_zone(access_token, zones)?;
        self.client.parse_update(self.transport.execute(request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};
    use std::cell::RefCell;

    /// Replays one canned response and records every request it sees.
    struct Canned {
        status: u16,
        body: &'static str,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request);
            Ok(HttpResponse {
                status: self.status,
                headers: Vec::new(),
                body: self.body.to_string(),
            })
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }
    }

    fn client() -> WahooClient {
        WahooClient::with_base_url(ClientConfig::default(), "http://mock")
    }

    #[test]
    fn delete_guard_never_reaches_transport() {
        let blocking = BlockingClient::new(client(), Canned::new(204, ""));

        let err = blocking.delete_workout("", 5).unwrap_err();
        assert!(matches!(err, ApiError::MissingMandatoryValue(_)));
        let err = blocking.delete_workout("tok", 0).unwrap_err();
        assert!(matches!(err, ApiError::MissingMandatoryValue(_)));
        assert!(blocking.transport().seen.borrow().is_empty());

        blocking.delete_workout("tok", 5).unwrap();
        let seen = blocking.transport().seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Delete);
        assert_eq!(seen[0].url, "http://mock/v1/workouts/5");
    }

    #[test]
    fn list_workouts_unwraps_envelope() {
        let blocking = BlockingClient::new(
            client(),
            Canned::new(
                200,
                r#"{"workouts":[{"id":1},{"id":2}],"total":2,"page":1,"per_page":45}"#,
            ),
        );
        let workouts = blocking.list_workouts("tok", 1, 45).unwrap().into_inner();
        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[1].id, 2);
    }

    #[test]
    fn workout_comes_back_with_summary_diagnostics() {
        let blocking = BlockingClient::new(
            client(),
            Canned::new(
                200,
                r#"{"id": 9, "workout_summary": {"id": 19, "heart_rate_avg": "fast"}}"#,
            ),
        );
        let decoded = blocking.get_workout("tok", 9).unwrap();
        assert_eq!(decoded.value.id, 9);
        assert_eq!(decoded.value.workout_summary.as_ref().map(|s| s.id), Some(19));
        assert_eq!(decoded.diagnostics[0].field, "workout_summary.heart_rate_avg");
        assert!(decoded.into_strict().is_err());
    }

    #[test]
    fn status_error_is_surfaced() {
        let blocking = BlockingClient::new(client(), Canned::new(401, "{}"));
        let err = blocking.get_power_zone("tok").unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn transport_failure_propagates() {
        let blocking = BlockingClient::new(client(), Unreachable);
        let err = blocking.get_user("tok").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn user_comes_back_with_diagnostics() {
        let blocking = BlockingClient::new(
            client(),
            Canned::new(200, r#"{"id": 1, "height": "1.75", "weight": "heavy"}"#),
        );
        let decoded = blocking.get_user("tok").unwrap();
        assert_eq!(decoded.value.height, Some(1.75));
        assert_eq!(decoded.value.weight, None);
        assert_eq!(decoded.diagnostics.len(), 1);
        assert!(decoded.into_strict().is_err());
    }

    #[test]
    fn transport_can_be_borrowed() {
        let canned = Canned::new(200, "");
        let blocking = BlockingClient::new(client(), &canned);
        blocking
            .update_heart_rate_zone("tok", &HeartRateZone::default())
            .unwrap();
        assert_eq!(canned.seen.borrow()[0].method, HttpMethod::Put);
    }
}
