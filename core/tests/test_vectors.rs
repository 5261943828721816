//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Request vectors pin URLs and headers byte for byte. Decode vectors compare
//! the serialized entity against an expected JSON subset, so a case only names
//! the fields it cares about.

use serde_json::Value;
use wahoo_core::{
    ApiError, ClientConfig, FormEncode, FormFields, HeartRateZone, HttpMethod, HttpRequest,
    HttpResponse, PowerZone, User, WahooClient, Workout,
};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn response(status: u16, body: String) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body,
    }
}

/// Every key in `expected` must be present in `actual` with a matching value;
/// objects are compared recursively, everything else by equality.
fn assert_subset(expected: &Value, actual: &Value, path: &str) {
    match (expected, actual) {
        (Value::Object(want), Value::Object(have)) => {
            for (key, value) in want {
                let child = have
                    .get(key)
                    .unwrap_or_else(|| panic!("{path}.{key}: missing from {actual}"));
                assert_subset(value, child, &format!("{path}.{key}"));
            }
        }
        _ => assert_eq!(expected, actual, "{path}"),
    }
}

fn body_of(case: &Value) -> String {
    match case.get("raw_body") {
        Some(raw) => raw.as_str().unwrap().to_string(),
        None => case["body"].to_string(),
    }
}

fn diagnostic_fields(diagnostics: &[wahoo_core::Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.field.clone()).collect()
}

fn expected_fields(case: &Value) -> Vec<String> {
    case["expected_diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn build(client: &WahooClient, operation: &str, args: &Value) -> Result<HttpRequest, ApiError> {
    let token = move || args["access_token"].as_str().unwrap();
    let id = move || args["workout_id"].as_i64().unwrap();
    match operation {
        "oauth_token" => client.build_oauth_token(args["code"].as_str().unwrap()),
        "refresh_token" => client.build_refresh_token(args["refresh_token"].as_str().unwrap()),
        "get_user" => client.build_get_user(token()),
        "list_workouts" => client.build_list_workouts(
            token(),
            args["page"].as_u64().unwrap() as u32,
            args["per_page"].as_u64().unwrap() as u32,
        ),
        "get_workout" => client.build_get_workout(token(), id()),
        "delete_workout" => client.build_delete_workout(token(), id()),
        "get_workout_summary" => client.build_get_workout_summary(token(), id()),
        "get_heart_rate_zone" => client.build_get_heart_rate_zone(token()),
        "get_power_zone" => client.build_get_power_zone(token()),
        other => panic!("unknown operation: {other}"),
    }
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let config = &vectors["config"];
    let client = WahooClient::new(ClientConfig::new(
        config["client_id"].as_str().unwrap(),
        config["client_secret"].as_str().unwrap(),
        config["redirect_uri"].as_str().unwrap(),
        config["use_production"].as_bool().unwrap(),
    ));
    let base_url = vectors["base_url"].as_str().unwrap();
    assert_eq!(client.base_url(), base_url);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = build(&client, case["operation"].as_str().unwrap(), &case["args"]);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "MissingMandatoryValue" => assert!(
                    matches!(err, ApiError::MissingMandatoryValue(_)),
                    "{name}: expected MissingMandatoryValue, got {err:?}"
                ),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let req = result.unwrap();
        let expected_req = &case["expected_request"];
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(
            req.url,
            format!("{base_url}{}", expected_req["path"].as_str().unwrap()),
            "{name}: url"
        );
        assert_eq!(
            req.header("authorization"),
            expected_req["authorization"].as_str(),
            "{name}: authorization"
        );
        assert!(req.body.is_none(), "{name}: body should be None");
    }
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

#[test]
fn form_test_vectors() {
    let raw = include_str!("../../test-vectors/forms.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["input"].clone();
        let form: FormFields = match case["entity"].as_str().unwrap() {
            "user" => serde_json::from_value::<User>(input).unwrap().to_form_fields(),
            "workout" => serde_json::from_value::<Workout>(input).unwrap().to_form_fields(),
            "heart_rate_zone" => serde_json::from_value::<HeartRateZone>(input)
                .unwrap()
                .to_form_fields(),
            "power_zone" => serde_json::from_value::<PowerZone>(input).unwrap().to_form_fields(),
            other => panic!("{name}: unknown entity: {other}"),
        };

        let expected: Vec<(String, String)> =
            serde_json::from_value(case["expected_fields"].clone()).unwrap();
        assert_eq!(form.fields(), expected.as_slice(), "{name}: fields");
    }
}

// ---------------------------------------------------------------------------
// Tolerant decoding
// ---------------------------------------------------------------------------

#[test]
fn user_decode_test_vectors() {
    let raw = include_str!("../../test-vectors/user_decode.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let client = WahooClient::with_base_url(ClientConfig::default(), "http://localhost:3000");
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = client.parse_get_user(response(200, body_of(case)));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "DeserializationError" => assert!(
                    matches!(err, ApiError::DeserializationError(_)),
                    "{name}: expected DeserializationError, got {err:?}"
                ),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let decoded = result.unwrap();
        assert_eq!(
            diagnostic_fields(&decoded.diagnostics),
            expected_fields(case),
            "{name}: diagnostics"
        );
        let actual = serde_json::to_value(&decoded.value).unwrap();
        assert_subset(&case["expected_result"], &actual, name);
    }
}

#[test]
fn workout_summary_decode_test_vectors() {
    let raw = include_str!("../../test-vectors/workout_summary_decode.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let client = WahooClient::with_base_url(ClientConfig::default(), "http://localhost:3000");
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let decoded = client
            .parse_get_workout_summary(response(200, body_of(case)))
            .unwrap();

        assert_eq!(
            diagnostic_fields(&decoded.diagnostics),
            expected_fields(case),
            "{name}: diagnostics"
        );
        let actual = serde_json::to_value(&decoded.value).unwrap();
        assert_subset(&case["expected_result"], &actual, name);
    }
}

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

#[test]
fn status_test_vectors() {
    let raw = include_str!("../../test-vectors/status.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let client = WahooClient::with_base_url(ClientConfig::default(), "http://localhost:3000");
    for case in vectors["cases"].as_array().unwrap() {
        let status = case["status"].as_u64().unwrap() as u16;

        let delete = client.parse_delete_workout(response(status, String::new()));
        // Status wins over an undecodable body.
        let user = client.parse_get_user(response(status, "not json".to_string()));

        match case.get("expected_message") {
            None => {
                assert!(delete.is_ok(), "{status}: expected success");
                assert!(
                    matches!(user, Err(ApiError::DeserializationError(_))),
                    "{status}: body should be decoded"
                );
            }
            Some(message) => {
                for err in [delete.unwrap_err(), user.unwrap_err()] {
                    match err {
                        ApiError::Status(e) => {
                            assert_eq!(e.code, status);
                            assert_eq!(e.message, message.as_str().unwrap(), "{status}: message");
                        }
                        other => panic!("{status}: expected status error, got {other:?}"),
                    }
                }
            }
        }
    }
}
