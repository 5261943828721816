//! Synchronous client core for the Wahoo cloud API.
//!
//! # Overview
//! Covers OAuth token exchange/refresh and the user, workout, workout
//! summary, heart-rate zone and power zone endpoints. Requests are built and
//! responses parsed as plain data (`HttpRequest` / `HttpResponse`); a
//! `Transport` performs the round trip, with `UreqTransport` as the default.
//!
//! # Design
//! - `WahooClient` is stateless: `build_*` produces a request, `parse_*`
//!   consumes a response. `BlockingClient` chains the two over a transport.
//! - Responses for `User` and `WorkoutSummary` go through the tolerant decoder
//!   in `decode`, which absorbs the API's inconsistent wire types and reports
//!   what it skipped instead of failing.
//! - Updates are sent as multipart forms carrying only the fields that are
//!   `Some`, so unset fields are left untouched upstream.

pub mod blocking;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod form;
pub mod http;
pub mod time_format;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;
pub mod workout_type;

pub use blocking::BlockingClient;
pub use client::{DiagnosticHook, WahooClient};
pub use config::{ClientConfig, ConfigError};
pub use decode::{Decoded, Diagnostic};
pub use error::{ApiError, StatusError};
pub use form::{FormEncode, FormFields};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{File, HeartRateZone, PowerZone, Token, User, Workout, WorkoutSummary, WorkoutsPage};
pub use workout_type::WorkoutType;
