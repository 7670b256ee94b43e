//! Fire-and-forget position reporting.
//!
//! The beacon's only backend interaction: take the current position
//! snapshot, encode it into the query string of the collection endpoint,
//! and POST it with an empty body. Nobody waits for the outcome — a
//! transport error is logged and dropped, and a response body is parsed as
//! loosely-typed JSON purely so it can be logged. There is no retry, no
//! queueing, and no schema on the reply.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

/// Where reports go when nothing else is configured. Compiled in: the
/// collection endpoint is part of the deployment, not of any runtime
/// configuration surface.
pub const DEFAULT_ENDPOINT: &str = "http://arta.exp.mnb.ees.saitama-u.ac.jp/ana/staff/post.php";

/// A snapshot of the device position, ready for the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// Stable per-install device identifier.
    pub id: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// Building floor level, 0 when unknown.
    pub floor: i32,
}

/// Errors raised while constructing a reporter.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid report endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Collection endpoint the reports are posted to.
    pub endpoint: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
        }
    }
}

/// Where the tracker hands position snapshots.
///
/// The seam exists so tests can count and inspect dispatches without a
/// network; production code uses [`Reporter`].
pub trait ReportSink: Send + Sync {
    /// Dispatch a report. Fire-and-forget: implementations must not block
    /// the caller on the outcome.
    fn post(&self, report: &PositionReport);
}

/// The HTTP [`ReportSink`].
///
/// Each `post` spawns a detached task that performs the request; callers
/// must therefore be running inside a Tokio runtime. The POST carries all
/// parameters in the query string and an empty body — an oddity of the
/// collection endpoint's contract, preserved as-is.
#[derive(Debug, Clone)]
pub struct Reporter {
    client: reqwest::Client,
    endpoint: Url,
}

impl Reporter {
    /// A reporter aimed at [`DEFAULT_ENDPOINT`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReporterConfig::default()).expect("default endpoint parses")
    }

    /// A reporter aimed at the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidEndpoint`] if the endpoint does not
    /// parse as a URL.
    pub fn with_config(config: ReporterConfig) -> Result<Self, ReportError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: Url::parse(&config.endpoint)?,
        })
    }

    /// The URL a given report would be posted to.
    #[must_use]
    pub fn report_url(&self, report: &PositionReport) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("id", &report.id)
            .append_pair("lat", &decimal(report.latitude))
            .append_pair("lon", &decimal(report.longitude))
            .append_pair("alt", &decimal(report.altitude))
            .append_pair("fl", &report.floor.to_string());
        url
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for Reporter {
    fn post(&self, report: &PositionReport) {
        let request = self.client.post(self.report_url(report));
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => log_response(response).await,
                Err(err) => warn!("beacon report failed: {err}"),
            }
        });
    }
}

async fn log_response(response: reqwest::Response) {
    let status = response.status();
    match response.bytes().await {
        Ok(body) if body.is_empty() => info!("report acknowledged ({status}), empty body"),
        Ok(body) => match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(payload) => info!("report acknowledged ({status}): {payload}"),
            Err(err) => warn!("report response not parseable: {err}"),
        },
        Err(err) => warn!("failed to read report response: {err}"),
    }
}

/// Render a float for the query string, keeping a decimal point on
/// integral values (`35.0`, not `35`) — the format the collection endpoint
/// has always received.
fn decimal(value: f64) -> String {
    let mut rendered = value.to_string();
    if value.is_finite() && !rendered.contains('.') && !rendered.contains('e') {
        rendered.push_str(".0");
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> PositionReport {
        PositionReport {
            id: "ABCD-1234".to_owned(),
            latitude: 35.0,
            longitude: 139.0,
            altitude: 10.0,
            floor: 0,
        }
    }

    #[test]
    fn query_matches_wire_format() {
        let reporter = Reporter::new();
        let url = reporter.report_url(&sample_report());
        assert_eq!(
            url.query(),
            Some("id=ABCD-1234&lat=35.0&lon=139.0&alt=10.0&fl=0")
        );
    }

    #[test]
    fn integral_floats_keep_a_decimal_point() {
        assert_eq!(decimal(35.0), "35.0");
        assert_eq!(decimal(-7.0), "-7.0");
        assert_eq!(decimal(35.68951), "35.68951");
        assert_eq!(decimal(0.0), "0.0");
    }

    #[test]
    fn default_config_uses_compiled_in_endpoint() {
        assert_eq!(ReporterConfig::default().endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn rejects_garbage_endpoint() {
        let config = ReporterConfig {
            endpoint: "not a url".to_owned(),
        };
        assert!(Reporter::with_config(config).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn transport_failure_is_swallowed() {
        // Nothing listens here; the refused connection must only produce a
        // log line, never a panic or an error the caller could see.
        let reporter = Reporter::with_config(ReporterConfig {
            endpoint: "http://127.0.0.1:9/post.php".to_owned(),
        })
        .expect("endpoint parses");
        reporter.post(&sample_report());
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}
