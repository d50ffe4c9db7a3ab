//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Audit record for one scored transaction.
#[derive(Debug, Serialize)]
pub struct VerdictLine<'a> {
    pub ts: String,
    pub run_id: &'a str,
    pub schema: &'a str,
    pub txn_id: &'a str,
    pub debtor_id: &'a str,
    pub amount: f64,
    pub global_score: f64,
    pub global_flag: i8,
    pub debtor_score: f64,
    pub debtor_flag: i8,
    pub final_flag: &'a str,
    pub explain: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_reason: Option<&'a str>,
}

/// Initialize tracing with JSON format (one JSON object per line)
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr (stdout stays free for data); level
    /// from RUST_LOG or the configured default.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(fmt).init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured line without going through tracing.
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        writeln!(w, "{}", line)
    }
}
