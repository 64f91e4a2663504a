//! Server status reports, decoded from their JSON text form.

use serde_json::Value;
use targetlog::TargetWriter;

/// Produces a status report as JSON text.
pub trait StatusReporter: Send + Sync {
    fn report_status(&self) -> String;
}

/// Decodes the reporter's JSON into a value.
pub fn get_status(reporter: &dyn StatusReporter) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&reporter.report_status())
}

/// A writer reports its registry: every open target with its kind and counters.
impl StatusReporter for TargetWriter {
    fn report_status(&self) -> String {
        serde_json::to_string(&self.registry().snapshot()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to encode registry snapshot");
            "{}".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Fixed(&'static str);

    impl StatusReporter for Fixed {
        fn report_status(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_status_is_decoded() {
        let status = get_status(&Fixed(r#"{"threads": {"busy": 2, "idle": 6}}"#)).unwrap();
        assert_eq!(status["threads"]["busy"], json!(2));
    }

    #[test]
    fn test_malformed_status_is_an_error() {
        assert!(get_status(&Fixed("threads=2")).is_err());
    }

    #[test]
    fn test_empty_writer_status() {
        let status = get_status(&TargetWriter::default()).unwrap();
        assert_eq!(status["open_count"], json!(0));
        assert_eq!(status["targets"], json!([]));
    }
}
