//! Queue, wall and CPU time of the active request.

use std::time::Duration;

use serde_json::{Map, Value};

/// Durations measured for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimes {
    /// Time spent waiting for a worker.
    pub queue: Duration,
    pub wall: Duration,
    pub cpu: Duration,
}

/// Source of timings for the request being served on this thread, if any.
pub trait RequestTimers: Send + Sync {
    fn timers(&self) -> Option<RequestTimes>;
}

/// `"<fraction> <seconds>"`, the fraction with eight decimals: `"0.25000000 12"`.
fn microtime(d: Duration) -> String {
    format!("{:.8} {}", f64::from(d.subsec_nanos()) / 1e9, d.as_secs())
}

fn render(d: Duration, as_float: bool) -> Value {
    if as_float {
        Value::from(d.as_secs_f64())
    } else {
        Value::from(microtime(d))
    }
}

/// Timings keyed `queue`, `process-wall` and `process-cpu`; `None` outside a request.
pub fn get_timers(source: &dyn RequestTimers, as_float: bool) -> Option<Map<String, Value>> {
    let times = source.timers()?;

    let mut map = Map::new();
    map.insert("queue".to_string(), render(times.queue, as_float));
    map.insert("process-wall".to_string(), render(times.wall, as_float));
    map.insert("process-cpu".to_string(), render(times.cpu, as_float));
    Some(map)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Active;

    impl RequestTimers for Active {
        fn timers(&self) -> Option<RequestTimes> {
            Some(RequestTimes {
                queue: Duration::from_millis(250),
                wall: Duration::new(12, 500_000_000),
                cpu: Duration::from_secs(3),
            })
        }
    }

    #[test]
    fn test_float_timers() {
        let timers = get_timers(&Active, true).unwrap();
        assert_eq!(timers["queue"], json!(0.25));
        assert_eq!(timers["process-wall"], json!(12.5));
        assert_eq!(timers["process-cpu"], json!(3.0));
    }

    #[test]
    fn test_microtime_timers() {
        let timers = get_timers(&Active, false).unwrap();
        assert_eq!(timers["queue"], json!("0.25000000 0"));
        assert_eq!(timers["process-wall"], json!("0.50000000 12"));
        assert_eq!(timers["process-cpu"], json!("0.00000000 3"));
    }
}
