//! Tracing layer that routes events to log targets.

use std::{collections::BTreeMap, fmt, sync::Arc};

use tracing::{
    field::{Field, Visit},
    span, Event, Subscriber,
};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

use super::entry::LogEntry;
use crate::writer::TargetWriter;

/// Span field naming the target that events inside the span are written to.
pub const LOG_TARGET_FIELD: &str = "log_target";

/// Events from this crate are never routed, so writing can't feed back into itself.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");
const OWN_MODULE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

fn is_own_event(target: &str) -> bool {
    target == OWN_TARGET || target.starts_with(OWN_MODULE_PREFIX)
}

/// Routes events to the target named by the nearest enclosing `log_target` span field.
///
/// ```ignore
/// let span = tracing::info_span!("job", log_target = "/var/log/jobs-%Y%m%d.log");
/// let _guard = span.enter();
/// tracing::info!(job = 7, "started"); // appended to today's jobs file
/// ```
pub struct TargetLayer {
    writer: Arc<TargetWriter>,
}

impl TargetLayer {
    pub fn new(writer: Arc<TargetWriter>) -> Self {
        Self { writer }
    }
}

/// Visitor that extracts the message and fields from a tracing event.
struct EventVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl EventVisitor {
    fn new() -> Self {
        Self {
            message: String::new(),
            fields: BTreeMap::new(),
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

/// Target name stored in a span's extensions.
#[derive(Clone, Default)]
struct SpanTarget(Option<String>);

impl Visit for SpanTarget {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == LOG_TARGET_FIELD {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == LOG_TARGET_FIELD {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S> Layer<S> for TargetLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let mut visitor = SpanTarget::default();
        attrs.record(&mut visitor);

        if visitor.0.is_some() {
            if let Some(span) = ctx.span(id) {
                span.extensions_mut().insert(visitor);
            }
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = SpanTarget::default();
        values.record(&mut visitor);

        if visitor.0.is_some() {
            if let Some(span) = ctx.span(id) {
                span.extensions_mut().replace(visitor);
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_event(metadata.target()) {
            return;
        }

        // Innermost span wins.
        let mut target = None;
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(SpanTarget(Some(name))) = span.extensions().get::<SpanTarget>() {
                    target = Some(name.clone());
                    break;
                }
            }
        }
        let Some(target) = target else {
            return;
        };

        let mut visitor = EventVisitor::new();
        event.record(&mut visitor);

        let entry = LogEntry::new(
            *metadata.level(),
            metadata.target().to_string(),
            visitor.message,
        )
        .with_fields(visitor.fields);

        self.writer.write(&target, entry.to_line().as_bytes());
    }
}
