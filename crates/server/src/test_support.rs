//! In-memory `tracing` capture for unit tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

pub(crate) type Fields = HashMap<String, String>;

#[derive(Default)]
struct Captured {
    spans: Vec<(u64, &'static str, Fields)>,
    events: Vec<Fields>,
}

/// Records span fields (including later `Span::record` calls) and events.
#[derive(Clone, Default)]
pub(crate) struct Capture {
    inner: Arc<Mutex<Captured>>,
}

impl Capture {
    /// Install as the thread's default subscriber until the guard drops.
    pub(crate) fn set_default(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    /// Fields of the most recent span called `name`.
    pub(crate) fn span(&self, name: &str) -> Option<Fields> {
        let captured = self.inner.lock().unwrap();
        captured
            .spans
            .iter()
            .rev()
            .find(|(_, span_name, _)| *span_name == name)
            .map(|(_, _, fields)| fields.clone())
    }

    /// Every event whose message is `message`.
    pub(crate) fn events(&self, message: &str) -> Vec<Fields> {
        let captured = self.inner.lock().unwrap();
        captured
            .events
            .iter()
            .filter(|fields| fields.get("message").map(String::as_str) == Some(message))
            .cloned()
            .collect()
    }
}

struct FieldVisitor<'a>(&'a mut Fields);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut fields = Fields::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        let mut captured = self.inner.lock().unwrap();
        captured
            .spans
            .push((id.into_u64(), attrs.metadata().name(), fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut captured = self.inner.lock().unwrap();
        if let Some((_, _, fields)) = captured
            .spans
            .iter_mut()
            .rev()
            .find(|(span_id, _, _)| *span_id == id.into_u64())
        {
            values.record(&mut FieldVisitor(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::new();
        event.record(&mut FieldVisitor(&mut fields));
        self.inner.lock().unwrap().events.push(fields);
    }
}
