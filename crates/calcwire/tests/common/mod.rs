//! Test harness: builds a page in a `MemoryDocument`, mounts the
//! engine on it and reads elements back by `id`.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use calcwire::{Config, Document, DocumentEvent, Element, ElementId, Engine, MemoryDocument};

pub const SOURCE: &str = "x-calculator-source";
pub const EXPRESSION: &str = "x-calculator-expression";
pub const SCOPE: &str = "x-calculator-scope";
pub const PRECISION: &str = "x-calculator-precision";
pub const LOCALE: &str = "x-calculator-locale";

pub struct TestPage {
    pub engine: Engine<MemoryDocument>,
}

impl TestPage {
    pub fn new(build: impl FnOnce(&mut MemoryDocument, ElementId)) -> Self {
        Self::with_config(Config::default().with_default_locale("en-US"), build)
    }

    pub fn with_config(config: Config, build: impl FnOnce(&mut MemoryDocument, ElementId)) -> Self {
        let mut document = MemoryDocument::new();
        let body = document.root();
        build(&mut document, body);
        let mut engine = Engine::with_config(document, config);
        engine.install();
        engine.mount(body);
        Self { engine }
    }

    pub fn id(&self, id: &str) -> ElementId {
        self.engine
            .document()
            .get_element_by_id(id)
            .unwrap_or_else(|| panic!("no element with id '{id}'"))
    }

    pub fn content(&self, id: &str) -> String {
        self.engine.document().content(self.id(id)).unwrap_or_default()
    }

    /// Set the value and fire `input`, like a user typing.
    pub fn type_into(&mut self, id: &str, value: &str) {
        let element = self.id(id);
        self.engine.document_mut().set_value(element, value);
        self.engine.dispatch(element, DocumentEvent::Input);
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) {
        let element = self.id(id);
        self.engine.document_mut().set_checked(element, checked);
        self.engine.dispatch(element, DocumentEvent::Change);
    }
}

/// `<input type=... x-calculator-source=name value=...>`
pub fn source(input_type: &str, name: &str, value: &str) -> Element {
    Element::input(input_type).attr(SOURCE, name).value(value)
}

pub fn number_source(name: &str, value: &str) -> Element {
    source("number", name, value)
}

/// `<span id=... x-calculator-expression=...>`
pub fn display(id: &str, expression: &str) -> Element {
    Element::new("span").attr("id", id).attr(EXPRESSION, expression)
}

pub fn scoped_display(id: &str, expression: &str, scope: &str) -> Element {
    display(id, expression).attr(SCOPE, scope)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Buffer for formatted log lines written by `run_with_logs`.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn text(&self) -> String {
        let buffer = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut buffer = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber that records warnings and
/// errors as plain text.
pub fn run_with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let output = tracing::subscriber::with_default(subscriber, f);
    (output, logs.text())
}
