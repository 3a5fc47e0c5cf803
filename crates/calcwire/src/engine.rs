//! The update propagator: owns the document and both registries, and
//! recomputes expressions when the sources they read change.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::context::build_context;
use crate::diagnostics::{DiagnosticsContext, RecomputeEvent, Trigger};
use crate::document::{Document, DocumentEvent, ElementId};
use crate::evaluator::evaluate;
use crate::format::{format_result, parse_precision};
use crate::locale::{LocaleResolver, detect_system_locale};
use crate::registry::{Expression, ExpressionRegistry, SourceRegistry};
use crate::scope::resolve_expression_scope;
use crate::value::Value;

/// Work postponed to the host's next event-loop turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Recompute every expression after a source went away.
    GlobalRecalculation,
}

pub struct Engine<D: Document> {
    document: D,
    config: Config,
    default_locale: String,
    sources: SourceRegistry,
    expressions: ExpressionRegistry,
    pending_tasks: Vec<DeferredTask>,
    cascade_depth: usize,
    current_pass: u64,
    diagnostics: DiagnosticsContext,
}

impl<D: Document> Engine<D> {
    pub fn new(document: D) -> Self {
        Self::with_config(document, Config::default())
    }

    pub fn with_config(document: D, config: Config) -> Self {
        let default_locale = config
            .default_locale
            .clone()
            .unwrap_or_else(detect_system_locale);
        Self {
            document,
            config,
            default_locale,
            sources: SourceRegistry::new(),
            expressions: ExpressionRegistry::new(),
            pending_tasks: Vec::new(),
            cascade_depth: 0,
            current_pass: 0,
            diagnostics: DiagnosticsContext::new(),
        }
    }

    /// Announce that the engine is ready to take bindings.
    pub fn install(&mut self) {
        info!(
            target: "calcwire::ready",
            locale = %self.default_locale,
            sources = self.sources.len(),
            expressions = self.expressions.len(),
            "calculator ready"
        );
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn expressions(&self) -> &ExpressionRegistry {
        &self.expressions
    }

    pub fn diagnostics(&self) -> &DiagnosticsContext {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticsContext {
        &mut self.diagnostics
    }

    /// Sequence number of the latest propagation pass.
    pub fn current_pass(&self) -> u64 {
        self.current_pass
    }

    pub fn locale_resolver(&self) -> LocaleResolver<'_> {
        LocaleResolver {
            locale_attribute: &self.config.locale_attribute,
            scope_attribute: &self.config.scope_attribute,
            default_locale: &self.default_locale,
        }
    }

    /// Attach every source and expression declared by attributes under
    /// `root`, in document order.
    pub fn mount(&mut self, root: ElementId) {
        for element in self.document.descendants(root) {
            let identifier = self
                .document
                .attribute(element, &self.config.source_attribute)
                .map(|identifier| identifier.trim().to_owned());
            if let Some(identifier) = identifier {
                self.attach_source(element, &identifier);
            }
            let text = self
                .document
                .attribute(element, &self.config.expression_attribute)
                .map(str::to_owned);
            if let Some(text) = text {
                self.attach_expression(element, &text);
            }
        }
    }

    /// Detach every binding under `root`, e.g. before removing it.
    pub fn unmount(&mut self, root: ElementId) {
        for element in self.document.descendants(root) {
            self.detach_expression(element);
            self.detach_source(element);
        }
    }

    pub fn attach_source(&mut self, anchor: ElementId, identifier: &str) {
        debug!(?anchor, identifier, "source attached");
        self.sources.register(anchor, identifier);
        self.on_registry_membership_changed();
    }

    /// Recalculation after a detach waits for [`Engine::run_deferred`].
    pub fn detach_source(&mut self, anchor: ElementId) {
        if let Some(source) = self.sources.unregister(anchor) {
            debug!(?anchor, identifier = %source.identifier, "source detached");
            self.defer(DeferredTask::GlobalRecalculation);
        }
    }

    /// Register `text` at `anchor`, fix its scope and compute it once.
    pub fn attach_expression(&mut self, anchor: ElementId, text: &str) {
        let scope = resolve_expression_scope(&self.document, anchor, &self.config.scope_attribute);
        debug!(?anchor, expression = text, ?scope, "expression attached");
        if let Err(error) = &self.expressions.register(anchor, text, scope).formula {
            debug!(report = %error.report, "formula does not compile");
        }
        self.start_pass();
        self.recompute_with(anchor, Trigger::Attached);
    }

    pub fn rerun_expression(&mut self, anchor: ElementId) {
        self.start_pass();
        self.recompute_with(anchor, Trigger::Rerun);
    }

    pub fn detach_expression(&mut self, anchor: ElementId) {
        if self.expressions.unregister(anchor).is_some() {
            debug!(?anchor, "expression detached");
        }
    }

    /// Feed a document event on `anchor`. Returns whether it propagated.
    pub fn dispatch(&mut self, anchor: ElementId, event: DocumentEvent) -> bool {
        if !event.changes_value() {
            return false;
        }
        let Some(identifier) = self.sources.get(anchor).map(|source| source.identifier.clone()) else {
            return false;
        };
        self.on_source_value_changed(&identifier, Some(anchor));
        true
    }

    pub fn has_deferred(&self) -> bool {
        !self.pending_tasks.is_empty()
    }

    /// Run the tasks queued so far. Returns how many ran.
    pub fn run_deferred(&mut self) -> usize {
        let tasks = std::mem::take(&mut self.pending_tasks);
        for task in &tasks {
            match task {
                DeferredTask::GlobalRecalculation => self.on_registry_membership_changed(),
            }
        }
        tasks.len()
    }

    /// Recompute the expressions that may read `identifier`.
    pub fn on_source_value_changed(&mut self, identifier: &str, changed: Option<ElementId>) {
        self.start_pass();
        let affected: Vec<ElementId> = self
            .expressions
            .referencing(&self.document, identifier, changed, self.config.dependency_matching)
            .map(|expression| expression.anchor)
            .collect();
        debug!(identifier, affected = affected.len(), depth = self.cascade_depth, "source value changed");
        for anchor in affected {
            self.recompute_with(
                anchor,
                Trigger::SourceChanged {
                    identifier: identifier.to_owned(),
                    changed,
                },
            );
        }
    }

    /// Recompute every expression.
    pub fn on_registry_membership_changed(&mut self) {
        self.start_pass();
        for anchor in self.expressions.anchors() {
            self.recompute_with(anchor, Trigger::Membership);
        }
    }

    /// Recompute one expression and write its result.
    pub fn recompute(&mut self, anchor: ElementId) {
        self.rerun_expression(anchor);
    }

    /// Current result of the expression at `anchor`, without writing it.
    pub fn evaluate_at(&self, anchor: ElementId) -> Option<Value> {
        self.expressions
            .get(anchor)
            .map(|expression| self.evaluate_expression(expression))
    }

    pub fn sum_values_with_id(&self, identifier: &str) -> f64 {
        self.sources
            .sum(&self.document, &self.locale_resolver(), identifier)
    }

    fn defer(&mut self, task: DeferredTask) {
        if !self.pending_tasks.contains(&task) {
            self.pending_tasks.push(task);
        }
    }

    fn start_pass(&mut self) {
        if self.cascade_depth == 0 {
            self.current_pass += 1;
        }
    }

    fn evaluate_expression(&self, expression: &Expression) -> Value {
        let formula = match &expression.formula {
            Ok(formula) => formula,
            Err(error) => {
                warn!(expression = %expression.text, error = %error.message, "calculator expression does not compile");
                return Value::Number(0.0);
            }
        };
        let bindings = build_context(
            &self.document,
            &self.sources,
            expression.scope,
            self.locale_resolver(),
            formula,
        );
        match evaluate(formula, &bindings) {
            Ok(value) => value,
            Err(error) => {
                warn!(expression = %expression.text, %error, "calculator expression evaluation error");
                Value::Number(0.0)
            }
        }
    }

    fn recompute_with(&mut self, anchor: ElementId, trigger: Trigger) {
        let Some(expression) = self.expressions.get(anchor) else {
            return;
        };
        let mut value = self.evaluate_expression(expression);
        if value.is_nan() {
            value = self.config.nan_handler.handle(value);
        }

        let locale = self.locale_resolver().resolve(&self.document, anchor);
        let precision = parse_precision(self.document.attribute(anchor, &self.config.precision_attribute));
        let content = format_result(&value, self.document.kind(anchor), precision, &locale);
        let old_content = self.document.content(anchor);
        self.document.set_content(anchor, &content);

        let changed = old_content.as_deref() != Some(content.as_str());
        self.diagnostics.record(RecomputeEvent {
            pass: self.current_pass,
            anchor,
            trigger,
            old_content,
            new_content: content,
            cascade_depth: self.cascade_depth,
        });

        if !changed {
            return;
        }
        if let Some(identifier) = self.sources.get(anchor).map(|source| source.identifier.clone()) {
            self.cascade(&identifier, anchor);
        }
    }

    /// An expression anchor that is also a source feeds its new value on.
    fn cascade(&mut self, identifier: &str, anchor: ElementId) {
        if self.cascade_depth >= self.config.max_cascade_depth {
            warn!(
                identifier,
                ?anchor,
                depth = self.cascade_depth,
                "calculator cascade depth limit reached, propagation stopped"
            );
            return;
        }
        self.cascade_depth += 1;
        self.on_source_value_changed(identifier, Some(anchor));
        self.cascade_depth -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Element, MemoryDocument};

    fn engine() -> Engine<MemoryDocument> {
        Engine::with_config(MemoryDocument::new(), Config::default().with_default_locale("en-US"))
    }

    #[test]
    fn attach_expression_computes_immediately() {
        let mut engine = engine();
        let body = engine.document().root();
        let price = engine.document_mut().append(body, Element::input("number").value("4"));
        let total = engine.document_mut().append(body, Element::new("span"));
        engine.attach_source(price, "price");
        engine.attach_expression(total, "price * 2");
        assert_eq!(engine.document().content(total).as_deref(), Some("8"));
    }

    #[test]
    fn non_value_events_do_not_propagate() {
        let mut engine = engine();
        let body = engine.document().root();
        let price = engine.document_mut().append(body, Element::input("number").value("1"));
        let total = engine.document_mut().append(body, Element::new("span"));
        engine.attach_source(price, "price");
        engine.attach_expression(total, "price + 1");

        engine.document_mut().set_value(price, "5");
        assert!(!engine.dispatch(price, DocumentEvent::Focus));
        assert_eq!(engine.document().content(total).as_deref(), Some("2"));
        assert!(engine.dispatch(price, DocumentEvent::KeyUp));
        assert_eq!(engine.document().content(total).as_deref(), Some("6"));
        assert!(!engine.dispatch(total, DocumentEvent::Input));
    }

    #[test]
    fn detach_defers_recalculation() {
        let mut engine = engine();
        let body = engine.document().root();
        let a = engine.document_mut().append(body, Element::input("number").value("10"));
        let b = engine.document_mut().append(body, Element::input("number").value("20"));
        let total = engine.document_mut().append(body, Element::new("span"));
        engine.attach_source(a, "item");
        engine.attach_source(b, "item");
        engine.attach_expression(total, "sumValuesWithId('item')");
        assert_eq!(engine.document().content(total).as_deref(), Some("30"));

        engine.detach_source(b);
        engine.detach_source(a);
        assert_eq!(engine.document().content(total).as_deref(), Some("30"));
        assert!(engine.has_deferred());
        assert_eq!(engine.run_deferred(), 1);
        assert_eq!(engine.document().content(total).as_deref(), Some("0"));
        assert_eq!(engine.run_deferred(), 0);
    }

    #[test]
    fn self_referencing_cascade_is_bounded() {
        let mut engine = Engine::with_config(
            MemoryDocument::new(),
            Config::default().with_default_locale("en-US").with_max_cascade_depth(5),
        );
        let body = engine.document().root();
        let counter = engine.document_mut().append(body, Element::input("number").value("0"));
        engine.attach_source(counter, "counter");
        engine.attach_expression(counter, "counter + 1");

        // One write on attach plus one per allowed cascade level.
        assert_eq!(engine.document().content(counter).as_deref(), Some("6"));
    }

    #[test]
    fn detached_expression_is_not_recomputed() {
        let mut engine = engine();
        let body = engine.document().root();
        let price = engine.document_mut().append(body, Element::input("number").value("1"));
        let total = engine.document_mut().append(body, Element::new("span"));
        engine.attach_source(price, "price");
        engine.attach_expression(total, "price");
        engine.detach_expression(total);

        engine.document_mut().set_value(price, "9");
        engine.dispatch(price, DocumentEvent::Input);
        assert_eq!(engine.document().content(total).as_deref(), Some("1"));
        assert_eq!(engine.evaluate_at(total), None);
    }
}
