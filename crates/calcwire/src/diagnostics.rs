//! Diagnostics for the engine.
//!
//! Records recomputations so "why did this element change?" can be answered.

use crate::document::ElementId;

/// What caused a recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The expression was just attached.
    Attached,
    /// The host re-ran the expression.
    Rerun,
    /// A source was registered or unregistered.
    Membership,
    /// A source value changed, at `changed` when known.
    SourceChanged {
        identifier: String,
        changed: Option<ElementId>,
    },
}

/// A recorded recomputation
#[derive(Debug, Clone)]
pub struct RecomputeEvent {
    pub pass: u64,
    pub anchor: ElementId,
    pub trigger: Trigger,
    pub old_content: Option<String>,
    pub new_content: String,
    pub cascade_depth: usize,
}

impl RecomputeEvent {
    pub fn changed(&self) -> bool {
        self.old_content.as_deref() != Some(self.new_content.as_str())
    }
}

/// Passes kept by default before older events are dropped.
pub const DEFAULT_RETAINED_PASSES: u64 = 64;

/// Diagnostics context for the engine
///
/// Only the events of the last `retained_passes` passes are kept.
#[derive(Debug)]
pub struct DiagnosticsContext {
    /// Enable detailed tracking
    pub enabled: bool,
    pub events: Vec<RecomputeEvent>,
    retained_passes: u64,
}

impl Default for DiagnosticsContext {
    fn default() -> Self {
        Self { enabled: false, events: Vec::new(), retained_passes: DEFAULT_RETAINED_PASSES }
    }
}

impl DiagnosticsContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the events of at most `passes` passes, at least one.
    pub fn with_retained_passes(mut self, passes: u64) -> Self {
        self.set_retained_passes(passes);
        self
    }

    pub fn set_retained_passes(&mut self, passes: u64) {
        self.retained_passes = passes.max(1);
        if let Some(latest) = self.events.last().map(|event| event.pass) {
            self.evict_before(latest);
        }
    }

    pub fn retained_passes(&self) -> u64 {
        self.retained_passes
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn record(&mut self, event: RecomputeEvent) {
        if self.enabled {
            let pass = event.pass;
            self.events.push(event);
            self.evict_before(pass);
        }
    }

    fn evict_before(&mut self, latest: u64) {
        let oldest = latest.saturating_sub(self.retained_passes - 1);
        if self.events.first().is_some_and(|event| event.pass < oldest) {
            self.events.retain(|event| event.pass >= oldest);
        }
    }

    pub fn events_in_pass(&self, pass: u64) -> Vec<&RecomputeEvent> {
        self.events.iter().filter(|event| event.pass == pass).collect()
    }

    /// Last recomputation of `anchor` during `pass` that changed its content.
    pub fn why_did_change(&self, anchor: ElementId, pass: u64) -> Option<&RecomputeEvent> {
        self.events
            .iter()
            .rev()
            .find(|event| event.pass == pass && event.anchor == anchor && event.changed())
    }

    /// The change of `anchor`, then the changes of the sources that caused
    /// it, following cascades back to where the pass started.
    pub fn change_chain(&self, anchor: ElementId, pass: u64) -> Vec<&RecomputeEvent> {
        let mut chain = Vec::new();
        let mut next = Some(anchor);
        while let Some(current) = next.take() {
            if chain.iter().any(|event: &&RecomputeEvent| event.anchor == current) {
                break;
            }
            let Some(event) = self.why_did_change(current, pass) else {
                break;
            };
            if let Trigger::SourceChanged { changed, .. } = &event.trigger {
                next = *changed;
            }
            chain.push(event);
        }
        chain
    }
}
