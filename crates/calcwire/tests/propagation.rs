//! Recomputation when sources change, appear or disappear, including
//! cascades through expressions that are themselves sources.

mod common;

use calcwire::diagnostics::Trigger;
use calcwire::{Config, DependencyMatching, Document, DocumentEvent, Element, Value};
use common::*;

#[test]
fn typing_updates_dependents() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, number_source("qty", "2").attr("id", "qty"));
        document.append(body, number_source("price", "2"));
        document.append(body, display("total", "qty * price"));
    });
    assert_eq!(page.content("total"), "4");

    page.type_into("qty", "5");
    assert_eq!(page.content("total"), "10");
}

#[test]
fn precision_rounds_display() {
    let page = TestPage::new(|document, body| {
        document.append(body, number_source("x", "5.554"));
        document.append(body, display("result", "x").attr(PRECISION, "2"));
        document.append(body, display("whole", "x").attr(PRECISION, "0"));
    });

    assert_eq!(page.content("result"), "5.55");
    assert_eq!(page.content("whole"), "6");
}

#[test]
fn nan_handler_replaces_invalid_results() {
    let config = Config::default()
        .with_default_locale("en-US")
        .with_nan_handler(|_| Value::Text("Invalid".into()));
    let mut page = TestPage::with_config(config, |document, body| {
        document.append(body, number_source("val", "0").attr("id", "val"));
        document.append(body, display("result", "0 / val"));
    });
    assert_eq!(page.content("result"), "Invalid");

    page.type_into("val", "4");
    assert_eq!(page.content("result"), "0");
}

#[test]
fn nan_without_handler_is_written_as_nan() {
    let page = TestPage::new(|document, body| {
        document.append(body, number_source("val", "0"));
        document.append(body, display("result", "0 / val"));
    });

    assert_eq!(page.content("result"), "NaN");
}

#[test]
fn source_attached_after_expression_triggers_recompute() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, display("total", "sumValuesWithId('item')"));
    });
    assert_eq!(page.content("total"), "0");

    let body = page.engine.document().root();
    let item = page.engine.document_mut().append(body, number_source("item", "7"));
    page.engine.attach_source(item, "item");
    assert_eq!(page.content("total"), "7");
}

#[test]
fn removing_a_source_recalculates_on_the_next_turn() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, number_source("item", "10"));
        document.append(body, number_source("item", "20").attr("id", "second"));
        document.append(body, display("total", "sumValuesWithId('item')"));
    });
    assert_eq!(page.content("total"), "30");

    let second = page.id("second");
    page.engine.unmount(second);
    page.engine.document_mut().remove(second);
    assert_eq!(page.content("total"), "30");

    assert_eq!(page.engine.run_deferred(), 1);
    assert_eq!(page.content("total"), "10");
}

#[test]
fn sum_with_no_sources_shows_unsigned_zero() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, number_source("item", "4").attr("id", "only"));
        document.append(body, display("total", "sumValuesWithId('item')"));
        document.append(body, display("none", "sumValuesWithId('missing')"));
    });
    assert_eq!(page.content("none"), "0");
    assert_eq!(page.content("total"), "4");

    let only = page.id("only");
    page.engine.unmount(only);
    page.engine.document_mut().remove(only);
    page.engine.run_deferred();
    assert_eq!(page.content("total"), "0");
}

#[test]
fn cascade_through_intermediate_source() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, number_source("base", "2").attr("id", "base"));
        document.append(
            body,
            Element::input("number")
                .attr("id", "doubled")
                .attr(SOURCE, "doubled")
                .attr(EXPRESSION, "base * 2"),
        );
        document.append(body, display("final", "doubled + 1"));
    });
    assert_eq!(page.content("final"), "5");

    page.engine.diagnostics_mut().enable();
    page.type_into("base", "10");
    assert_eq!(page.content("doubled"), "20");
    assert_eq!(page.content("final"), "21");

    let pass = page.engine.current_pass();
    let final_anchor = page.id("final");
    let doubled = page.id("doubled");
    let reason = page
        .engine
        .diagnostics()
        .why_did_change(final_anchor, pass)
        .expect("final changed in the last pass");
    assert_eq!(reason.cascade_depth, 1);
    assert!(matches!(
        &reason.trigger,
        Trigger::SourceChanged { identifier, changed: Some(anchor) }
            if identifier == "doubled" && *anchor == doubled
    ));

    let chain = page.engine.diagnostics().change_chain(final_anchor, pass);
    let anchors: Vec<_> = chain.iter().map(|event| event.anchor).collect();
    assert_eq!(anchors, vec![final_anchor, doubled]);
}

#[test]
fn self_referencing_cascade_is_bounded() {
    let config = Config::default()
        .with_default_locale("en-US")
        .with_max_cascade_depth(3);
    let page = TestPage::with_config(config, |document, body| {
        document.append(
            body,
            Element::input("number")
                .attr("id", "loop")
                .attr(SOURCE, "loop")
                .value("0")
                .attr(EXPRESSION, "loop + 1"),
        );
    });

    let value: f64 = page.content("loop").parse().unwrap();
    assert!(value >= 1.0 && value <= 10.0, "cascade ran away: {value}");
}

#[test]
fn substring_matching_over_approximates() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, number_source("price", "1").attr("id", "price"));
        document.append(body, number_source("priceTotal", "5"));
        document.append(body, display("total", "priceTotal"));
    });
    page.engine.diagnostics_mut().enable();

    page.type_into("price", "2");
    let pass = page.engine.current_pass();
    assert_eq!(page.engine.diagnostics().events_in_pass(pass).len(), 1);
    assert_eq!(page.content("total"), "5");
}

#[test]
fn referenced_matching_skips_unrelated_expressions() {
    let config = Config::default()
        .with_default_locale("en-US")
        .with_dependency_matching(DependencyMatching::Referenced);
    let mut page = TestPage::with_config(config, |document, body| {
        document.append(body, number_source("price", "1").attr("id", "price"));
        document.append(body, number_source("priceTotal", "5"));
        document.append(body, display("total", "priceTotal"));
        document.append(body, display("double", "price * 2"));
    });
    page.engine.diagnostics_mut().enable();

    page.type_into("price", "3");
    let pass = page.engine.current_pass();
    let events = page.engine.diagnostics().events_in_pass(pass);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].anchor, page.id("double"));
    assert_eq!(page.content("double"), "6");
}

#[test]
fn focus_does_not_recompute() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, number_source("a", "1").attr("id", "a"));
        document.append(body, display("out", "a"));
    });
    let a = page.id("a");
    page.engine.document_mut().set_value(a, "9");
    assert!(!page.engine.dispatch(a, DocumentEvent::Focus));
    assert!(!page.engine.dispatch(a, DocumentEvent::Blur));
    assert_eq!(page.content("out"), "1");

    assert!(page.engine.dispatch(a, DocumentEvent::Change));
    assert_eq!(page.content("out"), "9");
}

#[test]
fn repeated_identifiers_bind_a_list() {
    let page = TestPage::new(|document, body| {
        document.append(body, number_source("item", "3"));
        document.append(body, number_source("item", "8"));
        document.append(body, display("largest", "max(item)"));
        document.append(body, display("smallest", "min(item)"));
    });

    assert_eq!(page.content("largest"), "8");
    assert_eq!(page.content("smallest"), "3");
}

#[test]
fn rerun_reads_current_values() {
    let mut page = TestPage::new(|document, body| {
        document.append(body, number_source("a", "1").attr("id", "a"));
        document.append(body, display("out", "a * 10"));
    });
    let a = page.id("a");
    page.engine.document_mut().set_value(a, "4");
    assert_eq!(page.content("out"), "10");

    let out = page.id("out");
    assert_eq!(page.engine.evaluate_at(out), Some(Value::Number(40.0)));
    page.engine.rerun_expression(out);
    assert_eq!(page.content("out"), "40");
}
