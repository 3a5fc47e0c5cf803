//! Reactive, locale-aware calculations bound to document elements.
//!
//! Elements register as named numeric *sources*; other elements carry
//! *expressions* over those names. When a source changes, every expression
//! that may read it is re-evaluated and its formatted result written back.
//!
//! ```
//! use calcwire::{Config, Document, Element, Engine, MemoryDocument};
//!
//! let mut document = MemoryDocument::new();
//! let body = document.root();
//! document.append(body, Element::input("number").value("4").attr("x-calculator-source", "price"));
//! let total = document.append(body, Element::new("span").attr("x-calculator-expression", "price * 2"));
//!
//! let mut engine = Engine::with_config(document, Config::default().with_default_locale("en-US"));
//! engine.mount(body);
//! assert_eq!(engine.document().content(total).as_deref(), Some("8"));
//! ```

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod locale;
pub mod parser;
pub mod registry;
pub mod scope;
pub mod value;

pub use config::{Config, DependencyMatching, NanHandler};
pub use document::{Document, DocumentEvent, Element, ElementId, ElementKind, MemoryDocument};
pub use engine::Engine;
pub use error::{ConfigError, EvalError, FormulaError, NumberParseError};
pub use evaluator::{Bindings, evaluate};
pub use locale::{parse_locale_number, try_parse_locale_number};
pub use parser::Formula;
pub use scope::ScopeBoundary;
pub use value::Value;
