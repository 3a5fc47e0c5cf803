use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use calcwire::locale::{format_fixed, format_locale_number};
use calcwire::value::number_to_string;
use calcwire::{
    Bindings, Config, Document, Element, ElementId, Engine, Formula, MemoryDocument, Value, evaluate,
    try_parse_locale_number,
};
use clap::{Parser as ClapParser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "calcwire")]
#[command(about = "Reactive calculator CLI")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse locale-formatted text into a number
    Parse {
        text: String,
        #[arg(long)]
        locale: Option<String>,
    },
    /// Format a number for a locale, or plainly for an input field
    Format {
        #[arg(allow_hyphen_values = true)]
        value: f64,
        #[arg(long, default_value = "en-US")]
        locale: String,
        /// Exact number of fraction digits
        #[arg(long)]
        precision: Option<usize>,
        /// Plain `toFixed` text as written into input fields
        #[arg(long)]
        plain: bool,
    },
    /// Evaluate a formula against variables given on the command line
    Eval {
        formula: String,
        /// `name=value`; repeating a name binds a list
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },
    /// Check that every formula in a file compiles, one per line
    Check { file: PathBuf },
    /// Mount a page described in JSON and print every expression's result
    Run {
        /// Path to the page JSON
        file: PathBuf,
        /// Path to a calculator config JSON
        #[arg(long)]
        config: Option<PathBuf>,
        /// Locale used when the page names none
        #[arg(long)]
        locale: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Parse { text, locale } => parse_text(&text, locale.as_deref(), cli.json),
        Commands::Format {
            value,
            locale,
            precision,
            plain,
        } => {
            format_value(value, &locale, precision, plain, cli.json);
            Ok(())
        }
        Commands::Eval { formula, vars } => eval_formula(&formula, &vars, cli.json),
        Commands::Check { file } => check_file(&file, cli.json),
        Commands::Run { file, config, locale } => run_page(&file, config.as_deref(), locale, cli.json),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn parse_text(text: &str, locale: Option<&str>, json: bool) -> Result<(), String> {
    let parsed = try_parse_locale_number(text, locale);
    if json {
        #[derive(Serialize)]
        struct Parsed<'a> {
            text: &'a str,
            value: Option<f64>,
            error: Option<String>,
        }
        return print_json(&Parsed {
            text,
            value: parsed.as_ref().ok().copied(),
            error: parsed.as_ref().err().map(ToString::to_string),
        });
    }
    match parsed {
        Ok(value) => {
            println!("{}", number_to_string(value));
            Ok(())
        }
        Err(e) => Err(format!("'{text}' is not a number: {e}")),
    }
}

fn format_value(value: f64, locale: &str, precision: Option<usize>, plain: bool, json: bool) {
    let text = match (plain, precision) {
        (true, Some(digits)) => format_fixed(value, digits),
        (true, None) => number_to_string(value),
        (false, digits) => format_locale_number(value, locale, digits),
    };
    if json {
        println!("{}", serde_json::Value::String(text));
    } else {
        println!("{text}");
    }
}

fn parse_vars(vars: &[String]) -> Result<BTreeMap<String, Vec<f64>>, String> {
    let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for var in vars {
        let (name, value) = var
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{var}'"))?;
        let number = try_parse_locale_number(value, Some("en-US"))
            .map_err(|e| format!("variable '{name}': {e}"))?;
        values.entry(name.trim().to_owned()).or_default().push(number);
    }
    Ok(values)
}

fn eval_formula(text: &str, vars: &[String], json: bool) -> Result<(), String> {
    let formula = Formula::compile(text).map_err(|e| e.report)?;
    let values = parse_vars(vars)?;
    debug!(formula = %formula, variables = values.len(), "evaluating");

    let mut bindings = Bindings::new().with_sum_values_with_id(|name| {
        values.get(name).map_or(0.0, |numbers| numbers.iter().sum())
    });
    for (name, numbers) in &values {
        let value = match numbers.as_slice() {
            [single] => Value::Number(*single),
            _ => Value::List(numbers.clone()),
        };
        bindings.bind(name.clone(), value);
    }

    let value = evaluate(&formula, &bindings).map_err(|e| e.to_string())?;
    if json {
        print_json(&value)
    } else {
        println!("{value}");
        Ok(())
    }
}

fn check_file(file: &Path, json: bool) -> Result<(), String> {
    let content = fs::read_to_string(file).map_err(|e| format!("Error reading {}: {e}", file.display()))?;
    eprintln!("Checking: {}", file.display());

    #[derive(Serialize)]
    struct Checked<'a> {
        line: usize,
        formula: &'a str,
        references: Vec<String>,
        error: Option<String>,
    }

    let mut checked = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let formula = line.trim();
        if formula.is_empty() || formula.starts_with('#') {
            continue;
        }
        let (references, error) = match Formula::compile(formula) {
            Ok(compiled) => (compiled.referenced_names().map(str::to_owned).collect(), None),
            Err(e) => {
                if !json {
                    eprintln!("line {}:\n{}", index + 1, e.report);
                }
                (Vec::new(), Some(e.message))
            }
        };
        checked.push(Checked {
            line: index + 1,
            formula,
            references,
            error,
        });
    }

    let failed = checked.iter().filter(|entry| entry.error.is_some()).count();
    if json {
        print_json(&checked)?;
    } else {
        for entry in checked.iter().filter(|entry| entry.error.is_none()) {
            println!("{}: {} [{}]", entry.line, entry.formula, entry.references.join(", "));
        }
        eprintln!("{} formulas: {} ok, {} failed", checked.len(), checked.len() - failed, failed);
    }
    if failed > 0 {
        return Err(format!("{failed} formula(s) do not compile"));
    }
    Ok(())
}

/// One element of a page file. Inputs take their `value` and `checked`
/// state from `attributes`, as in HTML.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PageElement {
    tag: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    children: Vec<PageElement>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Page {
    /// Attributes of the root `body`, e.g. a page-wide locale.
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    children: Vec<PageElement>,
}

impl PageElement {
    fn into_element(self) -> Element {
        let mut element = Element::new(self.tag);
        for (name, value) in self.attributes {
            element = element.attr(name, value);
        }
        if let Some(text) = self.text {
            element = element.text(text);
        }
        self.children
            .into_iter()
            .fold(element, |element, child| element.child(child.into_element()))
    }
}

#[derive(Serialize)]
struct Rendered {
    id: Option<String>,
    expression: String,
    content: String,
}

fn run_page(file: &Path, config: Option<&Path>, locale: Option<String>, json: bool) -> Result<(), String> {
    let page_text = fs::read_to_string(file).map_err(|e| format!("Error reading {}: {e}", file.display()))?;
    let page: Page = serde_json::from_str(&page_text).map_err(|e| format!("{}: {e}", file.display()))?;

    let mut config = match config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
            Config::from_json_str(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(locale) = locale {
        config = config.with_default_locale(locale);
    }

    let mut document = MemoryDocument::new();
    let body = document.root();
    for (name, value) in &page.attributes {
        document.set_attribute(body, name, value);
    }
    for child in page.children {
        document.append(body, child.into_element());
    }

    let mut engine = Engine::with_config(document, config);
    engine.install();
    engine.mount(body);
    if engine.has_deferred() {
        engine.run_deferred();
    }

    let rendered: Vec<Rendered> = engine
        .expressions()
        .iter()
        .map(|expression| render(&engine, expression.anchor, &expression.text))
        .collect();
    let failed = engine
        .expressions()
        .iter()
        .filter(|expression| expression.formula.is_err())
        .count();
    if failed > 0 {
        error!(failed, "some expressions do not compile");
    }
    debug!(sources = engine.sources().len(), expressions = rendered.len(), "page mounted");

    if json {
        return print_json(&rendered);
    }
    for entry in &rendered {
        let label = entry.id.as_deref().unwrap_or(entry.expression.as_str());
        println!("{label} = {}", entry.content);
    }
    Ok(())
}

fn render(engine: &Engine<MemoryDocument>, anchor: ElementId, expression: &str) -> Rendered {
    let document = engine.document();
    Rendered {
        id: document.attribute(anchor, "id").map(str::to_owned),
        expression: expression.to_owned(),
        content: document.content(anchor).unwrap_or_default(),
    }
}
