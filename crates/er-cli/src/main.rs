#![forbid(unsafe_code)]

//! ER diagram CLI - render, validate and edit ER diagram documents.
//!
//! # Commands
//!
//! - `render`: Convert a diagram document to SVG
//! - `validate`: Check connections against the notation rules
//! - `set`: Update one business-object property
//! - `resize`: Resize a shape, honoring the minimum dimensions
//! - `place`: Add a child attribute inside a container

use std::io::{self, Read, Write};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use er_core::{
    Cardinality, DiagramDocument, ElementGraph, ElementId, ErConfig, Notation, Property,
    PropertyValue, parse_er_config_value,
};
use er_modeling::{Editor, UpdateOptions};
use er_render_svg::export_diagram;
use serde::Serialize;
use tracing::{debug, info, warn};

/// ER diagram CLI - render, validate and edit ER diagram documents.
#[derive(Debug, Parser)]
#[command(
    name = "er-cli",
    version,
    about = "ER diagram CLI - render, validate and edit ER diagram documents",
    long_about = "Works on JSON diagram documents (notation plus elements).\n\n\
        Supports Chen and Crow's Foot notation, SVG export, property edits\n\
        with the same validation the editor applies, and container layout."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Editor settings as a JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NotationArg {
    Chen,
    Crowsfoot,
}

impl From<NotationArg> for Notation {
    fn from(value: NotationArg) -> Self {
        match value {
            NotationArg::Chen => Self::Chen,
            NotationArg::Crowsfoot => Self::CrowsFoot,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a diagram document to SVG.
    Render {
        /// Input file path or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Override the document notation
        #[arg(short, long, value_enum)]
        notation: Option<NotationArg>,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,

        /// Print render metadata as JSON on stderr
        #[arg(long)]
        json: bool,
    },

    /// Validate connections and stored cardinalities.
    Validate {
        /// Input file path or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON (structured diagnostics)
        #[arg(long)]
        json: bool,

        /// Exit with non-zero status on warnings (not just errors)
        #[arg(long)]
        strict: bool,
    },

    /// Set a property and write the updated document.
    Set {
        input: String,
        element: String,
        property: String,
        /// `true`, `false`, `null`, or text
        value: String,

        #[arg(short, long)]
        output: Option<String>,
    },

    /// Resize a shape and write the updated document.
    Resize {
        input: String,
        element: String,
        width: f64,
        height: f64,

        #[arg(short, long)]
        output: Option<String>,
    },

    /// Add a named attribute inside a container and write the updated document.
    Place {
        input: String,
        container: String,
        name: String,

        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            input,
            notation,
            output,
            json,
        } => cmd_render(&input, config, notation.map(Notation::from), output.as_deref(), json),

        Command::Validate {
            input,
            json,
            strict,
        } => cmd_validate(&input, config, json, strict),

        Command::Set {
            input,
            element,
            property,
            value,
            output,
        } => cmd_set(&input, config, &element, &property, &value, output.as_deref()),

        Command::Resize {
            input,
            element,
            width,
            height,
            output,
        } => cmd_resize(&input, config, &element, width, height, output.as_deref()),

        Command::Place {
            input,
            container,
            name,
            output,
        } => cmd_place(&input, config, &container, &name, output.as_deref()),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    const LEVELS: [&str; 4] = ["warn", "info", "debug", "trace"];
    let level = if quiet {
        "error"
    } else {
        LEVELS[usize::from(verbose).min(LEVELS.len() - 1)]
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

/// Read `input`, where `-` means stdin.
fn load_input(input: &str) -> Result<String> {
    if input != "-" {
        return std::fs::read_to_string(input).with_context(|| format!("cannot read {input}"));
    }
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("cannot read stdin")?;
    Ok(source)
}

fn load_config(path: Option<&str>) -> Result<ErConfig> {
    let Some(path) = path else {
        return Ok(ErConfig::default());
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("cannot read config {path}"))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("config {path} is not JSON"))?;
    let parsed = parse_er_config_value(&value);
    for warning in &parsed.warnings {
        warn!("Config warning: {warning}");
    }
    for error in &parsed.errors {
        warn!(field = %error.field, value = %error.value, "Config error: {}", error.message);
    }
    Ok(parsed.config)
}

/// Read a document; its notation replaces the configured one.
fn load_document(input: &str, mut config: ErConfig) -> Result<(ElementGraph, ErConfig)> {
    let source = load_input(input)?;
    let document: DiagramDocument =
        serde_json::from_str(&source).context("Input is not a diagram document")?;
    let (notation, graph) = document.into_graph();
    config.notation = notation;
    debug!(elements = graph.len(), notation = %notation, "Loaded document");
    Ok((graph, config))
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    let Some(path) = output else {
        return io::stdout()
            .write_all(content.as_bytes())
            .context("cannot write stdout");
    };
    std::fs::write(path, content).with_context(|| format!("cannot write {path}"))?;
    info!(path, bytes = content.len(), "output written");
    Ok(())
}

fn write_document(editor: &Editor, output: Option<&str>) -> Result<()> {
    let document = DiagramDocument::from_graph(editor.notation(), editor.graph());
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');
    write_output(output, &json)
}

// =============================================================================
// Command: render
// =============================================================================

#[derive(Debug, Serialize)]
struct RenderResult {
    notation: String,
    element_count: usize,
    connection_count: usize,
    cardinality_patches: usize,
    output_bytes: usize,
    render_time_ms: f64,
}

fn cmd_render(
    input: &str,
    config: ErConfig,
    notation: Option<Notation>,
    output: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let start = Instant::now();
    let (graph, mut config) = load_document(input, config)?;
    if let Some(notation) = notation {
        config.notation = notation;
    }

    // Redraw once so connections settle their cardinalities before export.
    let mut editor: Editor = Editor::in_memory(graph, config);
    let report = editor.redraw_all();
    let export = export_diagram(editor.renderer(), editor.graph());
    if !export.patches.is_empty() {
        warn!(pending = export.patches.len(), "Connections still need cardinality updates");
    }

    let mut svg = export.document.to_string();
    svg.push('\n');
    let elapsed = start.elapsed();

    if json_output {
        let result = RenderResult {
            notation: editor.notation().to_string(),
            element_count: editor.graph().len(),
            connection_count: editor
                .graph()
                .elements()
                .iter()
                .filter(|e| e.is_connection())
                .count(),
            cardinality_patches: report.patched,
            output_bytes: svg.len(),
            render_time_ms: elapsed.as_secs_f64() * 1000.0,
        };
        let json_str = serde_json::to_string_pretty(&result)?;
        eprintln!("{json_str}");
    }

    write_output(output, &svg)?;
    info!(
        "Rendered {} elements in {:.2}ms",
        editor.graph().len(),
        elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}

// =============================================================================
// Command: validate
// =============================================================================

#[derive(Debug, Serialize)]
struct Diagnostic {
    code: &'static str,
    element: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    notation: String,
    element_count: usize,
    connection_count: usize,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

fn validate_graph(graph: &ElementGraph, notation: Notation) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for element in graph.elements() {
        let Some(data) = element.connection.as_ref() else {
            continue;
        };
        let id = element.id.to_string();
        let (Some(source), Some(target)) = (graph.get(&data.source), graph.get(&data.target))
        else {
            errors.push(Diagnostic {
                code: "E001",
                element: id,
                message: format!("Dangling connection {} -> {}", data.source, data.target),
            });
            continue;
        };
        if element.is_parent_child() {
            continue;
        }
        let (Some(source_type), Some(target_type)) = (source.er_type(), target.er_type()) else {
            continue;
        };

        if !notation.validate_connection(source_type, target_type) {
            errors.push(Diagnostic {
                code: "E002",
                element: id.clone(),
                message: format!(
                    "{source_type} cannot connect to {target_type} in {notation} notation"
                ),
            });
        }

        let attribute_involved = source_type.is_attribute_like() || target_type.is_attribute_like();
        for property in [
            Property::CardinalitySource,
            Property::CardinalityTarget,
            Property::Cardinality,
        ] {
            let Some(value) = element.business_object.text(&property) else {
                continue;
            };
            if attribute_involved {
                warnings.push(Diagnostic {
                    code: "W002",
                    element: id.clone(),
                    message: format!("{property} is ignored on attribute connections"),
                });
            } else if Cardinality::parse(value).is_none() {
                warnings.push(Diagnostic {
                    code: "W001",
                    element: id.clone(),
                    message: format!("{property} `{value}` is not a canonical cardinality"),
                });
            }
        }
    }
    (errors, warnings)
}

fn cmd_validate(input: &str, config: ErConfig, json_output: bool, strict: bool) -> Result<()> {
    let (graph, config) = load_document(input, config)?;
    let (errors, warnings) = validate_graph(&graph, config.notation);
    let valid = errors.is_empty() && (!strict || warnings.is_empty());

    let result = ValidateResult {
        valid,
        notation: config.notation.to_string(),
        element_count: graph.len(),
        connection_count: graph.elements().iter().filter(|e| e.is_connection()).count(),
        errors,
        warnings,
    };

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        if result.valid {
            println!("✓ Valid {} diagram", result.notation);
        } else {
            println!("✗ Invalid diagram");
        }
        println!("  Elements: {}", result.element_count);
        println!("  Connections: {}", result.connection_count);

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for err in &result.errors {
                println!("  [{}] {}: {}", err.code, err.element, err.message);
            }
        }
        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &result.warnings {
                println!("  [{}] {}: {}", warning.code, warning.element, warning.message);
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}

// =============================================================================
// Commands: set, resize, place
// =============================================================================

fn cmd_set(
    input: &str,
    config: ErConfig,
    element: &str,
    property: &str,
    value: &str,
    output: Option<&str>,
) -> Result<()> {
    let (graph, config) = load_document(input, config)?;
    let mut editor: Editor = Editor::in_memory(graph, config);
    let id = ElementId::new(element);

    let outcome = editor.update_property(
        &id,
        property,
        PropertyValue::parse_literal(value),
        UpdateOptions::default(),
    );
    let result = &outcome.result;
    match (&outcome.written, result.success) {
        (None, _) => bail!(
            "{}: {}",
            result.code.map_or("ERROR", |code| code.as_str()),
            result.message
        ),
        (Some(written), false) => warn!(
            code = result.code.map_or("", |code| code.as_str()),
            stored = %written,
            "{}",
            result.message
        ),
        (Some(written), true) => info!(element, property, stored = %written, "Property updated"),
    }

    editor.flush();
    write_document(&editor, output)
}

fn cmd_resize(
    input: &str,
    config: ErConfig,
    element: &str,
    width: f64,
    height: f64,
    output: Option<&str>,
) -> Result<()> {
    let (graph, config) = load_document(input, config)?;
    let mut editor: Editor = Editor::in_memory(graph, config);

    let result = editor.resize_shape(&ElementId::new(element), width, height);
    if !result.success {
        bail!(
            "{}: {}",
            result.code.map_or("ERROR", |code| code.as_str()),
            result.message
        );
    }
    editor.flush();
    write_document(&editor, output)
}

fn cmd_place(
    input: &str,
    config: ErConfig,
    container: &str,
    name: &str,
    output: Option<&str>,
) -> Result<()> {
    let (graph, config) = load_document(input, config)?;
    let mut editor: Editor = Editor::in_memory(graph, config);

    let child = editor
        .place_child_attribute(&ElementId::new(container), name)
        .context(format!("Failed to place `{name}` in {container}"))?;
    info!(container, child = %child, "Placed child attribute");
    editor.flush();
    write_document(&editor, output)
}

#[cfg(test)]
mod tests {
    use er_core::{Bounds, Element, ErType, Point};

    use super::*;

    fn graph(link_source: &str, link_target: &str) -> ElementGraph {
        ElementGraph::from_elements(vec![
            Element::shape("E", ErType::Entity, Bounds::new(0.0, 0.0, 120.0, 60.0)),
            Element::shape("F", ErType::Entity, Bounds::new(300.0, 0.0, 120.0, 60.0)),
            Element::shape("R", ErType::Relationship, Bounds::new(150.0, 0.0, 100.0, 60.0)),
            Element::connection(
                "L",
                link_source,
                link_target,
                vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            ),
        ])
    }

    #[test]
    fn entity_pairs_are_errors_only_in_chen() {
        let (errors, _) = validate_graph(&graph("E", "F"), Notation::Chen);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "E002");

        let (errors, _) = validate_graph(&graph("E", "F"), Notation::CrowsFoot);
        assert!(errors.is_empty());
    }

    #[test]
    fn dangling_links_are_reported() {
        let (errors, _) = validate_graph(&graph("E", "missing"), Notation::Chen);
        assert_eq!(errors[0].code, "E001");
    }

    #[test]
    fn non_canonical_cardinalities_warn() {
        let mut graph = graph("E", "R");
        graph
            .get_mut(&ElementId::new("L"))
            .expect("link")
            .business_object
            .cardinality_source = Some(String::from("muitos"));
        let (errors, warnings) = validate_graph(&graph, Notation::Chen);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "W001");
    }

    #[test]
    fn notation_arg_maps_onto_notation() {
        assert_eq!(Notation::from(NotationArg::Crowsfoot), Notation::CrowsFoot);
        assert_eq!(Notation::from(NotationArg::Chen), Notation::Chen);
    }
}
