//! Graph export
//!
//! Serializes a `ParseGraph` as N-Triples or JSON. Output is rendered
//! fully in memory and written through a temporary file that is persisted
//! over the destination, so a failed run never leaves a partial file.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::builder::{BuildSummary, ParseGraph};
use envcond_core::{EnvcondError, OutputConfig, OutputFormat, ParseComponent, Result};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";

/// Render the graph in the configured format
pub fn render(graph: &ParseGraph, config: &OutputConfig) -> Result<String> {
    match config.format {
        OutputFormat::NTriples => Ok(to_ntriples(graph, config)),
        OutputFormat::Json => to_json(graph),
    }
}

// ============================================================================
// N-Triples
// ============================================================================

/// Export to N-Triples format
pub fn to_ntriples(graph: &ParseGraph, config: &OutputConfig) -> String {
    let base = &config.base_iri;
    let vocab = |name: &str| format!("{base}{name}");
    let mut out = String::new();

    for group in &graph.groups {
        let group_iri = format!("{base}group/{}", group.id);
        push_iri(&mut out, &group_iri, RDF_TYPE, &vocab("ParseGroup"));
        push_literal(&mut out, &group_iri, &vocab("raw_text"), &group.raw_text);

        for (index, component) in group.components.iter().enumerate() {
            let component_iri = format!("{group_iri}/component/{index}");
            push_iri(&mut out, &group_iri, &vocab("has_parse_component"), &component_iri);
            push_iri(&mut out, &component_iri, RDF_TYPE, &vocab("ParseComponent"));
            push_component(&mut out, &component_iri, component, &vocab);
        }
    }

    for edge in &graph.edges {
        let group_iri = format!("{base}group/{}", edge.group);
        push_iri(
            &mut out,
            &expand_iri(&edge.subject, config),
            &expand_iri(&edge.predicate, config),
            &group_iri,
        );
    }

    out
}

fn push_component<F>(out: &mut String, iri: &str, component: &ParseComponent, vocab: &F)
where
    F: Fn(&str) -> String,
{
    push_literal(out, iri, &vocab("component_text"), component.component_text());

    let numbers = [
        ("minimum_value", component.minimum_value()),
        ("maximum_value", component.maximum_value()),
        ("spot_value", component.spot_value()),
    ];
    for (name, value) in numbers {
        if let Some(value) = value {
            push_decimal(out, iri, &vocab(name), value);
        }
    }

    let texts = [
        ("unit", component.unit()),
        ("qualifier_label", component.qualifier_label().map(|q| q.as_str())),
        ("categorical_label", component.categorical_label()),
        ("unparsed_text", component.unparsed_text()),
    ];
    for (name, value) in texts {
        if let Some(value) = value {
            push_literal(out, iri, &vocab(name), value);
        }
    }
}

fn push_iri(out: &mut String, subject: &str, predicate: &str, object: &str) {
    let _ = writeln!(
        out,
        "<{}> <{}> <{}> .",
        escape_iri(subject),
        escape_iri(predicate),
        escape_iri(object)
    );
}

fn push_literal(out: &mut String, subject: &str, predicate: &str, value: &str) {
    let _ = writeln!(
        out,
        "<{}> <{}> \"{}\" .",
        escape_iri(subject),
        escape_iri(predicate),
        escape_literal(value)
    );
}

fn push_decimal(out: &mut String, subject: &str, predicate: &str, value: f64) {
    let _ = writeln!(
        out,
        "<{}> <{}> \"{}\"^^<{XSD_DECIMAL}> .",
        escape_iri(subject),
        escape_iri(predicate),
        format_decimal(value)
    );
}

/// Lexical xsd:decimal form; `f64` display never uses exponent notation
fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

/// Expand a CURIE or bare term into an absolute IRI
pub fn expand_iri(term: &str, config: &OutputConfig) -> String {
    let term = term.trim();
    if term.starts_with("http://") || term.starts_with("https://") || term.starts_with("urn:") {
        return term.to_string();
    }
    if let Some((prefix, local)) = term.split_once(':') {
        if let Some(namespace) = config.prefixes.get(prefix) {
            return format!("{namespace}{local}");
        }
    }
    format!("{}term/{}", config.base_iri, percent_encode(term))
}

fn percent_encode(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | ':') {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

/// Escape characters N-Triples forbids inside `<...>`
fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | ' ' => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonGraph<'a> {
    groups: &'a [envcond_core::ParseGroup],
    edges: &'a [envcond_core::Edge],
    summary: &'a BuildSummary,
}

/// Export to pretty-printed JSON
pub fn to_json(graph: &ParseGraph) -> Result<String> {
    let doc = JsonGraph {
        groups: &graph.groups,
        edges: &graph.edges,
        summary: &graph.summary,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| EnvcondError::SerializationError(e.to_string()))
}

// ============================================================================
// Atomic write
// ============================================================================

/// Write `contents` to `path` via a temporary file in the same directory
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_error = |source: std::io::Error| EnvcondError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(contents.as_bytes()).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use envcond_core::{GroupKeyMode, NoMatchPolicy, RawTriple};
    use envcond_extractor::{ComponentAssembler, FactorProfile};

    fn graph(rows: &[(&str, &str, &str)]) -> ParseGraph {
        let assembler =
            ComponentAssembler::new(&FactorProfile::temperature(), NoMatchPolicy::WholeText)
                .unwrap();
        let mut builder = GraphBuilder::new(assembler, GroupKeyMode::RawText);
        for (i, (s, p, t)) in rows.iter().enumerate() {
            builder.add_triple(&RawTriple::new(*s, *p, *t, i + 1));
        }
        builder.build()
    }

    #[test]
    fn test_ntriples_range_group() {
        let graph = graph(&[("NCBITaxon:562", "METPO:2000303", "20-30°C")]);
        let config = OutputConfig::default();
        let nt = to_ntriples(&graph, &config);
        let group_iri = format!("https://w3id.org/envcond/group/{}", graph.groups[0].id);

        assert!(nt.contains(&format!(
            "<{group_iri}> <{RDF_TYPE}> <https://w3id.org/envcond/ParseGroup> ."
        )));
        assert!(nt.contains(&format!(
            "<{group_iri}/component/0> <https://w3id.org/envcond/minimum_value> \"20\"^^<{XSD_DECIMAL}> ."
        )));
        assert!(nt.contains(&format!(
            "<{group_iri}/component/0> <https://w3id.org/envcond/unit> \"Cel\" ."
        )));
        assert!(nt.contains(&format!(
            "<http://purl.obolibrary.org/obo/NCBITaxon_562> <http://purl.obolibrary.org/obo/METPO_2000303> <{group_iri}> ."
        )));
        assert!(!nt.contains("spot_value"));
        assert!(!nt.contains("unparsed_text"));
        assert!(nt.lines().all(|line| line.ends_with(" .")));
    }

    #[test]
    fn test_ntriples_escapes_literals() {
        let graph = graph(&[("s", "p", "said \"hot\"\\warm")]);
        let nt = to_ntriples(&graph, &OutputConfig::default());
        assert!(nt.contains(r#""said \"hot\"\\warm""#));
    }

    #[test]
    fn test_expand_iri() {
        let config = OutputConfig::default();
        assert_eq!(
            expand_iri("NCBITaxon:1423", &config),
            "http://purl.obolibrary.org/obo/NCBITaxon_1423"
        );
        assert_eq!(
            expand_iri("https://example.org/x", &config),
            "https://example.org/x"
        );
        assert_eq!(
            expand_iri("Bacillus subtilis", &config),
            "https://w3id.org/envcond/term/Bacillus%20subtilis"
        );
        assert_eq!(
            expand_iri("unknown:thing", &config),
            "https://w3id.org/envcond/term/unknown:thing"
        );
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(20.0), "20");
        assert_eq!(format_decimal(-5.5), "-5.5");
        assert_eq!(format_decimal(-0.0), "0");
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let graph = graph(&[("s", "p", "above 45°C"), ("t", "p", "above 45°C")]);
        let json: serde_json::Value = serde_json::from_str(&to_json(&graph).unwrap()).unwrap();

        let component = &json["groups"][0]["components"][0];
        assert_eq!(component["spot_value"], serde_json::json!(45.0));
        assert_eq!(component["qualifier_label"], "minimum");
        assert!(component.get("minimum_value").is_none());
        assert_eq!(json["edges"].as_array().unwrap().len(), 2);
        assert_eq!(json["summary"]["groups_reused"], 1);
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nt");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, "new contents\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new contents\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_missing_directory() {
        let result = write_atomic(Path::new("/nonexistent/dir/out.nt"), "x");
        assert!(matches!(result, Err(EnvcondError::Io { .. })));
    }
}
