//! RDF parsing and serialization.
//!
//! Turtle and N-Triples go through `oxttl`, JSON-LD (expanded or compacted
//! with an inline `@context`) through `oxjsonld`. A resource is a single
//! graph, so JSON-LD named graphs are refused.
//!
//! Every parse failure is reported as [`LdpError::MalformedBody`]: once a
//! format has been selected, an unreadable body is the client's problem.

use crate::core::error::{LdpError, Result};
use crate::core::types::vocab::{dcterms, ldp, server};
use oxjsonld::{JsonLdParser, JsonLdSerializer};
use oxrdf::{GraphNameRef, NamedNode, Triple};
use oxttl::{NTriplesParser, NTriplesSerializer, TurtleParser, TurtleSerializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Serializations the server can read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RdfFormat {
    Turtle,
    #[serde(alias = "n-triples")]
    NTriples,
    #[serde(alias = "json-ld")]
    JsonLd,
}

impl RdfFormat {
    pub const ALL: [RdfFormat; 3] = [RdfFormat::Turtle, RdfFormat::JsonLd, RdfFormat::NTriples];

    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::NTriples => "application/n-triples",
            RdfFormat::JsonLd => "application/ld+json",
        }
    }

    /// Map a media type essence (lowercase, no parameters) to a format.
    #[must_use]
    pub fn from_media_type(essence: &str) -> Option<Self> {
        match essence {
            "text/turtle" | "application/x-turtle" => Some(RdfFormat::Turtle),
            "application/n-triples" => Some(RdfFormat::NTriples),
            "application/ld+json" => Some(RdfFormat::JsonLd),
            _ => None,
        }
    }

    /// `Content-Type` value for responses.
    #[must_use]
    pub fn content_type(self) -> String {
        match self {
            RdfFormat::JsonLd => self.media_type().to_string(),
            _ => format!("{}; charset=utf-8", self.media_type()),
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RdfFormat::Turtle => "turtle",
            RdfFormat::NTriples => "ntriples",
            RdfFormat::JsonLd => "jsonld",
        };
        f.write_str(name)
    }
}

/// Parse `body` in `format`, resolving relative IRIs against `base`.
///
/// # Errors
///
/// [`LdpError::MalformedBody`] on any syntax error.
pub fn parse(body: &[u8], format: RdfFormat, base: &NamedNode) -> Result<Vec<Triple>> {
    match format {
        RdfFormat::Turtle => {
            let parser = TurtleParser::new()
                .with_base_iri(base.as_str())
                .map_err(|e| LdpError::InvalidUri(format!("{}: {}", base.as_str(), e)))?;
            parser
                .for_reader(body)
                .map(|r| r.map_err(|e| LdpError::MalformedBody(format!("Turtle: {}", e))))
                .collect()
        }
        RdfFormat::NTriples => NTriplesParser::new()
            .for_reader(body)
            .map(|r| r.map_err(|e| LdpError::MalformedBody(format!("N-Triples: {}", e))))
            .collect(),
        RdfFormat::JsonLd => {
            let parser = JsonLdParser::new()
                .with_base_iri(base.as_str())
                .map_err(|e| LdpError::InvalidUri(format!("{}: {}", base.as_str(), e)))?;
            parser
                .for_slice(body)
                .map(|r| {
                    let quad = r.map_err(|e| LdpError::MalformedBody(format!("JSON-LD: {}", e)))?;
                    if !quad.graph_name.is_default_graph() {
                        return Err(LdpError::MalformedBody(
                            "JSON-LD: named graphs are not supported".into(),
                        ));
                    }
                    Ok(Triple::from(quad))
                })
                .collect()
        }
    }
}

/// Serialize `statements` in `format`.
///
/// # Errors
///
/// [`LdpError::Io`] if the underlying writer fails.
pub fn serialize(statements: &[Triple], format: RdfFormat) -> Result<Vec<u8>> {
    match format {
        RdfFormat::Turtle => {
            let mut writer = TurtleSerializer::new()
                .with_prefix("ldp", ldp::NAMESPACE)
                .and_then(|s| s.with_prefix("dcterms", dcterms::NAMESPACE))
                .and_then(|s| s.with_prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"))
                .and_then(|s| s.with_prefix("xsd", "http://www.w3.org/2001/XMLSchema#"))
                .and_then(|s| s.with_prefix("srv", server::NAMESPACE))
                .map_err(|e| LdpError::Internal(format!("invalid prefix: {}", e)))?
                .for_writer(Vec::new());
            for triple in statements {
                writer.serialize_triple(triple)?;
            }
            Ok(writer.finish()?)
        }
        RdfFormat::NTriples => {
            let mut writer = NTriplesSerializer::new().for_writer(Vec::new());
            for triple in statements {
                writer.serialize_triple(triple)?;
            }
            Ok(writer.finish())
        }
        RdfFormat::JsonLd => {
            let mut writer = JsonLdSerializer::new().for_writer(Vec::new());
            for triple in statements {
                writer.serialize_quad(triple.as_ref().in_graph(GraphNameRef::DefaultGraph))?;
            }
            Ok(writer.finish()?)
        }
    }
}
