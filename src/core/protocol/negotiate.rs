//! Content negotiation for RDF representations.
//!
//! Output selection matches the client's `Accept` preferences against a
//! ranked server offer list. Each offer scores `client q * server q`, where
//! the client q comes from the most specific matching range
//! (`type/sub` beats `type/*` beats `*/*`). The highest positive score
//! wins; ties go to the earlier offer.
//!
//! Input selection reads `Content-Type` and never falls back: a body in an
//! unknown format must be refused rather than guessed.

use crate::core::codec::RdfFormat;
use crate::core::error::{LdpError, Result};
use crate::core::protocol::headers::media_type_essence;

/// One member of an `Accept` header.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRange {
    pub main: String,
    pub sub: String,
    pub quality: f32,
}

impl MediaRange {
    /// Specificity of the match against `media_type` (`main/sub`), if any.
    fn specificity(&self, media_type: &str) -> Option<u8> {
        let (main, sub) = media_type.split_once('/')?;
        match (self.main.as_str(), self.sub.as_str()) {
            ("*", "*") => Some(0),
            (m, "*") if m == main => Some(1),
            (m, s) if m == main && s == sub => Some(2),
            _ => None,
        }
    }
}

/// Parse an `Accept` header into media ranges, best quality first.
///
/// Members without a `/` are skipped. Missing or invalid `q` means 1.0.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .filter_map(|part| {
            let mut segments = part.split(';');
            let media = segments.next()?.trim().to_ascii_lowercase();
            let (main, sub) = media.split_once('/')?;
            if main.is_empty() || sub.is_empty() {
                return None;
            }
            let quality = segments
                .find_map(|seg| {
                    let seg = seg.trim();
                    seg.strip_prefix("q=")
                        .or_else(|| seg.strip_prefix("Q="))
                        .and_then(|q| q.trim().parse::<f32>().ok())
                })
                .map(|q| q.clamp(0.0, 1.0))
                .unwrap_or(1.0);
            Some(MediaRange {
                main: main.to_string(),
                sub: sub.to_string(),
                quality,
            })
        })
        .collect();

    ranges.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranges
}

/// Maps client preferences onto the server's format offers.
#[derive(Clone, Debug)]
pub struct ContentNegotiator {
    offers: Vec<(RdfFormat, f32)>,
    fallback: Option<RdfFormat>,
}

impl Default for ContentNegotiator {
    /// Turtle first, then JSON-LD, then N-Triples; falls back to Turtle.
    fn default() -> Self {
        Self::new(vec![
            (RdfFormat::Turtle, 1.0),
            (RdfFormat::JsonLd, 0.8),
            (RdfFormat::NTriples, 0.5),
        ])
        .with_fallback(Some(RdfFormat::Turtle))
    }
}

impl ContentNegotiator {
    /// Negotiator over ranked `(format, server quality)` offers, no fallback.
    #[must_use]
    pub fn new(offers: Vec<(RdfFormat, f32)>) -> Self {
        Self {
            offers,
            fallback: None,
        }
    }

    /// Format used when nothing in `Accept` matches. `None` makes that case
    /// fail with `NotAcceptable`.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Option<RdfFormat>) -> Self {
        self.fallback = fallback;
        self
    }

    #[inline]
    #[must_use]
    pub fn fallback(&self) -> Option<RdfFormat> {
        self.fallback
    }

    /// Offered formats in rank order.
    pub fn formats(&self) -> impl Iterator<Item = RdfFormat> + '_ {
        self.offers.iter().map(|(f, _)| *f)
    }

    /// Media types accepted as request bodies, in rank order.
    #[must_use]
    pub fn input_media_types(&self) -> Vec<&'static str> {
        self.formats().map(RdfFormat::media_type).collect()
    }

    /// Best offer for `accept`, ignoring the fallback.
    #[must_use]
    pub fn best_match(&self, accept: &str) -> Option<RdfFormat> {
        let ranges = parse_accept(accept);
        if ranges.is_empty() {
            return self.formats().next();
        }

        let mut best: Option<(RdfFormat, f32)> = None;
        for (format, server_q) in &self.offers {
            let client_q = ranges
                .iter()
                .filter_map(|r| r.specificity(format.media_type()).map(|s| (s, r.quality)))
                .max_by_key(|(s, _)| *s)
                .map(|(_, q)| q);
            let Some(client_q) = client_q else { continue };
            let score = client_q * server_q;
            if score > 0.0 && best.map_or(true, |(_, b)| score > b) {
                best = Some((*format, score));
            }
        }
        best.map(|(f, _)| f)
    }

    /// Select the response format for an `Accept` header.
    ///
    /// A missing header selects the primary offer.
    ///
    /// # Errors
    ///
    /// [`LdpError::NotAcceptable`] when nothing matches and no fallback is set.
    pub fn negotiate(&self, accept: Option<&str>) -> Result<RdfFormat> {
        let Some(accept) = accept.filter(|a| !a.trim().is_empty()) else {
            return self
                .formats()
                .next()
                .ok_or_else(|| LdpError::NotAcceptable("server offers no formats".into()));
        };

        if let Some(format) = self.best_match(accept) {
            return Ok(format);
        }
        match self.fallback {
            Some(format) => {
                tracing::debug!("no offer matches Accept '{}', falling back to {}", accept, format);
                Ok(format)
            }
            None => Err(LdpError::NotAcceptable(format!(
                "none of [{}] matches Accept: {}",
                self.input_media_types().join(", "),
                accept
            ))),
        }
    }

    /// Select the parser for a request body's `Content-Type`. Never falls back.
    ///
    /// # Errors
    ///
    /// [`LdpError::UnsupportedFormat`] if the header is missing or unknown.
    pub fn select_input(&self, content_type: Option<&str>) -> Result<RdfFormat> {
        let content_type = content_type.ok_or_else(|| {
            LdpError::UnsupportedFormat("missing Content-Type header".into())
        })?;
        let essence = media_type_essence(content_type);
        RdfFormat::from_media_type(&essence)
            .filter(|f| self.formats().any(|o| o == *f))
            .ok_or_else(|| {
                LdpError::UnsupportedFormat(format!(
                    "unknown file format: {}. Check your Content-Type header",
                    content_type
                ))
            })
    }
}
