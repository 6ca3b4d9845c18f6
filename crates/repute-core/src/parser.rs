//! REPUTE response document parsing.
//!
//! A response is an XML document whose root `reputation` element holds any
//! number of `reputon` records. Only a reputon that carries both the
//! `dkim` extension and the `sending-spam` assertion is of interest; the
//! first such reputon in document order supplies the result.
//!
//! Structural problems (not XML, wrong root, empty root) are errors.
//! Malformed field values are not: the offending field is skipped and the
//! rest of the document is still examined.

use roxmltree::{Document, Node};
use tracing::{debug, trace};

use crate::error::{ReputeError, Result};
use crate::types::{
    Reputation, ASSERTION_SENDING_SPAM, ELEMENT_REPUTATION, ELEMENT_REPUTON, EXTENSION_DKIM,
};

/// Leaf elements understood inside a reputon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Assertion,
    Extension,
    Rated,
    Rater,
    RaterAuthenticity,
    Rating,
    SampleSize,
    Updated,
}

const FIELDS: &[(&str, Field)] = &[
    ("assertion", Field::Assertion),
    ("extension", Field::Extension),
    ("rated", Field::Rated),
    ("rater", Field::Rater),
    ("rater-authenticity", Field::RaterAuthenticity),
    ("rating", Field::Rating),
    ("sample-size", Field::SampleSize),
    ("updated", Field::Updated),
];

impl Field {
    fn lookup(name: &str) -> Option<Self> {
        FIELDS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, field)| field)
    }
}

/// Values collected from one candidate reputon.
///
/// Numeric fields start at zero, which is what the caller sees for any
/// field the server omitted or sent malformed.
#[derive(Debug, Default)]
struct Reputon {
    sending_spam: bool,
    dkim: bool,
    rating: f32,
    confidence: f32,
    sample_size: u64,
    updated: u64,
}

impl Reputon {
    fn read(node: Node<'_, '_>) -> Self {
        let mut reputon = Self::default();

        for child in node.children().filter(Node::is_element) {
            let Some(text) = child.text().filter(|t| !t.is_empty()) else {
                continue;
            };
            let name = child.tag_name().name();
            let Some(field) = Field::lookup(name) else {
                continue;
            };

            if !reputon.apply(field, text) {
                trace!(field = name, value = text, "skipping malformed reputon field");
            }
        }

        reputon
    }

    /// Record one field; returns false if its value was rejected.
    fn apply(&mut self, field: Field, text: &str) -> bool {
        match field {
            Field::Assertion => {
                if text.eq_ignore_ascii_case(ASSERTION_SENDING_SPAM) {
                    self.sending_spam = true;
                }
            }
            Field::Extension => {
                if text.eq_ignore_ascii_case(EXTENSION_DKIM) {
                    self.dkim = true;
                }
            }
            // The server is trusted to have answered the question asked.
            Field::Rated | Field::Rater => {}
            Field::RaterAuthenticity => match parse_bounded(text, 0.0, 1.0) {
                Some(v) => self.confidence = v,
                None => return false,
            },
            Field::Rating => match parse_bounded(text, -1.0, 1.0) {
                Some(v) => self.rating = v,
                None => return false,
            },
            Field::SampleSize => match text.trim().parse() {
                Ok(v) => self.sample_size = v,
                Err(_) => return false,
            },
            Field::Updated => match text.trim().parse() {
                Ok(v) => self.updated = v,
                Err(_) => return false,
            },
        }
        true
    }

    const fn is_match(&self) -> bool {
        self.dkim && self.sending_spam
    }

    const fn into_reputation(self) -> Reputation {
        Reputation {
            rating: self.rating,
            confidence: self.confidence,
            sample_size: self.sample_size,
            updated: self.updated,
        }
    }
}

/// Parse a float that must fall inside `[min, max]`. NaN never does.
fn parse_bounded(text: &str, min: f32, max: f32) -> Option<f32> {
    text.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

/// Skip a header block some transports leave in front of the body.
///
/// Everything up to and including the first blank line (`\n\n` or
/// `\r\n\r\n`) is dropped. Without a blank line the input is returned
/// untouched.
pub fn strip_headers(buf: &[u8]) -> &[u8] {
    (0..buf.len())
        .find_map(move |i| {
            let rest = &buf[i..];
            if rest.starts_with(b"\n\n") {
                Some(&buf[i + 2..])
            } else if rest.starts_with(b"\r\n\r\n") {
                Some(&buf[i + 4..])
            } else {
                None
            }
        })
        .unwrap_or(buf)
}

/// Parse a REPUTE response and pick out the DKIM spam reputation.
///
/// Returns `Ok(None)` when the document is well formed but no reputon
/// carries both the `dkim` extension and the `sending-spam` assertion.
/// Callers must treat that as "no data", not as a neutral reputation.
///
/// # Errors
///
/// Returns `ReputeError::Parse` if the body is not UTF-8 XML, or if the
/// root element is not a non-empty `reputation` element.
pub fn parse_response(buf: &[u8]) -> Result<Option<Reputation>> {
    let body = strip_headers(buf);
    let text = std::str::from_utf8(body)
        .map_err(|e| ReputeError::Parse(format!("response is not UTF-8: {e}")))?;
    let doc = Document::parse(text).map_err(|e| ReputeError::Parse(e.to_string()))?;

    let root = doc.root_element();
    let root_name = root.tag_name().name();
    if !root_name.eq_ignore_ascii_case(ELEMENT_REPUTATION) {
        return Err(ReputeError::Parse(format!(
            "unexpected root element <{root_name}>"
        )));
    }
    if !root.has_children() {
        return Err(ReputeError::Parse(format!(
            "<{root_name}> element is empty"
        )));
    }

    let found = root
        .children()
        .filter(|node| {
            node.is_element()
                && node.has_children()
                && node.tag_name().name().eq_ignore_ascii_case(ELEMENT_REPUTON)
        })
        .map(Reputon::read)
        .find(Reputon::is_match)
        .map(Reputon::into_reputation);

    match &found {
        Some(rep) => debug!(
            rating = rep.rating,
            confidence = rep.confidence,
            sample_size = rep.sample_size,
            "matched dkim sending-spam reputon"
        ),
        None => debug!("no dkim sending-spam reputon in response"),
    }

    Ok(found)
}
