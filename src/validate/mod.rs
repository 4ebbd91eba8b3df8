//! Markup well-formedness checking.
//!
//! Only structural rules are enforced: balanced and properly nested tags,
//! attribute syntax, entity references, names and namespaces, and a single
//! document element.
//! Whether the markup describes a drawable SVG is left to [`crate::preview`].

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use resvg::usvg::roxmltree;
use thiserror::Error;

/// User-facing message shown whenever the markup is not well-formed.
pub const INVALID_MESSAGE: &str = "Invalid SVG code. Please check the syntax.";

const PREDEFINED_ENTITIES: [&str; 5] = ["lt", "gt", "amp", "apos", "quot"];

/// Verdict of [`validate`] for one document revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid { message: String },
}

impl ValidationResult {
    /// The `Invalid` verdict carrying the fixed user-facing message.
    pub fn invalid() -> Self {
        Self::Invalid {
            message: INVALID_MESSAGE.to_string(),
        }
    }

    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The message to show inline, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message } => Some(message),
        }
    }
}

/// Why a document failed the well-formedness check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("{0}")]
    Parser(String),
    #[error("closing tag </{found}> does not match <{expected}>")]
    MismatchedTag { expected: String, found: String },
    #[error("closing tag </{0}> has no matching opening tag")]
    UnexpectedClose(String),
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("more than one document element")]
    MultipleRoots,
    #[error("text outside the document element")]
    TextOutsideRoot,
    #[error("unterminated entity reference")]
    UnterminatedReference,
    #[error("unknown entity &{0};")]
    UnknownEntity(String),
    #[error("invalid character reference &{0};")]
    InvalidCharRef(String),
    #[error("malformed attribute: {0}")]
    Attribute(String),
    #[error("character {0:?} is not allowed in markup")]
    ForbiddenChar(char),
    #[error("`]]>` outside a CDATA section")]
    CdataEndInText,
    #[error("{0}")]
    Malformed(String),
}

/// A structural error with its location in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (line {line}, column {column})")]
pub struct SyntaxError {
    /// Byte offset into the source.
    pub offset: usize,
    /// One-based line number.
    pub line: usize,
    /// One-based column, counted in characters.
    pub column: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    fn at(text: &str, offset: usize, kind: SyntaxErrorKind) -> Self {
        let offset = offset.min(text.len());
        let prefix = &text.as_bytes()[..offset];
        let line_start = prefix
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |idx| idx + 1);
        let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
        let column = String::from_utf8_lossy(&prefix[line_start..]).chars().count() + 1;
        Self {
            offset,
            line,
            column,
            kind,
        }
    }
}

/// Check `text` for well-formedness and collapse the outcome into a verdict.
///
/// Empty and whitespace-only text is valid: there are no tags to unbalance.
pub fn validate(text: &str) -> ValidationResult {
    match check_well_formed(text) {
        Ok(()) => ValidationResult::Valid,
        Err(err) => {
            tracing::debug!(%err, "markup rejected");
            ValidationResult::invalid()
        }
    }
}

/// Parse `text` as XML and report the first structural error.
///
/// # Errors
///
/// Returns the first [`SyntaxError`] found, located at the start of the
/// offending construct.
pub fn check_well_formed(text: &str) -> Result<(), SyntaxError> {
    if let Some((offset, ch)) = text.char_indices().find(|&(_, ch)| !is_xml_char(ch)) {
        return Err(SyntaxError::at(
            text,
            offset,
            SyntaxErrorKind::ForbiddenChar(ch),
        ));
    }

    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    // Tag matching is done against our own stack so mismatches get a precise kind.
    config.check_end_names = false;
    config.check_comments = true;

    let mut open: Vec<String> = Vec::new();
    let mut root_seen = false;
    let mut has_doctype = false;

    loop {
        let event_start = to_offset(reader.buffer_position());
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let offset = to_offset(reader.error_position());
                return Err(SyntaxError::at(
                    text,
                    offset,
                    SyntaxErrorKind::Parser(err.to_string()),
                ));
            }
        };
        let fail = |kind| Err(SyntaxError::at(text, event_start, kind));

        match event {
            Event::Start(_) | Event::Empty(_) if open.is_empty() && root_seen => {
                return fail(SyntaxErrorKind::MultipleRoots);
            }
            Event::Start(start) => {
                root_seen = true;
                if let Err(kind) = check_attributes(&start, reader.decoder(), has_doctype) {
                    return fail(kind);
                }
                open.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
            }
            Event::Empty(start) => {
                root_seen = true;
                if let Err(kind) = check_attributes(&start, reader.decoder(), has_doctype) {
                    return fail(kind);
                }
            }
            Event::End(end) => {
                let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                match open.pop() {
                    Some(expected) if expected == found => {}
                    Some(expected) => {
                        return fail(SyntaxErrorKind::MismatchedTag { expected, found });
                    }
                    None => return fail(SyntaxErrorKind::UnexpectedClose(found)),
                }
            }
            Event::Text(content) => {
                if content.contains(&b'&') {
                    return fail(SyntaxErrorKind::UnterminatedReference);
                }
                if content.windows(3).any(|w| w == b"]]>") {
                    return fail(SyntaxErrorKind::CdataEndInText);
                }
                if open.is_empty() && !content.iter().all(u8::is_ascii_whitespace) {
                    return fail(SyntaxErrorKind::TextOutsideRoot);
                }
            }
            Event::CData(_) => {
                if open.is_empty() {
                    return fail(SyntaxErrorKind::TextOutsideRoot);
                }
            }
            Event::GeneralRef(reference) => {
                if open.is_empty() {
                    return fail(SyntaxErrorKind::TextOutsideRoot);
                }
                let raw = String::from_utf8_lossy(&reference).into_owned();
                if let Err(kind) = check_reference(&raw, has_doctype) {
                    return fail(kind);
                }
            }
            Event::DocType(_) => has_doctype = true,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(name) = open.pop() {
        return Err(SyntaxError::at(
            text,
            text.len(),
            SyntaxErrorKind::Unclosed(name),
        ));
    }
    // The tokenizer above is lenient about names, attribute syntax,
    // declaration placement and namespaces; a conforming parser settles those.
    if root_seen {
        check_conformance(text)?;
    }
    Ok(())
}

fn check_conformance(text: &str) -> Result<(), SyntaxError> {
    let mut options = roxmltree::ParsingOptions::default();
    options.allow_dtd = true;
    roxmltree::Document::parse_with_options(text, options)
        .map(|_| ())
        .map_err(|err| {
            let pos = err.pos();
            SyntaxError::at(
                text,
                offset_of_position(text, pos.row, pos.col),
                SyntaxErrorKind::Malformed(err.to_string()),
            )
        })
}

/// Byte offset of a one-based row and character column.
fn offset_of_position(text: &str, row: u32, col: u32) -> usize {
    let row = to_offset(row).saturating_sub(1);
    let col = to_offset(col).saturating_sub(1);
    let line_start: usize = text.split_inclusive('\n').take(row).map(str::len).sum();
    text[line_start..]
        .char_indices()
        .nth(col)
        .map_or(text.len(), |(idx, _)| line_start + idx)
}

/// The XML `Char` production; Rust chars already exclude surrogates.
const fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..)
}

fn check_attributes(
    start: &BytesStart<'_>,
    decoder: Decoder,
    has_doctype: bool,
) -> Result<(), SyntaxErrorKind> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| SyntaxErrorKind::Attribute(err.to_string()))?;
        // Entities declared by a DOCTYPE are resolved by `check_conformance`.
        if has_doctype {
            continue;
        }
        attr.decode_and_unescape_value(decoder)
            .map_err(|err| SyntaxErrorKind::Attribute(err.to_string()))?;
    }
    Ok(())
}

fn check_reference(raw: &str, has_doctype: bool) -> Result<(), SyntaxErrorKind> {
    if let Some(number) = raw.strip_prefix('#') {
        let value = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse::<u32>().ok(),
        };
        return match value.and_then(char::from_u32) {
            Some(ch) if ch != '\0' => Ok(()),
            _ => Err(SyntaxErrorKind::InvalidCharRef(raw.to_string())),
        };
    }
    if has_doctype || PREDEFINED_ENTITIES.contains(&raw) {
        Ok(())
    } else {
        Err(SyntaxErrorKind::UnknownEntity(raw.to_string()))
    }
}

fn to_offset<T>(position: T) -> usize
where
    usize: TryFrom<T>,
{
    usize::try_from(position).unwrap_or(usize::MAX)
}
