//! Content-Type parsing and text safety classification
//!
//! Parsing and policy are kept apart: [`MediaType::parse`] only understands the
//! header grammar, while [`classify`] decides whether the body can be handed to
//! consumers as text. Neither step is fatal; an unsafe result only produces an
//! [`Advisory`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::response::Advisory;

/// Charsets accepted for text content, compared case-insensitively
pub const TEXT_CHARSETS: [&str; 2] = ["utf-8", "us-ascii"];

/// Content-Type parse errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentTypeError {
    /// Header value is empty
    #[error("no media type")]
    Empty,
    /// The `type/subtype` part is malformed
    #[error("invalid media type {0:?}")]
    InvalidMediaType(String),
    /// A parameter is malformed
    #[error("invalid media parameter {0:?}")]
    InvalidParameter(String),
    /// A parameter name appears twice
    #[error("duplicate parameter name {0:?}")]
    DuplicateParameter(String),
}

/// A parsed media type with its parameters
///
/// Type, subtype and parameter names are lower-cased; parameter values are kept
/// as sent, with quoted strings unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    slash: usize,
    params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parse a Content-Type header value
    pub fn parse(input: &str) -> Result<Self, ContentTypeError> {
        let (base, mut rest) = match input.find(';') {
            Some(idx) => (&input[..idx], &input[idx..]),
            None => (input, ""),
        };

        let essence = base.trim().to_ascii_lowercase();
        if essence.is_empty() {
            return Err(ContentTypeError::Empty);
        }

        let slash = essence
            .find('/')
            .ok_or_else(|| ContentTypeError::InvalidMediaType(essence.clone()))?;
        let (kind, subtype) = (&essence[..slash], &essence[slash + 1..]);
        if kind.is_empty() || !is_token(kind) || subtype.is_empty() || !is_token(subtype) {
            return Err(ContentTypeError::InvalidMediaType(essence));
        }

        let mut params = BTreeMap::new();
        loop {
            rest = rest.trim_start();
            let Some(after_semicolon) = rest.strip_prefix(';') else {
                if rest.is_empty() {
                    break;
                }
                return Err(ContentTypeError::InvalidParameter(rest.to_string()));
            };
            rest = after_semicolon.trim_start();
            if rest.is_empty() {
                break;
            }

            let (name, after_name) = split_token(rest);
            let value_part = after_name
                .trim_start()
                .strip_prefix('=')
                .filter(|_| !name.is_empty())
                .ok_or_else(|| ContentTypeError::InvalidParameter(rest.to_string()))?
                .trim_start();

            let (value, after_value) = if value_part.starts_with('"') {
                split_quoted(value_part)
                    .ok_or_else(|| ContentTypeError::InvalidParameter(rest.to_string()))?
            } else {
                let (value, after_value) = split_token(value_part);
                if value.is_empty() {
                    return Err(ContentTypeError::InvalidParameter(rest.to_string()));
                }
                (value.to_string(), after_value)
            };

            let name = name.to_ascii_lowercase();
            if params.contains_key(&name) {
                return Err(ContentTypeError::DuplicateParameter(name));
            }
            params.insert(name, value);
            rest = after_value;
        }

        Ok(Self {
            essence,
            slash,
            params,
        })
    }

    /// `type/subtype`
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Top level type, e.g. `text`
    pub fn kind(&self) -> &str {
        &self.essence[..self.slash]
    }

    /// Subtype, e.g. `plain`
    pub fn subtype(&self) -> &str {
        &self.essence[self.slash + 1..]
    }

    /// Parameter value by case-insensitive name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All parameters
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

impl FromStr for MediaType {
    type Err = ContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)?;
        for (name, value) in &self.params {
            if is_token(value) {
                write!(f, "; {name}={value}")?;
            } else {
                write!(f, "; {name}={value:?}")?;
            }
        }
        Ok(())
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

fn split_token(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_token_char(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Split a leading quoted-string off `s`, returning the unescaped value and the
/// remainder. `None` if the quote is never closed.
fn split_quoted(s: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Some((value, &s[idx + 1..])),
            '\\' => value.push(chars.next()?.1),
            _ => value.push(c),
        }
    }
    None
}

/// Outcome of checking a response's Content-Type for text safety
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Text media type with a UTF-8 compatible charset
    Text(MediaType),
    /// No Content-Type header on the response
    Missing,
    /// The header could not be parsed
    Malformed {
        /// Raw header value
        content_type: String,
        /// Parse failure
        reason: ContentTypeError,
    },
    /// Parsed, but not a recognized text media type
    NotText(MediaType),
    /// Text media type with a charset that is not UTF-8 compatible
    UnsupportedCharset(MediaType),
}

impl Classification {
    /// True when the body can be treated as UTF-8 text
    pub fn is_text_safe(&self) -> bool {
        matches!(self, Classification::Text(_))
    }

    /// Caller-facing warning for unsafe content, `None` when text-safe
    pub fn advisory(&self) -> Option<Advisory> {
        const DETAIL: &str = "If the content is binary data, consumers may not \
                              properly handle the contents of the response.";

        let summary = match self {
            Classification::Text(_) => return None,
            Classification::Missing => {
                "Content-Type is not recognized as a text type, got \"\"".to_string()
            }
            Classification::Malformed {
                content_type,
                reason,
            } => {
                format!(
                    "Content-Type is not recognized as a text type, got {content_type:?} ({reason})"
                )
            }
            Classification::NotText(media_type) => format!(
                "Content-Type is not recognized as a text type, got {:?}",
                media_type.to_string()
            ),
            Classification::UnsupportedCharset(media_type) => format!(
                "Content-Type charset is not recognized as UTF-8 compatible, got {:?}",
                media_type.param("charset").unwrap_or_default()
            ),
        };

        Some(Advisory::new(summary, DETAIL))
    }
}

/// Whether a media type is one of the recognized text types
///
/// Matches `text/*`, exactly `application/json`, or anything starting with
/// `application/samlmetadata+xml`.
pub fn is_text_media_type(media_type: &MediaType) -> bool {
    let essence = media_type.essence();
    media_type.kind() == "text"
        || essence == "application/json"
        || essence.starts_with("application/samlmetadata+xml")
}

/// Whether a `charset` parameter value is UTF-8 compatible; absent is accepted
pub fn is_text_charset(charset: Option<&str>) -> bool {
    match charset {
        None | Some("") => true,
        Some(charset) => TEXT_CHARSETS
            .iter()
            .any(|allowed| charset.eq_ignore_ascii_case(allowed)),
    }
}

/// Classify a raw Content-Type header value
pub fn classify(content_type: Option<&str>) -> Classification {
    let Some(raw) = content_type else {
        return Classification::Missing;
    };

    let media_type = match MediaType::parse(raw) {
        Ok(media_type) => media_type,
        Err(reason) => {
            return Classification::Malformed {
                content_type: raw.to_string(),
                reason,
            }
        }
    };

    if !is_text_media_type(&media_type) {
        Classification::NotText(media_type)
    } else if !is_text_charset(media_type.param("charset")) {
        Classification::UnsupportedCharset(media_type)
    } else {
        Classification::Text(media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let media_type = MediaType::parse("text/plain").expect("Valid media type");
        assert_eq!(media_type.essence(), "text/plain");
        assert_eq!(media_type.kind(), "text");
        assert_eq!(media_type.subtype(), "plain");
        assert!(media_type.params().is_empty());
    }

    #[test]
    fn test_parse_lowercases_type_and_param_names() {
        let media_type =
            MediaType::parse("Text/HTML; Charset=UTF-8").expect("Valid media type");
        assert_eq!(media_type.essence(), "text/html");
        assert_eq!(media_type.param("charset"), Some("UTF-8"));
        assert_eq!(media_type.param("CHARSET"), Some("UTF-8"));
    }

    #[test]
    fn test_parse_quoted_parameter() {
        let media_type = MediaType::parse(r#"multipart/form-data; boundary="a \"b\"; c""#)
            .expect("Valid media type");
        assert_eq!(media_type.param("boundary"), Some(r#"a "b"; c"#));
    }

    #[test]
    fn test_parse_multiple_parameters_and_trailing_semicolon() {
        let media_type = MediaType::parse("application/json ; charset=utf-8; q=1;")
            .expect("Valid media type");
        assert_eq!(media_type.param("charset"), Some("utf-8"));
        assert_eq!(media_type.param("q"), Some("1"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(MediaType::parse(""), Err(ContentTypeError::Empty));
        assert_eq!(MediaType::parse("  ; charset=utf-8"), Err(ContentTypeError::Empty));
        assert!(matches!(
            MediaType::parse("text"),
            Err(ContentTypeError::InvalidMediaType(_))
        ));
        assert!(matches!(
            MediaType::parse("text/"),
            Err(ContentTypeError::InvalidMediaType(_))
        ));
        assert!(matches!(
            MediaType::parse("text plain"),
            Err(ContentTypeError::InvalidMediaType(_))
        ));
        assert!(matches!(
            MediaType::parse("text/plain; charset"),
            Err(ContentTypeError::InvalidParameter(_))
        ));
        assert!(matches!(
            MediaType::parse("text/plain; charset="),
            Err(ContentTypeError::InvalidParameter(_))
        ));
        assert!(matches!(
            MediaType::parse(r#"text/plain; name="open"#),
            Err(ContentTypeError::InvalidParameter(_))
        ));
        assert_eq!(
            MediaType::parse("text/plain; charset=utf-8; CHARSET=us-ascii"),
            Err(ContentTypeError::DuplicateParameter("charset".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let media_type = MediaType::parse(r#"text/plain; charset=UTF-8; name="a b""#)
            .expect("Valid media type");
        assert_eq!(
            media_type.to_string(),
            r#"text/plain; charset=UTF-8; name="a b""#
        );
    }

    #[test]
    fn test_text_media_type_policy() {
        let text = |s: &str| is_text_media_type(&MediaType::parse(s).expect("Valid media type"));

        assert!(text("text/plain"));
        assert!(text("text/html"));
        assert!(text("text/csv"));
        assert!(text("application/json"));
        assert!(text("application/samlmetadata+xml"));
        assert!(text("application/samlmetadata+xml-extra"));

        assert!(!text("application/json-patch+json"));
        assert!(!text("application/x-x509-ca-cert"));
        assert!(!text("application/octet-stream"));
        assert!(!text("image/png"));
    }

    #[test]
    fn test_charset_policy() {
        assert!(is_text_charset(None));
        assert!(is_text_charset(Some("")));
        assert!(is_text_charset(Some("utf-8")));
        assert!(is_text_charset(Some("UTF-8")));
        assert!(is_text_charset(Some("US-ASCII")));

        assert!(!is_text_charset(Some("utf-16")));
        assert!(!is_text_charset(Some("iso-8859-1")));
        assert!(!is_text_charset(Some("utf8")));
    }

    #[test]
    fn test_classify() {
        assert!(classify(Some("text/plain")).is_text_safe());
        assert!(classify(Some("text/plain; charset=UTF-8")).is_text_safe());
        assert!(classify(Some("application/json; charset=us-ascii")).is_text_safe());

        assert_eq!(classify(None), Classification::Missing);
        assert!(matches!(
            classify(Some("application/json; charset=UTF-16")),
            Classification::UnsupportedCharset(_)
        ));
        assert!(matches!(
            classify(Some("application/x-x509-ca-cert")),
            Classification::NotText(_)
        ));
        assert!(matches!(
            classify(Some("text/plain; charset")),
            Classification::Malformed { .. }
        ));
    }

    #[test]
    fn test_advisory() {
        assert!(classify(Some("text/plain")).advisory().is_none());

        let advisory = classify(Some("application/x-x509-ca-cert"))
            .advisory()
            .expect("Binary content should produce an advisory");
        assert_eq!(
            advisory.summary,
            r#"Content-Type is not recognized as a text type, got "application/x-x509-ca-cert""#
        );
        assert!(advisory.detail.contains("binary data"));

        let advisory = classify(Some("application/json; charset=UTF-16"))
            .advisory()
            .expect("UTF-16 should produce an advisory");
        assert!(advisory.summary.contains(r#""UTF-16""#));

        let advisory = classify(None).advisory().expect("Missing header should warn");
        assert!(advisory.summary.ends_with(r#"got """#));
    }
}
