//! Line and field tokenizer for text scripts.
//!
//! A script is a list of lines made of whitespace separated fields:
//!
//! ```text
//! // item group 0
//! 0
//! 3  "Short Sword"  1 1   // kind, name, width, height
//! end
//! ```
//!
//! Fields in double quotes keep their inner whitespace. `//` starts a comment
//! that runs to the end of the line, and lines left without fields are dropped.

use std::str::FromStr;

use encoding::{all::ISO_8859_1, DecoderTrap, Encoding};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{char, multispace0, none_of},
    combinator::{all_consuming, eof, not, opt, recognize, rest},
    multi::{many0, many1_count},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn comment(i: &str) -> IResult<&str, &str> {
    preceded(tag("//"), rest)(i)
}

fn bare_field(i: &str) -> IResult<&str, &str> {
    // a single slash is part of the field, two start a comment
    recognize(many1_count(alt((
        recognize(none_of(" \t\r\n\"/")),
        recognize(terminated(char('/'), not(char('/')))),
    ))))(i)
}

fn quoted_field(i: &str) -> IResult<&str, &str> {
    // an unterminated quote runs to the end of the line
    preceded(
        char('"'),
        terminated(take_till(|c| c == '"'), opt(char('"'))),
    )(i)
}

fn line_fields(i: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(terminated(
        many0(preceded(multispace0, alt((quoted_field, bare_field)))),
        tuple((multispace0, opt(comment), eof)),
    ))(i)
}

/// A line of a script that has at least one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptLine {
    number: usize,
    fields: Vec<String>,
}

impl ScriptLine {
    /// 1-based line number in the source text.
    #[must_use]
    pub fn number(&self) -> usize {
        self.number
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Parses the field at `index`, returning `None` if it's missing or doesn't parse.
    #[must_use]
    pub fn field<T: FromStr>(&self, index: usize) -> Option<T> {
        self.raw(index)?.parse().ok()
    }

    /// Whether this line closes a section.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self.fields.as_slice(), [field] if field.eq_ignore_ascii_case("end"))
    }
}

/// A tokenized script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script {
    lines: Vec<ScriptLine>,
}

impl Script {
    /// Tokenizes raw script bytes.
    ///
    /// Text that isn't valid UTF-8 is read as ISO 8859-1, which most legacy
    /// scripts are written in.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a line can't be tokenized.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text),
            Err(_) => {
                let text = ISO_8859_1
                    .decode(bytes, DecoderTrap::Strict)
                    .map_err(|err| Error::Encoding(err.into_owned()))?;
                Self::parse(&text)
            }
        }
    }

    /// Tokenizes script text.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a line can't be tokenized.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let (_, fields) = line_fields(line).map_err(|err| Error::InvalidScript {
                line: i + 1,
                reason: err.to_string(),
            })?;

            if !fields.is_empty() {
                lines.push(ScriptLine {
                    number: i + 1,
                    fields: fields.into_iter().map(str::to_owned).collect(),
                });
            }
        }

        Ok(Self { lines })
    }

    #[must_use]
    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    /// Groups of lines terminated by `end` lines, without the `end` lines themselves.
    ///
    /// Lines after the last `end` form a final group.
    #[must_use]
    pub fn sections(&self) -> Vec<&[ScriptLine]> {
        let mut sections: Vec<_> = self.lines.split(ScriptLine::is_end).collect();
        if sections.last().map_or(false, |last| last.is_empty()) {
            sections.pop();
        }
        sections
    }
}
