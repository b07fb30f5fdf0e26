//! RFC 4515 string form of [`Filter`]: rendering (for logs) and parsing
//! (for the `query` command and route tables).

use super::{Filter, SubstringFragment};
use crate::error::FilterParseError;
use std::fmt;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '*' => f.write_str("\\2a")?,
                '(' => f.write_str("\\28")?,
                ')' => f.write_str("\\29")?,
                '\\' => f.write_str("\\5c")?,
                '\0' => f.write_str("\\00")?,
                c => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(children) => {
                f.write_str("(&")?;
                for c in children {
                    write!(f, "{c}")?;
                }
                f.write_str(")")
            }
            Filter::Or(children) => {
                f.write_str("(|")?;
                for c in children {
                    write!(f, "{c}")?;
                }
                f.write_str(")")
            }
            Filter::Not(inner) => write!(f, "(!{inner})"),
            Filter::Equality { attribute, value } => {
                write!(f, "({attribute}={})", Escaped(value))
            }
            Filter::GreaterOrEqual { attribute, value } => {
                write!(f, "({attribute}>={})", Escaped(value))
            }
            Filter::LessOrEqual { attribute, value } => {
                write!(f, "({attribute}<={})", Escaped(value))
            }
            Filter::Present(attribute) => write!(f, "({attribute}=*)"),
            Filter::Approx { attribute, value } => {
                write!(f, "({attribute}~={})", Escaped(value))
            }
            Filter::Substrings {
                attribute,
                fragments,
            } => {
                write!(f, "({attribute}=")?;
                for fragment in fragments {
                    match fragment {
                        SubstringFragment::Initial(s) => write!(f, "{}", Escaped(s))?,
                        SubstringFragment::Any(s) | SubstringFragment::Final(s) => {
                            write!(f, "*{}", Escaped(s))?
                        }
                    }
                }
                if !matches!(fragments.last(), Some(SubstringFragment::Final(_))) {
                    f.write_str("*")?;
                }
                f.write_str(")")
            }
            Filter::ExtensibleMatch(text) => write!(f, "({text})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Filter {
    /// Parse RFC 4515 filter text, e.g. `(&(objectClass=person)(cn=ada*))`.
    ///
    /// A single item may omit its parentheses (`uid=ada`).
    pub fn parse(text: &str) -> Result<Filter, FilterParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FilterParseError::Empty);
        }
        let mut parser = Parser {
            src: text,
            bytes: text.as_bytes(),
            pos: 0,
        };
        let filter = if parser.peek() == Some(b'(') {
            parser.filter()?
        } else {
            parser.item()?
        };
        if parser.pos != parser.bytes.len() {
            return Err(FilterParseError::TrailingInput { offset: parser.pos });
        }
        Ok(filter)
    }
}

impl std::str::FromStr for Filter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::parse(s)
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), FilterParseError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected(expected)),
            None => Err(FilterParseError::UnexpectedEnd { expected }),
        }
    }

    fn unexpected(&self, expected: &'static str) -> FilterParseError {
        let found = self.src[self.pos..].chars().next().unwrap_or('\0');
        FilterParseError::Unexpected {
            expected,
            found,
            offset: self.pos,
        }
    }

    /// `"(" filtercomp ")"`
    fn filter(&mut self) -> Result<Filter, FilterParseError> {
        self.expect(b'(', "'('")?;
        let filter = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                Filter::And(self.list()?)
            }
            Some(b'|') => {
                self.pos += 1;
                Filter::Or(self.list()?)
            }
            Some(b'!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(FilterParseError::UnexpectedEnd { expected: "filter" }),
        };
        self.expect(b')', "')'")?;
        Ok(filter)
    }

    /// Zero or more parenthesised filters.
    fn list(&mut self) -> Result<Vec<Filter>, FilterParseError> {
        let mut filters = Vec::new();
        while self.peek() == Some(b'(') {
            filters.push(self.filter()?);
        }
        Ok(filters)
    }

    fn item(&mut self) -> Result<Filter, FilterParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'=' | b'~' | b'>' | b'<' | b':' | b'(' | b')') {
                break;
            }
            self.pos += 1;
        }
        let attribute = &self.src[start..self.pos];

        if self.peek() == Some(b':') {
            let raw = self.raw_value();
            return Ok(Filter::ExtensibleMatch(format!("{attribute}{raw}")));
        }
        if attribute.is_empty() {
            return Err(FilterParseError::MissingAttribute { offset: start });
        }
        let attribute = attribute.to_string();

        match self.peek() {
            Some(b'=') => {
                self.pos += 1;
                let value_start = self.pos;
                let raw = self.raw_value();
                self.simple_or_substrings(attribute, raw, value_start)
            }
            Some(b'~') => {
                self.pos += 1;
                self.expect(b'=', "'='")?;
                let value = self.value()?;
                Ok(Filter::Approx { attribute, value })
            }
            Some(b'>') => {
                self.pos += 1;
                self.expect(b'=', "'='")?;
                let value = self.value()?;
                Ok(Filter::GreaterOrEqual { attribute, value })
            }
            Some(b'<') => {
                self.pos += 1;
                self.expect(b'=', "'='")?;
                let value = self.value()?;
                Ok(Filter::LessOrEqual { attribute, value })
            }
            Some(_) => Err(self.unexpected("'=', '~=', '>=' or '<='")),
            None => Err(FilterParseError::UnexpectedEnd {
                expected: "'=', '~=', '>=' or '<='",
            }),
        }
    }

    /// Everything up to (not including) the next `)` or the end of input.
    /// `)` inside a value is always escaped, so this never splits a value.
    fn raw_value(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b')' {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn value(&mut self) -> Result<String, FilterParseError> {
        let start = self.pos;
        let raw = self.raw_value();
        unescape(raw, start)
    }

    fn simple_or_substrings(
        &self,
        attribute: String,
        raw: &str,
        offset: usize,
    ) -> Result<Filter, FilterParseError> {
        // `*`, `**`, ...: no fragment to match, only presence.
        if !raw.is_empty() && raw.bytes().all(|b| b == b'*') {
            return Ok(Filter::Present(attribute));
        }
        if !raw.contains('*') {
            return Ok(Filter::Equality {
                attribute,
                value: unescape(raw, offset)?,
            });
        }

        let pieces: Vec<&str> = raw.split('*').collect();
        let last = pieces.len() - 1;
        let mut fragments = Vec::new();
        let mut piece_offset = offset;
        for (i, piece) in pieces.iter().enumerate() {
            if !piece.is_empty() {
                let text = unescape(piece, piece_offset)?;
                fragments.push(match i {
                    0 => SubstringFragment::Initial(text),
                    i if i == last => SubstringFragment::Final(text),
                    _ => SubstringFragment::Any(text),
                });
            }
            piece_offset += piece.len() + 1;
        }
        Ok(Filter::Substrings {
            attribute,
            fragments,
        })
    }
}

/// Resolve `\XX` hex escapes. `offset` is the position of `raw` in the input.
fn unescape(raw: &str, offset: usize) -> Result<String, FilterParseError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or(FilterParseError::InvalidEscape { offset: offset + i })?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| FilterParseError::InvalidUtf8 { offset })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use crate::filter::SubstringFragment::{Any, Final, Initial};

    #[test]
    fn parses_nested_boolean_filters() {
        let filter = Filter::parse("(&(objectClass=person)(|(uid=ada)(!(uid=bob))))").unwrap();
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::equality("objectClass", "person"),
                Filter::Or(vec![
                    Filter::equality("uid", "ada"),
                    Filter::not(Filter::equality("uid", "bob")),
                ]),
            ])
        );
    }

    #[rstest]
    #[case("(cn=*)", Filter::present("cn"))]
    #[case("(cn=**)", Filter::present("cn"))]
    #[case("(cn=***)", Filter::present("cn"))]
    #[case("(cn=)", Filter::equality("cn", ""))]
    #[case("cn=ada", Filter::equality("cn", "ada"))]
    #[case("(uid>=m)", Filter::GreaterOrEqual { attribute: "uid".into(), value: "m".into() })]
    #[case("(uid<=m)", Filter::LessOrEqual { attribute: "uid".into(), value: "m".into() })]
    #[case("(cn~=ada)", Filter::Approx { attribute: "cn".into(), value: "ada".into() })]
    #[case("(&)", Filter::And(vec![]))]
    #[case("(|)", Filter::Or(vec![]))]
    #[case("(cn=a\\2ab)", Filter::equality("cn", "a*b"))]
    #[case("(cn=caf\\c3\\a9)", Filter::equality("cn", "café"))]
    #[case("(cn:caseExactMatch:=Ada)", Filter::ExtensibleMatch("cn:caseExactMatch:=Ada".into()))]
    #[case("(:dn:2.4.6.8.10:=Dino)", Filter::ExtensibleMatch(":dn:2.4.6.8.10:=Dino".into()))]
    fn parses_items(#[case] text: &str, #[case] expected: Filter) {
        assert_eq!(Filter::parse(text).unwrap(), expected);
    }

    #[rstest]
    #[case("(cn=zombie*)", vec![Initial("zombie".into())])]
    #[case("(cn=*bie)", vec![Final("bie".into())])]
    #[case("(cn=*om*)", vec![Any("om".into())])]
    #[case("(cn=ab*c*z)", vec![Initial("ab".into()), Any("c".into()), Final("z".into())])]
    #[case("(cn=a**b)", vec![Initial("a".into()), Final("b".into())])]
    fn parses_substrings(#[case] text: &str, #[case] fragments: Vec<SubstringFragment>) {
        assert_eq!(Filter::parse(text).unwrap(), Filter::substrings("cn", fragments));
    }

    #[rstest]
    #[case("", FilterParseError::Empty)]
    #[case("(cn=ada", FilterParseError::UnexpectedEnd { expected: "')'" })]
    #[case("(=ada)", FilterParseError::MissingAttribute { offset: 1 })]
    #[case("(cn=ada))", FilterParseError::TrailingInput { offset: 8 })]
    #[case("(cn=a\\zz)", FilterParseError::InvalidEscape { offset: 5 })]
    #[case("(cn=\\ff)", FilterParseError::InvalidUtf8 { offset: 4 })]
    fn rejects_malformed_text(#[case] text: &str, #[case] expected: FilterParseError) {
        assert_eq!(Filter::parse(text).unwrap_err(), expected);
    }

    #[test]
    fn unexpected_reports_offset() {
        let err = Filter::parse("(cn~ada)").unwrap_err();
        assert_eq!(err.offset(), Some(4));
    }

    #[rstest]
    #[case("(&(objectClass=person)(cn=ab*c*z))")]
    #[case("(|(mail=*@example.org)(!(uid=bob)))")]
    #[case("(cn=a\\2ab\\28\\29\\5c)")]
    #[case("(uid>=m)")]
    #[case("(cn=*)")]
    fn display_renders_parseable_text(#[case] text: &str) {
        let filter = Filter::parse(text).unwrap();
        assert_eq!(filter.to_string(), text);
        assert_eq!(Filter::parse(&filter.to_string()).unwrap(), filter);
    }
}
