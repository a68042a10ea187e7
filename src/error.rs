use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use failure::Error;
use failure_derive::Fail;

use crate::format::MappingFormat;
use crate::{MinecraftVersion, Namespace};

/// The caller violated the search contract (empty query, limit out of range, ...)
#[derive(Clone, Debug, PartialEq, Fail)]
#[fail(display = "Invalid argument: {}", _0)]
pub struct InvalidArgument(pub(crate) String);
impl InvalidArgument {
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParseErrorKind {
    /// The input isn't text at all
    EncodingOrStructuralCorruption,
    /// The tiny header is absent or declares fewer than two namespaces
    MissingNamespaceHeader,
    /// The structure of the file makes no sense (members outside of any class)
    StructuralCorruption,
}
impl ParseErrorKind {
    fn description(self) -> &'static str {
        match self {
            ParseErrorKind::EncodingOrStructuralCorruption => "corrupt encoding",
            ParseErrorKind::MissingNamespaceHeader => "missing namespace header",
            ParseErrorKind::StructuralCorruption => "corrupt structure",
        }
    }
}

/// A fatal problem with a mapping file.
///
/// Individual malformed lines never produce one of these,
/// they are simply skipped by the parsers.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    format: MappingFormat,
    kind: ParseErrorKind,
    line: Option<usize>,
    message: String
}
impl ParseError {
    #[inline]
    pub(crate) fn new<S: Into<String>>(format: MappingFormat, kind: ParseErrorKind, message: S) -> ParseError {
        ParseError { format, kind, line: None, message: message.into() }
    }
    /// Attach the (one-based) line number where the problem occurred
    #[inline]
    pub(crate) fn at_line(mut self, line: usize) -> ParseError {
        self.line = Some(line);
        self
    }
    #[inline]
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }
    #[inline]
    pub fn format(&self) -> MappingFormat {
        self.format
    }
    #[inline]
    pub fn line(&self) -> Option<usize> {
        self.line
    }
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}
impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Invalid {} mappings ({})", self.format, self.kind.description())?;
        if let Some(line) = self.line {
            write!(f, " on line {}", line)?;
        }
        write!(f, ": {}", self.message)
    }
}
impl failure::Fail for ParseError {}

/// The raw mapping supplier failed, passed along unchanged.
///
/// The cause is shared, since everyone waiting on the same load receives the same failure.
#[derive(Clone, Debug, Fail)]
#[fail(display = "Unable to fetch {} mappings for {}: {}", namespace, version, cause)]
pub struct FetchError {
    pub namespace: Namespace,
    pub version: MinecraftVersion,
    pub cause: Arc<Error>
}

/// Loading a table into the cache failed
#[derive(Clone, Debug, Fail)]
pub enum LoadError {
    #[fail(display = "{}", _0)]
    Fetch(#[cause] FetchError),
    #[fail(display = "{}", _0)]
    Parse(#[cause] ParseError),
}
impl From<FetchError> for LoadError {
    #[inline]
    fn from(e: FetchError) -> Self {
        LoadError::Fetch(e)
    }
}
impl From<ParseError> for LoadError {
    #[inline]
    fn from(e: ParseError) -> Self {
        LoadError::Parse(e)
    }
}

#[derive(Debug, Fail)]
pub enum SearchError {
    #[fail(display = "{}", _0)]
    InvalidArgument(#[cause] InvalidArgument),
    #[fail(display = "{}", _0)]
    Parse(#[cause] ParseError),
    #[fail(display = "{}", _0)]
    Fetch(#[cause] FetchError),
}
impl From<InvalidArgument> for SearchError {
    #[inline]
    fn from(e: InvalidArgument) -> Self {
        SearchError::InvalidArgument(e)
    }
}
impl From<LoadError> for SearchError {
    #[inline]
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::Fetch(e) => SearchError::Fetch(e),
            LoadError::Parse(e) => SearchError::Parse(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn display_parse_error() {
        let error = ParseError::new(
            MappingFormat::TinyV2,
            ParseErrorKind::StructuralCorruption,
            "member before any class"
        ).at_line(3);
        assert_eq!(
            format!("{}", error),
            "Invalid TinyV2 mappings (corrupt structure) on line 3: member before any class"
        );
        assert_eq!(error.line(), Some(3));
    }
    #[test]
    fn load_error_into_search_error() {
        let parse = ParseError::new(
            MappingFormat::ProGuard,
            ParseErrorKind::EncodingOrStructuralCorruption,
            "invalid utf-8"
        );
        match SearchError::from(LoadError::from(parse.clone())) {
            SearchError::Parse(e) => assert_eq!(e, parse),
            other => panic!("Unexpected error {:?}", other),
        }
    }
}
