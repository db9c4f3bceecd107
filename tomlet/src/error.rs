use std::fmt::{Debug, Display, Write};
use std::ops::{Deref, Range};

use crate::serialize::Format;
use crate::types::{BinOp, Key, Type};

/// Marks a position in a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    offset: usize,
    line: u32,
    column: u32,
}

impl Position {
    /// Construct a new position from offset, line and column (all 0-indexed).
    ///
    /// The column is counted in bytes from the beginning of the line.
    pub fn new(offset: usize, line: u32, column: u32) -> Position {
        Position {
            offset,
            line,
            column,
        }
    }

    /// Return the zero-indexed offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the zero-indexed line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Return the zero-indexed column number.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Return a new span starting at this position with a certain length.
    pub fn with_length(&self, length: usize) -> Span {
        Span {
            start: *self,
            length,
        }
    }
}

/// Mark an interval of text in a buffer starting at a `Position` with a length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: Position,
    length: usize,
}

impl Span {
    /// The starting position in the text span.
    pub fn start(&self) -> Position {
        self.start
    }

    /// The offset of the start of the span into the buffer.
    pub fn offset(&self) -> usize {
        self.start.offset
    }

    /// The zero-indexed line number of the start of the span.
    pub fn line(&self) -> u32 {
        self.start.line
    }

    /// The zero-indexed column number of the start of the span.
    pub fn column(&self) -> u32 {
        self.start.column
    }

    /// The length of the span.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Return the smallest span covering both `self` and `other`, assuming
    /// `other` does not start before `self`.
    pub fn join(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            length: other.offset() + other.length() - self.offset(),
        }
    }
}

impl From<Range<usize>> for Span {
    /// Convert a range of offsets to a text span, assuming the interval begins
    /// on the first line.
    fn from(value: Range<usize>) -> Self {
        Span {
            start: Position::new(value.start, 0, value.start as u32),
            length: value.end - value.start,
        }
    }
}

impl<T> From<&Tagged<T>> for Span {
    fn from(value: &Tagged<T>) -> Self {
        value.span()
    }
}

/// A wrapper for marking any object with a text span pointing to its origin in
/// a source file.
///
/// The AST (see ast.rs) makes heavy use of Tagged objects, so that errors can
/// be accurately reported.
#[derive(Clone, Copy, PartialEq)]
pub struct Tagged<T> {
    span: Span,
    contents: T,
}

impl<T> Tagged<T> {
    /// Construct a new Tagged wrapper.
    pub fn new(location: Span, contents: T) -> Tagged<T> {
        Tagged::<T> {
            span: location,
            contents,
        }
    }

    /// Return the text span.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Destroy the wrapper and return its contents.
    pub fn unwrap(self) -> T {
        self.contents
    }

    /// Map the wrapped object and return a new tagged wrapper.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tagged<U> {
        Tagged::<U> {
            span: self.span,
            contents: f(self.contents),
        }
    }

    /// Substitute the text span with a new one.
    pub fn retag<U>(self, loc: U) -> Tagged<T>
    where
        Span: From<U>,
    {
        Tagged::<T> {
            span: Span::from(loc),
            contents: self.contents,
        }
    }
}

impl<T: Debug> Debug for Tagged<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.contents.fmt(f)?;
        let span = self.span;
        f.write_fmt(format_args!(
            ".tag({}:{}, {}..{})",
            span.line() + 1,
            span.column() + 1,
            span.offset(),
            span.offset() + span.length()
        ))
    }
}

impl<T> Deref for Tagged<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.contents
    }
}

impl<T> AsRef<T> for Tagged<T> {
    fn as_ref(&self) -> &T {
        &self.contents
    }
}

/// What the parser found at the point of a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Char(char),
    EndOfInput,
}

impl Display for Found {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char(c) => f.write_fmt(format_args!("{:?}", c)),
            Self::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Error type used by the parser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntaxError {
    position: Position,
    found: Found,
    reason: Option<Syntax>,
}

impl SyntaxError {
    /// Create a new syntax error.
    pub fn new(position: Position, found: Found, reason: Option<Syntax>) -> SyntaxError {
        SyntaxError { position, found, reason }
    }

    /// Convert to the general error type.
    pub fn to_error(self) -> Error {
        let SyntaxError { position, found, reason } = self;
        Error {
            locations: Some(vec![(position.with_length(0), Action::Parse)]),
            reason: Some(Reason::Syntax(found, reason.unwrap_or(Syntax::Unexpected))),
            rendered: None,
        }
    }
}

/// Punctuation the parser can demand by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    CloseBrace,
    CloseBracket,
    CloseParen,
    Colon,
    Comma,
    DoubleQuote,
    Eq,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CloseBrace => f.write_str("'}'"),
            Self::CloseBracket => f.write_str("']'"),
            Self::CloseParen => f.write_str("')'"),
            Self::Colon => f.write_str("':'"),
            Self::Comma => f.write_str("','"),
            Self::DoubleQuote => f.write_str("'\"'"),
            Self::Eq => f.write_str("'='"),
        }
    }
}

/// A complete enumeration of all grammatical elements the parser may report
/// as missing, including tokens as well as composite structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxElement {
    /// A key-value pair in a dictionary
    DictEntry,

    /// An expression
    Expression,

    /// An identifier ('variable' name)
    Identifier,

    /// A number
    Number,

    /// An operand corresponding to an operator
    Operand,

    /// A top-level statement (let or expression)
    Statement,

    /// A punctuation token
    Token(Token),
}

impl From<Token> for SyntaxElement {
    fn from(value: Token) -> Self {
        Self::Token(value)
    }
}

impl Display for SyntaxElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DictEntry => f.write_str("dictionary entry"),
            Self::Expression => f.write_str("expression"),
            Self::Identifier => f.write_str("identifier"),
            Self::Number => f.write_str("number"),
            Self::Operand => f.write_str("operand"),
            Self::Statement => f.write_str("statement"),
            Self::Token(t) => Display::fmt(t, f),
        }
    }
}

/// Enumerates all the possible reasons for a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Expected a grammatical element but found another
    ExpectedOne(SyntaxElement),

    /// Expected one of two grammatical elements but found another
    ExpectedTwo(SyntaxElement, SyntaxElement),

    /// Integer literal does not fit in 64 bits
    NumberOutOfRange,

    /// Expressions nested too deeply
    NestingTooDeep,

    /// The parser gave up without a more precise explanation
    Unexpected,
}

impl<T> From<T> for Syntax
where
    SyntaxElement: From<T>,
{
    fn from(value: T) -> Self {
        Self::ExpectedOne(SyntaxElement::from(value))
    }
}

impl<T, U> From<(T, U)> for Syntax
where
    SyntaxElement: From<T> + From<U>,
{
    fn from((x, y): (T, U)) -> Self {
        Self::ExpectedTwo(SyntaxElement::from(x), SyntaxElement::from(y))
    }
}

/// Enumerates possible reasons for internal errors (which shouldn't happen).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Internal {
    /// The parser asked for more input, which the complete parsers never do. (001)
    IncompleteInput,
}

impl Internal {
    fn error_code(&self) -> usize {
        match self {
            Self::IncompleteInput => 1,
        }
    }
}

/// Enumerates different type mismatch reasons.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TypeMismatch {
    /// Two types were incompatible with a binary operator.
    BinOp(Type, Type, BinOp),

    /// Expected a positional function parameter to have a certain type, but it didn't.
    ExpectedArg {
        /// The zero-based index of the parameter.
        index: usize,

        /// Allowed type.
        allowed: Type,

        /// Actual type received in function call.
        received: Type,
    },

    /// Expected the number of arguments to fall in a certain range, but it didn't.
    ArgCount {
        /// Lower bound on number of arguments.
        low: usize,

        /// Upper bound on number of arguments.
        high: usize,

        /// Actual number of arguments received.
        received: usize,
    },

    /// Two values have no natural order relative to each other.
    Incomparable(Type, Type),

    /// The output format has no representation for this type.
    Serialize(Type, Format),
}

/// Errors where the types were right but the values were not.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Value {
    /// Integer arithmetic overflowed 64 bits.
    IntegerOverflow,
}

/// Enumerates all different reasons for errors.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reason {
    /// Syntax errors, with what the parser found where it failed.
    Syntax(Found, Syntax),

    /// Reference to a name that was never bound.
    Unbound(Key),

    /// Call to a function that does not exist.
    UnknownFunction(Key),

    /// Type mismatch errors.
    TypeMismatch(TypeMismatch),

    /// Value-based errors (type was correct).
    Value(Value),

    /// Internal errors.
    Internal(Internal),

    /// Errors from the outside world, such as I/O or the output encoder.
    External(String),
}

impl From<Internal> for Reason {
    fn from(value: Internal) -> Self {
        Self::Internal(value)
    }
}

impl From<TypeMismatch> for Reason {
    fn from(value: TypeMismatch) -> Self {
        Self::TypeMismatch(value)
    }
}

impl From<Value> for Reason {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Enumerates all different 'actions' - things that tomlet might try to do
/// which can cause an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Parsing phase.
    Parse,

    /// Looking up a variable name in the namespace.
    LookupName,

    /// Looking up a function in the builtin registry.
    LookupFunction,

    /// Applying an operator.
    Evaluate,

    /// Calling a function.
    Call,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => f.write_str("parsing"),
            Self::LookupName => f.write_str("looking up name"),
            Self::LookupFunction => f.write_str("looking up function"),
            Self::Evaluate => f.write_str("evaluating"),
            Self::Call => f.write_str("calling function"),
        }
    }
}

/// Coarse classification of errors, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Name,
    Type,
    Other,
}

impl ErrorKind {
    /// Process exit code for this kind of error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Other => 1,
            Self::Syntax => 2,
            Self::Name => 3,
            Self::Type => 4,
        }
    }

    /// Human-readable message prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Syntax => "Syntax error",
            Self::Name => "Name error",
            Self::Type => "Type error",
            Self::Other => "Error",
        }
    }
}

/// The general error type of tomlet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Error {
    /// Stack trace of locations where the error happened.
    locations: Option<Vec<(Span, Action)>>,

    /// Reason for the error.
    reason: Option<Reason>,

    /// Human friendly string representation.
    rendered: Option<String>,
}

impl Error {
    /// Append a location to the stack. Takes ownership and returns the same
    /// object, for ease of use with `Result::map_err`.
    pub(crate) fn tag<T>(mut self, loc: T, action: Action) -> Self
    where
        Span: From<T>,
    {
        match &mut self.locations {
            None => {
                self.locations = Some(vec![(Span::from(loc), action)]);
            }
            Some(vec) => {
                vec.push((Span::from(loc), action));
            }
        }
        self
    }

    /// Get the human-friendly text
    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match &self.reason {
            Some(Reason::Syntax(..)) => ErrorKind::Syntax,
            Some(Reason::Unbound(_)) | Some(Reason::UnknownFunction(_)) => ErrorKind::Name,
            Some(Reason::TypeMismatch(_)) => ErrorKind::Type,
            _ => ErrorKind::Other,
        }
    }

    /// Construct a new error with an empty stack.
    pub(crate) fn new<T>(reason: T) -> Self
    where
        Reason: From<T>,
    {
        Self {
            locations: None,
            reason: Some(Reason::from(reason)),
            rendered: None,
        }
    }

    /// Add a human-friendly string representation.
    pub fn render(mut self, code: Option<&str>) -> Self {
        if self.rendered.is_none() {
            self.rendered = Some(format!("{}", ErrorRenderer(&self, code)));
        }
        self
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::new(Reason::External(value.to_string()))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rendered {
            Some(text) => f.write_str(text),
            None => ErrorRenderer(self, None).fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl Display for Syntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedOne(x) => f.write_fmt(format_args!("expected {}", x)),
            Self::ExpectedTwo(x, y) => f.write_fmt(format_args!("expected {} or {}", x, y)),
            Self::NumberOutOfRange => f.write_str("number out of range"),
            Self::NestingTooDeep => f.write_str("nesting too deep"),
            Self::Unexpected => f.write_str("unexpected input"),
        }
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(found, syntax) => f.write_fmt(format_args!("{}, found {}", syntax, found)),
            Self::Unbound(key) => f.write_fmt(format_args!("unbound name '{}'", key.as_str())),
            Self::UnknownFunction(key) => f.write_fmt(format_args!("unknown function '{}'", key.as_str())),

            Self::TypeMismatch(TypeMismatch::BinOp(x, y, op)) => f.write_fmt(format_args!(
                "unsupported operand types for {}: {} and {}", op, x, y,
            )),
            Self::TypeMismatch(TypeMismatch::ExpectedArg { index, allowed, received }) => f.write_fmt(format_args!(
                "expected argument {} to be {}, got {}", index + 1, allowed, received,
            )),
            Self::TypeMismatch(TypeMismatch::ArgCount { low, high, received }) if low == high => f.write_fmt(format_args!(
                "expected {} argument{}, got {}", low, if *low == 1 { "" } else { "s" }, received,
            )),
            Self::TypeMismatch(TypeMismatch::ArgCount { low, high, received }) => f.write_fmt(format_args!(
                "expected {} to {} arguments, got {}", low, high, received,
            )),
            Self::TypeMismatch(TypeMismatch::Incomparable(x, y)) => f.write_fmt(format_args!(
                "cannot sort: {} and {} are not comparable", x, y,
            )),
            Self::TypeMismatch(TypeMismatch::Serialize(x, format)) => f.write_fmt(format_args!(
                "cannot serialize {} to {}", x, format,
            )),

            Self::Value(Value::IntegerOverflow) => f.write_str("integer overflow"),
            Self::Internal(reason) => f.write_fmt(format_args!(
                "internal error {:03} - this should not happen, please file a bug report", reason.error_code(),
            )),
            Self::External(reason) => f.write_str(reason),
        }
    }
}

/// Utility struct for facilitating error rendering.
///
/// Has access to both the error and the code, so that it can just implement the
/// Display trait.
struct ErrorRenderer<'a>(&'a Error, Option<&'a str>);

impl<'a> Display for ErrorRenderer<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ErrorRenderer(err, code) = self;

        f.write_fmt(format_args!("{}: ", err.kind().prefix()))?;
        match &err.reason {
            Some(reason) => f.write_fmt(format_args!("{}", reason))?,
            None => f.write_str("unknown reason")?,
        }

        let locs = match err.locations.as_ref() {
            Some(locs) => locs,
            None => return Ok(()),
        };

        for (loc, act) in locs.iter() {
            // Offset of the beginning of the line
            let bol = loc.offset() - loc.column() as usize;
            let mut column = loc.column() as usize;

            if let Some(code) = code {
                // Offset of the end of the line
                let eol = code.get(loc.offset()..)
                    .and_then(|rest| rest.find('\n'))
                    .map(|x| x + loc.offset())
                    .unwrap_or(code.len());

                if let (Some(line), Some(prefix)) = (code.get(bol..eol), code.get(bol..loc.offset())) {
                    column = prefix.chars().count();

                    // Number of carets: the span clipped to the line, but at
                    // least one so that empty spans stay visible
                    let carets = code.get(loc.offset()..(loc.offset() + loc.length()).min(eol))
                        .map(|s| s.chars().count())
                        .unwrap_or(0)
                        .max(1);

                    f.write_char('\n')?;
                    f.write_str(line.trim_end_matches('\r'))?;
                    f.write_char('\n')?;
                    for _ in 0..column {
                        f.write_char(' ')?;
                    }
                    for _ in 0..carets {
                        f.write_char('^')?;
                    }
                }
            }

            f.write_fmt(format_args!(
                "\nwhile {} at {}:{}",
                act,
                loc.line() + 1,
                column + 1,
            ))?;
        }

        Ok(())
    }
}
