use std::cell::Cell;

use nom::{
    IResult, Parser as NomParser, Err as NomError,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{anychar, char, digit0, digit1, none_of, one_of, satisfy},
    combinator::{eof, map, not, opt, peek, recognize, verify},
    error::{ErrorKind, ParseError},
    multi::{many0, many0_count},
    sequence::{pair, preceded, terminated, tuple},
};
use nom_locate::LocatedSpan;

use crate::ast::{Expr, Program};
use crate::error::{Error, Found, Internal, Position, Span, Syntax, SyntaxError, SyntaxElement, Tagged, Token};
use crate::traits::{Boxable, Taggable};
use crate::types::{BinOp, Key};
use crate::wrappers::OrderedMap;


/// Words that have syntactic meaning and can't be used as variable names.
static KEYWORDS: [&str; 2] = ["let", "list"];

/// How deeply expressions may nest inside each other.
const MAX_DEPTH: usize = 64;

thread_local! {
    static DEPTH: Cell<usize> = Cell::new(0);
}


type In<'a> = LocatedSpan<&'a str>;
type Out<'a, T> = IResult<In<'a>, T, SyntaxError>;

trait Parser<'a, T>: NomParser<In<'a>, T, SyntaxError> {}
impl<'a, T, P> Parser<'a, T> for P where P: NomParser<In<'a>, T, SyntaxError> {}


/// Position of the first character of the input.
fn position(input: &In) -> Position {
    Position::new(
        input.location_offset(),
        input.location_line() - 1,
        (input.get_column() - 1) as u32,
    )
}

/// The first character of the input, if any.
fn found(input: &In) -> Found {
    input.fragment().chars().next().map(Found::Char).unwrap_or(Found::EndOfInput)
}

/// Span covering exactly the given fragment.
fn span_of(input: &In) -> Span {
    position(input).with_length(input.fragment().len())
}


trait ExplainError {
    fn error<'a, T>(input: In<'a>, reason: T) -> Self where Syntax: From<T>;
}

impl ExplainError for SyntaxError {
    fn error<'a, T>(input: In<'a>, reason: T) -> Self where Syntax: From<T> {
        // Errors point at the next meaningful character, not at the
        // whitespace preceding it
        let input = whitespace(input).map(|(i, _)| i).unwrap_or(input);
        SyntaxError::new(position(&input), found(&input), Some(Syntax::from(reason)))
    }
}

impl<'a> ParseError<In<'a>> for SyntaxError {
    fn from_error_kind(input: In<'a>, _: ErrorKind) -> Self {
        SyntaxError::new(position(&input), found(&input), None)
    }

    fn append(_: In<'a>, _: ErrorKind, other: Self) -> Self {
        other
    }
}


/// One level of expression nesting, released when dropped.
struct Nesting;

impl Nesting {
    /// Enter a nested expression, failing if that would exceed the maximum
    /// depth.
    fn enter(input: In) -> Result<Nesting, NomError<SyntaxError>> {
        let depth = DEPTH.with(|depth| {
            depth.set(depth.get() + 1);
            depth.get()
        });
        let guard = Nesting;
        if depth > MAX_DEPTH {
            return Err(NomError::Failure(SyntaxError::error(input, Syntax::NestingTooDeep)));
        }
        Ok(guard)
    }
}

impl Drop for Nesting {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}


/// Convert errors to failures.
///
/// A recoverable error lets `alt` and friends try other branches. Once enough
/// of a construct has been seen that no other branch can apply, anything
/// further that goes wrong should abort parsing with an explanation.
fn fail<'a, O, T>(
    mut parser: impl Parser<'a, O>,
    reason: T,
) -> impl Parser<'a, O>
where Syntax: From<T>, T: Copy
{
    move |input: In<'a>| {
        parser.parse(input).map_err(
            |err| match err {
                NomError::Error(_) => NomError::Failure(SyntaxError::error(input, reason)),
                _ => err,
            }
        )
    }
}


/// Comma-separated list of items up to and including a terminator, with an
/// optional trailing comma. The opening token must already be consumed.
///
/// Returns the items and the span of the terminator.
fn seplist<'a, Item, Term, ItemR, T, U>(
    mut item: Item,
    mut terminator: Term,
    err_terminator_or_item: T,
    err_terminator_or_separator: U,
) -> impl Parser<'a, (Vec<ItemR>, Span)>
where
    Item: Parser<'a, ItemR>,
    Term: Parser<'a, Span>,
    Syntax: From<T> + From<U>,
    T: Copy,
    U: Copy,
{
    move |mut i: In<'a>| {
        let mut items = Vec::new();

        loop {
            // Expect a terminator or an item
            match terminator.parse(i) {
                Ok((j, end)) => return Ok((j, (items, end))),
                Err(NomError::Error(_)) => { },
                Err(e) => return Err(e),
            }

            match item.parse(i) {
                Ok((j, it)) => {
                    items.push(it);
                    i = j;
                }
                Err(NomError::Error(_)) => return Err(NomError::Failure(
                    SyntaxError::error(i, err_terminator_or_item)
                )),
                Err(e) => return Err(e),
            }

            // Expect a terminator or a separator
            match terminator.parse(i) {
                Ok((j, end)) => return Ok((j, (items, end))),
                Err(NomError::Error(_)) => { },
                Err(e) => return Err(e),
            }

            match comma(i) {
                Ok((j, _)) => { i = j; }
                Err(NomError::Error(_)) => return Err(NomError::Failure(
                    SyntaxError::error(i, err_terminator_or_separator)
                )),
                Err(e) => return Err(e),
            }
        }
    }
}


/// Wrap the output of a parser in a tag spanning from the first
/// non-whitespace character it consumed to the last character it consumed.
fn tagged<'a, O>(mut parser: impl Parser<'a, O>) -> impl Parser<'a, Tagged<O>> {
    move |input: In<'a>| {
        let (start, _) = whitespace(input)?;
        let (rest, out) = parser.parse(start)?;
        let span = position(&start).with_length(rest.location_offset() - start.location_offset());
        Ok((rest, out.tag(span)))
    }
}


fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Matches any amount of whitespace, including newlines.
fn whitespace<'a>(input: In<'a>) -> Out<'a, In<'a>> {
    take_while(|c: char| c.is_whitespace())(input)
}

/// Matches a fixed string after optional whitespace, returning its span.
fn token<'a>(value: &'static str) -> impl Parser<'a, Span> {
    map(
        preceded(whitespace, tag(value)),
        |x: In<'a>| span_of(&x),
    )
}

/// Matches a keyword, which may not be directly followed by a character that
/// could continue an identifier.
fn keyword<'a>(value: &'static str) -> impl Parser<'a, Span> {
    terminated(token(value), not(satisfy(is_identifier_char)))
}

fn comma<'a>(input: In<'a>) -> Out<'a, Span> {
    token(",").parse(input)
}

fn close_paren<'a>(input: In<'a>) -> Out<'a, Span> {
    token(")").parse(input)
}

fn close_bracket<'a>(input: In<'a>) -> Out<'a, Span> {
    token("]").parse(input)
}


/// Matches the longest run of identifier characters that doesn't start with
/// a digit. Keywords are allowed.
fn name<'a>(input: In<'a>) -> Out<'a, Tagged<&'a str>> {
    map(
        preceded(
            whitespace,
            recognize(pair(
                satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
                take_while(is_identifier_char),
            )),
        ),
        |x: In<'a>| (*x.fragment()).tag(span_of(&x)),
    )(input)
}

/// Matches a name that is not a keyword.
fn identifier<'a>(input: In<'a>) -> Out<'a, Tagged<Key>> {
    map(
        verify(name, |x: &Tagged<&'a str>| !KEYWORDS.contains(&**x)),
        |x| x.map(Key::new),
    )(input)
}

/// Matches a dictionary key. Keywords are allowed here.
fn map_identifier<'a>(input: In<'a>) -> Out<'a, Tagged<Key>> {
    map(name, |x| x.map(Key::new))(input)
}


/// Matches the characters of a numeric literal: optional sign, digits with
/// an optional fractional part (or a fractional part alone), and an optional
/// exponent. An exponent marker must be followed by digits.
fn number_lexeme<'a>(input: In<'a>) -> Out<'a, In<'a>> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(pair(
            one_of("eE"),
            preceded(opt(one_of("+-")), fail(digit1, SyntaxElement::Number)),
        )),
    )))(input)
}

/// Matches a number literal. A lexeme with a decimal point or an exponent is
/// a float, otherwise it's an integer.
fn number<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    let (i, _) = preceded(whitespace, peek(one_of("+-.0123456789")))(input)?;
    let (rest, lexeme) = fail(number_lexeme, SyntaxElement::Number).parse(i)?;

    let text = *lexeme.fragment();
    let out_of_range = || NomError::Failure(SyntaxError::new(
        position(&lexeme),
        found(&lexeme),
        Some(Syntax::NumberOutOfRange),
    ));

    let expr = if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        text.parse::<f64>().map(Expr::float).map_err(|_| out_of_range())?
    } else {
        text.parse::<i64>().map(Expr::integer).map_err(|_| out_of_range())?
    };

    Ok((rest, expr.tag(span_of(&lexeme))))
}


/// Resolve escape sequences in a raw string literal.
///
/// The substitutions are applied one after the other over the whole string,
/// so their order is observable: `\\n` becomes a backslash followed by a
/// newline. Unknown escapes are left alone.
fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

/// Matches a double-quoted string literal. A backslash always consumes the
/// following character, so an escaped quote doesn't end the string.
fn string<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    tagged(map(
        preceded(
            char('"'),
            terminated(
                recognize(many0_count(alt((
                    recognize(pair(char('\\'), anychar)),
                    recognize(none_of("\\\"")),
                )))),
                fail(char('"'), Token::DoubleQuote),
            ),
        ),
        |raw: In<'a>| Expr::String(unescape(raw.fragment())),
    )).parse(input)
}


/// Matches an array literal: `list(a, b, ...)`.
fn list<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    map(
        pair(
            token("list("),
            seplist(
                expression,
                close_paren,
                (Token::CloseParen, SyntaxElement::Expression),
                (Token::CloseParen, Token::Comma),
            ),
        ),
        |(start, (elements, end))| Expr::Array(elements).tag(start.join(&end)),
    )(input)
}


/// Matches a dictionary entry: `key: value`.
fn dict_entry<'a>(input: In<'a>) -> Out<'a, (Tagged<Key>, Tagged<Expr>)> {
    pair(
        map_identifier,
        preceded(
            fail(token(":"), Token::Colon),
            fail(expression, SyntaxElement::Expression),
        ),
    )(input)
}

/// Matches a dictionary literal: `$[a: x, b: y, ...]`.
///
/// A repeated key keeps the position of its first occurrence and the value
/// of its last.
fn dictionary<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    map(
        pair(
            token("$["),
            seplist(
                dict_entry,
                close_bracket,
                (Token::CloseBracket, SyntaxElement::DictEntry),
                (Token::CloseBracket, Token::Comma),
            ),
        ),
        |(start, (entries, end))| {
            let mut pairs = OrderedMap::new();
            for (key, value) in entries {
                pairs.insert(key.unwrap(), value);
            }
            Expr::Dictionary(pairs).tag(start.join(&end))
        },
    )(input)
}


/// Matches a parenthesized expression.
fn paren<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    map(
        tuple((
            token("("),
            fail(expression, SyntaxElement::Expression),
            fail(token(")"), Token::CloseParen),
        )),
        |(start, expr, end)| expr.retag(start.join(&end)),
    )(input)
}

/// Matches a const expression: `!{ expr }`. This is purely a marker and
/// produces the inner expression, tagged with the outer span.
fn const_expr<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    map(
        tuple((
            token("!{"),
            fail(expression, SyntaxElement::Expression),
            fail(token("}"), Token::CloseBrace),
        )),
        |(start, expr, end)| expr.retag(start.join(&end)),
    )(input)
}

fn variable<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    map(identifier, |name| Expr::Variable(*name).tag(&name))(input)
}

/// Matches a call to `sort`: the name followed by a parenthesized argument
/// list. Any other name followed by `(` is a variable, and the parenthesized
/// expression starts a new statement.
fn call<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    map(
        tuple((
            map(keyword("sort"), |span| Key::new("sort").tag(span)),
            token("("),
            seplist(
                expression,
                close_paren,
                (Token::CloseParen, SyntaxElement::Expression),
                (Token::CloseParen, Token::Comma),
            ),
        )),
        |(name, _, (args, end))| {
            let span = name.span().join(&end);
            Expr::FunctionCall { name, args }.tag(span)
        },
    )(input)
}


/// Matches anything that can be an operand of `+`.
fn factor<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    alt((
        const_expr,
        number,
        string,
        list,
        dictionary,
        paren,
        variable,
    ))(input)
}

fn term<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    alt((call, factor))(input)
}

/// Matches a chain of operands joined by `+`, folded to the left.
fn expression<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    let _nesting = Nesting::enter(input)?;
    map(
        pair(
            term,
            many0(pair(token("+"), fail(term, SyntaxElement::Operand))),
        ),
        |(first, rest)| rest.into_iter().fold(first, |left, (op, right)| {
            let span = left.span().join(&right.span());
            Expr::BinOp {
                left: left.to_box(),
                op: BinOp::Add.tag(op),
                right: right.to_box(),
            }.tag(span)
        }),
    )(input)
}


/// Matches a binding: `let name = value`.
fn let_decl<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    map(
        tuple((
            keyword("let"),
            fail(identifier, SyntaxElement::Identifier),
            fail(token("="), Token::Eq),
            fail(expression, SyntaxElement::Expression),
        )),
        |(start, name, _, value)| {
            let span = start.join(&value.span());
            Expr::Let { name, value: value.to_box() }.tag(span)
        },
    )(input)
}

fn statement<'a>(input: In<'a>) -> Out<'a, Tagged<Expr>> {
    alt((let_decl, expression))(input)
}

/// Matches a whole program: statements until end of input.
fn program<'a>(input: In<'a>) -> Out<'a, Program> {
    map(
        terminated(
            many0(statement),
            fail(preceded(whitespace, eof), SyntaxElement::Statement),
        ),
        |statements| Program { statements },
    )(input)
}


/// Parse a source text to an AST.
pub fn parse(input: &str) -> Result<Program, Error> {
    program(In::new(input)).map_or_else(
        |err| match err {
            NomError::Incomplete(_) => Err(Error::new(Internal::IncompleteInput)),
            NomError::Error(e) | NomError::Failure(e) => Err(e.to_error()),
        },
        |(_, node)| Ok(node),
    )
}
