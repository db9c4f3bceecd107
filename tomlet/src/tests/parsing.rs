use crate::ast::{Expr, Program};
use crate::error::{Error, Found, Position, Span, Syntax, SyntaxElement, SyntaxError, Tagged, Token};
use crate::object::Object;
use crate::parsing::parse as parse_program;
use crate::traits::{Boxable, Taggable};
use crate::types::{BinOp, Key};
use crate::wrappers::OrderedMap;


fn parse(input: &str) -> Result<Vec<Tagged<Expr>>, Error> {
    parse_program(input).map(|x| x.statements)
}

fn single(input: &str) -> Result<Tagged<Expr>, Error> {
    parse(input).map(|mut x| {
        assert_eq!(x.len(), 1);
        x.remove(0)
    })
}

fn err<T>(offset: usize, line: u32, column: u32, found: Found, reason: T) -> Error
where
    Syntax: From<T>,
{
    SyntaxError::new(Position::new(offset, line, column), found, Some(Syntax::from(reason))).to_error()
}


trait KeyAble {
    fn key<T>(self, loc: T) -> Tagged<Key> where Span: From<T>;
    fn id<T>(self, loc: T) -> Tagged<Expr> where Span: From<T>;
}

impl<U> KeyAble for U where U: AsRef<str> {
    fn key<T>(self, loc: T) -> Tagged<Key> where Span: From<T> {
        Key::new(self.as_ref()).tag(loc)
    }

    fn id<T>(self, loc: T) -> Tagged<Expr> where Span: From<T> {
        Expr::Variable(Key::new(self.as_ref())).tag(loc)
    }
}

trait ExprAble {
    fn expr<T>(self, loc: T) -> Tagged<Expr> where Span: From<T>;
}

impl<U> ExprAble for U where Object: From<U> {
    fn expr<T>(self, loc: T) -> Tagged<Expr> where Span: From<T> {
        match Object::from(self) {
            Object::Integer(x) => Expr::integer(x),
            Object::Float(x) => Expr::float(x),
            Object::String(x) => Expr::String(x),
            other => panic!("no literal expression for {:?}", other),
        }.tag(loc)
    }
}

fn add(left: Tagged<Expr>, op: Span, right: Tagged<Expr>) -> Tagged<Expr> {
    let span = left.span().join(&right.span());
    Expr::BinOp {
        left: left.to_box(),
        op: BinOp::Add.tag(op),
        right: right.to_box(),
    }.tag(span)
}

fn dict(pairs: Vec<(&str, Tagged<Expr>)>) -> Expr {
    Expr::Dictionary(pairs.into_iter().map(|(k, v)| (Key::new(k), v)).collect::<OrderedMap<_, _>>())
}


#[test]
fn empty() {
    assert_eq!(parse_program(""), Ok(Program::default()));
    assert_eq!(parse_program("   \n\t "), Ok(Program::default()));
}


#[test]
fn integers() {
    assert_eq!(single("0"), Ok(0.expr(0..1)));
    assert_eq!(single("1"), Ok(1.expr(0..1)));
    assert_eq!(single("  12  "), Ok(12.expr(2..4)));
    assert_eq!(single("-5"), Ok((-5).expr(0..2)));
    assert_eq!(single("+5"), Ok(5.expr(0..2)));
    assert_eq!(single("9223372036854775807"), Ok(9223372036854775807i64.expr(0..19)));
    assert_eq!(single("-9223372036854775808"), Ok(i64::MIN.expr(0..20)));
}


#[test]
fn floats() {
    assert_eq!(single("0.0"), Ok(0f64.expr(0..3)));
    assert_eq!(single("5."), Ok(5f64.expr(0..2)));
    assert_eq!(single(".5"), Ok(0.5f64.expr(0..2)));
    assert_eq!(single("1e3"), Ok(1000f64.expr(0..3)));
    assert_eq!(single("1e+1"), Ok(10f64.expr(0..4)));
    assert_eq!(single("1E-1"), Ok(0.1f64.expr(0..4)));
    assert_eq!(single("-2.5e-1"), Ok((-0.25f64).expr(0..7)));
}


#[test]
fn strings() {
    assert_eq!(single("\"\""), Ok("".expr(0..2)));
    assert_eq!(single("\"dingbob\""), Ok("dingbob".expr(0..9)));
    assert_eq!(single("  \"dingbob\""), Ok("dingbob".expr(2..11)));
    assert_eq!(single("\"ding\\\"bob\""), Ok("ding\"bob".expr(0..11)));
    assert_eq!(single("\"ding\\\\bob\""), Ok("ding\\bob".expr(0..11)));
    assert_eq!(single("\"a\\nb\""), Ok("a\nb".expr(0..6)));
    assert_eq!(single("\"a\\tb\""), Ok("a\tb".expr(0..6)));
    assert_eq!(single("\"a\\qb\""), Ok("a\\qb".expr(0..6)));
    assert_eq!(single("\"line\nbreak\""), Ok("line\nbreak".expr(0..12)));
}


#[test]
fn escape_order() {
    // The newline substitution runs first and sees the second backslash
    assert_eq!(single("\"\\\\n\""), Ok("\\\n".expr(0..5)));
    assert_eq!(single("\"\\\\t\""), Ok("\\\t".expr(0..5)));
}


#[test]
fn identifiers() {
    assert_eq!(single("dingbob"), Ok("dingbob".id(0..7)));
    assert_eq!(single("_x1"), Ok("_x1".id(0..3)));
    assert_eq!(single("letter"), Ok("letter".id(0..6)));
    assert_eq!(single("lists"), Ok("lists".id(0..5)));
    assert_eq!(single("sort"), Ok("sort".id(0..4)));
    assert_eq!(single("sortValue"), Ok("sortValue".id(0..9)));
}


#[test]
fn lists() {
    assert_eq!(single("list()"), Ok(Expr::Array(vec![]).tag(0..6)));
    assert_eq!(single("list(  )"), Ok(Expr::Array(vec![]).tag(0..8)));

    assert_eq!(
        single("list(1, 2, 3)"),
        Ok(Expr::Array(vec![
            1.expr(5..6),
            2.expr(8..9),
            3.expr(11..12),
        ]).tag(0..13)),
    );

    assert_eq!(
        single("list(1,)"),
        Ok(Expr::Array(vec![1.expr(5..6)]).tag(0..8)),
    );

    assert_eq!(
        single("list(list(), \"a\")"),
        Ok(Expr::Array(vec![
            Expr::Array(vec![]).tag(5..11),
            "a".expr(13..16),
        ]).tag(0..17)),
    );
}


#[test]
fn dictionaries() {
    assert_eq!(single("$[]"), Ok(dict(vec![]).tag(0..3)));

    assert_eq!(
        single("$[a: 1, b: \"x\"]"),
        Ok(dict(vec![
            ("a", 1.expr(5..6)),
            ("b", "x".expr(11..14)),
        ]).tag(0..15)),
    );

    assert_eq!(
        single("$[a: 1,]"),
        Ok(dict(vec![("a", 1.expr(5..6))]).tag(0..8)),
    );

    assert_eq!(
        single("$[let: 1, list: 2]"),
        Ok(dict(vec![
            ("let", 1.expr(7..8)),
            ("list", 2.expr(16..17)),
        ]).tag(0..18)),
    );
}


#[test]
fn duplicate_keys() {
    let node = single("$[a: 1, b: 2, a: 3]");
    assert_eq!(
        node,
        Ok(dict(vec![
            ("a", 3.expr(17..18)),
            ("b", 2.expr(11..12)),
        ]).tag(0..19)),
    );

    match node.as_deref() {
        Ok(Expr::Dictionary(pairs)) => {
            let keys: Vec<&str> = pairs.keys().map(|k| k.as_str()).collect();
            assert_eq!(keys, vec!["a", "b"]);
        }
        other => panic!("expected a dictionary, got {:?}", other),
    }
}


#[test]
fn operators() {
    assert_eq!(
        single("1 + 2"),
        Ok(add(1.expr(0..1), Span::from(2..3), 2.expr(4..5))),
    );

    assert_eq!(
        single("1+2+3"),
        Ok(add(
            add(1.expr(0..1), Span::from(1..2), 2.expr(2..3)),
            Span::from(3..4),
            3.expr(4..5),
        )),
    );

    assert_eq!(
        single("\"a\" + -1"),
        Ok(add("a".expr(0..3), Span::from(4..5), (-1).expr(6..8))),
    );

    assert_eq!(
        single("(1 + 2) + 3"),
        Ok(add(
            add(1.expr(1..2), Span::from(3..4), 2.expr(5..6)).retag(0..7),
            Span::from(8..9),
            3.expr(10..11),
        )),
    );
}


#[test]
fn const_expressions() {
    assert_eq!(single("!{1}"), Ok(1.expr(0..4)));
    assert_eq!(
        single("!{x + 3}"),
        Ok(add("x".id(2..3), Span::from(4..5), 3.expr(6..7)).retag(0..8)),
    );
}


#[test]
fn calls() {
    assert_eq!(
        single("sort(list(3, 1))"),
        Ok(Expr::FunctionCall {
            name: "sort".key(0..4),
            args: vec![
                Expr::Array(vec![3.expr(10..11), 1.expr(13..14)]).tag(5..15),
            ],
        }.tag(0..16)),
    );

    assert_eq!(
        single("sort (x)"),
        Ok(Expr::FunctionCall {
            name: "sort".key(0..4),
            args: vec!["x".id(6..7)],
        }.tag(0..8)),
    );

    assert_eq!(
        single("sort(1, 2,)"),
        Ok(Expr::FunctionCall {
            name: "sort".key(0..4),
            args: vec![1.expr(5..6), 2.expr(8..9)],
        }.tag(0..11)),
    );
}


#[test]
fn names_before_parens() {
    assert_eq!(
        parse("a\n(1)"),
        Ok(vec!["a".id(0..1), 1.expr(2..5)]),
    );

    assert_eq!(
        parse("sortValue(x)"),
        Ok(vec!["sortValue".id(0..9), "x".id(9..12)]),
    );

    assert_eq!(
        parse("let b = a\n(b + 1)"),
        Ok(vec![
            Expr::Let {
                name: "b".key(4..5),
                value: "a".id(8..9).to_box(),
            }.tag(0..9),
            add("b".id(11..12), Span::from(13..14), 1.expr(15..16)).retag(10..17),
        ]),
    );

    assert_eq!(
        parse("f(1, 2,)"),
        Err(err(3, 0, 3, Found::Char(','), Token::CloseParen)),
    );
}


#[test]
fn lets() {
    assert_eq!(
        single("let x = 5"),
        Ok(Expr::Let {
            name: "x".key(4..5),
            value: 5.expr(8..9).to_box(),
        }.tag(0..9)),
    );

    assert_eq!(
        single("let letter = 1"),
        Ok(Expr::Let {
            name: "letter".key(4..10),
            value: 1.expr(13..14).to_box(),
        }.tag(0..14)),
    );
}


#[test]
fn statements() {
    assert_eq!(
        parse("let x = 5 !{x + 3}"),
        Ok(vec![
            Expr::Let {
                name: "x".key(4..5),
                value: 5.expr(8..9).to_box(),
            }.tag(0..9),
            add("x".id(12..13), Span::from(14..15), 3.expr(16..17)).retag(10..18),
        ]),
    );

    assert_eq!(
        parse("1 2 \"three\""),
        Ok(vec![1.expr(0..1), 2.expr(2..3), "three".expr(4..11)]),
    );

    assert_eq!(
        parse("let a = 1\nlet b = a"),
        Ok(vec![
            Expr::Let {
                name: "a".key(4..5),
                value: 1.expr(8..9).to_box(),
            }.tag(0..9),
            Expr::Let {
                name: "b".key(Position::new(14, 1, 4).with_length(1)),
                value: "a".id(Position::new(18, 1, 8).with_length(1)).to_box(),
            }.tag(Position::new(10, 1, 0).with_length(9)),
        ]),
    );
}


#[test]
fn syntax_errors() {
    assert_eq!(parse("\"abc"), Err(err(4, 0, 4, Found::EndOfInput, Token::DoubleQuote)));
    assert_eq!(parse("!{"), Err(err(2, 0, 2, Found::EndOfInput, SyntaxElement::Expression)));
    assert_eq!(parse("!{1"), Err(err(3, 0, 3, Found::EndOfInput, Token::CloseBrace)));
    assert_eq!(parse("!{1 2}"), Err(err(4, 0, 4, Found::Char('2'), Token::CloseBrace)));
    assert_eq!(parse("(1"), Err(err(2, 0, 2, Found::EndOfInput, Token::CloseParen)));

    assert_eq!(parse("list(1 2)"), Err(err(7, 0, 7, Found::Char('2'), (Token::CloseParen, Token::Comma))));
    assert_eq!(parse("list(1,"), Err(err(7, 0, 7, Found::EndOfInput, (Token::CloseParen, SyntaxElement::Expression))));
    assert_eq!(parse("$[a 1]"), Err(err(4, 0, 4, Found::Char('1'), Token::Colon)));
    assert_eq!(parse("$[a:]"), Err(err(4, 0, 4, Found::Char(']'), SyntaxElement::Expression)));
    assert_eq!(parse("$[1: 2]"), Err(err(2, 0, 2, Found::Char('1'), (Token::CloseBracket, SyntaxElement::DictEntry))));

    assert_eq!(parse("let"), Err(err(3, 0, 3, Found::EndOfInput, SyntaxElement::Identifier)));
    assert_eq!(parse("let = 1"), Err(err(4, 0, 4, Found::Char('='), SyntaxElement::Identifier)));
    assert_eq!(parse("let list = 1"), Err(err(4, 0, 4, Found::Char('l'), SyntaxElement::Identifier)));
    assert_eq!(parse("let x 1"), Err(err(6, 0, 6, Found::Char('1'), Token::Eq)));
    assert_eq!(parse("let x ="), Err(err(7, 0, 7, Found::EndOfInput, SyntaxElement::Expression)));

    assert_eq!(parse("1 +"), Err(err(3, 0, 3, Found::EndOfInput, SyntaxElement::Operand)));
    assert_eq!(parse(")"), Err(err(0, 0, 0, Found::Char(')'), SyntaxElement::Statement)));
    assert_eq!(parse("1 )"), Err(err(2, 0, 2, Found::Char(')'), SyntaxElement::Statement)));
    assert_eq!(parse("list"), Err(err(0, 0, 0, Found::Char('l'), SyntaxElement::Statement)));
    assert_eq!(parse("-"), Err(err(0, 0, 0, Found::Char('-'), SyntaxElement::Number)));
    assert_eq!(parse("."), Err(err(0, 0, 0, Found::Char('.'), SyntaxElement::Number)));

    assert_eq!(
        parse("let x = 1\nlet = 2"),
        Err(err(14, 1, 4, Found::Char('='), SyntaxElement::Identifier)),
    );
}


#[test]
fn dangling_exponent() {
    assert_eq!(parse("1e"), Err(err(2, 0, 2, Found::EndOfInput, SyntaxElement::Number)));
    assert_eq!(parse("1e+"), Err(err(3, 0, 3, Found::EndOfInput, SyntaxElement::Number)));
    assert_eq!(parse("2.5Ex"), Err(err(4, 0, 4, Found::Char('x'), SyntaxElement::Number)));
    assert_eq!(parse("let e = 7 1.5e"), Err(err(14, 0, 14, Found::EndOfInput, SyntaxElement::Number)));
    assert_eq!(parse("1 + 1e-"), Err(err(7, 0, 7, Found::EndOfInput, SyntaxElement::Number)));
}


#[test]
fn nesting() {
    let too_deep = |offset: usize, found: char| Err(
        SyntaxError::new(Position::new(offset, 0, offset as u32), Found::Char(found), Some(Syntax::NestingTooDeep)).to_error()
    );

    let parens = "(".repeat(10_000);
    assert_eq!(parse(&parens), too_deep(64, '('));

    let lists = "list(".repeat(100);
    assert_eq!(parse(&lists), too_deep(5 * 64, 'l'));

    let consts = "!{".repeat(100) + "1" + &"}".repeat(100);
    assert_eq!(parse(&consts), too_deep(2 * 64, '!'));

    let calls = "sort(".repeat(100);
    assert_eq!(parse(&calls), too_deep(5 * 64, 's'));

    let nested = "(".repeat(50) + "1" + &")".repeat(50);
    assert_eq!(single(&nested), Ok(1.expr(0..101)));

    let deepest = "(".repeat(63) + "1" + &")".repeat(63);
    assert_eq!(single(&deepest), Ok(1.expr(0..127)));

    let sums = vec!["(1)"; 1000].join(" + ");
    assert!(single(&sums).is_ok());
}


#[test]
fn number_out_of_range() {
    assert_eq!(
        parse("9223372036854775808"),
        Err(SyntaxError::new(Position::new(0, 0, 0), Found::Char('9'), Some(Syntax::NumberOutOfRange)).to_error()),
    );

    assert_eq!(
        parse("1 + -9223372036854775809"),
        Err(SyntaxError::new(Position::new(4, 0, 4), Found::Char('-'), Some(Syntax::NumberOutOfRange)).to_error()),
    );
}
