//! Evaluator for the JavaScript object literal assigned to `AF_dataServiceRequests`.
//!
//! Only literal syntax is understood: objects (quoted, unquoted or numeric keys),
//! arrays (holes and trailing commas included), strings in either quote style,
//! numbers, `true`, `false`, `null` and `undefined`. Anything that would need an
//! interpreter, such as identifiers, calls or functions, is rejected.

use std::str::CharIndices;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while};
use nom::character::complete::{char, multispace0, satisfy};
use nom::combinator::{all_consuming, map, not, opt, recognize, value};
use nom::error::{Error as NomError, ErrorKind};
use nom::multi::separated_list0;
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, pair, separated_pair, terminated};
use nom::{IResult, Parser};
use serde_json::{Map, Number, Value};

use crate::{Error, Result};

/// Deepest object/array nesting accepted before the literal is rejected.
pub const MAX_DEPTH: usize = 128;

/// Evaluates `text` as a single object literal.
pub fn evaluate_object_literal(text: &str) -> Result<Map<String, Value>> {
    fn top(input: &str) -> IResult<&str, Map<String, Value>> {
        object(input, 1)
    }

    match all_consuming(ws(top)).parse(text) {
        Ok((_, map)) => Ok(map),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(Error::JsLiteral(format!(
            "unexpected input at byte {}",
            text.len() - e.input.len()
        ))),
        Err(nom::Err::Incomplete(_)) => Err(Error::JsLiteral("literal is truncated".into())),
    }
}

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = NomError<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = NomError<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn failure(input: &str, kind: ErrorKind) -> nom::Err<NomError<&str>> {
    nom::Err::Failure(NomError::new(input, kind))
}

fn js_value(input: &str, depth: usize) -> IResult<&str, Value> {
    match input.chars().next() {
        Some('{') => return object(input, depth + 1).map(|(rest, members)| (rest, Value::Object(members))),
        Some('[') => return array(input, depth + 1).map(|(rest, items)| (rest, Value::Array(items))),
        _ => {}
    }
    alt((
        map(string_literal, Value::String),
        keyword("true", Value::Bool(true)),
        keyword("false", Value::Bool(false)),
        keyword("null", Value::Null),
        keyword("undefined", Value::Null),
        number,
    ))
    .parse(input)
}

fn keyword<'a>(
    word: &'static str,
    out: Value,
) -> impl Parser<&'a str, Output = Value, Error = NomError<&'a str>> {
    value(out, terminated(tag(word), not(satisfy(is_ident_char))))
}

fn too_deep(input: &str, depth: usize) -> std::result::Result<(), nom::Err<NomError<&str>>> {
    if depth > MAX_DEPTH {
        return Err(failure(input, ErrorKind::TooLarge));
    }
    Ok(())
}

fn object<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Map<String, Value>> {
    too_deep(input, depth)?;
    let (rest, mut members) = delimited(
        char('{'),
        separated_list0(char(','), ws(opt(move |i: &'a str| member(i, depth)))),
        char('}'),
    )
    .parse(input)?;

    // One trailing comma is allowed, an empty slot anywhere else is not.
    if members.last().is_some_and(Option::is_none) {
        members.pop();
    }
    let map = members
        .into_iter()
        .collect::<Option<Map<String, Value>>>()
        .ok_or_else(|| failure(input, ErrorKind::SeparatedList))?;
    Ok((rest, map))
}

fn member<'a>(input: &'a str, depth: usize) -> IResult<&'a str, (String, Value)> {
    separated_pair(ws(key), char(':'), ws(move |i: &'a str| js_value(i, depth))).parse(input)
}

fn key(input: &str) -> IResult<&str, String> {
    alt((
        string_literal,
        map(identifier, String::from),
        map(recognize_float, String::from),
    ))
    .parse(input)
}

fn array<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Vec<Value>> {
    too_deep(input, depth)?;
    let (rest, mut items) = delimited(
        char('['),
        separated_list0(char(','), ws(opt(move |i: &'a str| js_value(i, depth)))),
        char(']'),
    )
    .parse(input)?;

    if items.last().is_some_and(Option::is_none) {
        items.pop();
    }
    Ok((rest, items.into_iter().map(|v| v.unwrap_or(Value::Null)).collect()))
}

fn number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize_float(input)?;
    let number = text
        .parse::<i64>()
        .map(Number::from)
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64))
        .ok_or_else(|| failure(input, ErrorKind::Float))?;
    Ok((rest, Value::Number(number)))
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_ident_start), take_while(is_ident_char))).parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    let (rest, quote) = alt((char('"'), char('\''))).parse(input)?;
    let mut out = String::new();
    let mut chars = rest.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((&rest[i + 1..], out)),
            '\n' | '\r' => return Err(failure(&rest[i..], ErrorKind::Char)),
            '\\' => {
                let escaped = escape(&mut chars).ok_or_else(|| failure(&rest[i..], ErrorKind::Escaped))?;
                out.extend(escaped);
            }
            c => out.push(c),
        }
    }
    Err(failure(input, ErrorKind::Char))
}

/// Decodes the escape following a backslash. `Some(None)` is a line continuation.
fn escape(chars: &mut CharIndices<'_>) -> Option<Option<char>> {
    let (_, c) = chars.next()?;
    let decoded = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        '0' => '\0',
        'x' => char::from_u32(hex_digits(chars, 2)?)?,
        'u' => unicode_escape(chars)?,
        '\n' => return Some(None),
        '\r' => {
            if chars.clone().next().is_some_and(|(_, c)| c == '\n') {
                chars.next();
            }
            return Some(None);
        }
        other => other,
    };
    Some(Some(decoded))
}

fn hex_digits(chars: &mut CharIndices<'_>, count: usize) -> Option<u32> {
    let mut code = 0;
    for _ in 0..count {
        let (_, c) = chars.next()?;
        code = code * 16 + c.to_digit(16)?;
    }
    Some(code)
}

fn unicode_escape(chars: &mut CharIndices<'_>) -> Option<char> {
    if chars.clone().next().is_some_and(|(_, c)| c == '{') {
        chars.next();
        let mut code: u32 = 0;
        let mut digits = 0;
        loop {
            let (_, c) = chars.next()?;
            if c == '}' {
                break;
            }
            code = code.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
            digits += 1;
        }
        return (digits > 0).then_some(code).and_then(char::from_u32);
    }

    let high = hex_digits(chars, 4)?;
    if !(0xD800..0xDC00).contains(&high) {
        return Some(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    // A high surrogate only makes a character together with the `\uXXXX` low half after it.
    let mut lookahead = chars.clone();
    if let (Some((_, '\\')), Some((_, 'u'))) = (lookahead.next(), lookahead.next()) {
        if let Some(low) = hex_digits(&mut lookahead, 4).filter(|low| (0xDC00..0xE000).contains(low)) {
            *chars = lookahead;
            return char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00));
        }
    }
    Some(char::REPLACEMENT_CHARACTER)
}
