// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP/IFC entity-line parser built with nom.
//!
//! Tokenizes one `#id=IFCTYPE(...);` line at a time. Type names are kept
//! as string slices; schema knowledge lives in [`crate::schema`].

use nom::{
    branch::alt,
    character::complete::{char, digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};

/// One attribute token of a STEP entity line
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Entity reference: `#123`
    Ref(u32),
    /// String literal: `'text'` (escapes not unfolded)
    Str(&'a str),
    /// Integer: `42`
    Int(i64),
    /// Real: `3.14`, `0.`, `1.5E-10`
    Real(f64),
    /// Enumeration: `.TRUE.`, `.ELEMENT.`
    Enum(&'a str),
    /// List: `(1, 2, 3)`, possibly nested
    List(Vec<Token<'a>>),
    /// Wrapped select value: `IFCLABEL('x')`, `IFCBOOLEAN(.T.)`
    Typed(&'a str, Vec<Token<'a>>),
    /// Unset value: `$`
    Null,
    /// Derived value: `*`
    Derived,
}

fn entity_ref(input: &str) -> IResult<&str, Token> {
    map(
        preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
        Token::Ref,
    )(input)
}

/// String content scanner. STEP doubles the quote character to escape it
/// inside a literal, so `'it''s'` is one string.
fn string_content(input: &str, quote: u8) -> IResult<&str, &str> {
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == quote {
            if i + 1 < bytes.len() && bytes[i + 1] == quote {
                i += 2;
                continue;
            }
            return Ok((&input[i..], &input[..i]));
        }
        i += 1;
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn string_literal(input: &str) -> IResult<&str, Token> {
    alt((
        map(
            delimited(char('\''), |i| string_content(i, b'\''), char('\'')),
            Token::Str,
        ),
        map(
            delimited(char('"'), |i| string_content(i, b'"'), char('"')),
            Token::Str,
        ),
    ))(input)
}

fn integer(input: &str) -> IResult<&str, Token> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>().map(Token::Int)
    })(input)
}

/// Real numbers. IFC writes reals with a mandatory decimal point but the
/// fraction digits are optional (`0.` is common), and an exponent may follow.
fn real(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>().map(Token::Real),
    )(input)
}

fn enum_value(input: &str) -> IResult<&str, Token> {
    map(
        delimited(char('.'), ident, char('.')),
        Token::Enum,
    )(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    let end = input
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(input.len());
    if end == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::AlphaNumeric,
        )));
    }
    Ok((&input[end..], &input[..end]))
}

fn null(input: &str) -> IResult<&str, Token> {
    map(char('$'), |_| Token::Null)(input)
}

fn derived(input: &str) -> IResult<&str, Token> {
    map(char('*'), |_| Token::Derived)(input)
}

/// Wrapped select value: `IFCPARAMETERVALUE(0.)`, `IFCBOOLEAN(.T.)`
fn typed_value(input: &str) -> IResult<&str, Token> {
    map(
        pair(
            ident,
            delimited(
                char('('),
                separated_list0(delimited(ws, char(','), ws), token),
                char(')'),
            ),
        ),
        |(type_name, args)| Token::Typed(type_name, args),
    )(input)
}

fn ws(input: &str) -> IResult<&str, ()> {
    let end = input
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(input.len());
    Ok((&input[end..], ()))
}

fn list(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            char('('),
            separated_list0(delimited(ws, char(','), ws), token),
            char(')'),
        ),
        Token::List,
    )(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    delimited(
        ws,
        alt((
            real, // must come before integer: a real starts with digits too
            integer,
            entity_ref,
            string_literal,
            enum_value,
            list,
            typed_value,
            null,
            derived,
        )),
        ws,
    )(input)
}

/// Parse a complete entity line into `(id, type_name, attributes)`.
///
/// Example: `#123=IFCWALL('guid',#2,'name',$,$,$,$,$);`
pub fn parse_entity(input: &str) -> Result<(u32, &str, Vec<Token>)> {
    let result: IResult<&str, (u32, &str, Vec<Token>)> = tuple((
        delimited(
            ws,
            preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
            ws,
        ),
        preceded(char('='), delimited(ws, ident, ws)),
        delimited(
            char('('),
            separated_list0(delimited(ws, char(','), ws), token),
            tuple((char(')'), ws, char(';'))),
        ),
    ))(input);

    match result {
        Ok((_, parsed)) => Ok(parsed),
        Err(e) => Err(Error::parse(format!(
            "{:?}, input: {:?}",
            e,
            input.chars().take(80).collect::<String>()
        ))),
    }
}
