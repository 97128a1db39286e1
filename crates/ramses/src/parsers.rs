//! Library of parser functions for the text files of an output

// crate modules
use crate::info::Value;

// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while1};
use nom::character::complete::{char, digit1, one_of, space0, space1};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::multi::separated_list0;
use nom::number::complete::double;
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;

// ! Info files

/// Split a `key = value` line at the first `=`
///
/// Lines without an `=` carry no metadata and return `None`.
pub fn key_value(i: &str) -> Option<(&str, &str)> {
    let (key, value) = i.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some((key, value.trim()))
    }
}

/// Interpret the right hand side of an info line
///
/// Anything that is not a literal is kept as the trimmed string.
pub fn info_value(i: &str) -> Value {
    let i = i.trim();
    match all_consuming(literal)(i) {
        Ok((_, v)) => v,
        Err(_) => Value::Str(i.to_string()),
    }
}

fn literal(i: &str) -> IResult<&str, Value> {
    alt((boolean, integer, float, quoted, list))(i)
}

fn boolean(i: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("True")),
        value(Value::Bool(false), tag("False")),
    ))(i)
}

/// Only whole integers, `1.0` or `1e3` must fall through to floats
fn integer(i: &str) -> IResult<&str, Value> {
    map_res(
        terminated(
            recognize(pair(opt(one_of("+-")), digit1)),
            nom::combinator::not(one_of(".eE")),
        ),
        |s: &str| s.parse::<i64>().map(Value::Int),
    )(i)
}

fn float(i: &str) -> IResult<&str, Value> {
    map(double, Value::Float)(i)
}

fn quoted(i: &str) -> IResult<&str, Value> {
    map(
        alt((
            delimited(char('\''), opt(is_not("'")), char('\'')),
            delimited(char('"'), opt(is_not("\"")), char('"')),
        )),
        |s: Option<&str>| Value::Str(s.unwrap_or_default().to_string()),
    )(i)
}

fn list(i: &str) -> IResult<&str, Value> {
    map(
        delimited(
            terminated(char('['), space0),
            separated_list0(delimited(space0, char(','), space0), literal),
            preceded(space0, char(']')),
        ),
        Value::List,
    )(i)
}

// ! Hydro descriptor files

/// A line declaring a hydro variable, returning the 1-based index and name
///
/// Both descriptor layouts written by RAMSES are recognised.
///
/// ```text
/// variable #1 : density
/// 1, density, d
/// ```
pub fn descriptor_variable(i: &str) -> Option<(usize, String)> {
    alt((legacy_variable, csv_variable))(i.trim())
        .ok()
        .map(|(_, (idx, name))| (idx, name.to_string()))
}

/// The `nvar = N` line of legacy descriptors
pub fn descriptor_nvar(i: &str) -> Option<usize> {
    let (key, value) = key_value(i)?;
    if key == "nvar" {
        value.parse().ok()
    } else {
        None
    }
}

fn legacy_variable(i: &str) -> IResult<&str, (usize, &str)> {
    preceded(
        tuple((tag("variable"), space1, char('#'), space0)),
        separated_pair(
            index,
            delimited(space0, char(':'), space0),
            variable_name,
        ),
    )(i)
}

fn csv_variable(i: &str) -> IResult<&str, (usize, &str)> {
    separated_pair(index, delimited(space0, char(','), space0), variable_name)(i)
}

fn index(i: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(i)
}

fn variable_name(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(i)
}
