//! Token-level parsers for legacy schedule text.
//!
//! Nothing here fails: unparseable input yields fewer tokens.

use nom::{
    IResult,
    bytes::complete::{take_till, take_while_m_n},
    character::complete::{char, digit1},
    combinator::{map, map_res},
    multi::many0,
    sequence::{preceded, tuple},
};

/// A `d/m/yyyy` token before calendar validation.
pub(crate) type DateToken = (u32, u32, i32);

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Next run of digits, skipping any leading noise. Runs that overflow `u32` map to `None`.
fn digit_run(input: &str) -> IResult<&str, Option<u32>> {
    preceded(take_till(is_digit), map(digit1, |run: &str| run.parse().ok()))(input)
}

/// Every number in `input`, in order of appearance.
pub(crate) fn numbers(input: &str) -> Vec<u32> {
    many0(digit_run)(input)
        .map(|(_, runs)| runs.into_iter().flatten().collect())
        .unwrap_or_default()
}

fn day_or_month(input: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(1, 2, is_digit), str::parse)(input)
}

fn year(input: &str) -> IResult<&str, i32> {
    map_res(take_while_m_n(4, 4, is_digit), str::parse)(input)
}

/// Parse: `d/m/yyyy` with one or two digit day and month.
fn date_token(input: &str) -> IResult<&str, DateToken> {
    map(
        tuple((day_or_month, char('/'), day_or_month, char('/'), year)),
        |(day, _, month, _, year)| (day, month, year),
    )(input)
}

/// Non-overlapping date tokens scanned left to right, at most `limit`.
pub(crate) fn date_tokens(input: &str, limit: usize) -> Vec<DateToken> {
    let mut found = Vec::new();
    let mut rest = input;
    while found.len() < limit && !rest.is_empty() {
        if let Ok((tail, token)) = date_token(rest) {
            found.push(token);
            rest = tail;
            continue;
        }
        let mut chars = rest.chars();
        chars.next();
        rest = chars.as_str();
    }
    found
}
