use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char as nom_char, digit1, hex_digit1, multispace0},
    combinator::{all_consuming, opt},
    sequence::{delimited, pair, preceded},
};
use nom_locate::LocatedSpan;

use super::cookie::CookieMatcher;
use crate::error::{Error, ErrorKind};

pub type Span<'a> = LocatedSpan<&'a str>;

pub type IResult<'a, O> = nom::IResult<Span<'a>, O, ParseError<'a>>;

#[derive(Debug, PartialEq)]
pub struct ParseError<'a> {
    message: String,
    wherein: Span<'a>,
}

impl<'a> ParseError<'a> {
    pub fn new(message: String, wherein: Span<'a>) -> Self {
        Self { message, wherein }
    }

    pub fn message(&self) -> &String {
        &self.message
    }

    pub fn offset(&self) -> usize {
        self.wherein.location_offset()
    }
}

impl<'a> nom::error::ParseError<Span<'a>> for ParseError<'a> {
    fn from_error_kind(input: Span<'a>, kind: nom::error::ErrorKind) -> Self {
        Self::new(format!("parse error {:?}", kind), input)
    }

    fn append(_input: Span<'a>, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: Span<'a>, c: char) -> Self {
        Self::new(format!("unexpected character '{}'", c), input)
    }
}

impl<'a> From<nom::Err<ParseError<'a>>> for ParseError<'a> {
    fn from(err: nom::Err<ParseError<'a>>) -> Self {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
            nom::Err::Incomplete(_) => unreachable!(),
        }
    }
}

impl<'a> From<ParseError<'a>> for Error {
    fn from(err: ParseError<'a>) -> Self {
        Error::with_kind(
            ErrorKind::Config,
            &format!(
                "bad cookie rule at offset {}: {}",
                err.offset(),
                err.message()
            ),
        )
    }
}

/// Parses a cookie rule key.
///
/// ```text
/// matcher := "*" | number "-" number | number "/" number | number
/// number  := "0x" hexdigits | digits
/// ```
pub fn parse_cookie_matcher(input: &str) -> std::result::Result<CookieMatcher, ParseError> {
    let (_, matcher) = all_consuming(delimited(multispace0, cookie_matcher, multispace0))(
        Span::new(input),
    )?;
    Ok(matcher)
}

fn cookie_matcher(input: Span) -> IResult<CookieMatcher> {
    if let Ok((rest, _)) = nom_char::<_, ParseError>('*')(input) {
        return Ok((rest, CookieMatcher::Any));
    }

    let (rest, first) = number(input)?;
    let (rest, tail) = opt(pair(
        delimited(multispace0, alt((nom_char('-'), nom_char('/'))), multispace0),
        number,
    ))(rest)?;

    let matcher = match tail {
        None => CookieMatcher::Exact(first),
        Some(('-', last)) => {
            if last < first {
                return Err(nom::Err::Failure(ParseError::new(
                    format!("empty range {:#x}-{:#x}", first, last),
                    input,
                )));
            }
            CookieMatcher::Range(first, last)
        }
        Some((_, mask)) => CookieMatcher::Masked(first & mask, mask),
    };
    Ok((rest, matcher))
}

fn number(input: Span) -> IResult<u64> {
    if let Ok((rest, digits)) =
        preceded(alt((tag("0x"), tag("0X"))), hex_digit1::<_, ParseError>)(input)
    {
        return match u64::from_str_radix(digits.fragment(), 16) {
            Ok(n) => Ok((rest, n)),
            Err(e) => Err(nom::Err::Failure(ParseError::new(
                format!("bad hex number: {}", e),
                input,
            ))),
        };
    }

    let (rest, digits) = digit1(input)?;
    match digits.fragment().parse::<u64>() {
        Ok(n) => Ok((rest, n)),
        Err(e) => Err(nom::Err::Failure(ParseError::new(
            format!("bad number: {}", e),
            input,
        ))),
    }
}
