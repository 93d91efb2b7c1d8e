//! Access-log record parsing
//!
//! Records are comma separated with 7 fields: remote host, client identity,
//! remote user, epoch timestamp, request line, status and response size.
//! Fields may be double quoted; a quoted field may contain commas and `""`
//! stands for a literal quote.

use crate::event::{Event, Priority, WebTrafficEvent};
use chrono::DateTime;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, none_of, space0},
    combinator::{all_consuming, map, value, verify},
    multi::{fold_many0, separated_list1},
    sequence::delimited,
    IResult,
};

/// Record error types
pub mod error;

pub use error::RecordError;

/// Number of fields in a record
pub const FIELD_COUNT: usize = 7;

/// First field of the optional header row
const HEADER_MARKER: &str = "remotehost";

fn quoted_field(input: &str) -> IResult<&str, String> {
    delimited(
        space0,
        delimited(
            char('"'),
            fold_many0(
                alt((value('"', tag("\"\"")), none_of("\""))),
                String::new,
                |mut acc, c| {
                    acc.push(c);
                    acc
                },
            ),
            char('"'),
        ),
        space0,
    )(input)
}

fn bare_field(input: &str) -> IResult<&str, String> {
    map(
        verify(take_while(|c| c != ','), |s: &str| {
            !s.trim_start().starts_with('"')
        }),
        |s: &str| s.trim().to_string(),
    )(input)
}

fn field(input: &str) -> IResult<&str, String> {
    alt((quoted_field, bare_field))(input)
}

/// Split a CSV line into unquoted fields
pub fn split_fields(line: &str) -> Result<Vec<String>, RecordError> {
    let line = line.trim_end_matches(['\r', '\n']);
    all_consuming(separated_list1(char(','), field))(line)
        .map(|(_, fields)| fields)
        .map_err(|_| RecordError::MalformedField(line.to_string()))
}

/// Whether the line is the column header row
pub fn is_header(line: &str) -> bool {
    split_fields(line)
        .ok()
        .and_then(|fields| fields.into_iter().next())
        .is_some_and(|first| first == HEADER_MARKER)
}

/// Derive the section (`/first-segment`) from a request line
pub fn section_of(request_line: &str) -> Result<String, RecordError> {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| path.split('/').nth(1))
        .map(|segment| format!("/{segment}"))
        .ok_or_else(|| RecordError::Section(request_line.to_string()))
}

/// Parse an epoch-seconds timestamp
pub fn parse_timestamp(raw: &str) -> Result<i64, RecordError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|&secs| DateTime::from_timestamp(secs, 0).is_some())
        .ok_or_else(|| RecordError::Timestamp(raw.to_string()))
}

/// Parse one record into a web traffic event
pub fn parse_record(line: &str) -> Result<WebTrafficEvent, RecordError> {
    let fields = split_fields(line)?;
    let found = fields.len();
    let fields: [String; FIELD_COUNT] = fields
        .try_into()
        .map_err(|_| RecordError::FieldCount { found })?;
    let [source, client_identity, remote_user, timestamp, request_line, status, size] = fields;

    let section = section_of(&request_line)?;
    let time = parse_timestamp(&timestamp)?;

    Ok(WebTrafficEvent {
        event: Event::new(time, String::new(), Priority::Medium),
        client_identity,
        remote_user,
        source,
        request_line,
        status,
        size,
        section,
    })
}
