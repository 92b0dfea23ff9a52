//! Decoding of the lines of a WinEDS Reporting Tool export.
//!
//! A sample line (wrapped here):
//!
//! ```text
//! 0010073990000000PF        US Representative, District 13                          \
//! LAWERENCE N. ALLEN                    Pct 9900 MB                   \
//! 13TH CONGRESSIONAL DISTRITC-Election Day Reporting
//! ```
//!
//! The columns look fixed, but the party code has a variable width and a full
//! district name runs straight into the reporting type ("DISTRI" +
//! "TC-Election Day Reporting" above).

use lazy_static::lazy_static;
use regex::Regex;
use snafu::ResultExt;
use std::ops::Range;

use crate::config::*;

/// Width of the numeric block `0AAACCCPPPPTTTTT` starting every line.
pub const HEADER_WIDTH: usize = 16;

pub const ELECTION_DAY_LITERAL: &str = "TC-Election Day Reporting";
pub const VOTE_BY_MAIL_LITERAL: &str = "TC-VBM Reporting";

const CONTEST_ID: Range<usize> = 1..4;
const CHOICE_ID: Range<usize> = 4..7;
const PRECINCT_ID: Range<usize> = 7..11;
const VOTE_TOTAL: Range<usize> = 11..16;

lazy_static! {
    // Field values may contain single spaces (candidate names, district names).
    static ref SPLITTER: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// Decodes one line of the export. `line_no` is only used for error reporting.
pub fn decode_line(line_no: usize, line: &str, layout: &ExportLayout) -> TallyResult<DecodedLine> {
    decode(line, layout).context(DecodeSnafu {
        line_no,
        line: line.trim_end(),
    })
}

fn decode(line: &str, layout: &ExportLayout) -> Result<DecodedLine, DecodeFault> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if !line.starts_with('0') {
        return Err(DecodeFault::MissingLeadingZero);
    }
    let header_len = line.find(char::is_whitespace).unwrap_or(line.len());
    if header_len < HEADER_WIDTH {
        return Err(DecodeFault::HeaderTooShort { len: header_len });
    }
    let header = line.get(..HEADER_WIDTH).ok_or(DecodeFault::BadNumber {
        field: "header",
        text: line.chars().take(HEADER_WIDTH).collect(),
    })?;

    let contest_id = read_id(header, CONTEST_ID, "contest_id")?;
    let choice_id = read_id(header, CHOICE_ID, "choice_id")?;
    let precinct_id = read_id(header, PRECINCT_ID, "precinct_id")?;
    let (vote_total, placeholder_total) = read_total(&header[VOTE_TOTAL]);

    // Whatever follows the header up to the first multi-space run is the party
    // code. There may be no space at all between the two.
    let rest = &line[HEADER_WIDTH..];
    let (party_segment, tail) = match SPLITTER.find(rest) {
        Some(m) => (&rest[..m.start()], &rest[m.end()..]),
        None => (rest, ""),
    };
    let party_code = Some(party_segment.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let mut fields: Vec<&str> = SPLITTER
        .split(tail.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let count = fields.len();
    if !(3..=5).contains(&count) {
        return Err(DecodeFault::FieldCount { count });
    }

    let mut reporting_type = ReportingType::Unspecified;
    if let Some((head, rt)) = fields.last().copied().and_then(split_reporting_type) {
        reporting_type = rt;
        if head.is_empty() {
            fields.pop();
        } else if let Some(last) = fields.last_mut() {
            *last = head;
        }
    }

    let (contest_name, choice_name, precinct_name, district_name) = match fields.as_slice() {
        [contest, choice, precinct] => (*contest, *choice, *precinct, None),
        [contest, choice, precinct, district] => (*contest, *choice, *precinct, Some(*district)),
        _ => {
            return Err(DecodeFault::FieldCount {
                count: fields.len(),
            })
        }
    };

    let record = VoteRecord {
        contest_id,
        choice_id,
        precinct_id,
        vote_total,
        placeholder_total,
        party_code,
        contest_name: contest_name.to_string(),
        choice_name: choice_name.to_string(),
        precinct_name: precinct_name.to_string(),
        district_name: district_name.map(|s| s.to_string()),
        reporting_type,
    };

    match layout.meta_kind(contest_id, contest_name, district_name.is_some()) {
        Some(_) if district_name.is_some() => Err(DecodeFault::MetaWithDistrict {
            district: district_name.unwrap_or_default().to_string(),
        }),
        Some(kind) => Ok(DecodedLine::Meta(kind, record)),
        None => Ok(DecodedLine::Tally(record)),
    }
}

fn read_id(header: &str, range: Range<usize>, field: &'static str) -> Result<u32, DecodeFault> {
    let text = &header[range];
    let bad = || DecodeFault::BadNumber {
        field,
        text: text.to_string(),
    };
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    text.parse::<u32>().map_err(|_| bad())
}

/// The vote total is always the same five columns. When they do not hold a
/// plain number (`000-1`, `-1NON`), the export wrote a placeholder: the total
/// is taken as 0 and flagged.
fn read_total(text: &str) -> (u64, bool) {
    if text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(v) = text.parse::<u64>() {
            return (v, false);
        }
    }
    (0, true)
}

/// Splits a reporting-type literal off the end of a field, whether or not
/// whitespace separates it from what precedes.
fn split_reporting_type(field: &str) -> Option<(&str, ReportingType)> {
    [
        (ELECTION_DAY_LITERAL, ReportingType::ElectionDay),
        (VOTE_BY_MAIL_LITERAL, ReportingType::VoteByMail),
    ]
    .into_iter()
    .find_map(|(literal, rt)| field.strip_suffix(literal).map(|head| (head.trim_end(), rt)))
}
