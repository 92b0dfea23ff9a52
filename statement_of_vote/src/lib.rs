//! Tabulation of WinEDS Reporting Tool exports into a Statement of Vote.
//!
//! The export is a text file with one vote total per line: one contest, one
//! choice, one precinct. This crate decodes those lines, folds them into
//! per-precinct totals and rolls them up into district and jurisdiction totals.
//! Which precinct belongs to which district is answered by a [DistrictResolver].
//!
//! See the [manual] for the details of the format.

mod config;
mod decoder;
pub mod manual;
mod report;
mod resolver;
mod tally;

pub use crate::config::*;
pub use crate::decoder::{decode_line, ELECTION_DAY_LITERAL, HEADER_WIDTH, VOTE_BY_MAIL_LITERAL};
pub use crate::report::*;
pub use crate::resolver::*;
pub use crate::tally::Tabulator;

/// Tabulates all the lines of an export. Lines are numbered from 1.
pub fn tabulate_lines<I, S, R>(
    lines: I,
    resolver: R,
    layout: &ExportLayout,
) -> TallyResult<ElectionReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    R: DistrictResolver,
{
    let mut tabulator = Tabulator::new(resolver, layout.clone());
    for (idx, line) in lines.into_iter().enumerate() {
        tabulator.push_line(idx + 1, line.as_ref())?;
    }
    tabulator.finish()
}
