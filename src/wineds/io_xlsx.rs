// Excel output: a contents sheet, then one sheet per contest.

use rust_xlsxwriter::{Format, Url, Workbook, Worksheet, XlsxError};
use statement_of_vote::{ContestReport, ElectionReport, ExportLayout};
use std::collections::HashSet;

use crate::wineds::io_common::{contest_lines, Cell, Line};

pub const CONTENTS_SHEET_NAME: &str = "Contents";
/// Excel refuses longer sheet names.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

const NAME_COLUMN_WIDTH: f64 = 36.0;

/// `<id> - <name>`, cut to what Excel accepts.
pub fn sheet_name(contest: &ContestReport) -> String {
    format!("{} - {}", contest.contest_id, contest.name)
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' | '\'' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

// Truncation can make two contests collide.
fn unique_sheet_names(report: &ElectionReport) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    used.insert(CONTENTS_SHEET_NAME.to_lowercase());
    let mut names = Vec::new();
    for contest in report.contests.iter() {
        let base = sheet_name(contest);
        let mut name = base.clone();
        let mut n = 2;
        // Excel compares sheet names without case.
        while used.contains(&name.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME_CHARS - suffix.chars().count();
            name = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        used.insert(name.to_lowercase());
        names.push(name);
    }
    names
}

pub fn render_workbook(
    report: &ElectionReport,
    election_name: &str,
    layout: &ExportLayout,
) -> Result<Workbook, XlsxError> {
    let bold = Format::new().set_bold();
    let turnout = Format::new().set_num_format("0.00");
    let names = unique_sheet_names(report);

    let mut workbook = Workbook::new();
    {
        let contents = workbook.add_worksheet().set_name(CONTENTS_SHEET_NAME)?;
        contents.set_column_width(0, NAME_COLUMN_WIDTH)?;
        contents.write_string_with_format(0, 0, election_name, &bold)?;
        contents.write_string_with_format(2, 0, "Contest", &bold)?;
        contents.write_string_with_format(2, 1, "Precincts", &bold)?;
        for (idx, (contest, name)) in report.contests.iter().zip(names.iter()).enumerate() {
            let row = 3 + idx as u32;
            let link = Url::new(format!("internal:'{}'!A1", name)).set_text(contest.title());
            contents.write_url(row, 0, link)?;
            contents.write_number(row, 1, contest.precincts.len() as f64)?;
        }
    }

    for (contest, name) in report.contests.iter().zip(names.iter()) {
        let worksheet = workbook.add_worksheet().set_name(name)?;
        worksheet.set_column_width(0, NAME_COLUMN_WIDTH)?;
        let lines = contest_lines(contest, &report.reporting_types, layout);
        write_lines(worksheet, &lines, &bold, &turnout)?;
    }
    Ok(workbook)
}

fn write_lines(
    worksheet: &mut Worksheet,
    lines: &[Line],
    bold: &Format,
    turnout: &Format,
) -> Result<(), XlsxError> {
    let mut row: u32 = 0;
    for line in lines.iter() {
        match line {
            Line::ContestStart(title) => {
                worksheet.write_string_with_format(row, 0, title, bold)?;
                // Followed by an empty row.
                row += 1;
            }
            Line::Text(s) => {
                worksheet.write_string(row, 0, s)?;
            }
            Line::Header(values) => {
                for (col, v) in values.iter().enumerate() {
                    worksheet.write_string_with_format(row, col as u16, v, bold)?;
                }
            }
            Line::Row(cells) => {
                for (col, cell) in cells.iter().enumerate() {
                    let col = col as u16;
                    match cell {
                        Cell::Text(s) if s.is_empty() => {}
                        Cell::Text(s) => {
                            worksheet.write_string(row, col, s)?;
                        }
                        Cell::Count(n) => {
                            worksheet.write_number(row, col, *n as f64)?;
                        }
                        Cell::Turnout(t) => {
                            worksheet.write_number_with_format(row, col, t.as_f64(), turnout)?;
                        }
                    }
                }
            }
            Line::Blank => {}
        }
        row += 1;
    }
    Ok(())
}
