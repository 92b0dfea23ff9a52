// Tab separated output. Tabs because some names contain commas
// ("US Representative, District 12").

use chrono::NaiveDateTime;
use statement_of_vote::{ElectionReport, ExportLayout};

use crate::wineds::io_common::{contest_lines, Cell, Line};

const DELIMITER: &str = "\t";

/// For example `Friday, September 12, 2014 at 09:06:26 PM`.
pub fn format_generated_on(now: &NaiveDateTime) -> String {
    now.format("%A, %B %-d, %Y at %I:%M:%S %p").to_string()
}

pub fn render_tsv(
    report: &ElectionReport,
    election_name: &str,
    layout: &ExportLayout,
    now: &NaiveDateTime,
) -> String {
    let mut out: Vec<String> = vec![
        election_name.to_string(),
        String::new(),
        format!("Report generated on: {}", format_generated_on(now)),
    ];
    for contest in report.contests.iter() {
        out.push(String::new());
        out.push(String::new());
        for line in contest_lines(contest, &report.reporting_types, layout) {
            out.push(match line {
                // A distinctive start, easy to search for and to split on.
                Line::ContestStart(title) => format!("*** {}", title),
                Line::Text(s) => s,
                Line::Header(values) => values.join(DELIMITER),
                Line::Row(cells) => cells
                    .iter()
                    .map(Cell::to_text)
                    .collect::<Vec<String>>()
                    .join(DELIMITER),
                Line::Blank => String::new(),
            });
        }
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use statement_of_vote::{tabulate_lines, PrecinctIndex};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 9, 12)
            .and_then(|d| d.and_hms_opt(21, 6, 26))
            .unwrap()
    }

    #[test]
    fn generated_on_is_not_zero_padded() {
        assert_eq!(
            format_generated_on(&now()),
            "Friday, September 12, 2014 at 09:06:26 PM"
        );
        let d = NaiveDate::from_ymd_opt(2014, 6, 3)
            .and_then(|d| d.and_hms_opt(8, 0, 5))
            .unwrap();
        assert_eq!(format_generated_on(&d), "Tuesday, June 3, 2014 at 08:00:05 AM");
    }

    #[test]
    fn complete_export_has_reporting_type_rows() {
        let lines = [
            "0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101",
            "0002001110100100  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101  TC-Election Day Reporting",
            "0002001110100041  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101  TC-VBM Reporting",
            "0100001110100030DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA  TC-Election Day Reporting",
            "0100001110100012DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA  TC-VBM Reporting",
        ];
        let layout = ExportLayout::default();
        let report = tabulate_lines(lines, PrecinctIndex::new(), &layout).unwrap();
        let text = render_tsv(&report, "Test Election", &layout, &now());
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "Test Election");
        assert_eq!(rows[2], "Report generated on: Friday, September 12, 2014 at 09:06:26 PM");
        assert_eq!(rows[5], "*** Governor - CALIFORNIA (100)");
        assert_eq!(rows[6], "Precinct Totals");
        assert_eq!(
            rows[7],
            "PrecinctName\tReportingType\tPrecinctID\tPrecincts\tRegistration\tBallots Cast\tTurnout (%)\tEDMUND G. BROWN"
        );
        assert_eq!(rows[8], "Pct 1101\tElection Day\t1101\t1\t484\t100\t20.66\t30");
        assert_eq!(rows[9], "Pct 1101\tVBM\t1101\t1\t484\t41\t8.47\t12");
        assert_eq!(rows[10], "Grand Totals\tElection Day\tCity:0\t1\t484\t100\t20.66\t30");
        assert_eq!(rows[11], "Grand Totals\tVBM\tCity:0\t1\t484\t41\t8.47\t12");
        assert_eq!(rows[12], "Grand Totals\t\tCity:0\t1\t484\t141\t29.13\t42");
        assert_eq!(rows[13], "");
        assert_eq!(rows[14], "Governor - CALIFORNIA (100)");
        assert_eq!(rows[15], "District and Neighborhood Totals");
        assert_eq!(rows[17], "Grand Totals\t\tCity:0\t1\t484\t141\t29.13\t42");
        assert_eq!(rows.len(), 18);
        assert!(text.ends_with("42\n"));
    }

    #[test]
    fn untyped_contests_still_get_every_reporting_type_row() {
        let lines = [
            "0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101",
            "0002001110100141  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101",
            "0100001110100017DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA",
            "0175098110100005  State Proposition 42  Yes  Pct 1101  CALIFORNIA  TC-VBM Reporting",
        ];
        let layout = ExportLayout::default();
        let report = tabulate_lines(lines, PrecinctIndex::new(), &layout).unwrap();
        let text = render_tsv(&report, "Test Election", &layout, &now());
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[5], "*** Governor - CALIFORNIA (100)");
        assert_eq!(rows[8], "Pct 1101\tElection Day\t1101\t1\t484\t0\t0.00\t0");
        assert_eq!(rows[9], "Pct 1101\tVBM\t1101\t1\t484\t0\t0.00\t0");
        assert_eq!(rows[10], "Pct 1101\tUnspecified\t1101\t1\t484\t141\t29.13\t17");
        assert_eq!(rows[13], "Grand Totals\tUnspecified\tCity:0\t1\t484\t141\t29.13\t17");
        assert_eq!(rows[14], "Grand Totals\t\tCity:0\t1\t484\t141\t29.13\t17");
    }
}
