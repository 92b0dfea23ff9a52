// The rows of a contest section, shared by the TSV and the Excel writers.

use statement_of_vote::{
    Area, ContestReport, ExportLayout, Figures, ReportingType, TotalsRow, Turnout,
    GRAND_TOTALS_LABEL,
};

/// The label of the grand total rows, formatted like a district label.
pub const GRAND_TOTALS_AREA_LABEL: &str = "City:0";

#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Count(u64),
    Turnout(Turnout),
}

impl Cell {
    pub fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Turnout(t) => t.to_string(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Line {
    /// The first line of a contest section.
    ContestStart(String),
    Text(String),
    Header(Vec<String>),
    Row(Vec<Cell>),
    Blank,
}

fn header(
    contest: &ContestReport,
    reporting_types: &[ReportingType],
    layout: &ExportLayout,
    name_header: &str,
    id_header: &str,
) -> Line {
    let mut values = vec![name_header.to_string()];
    if !reporting_types.is_empty() {
        values.push("ReportingType".to_string());
    }
    values.extend(
        [
            id_header,
            "Precincts",
            "Registration",
            "Ballots Cast",
            "Turnout (%)",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    values.extend(contest.choices.iter().map(|c| c.name.clone()));
    if contest.has_overvotes {
        values.push(layout.overvote_choice_name.clone());
    }
    if contest.has_undervotes {
        values.push(layout.undervote_choice_name.clone());
    }
    Line::Header(values)
}

fn area_label(row: &TotalsRow) -> Cell {
    match &row.area {
        Area::Precinct(id) => Cell::Count(*id as u64),
        Area::District { hierarchy, key } => Cell::Text(format!("{}:{}", hierarchy, key)),
        Area::Jurisdiction => Cell::Text(GRAND_TOTALS_AREA_LABEL.to_string()),
    }
}

// `reporting` is Some(None) for the combined row of a split report.
fn totals_row(
    contest: &ContestReport,
    row: &TotalsRow,
    label: &str,
    reporting: Option<Option<ReportingType>>,
    figures: &Figures,
) -> Line {
    let mut cells = vec![Cell::Text(label.to_string())];
    match reporting {
        Some(Some(rt)) => cells.push(Cell::Text(rt.label().to_string())),
        Some(None) => cells.push(Cell::Text(String::new())),
        None => {}
    }
    cells.push(area_label(row));
    cells.push(Cell::Count(row.precinct_count as u64));
    cells.push(Cell::Count(figures.registration));
    cells.push(Cell::Count(figures.ballots_cast));
    cells.push(Cell::Turnout(figures.turnout()));
    cells.extend(figures.votes.iter().map(|v| Cell::Count(*v)));
    if contest.has_overvotes {
        cells.push(Cell::Count(figures.overvotes.unwrap_or(0)));
    }
    if contest.has_undervotes {
        cells.push(Cell::Count(figures.undervotes.unwrap_or(0)));
    }
    Line::Row(cells)
}

// All ballots. A split report leaves the reporting type cell empty.
fn combined_row(
    contest: &ContestReport,
    row: &TotalsRow,
    label: &str,
    split: bool,
) -> Line {
    let reporting = if split { Some(None) } else { None };
    totals_row(contest, row, label, reporting, &row.combined)
}

fn split_rows(contest: &ContestReport, row: &TotalsRow, label: &str) -> Vec<Line> {
    row.by_reporting
        .iter()
        .map(|(rt, figures)| totals_row(contest, row, label, Some(Some(*rt)), figures))
        .collect()
}

/// Lays out the precinct report and the district report of a contest.
pub fn contest_lines(
    contest: &ContestReport,
    reporting_types: &[ReportingType],
    layout: &ExportLayout,
) -> Vec<Line> {
    let split = !reporting_types.is_empty();
    let title = contest.title();
    let mut lines = vec![Line::ContestStart(title.clone())];

    lines.push(Line::Text("Precinct Totals".to_string()));
    lines.push(header(
        contest,
        reporting_types,
        layout,
        "PrecinctName",
        "PrecinctID",
    ));
    for row in contest.precincts.iter() {
        if split {
            lines.extend(split_rows(contest, row, &row.label));
        } else {
            lines.push(combined_row(contest, row, &row.label, split));
        }
    }
    lines.extend(split_rows(contest, &contest.grand_total, GRAND_TOTALS_LABEL));
    lines.push(combined_row(
        contest,
        &contest.grand_total,
        GRAND_TOTALS_LABEL,
        split,
    ));
    lines.push(Line::Blank);

    lines.push(Line::Text(title));
    lines.push(Line::Text("District and Neighborhood Totals".to_string()));
    lines.push(header(
        contest,
        reporting_types,
        layout,
        "DistrictName",
        "DistrictLabel",
    ));
    for block in contest.district_blocks.iter() {
        for row in block.districts.iter() {
            lines.push(combined_row(contest, row, &row.label, split));
        }
    }
    lines.push(combined_row(
        contest,
        &contest.grand_total,
        GRAND_TOTALS_LABEL,
        split,
    ));
    lines
}
