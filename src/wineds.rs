use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use statement_of_vote::{ElectionReport, PrecinctIndex, Tabulator, TallyError};

use std::collections::BTreeSet;
use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use text_diff::print_diff;

use crate::args::Args;
use crate::wineds::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_precincts;
mod io_tsv;
mod io_xlsx;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum WinedsError {
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display(
        "missing setting: {name} (use the command line or the configuration file)"
    ))]
    MissingSetting { name: String },
    #[snafu(display("unknown output format {name:?} (expected tsv or xlsx)"))]
    UnknownFormat { name: String },
    #[snafu(display(
        "district type {name:?} needs a column and exactly one of nameFormat (with {{}}), names or jurisdiction"
    ))]
    InvalidDistrictType { name: String },
    #[snafu(display("could not read --generated-at {text:?}, expected 2014-06-03T20:00:00"))]
    InvalidTimestamp {
        source: chrono::ParseError,
        text: String,
    },

    #[snafu(display("Error opening precinct file {path}"))]
    OpeningPrecincts { source: csv::Error, path: String },
    #[snafu(display("precinct file, line {lineno}: could not read the row"))]
    PrecinctRow { source: csv::Error, lineno: usize },
    #[snafu(display("precinct file, line {lineno}: invalid precinct id {text:?}"))]
    PrecinctId { lineno: usize, text: String },
    #[snafu(display("precinct file: missing column {column:?}"))]
    PrecinctColumn { column: String },

    #[snafu(display("Error opening export file {path}"))]
    OpeningExport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("export file, line {line_no}: could not read the line"))]
    ReadingExport {
        source: std::io::Error,
        line_no: usize,
    },
    #[snafu(display("{source}"))]
    Tally { source: TallyError },

    #[snafu(display("Error building the Excel workbook"))]
    Xlsx { source: rust_xlsxwriter::XlsxError },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening reference file {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the generated report and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type WinedsResult<T> = Result<T, WinedsError>;

fn time_it<T>(task: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    info!("begin: {}...", task);
    let res = f();
    info!(
        "elapsed ({}): {:.4} seconds",
        task,
        start.elapsed().as_secs_f64()
    );
    res
}

/// Streams the export into the tabulator, one line at a time.
pub fn read_export(
    path: &Path,
    index: &PrecinctIndex,
    settings: &Settings,
) -> WinedsResult<ElectionReport> {
    let path_s = path.display().to_string();
    info!("Attempting to read export file {:?}", path_s);
    let file = File::open(path).context(OpeningExportSnafu { path: path_s })?;
    let mut tabulator = Tabulator::new(index, settings.layout.clone());
    for (idx, line_r) in BufReader::new(file).lines().enumerate() {
        let line_no = idx + 1;
        let line = line_r.context(ReadingExportSnafu { line_no })?;
        tabulator.push_line(line_no, &line).context(TallySnafu {})?;
    }
    tabulator.finish().context(TallySnafu {})
}

// The precinct file and the export should list the same precincts.
fn check_precincts(index: &PrecinctIndex, report: &ElectionReport) {
    let indexed: BTreeSet<u32> = index.precinct_ids().collect();
    let exported = report.precinct_ids();
    for id in indexed.difference(&exported) {
        warn!("export file does not contain precinct id {}", id);
    }
    for id in exported.difference(&indexed) {
        warn!("export file contains unknown precinct id {}", id);
    }
}

fn check_reference(rendered: &str, reference: &Path) -> WinedsResult<()> {
    let path = reference.display().to_string();
    let expected = fs::read_to_string(reference).context(OpeningReferenceSnafu { path: &path })?;
    if expected != rendered {
        warn!("Found differences with the reference file");
        print_diff(expected.as_str(), rendered, "\n");
        return ReferenceMismatchSnafu { path }.fail();
    }
    info!("the report matches the reference {}", path);
    Ok(())
}

/// Runs a full conversion and returns the paths of the files written.
///
/// Nothing is written unless the whole report could be built.
pub fn convert(settings: &Settings, now: NaiveDateTime) -> WinedsResult<Vec<PathBuf>> {
    let index = time_it("reading precinct file", || {
        io_precincts::read_precinct_index(&settings.precincts_path, &settings.precinct_columns)
    })?;
    let report = time_it("tabulating export file", || {
        read_export(&settings.export_path, &index, settings)
    })?;

    info!("parsed {} contests:", report.contests.len());
    for contest in report.contests.iter() {
        info!(
            " {:3}: {} ({} choices)",
            contest.contest_id,
            contest.title(),
            contest.choices.len()
        );
    }
    for d in report.diagnostics.iter() {
        debug!("diagnostic: {}", d);
    }
    check_precincts(&index, &report);
    if settings.allow_missing_meta {
        if let Err(e) = report.check_schema() {
            warn!("{} (allowed)", e);
        }
    } else {
        report.check_schema().context(TallySnafu {})?;
    }

    let mut outputs: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    let tsv = time_it("rendering TSV", || {
        io_tsv::render_tsv(&report, &settings.election_name, &settings.layout, &now)
    });
    if let Some(reference) = &settings.reference {
        check_reference(&tsv, reference)?;
    }
    if settings.formats.contains(&OutputFormat::Tsv) {
        outputs.push((settings.output_path(OutputFormat::Tsv), tsv.into_bytes()));
    }
    if settings.formats.contains(&OutputFormat::Xlsx) {
        let buffer = time_it("rendering Excel", || {
            io_xlsx::render_workbook(&report, &settings.election_name, &settings.layout)
                .and_then(|mut workbook| workbook.save_to_buffer())
        })
        .context(XlsxSnafu {})?;
        outputs.push((settings.output_path(OutputFormat::Xlsx), buffer));
    }

    let mut written = Vec::new();
    for (path, bytes) in outputs {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context(WritingFileSnafu {
                path: dir.display().to_string(),
            })?;
        }
        fs::write(&path, bytes).context(WritingFileSnafu {
            path: path.display().to_string(),
        })?;
        info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn run_conversion(args: &Args) -> WinedsResult<Vec<PathBuf>> {
    let settings = Settings::resolve(args)?;
    debug!("settings: {:?}", settings);
    let now = settings
        .generated_at
        .unwrap_or_else(|| Local::now().naive_local());
    convert(&settings, now)
}
