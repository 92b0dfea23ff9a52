use clap::Parser;

/// Converts a WinEDS Reporting Tool export into Statement of Vote reports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file describing the election and its input files.
    /// Paths inside it are relative to its directory. The options below override its values.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// The name of the election, printed at the top of every report.
    #[clap(short, long, value_parser)]
    pub name: Option<String>,

    /// (file path) The precinct index, a CSV file with one row per precinct and one column per
    /// district type.
    #[clap(short, long, value_parser)]
    pub precincts: Option<String>,

    /// (file path) The fixed-width text export of the WinEDS Reporting Tool.
    #[clap(short, long, value_parser)]
    pub export: Option<String>,

    /// (file path without extension) Where to write the reports. The extension of each format
    /// (.tsv, .xlsx) is appended.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference TSV report. If provided, the generated TSV report must match it
    /// exactly, and nothing is written otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default tsv,xlsx) The output formats to write.
    #[clap(long, value_parser, use_value_delimiter = true)]
    pub format: Option<Vec<String>>,

    /// Write the reports even if some precincts lack registration or ballots cast figures.
    /// The missing figures are counted as zero.
    #[clap(long, takes_value = false)]
    pub allow_missing_meta: bool,

    /// (for example 2014-06-03T20:00:00) Use this time in the "Report generated on" line instead
    /// of the current time. Useful to compare with a reference.
    #[clap(long, value_parser)]
    pub generated_at: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
