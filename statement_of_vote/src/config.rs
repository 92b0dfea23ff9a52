// ********* Input data structures ***********

use snafu::Snafu;
use std::error::Error;
use std::fmt::Display;

/// The ballots a tally line accounts for.
///
/// Only "complete" exports separate in-person from mailed ballots. Lines of
/// the other exports carry no reporting-type field and decode as `Unspecified`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Default)]
pub enum ReportingType {
    ElectionDay,
    VoteByMail,
    #[default]
    Unspecified,
}

impl ReportingType {
    pub const ALL: [ReportingType; 3] = [
        ReportingType::ElectionDay,
        ReportingType::VoteByMail,
        ReportingType::Unspecified,
    ];

    /// The column header used for this bucket in the reports.
    pub fn label(&self) -> &'static str {
        match self {
            ReportingType::ElectionDay => "Election Day",
            ReportingType::VoteByMail => "VBM",
            ReportingType::Unspecified => "Unspecified",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ReportingType::ElectionDay => 0,
            ReportingType::VoteByMail => 1,
            ReportingType::Unspecified => 2,
        }
    }
}

/// The two synthetic contests that carry precinct-level figures instead of votes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum MetaKind {
    Registration,
    BallotsCast,
}

impl Display for MetaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaKind::Registration => write!(f, "registration"),
            MetaKind::BallotsCast => write!(f, "ballots cast"),
        }
    }
}

/// One decoded line of the export.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub contest_id: u32,
    pub choice_id: u32,
    pub precinct_id: u32,
    pub vote_total: u64,
    /// The vote total columns held a placeholder such as `000-1` or `-1NON`.
    /// The total is then recorded as zero.
    pub placeholder_total: bool,
    pub party_code: Option<String>,
    pub contest_name: String,
    pub choice_name: String,
    pub precinct_name: String,
    pub district_name: Option<String>,
    pub reporting_type: ReportingType,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DecodedLine {
    /// A vote total for one choice of a real contest.
    Tally(VoteRecord),
    /// A registration or ballots-cast figure for one precinct.
    Meta(MetaKind, VoteRecord),
}

impl DecodedLine {
    pub fn record(&self) -> &VoteRecord {
        match self {
            DecodedLine::Tally(r) => r,
            DecodedLine::Meta(_, r) => r,
        }
    }
}

// ********* Configuration **********

/// Describes the conventions of a particular export.
///
/// The defaults follow the San Francisco exports of the WinEDS Reporting Tool.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExportLayout {
    pub registration_contest_id: u32,
    pub registration_contest_name: String,
    pub ballots_cast_contest_id: u32,
    pub ballots_cast_contest_name: String,
    pub overvote_choice_name: String,
    pub undervote_choice_name: String,
}

impl Default for ExportLayout {
    fn default() -> Self {
        ExportLayout {
            registration_contest_id: 1,
            registration_contest_name: "REGISTERED VOTERS - TOTAL".to_string(),
            ballots_cast_contest_id: 2,
            ballots_cast_contest_name: "BALLOTS CAST - TOTAL".to_string(),
            overvote_choice_name: "Over Vote".to_string(),
            undervote_choice_name: "Under Vote".to_string(),
        }
    }
}

impl ExportLayout {
    /// Classifies a line as one of the meta contests.
    ///
    /// The contest name wins over the contest id: the ids are only trusted for
    /// lines without a district field.
    pub fn meta_kind(
        &self,
        contest_id: u32,
        contest_name: &str,
        has_district: bool,
    ) -> Option<MetaKind> {
        if contest_name == self.registration_contest_name {
            Some(MetaKind::Registration)
        } else if contest_name == self.ballots_cast_contest_name {
            Some(MetaKind::BallotsCast)
        } else if has_district {
            None
        } else if contest_id == self.registration_contest_id {
            Some(MetaKind::Registration)
        } else if contest_id == self.ballots_cast_contest_id {
            Some(MetaKind::BallotsCast)
        } else {
            None
        }
    }
}

// ******** Errors *********

/// Why a line could not be decoded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DecodeFault {
    MissingLeadingZero,
    HeaderTooShort { len: usize },
    BadNumber { field: &'static str, text: String },
    FieldCount { count: usize },
    MetaWithDistrict { district: String },
}

impl Error for DecodeFault {}

impl Display for DecodeFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeFault::MissingLeadingZero => write!(f, "line does not start with 0"),
            DecodeFault::HeaderTooShort { len } => {
                write!(f, "numeric header has {} characters, expected 16", len)
            }
            DecodeFault::BadNumber { field, text } => {
                write!(f, "could not read {} from {:?}", field, text)
            }
            DecodeFault::FieldCount { count } => {
                write!(f, "found {} text fields, expected 3 to 5", count)
            }
            DecodeFault::MetaWithDistrict { district } => {
                write!(f, "summary line carries a district name {:?}", district)
            }
        }
    }
}

/// Errors that prevent a tabulation from completing.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("error while parsing line {line_no}: {source}: {line:?}"))]
    Decode {
        line_no: usize,
        line: String,
        source: DecodeFault,
    },

    #[snafu(display(
        "line {line_no}: contest {contest_id} appears again after it was closed (the export must be grouped by contest)"
    ))]
    ContestReopened { line_no: usize, contest_id: u32 },

    #[snafu(display(
        "line {line_no}: summary contest {contest_id} comes after a contest was already tabulated (registration and ballots cast must come first)"
    ))]
    MetaAfterContest { line_no: usize, contest_id: u32 },

    #[snafu(display(
        "line {line_no}: contest {contest_id} was first seen as {expected:?}, found {found:?}"
    ))]
    InconsistentContest {
        line_no: usize,
        contest_id: u32,
        expected: String,
        found: String,
    },

    #[snafu(display(
        "line {line_no}: choice {choice_id} of contest {contest_id} is already named {expected:?}, found {found:?}"
    ))]
    InconsistentChoice {
        line_no: usize,
        contest_id: u32,
        choice_id: u32,
        expected: String,
        found: String,
    },

    #[snafu(display(
        "{count} precinct(s) lack registration or ballots-cast figures (first: precinct {precinct_id}, {kind})"
    ))]
    MissingMeta {
        count: usize,
        precinct_id: u32,
        kind: MetaKind,
    },
}

pub type TallyResult<T> = Result<T, TallyError>;

/// Problems that do not stop the tabulation but change how the report reads.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Diagnostic {
    /// The resolver has no district for this precinct in this hierarchy.
    Unmapped { precinct_id: u32, hierarchy: String },
    /// No meta record was seen for this precinct when the contest closed;
    /// the figure was taken as zero.
    MissingMeta {
        contest_id: u32,
        precinct_id: u32,
        kind: MetaKind,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Unmapped {
                precinct_id,
                hierarchy,
            } => write!(
                f,
                "precinct {} has no {} district, counted as unmapped",
                precinct_id, hierarchy
            ),
            Diagnostic::MissingMeta {
                contest_id,
                precinct_id,
                kind,
            } => write!(
                f,
                "precinct {} has no {} figure (first needed by contest {}), using 0",
                precinct_id, kind, contest_id
            ),
        }
    }
}
