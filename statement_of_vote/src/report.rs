//! The finished Statement of Vote, as handed to the writers.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::ops::AddAssign;

use crate::config::*;

pub const GRAND_TOTALS_LABEL: &str = "Grand Totals";

/// Turnout, exact to the hundredth of a percent.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct Turnout(u64);

impl Turnout {
    pub const ZERO: Turnout = Turnout(0);

    /// `ballots_cast / registration * 100`, rounded half up to two decimals.
    /// Zero when nobody is registered.
    pub fn compute(ballots_cast: u64, registration: u64) -> Turnout {
        if registration == 0 {
            return Turnout::ZERO;
        }
        let num = ballots_cast as u128 * 10_000 * 2 + registration as u128;
        let den = registration as u128 * 2;
        Turnout((num / den) as u64)
    }

    pub fn hundredths(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Display for Turnout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// The numbers of one row, for all ballots or for one reporting type.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Figures {
    pub registration: u64,
    pub ballots_cast: u64,
    /// One total per candidate choice, in the order of [ContestReport::choices].
    pub votes: Vec<u64>,
    pub overvotes: Option<u64>,
    pub undervotes: Option<u64>,
}

impl Figures {
    pub(crate) fn zeroed(shape: &RowShape) -> Figures {
        Figures {
            registration: 0,
            ballots_cast: 0,
            votes: vec![0; shape.candidates],
            overvotes: shape.overvotes.then_some(0),
            undervotes: shape.undervotes.then_some(0),
        }
    }

    pub fn turnout(&self) -> Turnout {
        Turnout::compute(self.ballots_cast, self.registration)
    }
}

fn add_opt(lhs: &mut Option<u64>, rhs: Option<u64>) {
    if let Some(r) = rhs {
        *lhs = Some(lhs.unwrap_or(0) + r);
    }
}

impl AddAssign<&Figures> for Figures {
    fn add_assign(&mut self, rhs: &Figures) {
        self.registration += rhs.registration;
        self.ballots_cast += rhs.ballots_cast;
        if self.votes.len() < rhs.votes.len() {
            self.votes.resize(rhs.votes.len(), 0);
        }
        for (v, r) in self.votes.iter_mut().zip(rhs.votes.iter()) {
            *v += r;
        }
        add_opt(&mut self.overvotes, rhs.overvotes);
        add_opt(&mut self.undervotes, rhs.undervotes);
    }
}

/// What a row of a given contest looks like.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct RowShape {
    pub candidates: usize,
    pub overvotes: bool,
    pub undervotes: bool,
    pub reporting_types: Vec<ReportingType>,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Area {
    Precinct(u32),
    District { hierarchy: String, key: String },
    Jurisdiction,
}

/// A precinct, a district or the whole jurisdiction, for one contest.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TotalsRow {
    pub label: String,
    pub area: Area,
    pub precinct_count: usize,
    pub combined: Figures,
    /// The split by reporting type, empty when the export does not have one.
    pub by_reporting: Vec<(ReportingType, Figures)>,
}

impl TotalsRow {
    pub(crate) fn empty(label: &str, area: Area, shape: &RowShape) -> TotalsRow {
        TotalsRow {
            label: label.to_string(),
            area,
            precinct_count: 0,
            combined: Figures::zeroed(shape),
            by_reporting: shape
                .reporting_types
                .iter()
                .map(|rt| (*rt, Figures::zeroed(shape)))
                .collect(),
        }
    }

    pub fn turnout(&self) -> Turnout {
        self.combined.turnout()
    }

    pub fn figures_for(&self, reporting_type: ReportingType) -> Option<&Figures> {
        self.by_reporting
            .iter()
            .find(|(rt, _)| *rt == reporting_type)
            .map(|(_, f)| f)
    }

    pub(crate) fn keep_reporting_types(&mut self, kept: &[ReportingType]) {
        self.by_reporting.retain(|(rt, _)| kept.contains(rt));
    }

    pub(crate) fn absorb(&mut self, other: &TotalsRow) {
        self.precinct_count += other.precinct_count;
        self.combined += &other.combined;
        for ((rt, f), (rt2, f2)) in self.by_reporting.iter_mut().zip(other.by_reporting.iter()) {
            debug_assert_eq!(rt, rt2);
            *f += f2;
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Choice {
    pub choice_id: u32,
    pub name: String,
    pub party_code: Option<String>,
}

/// The totals of one contest for every district of one hierarchy.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistrictBlock {
    pub hierarchy: String,
    pub districts: Vec<TotalsRow>,
    /// Always equal to the grand total of the contest.
    pub grand_total: TotalsRow,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ContestReport {
    pub contest_id: u32,
    pub name: String,
    pub district_name: Option<String>,
    /// Candidates and options, in the order of the export. Overvotes and
    /// undervotes are not part of this list.
    pub choices: Vec<Choice>,
    pub has_overvotes: bool,
    pub has_undervotes: bool,
    /// One row per precinct, in the order the precincts first appear.
    pub precincts: Vec<TotalsRow>,
    pub grand_total: TotalsRow,
    pub district_blocks: Vec<DistrictBlock>,
}

impl ContestReport {
    /// For example `Governor - CALIFORNIA (100)`.
    pub fn title(&self) -> String {
        match &self.district_name {
            Some(d) => format!("{} - {} ({})", self.name, d, self.contest_id),
            None => format!("{} ({})", self.name, self.contest_id),
        }
    }

    pub fn choice_index(&self, choice_id: u32) -> Option<usize> {
        self.choices.iter().position(|c| c.choice_id == choice_id)
    }

    // Applied to every row, so that all rows list the same buckets.
    pub(crate) fn keep_reporting_types(&mut self, kept: &[ReportingType]) {
        for row in self.precincts.iter_mut() {
            row.keep_reporting_types(kept);
        }
        self.grand_total.keep_reporting_types(kept);
        for block in self.district_blocks.iter_mut() {
            block.grand_total.keep_reporting_types(kept);
            for row in block.districts.iter_mut() {
                row.keep_reporting_types(kept);
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ElectionReport {
    /// In the order of the export.
    pub contests: Vec<ContestReport>,
    /// The reporting types the export splits ballots into, empty if none.
    pub reporting_types: Vec<ReportingType>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ElectionReport {
    pub fn has_reporting_types(&self) -> bool {
        !self.reporting_types.is_empty()
    }

    pub fn contest(&self, contest_id: u32) -> Option<&ContestReport> {
        self.contests.iter().find(|c| c.contest_id == contest_id)
    }

    /// All the precincts that appear in at least one contest.
    pub fn precinct_ids(&self) -> BTreeSet<u32> {
        self.contests
            .iter()
            .flat_map(|c| c.precincts.iter())
            .filter_map(|r| match r.area {
                Area::Precinct(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Fails if some precinct had no registration or ballots-cast figure.
    pub fn check_schema(&self) -> TallyResult<()> {
        let missing: Vec<(u32, MetaKind)> = self
            .diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MissingMeta {
                    precinct_id, kind, ..
                } => Some((*precinct_id, *kind)),
                _ => None,
            })
            .collect();
        match missing.first() {
            None => Ok(()),
            Some((precinct_id, kind)) => MissingMetaSnafu {
                count: missing.len(),
                precinct_id: *precinct_id,
                kind: *kind,
            }
            .fail(),
        }
    }
}
