use log::{debug, info, warn};
use snafu::ensure;

use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::decoder::decode_line;
use crate::report::*;
use crate::resolver::{District, DistrictResolver};

// Per reporting type, indexed by ReportingType::index().
type BucketCounts = [u64; 3];

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum ChoiceRole {
    Candidate,
    Overvote,
    Undervote,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct ChoiceSlot {
    choice: Choice,
    role: ChoiceRole,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct PrecinctTally {
    precinct_id: u32,
    precinct_name: String,
    // Indexed by choice slot.
    votes: Vec<BucketCounts>,
}

/// The contest currently receiving records.
#[derive(Eq, PartialEq, Debug, Clone)]
struct ContestTally {
    contest_id: u32,
    name: String,
    district_name: Option<String>,
    slots: Vec<ChoiceSlot>,
    slot_by_choice: HashMap<u32, usize>,
    precincts: Vec<PrecinctTally>,
    precinct_by_id: HashMap<u32, usize>,
}

impl ContestTally {
    fn new(record: &VoteRecord) -> ContestTally {
        ContestTally {
            contest_id: record.contest_id,
            name: record.contest_name.clone(),
            district_name: record.district_name.clone(),
            slots: Vec::new(),
            slot_by_choice: HashMap::new(),
            precincts: Vec::new(),
            precinct_by_id: HashMap::new(),
        }
    }

    fn add(&mut self, line_no: usize, record: &VoteRecord, layout: &ExportLayout) -> TallyResult<()> {
        ensure!(
            record.contest_name == self.name && record.district_name == self.district_name,
            InconsistentContestSnafu {
                line_no,
                contest_id: self.contest_id,
                expected: describe_contest(&self.name, &self.district_name),
                found: describe_contest(&record.contest_name, &record.district_name),
            }
        );

        let slot = match self.slot_by_choice.get(&record.choice_id) {
            Some(idx) => {
                let existing = &self.slots[*idx].choice.name;
                ensure!(
                    *existing == record.choice_name,
                    InconsistentChoiceSnafu {
                        line_no,
                        contest_id: self.contest_id,
                        choice_id: record.choice_id,
                        expected: existing.clone(),
                        found: record.choice_name.clone(),
                    }
                );
                *idx
            }
            None => {
                let role = if record.choice_name == layout.overvote_choice_name {
                    ChoiceRole::Overvote
                } else if record.choice_name == layout.undervote_choice_name {
                    ChoiceRole::Undervote
                } else {
                    ChoiceRole::Candidate
                };
                debug!(
                    "contest {}: adding choice {}: {} ({:?})",
                    self.contest_id, record.choice_id, record.choice_name, role
                );
                self.slots.push(ChoiceSlot {
                    choice: Choice {
                        choice_id: record.choice_id,
                        name: record.choice_name.clone(),
                        party_code: record.party_code.clone(),
                    },
                    role,
                });
                self.slot_by_choice
                    .insert(record.choice_id, self.slots.len() - 1);
                self.slots.len() - 1
            }
        };

        let pidx = match self.precinct_by_id.get(&record.precinct_id) {
            Some(idx) => *idx,
            None => {
                self.precincts.push(PrecinctTally {
                    precinct_id: record.precinct_id,
                    precinct_name: record.precinct_name.clone(),
                    votes: Vec::new(),
                });
                self.precinct_by_id
                    .insert(record.precinct_id, self.precincts.len() - 1);
                self.precincts.len() - 1
            }
        };

        let votes = &mut self.precincts[pidx].votes;
        if votes.len() <= slot {
            votes.resize(slot + 1, [0; 3]);
        }
        votes[slot][record.reporting_type.index()] += record.vote_total;
        Ok(())
    }
}

fn describe_contest(name: &str, district_name: &Option<String>) -> String {
    match district_name {
        Some(d) => format!("{} - {}", name, d),
        None => name.to_string(),
    }
}

/// Where the tabulator is in the export.
///
/// The export is grouped by contest: the first record of another contest
/// closes the open one, and a closed contest can never be opened again.
#[derive(Eq, PartialEq, Debug, Clone)]
enum ContestState {
    Closed,
    OpenMeta(u32),
    Open(ContestTally),
}

impl ContestState {
    fn open_id(&self) -> Option<u32> {
        match self {
            ContestState::Closed => None,
            ContestState::OpenMeta(id) => Some(*id),
            ContestState::Open(t) => Some(t.contest_id),
        }
    }
}

/// Folds the records of an export, in order, into an [ElectionReport].
///
/// ```
/// use statement_of_vote::{ExportLayout, PrecinctIndex, Tabulator};
/// # use statement_of_vote::TallyError;
///
/// let index = PrecinctIndex::new();
/// let mut tabulator = Tabulator::new(&index, ExportLayout::default());
/// tabulator.push_line(1, "0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101")?;
/// tabulator.push_line(2, "0002001110100141  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101")?;
/// tabulator.push_line(3, "0175098110100082  State Proposition 42  Yes  Pct 1101  CALIFORNIA")?;
/// let report = tabulator.finish()?;
///
/// assert_eq!(report.contests[0].grand_total.combined.votes, vec![82]);
/// assert_eq!(report.contests[0].grand_total.turnout().to_string(), "29.13");
/// # Ok::<(), TallyError>(())
/// ```
pub struct Tabulator<R: DistrictResolver> {
    resolver: R,
    layout: ExportLayout,
    state: ContestState,
    closed: HashSet<u32>,
    registration: HashMap<u32, u64>,
    ballots_cast: HashMap<u32, BucketCounts>,
    // Reporting types seen on tally and ballots-cast records.
    active: [bool; 3],
    reported: HashSet<(u32, String)>,
    missing_meta: HashSet<(u32, MetaKind)>,
    contests: Vec<ContestReport>,
    diagnostics: Vec<Diagnostic>,
}

impl<R: DistrictResolver> Tabulator<R> {
    pub fn new(resolver: R, layout: ExportLayout) -> Tabulator<R> {
        Tabulator {
            resolver,
            layout,
            state: ContestState::Closed,
            closed: HashSet::new(),
            registration: HashMap::new(),
            ballots_cast: HashMap::new(),
            active: [false; 3],
            reported: HashSet::new(),
            missing_meta: HashSet::new(),
            contests: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Decodes and folds one raw line. Blank lines are skipped.
    pub fn push_line(&mut self, line_no: usize, line: &str) -> TallyResult<()> {
        if line.trim().is_empty() {
            debug!("line {}: skipping blank line", line_no);
            return Ok(());
        }
        let decoded = decode_line(line_no, line, &self.layout)?;
        self.push(line_no, decoded)
    }

    pub fn push(&mut self, line_no: usize, decoded: DecodedLine) -> TallyResult<()> {
        let record = decoded.record();
        if record.placeholder_total {
            warn!(
                "line {}: placeholder vote total read as 0: contest_id={}, choice_id={}, precinct_id={}",
                line_no, record.contest_id, record.choice_id, record.precinct_id
            );
        }
        self.advance(line_no, record.contest_id)?;

        match decoded {
            DecodedLine::Meta(kind, record) => {
                if let ContestState::Open(t) = &self.state {
                    return InconsistentContestSnafu {
                        line_no,
                        contest_id: t.contest_id,
                        expected: describe_contest(&t.name, &t.district_name),
                        found: record.contest_name,
                    }
                    .fail();
                }
                ensure!(
                    self.contests.is_empty(),
                    MetaAfterContestSnafu {
                        line_no,
                        contest_id: record.contest_id
                    }
                );
                if self.state == ContestState::Closed {
                    debug!("opening summary contest {}: {}", record.contest_id, kind);
                    self.state = ContestState::OpenMeta(record.contest_id);
                }
                self.record_meta(kind, &record);
                Ok(())
            }
            DecodedLine::Tally(record) => {
                self.active[record.reporting_type.index()] = true;
                match &mut self.state {
                    ContestState::Open(t) => return t.add(line_no, &record, &self.layout),
                    ContestState::OpenMeta(id) => {
                        return InconsistentContestSnafu {
                            line_no,
                            contest_id: *id,
                            expected: "a registration or ballots cast summary".to_string(),
                            found: describe_contest(&record.contest_name, &record.district_name),
                        }
                        .fail();
                    }
                    ContestState::Closed => {}
                }
                debug!(
                    "opening contest {}: {}",
                    record.contest_id, record.contest_name
                );
                let mut t = ContestTally::new(&record);
                t.add(line_no, &record, &self.layout)?;
                self.state = ContestState::Open(t);
                Ok(())
            }
        }
    }

    /// Closes the last contest and hands over the report.
    pub fn finish(mut self) -> TallyResult<ElectionReport> {
        self.close_current();
        let reporting_types = self.reporting_types();
        for contest in self.contests.iter_mut() {
            contest.keep_reporting_types(&reporting_types);
        }
        info!(
            "tabulated {} contests, {} diagnostics",
            self.contests.len(),
            self.diagnostics.len()
        );
        Ok(ElectionReport {
            contests: self.contests,
            reporting_types,
            diagnostics: self.diagnostics,
        })
    }

    // Moves the state machine to `contest_id`, closing the open contest if needed.
    fn advance(&mut self, line_no: usize, contest_id: u32) -> TallyResult<()> {
        if self.state.open_id() == Some(contest_id) {
            return Ok(());
        }
        ensure!(
            !self.closed.contains(&contest_id),
            ContestReopenedSnafu {
                line_no,
                contest_id
            }
        );
        self.close_current();
        Ok(())
    }

    fn record_meta(&mut self, kind: MetaKind, record: &VoteRecord) {
        match kind {
            MetaKind::Registration => {
                *self.registration.entry(record.precinct_id).or_insert(0) += record.vote_total;
            }
            MetaKind::BallotsCast => {
                self.active[record.reporting_type.index()] = true;
                self.ballots_cast
                    .entry(record.precinct_id)
                    .or_insert([0; 3])[record.reporting_type.index()] += record.vote_total;
            }
        }
    }

    fn reporting_types(&self) -> Vec<ReportingType> {
        let split = self.active[ReportingType::ElectionDay.index()]
            || self.active[ReportingType::VoteByMail.index()];
        if !split {
            return Vec::new();
        }
        ReportingType::ALL
            .into_iter()
            .filter(|rt| *rt != ReportingType::Unspecified || self.active[rt.index()])
            .collect()
    }

    fn close_current(&mut self) {
        match std::mem::replace(&mut self.state, ContestState::Closed) {
            ContestState::Closed => {}
            ContestState::OpenMeta(id) => {
                debug!("closing summary contest {}", id);
                self.closed.insert(id);
            }
            ContestState::Open(t) => {
                self.closed.insert(t.contest_id);
                let report = self.close_contest(t);
                info!(
                    "closed contest: {} ({} precincts, {} choices)",
                    report.title(),
                    report.precincts.len(),
                    report.choices.len()
                );
                self.contests.push(report);
            }
        }
    }

    fn close_contest(&mut self, t: ContestTally) -> ContestReport {
        let candidates: Vec<usize> = (0..t.slots.len())
            .filter(|i| t.slots[*i].role == ChoiceRole::Candidate)
            .collect();
        let overvote = t.slots.iter().position(|s| s.role == ChoiceRole::Overvote);
        let undervote = t.slots.iter().position(|s| s.role == ChoiceRole::Undervote);
        let shape = RowShape {
            candidates: candidates.len(),
            overvotes: overvote.is_some(),
            undervotes: undervote.is_some(),
            // Pruned to the reporting types of the whole export in finish().
            reporting_types: ReportingType::ALL.to_vec(),
        };

        let mut precincts: Vec<TotalsRow> = Vec::with_capacity(t.precincts.len());
        for p in t.precincts.iter() {
            let registration = match self.registration.get(&p.precinct_id) {
                Some(v) => *v,
                None => {
                    self.note_missing_meta(t.contest_id, p.precinct_id, MetaKind::Registration);
                    0
                }
            };
            let ballots = match self.ballots_cast.get(&p.precinct_id) {
                Some(b) => *b,
                None => {
                    self.note_missing_meta(t.contest_id, p.precinct_id, MetaKind::BallotsCast);
                    [0; 3]
                }
            };

            let figures = |bucket: Option<ReportingType>| -> Figures {
                let count = |slot: usize| -> u64 {
                    let counts = p.votes.get(slot).copied().unwrap_or([0; 3]);
                    match bucket {
                        Some(rt) => counts[rt.index()],
                        None => counts.iter().sum(),
                    }
                };
                Figures {
                    registration,
                    ballots_cast: match bucket {
                        Some(rt) => ballots[rt.index()],
                        None => ballots.iter().sum(),
                    },
                    votes: candidates.iter().map(|s| count(*s)).collect(),
                    overvotes: overvote.map(&count),
                    undervotes: undervote.map(&count),
                }
            };

            precincts.push(TotalsRow {
                label: p.precinct_name.clone(),
                area: Area::Precinct(p.precinct_id),
                precinct_count: 1,
                combined: figures(None),
                by_reporting: shape
                    .reporting_types
                    .iter()
                    .map(|rt| (*rt, figures(Some(*rt))))
                    .collect(),
            });
        }

        let mut grand_total = TotalsRow::empty(GRAND_TOTALS_LABEL, Area::Jurisdiction, &shape);
        for row in precincts.iter() {
            grand_total.absorb(row);
        }

        let mut district_blocks = Vec::new();
        for hierarchy in self.resolver.district_hierarchies() {
            let districts = self.district_rows(&hierarchy, &precincts, &shape);
            debug!(
                "contest {}: {} {} districts",
                t.contest_id,
                districts.len(),
                hierarchy
            );
            district_blocks.push(DistrictBlock {
                hierarchy,
                districts,
                grand_total: grand_total.clone(),
            });
        }

        ContestReport {
            contest_id: t.contest_id,
            name: t.name,
            district_name: t.district_name,
            choices: candidates
                .iter()
                .map(|s| t.slots[*s].choice.clone())
                .collect(),
            has_overvotes: overvote.is_some(),
            has_undervotes: undervote.is_some(),
            precincts,
            grand_total,
            district_blocks,
        }
    }

    fn district_rows(
        &mut self,
        hierarchy: &str,
        precincts: &[TotalsRow],
        shape: &RowShape,
    ) -> Vec<TotalsRow> {
        let mut rows: Vec<TotalsRow> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();
        for row in precincts.iter() {
            let precinct_id = match row.area {
                Area::Precinct(id) => id,
                _ => continue,
            };
            let district = match self.resolver.district_for(precinct_id, hierarchy) {
                Some(d) => d,
                None => {
                    self.note_unmapped(precinct_id, hierarchy);
                    District::unmapped()
                }
            };
            let idx = *by_key.entry(district.key.clone()).or_insert_with(|| {
                rows.push(TotalsRow::empty(
                    &district.name,
                    Area::District {
                        hierarchy: hierarchy.to_string(),
                        key: district.key.clone(),
                    },
                    shape,
                ));
                rows.len() - 1
            });
            rows[idx].absorb(row);
        }

        if let Some(order) = self.resolver.district_order(hierarchy) {
            let position: HashMap<&str, usize> = order
                .iter()
                .enumerate()
                .map(|(i, k)| (k.as_str(), i))
                .collect();
            // Stable: districts missing from the order keep their first-seen order, last.
            rows.sort_by_key(|r| match &r.area {
                Area::District { key, .. } => {
                    position.get(key.as_str()).copied().unwrap_or(usize::MAX)
                }
                _ => usize::MAX,
            });
        }
        rows
    }

    fn note_missing_meta(&mut self, contest_id: u32, precinct_id: u32, kind: MetaKind) {
        if self.missing_meta.insert((precinct_id, kind)) {
            let d = Diagnostic::MissingMeta {
                contest_id,
                precinct_id,
                kind,
            };
            warn!("{}", d);
            self.diagnostics.push(d);
        }
    }

    fn note_unmapped(&mut self, precinct_id: u32, hierarchy: &str) {
        if self.reported.insert((precinct_id, hierarchy.to_string())) {
            let d = Diagnostic::Unmapped {
                precinct_id,
                hierarchy: hierarchy.to_string(),
            };
            warn!("{}", d);
            self.diagnostics.push(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabulate_lines;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[derive(Default)]
    struct FakeResolver {
        hierarchies: Vec<String>,
        districts: HashMap<(u32, String), District>,
    }

    impl FakeResolver {
        fn with(mut self, precinct_id: u32, hierarchy: &str, key: &str, name: &str) -> Self {
            if !self.hierarchies.iter().any(|h| h == hierarchy) {
                self.hierarchies.push(hierarchy.to_string());
            }
            self.districts
                .insert((precinct_id, hierarchy.to_string()), District::new(key, name));
            self
        }
    }

    impl DistrictResolver for FakeResolver {
        fn district_hierarchies(&self) -> Vec<String> {
            self.hierarchies.clone()
        }

        fn district_for(&self, precinct_id: u32, hierarchy: &str) -> Option<District> {
            self.districts
                .get(&(precinct_id, hierarchy.to_string()))
                .cloned()
        }
    }

    fn resolver() -> FakeResolver {
        FakeResolver::default()
            .with(1101, "Congressional", "12", "12TH CONGRESSIONAL DISTRICT")
            .with(1102, "Congressional", "13", "13TH CONGRESSIONAL DISTRICT")
            .with(9902, "Congressional", "13", "13TH CONGRESSIONAL DISTRICT")
            .with(1101, "Neighborhood", "MISSION", "MISSION")
            .with(1102, "Neighborhood", "MISSION", "MISSION")
    }

    const GENERAL: &[&str] = &[
        "0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101",
        "0001001110200300  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1102",
        "0001001990200000  REGISTERED VOTERS - TOTAL  VOTERS  Pct 9902 MB",
        "0002001110100141  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101",
        "0002001110200150  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1102",
        "0002001990200000  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 9902 MB",
        "0100001110100017DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA",
        "0100002110100020REP  Governor  MEG WHITMAN  Pct 1101  CALIFORNIA",
        "0100003110100004  Governor  Over Vote  Pct 1101  CALIFORNIA",
        "0100004110100100  Governor  Under Vote  Pct 1101  CALIFORNIA",
        "0100001110200050DEM  Governor  EDMUND G. BROWN  Pct 1102  CALIFORNIA",
        "0100002110200060REP  Governor  MEG WHITMAN  Pct 1102  CALIFORNIA",
        "0100001990200000DEM  Governor  EDMUND G. BROWN  Pct 9902 MB  CALIFORNIA",
        "0100002990200000REP  Governor  MEG WHITMAN  Pct 9902 MB  CALIFORNIA",
        "",
        "0175098110100082  State Proposition 42  Yes  Pct 1101  CALIFORNIA",
        "0175099110100040  State Proposition 42  No  Pct 1101  CALIFORNIA",
        "0175098990200000  State Proposition 42  Yes  Pct 9902 MB  CALIFORNIA",
    ];

    fn general_report() -> ElectionReport {
        init();
        tabulate_lines(GENERAL.iter(), resolver(), &ExportLayout::default()).unwrap()
    }

    #[test]
    fn meta_contests_are_not_reported() {
        let report = general_report();
        let ids: Vec<u32> = report.contests.iter().map(|c| c.contest_id).collect();
        assert_eq!(ids, vec![100, 175]);
        assert!(!report.has_reporting_types());
    }

    #[test]
    fn grand_total_is_the_sum_of_precincts() {
        let report = general_report();
        let governor = report.contest(100).unwrap();
        assert_eq!(governor.title(), "Governor - CALIFORNIA (100)");
        let names: Vec<&str> = governor.choices.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["EDMUND G. BROWN", "MEG WHITMAN"]);
        assert_eq!(governor.choices[0].party_code.as_deref(), Some("DEM"));

        let total = &governor.grand_total;
        assert_eq!(total.label, GRAND_TOTALS_LABEL);
        assert_eq!(total.precinct_count, 3);
        assert_eq!(total.combined.registration, 784);
        assert_eq!(total.combined.ballots_cast, 291);
        assert_eq!(total.combined.votes, vec![67, 80]);
        assert_eq!(total.combined.overvotes, Some(4));
        assert_eq!(total.combined.undervotes, Some(100));
        assert_eq!(total.turnout().to_string(), "37.12");

        let mut sum = Figures::default();
        for row in governor.precincts.iter() {
            sum += &row.combined;
        }
        assert_eq!(sum, total.combined);
    }

    #[test]
    fn precincts_keep_their_first_seen_order() {
        let report = general_report();
        let governor = report.contest(100).unwrap();
        let labels: Vec<&str> = governor.precincts.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Pct 1101", "Pct 1102", "Pct 9902 MB"]);
        assert_eq!(governor.precincts[1].combined.overvotes, Some(0));
    }

    #[test]
    fn mail_ballot_precinct_has_zero_turnout() {
        let report = general_report();
        let governor = report.contest(100).unwrap();
        let mb = &governor.precincts[2];
        assert_eq!(mb.area, Area::Precinct(9902));
        assert_eq!(mb.turnout(), Turnout::ZERO);
        assert_eq!(mb.turnout().to_string(), "0.00");
    }

    #[test]
    fn district_blocks_partition_the_grand_total() {
        let report = general_report();
        for contest in report.contests.iter() {
            assert_eq!(contest.district_blocks.len(), 2);
            for block in contest.district_blocks.iter() {
                assert_eq!(block.grand_total, contest.grand_total);
                let mut sum = Figures::default();
                let mut count = 0;
                for row in block.districts.iter() {
                    sum += &row.combined;
                    count += row.precinct_count;
                }
                assert_eq!(sum, contest.grand_total.combined);
                assert_eq!(count, contest.grand_total.precinct_count);
            }
        }
    }

    #[test]
    fn districts_in_first_encounter_order() {
        let report = general_report();
        let governor = report.contest(100).unwrap();
        let congressional = &governor.district_blocks[0];
        assert_eq!(congressional.hierarchy, "Congressional");
        let labels: Vec<&str> = congressional
            .districts
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["12TH CONGRESSIONAL DISTRICT", "13TH CONGRESSIONAL DISTRICT"]
        );
        assert_eq!(congressional.districts[1].combined.votes, vec![50, 60]);
        assert_eq!(congressional.districts[1].precinct_count, 2);
    }

    #[test]
    fn unmapped_precincts_are_reported_once() {
        let report = general_report();
        let neighborhoods = &report.contest(175).unwrap().district_blocks[1];
        let unmapped = neighborhoods
            .districts
            .iter()
            .find(|r| r.label == crate::resolver::UNMAPPED_DISTRICT_NAME)
            .unwrap();
        assert_eq!(unmapped.precinct_count, 1);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::Unmapped {
                precinct_id: 9902,
                hierarchy: "Neighborhood".to_string()
            }]
        );
        assert!(report.check_schema().is_ok());
    }

    #[test]
    fn reopened_contest_fails() {
        init();
        let lines = [
            "0100001110100017DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA",
            "0175098110100082  State Proposition 42  Yes  Pct 1101  CALIFORNIA",
            "0100002110100020REP  Governor  MEG WHITMAN  Pct 1101  CALIFORNIA",
        ];
        let err = tabulate_lines(lines, resolver(), &ExportLayout::default()).unwrap_err();
        assert!(matches!(
            err,
            TallyError::ContestReopened {
                line_no: 3,
                contest_id: 100
            }
        ));
    }

    #[test]
    fn renamed_choice_fails() {
        init();
        let lines = [
            "0100001110100017DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA",
            "0100001110200050DEM  Governor  JERRY BROWN  Pct 1102  CALIFORNIA",
        ];
        let err = tabulate_lines(lines, resolver(), &ExportLayout::default()).unwrap_err();
        assert!(matches!(
            err,
            TallyError::InconsistentChoice {
                line_no: 2,
                choice_id: 1,
                ..
            }
        ));
    }

    #[test]
    fn renamed_contest_fails() {
        init();
        let lines = [
            "0100001110100017DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA",
            "0100002110100020REP  Lieutenant Governor  MEG WHITMAN  Pct 1101  CALIFORNIA",
        ];
        let err = tabulate_lines(lines, resolver(), &ExportLayout::default()).unwrap_err();
        assert!(matches!(err, TallyError::InconsistentContest { line_no: 2, .. }));
    }

    #[test]
    fn missing_meta_is_a_schema_error() {
        init();
        let lines = ["0175098110100082  State Proposition 42  Yes  Pct 1101  CALIFORNIA"];
        let report = tabulate_lines(lines, resolver(), &ExportLayout::default()).unwrap();
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.contests[0].grand_total.turnout(), Turnout::ZERO);
        assert!(matches!(
            report.check_schema(),
            Err(TallyError::MissingMeta {
                count: 2,
                precinct_id: 1101,
                ..
            })
        ));
    }

    #[test]
    fn complete_export_splits_reporting_types() {
        init();
        let lines = [
            "0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101",
            "0002001110100100  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101  TC-Election Day Reporting",
            "0002001110100041  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101  TC-VBM Reporting",
            "0100001110100030DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA  TC-Election Day Reporting",
            "0100001110100012DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA  TC-VBM Reporting",
        ];
        let report = tabulate_lines(lines, resolver(), &ExportLayout::default()).unwrap();
        assert_eq!(
            report.reporting_types,
            vec![ReportingType::ElectionDay, ReportingType::VoteByMail]
        );
        let row = &report.contests[0].precincts[0];
        assert_eq!(row.combined.ballots_cast, 141);
        assert_eq!(row.combined.votes, vec![42]);

        let election_day = row.figures_for(ReportingType::ElectionDay).unwrap();
        assert_eq!(election_day.registration, 484);
        assert_eq!(election_day.ballots_cast, 100);
        assert_eq!(election_day.votes, vec![30]);
        let vbm = row.figures_for(ReportingType::VoteByMail).unwrap();
        assert_eq!(vbm.ballots_cast, 41);
        assert_eq!(vbm.votes, vec![12]);
        assert_eq!(vbm.turnout().to_string(), "8.47");
        assert!(row.figures_for(ReportingType::Unspecified).is_none());
    }

    fn assert_buckets_add_up(row: &TotalsRow, reporting_types: &[ReportingType]) {
        let rts: Vec<ReportingType> = row.by_reporting.iter().map(|(rt, _)| *rt).collect();
        assert_eq!(rts, reporting_types, "{}", row.label);
        let mut votes = vec![0; row.combined.votes.len()];
        let mut ballots_cast = 0;
        for (_, f) in row.by_reporting.iter() {
            for (v, x) in votes.iter_mut().zip(f.votes.iter()) {
                *v += x;
            }
            ballots_cast += f.ballots_cast;
            assert_eq!(f.registration, row.combined.registration);
        }
        assert_eq!(votes, row.combined.votes, "{}", row.label);
        assert_eq!(ballots_cast, row.combined.ballots_cast, "{}", row.label);
    }

    #[test]
    fn contests_closed_before_the_first_reporting_type_are_split_too() {
        init();
        let lines = [
            "0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101",
            "0002001110100141  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101",
            "0100001110100017DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA",
            "0175098110100005  State Proposition 42  Yes  Pct 1101  CALIFORNIA  TC-VBM Reporting",
        ];
        let report = tabulate_lines(lines, resolver(), &ExportLayout::default()).unwrap();
        let all = vec![
            ReportingType::ElectionDay,
            ReportingType::VoteByMail,
            ReportingType::Unspecified,
        ];
        assert_eq!(report.reporting_types, all);

        for contest in report.contests.iter() {
            for row in contest.precincts.iter() {
                assert_buckets_add_up(row, &all);
            }
            assert_buckets_add_up(&contest.grand_total, &all);
            for block in contest.district_blocks.iter() {
                assert_buckets_add_up(&block.grand_total, &all);
                for row in block.districts.iter() {
                    assert_buckets_add_up(row, &all);
                }
            }
        }

        let governor = &report.contests[0].grand_total;
        assert_eq!(
            governor.figures_for(ReportingType::Unspecified).unwrap().votes,
            vec![17]
        );
        assert_eq!(
            governor.figures_for(ReportingType::ElectionDay).unwrap().votes,
            vec![0]
        );
        let proposition = &report.contests[1].grand_total;
        assert_eq!(
            proposition.figures_for(ReportingType::VoteByMail).unwrap().votes,
            vec![5]
        );
    }

    #[test]
    fn summary_after_a_contest_fails() {
        init();
        let lines = [
            "0100001110100017DEM  Governor  EDMUND G. BROWN  Pct 1101  CALIFORNIA",
            "0001001110100484  REGISTERED VOTERS - TOTAL  VOTERS  Pct 1101",
            "0002001110100141  BALLOTS CAST - TOTAL  BALLOTS CAST  Pct 1101",
        ];
        let err = tabulate_lines(lines, resolver(), &ExportLayout::default()).unwrap_err();
        assert!(matches!(
            err,
            TallyError::MetaAfterContest {
                line_no: 2,
                contest_id: 1
            }
        ));
    }

    #[test]
    fn resolver_order_wins_over_encounter_order() {
        init();
        let mut index = crate::PrecinctIndex::new();
        for (pid, key) in [(1101, "13"), (1102, "8")] {
            index.add_precinct(pid, &format!("Pct {}", pid));
            index.assign(
                pid,
                "Congressional",
                District::new(key, &format!("{}TH CONGRESSIONAL DISTRICT", key)),
            );
        }
        index.sort_districts();
        let report = tabulate_lines(GENERAL.iter(), &index, &ExportLayout::default()).unwrap();
        let keys: Vec<String> = report.contests[0].district_blocks[0]
            .districts
            .iter()
            .filter_map(|r| match &r.area {
                Area::District { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec!["8", "13", "unmapped"]);
    }
}
