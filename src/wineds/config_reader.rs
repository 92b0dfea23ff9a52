use crate::args::Args;
use crate::wineds::*;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use statement_of_vote::ExportLayout;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ELECTION_JURISDICTION: &str = "CITY/COUNTY OF SAN FRANCISCO";
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "electionName")]
    pub election_name: Option<String>,
    #[serde(rename = "outputBase")]
    pub output_base: Option<String>,
    pub formats: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DistrictTypeSource {
    pub name: String,
    pub column: Option<String>,
    #[serde(rename = "nameFormat")]
    pub name_format: Option<String>,
    pub names: Option<BTreeMap<String, String>>,
    pub jurisdiction: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PrecinctSource {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "idColumn")]
    pub id_column: Option<String>,
    #[serde(rename = "nameColumn")]
    pub name_column: Option<String>,
    #[serde(rename = "districtTypes")]
    pub district_types: Option<Vec<DistrictTypeSource>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ExportSource {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "registrationContestId")]
    pub registration_contest_id: Option<u32>,
    #[serde(rename = "registrationContestName")]
    pub registration_contest_name: Option<String>,
    #[serde(rename = "ballotsCastContestId")]
    pub ballots_cast_contest_id: Option<u32>,
    #[serde(rename = "ballotsCastContestName")]
    pub ballots_cast_contest_name: Option<String>,
    #[serde(rename = "overvoteLabel")]
    pub overvote_label: Option<String>,
    #[serde(rename = "undervoteLabel")]
    pub undervote_label: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct WinedsConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "precinctFile")]
    pub precinct_file: Option<PrecinctSource>,
    #[serde(rename = "exportFile")]
    pub export_file: Option<ExportSource>,
    #[serde(rename = "allowMissingMeta")]
    pub allow_missing_meta: Option<bool>,
}

pub fn read_config(path: &Path) -> WinedsResult<WinedsConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.display().to_string(),
    })?;
    debug!("read content: {:?}", contents);
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
        path: path.display().to_string(),
    })
}

// ********* Resolved settings **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Tsv,
    Xlsx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Xlsx => "xlsx",
        }
    }

    fn parse(s: &str) -> WinedsResult<OutputFormat> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            _ => UnknownFormatSnafu { name: s }.fail(),
        }
    }
}

/// How the districts of one type get their display names.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DistrictNaming {
    /// `{}` is replaced with the district number.
    Format(String),
    /// From the label in the precinct file to the full name.
    Table(BTreeMap<String, String>),
    /// One district spanning every precinct.
    Jurisdiction(String),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistrictType {
    pub name: String,
    pub column: Option<String>,
    pub naming: DistrictNaming,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PrecinctColumns {
    pub id_column: String,
    pub name_column: String,
    pub district_types: Vec<DistrictType>,
}

impl Default for PrecinctColumns {
    fn default() -> Self {
        PrecinctColumns {
            id_column: "VotingPrecinctID".to_string(),
            name_column: "VotingPrecinctName".to_string(),
            district_types: default_district_types(),
        }
    }
}

/// The district types of San Francisco, in the order of the Statement of Vote.
pub fn default_district_types() -> Vec<DistrictType> {
    let numbered = |name: &str, format: &str| DistrictType {
        name: name.to_string(),
        column: Some(name.to_string()),
        naming: DistrictNaming::Format(format.to_string()),
    };
    vec![
        numbered("Congressional", "{}TH CONGRESSIONAL DISTRICT"),
        numbered("Senatorial", "{}TH SENATORIAL DISTRICT"),
        numbered("Assembly", "{}TH ASSEMBLY DISTRICT"),
        numbered("BART", "BART DISTRICT {}"),
        numbered("Supervisorial", "SUPERVISORIAL DISTRICT {}"),
        DistrictType {
            name: "City".to_string(),
            column: None,
            naming: DistrictNaming::Jurisdiction(DEFAULT_ELECTION_JURISDICTION.to_string()),
        },
        DistrictType {
            name: "Neighborhood".to_string(),
            column: Some("Neighborhood".to_string()),
            naming: DistrictNaming::Table(default_neighborhood_names()),
        },
    ]
}

pub fn default_neighborhood_names() -> BTreeMap<String, String> {
    [
        ("BAYVW/HTRSPT", "BAYVIEW/HUNTERS POINT"),
        ("CHINA", "CHINATOWN"),
        ("CVC CTR/DWTN", "CIVIC CENTER/DOWNTOWN"),
        ("DIAMD HTS", "DIAMOND HEIGHTS"),
        ("EXCELSIOR", "EXCELSIOR (OUTER MISSION)"),
        ("HAIGHT ASH", "HAIGHT ASHBURY"),
        ("INGLESIDE", "INGLESIDE"),
        ("INNER SUNSET", "INNER SUNSET"),
        ("LAKE MERCED", "LAKE MERCED"),
        ("LRL HTS/ANZA", "LAUREL HEIGHTS/ANZA VISTA"),
        ("MAR/PAC HTS", "MARINA/PACIFIC HEIGHTS"),
        ("MISSION", "MISSION"),
        ("N BERNAL HTS", "NORTH BERNAL HTS"),
        ("N EMBRCDRO", "NORTH EMBARCADERO"),
        ("NOE VALLEY", "NOE VALLEY"),
        ("PORTOLA", "PORTOLA"),
        ("POTRERO HILL", "POTRERO HILL"),
        ("RICHMOND", "RICHMOND"),
        ("S BERNAL HTS", "SOUTH BERNAL HEIGHT"),
        ("SECLF/PREHTS", "SEA CLIFF/PRESIDIO HEIGHTS"),
        ("SOMA", "SOUTH OF MARKET"),
        ("SUNSET", "SUNSET"),
        ("UPRMKT/EURKA", "UPPER MARKET/EUREKA VALLEY"),
        ("VISITA VLY", "VISITATION VALLEY"),
        ("W TWIN PKS", "WEST OF TWIN PEAKS"),
        ("WST ADDITION", "WESTERN ADDITION"),
    ]
    .into_iter()
    .map(|(label, name)| (label.to_string(), name.to_string()))
    .collect()
}

fn read_district_type(source: &DistrictTypeSource) -> WinedsResult<DistrictType> {
    let naming = match (&source.jurisdiction, &source.name_format, &source.names) {
        (Some(j), None, None) => DistrictNaming::Jurisdiction(j.clone()),
        (None, Some(f), None) if f.contains("{}") => DistrictNaming::Format(f.clone()),
        (None, None, Some(t)) => DistrictNaming::Table(t.clone()),
        _ => {
            return InvalidDistrictTypeSnafu {
                name: source.name.clone(),
            }
            .fail()
        }
    };
    if source.column.is_none() && !matches!(naming, DistrictNaming::Jurisdiction(_)) {
        return InvalidDistrictTypeSnafu {
            name: source.name.clone(),
        }
        .fail();
    }
    Ok(DistrictType {
        name: source.name.clone(),
        column: source.column.clone(),
        naming,
    })
}

/// Everything a conversion needs, once the command line and the
/// configuration file have been merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub election_name: String,
    pub precincts_path: PathBuf,
    pub export_path: PathBuf,
    pub output_base: PathBuf,
    pub formats: Vec<OutputFormat>,
    pub precinct_columns: PrecinctColumns,
    pub layout: ExportLayout,
    pub allow_missing_meta: bool,
    pub reference: Option<PathBuf>,
    pub generated_at: Option<NaiveDateTime>,
}

impl Settings {
    /// The command line wins over the configuration file. Paths from the
    /// configuration file are relative to its directory.
    pub fn resolve(args: &Args) -> WinedsResult<Settings> {
        let (config, root) = match &args.config {
            Some(p) => {
                let path = Path::new(p);
                let config = read_config(path)?;
                info!("config: {:?}", config);
                let root = path.parent().context(MissingParentDirSnafu {})?;
                (Some(config), root.to_path_buf())
            }
            None => (None, PathBuf::new()),
        };
        let output = config.as_ref().and_then(|c| c.output_settings.clone());
        let precincts = config.as_ref().and_then(|c| c.precinct_file.clone());
        let export = config.as_ref().and_then(|c| c.export_file.clone());

        let from_config = |p: Option<String>| p.map(|s| root.join(s));
        let required = |cli: &Option<String>, conf: Option<PathBuf>, name: &str| {
            cli.as_ref()
                .map(PathBuf::from)
                .or(conf)
                .context(MissingSettingSnafu { name })
        };

        let election_name = args
            .name
            .clone()
            .or_else(|| output.as_ref().and_then(|o| o.election_name.clone()))
            .context(MissingSettingSnafu {
                name: "election name",
            })?;
        let precincts_path = required(
            &args.precincts,
            from_config(precincts.as_ref().and_then(|p| p.file_path.clone())),
            "precinct file",
        )?;
        let export_path = required(
            &args.export,
            from_config(export.as_ref().and_then(|e| e.file_path.clone())),
            "export file",
        )?;
        let output_base = required(
            &args.out,
            from_config(output.as_ref().and_then(|o| o.output_base.clone())),
            "output base",
        )?;

        let format_names = args
            .format
            .clone()
            .or_else(|| output.as_ref().and_then(|o| o.formats.clone()))
            .unwrap_or_else(|| vec!["tsv".to_string(), "xlsx".to_string()]);
        let mut formats = Vec::new();
        for name in format_names.iter() {
            let f = OutputFormat::parse(name)?;
            if !formats.contains(&f) {
                formats.push(f);
            }
        }

        let mut precinct_columns = PrecinctColumns::default();
        if let Some(p) = precincts.as_ref() {
            if let Some(c) = &p.id_column {
                precinct_columns.id_column = c.clone();
            }
            if let Some(c) = &p.name_column {
                precinct_columns.name_column = c.clone();
            }
            if let Some(types) = &p.district_types {
                precinct_columns.district_types = types
                    .iter()
                    .map(read_district_type)
                    .collect::<WinedsResult<Vec<DistrictType>>>()?;
            }
        }

        let mut layout = ExportLayout::default();
        if let Some(e) = export.as_ref() {
            if let Some(x) = e.registration_contest_id {
                layout.registration_contest_id = x;
            }
            if let Some(x) = &e.registration_contest_name {
                layout.registration_contest_name = x.clone();
            }
            if let Some(x) = e.ballots_cast_contest_id {
                layout.ballots_cast_contest_id = x;
            }
            if let Some(x) = &e.ballots_cast_contest_name {
                layout.ballots_cast_contest_name = x.clone();
            }
            if let Some(x) = &e.overvote_label {
                layout.overvote_choice_name = x.clone();
            }
            if let Some(x) = &e.undervote_label {
                layout.undervote_choice_name = x.clone();
            }
        }

        let generated_at = match &args.generated_at {
            Some(text) => Some(
                NaiveDateTime::parse_from_str(text, GENERATED_AT_FORMAT)
                    .context(InvalidTimestampSnafu { text })?,
            ),
            None => None,
        };

        Ok(Settings {
            election_name,
            precincts_path,
            export_path,
            output_base,
            formats,
            precinct_columns,
            layout,
            allow_missing_meta: args.allow_missing_meta
                || config
                    .as_ref()
                    .and_then(|c| c.allow_missing_meta)
                    .unwrap_or(false),
            reference: args.reference.as_ref().map(PathBuf::from),
            generated_at,
        })
    }

    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        let mut s = self.output_base.clone().into_os_string();
        s.push(".");
        s.push(format.extension());
        PathBuf::from(s)
    }
}
