// Reading of the precinct index (CSV).

use std::path::Path;

use csv::StringRecord;
use statement_of_vote::{District, PrecinctIndex};

use crate::wineds::config_reader::{DistrictNaming, DistrictType, PrecinctColumns};
use crate::wineds::*;

/// The key of the single district of a jurisdiction-wide type.
pub const JURISDICTION_DISTRICT_KEY: &str = "0";

pub fn read_precinct_index(path: &Path, columns: &PrecinctColumns) -> WinedsResult<PrecinctIndex> {
    let path_s = path.display().to_string();
    info!("Attempting to read precinct file {:?}", path_s);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(OpeningPrecinctsSnafu { path: &path_s })?;
    let headers = rdr
        .headers()
        .context(PrecinctRowSnafu { lineno: 1_usize })?
        .clone();
    debug!("read_precinct_index: headers: {:?}", headers);

    let id_idx = column_index(&headers, &columns.id_column)?;
    let name_idx = column_index(&headers, &columns.name_column)?;
    let mut type_columns: Vec<(&DistrictType, Option<usize>)> = Vec::new();
    for dt in columns.district_types.iter() {
        let idx = match &dt.column {
            Some(c) => Some(column_index(&headers, c)?),
            None => None,
        };
        type_columns.push((dt, idx));
    }

    let mut index = PrecinctIndex::new();
    for dt in columns.district_types.iter() {
        index.add_hierarchy(&dt.name);
    }

    for (idx, record_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let record = record_r.context(PrecinctRowSnafu { lineno })?;
        let id_text = field(&record, id_idx);
        let precinct_id = id_text
            .parse::<u32>()
            .ok()
            .context(PrecinctIdSnafu { lineno, text: id_text })?;
        if !index.add_precinct(precinct_id, field(&record, name_idx)) {
            warn!(
                "line {}: precinct_id {} occurred again, skipping the line",
                lineno, precinct_id
            );
            continue;
        }
        for (dt, col) in type_columns.iter() {
            let value = col.map(|c| field(&record, c)).unwrap_or("");
            match district_of(dt, value) {
                Some(district) => index.assign(precinct_id, &dt.name, district),
                None => debug!(
                    "line {}: precinct {} has no {} district",
                    lineno, precinct_id, dt.name
                ),
            }
        }
    }
    index.sort_districts();
    info!("parsed: {} precincts", index.len());
    Ok(index)
}

fn column_index(headers: &StringRecord, name: &str) -> WinedsResult<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .context(PrecinctColumnSnafu { column: name })
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn district_of(dt: &DistrictType, value: &str) -> Option<District> {
    match &dt.naming {
        DistrictNaming::Jurisdiction(name) => Some(District::new(JURISDICTION_DISTRICT_KEY, name)),
        _ if value.is_empty() => None,
        DistrictNaming::Format(format) => {
            // "08" and "8" are the same district.
            let key = match value.parse::<u32>() {
                Ok(n) => n.to_string(),
                Err(_) => value.to_string(),
            };
            Some(District::new(&key, &format.replace("{}", &key)))
        }
        DistrictNaming::Table(names) => match names.get(value) {
            Some(name) => Some(District::new(value, name)),
            None => {
                warn!("unknown {} label {:?}, using it as the name", dt.name, value);
                Some(District::new(value, value))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statement_of_vote::DistrictResolver;
    use std::fs;

    const PRECINCTS: &str = "\
VotingPrecinctID,VotingPrecinctName,MailBallotPrecinct,BalType,Assembly,BART,Congressional,Neighborhood,Senatorial,Supervisorial
1101,Pct 1101,N,Consolidated,17,08,12,CVC CTR/DWTN,11,6
1102,Pct 1102,N,Consolidated,17,8,12,MISSION,11,9
1101,Pct 1101 again,N,Consolidated,19,8,12,MISSION,11,9
9902,Pct 9902 MB,Y,Consolidated,19,8,14,FAR AWAY,11,
";

    fn read(contents: &str) -> WinedsResult<PrecinctIndex> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("precincts.csv");
        fs::write(&path, contents).unwrap();
        read_precinct_index(&path, &PrecinctColumns::default())
    }

    #[test]
    fn reads_districts() {
        let index = read(PRECINCTS).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.precinct_name(1101), Some("Pct 1101"));
        assert_eq!(
            index.district_for(1101, "Congressional"),
            Some(District::new("12", "12TH CONGRESSIONAL DISTRICT"))
        );
        assert_eq!(
            index.district_for(1101, "BART"),
            Some(District::new("8", "BART DISTRICT 8"))
        );
        assert_eq!(
            index.district_for(1101, "Neighborhood"),
            Some(District::new("CVC CTR/DWTN", "CIVIC CENTER/DOWNTOWN"))
        );
        assert_eq!(
            index.district_for(9902, "City"),
            Some(District::new("0", "CITY/COUNTY OF SAN FRANCISCO"))
        );
    }

    #[test]
    fn duplicate_precinct_keeps_the_first_row() {
        let index = read(PRECINCTS).unwrap();
        assert_eq!(
            index.district_for(1101, "Assembly"),
            Some(District::new("17", "17TH ASSEMBLY DISTRICT"))
        );
    }

    #[test]
    fn empty_district_is_unmapped() {
        let index = read(PRECINCTS).unwrap();
        assert_eq!(index.district_for(9902, "Supervisorial"), None);
        assert_eq!(
            index.district_order("Supervisorial"),
            Some(vec!["6".to_string(), "9".to_string()])
        );
    }

    #[test]
    fn unknown_neighborhood_keeps_its_label() {
        let index = read(PRECINCTS).unwrap();
        assert_eq!(
            index.district_for(9902, "Neighborhood"),
            Some(District::new("FAR AWAY", "FAR AWAY"))
        );
    }

    #[test]
    fn hierarchies_in_report_order() {
        let index = read(PRECINCTS).unwrap();
        assert_eq!(
            index.district_hierarchies(),
            vec![
                "Congressional",
                "Senatorial",
                "Assembly",
                "BART",
                "Supervisorial",
                "City",
                "Neighborhood"
            ]
        );
    }

    #[test]
    fn missing_column_fails() {
        let err = read("VotingPrecinctID,VotingPrecinctName\n1101,Pct 1101\n").unwrap_err();
        assert!(matches!(err, WinedsError::PrecinctColumn { .. }));
    }

    #[test]
    fn bad_precinct_id_fails() {
        let contents = PRECINCTS.replace("1102,Pct 1102", "11O2,Pct 1102");
        let err = read(&contents).unwrap_err();
        assert!(matches!(err, WinedsError::PrecinctId { lineno: 3, .. }));
    }
}
