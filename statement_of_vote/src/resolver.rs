//! Mapping of precincts to the districts that contain them.

use std::collections::{BTreeMap, HashMap};

pub const UNMAPPED_DISTRICT_KEY: &str = "unmapped";
pub const UNMAPPED_DISTRICT_NAME: &str = "UNMAPPED PRECINCTS";

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct District {
    /// Identifies the district within its hierarchy (`12`, `BAYVW/HTRSPT`).
    pub key: String,
    /// The display name (`12TH CONGRESSIONAL DISTRICT`, `BAYVIEW/HUNTERS POINT`).
    pub name: String,
}

impl District {
    pub fn new(key: &str, name: &str) -> District {
        District {
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    pub fn unmapped() -> District {
        District::new(UNMAPPED_DISTRICT_KEY, UNMAPPED_DISTRICT_NAME)
    }
}

/// Answers which district a precinct belongs to, for each district hierarchy.
pub trait DistrictResolver {
    /// The hierarchies (congressional, neighborhood, ...), in report order.
    fn district_hierarchies(&self) -> Vec<String>;

    /// `None` when the precinct is not mapped in this hierarchy.
    fn district_for(&self, precinct_id: u32, hierarchy: &str) -> Option<District>;

    /// The preferred order of the district keys of a hierarchy. Without one,
    /// districts are reported in the order their precincts appear.
    fn district_order(&self, _hierarchy: &str) -> Option<Vec<String>> {
        None
    }
}

impl<R: DistrictResolver + ?Sized> DistrictResolver for &R {
    fn district_hierarchies(&self) -> Vec<String> {
        (**self).district_hierarchies()
    }

    fn district_for(&self, precinct_id: u32, hierarchy: &str) -> Option<District> {
        (**self).district_for(precinct_id, hierarchy)
    }

    fn district_order(&self, hierarchy: &str) -> Option<Vec<String>> {
        (**self).district_order(hierarchy)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct Hierarchy {
    name: String,
    districts: Vec<District>,
    // precinct id -> district key
    assignments: HashMap<u32, String>,
}

/// An in-memory precinct table.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PrecinctIndex {
    precincts: BTreeMap<u32, String>,
    hierarchies: Vec<Hierarchy>,
}

impl PrecinctIndex {
    pub fn new() -> PrecinctIndex {
        Default::default()
    }

    /// Declares a hierarchy. Hierarchies are reported in declaration order.
    pub fn add_hierarchy(&mut self, name: &str) {
        if self.hierarchy(name).is_none() {
            self.hierarchies.push(Hierarchy {
                name: name.to_string(),
                districts: Vec::new(),
                assignments: HashMap::new(),
            });
        }
    }

    /// Returns false if the precinct was already known.
    pub fn add_precinct(&mut self, precinct_id: u32, name: &str) -> bool {
        if self.precincts.contains_key(&precinct_id) {
            return false;
        }
        self.precincts.insert(precinct_id, name.to_string());
        true
    }

    pub fn assign(&mut self, precinct_id: u32, hierarchy: &str, district: District) {
        self.add_hierarchy(hierarchy);
        if let Some(h) = self.hierarchies.iter_mut().find(|h| h.name == hierarchy) {
            if !h.districts.iter().any(|d| d.key == district.key) {
                h.districts.push(district.clone());
            }
            h.assignments.insert(precinct_id, district.key);
        }
    }

    pub fn contains(&self, precinct_id: u32) -> bool {
        self.precincts.contains_key(&precinct_id)
    }

    pub fn precinct_name(&self, precinct_id: u32) -> Option<&str> {
        self.precincts.get(&precinct_id).map(|s| s.as_str())
    }

    pub fn precinct_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.precincts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.precincts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precincts.is_empty()
    }

    pub fn districts(&self, hierarchy: &str) -> &[District] {
        self.hierarchy(hierarchy)
            .map(|h| h.districts.as_slice())
            .unwrap_or(&[])
    }

    /// Numbered districts are put in numeric order, the others in the
    /// alphabetical order of their display names.
    pub fn sort_districts(&mut self) {
        for h in self.hierarchies.iter_mut() {
            h.districts
                .sort_by_key(|d| match d.key.parse::<u64>() {
                    Ok(n) => (0, n, String::new()),
                    Err(_) => (1, 0, d.name.clone()),
                });
        }
    }

    fn hierarchy(&self, name: &str) -> Option<&Hierarchy> {
        self.hierarchies.iter().find(|h| h.name == name)
    }
}

impl DistrictResolver for PrecinctIndex {
    fn district_hierarchies(&self) -> Vec<String> {
        self.hierarchies.iter().map(|h| h.name.clone()).collect()
    }

    fn district_for(&self, precinct_id: u32, hierarchy: &str) -> Option<District> {
        let h = self.hierarchy(hierarchy)?;
        let key = h.assignments.get(&precinct_id)?;
        h.districts.iter().find(|d| &d.key == key).cloned()
    }

    fn district_order(&self, hierarchy: &str) -> Option<Vec<String>> {
        self.hierarchy(hierarchy)
            .map(|h| h.districts.iter().map(|d| d.key.clone()).collect())
    }
}
