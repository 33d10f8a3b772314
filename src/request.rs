//! Compound request records and the sorted request store.
//!
//! One CSV row describes one sample to retrieve:
//!
//! ```text
//! request_id,available,barcode,state,volume,concentration,weight,solvation,location
//! ```
//!
//! The `barcode` column is the sample barcode, distinct from the plate
//! barcode inside the location. The literal token `"null"` in the
//! solvation column means absent. Reading the raw lines (and skipping the
//! header) is the caller's job; this module only parses and sorts.

use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::error::{PlatelightError, Result};
use crate::location::Location;

/// One sample-retrieval record. Immutable after construction.
#[derive(Debug, Clone)]
pub struct CompoundRequest {
    pub request_id: String,
    pub available: String,
    /// Sample barcode, distinct from [`Location::barcode`].
    pub barcode: String,
    pub state: String,
    pub volume: f64,
    pub concentration: f64,
    pub weight: f64,
    pub solvation: Option<String>,
    pub location: Location,
}

impl CompoundRequest {
    /// Parse one comma-delimited CSV row into a request.
    ///
    /// The row must carry exactly 9 fields; volume, concentration, and
    /// weight must parse as floating point; the 9th field must be a valid
    /// location string.
    pub fn parse_row(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 9 {
            return Err(PlatelightError::malformed_row(line, fields.len()));
        }

        let number = |idx: usize, field: &'static str| -> Result<f64> {
            fields[idx]
                .trim()
                .parse()
                .map_err(|_| PlatelightError::numeric_parse(line, field))
        };

        Ok(Self {
            request_id: fields[0].to_string(),
            available: fields[1].to_string(),
            barcode: fields[2].to_string(),
            state: fields[3].to_string(),
            volume: number(4, "volume")?,
            concentration: number(5, "concentration")?,
            weight: number(6, "weight")?,
            solvation: match fields[7] {
                "null" => None,
                other => Some(other.to_string()),
            },
            location: Location::parse(fields[8])?,
        })
    }
}

// Requests key external UI row handles, so equality and hashing cover the
// full field tuple. Floats compare and hash by bit pattern.
impl PartialEq for CompoundRequest {
    fn eq(&self, other: &Self) -> bool {
        self.request_id == other.request_id
            && self.available == other.available
            && self.barcode == other.barcode
            && self.state == other.state
            && self.volume.to_bits() == other.volume.to_bits()
            && self.concentration.to_bits() == other.concentration.to_bits()
            && self.weight.to_bits() == other.weight.to_bits()
            && self.solvation == other.solvation
            && self.location == other.location
    }
}

impl Eq for CompoundRequest {}

impl Hash for CompoundRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.request_id.hash(state);
        self.available.hash(state);
        self.barcode.hash(state);
        self.state.hash(state);
        self.volume.to_bits().hash(state);
        self.concentration.to_bits().hash(state);
        self.weight.to_bits().hash(state);
        self.solvation.hash(state);
        self.location.hash(state);
    }
}

/// An ordered sequence of requests, sorted ascending by location key.
///
/// The sort is stable: requests sharing a location key keep their input
/// order.
#[derive(Debug, Clone, Default)]
pub struct RequestStore {
    requests: Vec<CompoundRequest>,
}

impl RequestStore {
    /// Parse raw CSV lines (header already skipped) into a sorted store.
    ///
    /// Any format error aborts the whole load; the offending line is
    /// logged before the error propagates. Lines that are entirely empty
    /// are skipped, matching line-iterator behavior at end of file.
    pub fn load<I, S>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut requests = Vec::new();
        for row in rows {
            let line = row.as_ref().trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            match CompoundRequest::parse_row(line) {
                Ok(request) => requests.push(request),
                Err(err) => {
                    tracing::error!(line, "request row rejected: {err}");
                    return Err(err);
                }
            }
        }
        debug!(count = requests.len(), "request rows loaded");
        Ok(Self::from_requests(requests))
    }

    /// Build a store from already-parsed requests, sorting them.
    pub fn from_requests(mut requests: Vec<CompoundRequest>) -> Self {
        requests.sort_by(|a, b| a.location.cmp(&b.location));
        Self { requests }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CompoundRequest> {
        self.requests.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompoundRequest> {
        self.requests.iter()
    }

    pub fn as_slice(&self) -> &[CompoundRequest] {
        &self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "RQ1,yes,SC0001,solid,10.5,2.0,0.25,null,CMG_pulled:MT999957:B04";

    #[test]
    fn test_parse_row_fields() {
        let req = CompoundRequest::parse_row(ROW).unwrap();
        assert_eq!(req.request_id, "RQ1");
        assert_eq!(req.available, "yes");
        assert_eq!(req.barcode, "SC0001");
        assert_eq!(req.state, "solid");
        assert_eq!(req.volume, 10.5);
        assert_eq!(req.concentration, 2.0);
        assert_eq!(req.weight, 0.25);
        assert_eq!(req.solvation, None);
        assert_eq!(req.location.barcode.as_deref(), Some("MT999957"));
    }

    #[test]
    fn test_solvation_sentinel() {
        let row = "RQ1,yes,SC0001,solid,1,1,1,DMSO,CMG_pulled:MT999957:B04";
        let req = CompoundRequest::parse_row(row).unwrap();
        assert_eq!(req.solvation.as_deref(), Some("DMSO"));
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let err = CompoundRequest::parse_row("a,b,c").unwrap_err();
        match err {
            PlatelightError::MalformedRow { field_count, .. } => assert_eq!(field_count, 3),
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_numeric_field_rejected() {
        let row = "RQ1,yes,SC0001,solid,ten,2.0,0.25,null,CMG_pulled:MT999957:B04";
        let err = CompoundRequest::parse_row(row).unwrap_err();
        match err {
            PlatelightError::NumericParse { field, .. } => assert_eq!(field, "volume"),
            other => panic!("expected NumericParse, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_location_propagates() {
        let row = "RQ1,yes,SC0001,solid,1,1,1,null,a:b";
        let err = CompoundRequest::parse_row(row).unwrap_err();
        assert!(matches!(err, PlatelightError::InvalidLocationFormat { .. }));
    }

    #[test]
    fn test_request_equality_and_hash_over_full_tuple() {
        use std::collections::HashMap;

        let a = CompoundRequest::parse_row(ROW).unwrap();
        let b = CompoundRequest::parse_row(ROW).unwrap();
        assert_eq!(a, b);

        let mut handles = HashMap::new();
        handles.insert(a, "row-1");
        assert_eq!(handles.get(&b), Some(&"row-1"));
    }

    #[test]
    fn test_load_sorts_by_location_key() {
        let rows = [
            "RQ1,y,S1,solid,1,1,1,null,F18:S5:R1:E:MT2:A01",
            "RQ2,y,S2,solid,1,1,1,null,F18:S5:R1:E:MT1:B01",
            "RQ3,y,S3,solid,1,1,1,null,F18:S5:R1:E:MT1:A01",
        ];
        let store = RequestStore::load(rows).unwrap();
        let ids: Vec<&str> = store.iter().map(|r| r.request_id.as_str()).collect();
        assert_eq!(ids, ["RQ3", "RQ2", "RQ1"]);
    }

    #[test]
    fn test_load_is_stable_for_equal_keys() {
        let rows = [
            "RQ1,y,S1,solid,1,1,1,null,F18:S5:R1:E:MT1:A01",
            "RQ2,y,S2,solid,1,1,1,null,F18:S5:R1:E:MT1:A01",
            "RQ3,y,S3,solid,1,1,1,null,F18:S5:R1:E:MT1:A01",
        ];
        let store = RequestStore::load(rows).unwrap();
        let ids: Vec<&str> = store.iter().map(|r| r.request_id.as_str()).collect();
        assert_eq!(ids, ["RQ1", "RQ2", "RQ3"]);
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let rows = [ROW, "", "  "];
        let store = RequestStore::load(rows).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_aborts_on_first_bad_row() {
        let rows = [ROW, "not,enough,fields"];
        assert!(RequestStore::load(rows).is_err());
    }
}
