//! Plate and well location model.
//!
//! A [`Location`] identifies a physical position in freezer storage. The
//! spreadsheet exports carry locations in four colon-delimited shapes of
//! different arity; all four unify into one record with independently
//! optional fields:
//!
//! | segments | assigns |
//! |----------|---------|
//! | 3        | freezer, barcode, well |
//! | 5        | freezer, shelf, rack, section, well |
//! | 6        | freezer, shelf, rack, section, barcode, well |
//! | 7        | freezer, shelf, rack, section, subsection, barcode, well |
//!
//! Locations are immutable value objects, ordered component-wise over
//! `(freezer, shelf, rack, section, subsection, barcode, row, column)`.
//! An absent field sorts strictly before any present value of the same
//! field. Two locations on the same plate share every field except the
//! well.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{PlatelightError, Result};

/// Which input arity produced a [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationShape {
    /// 3 segments: a plate pulled from storage, addressed by barcode alone.
    Pulled,
    /// 5 segments: a racked plate with no barcode recorded.
    Unbarcoded,
    /// 6 segments: the standard fully-racked, barcoded plate.
    Standard,
    /// 7 segments: a barcoded plate inside a rack subsection.
    Subsectioned,
}

impl LocationShape {
    /// The number of colon-delimited segments this shape parses from.
    pub const fn segment_count(self) -> usize {
        match self {
            Self::Pulled => 3,
            Self::Unbarcoded => 5,
            Self::Standard => 6,
            Self::Subsectioned => 7,
        }
    }
}

/// A physical sample position: plate-level fields plus an optional well.
///
/// Equality, ordering, and hashing all go through the same key:
/// `(freezer, shelf, rack, section, subsection, barcode, row, column)`.
/// The shape tag records input arity and does not participate in the key.
#[derive(Debug, Clone)]
pub struct Location {
    pub shape: LocationShape,
    pub freezer: String,
    pub shelf: Option<String>,
    pub rack: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub barcode: Option<String>,
    pub well: Option<String>,
}

impl Location {
    /// Parse a colon-delimited location string.
    ///
    /// Strict on segment count (3, 5, 6, or 7), permissive on content: no
    /// further validation of the characters inside each segment.
    pub fn parse(text: &str) -> Result<Self> {
        let segments: Vec<&str> = text.split(':').collect();
        let own = |s: &&str| s.to_string();
        match segments.as_slice() {
            [freezer, barcode, well] => Ok(Self {
                shape: LocationShape::Pulled,
                freezer: own(freezer),
                shelf: None,
                rack: None,
                section: None,
                subsection: None,
                barcode: Some(own(barcode)),
                well: Some(own(well)),
            }),
            [freezer, shelf, rack, section, well] => Ok(Self {
                shape: LocationShape::Unbarcoded,
                freezer: own(freezer),
                shelf: Some(own(shelf)),
                rack: Some(own(rack)),
                section: Some(own(section)),
                subsection: None,
                barcode: None,
                well: Some(own(well)),
            }),
            [freezer, shelf, rack, section, barcode, well] => Ok(Self {
                shape: LocationShape::Standard,
                freezer: own(freezer),
                shelf: Some(own(shelf)),
                rack: Some(own(rack)),
                section: Some(own(section)),
                subsection: None,
                barcode: Some(own(barcode)),
                well: Some(own(well)),
            }),
            [freezer, shelf, rack, section, subsection, barcode, well] => Ok(Self {
                shape: LocationShape::Subsectioned,
                freezer: own(freezer),
                shelf: Some(own(shelf)),
                rack: Some(own(rack)),
                section: Some(own(section)),
                subsection: Some(own(subsection)),
                barcode: Some(own(barcode)),
                well: Some(own(well)),
            }),
            other => Err(PlatelightError::InvalidLocationFormat {
                location: text.to_string(),
                segment_count: other.len(),
            }),
        }
    }

    /// Row letter of the well, absent if there is no well or it is empty.
    pub fn row(&self) -> Option<char> {
        self.well.as_deref().and_then(well_row)
    }

    /// Column digits of the well, absent if there is no well.
    ///
    /// At most two characters after the row letter are taken, so a
    /// three-digit column like `"A032"` truncates to `"03"`.
    pub fn column(&self) -> Option<String> {
        self.well.as_deref().map(well_column)
    }

    /// Column as a 1-indexed number, absent if missing or non-numeric.
    pub fn column_number(&self) -> Option<u16> {
        self.column().and_then(|c| c.parse().ok())
    }

    /// True when both locations name the same physical plate.
    ///
    /// Compares every plate-level field; the well is excluded.
    pub fn same_plate(&self, other: &Self) -> bool {
        self.freezer == other.freezer
            && self.shelf == other.shelf
            && self.rack == other.rack
            && self.section == other.section
            && self.subsection == other.subsection
            && self.barcode == other.barcode
    }
}

/// First character of a well name, e.g. `'B'` for `"B04"`.
pub fn well_row(well: &str) -> Option<char> {
    well.chars().next()
}

/// Up to two characters after the row letter, e.g. `"04"` for `"B04"`.
pub fn well_column(well: &str) -> String {
    well.chars().skip(1).take(2).collect()
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        // Field-by-field; Option's derived ordering makes an absent field
        // sort strictly before any present value.
        self.freezer
            .cmp(&other.freezer)
            .then_with(|| self.shelf.cmp(&other.shelf))
            .then_with(|| self.rack.cmp(&other.rack))
            .then_with(|| self.section.cmp(&other.section))
            .then_with(|| self.subsection.cmp(&other.subsection))
            .then_with(|| self.barcode.cmp(&other.barcode))
            .then_with(|| self.row().cmp(&other.row()))
            .then_with(|| self.column().cmp(&other.column()))
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the ordering key, not the raw fields, so that wells that
        // differ only past the column truncation hash alike.
        self.freezer.hash(state);
        self.shelf.hash(state);
        self.rack.hash(state);
        self.section.hash(state);
        self.subsection.hash(state);
        self.barcode.hash(state);
        self.row().hash(state);
        self.column().hash(state);
    }
}

impl fmt::Display for Location {
    /// Canonical form: non-absent fields joined with `:` in field order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = vec![&self.freezer];
        for field in [
            &self.shelf,
            &self.rack,
            &self.section,
            &self.subsection,
            &self.barcode,
            &self.well,
        ] {
            if let Some(value) = field {
                parts.push(value);
            }
        }
        write!(f, "{}", parts.join(":"))
    }
}
