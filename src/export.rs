//! Binary well-map export (`.syrup`).
//!
//! Each exported record is 4 bytes: a 3-byte big-endian integer taken
//! from the plate barcode with its fixed 2-character prefix stripped,
//! then a 1-byte linear well offset, `columns_per_plate * row0 + column0`.
//! Only requests whose location carries both a plate barcode and a well
//! are exported, sorted ascending by `(barcode, well)`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{PlatelightError, Result};
use crate::location::{well_column, well_row};
use crate::request::CompoundRequest;

/// Serialize the well map for `requests` into `out`.
pub fn write_syrup<W: Write>(
    requests: &[CompoundRequest],
    columns_per_plate: u8,
    out: &mut W,
) -> Result<usize> {
    let mut exportable: Vec<(&str, &str)> = requests
        .iter()
        .filter_map(|request| {
            match (
                request.location.barcode.as_deref(),
                request.location.well.as_deref(),
            ) {
                (Some(barcode), Some(well)) => Some((barcode, well)),
                _ => None,
            }
        })
        .collect();
    exportable.sort();

    for (barcode, well) in &exportable {
        let record = encode_record(barcode, well, columns_per_plate)?;
        out.write_all(&record)?;
    }
    debug!(
        records = exportable.len(),
        skipped = requests.len() - exportable.len(),
        "well map serialized"
    );
    Ok(exportable.len())
}

/// Write the well map to a file path.
pub fn export_file(
    requests: &[CompoundRequest],
    columns_per_plate: u8,
    path: &Path,
) -> Result<usize> {
    let mut file = File::create(path)?;
    write_syrup(requests, columns_per_plate, &mut file)
}

fn encode_record(barcode: &str, well: &str, columns_per_plate: u8) -> Result<[u8; 4]> {
    let digits = barcode
        .get(2..)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| PlatelightError::export_format(barcode, "barcode has no numeric suffix"))?;
    let number: u32 = digits.parse().map_err(|_| {
        PlatelightError::export_format(barcode, format!("barcode suffix '{digits}' is not numeric"))
    })?;
    if number > 0x00FF_FFFF {
        return Err(PlatelightError::export_format(
            barcode,
            format!("barcode number {number} does not fit in 3 bytes"),
        ));
    }

    let row = well_row(well)
        .ok_or_else(|| PlatelightError::export_format(barcode, "well has no row letter"))?;
    let row0 = (row.to_ascii_lowercase() as u8).wrapping_sub(b'a');
    let column: u16 = well_column(well).parse().map_err(|_| {
        PlatelightError::export_format(barcode, format!("well '{well}' has no numeric column"))
    })?;
    if column == 0 {
        return Err(PlatelightError::export_format(
            barcode,
            format!("well '{well}' column must be 1-indexed"),
        ));
    }
    let offset = u16::from(columns_per_plate) * u16::from(row0) + (column - 1);
    let offset: u8 = offset.try_into().map_err(|_| {
        PlatelightError::export_format(
            barcode,
            format!("well '{well}' offset {offset} does not fit in 1 byte"),
        )
    })?;

    let [_, hi, mid, lo] = number.to_be_bytes();
    Ok([hi, mid, lo, offset])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestStore;

    fn requests(rows: &[&str]) -> Vec<CompoundRequest> {
        RequestStore::load(rows.iter().copied())
            .unwrap()
            .as_slice()
            .to_vec()
    }

    #[test]
    fn test_record_layout() {
        // MT999957 -> 999957 = 0x0F41F5; B04 -> 12 * 1 + 3 = 15.
        let record = encode_record("MT999957", "B04", 12).unwrap();
        assert_eq!(record, [0x0F, 0x41, 0xF5, 15]);
    }

    #[test]
    fn test_first_well_offset_is_zero() {
        let record = encode_record("MT000001", "A01", 12).unwrap();
        assert_eq!(record, [0x00, 0x00, 0x01, 0]);
    }

    #[test]
    fn test_sorted_by_barcode_then_well() {
        let reqs = requests(&[
            "R1,y,S1,solid,1,1,1,null,F1:MT000002:A01",
            "R2,y,S2,solid,1,1,1,null,F1:MT000001:B01",
            "R3,y,S3,solid,1,1,1,null,F1:MT000001:A01",
        ]);
        let mut buffer = Vec::new();
        let written = write_syrup(&reqs, 12, &mut buffer).unwrap();
        assert_eq!(written, 3);
        assert_eq!(
            buffer,
            vec![
                0x00, 0x00, 0x01, 0,  // MT000001 A01
                0x00, 0x00, 0x01, 12, // MT000001 B01
                0x00, 0x00, 0x02, 0,  // MT000002 A01
            ]
        );
    }

    #[test]
    fn test_skips_requests_without_barcode() {
        // 5-segment locations carry no plate barcode.
        let reqs = requests(&[
            "R1,y,S1,solid,1,1,1,null,F1:S1:R1:A:A01",
            "R2,y,S2,solid,1,1,1,null,F1:MT000001:A01",
        ]);
        let mut buffer = Vec::new();
        assert_eq!(write_syrup(&reqs, 12, &mut buffer).unwrap(), 1);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_non_numeric_suffix_fails() {
        let err = encode_record("MTXXXX", "A01", 12).unwrap_err();
        assert!(matches!(err, PlatelightError::ExportFormat { .. }));
    }

    #[test]
    fn test_oversized_barcode_number_fails() {
        let err = encode_record("MT16777216", "A01", 12).unwrap_err();
        assert!(matches!(err, PlatelightError::ExportFormat { .. }));
    }

    #[test]
    fn test_bad_well_column_fails() {
        let err = encode_record("MT000001", "A", 12).unwrap_err();
        assert!(matches!(err, PlatelightError::ExportFormat { .. }));
    }

    #[test]
    fn test_export_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wells.syrup");
        let reqs = requests(&["R1,y,S1,solid,1,1,1,null,F1:MT999957:B04"]);
        assert_eq!(export_file(&reqs, 12, &path).unwrap(), 1);
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, vec![0x0F, 0x41, 0xF5, 15]);
    }
}
