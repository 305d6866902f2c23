//! CSV export of parsed records

use crate::record::Record;
use crate::ParseError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write records as CSV with a single header row
///
/// Absent fields become empty cells. The header row is written even when
/// there are no records.
pub fn write_csv<W: Write>(records: &[Record], writer: W) -> Result<(), ParseError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(Record::HEADERS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;

    log::info!("wrote {} records", records.len());
    Ok(())
}

/// Write records to a CSV file, replacing any existing file
pub fn write_csv_file<P: AsRef<Path>>(records: &[Record], path: P) -> Result<(), ParseError> {
    let file = File::create(path.as_ref())?;
    write_csv(records, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::extract_record;

    fn to_csv(records: &[Record]) -> String {
        let mut out = Vec::new();
        write_csv(records, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_only() {
        assert_eq!(
            to_csv(&[]),
            "Location,Date,Text,shooter_suicide,dv_history,prior_convict,\
             order_of_protect,require_turn_in_firearm,fed_prohib\n"
        );
    }

    #[test]
    fn test_absent_fields_are_empty_cells() {
        let csv = to_csv(&[Record::text_only("leading text")]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, ",,leading text,,,,,,");
    }

    #[test]
    fn test_full_row_quoting() {
        let record = extract_record(
            "PHOENIX, JAN 1, 2013 A man shot his wife. Shooter Suicide: Yes \
             Shooter DV History: No history found",
        );
        let csv = to_csv(&[record]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "PHOENIX,\"JAN 1, 2013\",A man shot his wife.,Yes,No history found,N/A,N/A,N/A,N/A"
        );
    }
}
