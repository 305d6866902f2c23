//! Integration tests for the census record parser

use census_parser::{
    assemble, parse_document, parse_stream, process_file, write_csv, write_csv_file,
    AssemblerConfig, Classification, ParseError, PageSource, Record, TextPageSource,
    NOT_AVAILABLE,
};
use std::fs;

// Lay out one row of the three-column report the way pdftotext -layout does
fn row(first: &str, second: &str, third: &str) -> String {
    format!("{:<44}{:<48}{}", first, second, third)
        .trim_end()
        .to_string()
}

// Row with an empty middle column, wide enough to read as columns 1 and 3
fn row_without_middle(first: &str, third: &str) -> String {
    format!("{:<90}{}", first, third)
}

fn report_text() -> String {
    let cover = ["CENSUS OF DOMESTIC VIOLENCE GUN HOMICIDES", "2013 edition"].join("\n");

    let first = [
        "DOMESTIC VIOLENCE HOMICIDES".to_string(),
        "Census 2013".to_string(),
        String::new(),
        "Arizona".to_string(),
        row(
            "PHOENIX, JAN 1, 2013 A man shot his",
            "Shooter DV History: No history found",
            "killed by her husband.",
        ),
        row(
            "wife. Shooter Suicide: Yes",
            "MESA, AZ, MAY 5, 2013 A woman was",
            "Shooter Suicide: No",
        ),
    ]
    .join("\n");

    let second = [
        format!("{}P A G E 21", " ".repeat(40)),
        row_without_middle(
            "TEMPE - FEB 2, 2012 A shooting at a city",
            "Shooter Suicide: Yes",
        ),
        row_without_middle("park.", "Order of Protection: Yes"),
    ]
    .join("\n");

    format!("{}\n\x0c{}\n\x0c{}\n\x0c", cover, first, second)
}

fn config() -> AssemblerConfig {
    AssemblerConfig::with_pages(1, 2)
}

// ============================================================================
// Page Source Tests
// ============================================================================

#[test]
fn test_text_source_page_count() {
    let source = TextPageSource::from_text(&report_text());
    assert_eq!(source.page_count(), 3);
    assert_eq!(source.page_lines(2).unwrap().len(), 3);
}

// ============================================================================
// Assembly Tests
// ============================================================================

#[test]
fn test_assembled_stream_reading_order() {
    let source = TextPageSource::from_text(&report_text());
    let pages: Vec<_> = (0..source.page_count())
        .map(|i| source.page_lines(i).unwrap())
        .collect();

    let stream = assemble(&pages, 1, 2).unwrap();
    assert_eq!(
        stream.as_str(),
        " DOMESTIC VIOLENCE HOMICIDES Census 2013 Arizona \
         PHOENIX, JAN 1, 2013 A man shot his wife. Shooter Suicide: Yes \
         Shooter DV History: No history found MESA, AZ, MAY 5, 2013 A woman was \
         killed by her husband. Shooter Suicide: No \
         TEMPE - FEB 2, 2012 A shooting at a city park. Shooter Suicide: Yes \
         Order of Protection: Yes"
    );
}

// ============================================================================
// End-to-end Tests
// ============================================================================

#[test]
fn test_parse_document_records() {
    let source = TextPageSource::from_text(&report_text());
    let result = parse_document(&source, &config()).unwrap();
    assert_eq!(result.pages_processed, 2);

    let records = &result.records;
    assert_eq!(records.len(), 4);

    // Title material before the first header
    assert!(!records[0].has_header());
    assert_eq!(
        records[0].text,
        " DOMESTIC VIOLENCE HOMICIDES Census 2013 Arizona"
    );

    let phoenix = &records[1];
    assert_eq!(phoenix.location.as_deref(), Some("PHOENIX"));
    assert_eq!(phoenix.date.as_deref(), Some("JAN 1, 2013"));
    assert_eq!(phoenix.text, "A man shot his wife.");
    assert_eq!(phoenix.shooter_suicide.as_deref(), Some("Yes"));
    assert_eq!(phoenix.dv_history.as_deref(), Some("No history found"));
    assert_eq!(phoenix.prior_convict.as_deref(), Some(NOT_AVAILABLE));

    let mesa = &records[2];
    assert_eq!(mesa.location.as_deref(), Some("MESA"));
    assert_eq!(mesa.date.as_deref(), Some("MAY 5, 2013"));
    assert_eq!(mesa.text, "A woman was killed by her husband.");
    assert_eq!(mesa.shooter_suicide.as_deref(), Some("No"));

    let tempe = &records[3];
    assert_eq!(tempe.location.as_deref(), Some("TEMPE"));
    assert_eq!(tempe.date.as_deref(), Some("FEB 2, 2012"));
    assert_eq!(tempe.text, "A shooting at a city park.");
    assert_eq!(
        tempe.classification(Classification::OrderOfProtection),
        Some("Yes")
    );
    assert_eq!(
        tempe.classification(Classification::FederalProhibition),
        Some(NOT_AVAILABLE)
    );
}

#[test]
fn test_parse_stream_round_trip() {
    let records = parse_stream(
        "PHOENIX, JAN 1, 2013 A man shot his wife. Shooter Suicide: Yes \
         Shooter DV History: No history found",
    );
    assert_eq!(records.len(), 1);
    let expected = Record {
        location: Some("PHOENIX".into()),
        date: Some("JAN 1, 2013".into()),
        text: "A man shot his wife.".into(),
        shooter_suicide: Some("Yes".into()),
        dv_history: Some("No history found".into()),
        prior_convict: Some("N/A".into()),
        order_of_protect: Some("N/A".into()),
        require_turn_in_firearm: Some("N/A".into()),
        fed_prohib: Some("N/A".into()),
    };
    assert_eq!(records[0], expected);
}

#[test]
fn test_parse_stream_without_headers() {
    let records = parse_stream("no headers here");
    assert_eq!(records, vec![Record::text_only("no headers here")]);
}

#[test]
fn test_process_text_file_and_export_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.txt");
    let output = dir.path().join("records.csv");
    fs::write(&input, report_text()).unwrap();

    let result = process_file(&input, &config(), true).unwrap();
    write_csv_file(&result.records, &output).unwrap();

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        "Location,Date,Text,shooter_suicide,dv_history,prior_convict,\
         order_of_protect,require_turn_in_firearm,fed_prohib"
    );
    assert_eq!(
        lines[2],
        "PHOENIX,\"JAN 1, 2013\",A man shot his wife.,Yes,No history found,N/A,N/A,N/A,N/A"
    );
    assert_eq!(
        lines[4],
        "TEMPE,\"FEB 2, 2012\",A shooting at a city park.,Yes,N/A,N/A,Yes,N/A,N/A"
    );
}

#[test]
fn test_csv_to_writer() {
    let mut out = Vec::new();
    write_csv(&[Record::text_only("x")], &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    assert!(csv.ends_with(",,x,,,,,,\n"));
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_page_range_past_end() {
    let source = TextPageSource::from_text(&report_text());
    let err = parse_document(&source, &AssemblerConfig::with_pages(1, 3)).unwrap_err();
    assert!(matches!(
        err,
        ParseError::PageOutOfRange {
            page: 3,
            page_count: 3
        }
    ));
}

#[test]
fn test_reversed_page_range() {
    let source = TextPageSource::from_text(&report_text());
    let err = parse_document(&source, &AssemblerConfig::with_pages(2, 1)).unwrap_err();
    assert!(matches!(err, ParseError::InvalidPageRange { start: 2, end: 1 }));
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = process_file(dir.path().join("missing.txt"), &config(), true).unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
}

#[test]
fn test_invalid_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.pdf");
    fs::write(&input, b"not a pdf").unwrap();
    let err = process_file(&input, &config(), false).unwrap_err();
    assert!(matches!(err, ParseError::Pdf(_) | ParseError::Io(_)));
}
