use csvfmt::{DuplicateHeaderMode, Format, Parser, Printer, QuotePolicy};

fn parse_all(input: &str, format: Format) -> Vec<Vec<String>> {
    Parser::from_str(input, format)
        .unwrap()
        .map(|r| r.unwrap().values().to_vec())
        .collect()
}

#[test]
fn scenario_one_basic_records() {
    let records = parse_all("a,b,c\n1,2,3\n", Format::default_format());
    assert_eq!(records, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
}

#[test]
fn scenario_two_quoted_field_with_embedded_delimiter() {
    let records = parse_all("a,\"b,c\",d\n", Format::default_format());
    assert_eq!(records, vec![vec!["a", "b,c", "d"]]);
}

#[test]
fn scenario_three_doubled_quote_is_literal_quote() {
    let records = parse_all("a,\"he said \"\"hi\"\"\",b\n", Format::default_format());
    assert_eq!(records, vec![vec!["a", "he said \"hi\"", "b"]]);
}

#[test]
fn scenario_four_comments_attach_to_following_record() {
    let format = Format::builder()
        .comment_marker(Some('#'))
        .ignore_empty_lines(true)
        .build()
        .unwrap();
    let mut parser = Parser::from_str("# hello\n\na,b\n# mid\n1,2\n", format).unwrap();
    let r1 = parser.next_record().unwrap().unwrap();
    assert_eq!(r1.values(), &["a", "b"]);
    assert_eq!(r1.comment(), Some("hello"));
    let r2 = parser.next_record().unwrap().unwrap();
    assert_eq!(r2.values(), &["1", "2"]);
    assert_eq!(r2.comment(), Some("mid"));
    assert!(parser.next_record().unwrap().is_none());
}

#[test]
fn scenario_six_tdf_trailing_data_without_terminator() {
    let records = parse_all("one\ttwo\t\tfour \t five\t six", Format::tdf());
    assert_eq!(
        records,
        vec![vec!["one", "two", "", "four", "five", "six"]]
    );
}

#[test]
fn scenario_seven_escape_literalizes_cr_without_ending_record() {
    let format = Format::builder()
        .escape(Some('\\'))
        .ignore_empty_lines(false)
        .build()
        .unwrap();
    let records = parse_all("character\\\rEscaped", format);
    assert_eq!(records, vec![vec!["character\rEscaped"]]);
}

#[test]
fn round_trip_holds_for_every_standard_preset() {
    let rows = vec![
        vec!["alice".to_string(), "30".to_string()],
        vec!["has, comma".to_string(), "has \"quote\"\nand newline".to_string()],
        vec!["".to_string(), "trailing empty".to_string()],
    ];
    for format in [
        Format::default_format(),
        Format::rfc4180(),
        Format::excel(),
        Format::tdf(),
    ] {
        let mut printer = Printer::new(Vec::new(), format.clone());
        for row in &rows {
            printer.print_record(row).unwrap();
        }
        let text = printer.into_string().unwrap();
        let parsed = parse_all(&text, format.clone());
        assert_eq!(parsed, rows, "round-trip failed for {:?}", format);
    }
}

#[test]
fn idempotent_format_copy() {
    for format in [
        Format::default_format(),
        Format::rfc4180(),
        Format::excel(),
        Format::tdf(),
        Format::mysql(),
    ] {
        let copy = csvfmt::FormatBuilder::from_format(&format).build().unwrap();
        assert_eq!(format, copy);
    }
}

#[test]
fn record_number_is_strictly_increasing_and_one_based() {
    let parser = Parser::from_str("1\n2\n3\n4\n", Format::default_format()).unwrap();
    let numbers: Vec<u64> = parser.map(|r| r.unwrap().record_number()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[test]
fn header_row_does_not_count_toward_record_number() {
    let format = Format::builder()
        .header::<String>(Some(Vec::new()))
        .build()
        .unwrap();
    let parser = Parser::from_str("name,age\nalice,30\nbob,40\n", format).unwrap();
    let numbers: Vec<u64> = parser.map(|r| r.unwrap().record_number()).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn minimal_quote_policy_quotes_iff_special_char_present() {
    let format = Format::default_format();
    let mut printer = Printer::new(Vec::new(), format);
    printer
        .print_record(&["plain", "has,comma", "has\"quote", "has\nnewline"])
        .unwrap();
    let text = printer.into_string().unwrap();
    assert_eq!(
        text,
        "plain,\"has,comma\",\"has\"\"quote\",\"has\nnewline\"\r\n"
    );
}

#[test]
fn duplicate_header_policy_matrix() {
    // (mode, allow_missing, header, expect_ok)
    let cases: Vec<(DuplicateHeaderMode, bool, Vec<&str>, bool)> = vec![
        (DuplicateHeaderMode::Disallow, false, vec!["a", "b"], true),
        (DuplicateHeaderMode::Disallow, false, vec!["a", "a"], false),
        (DuplicateHeaderMode::AllowEmpty, false, vec!["a", ""], false),
        (DuplicateHeaderMode::AllowEmpty, true, vec!["a", ""], true),
        (DuplicateHeaderMode::AllowEmpty, true, vec!["", ""], true),
        (DuplicateHeaderMode::AllowEmpty, true, vec!["a", "a"], false),
        (DuplicateHeaderMode::AllowAll, false, vec!["a", "a"], true),
    ];
    for (mode, allow_missing, header, expect_ok) in cases {
        let format = Format::builder()
            .header(Some(header.clone()))
            .duplicate_header_mode(mode)
            .allow_missing_column_names(allow_missing)
            .build()
            .unwrap();
        let result = Parser::from_str("1,2\n", format);
        assert_eq!(
            result.is_ok(),
            expect_ok,
            "mode={:?} allow_missing={} header={:?}",
            mode,
            allow_missing,
            header
        );
    }
}

#[test]
fn line_number_is_non_decreasing_across_a_multi_record_parse() {
    let format = Format::builder()
        .quote(Some('"'))
        .ignore_empty_lines(false)
        .build()
        .unwrap();
    // A quoted field spanning two physical lines, followed by a plain record.
    let input = "\"line\none\",b\nc,d\n";
    let mut parser = Parser::from_str(input, format).unwrap();
    let r1 = parser.next_record().unwrap().unwrap();
    assert_eq!(r1.values(), &["line\none", "b"]);
    let r2 = parser.next_record().unwrap().unwrap();
    assert_eq!(r2.values(), &["c", "d"]);
    assert!(r2.character_position() > r1.character_position());
}

#[test]
fn trailing_delimiter_open_question_is_pinned_both_ways() {
    let default_on = parse_all("a,b,\n", Format::default_format());
    assert_eq!(default_on, vec![vec!["a", "b", ""]]);

    let off_format = Format::builder()
        .trailing_delimiter_emits_empty(false)
        .build()
        .unwrap();
    let off = parse_all("a,b,\n", off_format);
    assert_eq!(off, vec![vec!["a", "b"]]);
}

#[test]
fn unrecognized_escape_passes_through_literally() {
    let format = Format::builder()
        .escape(Some('\\'))
        .ignore_empty_lines(false)
        .build()
        .unwrap();
    let records = parse_all("\\a", format);
    assert_eq!(records, vec![vec!["\\a"]]);
}

#[test]
fn mysql_preset_round_trips_with_escape_fallback() {
    let format = Format::mysql();
    let rows = vec![vec!["tab\there".to_string(), "plain".to_string()]];
    let mut printer = Printer::new(Vec::new(), format.clone());
    for row in &rows {
        printer.print_record(row).unwrap();
    }
    let text = printer.into_string().unwrap();
    let parsed = parse_all(&text, format);
    assert_eq!(parsed, rows);
}

#[test]
fn null_sentinel_round_trips_through_mysql_preset() {
    let format = Format::mysql();
    let mut printer = Printer::new(Vec::new(), format.clone());
    printer.print_record(&["\\N", "value"]).unwrap();
    let text = printer.into_string().unwrap();
    let mut parser = Parser::from_str(&text, format).unwrap();
    let record = parser.next_record().unwrap().unwrap();
    assert_eq!(record.get(0).unwrap(), None);
    assert_eq!(record.get(1).unwrap(), Some("value"));
}

#[test]
fn lex_error_terminates_the_parser() {
    let mut parser = Parser::from_str("\"unterminated", Format::default_format()).unwrap();
    assert!(parser.next_record().is_err());
    assert!(parser.next_record().unwrap().is_none());
}
