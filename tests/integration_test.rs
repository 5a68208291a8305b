//! Integration tests for civicstream

use civicstream::config::{Config, Sources};
use civicstream::csv::CsvParser;
use civicstream::csv_reader::CsvReader;
use civicstream::loader::VaccinationLoader;
use civicstream::menu::Menu;
use civicstream::{
    AccessLog, CivicError, DataProcessor, FormatErrorKind, MemoryAccessLog, PropertyMetric,
    VaccinationKind,
};
use chrono::NaiveDate;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::{Builder, NamedTempFile, TempDir};

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn read_all(path: &std::path::Path) -> Result<Vec<Vec<String>>, CivicError> {
    let mut parser = CsvParser::open(path)?;
    let mut rows = Vec::new();
    while let Some(row) = parser.read_row()? {
        rows.push(row);
    }
    Ok(rows)
}

#[test]
fn test_tokenize_file_from_disk() {
    let mut temp = NamedTempFile::new().unwrap();
    temp.write_all(b"zip_code,population\n19104,50000\n19107,30000")
        .unwrap();

    let rows = read_all(temp.path()).unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["zip_code", "population"],
            vec!["19104", "50000"],
            vec!["19107", "30000"],
        ]
    );
}

#[test]
fn test_crlf_and_lf_files_match() {
    let dir = TempDir::new().unwrap();
    let body = "id,note\n1,\"multi\nline\"\n2,\"say \"\"hi\"\"\"\n3,plain\n";
    let lf = write_file(&dir, "lf.csv", body);
    let crlf = write_file(&dir, "crlf.csv", &body.replace('\n', "\r\n"));

    let lf_rows = read_all(&lf).unwrap();
    let crlf_rows = read_all(&crlf).unwrap();
    assert_eq!(lf_rows.len(), 4);
    assert_eq!(lf_rows[1], vec!["1", "multi\nline"]);
    assert_eq!(crlf_rows[1], vec!["1", "multi\r\nline"]);

    // Row structure is identical; only embedded terminators differ
    let shape = |rows: &Vec<Vec<String>>| rows.iter().map(Vec::len).collect::<Vec<_>>();
    assert_eq!(shape(&lf_rows), shape(&crlf_rows));
    assert_eq!(lf_rows[2], crlf_rows[2]);
    assert_eq!(lf_rows[3], crlf_rows[3]);
}

#[test]
fn test_malformed_files_fail_with_format_errors() {
    let dir = TempDir::new().unwrap();

    let quote = write_file(&dir, "quote.csv", "a,b\"c,d\n");
    let err = read_all(&quote).unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::UnexpectedQuote));

    let open = write_file(&dir, "open.csv", "ok\n\"unterminated");
    let err = read_all(&open).unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::EofInQuotedField));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = CsvReader::open("this/path/does/not/exist.csv").err().unwrap();
    assert!(matches!(err, CivicError::Io { .. }));
    assert!(!err.is_format_error());
}

#[test]
fn test_large_file_streaming() {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("zip_code,population\n");
    for i in 0..10_000 {
        content.push_str(&format!("{:05},{}\r\n", i, i * 2));
    }
    let path = write_file(&dir, "big.csv", &content);

    let mut reader = CsvReader::open(&path).unwrap().has_header(true);
    let mut last = None;
    for row in reader.rows() {
        last = Some(row.unwrap());
    }
    assert_eq!(reader.row_count(), 10_000);
    assert_eq!(last, Some(vec!["09999".to_string(), "19998".to_string()]));
}

fn fixtures(dir: &TempDir) -> Config {
    let population = write_file(
        dir,
        "population.csv",
        "\"zip_code\",\"population\"\n19104,50000\n19107,30000\nbad,1\n",
    );
    let properties = write_file(
        dir,
        "properties.csv",
        "market_value,building_description,total_livable_area,zip_code\n\
         200000,\"ROW 2 STY, MASONRY\",1000,19104\n\
         400000,\"Corner \"\"unit\"\"\nwith note\",3000,19104-1111\n\
         ,VACANT,500,19107\n\
         90000,HOUSE,900,19107\n",
    );
    let covid = write_file(
        dir,
        "covid.json",
        r#"[{"zip_code": "19104", "etl_timestamp": "2021-03-25 09:15:00",
             "partially_vaccinated": 5000, "fully_vaccinated": 2500},
            {"zip_code": "19107", "etl_timestamp": "2021-03-25 09:15:00",
             "partially_vaccinated": "300", "fully_vaccinated": ""}]"#,
    );

    Config {
        population: Some(population),
        properties: Some(properties),
        covid: Some(covid),
        log: None,
    }
}

#[test]
fn test_load_and_query_all_datasets() {
    let dir = TempDir::new().unwrap();
    let config = fixtures(&dir);
    config.validate().unwrap();

    let log = Arc::new(MemoryAccessLog::new());
    let mut processor = DataProcessor::load(&config, log.clone()).unwrap();

    assert_eq!(processor.total_population(), 80000);
    assert_eq!(processor.average("19104", PropertyMetric::MarketValue), 300000);
    assert_eq!(processor.average("19104", PropertyMetric::LivableArea), 2000);
    assert_eq!(processor.average("19107", PropertyMetric::MarketValue), 90000);
    assert_eq!(processor.market_value_per_capita("19104"), 12);
    assert_eq!(processor.market_value_per_sq_ft("19104"), 150);
    assert_eq!(processor.market_value_per_sq_ft("19107"), 100);

    let date = NaiveDate::from_ymd_opt(2021, 3, 25).unwrap();
    let partial = processor.vaccinations_per_capita(VaccinationKind::Partial, date);
    assert_eq!(partial.get("19104"), Some(&0.1));
    assert_eq!(partial.get("19107"), Some(&0.01));
    let full = processor.vaccinations_per_capita(VaccinationKind::Full, date);
    assert_eq!(full.len(), 1);

    // One entry per opened file
    let mut logged = log.entries();
    logged.sort();
    let mut expected: Vec<String> = config
        .data_files()
        .map(|p| p.display().to_string())
        .collect();
    expected.sort();
    assert_eq!(logged, expected);
}

#[test]
fn test_format_error_aborts_load() {
    let dir = TempDir::new().unwrap();
    let population = write_file(&dir, "pop.csv", "zip_code,population\n19104,\"50000\n");
    let config = Config {
        population: Some(population),
        ..Config::default()
    };

    let log: Arc<dyn AccessLog> = Arc::new(MemoryAccessLog::new());
    let result = DataProcessor::load(&config, log);
    assert!(matches!(result, Err(e) if e.is_format_error()));
}

#[test]
fn test_menu_session_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = fixtures(&dir);
    let log = Arc::new(MemoryAccessLog::new());
    let processor = DataProcessor::load(&config, log.clone()).unwrap();

    let input = "1\n3\nfull\n2021-03-25\n6\n19107\n0\n";
    let mut output = Vec::new();
    Menu::new(
        processor,
        config.sources(),
        log.clone(),
        Cursor::new(input),
        &mut output,
    )
    .run()
    .unwrap();

    let out = String::from_utf8(output).unwrap();
    assert!(out.contains("BEGIN OUTPUT\n0\n1\n2\n3\n4\n5\n6\n7\nEND OUTPUT\n"));
    assert!(out.contains("BEGIN OUTPUT\n19104 0.0500\nEND OUTPUT\n"));
    assert!(out.contains("BEGIN OUTPUT\n3\nEND OUTPUT\n"));

    // Three file opens, then every typed line
    let entries = log.entries();
    assert_eq!(entries.len(), 3 + 7);
    assert_eq!(&entries[3..], &["1", "3", "full", "2021-03-25", "6", "19107", "0"]);
}

#[test]
fn test_vaccination_csv_with_bom() {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(
        "\u{FEFF}zip_code,etl_timestamp,partially_vaccinated,fully_vaccinated\n\
         19104,2021-03-25 09:15:00,10,5\n"
            .as_bytes(),
    )
    .unwrap();

    let log: Arc<dyn AccessLog> = Arc::new(MemoryAccessLog::new());
    let records = VaccinationLoader::new(file.path(), log).into_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].zip_code, "19104");
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2021, 3, 25).unwrap());
    assert_eq!((records[0].partial, records[0].full), (10, 5));
}

#[test]
fn test_sources_follow_config() {
    let config = Config {
        covid: Some(PathBuf::from("covid.csv")),
        ..Config::default()
    };
    assert_eq!(
        config.sources(),
        Sources {
            covid: true,
            ..Sources::default()
        }
    );
}
