use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sales_forecast::data::DataLoader;
use sales_forecast::series::build_series;
use sales_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

// Helper function to write a CSV fixture
fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_load_full_export() {
    let file = csv_file(&[
        "date,product_id,product_name,units_sold,total_amount",
        "2023-01-01,101,Widget,5,50.0",
        "2023-01-02,101,Widget,7,70.0",
        "2023-01-01,202,Gadget,3,90.0",
    ]);

    let dataset = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.product_names(), vec!["Widget", "Gadget"]);

    let first = &dataset.records()[0];
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    assert_eq!(first.product_id.as_deref(), Some("101"));
    assert_eq!(first.units_sold, 5);
    assert_eq!(first.total_amount, Some(50.0));
}

#[test]
fn test_optional_columns_may_be_absent() {
    let file = csv_file(&[
        "date,product_name,units_sold",
        "2023-03-01,Widget,1",
        "2023-03-02,Widget,2",
    ]);

    let dataset = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.records()[1].product_id, None);
    assert_eq!(dataset.records()[1].total_amount, None);
}

#[test]
fn test_column_names_are_normalized() {
    let file = csv_file(&[
        " Date ,Product_Name,UNITS_SOLD",
        "2023-03-01,Widget,4",
    ]);

    let dataset = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(dataset.records()[0].units_sold, 4);
}

#[test]
fn test_missing_columns_are_reported() {
    let file = csv_file(&["date,product_id,total_amount", "2023-01-01,101,50.0"]);

    match DataLoader::from_csv(file.path()) {
        Err(ForecastError::MissingColumns(missing)) => {
            assert_eq!(missing, vec!["product_name".to_string(), "units_sold".to_string()]);
        }
        other => panic!("Expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_invalid_rows_are_dropped() {
    let file = csv_file(&[
        "date,product_name,units_sold",
        "2023-01-01,Widget,5",
        "not a date,Widget,5",
        "2023-01-03,,5",
        "2023-01-04,Widget,-2",
        "2023-01-05,Widget,",
        "2023-01-06,Widget,2.9",
    ]);

    let dataset = DataLoader::from_csv(file.path()).unwrap();
    let units: Vec<u64> = dataset.records().iter().map(|r| r.units_sold).collect();
    assert_eq!(units, vec![5, 2]);
}

#[test]
fn test_gaps_are_zero_filled_after_loading() {
    let file = csv_file(&[
        "date,product_name,units_sold",
        "2023-01-04,Widget,1",
        "2023-01-01,Widget,3",
        "2023-01-01,Widget,2",
    ]);

    let dataset = DataLoader::from_csv(file.path()).unwrap();
    let series = build_series(&dataset, "Widget").unwrap();
    assert_eq!(series.start_date(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    assert_eq!(series.units(), &[5, 0, 0, 1]);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = DataLoader::from_csv("/definitely/not/here/sales.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}
