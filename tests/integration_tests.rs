// Import -> forecast -> report -> export, through the public library API


use calamine::{open_workbook, Data, Reader, Xlsx};
use priceforecast::export::{to_json, write_document, write_workbook, DocumentLayout, TextRenderer};
use priceforecast::importers::{import_series, import_workbook};
use priceforecast::reports::{build_report_with, Cell, ChartLayout, ReportOptions};
use priceforecast::{build_report, forecast, describe_error, ForecastError, Period};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use test_helpers::{basic_workbook, write_source_workbook};

#[test]
fn test_workbook_import_and_forecast() {
    let dir = TempDir::new().unwrap();
    let data = import_workbook(basic_workbook(&dir)).unwrap();

    assert_eq!(data.catalog.len(), 2);
    assert_eq!(data.series.len(), 4);

    let set = forecast(&data.catalog, &data.series, Period(2)).unwrap();
    assert_eq!(set.price_at("Coffee", Period(0)), Some(dec!(100)));
    assert_eq!(set.price_at("Coffee", Period(1)), Some(dec!(105)));
    assert_eq!(set.price_at("Coffee", Period(2)), Some(dec!(110.25)));
    assert_eq!(set.price_at("Rent", Period(0)), None);
    assert_eq!(set.price_at("Rent", Period(1)), Some(dec!(200)));
    assert_eq!(set.price_at("Rent", Period(2)), Some(dec!(210)));
    assert_eq!(set.len(), 5);
}

#[test]
fn test_short_series_names_the_product() {
    let dir = TempDir::new().unwrap();
    let data = import_workbook(basic_workbook(&dir)).unwrap();

    let err = forecast(&data.catalog, &data.series, Period(4)).unwrap_err();
    assert_eq!(
        err,
        ForecastError::IncompleteSeries {
            product: Some("Coffee".to_string()),
            missing: Period(4),
        }
    );
    assert!(describe_error(&err).contains("period 4"));
}

#[test]
fn test_series_override_from_csv() {
    let dir = TempDir::new().unwrap();
    let data = import_workbook(basic_workbook(&dir)).unwrap();

    let csv_path = dir.path().join("rates.csv");
    std::fs::write(&csv_path, "period;rate\n0;0\n1;10%\n2;10%\n").unwrap();
    let series = import_series(&csv_path).unwrap();

    let set = forecast(&data.catalog, &series, Period(2)).unwrap();
    assert_eq!(set.price_at("Coffee", Period(2)), Some(dec!(121)));
    assert_eq!(set.price_at("Rent", Period(2)), Some(dec!(220)));
}

#[test]
fn test_malformed_rows_fail_with_row_context() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gap.xlsx");
    write_source_workbook(&path, &[("Tea", 3.0, 0, "Drinks")], &[(0, 0.0), (2, 0.01)]);

    let err = import_workbook(&path).unwrap_err();
    let forecast_err = err
        .chain()
        .find_map(|e| e.downcast_ref::<ForecastError>())
        .cloned();
    assert_eq!(
        forecast_err,
        Some(ForecastError::IncompleteSeries {
            product: None,
            missing: Period(1)
        })
    );

    let path = dir.path().join("negative.xlsx");
    write_source_workbook(&path, &[("Tea", -3.0, 0, "Drinks")], &[(0, 0.0)]);
    let err = import_workbook(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Row 2"));
}

#[test]
fn test_workbook_export_reads_back() {
    let dir = TempDir::new().unwrap();
    let data = import_workbook(basic_workbook(&dir)).unwrap();
    let set = forecast(&data.catalog, &data.series, Period(2)).unwrap();
    let doc = build_report(&set, &data.catalog).unwrap();

    let out = dir.path().join("report.xlsx");
    write_workbook(&doc, &out).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&out).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Summary", "Detail_ Coffee", "Detail_ Rent"]
    );

    let summary = workbook.worksheet_range("Summary").unwrap();
    assert_eq!(summary.get((0, 0)), Some(&Data::String("Product".into())));
    assert_eq!(summary.get((0, 3)), Some(&Data::String("2".into())));
    assert_eq!(summary.get((1, 0)), Some(&Data::String("Coffee".into())));
    assert_eq!(summary.get((1, 3)), Some(&Data::Float(110.25)));
    assert_eq!(summary.get((2, 0)), Some(&Data::String("Rent".into())));
    assert!(matches!(summary.get((2, 1)), None | Some(Data::Empty)));
    assert_eq!(summary.get((2, 2)), Some(&Data::Float(200.0)));

    let detail = workbook.worksheet_range("Detail_ Coffee").unwrap();
    assert_eq!(detail.get((0, 2)), Some(&Data::String("Price".into())));
    assert_eq!(detail.get((2, 1)), Some(&Data::Float(5.0)));
    assert_eq!(detail.get((3, 2)), Some(&Data::Float(110.25)));
    assert_eq!(detail.get((3, 3)), Some(&Data::Float(10.25)));
}

#[test]
fn test_document_has_one_page_per_section() {
    let dir = TempDir::new().unwrap();
    let data = import_workbook(basic_workbook(&dir)).unwrap();
    let set = forecast(&data.catalog, &data.series, Period(3)).unwrap();
    let doc = build_report(&set, &data.catalog).unwrap();

    let out = dir.path().join("report.txt");
    write_document(&doc, &out, &TextRenderer::default()).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();

    let layout = DocumentLayout::from_report(&doc);
    assert_eq!(layout.page_count(), 3);
    assert_eq!(text.matches('\x0c').count(), 2);
    assert!(text.contains("Page 3 of 3"));
    assert!(text.contains("1. Product: Coffee"));
    assert!(text.contains("2. Product: Rent"));
    assert!(text.contains("112.46"));
}

#[test]
fn test_combined_layout_and_json() {
    let dir = TempDir::new().unwrap();
    let data = import_workbook(basic_workbook(&dir)).unwrap();
    let set = forecast(&data.catalog, &data.series, Period(2)).unwrap();

    let options = ReportOptions {
        chart_layout: ChartLayout::Combined,
        decimals: 1,
        ..ReportOptions::default()
    };
    let doc = build_report_with(&set, &data.catalog, &options).unwrap();

    assert_eq!(doc.charts.len(), 1);
    assert_eq!(doc.charts[0].series.len(), 2);

    let summary = doc.summary().unwrap();
    assert_eq!(summary.rows[0].cells[2], Cell::Amount(dec!(110.3)));

    let json: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();
    assert_eq!(json["metadata"]["horizon"], 2);
    assert_eq!(json["tables"].as_array().unwrap().len(), 3);

    let out = dir.path().join("combined.xlsx");
    write_workbook(&doc, &out).unwrap();
    assert!(out.exists());
}
