use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use listing_insights::ingestion::csv::ingest_csv_from_str;
use listing_insights::ingestion::{
    IngestionContext, IngestionFormat, IngestionObserver, IngestionOptions, IngestionSeverity,
    IngestionStats,
};
use listing_insights::listing::{listing_schema, ListingDataset};
use listing_insights::IngestionError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn tmp_file(ext: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    std::env::temp_dir().join(format!("listing-insights-{nanos}.{ext}"))
}

#[test]
fn csv_fixture_loads_with_extra_columns_and_nulls() {
    let ds = ListingDataset::load("tests/fixtures/listings.csv", &IngestionOptions::default()).unwrap();
    assert_eq!(ds.len(), 12);
    assert_eq!(ds.dataset().schema, listing_schema());

    let first = ds.listing(0).unwrap();
    assert_eq!(first.country, Some("Spain"));
    assert_eq!(first.price, Some(120.0));
    assert_eq!(first.availability_365, Some(300));

    let last = ds.listing(11).unwrap();
    assert_eq!(last.name, None);
    assert_eq!(last.availability_365, None);
    assert!(ds.listing(12).is_none());
}

#[test]
fn ndjson_fixture_unwraps_extended_numbers() {
    let ds = ListingDataset::load("tests/fixtures/listings.ndjson", &IngestionOptions::default()).unwrap();
    let prices: Vec<Option<f64>> = ds.iter().map(|l| l.price).collect();
    assert_eq!(prices, vec![Some(80.0), Some(55.0), Some(40.5)]);
    assert_eq!(ds.listing(0).unwrap().availability_365, Some(239));
}

#[test]
fn column_order_does_not_matter() {
    let path = tmp_file("csv");
    fs::write(
        &path,
        "Price,Availability_365,Name,Host_name,Room_type,Property_type,Country\n\
         64.5,12,Alfama loft,Rita,Entire home/apt,Loft,Portugal\n",
    )
    .unwrap();

    let ds = ListingDataset::load(&path, &IngestionOptions::default()).unwrap();
    let listing = ds.listing(0).unwrap();
    assert_eq!(listing.country, Some("Portugal"));
    assert_eq!(listing.property_type, Some("Loft"));
    assert_eq!(listing.price, Some(64.5));
    let _ = fs::remove_file(path);
}

#[test]
fn negative_price_is_rejected_and_reported() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    let err = ListingDataset::load("tests/fixtures/listings_invalid.csv", &opts).unwrap_err();
    assert!(matches!(err, IngestionError::InvalidValue { ref column, .. } if column == "Price"));

    assert!(obs.successes.lock().unwrap().is_empty());
    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn availability_outside_a_year_is_rejected() {
    let input = "Country,Property_type,Room_type,Host_name,Name,Price,Availability_365\n\
                 Spain,Apartment,Private room,Ana,Cozy room,40,366\n";
    let ds = ingest_csv_from_str(input, &listing_schema()).unwrap();
    let err = ListingDataset::from_dataset(ds).unwrap_err();
    assert!(matches!(err, IngestionError::InvalidValue { ref column, .. } if column == "Availability_365"));
}

#[test]
fn missing_column_is_a_schema_mismatch() {
    let input = "Country,Property_type,Room_type,Host_name,Name,Price\n\
                 Spain,Apartment,Private room,Ana,Cozy,40\n";
    let err = ingest_csv_from_str(input, &listing_schema()).unwrap_err();
    assert!(matches!(err, IngestionError::SchemaMismatch { .. }));
}

#[test]
fn missing_file_alerts_as_critical() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        format: Some(IngestionFormat::Csv),
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
    };

    let _ = ListingDataset::load("tests/fixtures/does_not_exist.csv", &opts).unwrap_err();
    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Critical]);
}

#[test]
fn successful_load_reports_stats_once() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };

    ListingDataset::load("tests/fixtures/listings.csv", &opts).unwrap();
    assert_eq!(*obs.successes.lock().unwrap(), vec![IngestionStats {
            rows: 12,
            columns: 7,
            null_cells: 2
        }]);
    assert!(obs.failures.lock().unwrap().is_empty());
}
