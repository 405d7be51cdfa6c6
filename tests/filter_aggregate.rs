use std::collections::BTreeSet;

use listing_insights::ingestion::IngestionOptions;
use listing_insights::listing::{columns, ListingDataset, ListingRecord};
use listing_insights::processing::{
    apply, box_stats_by, count_by, count_non_null_by, mean_by, DataView, FilterCriteria,
};
use listing_insights::types::GroupKey;
use listing_insights::QueryError;

fn fixture() -> ListingDataset {
    ListingDataset::load("tests/fixtures/listings.csv", &IngestionOptions::default()).unwrap()
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn keys(ranked: &[(GroupKey, usize)]) -> Vec<(String, usize)> {
    ranked.iter().map(|(k, n)| (k.to_string(), *n)).collect()
}

/// Deterministic pseudo-random listings (xorshift) for equivalence checks.
fn generated(n: usize) -> ListingDataset {
    let countries = ["Spain", "Portugal", "Brazil", "Turkey", "Canada"];
    let properties = ["Apartment", "House", "Loft", "Villa"];
    let rooms = ["Entire home/apt", "Private room", "Shared room", "Hotel room"];
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    ListingDataset::from_records((0..n).map(|i| {
        let r = next();
        ListingRecord {
            country: countries[(r % 5) as usize].to_string(),
            property_type: properties[((r >> 8) % 4) as usize].to_string(),
            room_type: rooms[((r >> 16) % 4) as usize].to_string(),
            host_name: format!("host-{}", (r >> 24) % 13),
            name: format!("listing-{i}"),
            price: ((r >> 32) % 1_000) as f64 / 2.0,
            availability_365: ((r >> 40) % 366) as i64,
        }
    }))
    .unwrap()
}

#[test]
fn select_all_keeps_every_row() {
    let ds = fixture();
    let criteria = FilterCriteria::select_all(&ds).unwrap();
    assert_eq!(criteria.countries, set(&["Brazil", "Portugal", "Spain", "Turkey", "United States"]));
    assert_eq!((criteria.price_min, criteria.price_max), (20.0, 310.0));

    let view = apply(ds.dataset(), &criteria).unwrap();
    assert_eq!(view.len(), ds.len());
}

#[test]
fn filter_matches_brute_force() {
    let ds = generated(2_000);
    let mut criteria = FilterCriteria::select_all(&ds).unwrap();
    criteria.countries = set(&["Spain", "Brazil"]);
    criteria.room_types.remove("Shared room");
    criteria.price_min = 50.0;
    criteria.price_max = 250.0;

    let view = apply(ds.dataset(), &criteria).unwrap();
    let expected: Vec<usize> = ds
        .iter()
        .enumerate()
        .filter(|(_, l)| {
            criteria.countries.contains(l.country.unwrap())
                && criteria.property_types.contains(l.property_type.unwrap())
                && criteria.room_types.contains(l.room_type.unwrap())
                && (50.0..=250.0).contains(&l.price.unwrap())
        })
        .map(|(i, _)| i)
        .collect();
    assert!(!expected.is_empty());
    assert_eq!(view.indices(), expected.as_slice());
}

#[test]
fn filtering_twice_changes_nothing() {
    let ds = generated(500);
    let mut criteria = FilterCriteria::select_all(&ds).unwrap();
    criteria.property_types = set(&["Loft", "Villa"]);
    criteria.price_max = 120.0;

    let once = apply(ds.dataset(), &criteria).unwrap().to_dataset();
    let twice = apply(&once, &criteria).unwrap();
    assert_eq!(twice.len(), once.row_count());
}

#[test]
fn applying_twice_gives_the_same_view() {
    let ds = generated(500);
    let before = ds.dataset().clone();
    let mut criteria = FilterCriteria::select_all(&ds).unwrap();
    criteria.countries = set(&["Spain", "Brazil"]);
    criteria.price_min = 30.0;
    criteria.price_max = 150.0;

    let first = apply(ds.dataset(), &criteria).unwrap();
    let second = apply(ds.dataset(), &criteria).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first.indices(), second.indices());
    assert_eq!(ds.dataset(), &before);
}

#[test]
fn any_empty_selection_yields_empty_results() {
    let ds = fixture();
    for clear in [0, 1, 2] {
        let mut criteria = FilterCriteria::select_all(&ds).unwrap();
        match clear {
            0 => criteria.countries.clear(),
            1 => criteria.property_types.clear(),
            _ => criteria.room_types.clear(),
        }
        let view = apply(ds.dataset(), &criteria).unwrap();
        assert!(view.is_empty());
        assert!(count_by(&view, columns::COUNTRY, None).unwrap().is_empty());
        assert!(mean_by(&view, columns::ROOM_TYPE, columns::PRICE).unwrap().is_empty());
        assert!(box_stats_by(&view, columns::ROOM_TYPE, columns::AVAILABILITY_365).unwrap().is_empty());
    }
}

#[test]
fn inverted_price_range_is_rejected() {
    let ds = fixture();
    let mut criteria = FilterCriteria::select_all(&ds).unwrap();
    criteria.price_min = 200.0;
    criteria.price_max = 100.0;
    assert_eq!(
        apply(ds.dataset(), &criteria).unwrap_err(),
        QueryError::InvalidRange { min: 200.0, max: 100.0 }
    );
}

#[test]
fn counts_partition_the_view() {
    let ds = generated(1_234);
    let view = DataView::all(ds.dataset());
    for column in [columns::COUNTRY, columns::PROPERTY_TYPE, columns::ROOM_TYPE, columns::HOST_NAME] {
        let total: usize = count_by(&view, column, None).unwrap().iter().map(|(_, n)| n).sum();
        assert_eq!(total, view.len(), "{column}");
    }
}

#[test]
fn count_by_ranks_by_count_then_key() {
    let ds = fixture();
    let view = DataView::all(ds.dataset());

    assert_eq!(
        keys(&count_by(&view, columns::COUNTRY, None).unwrap()),
        vec![
            ("Portugal".to_string(), 3),
            ("Spain".to_string(), 3),
            ("Brazil".to_string(), 2),
            ("Turkey".to_string(), 2),
            ("United States".to_string(), 2),
        ]
    );
    assert_eq!(
        keys(&count_by(&view, columns::HOST_NAME, Some(3)).unwrap()),
        vec![("Ana".to_string(), 2), ("Bea".to_string(), 2), ("Joao".to_string(), 2)]
    );
}

#[test]
fn country_totals_skip_unnamed_listings() {
    let ds = fixture();
    let view = DataView::all(ds.dataset());
    let totals = count_non_null_by(&view, columns::COUNTRY, columns::NAME).unwrap();
    let turkey = totals.iter().find(|(k, _)| k.as_str() == Some("Turkey")).map(|(_, n)| *n);
    assert_eq!(turkey, Some(1));
}

#[test]
fn means_skip_missing_values() {
    let ds = fixture();
    let mut criteria = FilterCriteria::select_all(&ds).unwrap();
    criteria.room_types = set(&["Private room", "Shared room"]);
    let view = apply(ds.dataset(), &criteria).unwrap();

    let prices = mean_by(&view, columns::ROOM_TYPE, columns::PRICE).unwrap();
    assert_eq!(prices[&GroupKey::from("Private room")], 57.25);
    assert_eq!(prices[&GroupKey::from("Shared room")], 20.0);

    // Turkey's private room has no availability; only its serviced apartment counts.
    let view = DataView::all(ds.dataset());
    let availability = mean_by(&view, columns::COUNTRY, columns::AVAILABILITY_365).unwrap();
    assert_eq!(availability[&GroupKey::from("Turkey")], 330.0);
    assert_eq!(availability[&GroupKey::from("Spain")], 170.0);
}

#[test]
fn unknown_and_non_numeric_columns_are_errors() {
    let ds = fixture();
    let view = DataView::all(ds.dataset());
    assert!(matches!(
        count_by(&view, "Neighbourhood", None),
        Err(QueryError::UnknownColumn { .. })
    ));
    assert!(matches!(
        mean_by(&view, columns::COUNTRY, columns::HOST_NAME),
        Err(QueryError::ColumnType { .. })
    ));
}

#[test]
fn three_listing_example() {
    let rec = |country: &str, property: &str, room: &str, price: f64| ListingRecord {
        country: country.into(),
        property_type: property.into(),
        room_type: room.into(),
        host_name: "host".into(),
        name: "listing".into(),
        price,
        availability_365: 100,
    };
    let ds = ListingDataset::from_records(vec![
        rec("US", "House", "Entire", 100.0),
        rec("US", "Flat", "Private", 50.0),
        rec("FR", "House", "Entire", 200.0),
    ])
    .unwrap();
    let criteria = FilterCriteria {
        countries: set(&["US", "FR"]),
        property_types: set(&["House", "Flat"]),
        room_types: set(&["Entire", "Private"]),
        price_min: 0.0,
        price_max: 1_000.0,
    };

    let view = apply(ds.dataset(), &criteria).unwrap();
    assert_eq!(view.len(), 3);
    let means = mean_by(&view, columns::ROOM_TYPE, columns::PRICE).unwrap();
    assert_eq!(means.len(), 2);
    assert_eq!(means[&GroupKey::from("Entire")], 150.0);
    assert_eq!(means[&GroupKey::from("Private")], 50.0);
}
