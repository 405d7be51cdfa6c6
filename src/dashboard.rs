//! Page reports for the listings dashboard.
//!
//! Each page turns the current [`FilterCriteria`] into the chart specifications the renderer
//! draws. Nothing here renders; a [`ChartSpec`] only names the chart kind, its axis columns and
//! the table feeding it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QueryResult;
use crate::execution::ExecutionEngine;
use crate::listing::{columns, ListingDataset};
use crate::processing::{
    apply, box_stats_by, count_by, count_non_null_by, mean_by, reduce, BoxTable, DataView,
    FilterCriteria, ReduceOp, SummaryTable,
};
use crate::types::{GroupKey, Value};

/// Number of bars in the "top N" charts.
pub const DEFAULT_TOP_N: usize = 10;

/// The dashboard's navigation pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Home,
    Overview,
    Explore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Horizontal bars, value on x.
    HorizontalBar,
    Bar,
    Pie,
    Choropleth,
    Box,
    ScatterGeo,
}

/// Data a chart needs, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Summary(SummaryTable),
    Box(BoxTable),
}

/// One chart on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    /// Column plotted on the category axis / locations / slice names.
    pub x: String,
    /// Column plotted as the magnitude.
    pub y: String,
    pub data: ChartData,
}

impl ChartSpec {
    fn summary(title: &str, kind: ChartKind, table: SummaryTable) -> Self {
        let (x, y) = (table.key_column.clone(), table.value_column.clone());
        Self {
            title: title.to_string(),
            kind,
            x,
            y,
            data: ChartData::Summary(table),
        }
    }

    pub fn table(&self) -> Option<&SummaryTable> {
        match &self.data {
            ChartData::Summary(t) => Some(t),
            ChartData::Box(_) => None,
        }
    }
}

/// Static content of the Home page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeReport {
    pub domain: &'static str,
    pub technologies: &'static [&'static str],
    pub overview: &'static str,
}

pub fn home() -> HomeReport {
    HomeReport {
        domain: "Travel Industry, Property Management, and Tourism",
        technologies: &["Rust", "csv", "serde", "rayon"],
        overview: "Analyze short-term rental listings: filter by country, property type, room type \
                   and price, then explore pricing variations, availability patterns and \
                   location-based trends.",
    }
}

/// Headline numbers over the filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub listings: Value,
    pub average_price: Value,
    pub min_price: Value,
    pub max_price: Value,
}

/// Overview page: counts across categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub criteria: FilterCriteria,
    pub headline: Headline,
    pub charts: Vec<ChartSpec>,
    /// Filtered rows, only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
}

/// Explore page: price and availability analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreReport {
    pub criteria: FilterCriteria,
    pub charts: Vec<ChartSpec>,
}

/// Everything a page render needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum PageReport {
    Home(HomeReport),
    Overview(OverviewReport),
    Explore(ExploreReport),
}

/// Builds page reports against one shared dataset.
pub struct Dashboard<'e> {
    listings: ListingDataset,
    top_n: usize,
    engine: Option<&'e ExecutionEngine>,
}

impl<'e> Dashboard<'e> {
    pub fn new(listings: ListingDataset) -> Self {
        Self {
            listings,
            top_n: DEFAULT_TOP_N,
            engine: None,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Evaluate filters and the top-N/mean aggregations on `engine` instead of the caller's thread.
    pub fn with_engine(mut self, engine: &'e ExecutionEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn listings(&self) -> &ListingDataset {
        &self.listings
    }

    /// The initial widget state: everything selected.
    pub fn default_criteria(&self) -> QueryResult<FilterCriteria> {
        FilterCriteria::select_all(&self.listings)
    }

    pub fn render(
        &self,
        page: Page,
        criteria: &FilterCriteria,
        include_raw: bool,
    ) -> QueryResult<PageReport> {
        Ok(match page {
            Page::Home => PageReport::Home(home()),
            Page::Overview => PageReport::Overview(self.overview(criteria, include_raw)?),
            Page::Explore => PageReport::Explore(self.explore(criteria)?),
        })
    }

    pub fn overview(&self, criteria: &FilterCriteria, include_raw: bool) -> QueryResult<OverviewReport> {
        let view = self.filtered(criteria)?;
        let top_n = Some(self.top_n);

        let property_types = SummaryTable::from_counts(
            columns::PROPERTY_TYPE,
            "Listings",
            self.count_by(&view, columns::PROPERTY_TYPE, top_n)?,
        );
        let hosts = SummaryTable::from_counts(
            columns::HOST_NAME,
            "Listings",
            self.count_by(&view, columns::HOST_NAME, top_n)?,
        );
        // Pie slices in key order, not ranked.
        let room_types = SummaryTable::from_counts(
            columns::ROOM_TYPE,
            "counts",
            count_non_null_by(&view, columns::ROOM_TYPE, columns::ROOM_TYPE)?,
        );
        let countries = SummaryTable::from_counts(
            columns::COUNTRY,
            "Total_Listings",
            count_non_null_by(&view, columns::COUNTRY, columns::NAME)?,
        );

        let top_title = format!("Top {} Property Types", self.top_n);
        let hosts_title = format!("Top {} Hosts with Highest number of Listings", self.top_n);
        Ok(OverviewReport {
            criteria: criteria.clone(),
            headline: Headline {
                listings: reduce(&view, columns::NAME, ReduceOp::Count)?,
                average_price: reduce(&view, columns::PRICE, ReduceOp::Mean)?,
                min_price: reduce(&view, columns::PRICE, ReduceOp::Min)?,
                max_price: reduce(&view, columns::PRICE, ReduceOp::Max)?,
            },
            charts: vec![
                ChartSpec::summary(&top_title, ChartKind::HorizontalBar, property_types),
                ChartSpec::summary(&hosts_title, ChartKind::HorizontalBar, hosts),
                ChartSpec::summary("Total Listings in each Room_types", ChartKind::Pie, room_types),
                ChartSpec::summary("Total Listings in each Country", ChartKind::Choropleth, countries),
            ],
            raw: include_raw.then(|| view.to_records()),
        })
    }

    pub fn explore(&self, criteria: &FilterCriteria) -> QueryResult<ExploreReport> {
        let view = self.filtered(criteria)?;

        let mut price_by_room = SummaryTable::from_means(
            columns::ROOM_TYPE,
            columns::PRICE,
            self.mean_by(&view, columns::ROOM_TYPE, columns::PRICE)?,
        );
        price_by_room.sort_by_value_ascending();

        let availability_by_room = BoxTable::new(
            columns::ROOM_TYPE,
            columns::AVAILABILITY_365,
            box_stats_by(&view, columns::ROOM_TYPE, columns::AVAILABILITY_365)?,
        );

        let price_by_country = SummaryTable::from_means(
            columns::COUNTRY,
            columns::PRICE,
            self.mean_by(&view, columns::COUNTRY, columns::PRICE)?,
        );

        let mut availability_by_country = SummaryTable::from_means(
            columns::COUNTRY,
            columns::AVAILABILITY_365,
            self.mean_by(&view, columns::COUNTRY, columns::AVAILABILITY_365)?,
        );
        availability_by_country.truncate_values_to_int();

        Ok(ExploreReport {
            criteria: criteria.clone(),
            charts: vec![
                ChartSpec::summary("Avg Price in each Room type", ChartKind::Bar, price_by_room),
                ChartSpec {
                    title: "Availability by Room_type".to_string(),
                    kind: ChartKind::Box,
                    x: columns::ROOM_TYPE.to_string(),
                    y: columns::AVAILABILITY_365.to_string(),
                    data: ChartData::Box(availability_by_room),
                },
                ChartSpec::summary("Avg Price in each Country", ChartKind::ScatterGeo, price_by_country),
                ChartSpec::summary(
                    "Avg Availability in each Country",
                    ChartKind::ScatterGeo,
                    availability_by_country,
                ),
            ],
        })
    }

    fn filtered(&self, criteria: &FilterCriteria) -> QueryResult<DataView<'_>> {
        match self.engine {
            Some(engine) => engine.filter_parallel(self.listings.dataset(), criteria),
            None => apply(self.listings.dataset(), criteria),
        }
    }

    fn count_by(
        &self,
        view: &DataView<'_>,
        key: &str,
        top_n: Option<usize>,
    ) -> QueryResult<Vec<(GroupKey, usize)>> {
        match self.engine {
            Some(engine) => engine.count_by_parallel(view, key, top_n),
            None => count_by(view, key, top_n),
        }
    }

    fn mean_by(
        &self,
        view: &DataView<'_>,
        key: &str,
        value: &str,
    ) -> QueryResult<BTreeMap<GroupKey, f64>> {
        match self.engine {
            Some(engine) => engine.mean_by_parallel(view, key, value),
            None => mean_by(view, key, value),
        }
    }
}
