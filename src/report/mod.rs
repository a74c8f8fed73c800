//! Read-only reporting over the persisted corpus, plus the one city-repair
//! write. Queries are declarative pipelines issued through the
//! [`DocumentStore`] seam.

pub mod geo;
pub mod queries;
pub mod store;

pub use geo::{bounds_area, haversine_km, BoundsArea};
pub use queries::{
    bicycle_tag_counts, bike_shop_count, bikeable_way_share, bounds_report, city_counts,
    fix_cities, highway_counts, measured_extent, overview, postcode_counts, BikewayShare,
    BoundsReport, CorpusOverview, GroupCount,
};
pub use store::{DocumentStore, MemoryStore};
