//! Great-circle distance and the bounding-box area approximation.

use anyhow::{ensure, Result};

/// IUGG mean Earth radius.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine great-circle distance in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Approximate extent of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsArea {
    /// Span along the mean-latitude line between min and max longitude.
    pub east_west_km: f64,
    /// Span along the mean-longitude line between min and max latitude.
    pub north_south_km: f64,
    pub area_km2: f64,
}

/// Area of a lat/lon bounding box as the product of its two orthogonal
/// great-circle spans.
///
/// This is an approximation, not a spherical polygon area; it is the figure
/// the reporting layer documents and must keep reporting. Requires
/// `minlat <= maxlat` and `minlon <= maxlon`.
pub fn bounds_area(minlat: f64, minlon: f64, maxlat: f64, maxlon: f64) -> Result<BoundsArea> {
    for (name, v) in [
        ("minlat", minlat),
        ("minlon", minlon),
        ("maxlat", maxlat),
        ("maxlon", maxlon),
    ] {
        ensure!(v.is_finite(), "bounds coordinate {name} is not finite");
    }
    ensure!(
        minlat <= maxlat,
        "bounds minlat {minlat} exceeds maxlat {maxlat}"
    );
    ensure!(
        minlon <= maxlon,
        "bounds minlon {minlon} exceeds maxlon {maxlon}"
    );

    let mean_lat = (minlat + maxlat) / 2.0;
    let mean_lon = (minlon + maxlon) / 2.0;

    let east_west_km = haversine_km(mean_lat, minlon, mean_lat, maxlon);
    let north_south_km = haversine_km(minlat, mean_lon, maxlat, mean_lon);

    Ok(BoundsArea {
        east_west_km,
        north_south_km,
        area_km2: east_west_km * north_south_km,
    })
}
