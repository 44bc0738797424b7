/// Formats a lon/lat pair for status displays, e.g. "19.3460°E 52.2308°N".
pub fn format_lon_lat(lon: f64, lat: f64) -> String {
    let east_west = if lon >= 0.0 { 'E' } else { 'W' };
    let north_south = if lat >= 0.0 { 'N' } else { 'S' };
    format!(
        "{:.4}°{} {:.4}°{}",
        lon.abs(),
        east_west,
        lat.abs(),
        north_south
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_all_hemispheres() {
        assert_eq!(format_lon_lat(19.346032, 52.230791), "19.3460°E 52.2308°N");
        assert_eq!(format_lon_lat(-73.9857, -33.4489), "73.9857°W 33.4489°S");
    }
}
