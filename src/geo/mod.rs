mod brand;
mod geocode;
mod markers;
mod project;

pub use brand::Brand;
pub use geocode::{SearchResult, search_place};
pub use markers::{
    MarkerRecord, MarkersSource, PointEntity, build_points, create_point, fetch_markers,
    read_markers_file,
};
pub use project::{WorldPos, from_lon_lat, resolution_at_zoom, to_lon_lat};
