use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize};

use super::brand::Brand;
use super::project::{WorldPos, from_lon_lat};

/// A raw marker record as served by the marker endpoint. The original backend
/// emitted coordinates as decimal strings, so decoding accepts both numbers
/// and strings; anything unparseable becomes NaN and is dropped by
/// [`build_points`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MarkerRecord {
    #[serde(deserialize_with = "lenient_coord")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_coord")]
    pub lng: f64,
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub city: String,
}

fn lenient_coord<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(value) => value,
        Raw::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
    })
}

/// A renderable marker. Coordinates are projected exactly once at creation;
/// render passes never re-project.
#[derive(Clone, Debug)]
pub struct PointEntity {
    pub world: WorldPos,
    /// Pre-composed display text: name line, then optional address lines.
    pub label: String,
}

pub fn create_point(lon: f64, lat: f64, label: String) -> PointEntity {
    PointEntity {
        world: from_lon_lat(lon, lat),
        label,
    }
}

fn compose_label(record: &MarkerRecord) -> String {
    let mut lines = vec![record.name.trim().to_owned()];
    for line in [
        format!("{} {}", record.street.trim(), record.number.trim()),
        format!("{} {}", record.code.trim(), record.city.trim()),
    ] {
        let line = line.trim().to_owned();
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Builds point entities from fetched records. Records whose coordinates did
/// not parse to finite numbers are dropped here, before projection; returns
/// the points and the dropped count.
pub fn build_points(records: &[MarkerRecord]) -> (Vec<PointEntity>, usize) {
    let mut points = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        if !record.lat.is_finite() || !record.lng.is_finite() {
            dropped += 1;
            continue;
        }
        points.push(create_point(record.lng, record.lat, compose_label(record)));
    }

    if dropped > 0 {
        tracing::warn!(dropped, "skipped marker records with unparseable coordinates");
    }

    (points, dropped)
}

/// Where the viewer loads marker records from.
#[derive(Clone, Debug)]
pub enum MarkersSource {
    Endpoint { api_base: String, brand: Brand },
    File(PathBuf),
}

pub fn fetch_markers(source: &MarkersSource) -> Result<Vec<MarkerRecord>> {
    match source {
        MarkersSource::File(path) => read_markers_file(path),
        MarkersSource::Endpoint { api_base, brand } => {
            let url = format!("{}/api/{}", api_base.trim_end_matches('/'), brand.name());
            let client = reqwest::blocking::Client::builder()
                .user_agent(concat!("mapa-marek/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(15))
                .build()
                .context("failed to build marker HTTP client")?;

            let response = client
                .get(&url)
                .send()
                .with_context(|| format!("marker request to {url} failed"))?;

            if response.status() != reqwest::StatusCode::OK {
                return Err(anyhow!(
                    "Nieznana marka: {} (status {})",
                    brand.name(),
                    response.status()
                ));
            }

            response.json().context("invalid marker JSON from endpoint")
        }
    }
}

pub fn read_markers_file(path: &Path) -> Result<Vec<MarkerRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read markers file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid marker JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: &str) -> MarkerRecord {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn decodes_string_and_numeric_coordinates() {
        let as_strings = record(r#"{"id":7,"lat":"52.23","lng":"21.01","name":"A"}"#);
        assert!((as_strings.lat - 52.23).abs() < 1e-12);
        assert!((as_strings.lng - 21.01).abs() < 1e-12);

        let as_numbers = record(r#"{"lat":52.23,"lng":21.01,"name":"A"}"#);
        assert!((as_numbers.lat - 52.23).abs() < 1e-12);
    }

    #[test]
    fn unparseable_coordinates_are_dropped_before_projection() {
        let records = vec![
            record(r#"{"lat":"abc","lng":"21.0","name":"bad"}"#),
            record(r#"{"lat":"52.0","lng":"21.0","name":"good"}"#),
        ];
        let (points, dropped) = build_points(&records);
        assert_eq!(points.len(), 1);
        assert_eq!(dropped, 1);
        assert_eq!(points[0].label, "good");
    }

    #[test]
    fn label_includes_address_lines_when_present() {
        let full = record(
            r#"{"lat":"52","lng":"21","name":"Sklep","street":"Długa","number":"7","code":"00-001","city":"Warszawa"}"#,
        );
        assert_eq!(compose_label(&full), "Sklep\nDługa 7\n00-001 Warszawa");
    }

    #[test]
    fn label_skips_empty_address_lines() {
        let bare = record(r#"{"lat":"52","lng":"21","name":"Sklep"}"#);
        assert_eq!(compose_label(&bare), "Sklep");
    }

    #[test]
    fn create_point_projects_at_creation() {
        let point = create_point(0.0, 0.0, "origin".into());
        assert!(point.world.x.abs() < 1e-9);
        assert!(point.world.y.abs() < 1e-9);
    }

    #[test]
    fn markers_file_errors_are_reported() {
        let missing = read_markers_file(Path::new("/nonexistent/markers.json"));
        assert!(missing.is_err());

        let path = std::env::temp_dir().join(format!("mapa-marek-test-{}.json", std::process::id()));
        fs::write(&path, "not json").unwrap();
        assert!(read_markers_file(&path).is_err());

        fs::write(&path, r#"[{"lat":"52","lng":"21","name":"A"}]"#).unwrap();
        let records = read_markers_file(&path).unwrap();
        assert_eq!(records.len(), 1);
        let _ = fs::remove_file(&path);
    }
}
