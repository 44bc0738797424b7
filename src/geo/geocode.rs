use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// A single geocoder hit. Ephemeral: held only in the result list between a
/// query and a selection or dismissal.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub display_name: String,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    display_name: String,
    lat: String,
    lon: String,
}

/// Queries a Nominatim-compatible geocoder. Query parameters are URL-encoded
/// by the client. Non-200 responses and malformed payloads surface as errors
/// so the caller can fall back to an empty result list.
pub fn search_place(base_url: &str, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("mapa-marek/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build geocoder HTTP client")?;

    let limit_text = limit.to_string();
    let response = client
        .get(base_url)
        .query(&[
            ("format", "json"),
            ("addressdetails", "1"),
            ("q", query),
            ("limit", limit_text.as_str()),
        ])
        .send()
        .with_context(|| format!("geocoder request to {base_url} failed"))?;

    if !response.status().is_success() {
        return Err(anyhow!("geocoder returned status {}", response.status()));
    }

    let raw = response.text().context("failed to read geocoder response")?;
    parse_results(&raw)
}

fn parse_results(raw: &str) -> Result<Vec<SearchResult>> {
    let hits: Vec<RawResult> = serde_json::from_str(raw).context("invalid JSON from geocoder")?;

    Ok(hits
        .into_iter()
        .filter_map(|hit| {
            let lon = hit.lon.trim().parse().ok()?;
            let lat = hit.lat.trim().parse().ok()?;
            Some(SearchResult {
                display_name: hit.display_name,
                lon,
                lat,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_style_payload() {
        let raw = r#"[
            {"display_name":"Warszawa, Polska","lat":"52.2319581","lon":"21.0067249"},
            {"display_name":"Warszawa Zachodnia","lat":"52.2096","lon":"20.9626"}
        ]"#;
        let results = parse_results(raw).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].display_name, "Warszawa, Polska");
        assert!((results[0].lon - 21.0067249).abs() < 1e-12);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_results("<html>rate limited</html>").is_err());
        assert!(parse_results(r#"{"display_name":"not an array"}"#).is_err());
    }

    #[test]
    fn hits_with_unparseable_coordinates_are_skipped() {
        let raw = r#"[
            {"display_name":"broken","lat":"??","lon":"21.0"},
            {"display_name":"fine","lat":"52.0","lon":"21.0"}
        ]"#;
        let results = parse_results(raw).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "fine");
    }

    #[test]
    fn empty_payload_yields_empty_list() {
        assert!(parse_results("[]").unwrap().is_empty());
    }
}
