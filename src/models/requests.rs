//! Request normalization for the proxy routes
//!
//! Turns inbound query strings into the `(path, params)` pairs forwarded
//! upstream.

use crate::error::{ProxyError, Result};
use crate::upstream::QueryParams;

/// Upstream path used by `/weather` and by `/forecast` without `endpoint`.
pub const DEFAULT_ENDPOINT: &str = "forecast";

const LATITUDE_ALIASES: &[&str] = &["latitude", "lat"];
const LONGITUDE_ALIASES: &[&str] = &["longitude", "lon", "long"];

/// Normalizes `/weather` parameters.
///
/// The first non-empty alias (in precedence order) becomes the canonical
/// `latitude`/`longitude`; remaining aliases are dropped and every other
/// parameter is forwarded untouched.
pub fn normalize_weather_params(mut params: QueryParams) -> Result<QueryParams> {
    let latitude = take_first(&mut params, LATITUDE_ALIASES);
    let longitude = take_first(&mut params, LONGITUDE_ALIASES);

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => {
            params.insert("latitude".to_string(), latitude);
            params.insert("longitude".to_string(), longitude);
            Ok(params)
        }
        _ => Err(ProxyError::MissingParameters(
            "latitude and longitude required (lat/lon)".to_string(),
        )),
    }
}

/// Splits `/forecast` parameters into the upstream endpoint and the rest.
pub fn split_endpoint(mut params: QueryParams) -> (String, QueryParams) {
    let endpoint = params
        .remove("endpoint")
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    (endpoint, params)
}

/// Removes all `aliases`, returning the first non-empty value.
fn take_first(params: &mut QueryParams, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| params.remove(*alias))
        .fold(None, |found, value| {
            found.or_else(|| Some(value).filter(|v| !v.trim().is_empty()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_names_pass_through() {
        let out = normalize_weather_params(params(&[
            ("latitude", "52.5"),
            ("longitude", "13.4"),
            ("hourly", "temperature_2m"),
        ]))
        .unwrap();

        assert_eq!(
            out,
            params(&[("latitude", "52.5"), ("longitude", "13.4"), ("hourly", "temperature_2m")])
        );
    }

    #[test]
    fn test_aliases_are_renamed() {
        let out = normalize_weather_params(params(&[("lat", "1"), ("lon", "2")])).unwrap();
        assert_eq!(out, params(&[("latitude", "1"), ("longitude", "2")]));

        let out = normalize_weather_params(params(&[("lat", "1"), ("long", "3")])).unwrap();
        assert_eq!(out, params(&[("latitude", "1"), ("longitude", "3")]));
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let out = normalize_weather_params(params(&[
            ("latitude", "1"),
            ("lat", "9"),
            ("lon", "2"),
            ("long", "8"),
        ]))
        .unwrap();

        assert_eq!(out, params(&[("latitude", "1"), ("longitude", "2")]));
    }

    #[test]
    fn test_empty_value_falls_through_to_alias() {
        let out = normalize_weather_params(params(&[("latitude", ""), ("lat", "4"), ("lon", "5")]))
            .unwrap();
        assert_eq!(out, params(&[("latitude", "4"), ("longitude", "5")]));
    }

    #[test]
    fn test_missing_coordinates() {
        for input in [
            params(&[]),
            params(&[("lat", "1")]),
            params(&[("lon", "2")]),
            params(&[("lat", ""), ("lon", "2")]),
        ] {
            assert!(matches!(
                normalize_weather_params(input),
                Err(ProxyError::MissingParameters(_))
            ));
        }
    }

    #[test]
    fn test_split_endpoint_default() {
        let (endpoint, rest) = split_endpoint(params(&[("latitude", "1")]));
        assert_eq!(endpoint, DEFAULT_ENDPOINT);
        assert_eq!(rest, params(&[("latitude", "1")]));
    }

    #[test]
    fn test_split_endpoint_removes_param() {
        let (endpoint, rest) = split_endpoint(params(&[("endpoint", "archive"), ("start_date", "2024-01-01")]));
        assert_eq!(endpoint, "archive");
        assert_eq!(rest, params(&[("start_date", "2024-01-01")]));
    }
}
