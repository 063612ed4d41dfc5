//! Integration tests for the provider adapters using wiremock HTTP mocks.

use std::time::Duration;

use tokio::time::Instant;
use woonlens_core::{AddressKey, Coordinates, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};
use woonlens_sources::{
    fetch_air_quality, fetch_amenities, fetch_demographics, fetch_energy_label,
    fetch_market_value, fetch_parking, fetch_weather,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> Fetcher {
    Fetcher::new(5, "woonlens-test/0.1", 0, 0).expect("client construction should not fail")
}

fn deadline() -> Instant {
    Instant::now() + Duration::from_secs(10)
}

fn here() -> Coordinates {
    Coordinates {
        longitude: 5.0693,
        latitude: 52.1083,
    }
}

#[tokio::test]
async fn demographics_multiplies_thousands_into_euros() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "value": [{
            "AantalInwoners_5": 8750.0,
            "HuishoudensTotaal_28": 4100.0,
            "Bevolkingsdichtheid_33": 3200.0,
            "GemiddeldInkomenPerInwoner_66": 42.5,
            "GemiddeldeWOZWaardeVanWoningen_35": 312.0,
            "HuishoudensMetEenLaagInkomen_70": 8.0,
            "Koopwoningen_40": 38.2
        }]
    });
    Mock::given(method("GET"))
        .and(path("/TypedDataSet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        cbs_odata_url: Some(server.uri()),
        ..SourceEndpoints::default()
    };
    let d = fetch_demographics(&fetcher(), &cfg, deadline(), "BU03441104")
        .await
        .expect("should fetch");

    assert_eq!(d.avg_income, Some(42_500.0));
    assert_eq!(d.population_density, Some(3200));
    assert_eq!(d.avg_woz_value, Some(312_000.0));
    assert_eq!(d.low_income_households, Some(328));
}

#[tokio::test]
async fn demographics_without_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})))
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        cbs_odata_url: Some(server.uri()),
        ..SourceEndpoints::default()
    };
    let result = fetch_demographics(&fetcher(), &cfg, deadline(), "BU99999999").await;
    assert!(matches!(result, Err(SourceError::NotFound { .. })));
}

#[tokio::test]
async fn weather_averages_the_daily_series() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "daily": {
            "temperature_2m_mean": [10.0, 12.0],
            "sunshine_duration": [3600.0, 7200.0],
            "precipitation_sum": [0.0, 2.0],
            "wind_speed_10m_max": [4.0, 6.0]
        }
    });
    Mock::given(method("GET"))
        .and(query_param("timezone", "UTC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        open_meteo_url: Some(server.uri()),
        ..SourceEndpoints::default()
    };
    let w = fetch_weather(&fetcher(), &cfg, deadline(), here())
        .await
        .expect("should fetch");
    assert_eq!(w.avg_temperature_c, Some(11.0));
    assert_eq!(w.sunshine_hours, Some(1.5), "5400 s averages to 1.5 h");
}

#[tokio::test]
async fn air_quality_resolves_station_then_measurements() {
    let server = MockServer::start().await;
    let stations = serde_json::json!({
        "data": [
            {"number": "NL10636", "location": "Utrecht-Kardinaal de Jongweg",
             "latitude": 52.1050, "longitude": 5.1240},
            {"number": "NL10636-far", "location": "Vredepeel",
             "latitude": 51.5405, "longitude": 5.8531}
        ]
    });
    let measurements = serde_json::json!({
        "data": [
            {"formula": "PM25", "value": 12.0},
            {"formula": "PM10", "value": 18.5},
            {"formula": "NO2", "value": 22.1}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/stations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&stations))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/measurements"))
        .and(query_param("station_number", "NL10636"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&measurements))
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        luchtmeetnet_url: Some(server.uri()),
        ..SourceEndpoints::default()
    };
    let aq = fetch_air_quality(&fetcher(), &cfg, deadline(), here())
        .await
        .expect("should fetch");

    assert_eq!(aq.station.as_deref(), Some("Utrecht-Kardinaal de Jongweg"));
    assert_eq!(aq.pm25, Some(12.0));
    assert_eq!(aq.aqi, Some(50.0));
    assert_eq!(aq.category.as_deref(), Some("Good"));
}

#[tokio::test]
async fn energy_label_sends_the_raw_key_in_authorization() {
    let server = MockServer::start().await;
    let body = serde_json::json!([{
        "labelLetter": "C",
        "energieindex": 1.4,
        "registratiedatum": "2021-03-15",
        "geldigTot": "2031-03-15"
    }]);
    Mock::given(method("GET"))
        .and(header("authorization", "ep-key-123"))
        .and(query_param("postcode", "3541ED"))
        .and(query_param("huisnummer", "53"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        ep_online_url: Some(server.uri()),
        ep_online_api_key: Some("ep-key-123".to_owned()),
        ..SourceEndpoints::default()
    };
    let key = AddressKey::new("3541ED", "53");
    let label = fetch_energy_label(&fetcher(), &cfg, deadline(), &key)
        .await
        .expect("should fetch");
    assert_eq!(label.label.as_deref(), Some("C"));
    assert_eq!(label.energy_index, Some(1.4));
}

#[tokio::test]
async fn energy_label_without_key_is_disabled() {
    let cfg = SourceEndpoints {
        ep_online_url: Some("http://unused.test".to_owned()),
        ..SourceEndpoints::default()
    };
    let key = AddressKey::new("3541ED", "53");
    let result = fetch_energy_label(&fetcher(), &cfg, deadline(), &key).await;
    assert!(matches!(result, Err(SourceError::ConfigMissing)));
}

#[tokio::test]
async fn parking_authenticates_with_the_query_token() {
    let server = MockServer::start().await;
    let body = serde_json::json!([{
        "areadesc": "P1 Centrum",
        "location": {"latitude": "52.1080", "longitude": "5.0690"},
        "capacity": "350"
    }]);
    Mock::given(method("GET"))
        .and(query_param("$$app_token", "rdw-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        rdw_parking_url: Some(server.uri()),
        rdw_app_token: Some("rdw-token".to_owned()),
        ..SourceEndpoints::default()
    };
    let parking = fetch_parking(&fetcher(), &cfg, deadline(), here())
        .await
        .expect("should fetch");
    assert_eq!(parking.garages.len(), 1);
    assert_eq!(parking.garages[0].capacity, Some(350));
    assert!(parking.nearest_distance_m.unwrap() < 100.0);
}

#[tokio::test]
async fn market_value_posts_json_with_dual_headers() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "avm": {
            "value": 450_000,
            "value_low": 420_000,
            "value_high": 480_000,
            "confidence": 0.82,
            "valuation_date": "2025-07-01"
        }
    });
    Mock::given(method("POST"))
        .and(header("x-app-id", "app-id"))
        .and(header("x-app-key", "app-key"))
        .and(body_string_contains("\"post_code\":\"3541ED\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        altum_url: Some(server.uri()),
        altum_app_id: Some("app-id".to_owned()),
        altum_app_key: Some("app-key".to_owned()),
        ..SourceEndpoints::default()
    };
    let key = AddressKey::new("3541 ED", "53");
    let value = fetch_market_value(&fetcher(), &cfg, deadline(), &key)
        .await
        .expect("should fetch");
    assert_eq!(value.estimate_eur, Some(450_000));
    assert_eq!(value.confidence, Some(0.82));
}

#[tokio::test]
async fn amenities_scores_and_truncates_the_facility_list() {
    let server = MockServer::start().await;
    // 25 cafes immediately around the address: count caps, list truncates.
    let elements: Vec<serde_json::Value> = (0..25)
        .map(|i| {
            serde_json::json!({
                "type": "node",
                "lat": 52.1083 + f64::from(i) * 0.00001,
                "lon": 5.0693,
                "tags": {"amenity": "cafe", "name": format!("Cafe {i}")}
            })
        })
        .collect();
    Mock::given(method("POST"))
        .and(body_string_contains("around%3A1500"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"elements": elements})),
        )
        .mount(&server)
        .await;

    let cfg = SourceEndpoints {
        overpass_url: Some(server.uri()),
        ..SourceEndpoints::default()
    };
    let amenities = fetch_amenities(&fetcher(), &cfg, deadline(), here())
        .await
        .expect("should fetch");

    assert_eq!(amenities.facilities.len(), 20, "list truncates to top 20");
    assert_eq!(amenities.category_count, 1);
    // 8*1 + min(30, 2*25) + ~30 proximity points
    assert!(amenities.score > 65.0 && amenities.score <= 68.0, "score: {}", amenities.score);
    let distances: Vec<f64> = amenities.facilities.iter().map(|f| f.distance_m).collect();
    let mut sorted = distances.clone();
    sorted.sort_by(f64::total_cmp);
    assert_eq!(distances, sorted, "facilities are distance-sorted");
}
