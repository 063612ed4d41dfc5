//! Scores derived from the composite record.
//!
//! Pure arithmetic over whatever the sources delivered; absent data leaves a
//! component at its neutral base. Called exactly once per request, after
//! aggregation and before the record is returned.

use woonlens_core::{CompositeRecord, FloodRisk, Scores};

/// Computes the three partial scores, the overall blend, the risk level, and
/// the recommendations slice. Deterministic and side-effect-free.
#[must_use]
pub fn compute_scores(record: &CompositeRecord) -> Scores {
    let esg = esg_score(record);
    let profit = profit_score(record);
    let opportunity = opportunity_score(record);
    let overall = round1((esg + profit + opportunity) / 3.0);

    Scores {
        esg: round1(esg),
        profit: round1(profit),
        opportunity: round1(opportunity),
        overall,
        risk_level: risk_level(record).to_owned(),
        recommendations: recommendations(record),
    }
}

fn esg_score(record: &CompositeRecord) -> f64 {
    let mut score = record
        .energy_label
        .label
        .as_deref()
        .map_or(50.0, label_points);

    if let Some(aqi) = record.air_quality.aqi {
        if aqi <= 50.0 {
            score += 10.0;
        } else if aqi > 100.0 {
            score -= 10.0;
        }
    }
    if record.noise.exceeds_limit {
        score -= 10.0;
    }
    match record.flood_risk.risk {
        Some(FloodRisk::High) => score -= 15.0,
        Some(FloodRisk::Medium) => score -= 5.0,
        _ => {}
    }
    if record
        .solar
        .estimated_yield_kwh
        .is_some_and(|kwh| kwh >= 2000.0)
    {
        score += 10.0;
    }

    score.clamp(0.0, 100.0)
}

fn label_points(label: &str) -> f64 {
    // Registered labels run A+++ down to G; the letter alone sets the tier.
    match label.chars().next() {
        Some('A') => 90.0,
        Some('B') => 80.0,
        Some('C') => 65.0,
        Some('D') => 50.0,
        Some('E') => 40.0,
        Some('F') => 30.0,
        Some('G') => 20.0,
        _ => 50.0,
    }
}

fn profit_score(record: &CompositeRecord) -> f64 {
    let mut score: f64 = 50.0;

    if let (Some(estimate), Some(woz)) = (
        record.market_value.estimate_eur,
        record.woz.value_eur,
    ) {
        if woz > 0 {
            #[allow(clippy::cast_precision_loss)]
            let ratio = estimate as f64 / woz as f64;
            if ratio >= 1.2 {
                score += 20.0;
            } else if ratio >= 1.05 {
                score += 10.0;
            } else if ratio < 0.95 {
                score -= 10.0;
            }
        }
    }

    if let Some(income) = record.demographics.avg_income {
        if income >= 40_000.0 {
            score += 10.0;
        } else if income >= 30_000.0 {
            score += 5.0;
        }
    }
    if record
        .demographics
        .owner_occupied_pct
        .is_some_and(|pct| pct >= 60.0)
    {
        score += 5.0;
    }

    score.clamp(0.0, 100.0)
}

fn opportunity_score(record: &CompositeRecord) -> f64 {
    let mut score = 40.0;

    score += (record.amenities.score / 5.0).min(20.0);

    if let Some(distance) = record.transit.nearest_stop_distance_m {
        if distance <= 300.0 {
            score += 10.0;
        } else if distance <= 600.0 {
            score += 5.0;
        }
    }
    if record.schools.count_within_1km >= 2 {
        score += 5.0;
    }
    if record.monuments.count_within_500m > 0 {
        score += 5.0;
    }
    if !record.parking.garages.is_empty() {
        score += 5.0;
    }

    score.clamp(0.0, 100.0)
}

fn risk_level(record: &CompositeRecord) -> &'static str {
    let flood_high = record.flood_risk.risk == Some(FloodRisk::High);
    let very_loud = record.noise.category.as_deref() == Some("Very Loud");
    let unsafe_area = record.safety.label.as_deref() == Some("Unsafe");
    if flood_high || very_loud || unsafe_area {
        return "High";
    }

    let flood_medium = record.flood_risk.risk == Some(FloodRisk::Medium);
    let loud = record.noise.exceeds_limit;
    let moderate_area = record.safety.label.as_deref() == Some("Moderate");
    if flood_medium || loud || moderate_area {
        return "Medium";
    }

    "Low"
}

fn recommendations(record: &CompositeRecord) -> Vec<String> {
    let mut out = Vec::new();

    if record
        .energy_label
        .label
        .as_deref()
        .is_some_and(|l| matches!(l.chars().next(), Some('D'..='G')))
    {
        out.push(
            "Energy label D or worse depresses both value and sustainability; budget for insulation."
                .to_owned(),
        );
    }
    if record.flood_risk.risk == Some(FloodRisk::High) {
        out.push(
            "The parcel sits well below NAP; verify local flood protection and insurance terms."
                .to_owned(),
        );
    }
    if record.noise.exceeds_limit {
        out.push(
            "Noise load exceeds the preferred residential limit; consider acoustic glazing."
                .to_owned(),
        );
    }
    if record.amenities.score > 0.0 && record.amenities.score < 30.0 {
        out.push("Few amenities within walking distance.".to_owned());
    }
    if let (Some(estimate), Some(woz)) = (record.market_value.estimate_eur, record.woz.value_eur) {
        #[allow(clippy::cast_precision_loss)]
        if woz > 0 && estimate as f64 / woz as f64 >= 1.2 {
            out.push(
                "Assessed value lags the market estimate; expect an upward WOZ correction."
                    .to_owned(),
            );
        }
    }

    if out.is_empty() {
        out.push("No specific concerns identified.".to_owned());
    }
    out
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use woonlens_core::{
        AddressRecord, AirQuality, Coordinates, EnergyLabel, FloodInfo, Identifiers, Noise,
    };

    fn base_record() -> CompositeRecord {
        CompositeRecord::empty(AddressRecord {
            display_name: "Teststraat 1".to_owned(),
            street: "Teststraat".to_owned(),
            house_number: "1".to_owned(),
            postcode: "3541ED".to_owned(),
            city: "Utrecht".to_owned(),
            coordinates: Coordinates {
                longitude: 5.0693,
                latitude: 52.1083,
            },
            geojson: serde_json::Value::Null,
            identifiers: Identifiers::default(),
            municipality: "Utrecht".to_owned(),
            municipality_code: "GM0344".to_owned(),
            province: "Utrecht".to_owned(),
            province_code: "PV26".to_owned(),
        })
    }

    #[test]
    fn scoring_is_deterministic() {
        let record = base_record();
        assert_eq!(compute_scores(&record), compute_scores(&record));
    }

    #[test]
    fn empty_record_scores_stay_in_range() {
        let scores = compute_scores(&base_record());
        for value in [scores.esg, scores.profit, scores.opportunity, scores.overall] {
            assert!((0.0..=100.0).contains(&value), "out of range: {value}");
        }
        assert_eq!(scores.risk_level, "Low");
        assert_eq!(scores.recommendations, vec!["No specific concerns identified."]);
    }

    #[test]
    fn good_label_and_air_raise_esg() {
        let mut record = base_record();
        record.energy_label = EnergyLabel {
            label: Some("A".to_owned()),
            ..EnergyLabel::default()
        };
        record.air_quality = AirQuality {
            aqi: Some(42.0),
            ..AirQuality::default()
        };
        let scores = compute_scores(&record);
        assert!(scores.esg > compute_scores(&base_record()).esg);
    }

    #[test]
    fn high_flood_risk_sets_high_risk_level_and_a_recommendation() {
        let mut record = base_record();
        record.flood_risk = FloodInfo {
            elevation_m: Some(-2.5),
            risk: Some(woonlens_core::FloodRisk::High),
        };
        let scores = compute_scores(&record);
        assert_eq!(scores.risk_level, "High");
        assert!(scores
            .recommendations
            .iter()
            .any(|r| r.contains("below NAP")));
    }

    #[test]
    fn noise_over_limit_is_medium_risk() {
        let mut record = base_record();
        record.noise = Noise {
            total_db: Some(58.0),
            category: Some("Loud".to_owned()),
            exceeds_limit: true,
            ..Noise::default()
        };
        let scores = compute_scores(&record);
        assert_eq!(scores.risk_level, "Medium");
    }

    #[test]
    fn overall_is_the_rounded_mean_of_the_components() {
        let scores = compute_scores(&base_record());
        let expected = ((scores.esg + scores.profit + scores.opportunity) / 3.0 * 10.0).round()
            / 10.0;
        assert!((scores.overall - expected).abs() < 0.11);
    }

    #[test]
    fn label_points_handle_plus_variants() {
        assert!((label_points("A+++") - 90.0).abs() < 1e-9);
        assert!((label_points("G") - 20.0).abs() < 1e-9);
        assert!((label_points("?") - 50.0).abs() < 1e-9);
    }
}
