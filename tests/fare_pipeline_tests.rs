//! Tests de integración del pipeline de tarifas: validador de definiciones,
//! sandbox y resolución de importes sobre el escenario sembrado del sistema.

use serde_json::json;

use transit_ticketing::models::fare::{FareAttributes, TicketTypeAttr};
use transit_ticketing::models::paper_ticket::TicketTypeCount;
use transit_ticketing::models::route::{LandmarkSnapshot, RouteSnapshot};
use transit_ticketing::services::fare_script::FareScriptEngine;
use transit_ticketing::services::fare_validation::validate_fare_definition;
use transit_ticketing::services::pricing;
use transit_ticketing::utils::errors::AppError;

/// Script sembrado: Adult base 10 hasta 2.5 km y 1/km después; Child a
/// mitad de Adult; Student por tramos.
const SEEDED_SCRIPT: &str = r#"
    function getFare(ticketType, distance) {
        var km = distance / 1000;
        function adult() {
            if (km <= 2.5) return 10;
            return 10 + (km - 2.5) * 1;
        }
        if (ticketType === 'Adult') return adult();
        if (ticketType === 'Child') return adult() / 2;
        if (ticketType === 'Student') {
            if (km <= 2.5) return 1;
            if (km <= 7.5) return 2;
            if (km <= 17.5) return 3;
            if (km <= 27.5) return 4;
            return 5;
        }
        return -1;
    }
"#;

fn seeded_attributes() -> FareAttributes {
    FareAttributes {
        df_version: 1,
        ticket_types: vec![
            TicketTypeAttr { id: 1, name: "Adult".to_string() },
            TicketTypeAttr { id: 2, name: "Child".to_string() },
            TicketTypeAttr { id: 3, name: "Student".to_string() },
        ],
        currency_type: "INR".to_string(),
        distance_unit: "m".to_string(),
        extra: json!({}),
    }
}

fn engine() -> FareScriptEngine {
    FareScriptEngine::new(1000, 10 * 1024 * 1024)
}

fn five_km_route() -> RouteSnapshot {
    RouteSnapshot {
        id: 1,
        name: "Varkala -> Paravoor".to_string(),
        landmarks: vec![
            LandmarkSnapshot {
                landmark_id: 10,
                distance_from_start: 0,
                arrival_delta: 0,
                departure_delta: 0,
            },
            LandmarkSnapshot {
                landmark_id: 20,
                distance_from_start: 5000,
                arrival_delta: 15,
                departure_delta: 15,
            },
        ],
    }
}

#[test]
fn seeded_fare_definition_passes_the_validator() {
    assert!(validate_fare_definition(&engine(), SEEDED_SCRIPT, &seeded_attributes()).is_ok());
}

#[test]
fn sentinel_holds_for_arbitrary_unknown_names() {
    let e = engine();
    for name in ["Senior", "xyzzy", "ADULT", "adult ", ""] {
        assert_eq!(
            e.evaluate(SEEDED_SCRIPT, name, 0.0).unwrap(),
            -1.0,
            "name={:?}",
            name
        );
        assert_eq!(e.evaluate(SEEDED_SCRIPT, name, 1.0).unwrap(), -1.0);
    }
}

#[test]
fn declared_types_price_non_negative_at_validation_distances() {
    let e = engine();
    for t in &seeded_attributes().ticket_types {
        for d in [0.0, 1.0] {
            assert!(e.evaluate(SEEDED_SCRIPT, &t.name, d).unwrap() >= 0.0);
        }
    }
}

#[test]
fn full_ticket_amount_at_five_km() {
    // distancia derivada del snapshot, nunca del cliente
    let distance = pricing::resolve_distance(&five_km_route(), 10, 20).unwrap();
    assert_eq!(distance, 5000);

    let requested = vec![TicketTypeCount {
        name: "Adult".to_string(),
        count: 2,
    }];
    let total = pricing::compute_total(
        &engine(),
        &seeded_attributes(),
        SEEDED_SCRIPT,
        &requested,
        distance,
    )
    .unwrap();

    assert_eq!(total, 25.0);
    assert!(pricing::cross_check_amount(total, 25.0).is_ok());
    // cualquier otro importe declarado se rechaza
    for wrong in [24.999999, 25.000001, 0.0, 50.0] {
        assert!(matches!(
            pricing::cross_check_amount(total, wrong).unwrap_err(),
            AppError::InvalidValue("amount")
        ));
    }
}

#[test]
fn validator_rejects_scripts_that_break_the_sentinel_law() {
    let pricing_everything = "function getFare(t, d) { return 3; }";
    assert!(matches!(
        validate_fare_definition(&engine(), pricing_everything, &seeded_attributes()).unwrap_err(),
        AppError::InvalidFareFunction
    ));
}

#[test]
fn validator_rejects_scripts_with_negative_known_prices() {
    let negative_child = r#"
        function getFare(ticketType, distance) {
            if (ticketType === 'Adult') return 10;
            if (ticketType === 'Child') return -5;
            if (ticketType === 'Student') return 1;
            return -1;
        }
    "#;
    assert!(matches!(
        validate_fare_definition(&engine(), negative_child, &seeded_attributes()).unwrap_err(),
        AppError::UnknownTicketType(name) if name == "Child"
    ));
}

#[test]
fn hostile_scripts_are_killed_not_trusted() {
    let spin = "function getFare(t, d) { for (;;) {} }";
    let err = FareScriptEngine::new(100, 10 * 1024 * 1024)
        .evaluate(spin, "Adult", 0.0)
        .unwrap_err();
    assert!(matches!(err, AppError::JsTimeLimitExceeded));

    let hog = r#"
        function getFare(t, d) {
            var blocks = [];
            for (;;) blocks.push(new Array(16384).fill(d));
        }
    "#;
    let err = FareScriptEngine::new(10_000, 2 * 1024 * 1024)
        .evaluate(hog, "Adult", 0.0)
        .unwrap_err();
    assert!(matches!(err, AppError::JsMemoryLimitExceeded));
}
