//! Tests de integración del formato wire del ticket digital:
//! round-trip campo a campo y sensibilidad a manipulación bit a bit.

use transit_ticketing::models::fare::TicketTypeAttr;
use transit_ticketing::services::digital_ticket::{
    verify, DigitalTicket, TicketSigner, FIXED_PART_SIZE, SIGNATURE_SIZE,
};
use transit_ticketing::utils::base91;

struct Case {
    ticket_id: u32,
    pickup: u32,
    dropping: u32,
    types: Vec<(u8, u8)>,
}

fn cases() -> Vec<Case> {
    vec![
        Case { ticket_id: 1, pickup: 1, dropping: 2, types: vec![(1, 1)] },
        Case { ticket_id: 42, pickup: 10, dropping: 30, types: vec![(1, 2), (3, 1)] },
        Case { ticket_id: 7, pickup: 5, dropping: 5, types: vec![] },
        Case {
            ticket_id: 123_456_789,
            pickup: 65_000,
            dropping: 70_000,
            types: vec![(1, 255), (2, 1), (3, 7), (200, 9)],
        },
        Case {
            ticket_id: u32::MAX,
            pickup: 0,
            dropping: u32::MAX,
            types: vec![(255, 255)],
        },
    ]
}

#[test]
fn decode_of_encode_preserves_every_field() {
    let signer = TicketSigner::generate();
    for case in cases() {
        let ticket = signer.create_ticket(case.ticket_id, case.pickup, case.dropping, &case.types);
        let token = ticket.to_token();

        assert!(token.starts_with('1'));
        assert!(token.is_ascii());

        let loaded = DigitalTicket::load(&token).unwrap();
        assert_eq!(loaded.ticket_id(), case.ticket_id);
        assert_eq!(loaded.pickup_point(), case.pickup);
        assert_eq!(loaded.dropping_point(), case.dropping);
        assert_eq!(loaded.type_counts(), case.types);
        assert_eq!(loaded.signature, ticket.signature);
        assert_eq!(loaded.body, ticket.body);
    }
}

#[test]
fn every_token_verifies_with_the_right_key() {
    let signer = TicketSigner::generate();
    let public_pem = signer.public_key_pem().unwrap();
    for case in cases() {
        let ticket = signer.create_ticket(case.ticket_id, case.pickup, case.dropping, &case.types);
        let loaded = DigitalTicket::load(&ticket.to_token()).unwrap();
        assert!(verify(&loaded, &public_pem));
    }
}

#[test]
fn flipping_any_single_bit_of_the_payload_breaks_verification() {
    let signer = TicketSigner::generate();
    let public_pem = signer.public_key_pem().unwrap();
    let ticket = signer.create_ticket(42, 10, 30, &[(1, 2), (3, 1)]);

    let mut payload = ticket.signature.clone();
    payload.extend_from_slice(&ticket.body);

    for byte_index in 0..payload.len() {
        for bit in 0..8 {
            let mut tampered_payload = payload.clone();
            tampered_payload[byte_index] ^= 1 << bit;

            let token = format!("1{}", base91::encode(&tampered_payload));
            // o el token ya no decodifica, o la firma no verifica
            match DigitalTicket::load(&token) {
                Ok(tampered) => assert!(
                    !verify(&tampered, &public_pem),
                    "bit {} del byte {} sobrevivió a la manipulación",
                    bit,
                    byte_index
                ),
                Err(_) => {}
            }
        }
    }
}

#[test]
fn verification_is_bound_to_the_service_keypair() {
    let signer = TicketSigner::generate();
    let impostor = TicketSigner::generate();
    let ticket = signer.create_ticket(1, 2, 3, &[(1, 1)]);

    assert!(verify(&ticket, &signer.public_key_pem().unwrap()));
    assert!(!verify(&ticket, &impostor.public_key_pem().unwrap()));
}

#[test]
fn expand_produces_the_full_ticket_view() {
    let signer = TicketSigner::generate();
    let ticket = signer.create_ticket(42, 10, 30, &[(1, 2), (3, 1)]);
    let loaded = DigitalTicket::load(&ticket.to_token()).unwrap();

    let declared = vec![
        TicketTypeAttr { id: 1, name: "Adult".to_string() },
        TicketTypeAttr { id: 2, name: "Child".to_string() },
        TicketTypeAttr { id: 3, name: "Student".to_string() },
    ];
    let expanded = loaded.expand(&declared);

    assert_eq!(expanded.id, 42);
    assert_eq!(expanded.pickup_point, 10);
    assert_eq!(expanded.dropping_point, 30);

    let counts: Vec<(String, u8)> = expanded
        .ticket_types
        .iter()
        .map(|t| (t.name.clone(), t.count))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Adult".to_string(), 2),
            ("Child".to_string(), 0),
            ("Student".to_string(), 1),
        ]
    );
}

#[test]
fn signature_and_fixed_part_sizes_match_the_wire_format() {
    let signer = TicketSigner::generate();
    let ticket = signer.create_ticket(1, 2, 3, &[(1, 1), (2, 2)]);
    assert_eq!(ticket.signature.len(), SIGNATURE_SIZE);
    assert_eq!(ticket.body.len(), FIXED_PART_SIZE + 2 * 2);
}

#[test]
fn tokens_from_different_services_do_not_cross_verify() {
    let service_a = TicketSigner::generate();
    let service_b = TicketSigner::generate();

    let ticket_a = service_a.create_ticket(1, 10, 20, &[(1, 1)]);
    let ticket_b = service_b.create_ticket(1, 10, 20, &[(1, 1)]);

    let key_a = service_a.public_key_pem().unwrap();
    let key_b = service_b.public_key_pem().unwrap();

    assert!(verify(&ticket_a, &key_a));
    assert!(verify(&ticket_b, &key_b));
    assert!(!verify(&ticket_a, &key_b));
    assert!(!verify(&ticket_b, &key_a));
}
