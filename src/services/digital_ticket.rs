//! Ticket digital: codec binario + firma ECDSA
//!
//! El ticket digital es un artefacto derivado, nunca una fila: un cuerpo
//! binario compacto (parte fija de 12 bytes + pares tipo/cantidad) firmado
//! con la clave ECDSA P-256 del servicio y serializado como
//! `"1" + basE91(firma ‖ cuerpo)`. El dispositivo validador externo solo
//! necesita la clave pública del servicio y este módulo para decodificar,
//! verificar y expandir el token sin conexión.

use p256::ecdsa::signature::{DigestSigner, DigestVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::models::fare::TicketTypeAttr;
use crate::utils::base91;
use crate::utils::errors::{AppError, AppResult};

/// Ancho fijo de la firma: r ‖ s, 32 bytes big-endian cada uno (P-256)
pub const SIGNATURE_SIZE: usize = 64;

/// Parte fija del cuerpo: ticket id, pickup y dropping como u32 big-endian
pub const FIXED_PART_SIZE: usize = 12;

/// Dígito de versión del formato wire
const TICKET_VERSION: char = '1';

// ---------------------------------------------------------------------------
// Frontera firma cruda <-> objeto de firma
//
// El backend ECDSA produce objetos `Signature`; el formato wire transporta
// los enteros r y s a ancho fijo, no la forma ASN.1 DER. Estas dos funciones
// son el único punto donde se convierte entre ambos mundos: cambiar de curva
// o de formato no toca el layout del cuerpo.
// ---------------------------------------------------------------------------

fn raw_signature(signature: &Signature) -> [u8; SIGNATURE_SIZE] {
    let mut raw = [0u8; SIGNATURE_SIZE];
    raw.copy_from_slice(signature.to_bytes().as_slice());
    raw
}

fn signature_from_raw(raw: &[u8]) -> Option<Signature> {
    Signature::from_slice(raw).ok()
}

/// Ticket digital decodificado o recién firmado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalTicket {
    pub signature: Vec<u8>,
    pub body: Vec<u8>,
}

/// Tipo de ticket con su cantidad tras expandir el cuerpo
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExpandedTicketType {
    pub id: u8,
    pub name: String,
    pub count: u8,
}

/// Vista completa del ticket tras mezclar el cuerpo con la tabla de tipos
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExpandedTicket {
    pub id: u32,
    pub pickup_point: u32,
    pub dropping_point: u32,
    pub ticket_types: Vec<ExpandedTicketType>,
}

impl DigitalTicket {
    /// Serializar a token de texto: dígito de versión + basE91(firma ‖ cuerpo)
    pub fn to_token(&self) -> String {
        let mut payload = Vec::with_capacity(self.signature.len() + self.body.len());
        payload.extend_from_slice(&self.signature);
        payload.extend_from_slice(&self.body);
        format!("{}{}", TICKET_VERSION, base91::encode(&payload))
    }

    /// Deserializar un token de texto
    pub fn load(token: &str) -> AppResult<Self> {
        let mut chars = token.chars();
        match chars.next() {
            Some(TICKET_VERSION) => {}
            Some(_) => return Err(AppError::MalformedTicket("unsupported ticket version")),
            None => return Err(AppError::MalformedTicket("empty token")),
        }

        let payload = base91::decode(chars.as_str())?;
        if payload.len() < SIGNATURE_SIZE + FIXED_PART_SIZE {
            return Err(AppError::MalformedTicket("truncated payload"));
        }
        let (signature, body) = payload.split_at(SIGNATURE_SIZE);
        if (body.len() - FIXED_PART_SIZE) % 2 != 0 {
            return Err(AppError::MalformedTicket("dangling ticket type byte"));
        }

        Ok(Self {
            signature: signature.to_vec(),
            body: body.to_vec(),
        })
    }

    pub fn ticket_id(&self) -> u32 {
        u32::from_be_bytes(self.body[0..4].try_into().expect("fixed part"))
    }

    pub fn pickup_point(&self) -> u32 {
        u32::from_be_bytes(self.body[4..8].try_into().expect("fixed part"))
    }

    pub fn dropping_point(&self) -> u32 {
        u32::from_be_bytes(self.body[8..12].try_into().expect("fixed part"))
    }

    /// Pares `(type_id, count)` de la parte variable
    pub fn type_counts(&self) -> Vec<(u8, u8)> {
        self.body[FIXED_PART_SIZE..]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    /// Mezclar el cuerpo decodificado con la tabla de tipos declarada por la
    /// tarifa, produciendo la vista completa del ticket. Los tipos sin par
    /// en el cuerpo quedan con cantidad 0.
    pub fn expand(&self, declared: &[TicketTypeAttr]) -> ExpandedTicket {
        let counts = self.type_counts();
        let ticket_types = declared
            .iter()
            .map(|attr| ExpandedTicketType {
                id: attr.id,
                name: attr.name.clone(),
                count: counts
                    .iter()
                    .find(|(id, _)| *id == attr.id)
                    .map(|(_, count)| *count)
                    .unwrap_or(0),
            })
            .collect();

        ExpandedTicket {
            id: self.ticket_id(),
            pickup_point: self.pickup_point(),
            dropping_point: self.dropping_point(),
            ticket_types,
        }
    }
}

/// Firmante de tickets de un servicio: posee el par de claves ECDSA P-256
pub struct TicketSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl TicketSigner {
    /// Generar un par de claves nuevo (una sola vez, al crear el servicio)
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruir el firmante desde la clave privada PEM del servicio
    pub fn from_private_pem(pem: &str) -> AppResult<Self> {
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| AppError::Internal(format!("cannot load private key: {}", e)))?;
        let verifying_key = VerifyingKey::from(&signing_key);
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    pub fn private_key_pem(&self) -> AppResult<String> {
        let pem = self
            .signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AppError::Internal(format!("cannot encode private key: {}", e)))?;
        Ok(pem.as_str().to_owned())
    }

    pub fn public_key_pem(&self) -> AppResult<String> {
        self.verifying_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AppError::Internal(format!("cannot encode public key: {}", e)))
    }

    /// Construir y firmar el cuerpo binario del ticket.
    ///
    /// Los tipos con cantidad 0 no viajan en el cuerpo.
    pub fn create_ticket(
        &self,
        ticket_id: u32,
        pickup_point: u32,
        dropping_point: u32,
        ticket_types: &[(u8, u8)],
    ) -> DigitalTicket {
        let mut body = Vec::with_capacity(FIXED_PART_SIZE + ticket_types.len() * 2);
        body.extend_from_slice(&ticket_id.to_be_bytes());
        body.extend_from_slice(&pickup_point.to_be_bytes());
        body.extend_from_slice(&dropping_point.to_be_bytes());
        for &(type_id, count) in ticket_types {
            if count > 0 {
                body.push(type_id);
                body.push(count);
            }
        }

        // ECDSA sobre SHA-256 del cuerpo, como el formato exige
        let signature: Signature = self
            .signing_key
            .sign_digest(Sha256::new_with_prefix(&body));
        DigitalTicket {
            signature: raw_signature(&signature).to_vec(),
            body,
        }
    }
}

/// Verificar la firma de un ticket con una clave pública PEM.
///
/// Devuelve `false` ante cualquier problema (clave ilegible, firma fuera de
/// rango, cuerpo alterado): el dispositivo validador consume un booleano,
/// nunca una excepción.
pub fn verify(ticket: &DigitalTicket, public_key_pem: &str) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_public_key_pem(public_key_pem) else {
        return false;
    };
    let Some(signature) = signature_from_raw(&ticket.signature) else {
        return false;
    };
    verifying_key
        .verify_digest(Sha256::new_with_prefix(&ticket.body), &signature)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ticket(signer: &TicketSigner) -> DigitalTicket {
        signer.create_ticket(77, 10, 30, &[(1, 2), (3, 1)])
    }

    #[test]
    fn body_layout_is_fixed_plus_pairs() {
        let signer = TicketSigner::generate();
        let ticket = sample_ticket(&signer);
        assert_eq!(ticket.body.len(), FIXED_PART_SIZE + 4);
        assert_eq!(ticket.signature.len(), SIGNATURE_SIZE);
        assert_eq!(&ticket.body[0..4], &77u32.to_be_bytes());
        assert_eq!(&ticket.body[4..8], &10u32.to_be_bytes());
        assert_eq!(&ticket.body[8..12], &30u32.to_be_bytes());
        assert_eq!(&ticket.body[12..], &[1, 2, 3, 1]);
    }

    #[test]
    fn zero_count_types_do_not_travel() {
        let signer = TicketSigner::generate();
        let ticket = signer.create_ticket(1, 2, 3, &[(1, 0), (2, 5)]);
        assert_eq!(ticket.type_counts(), vec![(2, 5)]);
    }

    #[test]
    fn token_round_trip_preserves_every_field() {
        let signer = TicketSigner::generate();
        let ticket = sample_ticket(&signer);
        let token = ticket.to_token();

        let loaded = DigitalTicket::load(&token).unwrap();
        assert_eq!(loaded, ticket);
        assert_eq!(loaded.ticket_id(), 77);
        assert_eq!(loaded.pickup_point(), 10);
        assert_eq!(loaded.dropping_point(), 30);
        assert_eq!(loaded.type_counts(), vec![(1, 2), (3, 1)]);
    }

    #[test]
    fn signature_verifies_with_matching_key_only() {
        let signer = TicketSigner::generate();
        let other = TicketSigner::generate();
        let ticket = sample_ticket(&signer);

        assert!(verify(&ticket, &signer.public_key_pem().unwrap()));
        assert!(!verify(&ticket, &other.public_key_pem().unwrap()));
        assert!(!verify(&ticket, "not a pem"));
    }

    #[test]
    fn signer_round_trips_through_pem() {
        let signer = TicketSigner::generate();
        let restored = TicketSigner::from_private_pem(&signer.private_key_pem().unwrap()).unwrap();
        let ticket = restored.create_ticket(5, 1, 2, &[(1, 1)]);
        assert!(verify(&ticket, &signer.public_key_pem().unwrap()));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let signer = TicketSigner::generate();
        let public_pem = signer.public_key_pem().unwrap();
        let mut ticket = sample_ticket(&signer);

        ticket.body[5] ^= 0x01;
        assert!(!verify(&ticket, &public_pem));
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let signer = TicketSigner::generate();
        let public_pem = signer.public_key_pem().unwrap();
        let mut ticket = sample_ticket(&signer);

        ticket.signature[0] ^= 0x80;
        assert!(!verify(&ticket, &public_pem));
    }

    #[test]
    fn expand_merges_counts_into_declared_table() {
        let signer = TicketSigner::generate();
        let ticket = signer.create_ticket(9, 10, 30, &[(1, 2)]);
        let declared = vec![
            TicketTypeAttr { id: 1, name: "Adult".to_string() },
            TicketTypeAttr { id: 2, name: "Child".to_string() },
        ];

        let expanded = ticket.expand(&declared);
        assert_eq!(expanded.id, 9);
        assert_eq!(expanded.pickup_point, 10);
        assert_eq!(expanded.dropping_point, 30);
        assert_eq!(expanded.ticket_types.len(), 2);
        assert_eq!(expanded.ticket_types[0].count, 2);
        assert_eq!(expanded.ticket_types[1].count, 0);
    }

    #[test]
    fn load_rejects_bad_tokens() {
        assert!(DigitalTicket::load("").is_err());
        assert!(DigitalTicket::load("2AAAA").is_err());
        assert!(DigitalTicket::load("1AB").is_err());
        // un carácter fuera del alfabeto basE91 invalida el token entero
        assert!(DigitalTicket::load("1AB CD").is_err());
    }

    #[test]
    fn load_rejects_dangling_type_byte() {
        let signer = TicketSigner::generate();
        let ticket = sample_ticket(&signer);
        let mut payload = ticket.signature.clone();
        payload.extend_from_slice(&ticket.body);
        payload.push(0x07); // byte suelto sin su cantidad
        let token = format!("1{}", crate::utils::base91::encode(&payload));
        assert!(DigitalTicket::load(&token).is_err());
    }

    #[test]
    fn max_width_ids_survive_the_round_trip() {
        let signer = TicketSigner::generate();
        let ticket = signer.create_ticket(u32::MAX, u32::MAX - 1, u32::MAX - 2, &[(255, 255)]);
        let loaded = DigitalTicket::load(&ticket.to_token()).unwrap();
        assert_eq!(loaded.ticket_id(), u32::MAX);
        assert_eq!(loaded.pickup_point(), u32::MAX - 1);
        assert_eq!(loaded.dropping_point(), u32::MAX - 2);
        assert_eq!(loaded.type_counts(), vec![(255, 255)]);
    }
}
