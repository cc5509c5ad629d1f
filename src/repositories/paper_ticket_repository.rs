//! Repositorio de PaperTicket
//!
//! Solo alta y lectura: el ticket es inmutable una vez emitido.

use sqlx::{PgPool, Postgres, Transaction};

use crate::models::paper_ticket::{PaperTicket, PaperTicketFilters};
use crate::utils::errors::AppResult;

/// Campos de un ticket nuevo con los valores ya derivados por el servidor
pub struct NewPaperTicket {
    pub company_id: i32,
    pub service_id: i32,
    pub duty_id: i32,
    pub sequence_id: i32,
    pub ticket_types: serde_json::Value,
    pub pickup_point: i32,
    pub dropping_point: i32,
    pub distance: i32,
    pub amount: f64,
    pub extra: serde_json::Value,
}

pub struct PaperTicketRepository {
    pool: PgPool,
}

impl PaperTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new_ticket: NewPaperTicket,
    ) -> AppResult<PaperTicket> {
        let ticket = sqlx::query_as::<_, PaperTicket>(
            r#"
            INSERT INTO paper_ticket
                (company_id, service_id, duty_id, sequence_id, ticket_types,
                 pickup_point, dropping_point, distance, amount, extra, created_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            RETURNING *
            "#,
        )
        .bind(new_ticket.company_id)
        .bind(new_ticket.service_id)
        .bind(new_ticket.duty_id)
        .bind(new_ticket.sequence_id)
        .bind(&new_ticket.ticket_types)
        .bind(new_ticket.pickup_point)
        .bind(new_ticket.dropping_point)
        .bind(new_ticket.distance)
        .bind(new_ticket.amount)
        .bind(&new_ticket.extra)
        .fetch_one(&mut **tx)
        .await?;
        Ok(ticket)
    }

    pub async fn search(&self, filters: &PaperTicketFilters) -> AppResult<Vec<PaperTicket>> {
        let tickets = sqlx::query_as::<_, PaperTicket>(
            r#"
            SELECT * FROM paper_ticket
            WHERE ($1::int IS NULL OR company_id = $1)
              AND ($2::int IS NULL OR service_id = $2)
              AND ($3::int IS NULL OR duty_id = $3)
              AND ($4::int IS NULL OR pickup_point = $4)
              AND ($5::int IS NULL OR dropping_point = $5)
            ORDER BY id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filters.company_id)
        .bind(filters.service_id)
        .bind(filters.duty_id)
        .bind(filters.pickup_point)
        .bind(filters.dropping_point)
        .bind(filters.limit.unwrap_or(20).clamp(1, 100))
        .bind(filters.offset.unwrap_or(0).max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }
}
