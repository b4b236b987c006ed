//! Payments Repository

use granary::order::{PaymentMethod, PaymentStatus};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    encode_u64,
    orders::models::{OrderUuid, Payment},
    try_get_u64,
};

const CREATE_PAYMENT_SQL: &str = include_str!("../sql/create_payment.sql");
const PAYMENT_FOR_ORDER_SQL: &str = include_str!("../sql/payment_for_order.sql");
const UPDATE_PAYMENT_STATUS_SQL: &str = include_str!("../sql/update_payment_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        amount: u64,
        method: PaymentMethod,
    ) -> Result<Payment, sqlx::Error> {
        let amount = encode_u64(amount, "amount")?;

        query_as::<Postgres, Payment>(CREATE_PAYMENT_SQL)
            .bind(order.into_uuid())
            .bind(amount)
            .bind(PaymentStatus::Unpaid.as_str())
            .bind(method.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn payment_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<Payment>, sqlx::Error> {
        query_as::<Postgres, Payment>(PAYMENT_FOR_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: PaymentStatus,
    ) -> Result<Payment, sqlx::Error> {
        query_as::<Postgres, Payment>(UPDATE_PAYMENT_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Payment {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status = row
            .try_get::<String, _>("status")?
            .parse::<PaymentStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        let method = row
            .try_get::<String, _>("method")?
            .parse::<PaymentMethod>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "method".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            amount: try_get_u64(row, "amount")?,
            status,
            method,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
