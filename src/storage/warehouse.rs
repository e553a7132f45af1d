//! Append-only loader for the warehouse fact table.
//!
//! The whole batch goes through one transaction. There is no ON
//! CONFLICT clause on purpose: the fact table is append-only and
//! reprocessing a snapshot is allowed to produce duplicate rows.
//! Schema creation and migration live outside the pipeline.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::EtlError;
use crate::model::FactListing;

const INSERT_OFFER: &str = r#"
    INSERT INTO fac_estate_offers_snpt (
        dd_offer_id,
        source_id,
        snpt_date_id,
        city_id,
        market_type_id,
        create_date_id,
        modify_date_id,
        title,
        url,
        price,
        price_per_square_m,
        area,
        rooms_number,
        floor,
        building_year,
        offer_characteristics_id,
        rent
    )
    VALUES (
        $1, $2, $3, $4, $5,
        $6, $7, $8, $9, $10,
        $11, $12, $13, $14, $15,
        $16, $17
    )
"#;

pub struct Warehouse {
    pool: PgPool,
}

impl Warehouse {
    pub async fn connect(database_url: &str) -> Result<Self, EtlError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(EtlError::Connection)?;

        Ok(Self { pool })
    }

    /// Appends the batch and returns the number of rows written.
    pub async fn append_facts(&self, rows: &[FactListing]) -> Result<usize, EtlError> {
        let mut tx = self.pool.begin().await.map_err(EtlError::Write)?;

        for row in rows {
            Self::insert_fact(&mut tx, row).await?;
        }

        tx.commit().await.map_err(EtlError::Write)?;
        Ok(rows.len())
    }

    async fn insert_fact(
        tx: &mut Transaction<'_, Postgres>,
        row: &FactListing,
    ) -> Result<(), EtlError> {
        sqlx::query(INSERT_OFFER)
            .bind(row.dd_offer_id)
            .bind(row.source_id)
            .bind(row.snpt_date_id)
            .bind(row.city_id)
            .bind(row.market_type_id)
            .bind(row.create_date_id)
            .bind(row.modify_date_id)
            .bind(&row.title)
            .bind(&row.url)
            .bind(row.price)
            .bind(row.price_per_square_m)
            .bind(row.area)
            .bind(row.rooms_number)
            .bind(row.floor)
            .bind(row.building_year)
            .bind(row.offer_characteristics_id)
            .bind(row.rent)
            .execute(&mut **tx)
            .await
            .map_err(EtlError::Write)?;

        Ok(())
    }
}
