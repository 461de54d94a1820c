//! `SeaORM` Entity for payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub direction: String,
    pub payment_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub amount: Decimal,
    pub payment_method: String,
    pub reference_number: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub memo: Option<String>,
    pub cash_account_id: Uuid,
    /// Allocation list as JSON.
    #[sea_orm(column_type = "JsonBinary")]
    pub allocations: Json,
    pub gateway_reference: Option<String>,
    #[sea_orm(unique)]
    pub transaction_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_transactions::Entity",
        from = "Column::TransactionId",
        to = "super::journal_transactions::Column::Id"
    )]
    JournalTransactions,
}

impl Related<super::journal_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
