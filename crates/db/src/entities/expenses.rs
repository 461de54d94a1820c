//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub payee_name: Option<String>,
    pub expense_date: Date,
    pub expense_account_id: Uuid,
    pub payment_account_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub memo: Option<String>,
    #[sea_orm(unique)]
    pub transaction_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub reversal_transaction_id: Option<Uuid>,
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
