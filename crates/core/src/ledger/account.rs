//! Chart of accounts: account types, their normal balance, and the account record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::error::LedgerError;

/// Closed set of account types.
///
/// Declaration order is the order accounts appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Bank and cash accounts.
    #[serde(rename = "Bank")]
    Bank,
    /// Money owed by customers.
    #[serde(rename = "Accounts Receivable")]
    AccountsReceivable,
    /// Undeposited funds, prepaid items, recoverable taxes.
    #[serde(rename = "Other Current Assets")]
    OtherCurrentAssets,
    /// Equipment, buildings, vehicles.
    #[serde(rename = "Fixed Assets")]
    FixedAssets,
    /// Money owed to suppliers.
    #[serde(rename = "Accounts Payable")]
    AccountsPayable,
    /// Credit card balances.
    #[serde(rename = "Credit Card")]
    CreditCard,
    /// Sales tax payable, payroll liabilities.
    #[serde(rename = "Other Current Liabilities")]
    OtherCurrentLiabilities,
    /// Loans and other long-term debt.
    #[serde(rename = "Long-Term Liabilities")]
    LongTermLiabilities,
    /// Owner's equity.
    #[serde(rename = "Equity")]
    Equity,
    /// Operating revenue.
    #[serde(rename = "Income")]
    Income,
    /// Direct cost of what was sold.
    #[serde(rename = "Cost of Goods Sold")]
    CostOfGoodsSold,
    /// Operating expenses.
    #[serde(rename = "Expenses")]
    Expenses,
    /// Non-operating revenue.
    #[serde(rename = "Other Income")]
    OtherIncome,
    /// Non-operating expenses.
    #[serde(rename = "Other Expenses")]
    OtherExpenses,
}

/// Broad accounting class of an account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Revenue.
    Income,
    /// Costs and expenses.
    Expense,
}

/// Side on which an account's balance naturally grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalBalance {
    /// Balance = debits - credits.
    Debit,
    /// Balance = credits - debits.
    Credit,
}

impl NormalBalance {
    /// Reduces debit and credit totals to a balance on this side.
    #[must_use]
    pub fn balance(self, debit_total: Decimal, credit_total: Decimal) -> Decimal {
        match self {
            Self::Debit => debit_total - credit_total,
            Self::Credit => credit_total - debit_total,
        }
    }
}

/// Report section an account type rolls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementSection {
    /// Balance sheet assets.
    Assets,
    /// Balance sheet liabilities.
    Liabilities,
    /// Balance sheet equity.
    Equity,
    /// Profit and loss statement.
    ProfitAndLoss,
}

impl AccountType {
    /// Every account type in report order.
    pub const ALL: [Self; 14] = [
        Self::Bank,
        Self::AccountsReceivable,
        Self::OtherCurrentAssets,
        Self::FixedAssets,
        Self::AccountsPayable,
        Self::CreditCard,
        Self::OtherCurrentLiabilities,
        Self::LongTermLiabilities,
        Self::Equity,
        Self::Income,
        Self::CostOfGoodsSold,
        Self::Expenses,
        Self::OtherIncome,
        Self::OtherExpenses,
    ];

    /// Display name, also the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::AccountsReceivable => "Accounts Receivable",
            Self::OtherCurrentAssets => "Other Current Assets",
            Self::FixedAssets => "Fixed Assets",
            Self::AccountsPayable => "Accounts Payable",
            Self::CreditCard => "Credit Card",
            Self::OtherCurrentLiabilities => "Other Current Liabilities",
            Self::LongTermLiabilities => "Long-Term Liabilities",
            Self::Equity => "Equity",
            Self::Income => "Income",
            Self::CostOfGoodsSold => "Cost of Goods Sold",
            Self::Expenses => "Expenses",
            Self::OtherIncome => "Other Income",
            Self::OtherExpenses => "Other Expenses",
        }
    }

    /// Accounting class.
    #[must_use]
    pub const fn class(self) -> AccountClass {
        match self {
            Self::Bank | Self::AccountsReceivable | Self::OtherCurrentAssets | Self::FixedAssets => {
                AccountClass::Asset
            }
            Self::AccountsPayable
            | Self::CreditCard
            | Self::OtherCurrentLiabilities
            | Self::LongTermLiabilities => AccountClass::Liability,
            Self::Equity => AccountClass::Equity,
            Self::Income | Self::OtherIncome => AccountClass::Income,
            Self::CostOfGoodsSold | Self::Expenses | Self::OtherExpenses => AccountClass::Expense,
        }
    }

    /// Asset and expense types are debit-normal, everything else credit-normal.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self.class() {
            AccountClass::Asset | AccountClass::Expense => NormalBalance::Debit,
            AccountClass::Liability | AccountClass::Equity | AccountClass::Income => {
                NormalBalance::Credit
            }
        }
    }

    /// Report section.
    #[must_use]
    pub const fn section(self) -> StatementSection {
        match self.class() {
            AccountClass::Asset => StatementSection::Assets,
            AccountClass::Liability => StatementSection::Liabilities,
            AccountClass::Equity => StatementSection::Equity,
            AccountClass::Income | AccountClass::Expense => StatementSection::ProfitAndLoss,
        }
    }

    /// Types that money can be transferred between.
    #[must_use]
    pub const fn is_bank_like(self) -> bool {
        matches!(
            self,
            Self::Bank | Self::OtherCurrentAssets | Self::CreditCard
        )
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LedgerError::InvalidAccountType(s.to_string()))
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Unique display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Free-text subclassification ("Cash on hand", "Checking", ...).
    pub detail_type: String,
    /// Optional account number ("1000").
    pub account_number: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Inactive accounts reject new postings but keep their history.
    pub is_active: bool,
    /// True when the account sits under a parent.
    pub is_sub_account: bool,
    /// Parent account name.
    pub parent_name: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Unique display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Free-text subclassification. Defaults to the type name.
    #[serde(default)]
    pub detail_type: Option<String>,
    /// Optional account number.
    #[serde(default)]
    pub account_number: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Parent account name, making this a sub-account.
    #[serde(default)]
    pub parent_name: Option<String>,
}

impl NewAccount {
    /// Shorthand for a top-level account with no number or description.
    #[must_use]
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            detail_type: None,
            account_number: None,
            description: None,
            parent_name: None,
        }
    }

    /// Sets the account number.
    #[must_use]
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.account_number = Some(number.into());
        self
    }

    /// Sets the detail type.
    #[must_use]
    pub fn with_detail_type(mut self, detail_type: impl Into<String>) -> Self {
        self.detail_type = Some(detail_type.into());
        self
    }
}

/// Partial update of an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New type. Refused once the account has postings.
    #[serde(default)]
    pub account_type: Option<AccountType>,
    /// New detail type.
    #[serde(default)]
    pub detail_type: Option<String>,
    /// New account number.
    #[serde(default)]
    pub account_number: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// Activate or deactivate.
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AccountType::Bank, NormalBalance::Debit, StatementSection::Assets)]
    #[case(AccountType::AccountsReceivable, NormalBalance::Debit, StatementSection::Assets)]
    #[case(AccountType::OtherCurrentAssets, NormalBalance::Debit, StatementSection::Assets)]
    #[case(AccountType::FixedAssets, NormalBalance::Debit, StatementSection::Assets)]
    #[case(AccountType::AccountsPayable, NormalBalance::Credit, StatementSection::Liabilities)]
    #[case(AccountType::CreditCard, NormalBalance::Credit, StatementSection::Liabilities)]
    #[case(AccountType::OtherCurrentLiabilities, NormalBalance::Credit, StatementSection::Liabilities)]
    #[case(AccountType::LongTermLiabilities, NormalBalance::Credit, StatementSection::Liabilities)]
    #[case(AccountType::Equity, NormalBalance::Credit, StatementSection::Equity)]
    #[case(AccountType::Income, NormalBalance::Credit, StatementSection::ProfitAndLoss)]
    #[case(AccountType::CostOfGoodsSold, NormalBalance::Debit, StatementSection::ProfitAndLoss)]
    #[case(AccountType::Expenses, NormalBalance::Debit, StatementSection::ProfitAndLoss)]
    #[case(AccountType::OtherIncome, NormalBalance::Credit, StatementSection::ProfitAndLoss)]
    #[case(AccountType::OtherExpenses, NormalBalance::Debit, StatementSection::ProfitAndLoss)]
    fn test_account_type_rules(
        #[case] account_type: AccountType,
        #[case] normal: NormalBalance,
        #[case] section: StatementSection,
    ) {
        assert_eq!(account_type.normal_balance(), normal);
        assert_eq!(account_type.section(), section);
    }

    #[test]
    fn test_account_type_round_trips_through_name() {
        for account_type in AccountType::ALL {
            assert_eq!(account_type.as_str().parse::<AccountType>().unwrap(), account_type);
        }
        assert_eq!(
            "accounts receivable".parse::<AccountType>().unwrap(),
            AccountType::AccountsReceivable
        );
    }

    #[test]
    fn test_unknown_account_type_rejected() {
        let err = "Crypto Wallet".parse::<AccountType>().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAccountType(name) if name == "Crypto Wallet"));

        let json = serde_json::from_str::<AccountType>("\"Crypto Wallet\"");
        assert!(json.is_err());
    }

    #[test]
    fn test_bank_like_types() {
        let bank_like: Vec<_> = AccountType::ALL
            .into_iter()
            .filter(|t| t.is_bank_like())
            .collect();
        assert_eq!(
            bank_like,
            vec![
                AccountType::Bank,
                AccountType::OtherCurrentAssets,
                AccountType::CreditCard
            ]
        );
    }

    #[test]
    fn test_normal_balance_reduces_totals() {
        assert_eq!(NormalBalance::Debit.balance(dec!(100), dec!(30)), dec!(70));
        assert_eq!(NormalBalance::Credit.balance(dec!(100), dec!(30)), dec!(-70));
    }
}
