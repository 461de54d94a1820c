//! Chart of accounts maintenance.

use std::sync::Arc;

use chrono::Utc;
use tally_shared::types::AccountId;
use tracing::info;

use crate::ledger::{Account, AccountType, AccountUpdate, LedgerError, NewAccount};
use crate::store::{AccountFilter, LedgerStore};

/// An account the system creates on first use.
#[derive(Debug, Clone, Copy)]
pub struct SystemAccount {
    /// Account name.
    pub name: &'static str,
    /// Account type.
    pub account_type: AccountType,
}

/// Recoverable sales tax paid on expenses and bills.
pub const GST_HST_RECEIVABLE: SystemAccount = SystemAccount {
    name: "GST/HST Receivable",
    account_type: AccountType::OtherCurrentAssets,
};

/// Sales tax collected on invoices.
pub const GST_HST_PAYABLE: SystemAccount = SystemAccount {
    name: "GST/HST Payable",
    account_type: AccountType::OtherCurrentLiabilities,
};

/// Starter chart of accounts for a new business.
#[must_use]
pub fn default_chart() -> Vec<NewAccount> {
    vec![
        NewAccount::new("Cash", AccountType::Bank)
            .with_number("1000")
            .with_detail_type("Cash on hand"),
        NewAccount::new("Accounts Receivable", AccountType::AccountsReceivable)
            .with_number("1100")
            .with_detail_type("Accounts Receivable (A/R)"),
        NewAccount::new("Accounts Payable", AccountType::AccountsPayable)
            .with_number("2000")
            .with_detail_type("Accounts Payable (A/P)"),
        NewAccount::new("Owner's Equity", AccountType::Equity)
            .with_number("3000")
            .with_detail_type("Owner's Equity"),
        NewAccount::new("Revenue", AccountType::Income)
            .with_number("4000")
            .with_detail_type("Service/Fee Income"),
        NewAccount::new("Cost of Goods Sold", AccountType::CostOfGoodsSold)
            .with_number("5000")
            .with_detail_type("Supplies & Materials - COGS"),
        NewAccount::new("Operating Expenses", AccountType::Expenses)
            .with_number("6000")
            .with_detail_type("Office/General Administrative Expenses"),
    ]
}

/// Builds a fresh account record from input.
#[must_use]
pub fn new_account_record(input: NewAccount) -> Account {
    let now = Utc::now();
    let parent_name = input
        .parent_name
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    Account {
        id: AccountId::new(),
        name: input.name.trim().to_string(),
        account_type: input.account_type,
        detail_type: input
            .detail_type
            .unwrap_or_else(|| input.account_type.as_str().to_string()),
        account_number: input.account_number,
        description: input.description,
        is_active: true,
        is_sub_account: parent_name.is_some(),
        parent_name,
        created_at: now,
        updated_at: now,
    }
}

/// Creates, updates and looks up accounts.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    /// Creates a service over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Creates an account.
    ///
    /// A sub-account's parent must exist and share its accounting class.
    pub async fn create(&self, input: NewAccount) -> Result<Account, LedgerError> {
        if input.name.trim().is_empty() {
            return Err(LedgerError::Validation("account name is required".into()));
        }
        let account = new_account_record(input);
        if let Some(parent_name) = &account.parent_name {
            self.check_parent(parent_name, account.account_type).await?;
        }

        let account = self.store.insert_account(account).await?;
        info!(
            account_id = %account.id,
            name = %account.name,
            account_type = %account.account_type,
            "Account created"
        );
        Ok(account)
    }

    /// Applies a partial update.
    ///
    /// Renaming a parent carries its sub-accounts along with it.
    pub async fn update(&self, id: AccountId, update: AccountUpdate) -> Result<Account, LedgerError> {
        let mut account = self.get(id).await?;
        let mut type_changed = false;

        if let Some(new_type) = update.account_type
            && new_type != account.account_type
        {
            if self.store.account_has_postings(id).await? {
                return Err(LedgerError::AccountTypeChangeNotAllowed(id));
            }
            if new_type.class() != account.account_type.class() {
                self.check_no_sub_accounts(&account).await?;
            }
            account.account_type = new_type;
            type_changed = true;
        }
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(LedgerError::Validation("account name is required".into()));
            }
            account.name = name;
        }
        if let Some(detail_type) = update.detail_type {
            account.detail_type = detail_type;
        }
        if let Some(number) = update.account_number {
            account.account_number = Some(number).filter(|n| !n.is_empty());
        }
        if let Some(description) = update.description {
            account.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(is_active) = update.is_active {
            account.is_active = is_active;
        }
        if type_changed && let Some(parent_name) = account.parent_name.clone() {
            self.check_parent(&parent_name, account.account_type).await?;
        }
        account.updated_at = Utc::now();

        self.store.update_account(account).await
    }

    /// Looks up an account.
    pub async fn get(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .get_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Lists accounts.
    pub async fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>, LedgerError> {
        self.store.list_accounts(filter).await
    }

    /// Returns the named system account, creating it on first use.
    pub async fn find_or_create_system_account(
        &self,
        system: SystemAccount,
    ) -> Result<Account, LedgerError> {
        if let Some(existing) = self.store.find_account_by_name(system.name).await? {
            return Self::check_system_type(existing, system);
        }

        match self
            .create(NewAccount::new(system.name, system.account_type))
            .await
        {
            Ok(account) => Ok(account),
            // Lost a race with another creator.
            Err(LedgerError::DuplicateAccountName(_)) => {
                let existing = self
                    .store
                    .find_account_by_name(system.name)
                    .await?
                    .ok_or_else(|| LedgerError::Storage(format!("{} vanished", system.name)))?;
                Self::check_system_type(existing, system)
            }
            Err(e) => Err(e),
        }
    }

    /// Creates whichever default accounts are missing.
    pub async fn seed_default_chart(&self) -> Result<Vec<Account>, LedgerError> {
        let mut created = Vec::new();
        for input in default_chart() {
            if self.store.find_account_by_name(&input.name).await?.is_none() {
                created.push(self.create(input).await?);
            }
        }
        Ok(created)
    }

    async fn check_parent(&self, parent_name: &str, child_type: AccountType) -> Result<(), LedgerError> {
        let parent = self
            .store
            .find_account_by_name(parent_name)
            .await?
            .ok_or_else(|| LedgerError::InvalidParentAccount(format!("'{parent_name}' does not exist")))?;
        if parent.account_type.class() != child_type.class() {
            return Err(LedgerError::InvalidParentAccount(format!(
                "'{parent_name}' is {} but the sub-account is {child_type}",
                parent.account_type
            )));
        }
        Ok(())
    }

    async fn check_no_sub_accounts(&self, parent: &Account) -> Result<(), LedgerError> {
        let parent_key = parent.name.to_lowercase();
        let accounts = self.store.list_accounts(&AccountFilter::default()).await?;
        if let Some(child) = accounts.iter().find(|a| {
            a.parent_name
                .as_deref()
                .is_some_and(|p| p.to_lowercase() == parent_key)
        }) {
            return Err(LedgerError::InvalidParentAccount(format!(
                "'{}' has sub-account '{}' of type {}",
                parent.name, child.name, child.account_type
            )));
        }
        Ok(())
    }

    fn check_system_type(existing: Account, system: SystemAccount) -> Result<Account, LedgerError> {
        if existing.account_type == system.account_type {
            Ok(existing)
        } else {
            Err(LedgerError::Validation(format!(
                "account '{}' exists with type {} but {} is required",
                existing.name, existing.account_type, system.account_type
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{PostingEngine, PostingLine, PostingRequest, SourceKind};
    use crate::store::InMemoryLedgerStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn service() -> (AccountService, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        (AccountService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_create_defaults_detail_type() {
        let (accounts, _) = service();
        let account = accounts
            .create(NewAccount::new("  Savings ", AccountType::Bank))
            .await
            .unwrap();
        assert_eq!(account.name, "Savings");
        assert_eq!(account.detail_type, "Bank");
        assert!(account.is_active);
        assert!(!account.is_sub_account);
    }

    #[tokio::test]
    async fn test_sub_account_parent_must_share_class() {
        let (accounts, _) = service();
        accounts
            .create(NewAccount::new("Operating Expenses", AccountType::Expenses))
            .await
            .unwrap();

        let mut supplies = NewAccount::new("Office Supplies", AccountType::Expenses);
        supplies.parent_name = Some("Operating Expenses".into());
        let child = accounts.create(supplies).await.unwrap();
        assert!(child.is_sub_account);

        let mut wrong = NewAccount::new("Petty Cash", AccountType::Bank);
        wrong.parent_name = Some("Operating Expenses".into());
        assert!(matches!(
            accounts.create(wrong).await,
            Err(LedgerError::InvalidParentAccount(_))
        ));

        let mut orphan = NewAccount::new("Travel", AccountType::Expenses);
        orphan.parent_name = Some("Nowhere".into());
        assert!(matches!(
            accounts.create(orphan).await,
            Err(LedgerError::InvalidParentAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_renamed_parent_keeps_its_sub_accounts() {
        let (accounts, _) = service();
        let parent = accounts
            .create(NewAccount::new("Operating Expenses", AccountType::Expenses))
            .await
            .unwrap();
        let mut supplies = NewAccount::new("Office Supplies", AccountType::Expenses);
        supplies.parent_name = Some("operating expenses".into());
        let child = accounts.create(supplies).await.unwrap();

        let rename = AccountUpdate {
            name: Some("Opex".into()),
            ..AccountUpdate::default()
        };
        accounts.update(parent.id, rename).await.unwrap();

        let moved = accounts.get(child.id).await.unwrap();
        assert_eq!(moved.parent_name.as_deref(), Some("Opex"));

        // Unrelated edits on the sub-account no longer trip the parent check.
        let deactivate = AccountUpdate {
            is_active: Some(false),
            ..AccountUpdate::default()
        };
        let child = accounts.update(child.id, deactivate).await.unwrap();
        assert!(!child.is_active);
        assert_eq!(child.parent_name.as_deref(), Some("Opex"));
    }

    #[tokio::test]
    async fn test_parent_class_change_refused_with_sub_accounts() {
        let (accounts, _) = service();
        let parent = accounts
            .create(NewAccount::new("Operating Expenses", AccountType::Expenses))
            .await
            .unwrap();
        let mut supplies = NewAccount::new("Office Supplies", AccountType::Expenses);
        supplies.parent_name = Some("Operating Expenses".into());
        let child = accounts.create(supplies).await.unwrap();

        let to_income = AccountUpdate {
            account_type: Some(AccountType::Income),
            ..AccountUpdate::default()
        };
        assert!(matches!(
            accounts.update(parent.id, to_income).await,
            Err(LedgerError::InvalidParentAccount(_))
        ));

        // Same class is fine for the parent.
        let same_class = AccountUpdate {
            account_type: Some(AccountType::OtherExpenses),
            ..AccountUpdate::default()
        };
        accounts.update(parent.id, same_class).await.unwrap();

        // A sub-account may not leave its parent's class.
        let to_bank = AccountUpdate {
            account_type: Some(AccountType::Bank),
            ..AccountUpdate::default()
        };
        assert!(matches!(
            accounts.update(child.id, to_bank).await,
            Err(LedgerError::InvalidParentAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_type_change_refused_after_postings() {
        let (accounts, store) = service();
        let cash = accounts
            .create(NewAccount::new("Cash", AccountType::Bank))
            .await
            .unwrap();
        let equity = accounts
            .create(NewAccount::new("Owner's Equity", AccountType::Equity))
            .await
            .unwrap();

        // No postings yet: allowed.
        let update = AccountUpdate {
            account_type: Some(AccountType::OtherCurrentAssets),
            ..AccountUpdate::default()
        };
        let changed = accounts.update(cash.id, update).await.unwrap();
        assert_eq!(changed.account_type, AccountType::OtherCurrentAssets);

        PostingEngine::new(store)
            .post(PostingRequest::new(
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                SourceKind::Journal,
                vec![
                    PostingLine::debit(cash.id, dec!(10)),
                    PostingLine::credit(equity.id, dec!(10)),
                ],
            ))
            .await
            .unwrap();

        let update = AccountUpdate {
            account_type: Some(AccountType::Bank),
            ..AccountUpdate::default()
        };
        assert!(matches!(
            accounts.update(cash.id, update).await,
            Err(LedgerError::AccountTypeChangeNotAllowed(id)) if id == cash.id
        ));
    }

    #[tokio::test]
    async fn test_find_or_create_system_account_is_idempotent() {
        let (accounts, _) = service();
        let first = accounts
            .find_or_create_system_account(GST_HST_RECEIVABLE)
            .await
            .unwrap();
        let second = accounts
            .find_or_create_system_account(GST_HST_RECEIVABLE)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.account_type, AccountType::OtherCurrentAssets);
    }

    #[tokio::test]
    async fn test_seed_default_chart_once() {
        let (accounts, _) = service();
        let created = accounts.seed_default_chart().await.unwrap();
        assert_eq!(created.len(), 7);
        assert!(accounts.seed_default_chart().await.unwrap().is_empty());

        let listed = accounts.list(&AccountFilter::default()).await.unwrap();
        let numbers: Vec<_> = listed
            .iter()
            .filter_map(|a| a.account_number.as_deref())
            .collect();
        assert_eq!(numbers, vec!["1000", "1100", "2000", "3000", "4000", "5000", "6000"]);
    }
}
