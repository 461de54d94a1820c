//! Posting engine: the single write path into the journal.

use std::sync::Arc;

use chrono::NaiveDate;
use tally_shared::types::TransactionId;
use tracing::{debug, info};

use super::error::LedgerError;
use super::reversal::reversing_request;
use super::transaction::{JournalTransaction, PostingRequest, SourceKind};
use super::validation::validate_lines;
use crate::store::{LedgerStore, Posting, PostingDocument, TransactionFilter};

/// Validates and commits journal transactions.
///
/// Structural rules are checked here before touching storage; account rules
/// are re-checked by the store inside the committing transaction. Storage
/// conflicts are returned as `ConcurrencyConflict` and never retried here.
#[derive(Clone)]
pub struct PostingEngine {
    store: Arc<dyn LedgerStore>,
}

impl PostingEngine {
    /// Creates an engine over a store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Posts a balanced transaction.
    pub async fn post(&self, request: PostingRequest) -> Result<JournalTransaction, LedgerError> {
        self.post_with_document(TransactionId::new(), request, None)
            .await
    }

    /// Posts a transaction together with its source document.
    ///
    /// `transaction_id` must be the ID the document refers to.
    pub async fn post_with_document(
        &self,
        transaction_id: TransactionId,
        request: PostingRequest,
        document: Option<PostingDocument>,
    ) -> Result<JournalTransaction, LedgerError> {
        validate_lines(&request.lines)?;
        if (request.source == SourceKind::Reversal) != request.reverses.is_some() {
            return Err(LedgerError::Validation(
                "reversal entries are created by reversing a transaction".into(),
            ));
        }

        let transaction = self
            .store
            .commit_posting(Posting {
                transaction_id,
                request,
                document,
            })
            .await?;

        info!(
            transaction_id = %transaction.id,
            entry_number = %transaction.entry_number,
            source = %transaction.source,
            lines = transaction.lines.len(),
            "Journal transaction posted"
        );
        Ok(transaction)
    }

    /// Reverses a posted transaction with a new, opposite transaction.
    pub async fn reverse(
        &self,
        transaction_id: TransactionId,
        reason: &str,
        entry_date: NaiveDate,
    ) -> Result<JournalTransaction, LedgerError> {
        self.reverse_with_document(transaction_id, reason, entry_date, None)
            .await
    }

    /// Reverses a transaction and writes `document` in the same commit.
    pub async fn reverse_with_document(
        &self,
        transaction_id: TransactionId,
        reason: &str,
        entry_date: NaiveDate,
        document: Option<PostingDocument>,
    ) -> Result<JournalTransaction, LedgerError> {
        let original = self.transaction(transaction_id).await?;
        let request = reversing_request(&original, reason, entry_date)?;
        debug!(
            original = %original.entry_number,
            lines = request.lines.len(),
            "Reversing journal transaction"
        );
        self.post_with_document(TransactionId::new(), request, document)
            .await
    }

    /// Looks up a transaction.
    pub async fn transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<JournalTransaction, LedgerError> {
        self.store
            .get_transaction(transaction_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }

    /// Lists transactions.
    pub async fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<JournalTransaction>, LedgerError> {
        self.store.list_transactions(filter).await
    }
}
