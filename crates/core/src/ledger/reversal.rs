//! Reversing entries.
//!
//! A reversal never touches the original lines. It posts a new transaction
//! with every line's side swapped, so the pair nets to zero on each account.

use chrono::NaiveDate;

use super::entry::PostingLine;
use super::error::LedgerError;
use super::transaction::{JournalTransaction, PostingRequest, SourceKind};

/// Builds the posting that reverses `original`.
///
/// Lines keep their accounts and amounts with sides swapped; descriptions are
/// prefixed with "Reversal: ". The memo names the original entry number.
///
/// # Errors
///
/// `CannotReverseReversal` when `original` is itself a reversal.
pub fn reversing_request(
    original: &JournalTransaction,
    reason: &str,
    entry_date: NaiveDate,
) -> Result<PostingRequest, LedgerError> {
    if original.source == SourceKind::Reversal {
        return Err(LedgerError::CannotReverseReversal(original.id));
    }

    let lines = original
        .lines
        .iter()
        .map(|line| PostingLine {
            account_id: line.account_id,
            side: line.side().opposite(),
            amount: line.amount.abs(),
            description: Some(match &line.description {
                Some(description) => format!("Reversal: {description}"),
                None => "Reversal".to_string(),
            }),
        })
        .collect();

    let memo = if reason.trim().is_empty() {
        format!("Reversal of {}", original.entry_number)
    } else {
        format!("Reversal of {}: {}", original.entry_number, reason.trim())
    };

    Ok(PostingRequest {
        entry_date,
        memo: Some(memo),
        source: SourceKind::Reversal,
        reverses: Some(original.id),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::{EntrySide, JournalLine};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tally_shared::types::{AccountId, JournalLineId, TransactionId};

    fn posted(source: SourceKind) -> JournalTransaction {
        let id = TransactionId::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let line = |line_no, amount| JournalLine {
            id: JournalLineId::new(),
            transaction_id: id,
            line_no,
            account_id: AccountId::new(),
            entry_date: date,
            amount,
            description: Some("Office Supplies".to_string()),
        };
        JournalTransaction {
            id,
            entry_number: "JE-0007".to_string(),
            entry_date: date,
            memo: None,
            source,
            reverses: None,
            created_at: Utc::now(),
            lines: vec![line(1, dec!(45)), line(2, dec!(-45))],
        }
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let original = posted(SourceKind::Expense);
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let request = reversing_request(&original, "duplicate", date).unwrap();

        assert_eq!(request.source, SourceKind::Reversal);
        assert_eq!(request.reverses, Some(original.id));
        assert_eq!(request.memo.as_deref(), Some("Reversal of JE-0007: duplicate"));
        assert_eq!(request.lines[0].side, EntrySide::Credit);
        assert_eq!(request.lines[1].side, EntrySide::Debit);
        assert_eq!(
            request.lines[0].description.as_deref(),
            Some("Reversal: Office Supplies")
        );

        let net: Decimal = original
            .lines
            .iter()
            .map(|l| l.amount)
            .chain(request.lines.iter().map(PostingLine::signed_amount))
            .sum();
        assert_eq!(net, Decimal::ZERO);
    }

    #[test]
    fn test_reversal_of_reversal_rejected() {
        let original = posted(SourceKind::Reversal);
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert!(matches!(
            reversing_request(&original, "", date),
            Err(LedgerError::CannotReverseReversal(id)) if id == original.id
        ));
    }
}
