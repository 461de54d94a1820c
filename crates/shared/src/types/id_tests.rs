use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = AccountId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
    assert_eq!(TransactionId::from(uuid).into_inner(), uuid);
}

#[test]
fn test_typed_ids_are_unique() {
    let first = TransactionId::new();
    let second = TransactionId::new();
    assert_ne!(first, second);
    assert_eq!(first.into_inner().get_version_num(), 7);
}

#[test]
fn test_typed_id_display_and_parse() {
    let uuid = Uuid::new_v4();
    let id = ExpenseId::from_uuid(uuid);
    assert_eq!(id.to_string(), uuid.to_string());
    assert_eq!(ExpenseId::from_str(&uuid.to_string()).unwrap(), id);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(PaymentId::from_str("invalid").is_err());
}

#[test]
fn test_typed_id_serializes_transparently() {
    let uuid = Uuid::new_v4();
    let json = serde_json::to_string(&TransferId::from_uuid(uuid)).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
