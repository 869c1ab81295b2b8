use crate::domain::order::OrderError;
use crate::domain::refund::RefundError;
use crate::ledger::LedgerError;
use crate::store::StoreError;

// ============================================================================
// Service Errors - what a lifecycle operation can fail with
// ============================================================================
//
// Notification failures are deliberately absent: they are reported inside a
// successful result and never fail the operation that triggered them.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(what.to_string())
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<RefundError> for ServiceError {
    fn from(err: RefundError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => ServiceError::Conflict(err.to_string()),
            StoreError::Missing(code) => ServiceError::NotFound(code),
            StoreError::Backend(e) => ServiceError::Storage(e),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownPromo(_) => ServiceError::Validation(err.to_string()),
            LedgerError::PromoUsageLimitReached { .. } | LedgerError::InsufficientStock { .. } => {
                ServiceError::Conflict(err.to_string())
            }
            LedgerError::Contention(_) => ServiceError::Conflict(err.to_string()),
            LedgerError::Backend(e) => ServiceError::Storage(e),
        }
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn test_rule_violations_are_validation_errors() {
        let err: ServiceError = OrderError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        }
        .into();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(err.to_string(), "Cannot move order from delivered to pending");
    }

    #[test]
    fn test_store_errors_map_by_kind() {
        let conflict: ServiceError = StoreError::Conflict {
            code: "DB-1001".to_string(),
            expected: 2,
            actual: 3,
        }
        .into();
        assert!(matches!(conflict, ServiceError::Conflict(_)));

        let missing: ServiceError = StoreError::Missing("DB-9999".to_string()).into();
        assert!(matches!(missing, ServiceError::NotFound(code) if code == "DB-9999"));

        let backend: ServiceError = StoreError::Backend(anyhow::anyhow!("node down")).into();
        assert!(matches!(backend, ServiceError::Storage(_)));
    }
}
