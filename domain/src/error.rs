//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use sea_orm::DbErr;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure with
/// `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums. The `source` field holds the original error from the lower layer.
/// `web` turns the `error_kind` into an HTTP status without ever depending on
/// `entity_api` directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    /// A caller-supplied value is out of range or malformed.
    Validation(String),
    Other(String),
}

/// Entity errors translated up from `entity_api` and reduced to what the
/// domain layer cares about.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// A backing service (the database) could not be reached.
    Network,
    Other(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Validation(message.into())),
        }
    }

    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::NotFound,
            )),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_kind
            == DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let error_kind = match (&err.error_kind, &err.source) {
            (EntityApiErrorKind::RecordNotFound, _) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
            }
            (EntityApiErrorKind::InvalidQueryTerm, _) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
            }
            (
                EntityApiErrorKind::SystemError,
                Some(DbErr::Conn(_)) | Some(DbErr::ConnectionAcquire(_)),
            ) => DomainErrorKind::External(ExternalErrorKind::Network),
            (EntityApiErrorKind::SystemError, _) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::DbTransaction))
            }
            (EntityApiErrorKind::Other, _) => DomainErrorKind::Internal(
                InternalErrorKind::Entity(EntityErrorKind::Other("EntityErrorKind".to_string())),
            ),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn record_not_found_becomes_entity_not_found() {
        let err: Error = EntityApiError {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
        .into();

        assert!(err.is_not_found());
    }

    #[test]
    fn lost_database_connection_is_an_external_error() {
        let err: Error = EntityApiError::from(DbErr::Conn(RuntimeErr::Internal(
            "connection refused".to_string(),
        )))
        .into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Network)
        );
    }

    #[test]
    fn failed_statement_is_a_transaction_error() {
        let err: Error =
            EntityApiError::from(DbErr::Exec(RuntimeErr::Internal("syntax".to_string()))).into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::DbTransaction))
        );
    }
}
