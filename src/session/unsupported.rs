//! Client operations the router does not route.
//!
//! A session may hold two physical connections, so anything that only makes
//! sense on a single connection (savepoints, stored procedure calls, cursor
//! holdability) cannot be forwarded meaningfully. These are rejected with
//! an error naming the operation instead of being silently ignored.

use std::fmt;

use crate::error::RouterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientOperation {
    SetSavepoint,
    ReleaseSavepoint,
    RollbackToSavepoint,
    PrepareCall,
    NativeSql,
    SetHoldability,
    SetTypeMap,
    SetClientInfo,
    Cancel,
    MoreResults,
}

impl ClientOperation {
    pub fn name(self) -> &'static str {
        match self {
            ClientOperation::SetSavepoint => "set_savepoint",
            ClientOperation::ReleaseSavepoint => "release_savepoint",
            ClientOperation::RollbackToSavepoint => "rollback_to_savepoint",
            ClientOperation::PrepareCall => "prepare_call",
            ClientOperation::NativeSql => "native_sql",
            ClientOperation::SetHoldability => "set_holdability",
            ClientOperation::SetTypeMap => "set_type_map",
            ClientOperation::SetClientInfo => "set_client_info",
            ClientOperation::Cancel => "cancel",
            ClientOperation::MoreResults => "more_results",
        }
    }
}

impl fmt::Display for ClientOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn reject(operation: ClientOperation) -> RouterError {
    RouterError::unsupported(operation.name())
}
