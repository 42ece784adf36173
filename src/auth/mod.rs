pub mod middleware;

use serde::Serialize;

/// The two caller kinds the core ever sees. Real session/init-data
/// validation and admin-token issuance live upstream of this crate; the
/// middleware in this module only resolves an already-authenticated header
/// into one of these. `User` carries the *internal* user id — the external
/// chat-platform id is resolved to it once, at the boundary, so every
/// downstream call site deals in the same id space as the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    User { user_id: i64 },
    Operator,
}

impl Principal {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Principal::User { user_id } => Some(*user_id),
            Principal::Operator => None,
        }
    }
}
