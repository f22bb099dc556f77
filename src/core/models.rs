// Shared data model: session claims, subject enums, audit log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares an integer-coded enum backed by one const table of
/// `(variant, code, name)` rows. Lookups in both directions read the same
/// table, so names and codes cannot drift apart.
macro_rules! code_table_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:literal => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            /// Code table: variant, wire code, display name
            pub const TABLE: &'static [($name, i64, &'static str)] = &[
                $(($name::$variant, $code, $label)),+
            ];

            /// Wire code of this value
            pub fn code(self) -> i64 {
                Self::TABLE
                    .iter()
                    .find(|(v, _, _)| *v == self)
                    .map(|(_, c, _)| *c)
                    .unwrap_or_default()
            }

            /// Upper-case name of this value
            pub fn as_str(self) -> &'static str {
                Self::TABLE
                    .iter()
                    .find(|(v, _, _)| *v == self)
                    .map(|(_, _, n)| *n)
                    .unwrap_or("UNKNOWN")
            }

            /// Name for a raw code; `UNKNOWN` when the code is not in the table
            pub fn name_of(code: i64) -> &'static str {
                Self::TABLE
                    .iter()
                    .find(|(_, c, _)| *c == code)
                    .map(|(_, _, n)| *n)
                    .unwrap_or("UNKNOWN")
            }
        }

        impl TryFrom<i64> for $name {
            type Error = String;

            fn try_from(code: i64) -> Result<Self, Self::Error> {
                Self::TABLE
                    .iter()
                    .find(|(_, c, _)| *c == code)
                    .map(|(v, _, _)| *v)
                    .ok_or_else(|| format!("unknown {} code {}", stringify!($name), code))
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value.code()
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::TABLE
                    .iter()
                    .find(|(_, _, n)| n.eq_ignore_ascii_case(s))
                    .map(|(v, _, _)| *v)
                    .ok_or_else(|| format!("unknown {} name '{}'", stringify!($name), s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

code_table_enum! {
    /// Kind of authenticated subject
    SubjectType {
        Undefined = 0 => "UNDEFINED",
        SysAdmin = 1 => "SYSADMIN",
        Support = 2 => "SUPPORT",
        User = 3 => "USER",
        Service = 4 => "SERVICE",
    }
}

code_table_enum! {
    /// Lifecycle status of a subject
    SubjectStatus {
        Undefined = 0 => "UNDEFINED",
        Pending = 1 => "PENDING",
        Active = 2 => "ACTIVE",
        Blocked = 3 => "BLOCKED",
        Suspended = 4 => "SUSPENDED",
    }
}

/// Claims carried by a session token
///
/// `expires_at` is epoch milliseconds; `0` marks a non-expiring credential
/// (service accounts) that the gate never renews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub subject_id: String,
    pub subject_type: SubjectType,
    pub status: SubjectStatus,
    #[serde(rename = "expiresIn")]
    pub expires_at: i64,
}

impl SessionClaims {
    pub fn new(
        subject_id: impl Into<String>,
        subject_type: SubjectType,
        status: SubjectStatus,
        expires_at: i64,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_type,
            status,
            expires_at,
        }
    }

    /// True when the token is a non-expiring credential
    pub fn is_non_expiring(&self) -> bool {
        self.expires_at == 0
    }
}

/// Mutating action recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "Create",
            AuditAction::Update => "Update",
            AuditAction::Delete => "Delete",
        }
    }
}

/// Identity of the entity a mutation touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditItem {
    pub item_type: String,
    pub item_id: String,
    pub item_name: String,
}

impl AuditItem {
    pub fn new(
        item_type: impl Into<String>,
        item_id: impl Into<String>,
        item_name: impl Into<String>,
    ) -> Self {
        Self {
            item_type: item_type.into(),
            item_id: item_id.into(),
            item_name: item_name.into(),
        }
    }
}

/// Audit log row: who did what to which item, with the minimal change delta
///
/// `before_change` / `after_change` hold the JSON text of the two delta sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub created_on: DateTime<Utc>,
    pub user_id: String,
    pub user_type: SubjectType,
    pub action: AuditAction,
    pub item_type: String,
    pub item_id: String,
    pub item_name: String,
    pub before_change: String,
    pub after_change: String,
}
