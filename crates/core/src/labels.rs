//! Closed label vocabularies.
//!
//! Every label has exactly one wire/storage spelling. Parsing through [`FromStr`] is exact and
//! case-sensitive; case-insensitive matching is a search concern and happens there.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A string did not name any label of the expected vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every label, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire/storage spelling of this label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownLabel {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

label_enum! {
    /// Moral-justification label. The first six are the scored frameworks, in tie-break
    /// priority order.
    Justification ("justification") {
        Auth => "AUTH",
        Care => "CARE",
        Loyal => "LOYAL",
        Fair => "FAIR",
        Pur => "PUR",
        Non => "NON",
        Unchecked => "UNCHECKED",
    }
}

label_enum! {
    /// Law-type label of a document or annotation.
    LawType ("law type") {
        Duty => "DUTY",
        Allow => "ALLOW",
        Ban => "BAN",
        Def => "DEF",
        Dec => "DEC",
        Goal => "GOAL",
        Unchecked => "UNCHECKED",
        Other => "OTHER",
    }
}

label_enum! {
    /// Review status of a document.
    DocumentStatus ("status") {
        Unmarked => "UNMARKED",
        Marked => "MARKED",
        Checked => "CHECKED",
        Generated => "GENERATED",
    }
}

label_enum! {
    /// A named permission grant held by a caller.
    Capability ("capability") {
        CanMarkAsMarked => "can_mark_as_marked",
        CanMarkAsChecked => "can_mark_as_checked",
    }
}

impl Default for Justification {
    fn default() -> Self {
        Justification::Unchecked
    }
}

impl Default for LawType {
    fn default() -> Self {
        LawType::Unchecked
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        DocumentStatus::Unmarked
    }
}
