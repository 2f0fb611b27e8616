//! Macro for strongly-typed SQL identifier newtypes.
//!
//! Every generated type holds a trimmed, non-empty name and compares
//! case-sensitively; `eq_ignore_case` is available where SQL folding matters.

/// Define a non-empty identifier newtype.
///
/// Generates the struct (`Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
/// Serialize`), a validating `Deserialize`, `new()` returning
/// [`CoreResult`](crate::error::CoreResult), `as_str()`, `eq_ignore_case()`,
/// and `Display`, `AsRef<str>`, `Deref<Target = str>`, `Borrow<str>`,
/// `TryFrom<&str>`, `PartialEq<str>`, `PartialEq<&str>`.
macro_rules! define_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident($kind:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::new(s).map_err(serde::de::Error::custom)
            }
        }

        impl $Name {
            /// Validate and wrap a name; surrounding whitespace is dropped.
            pub fn new(name: impl Into<String>) -> $crate::error::CoreResult<Self> {
                let name = name.into();
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err($crate::error::CoreError::EmptyIdentifier { kind: $kind });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Return the underlying name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// ASCII case-insensitive comparison, as SQL identifiers fold.
            pub fn eq_ignore_case(&self, other: &str) -> bool {
                self.0.eq_ignore_ascii_case(other)
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $Name {
            type Error = $crate::error::CoreError;
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                $Name::new(s)
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_identifier! {
    /// Name of a mapped entity type (e.g. `Order`)
    pub struct EntityName("entity name");
}

define_identifier! {
    /// Name of a property on an entity (e.g. `CustomerId`)
    pub struct PropertyName("property name");
}

define_identifier! {
    /// Name of a table or view in the store (e.g. `Orders`)
    pub struct TableName("table name");
}

define_identifier! {
    /// Name of a store column (e.g. `CustomerID`)
    pub struct ColumnName("column name");
}
