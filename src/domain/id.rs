//! UUID-backed identifier newtypes shared by the console entities

/// Declares a UUID identifier newtype that serializes as a plain string
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Generates a new random identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Parses an identifier, normalizing it to lowercase hyphenated form
            pub fn parse(value: &str) -> Result<Self, $crate::domain::DomainError> {
                uuid::Uuid::parse_str(value.trim())
                    .map(|uuid| Self(uuid.to_string()))
                    .map_err(|_| {
                        $crate::domain::DomainError::invalid_id(format!(
                            "Invalid {} ID '{}'",
                            $label, value
                        ))
                    })
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        $crate::domain::storage::impl_string_key!($name);
    };
}

pub(crate) use uuid_id;

#[cfg(test)]
mod tests {
    use crate::domain::DomainError;

    uuid_id!(
        /// Identifier used only by these tests
        SampleId,
        "sample"
    );

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(SampleId::generate(), SampleId::generate());
    }

    #[test]
    fn test_parse_normalizes_case() {
        let id = SampleId::parse("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();
        assert_eq!(id.as_str(), "6f9619ff-8b86-d011-b42d-00c04fc964ff");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = SampleId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, DomainError::InvalidId { .. }));
        assert!(err.to_string().contains("sample"));
    }

    #[test]
    fn test_serde_roundtrip_as_string() {
        let id = SampleId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let back: SampleId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<SampleId>("\"nope\"").is_err());
    }
}
