//! Validated value types shared by the patient record crates.
//!
//! Each type can only be constructed through a checking constructor, so holding one is proof
//! that the underlying value satisfies the patient record constraints.

/// Errors that can occur when creating validated value types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    /// The input text was empty
    #[error("value cannot be empty")]
    Empty,

    /// A numeric value fell outside its exclusive bounds
    #[error("value must be greater than {min} and less than {max}")]
    OutOfRange { min: f64, max: f64 },

    /// A numeric value was NaN or infinite
    #[error("value must be a finite number")]
    NotFinite,

    /// The text is not a syntactically valid email address
    #[error("value is not a valid email address: {0}")]
    InvalidEmail(&'static str),
}

/// Identifier of a patient record.
///
/// Unlike free-text fields the identifier is used verbatim as the storage key, so it is not
/// trimmed. It only has to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatientId(String);

impl PatientId {
    /// Creates a new `PatientId`, rejecting the empty string.
    pub fn new(input: impl Into<String>) -> Result<Self, TypeError> {
        let id = input.into();
        if id.is_empty() {
            return Err(TypeError::Empty);
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the owned key.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PatientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::new(s).map_err(serde::de::Error::custom)
    }
}

/// A syntactically valid email address.
///
/// Only ASCII addresses in the common `local@domain.tld` form are accepted. Quoted local parts
/// and IP-literal domains are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MAX_LEN: usize = 254;
    const MAX_LOCAL_LEN: usize = 64;
    const MAX_LABEL_LEN: usize = 63;

    /// Parses and validates an email address. Surrounding whitespace is trimmed.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TypeError> {
        let address = input.as_ref().trim();

        if address.is_empty() {
            return Err(TypeError::Empty);
        }
        if !address.is_ascii() {
            return Err(TypeError::InvalidEmail("must contain only ASCII characters"));
        }
        if address.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidEmail("address is too long"));
        }

        let (local, domain) = address
            .split_once('@')
            .ok_or(TypeError::InvalidEmail("an email address must have an @-sign"))?;

        Self::check_local_part(local)?;
        Self::check_domain(domain)?;

        Ok(Self(address.to_owned()))
    }

    fn check_local_part(local: &str) -> Result<(), TypeError> {
        if local.is_empty() {
            return Err(TypeError::InvalidEmail("there must be something before the @-sign"));
        }
        if local.len() > Self::MAX_LOCAL_LEN {
            return Err(TypeError::InvalidEmail("the part before the @-sign is too long"));
        }
        if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
            return Err(TypeError::InvalidEmail(
                "the part before the @-sign has a misplaced period",
            ));
        }

        let ok = local.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+/=?^_`{|}~-.".contains(&b)
        });
        if !ok {
            return Err(TypeError::InvalidEmail(
                "the part before the @-sign contains invalid characters",
            ));
        }

        Ok(())
    }

    fn check_domain(domain: &str) -> Result<(), TypeError> {
        if domain.is_empty() {
            return Err(TypeError::InvalidEmail("there must be something after the @-sign"));
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 {
            return Err(TypeError::InvalidEmail(
                "the part after the @-sign is not a valid domain name",
            ));
        }

        for label in &labels {
            if label.is_empty() || label.len() > Self::MAX_LABEL_LEN {
                return Err(TypeError::InvalidEmail(
                    "the part after the @-sign has an empty or oversized label",
                ));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(TypeError::InvalidEmail(
                    "a domain label cannot start or end with a hyphen",
                ));
            }
            if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
                return Err(TypeError::InvalidEmail(
                    "the part after the @-sign contains invalid characters",
                ));
            }
        }

        // labels.len() >= 2 was checked above
        let tld = labels[labels.len() - 1];
        if tld.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidEmail(
                "the part after the @-sign is not a valid domain name",
            ));
        }

        Ok(())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EmailAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Age in whole years, `0 < age < 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Age(u8);

impl Age {
    pub const MIN_EXCLUSIVE: i64 = 0;
    pub const MAX_EXCLUSIVE: i64 = 100;

    pub fn new(years: i64) -> Result<Self, TypeError> {
        if years <= Self::MIN_EXCLUSIVE || years >= Self::MAX_EXCLUSIVE {
            return Err(TypeError::OutOfRange {
                min: Self::MIN_EXCLUSIVE as f64,
                max: Self::MAX_EXCLUSIVE as f64,
            });
        }
        // bounded to 1..=99 above
        Ok(Self(years as u8))
    }

    pub fn years(self) -> u8 {
        self.0
    }
}

impl serde::Serialize for Age {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Age {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let years = i64::deserialize(deserializer)?;
        Age::new(years).map_err(serde::de::Error::custom)
    }
}

/// Declares a finite `f64` measurement with exclusive bounds.
macro_rules! bounded_measure {
    ($(#[$meta:meta])* $name:ident, $min:expr, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
        pub struct $name(f64);

        impl $name {
            pub const MIN_EXCLUSIVE: f64 = $min;
            pub const MAX_EXCLUSIVE: f64 = $max;

            pub fn new(value: f64) -> Result<Self, TypeError> {
                if !value.is_finite() {
                    return Err(TypeError::NotFinite);
                }
                if value <= Self::MIN_EXCLUSIVE || value >= Self::MAX_EXCLUSIVE {
                    return Err(TypeError::OutOfRange {
                        min: Self::MIN_EXCLUSIVE,
                        max: Self::MAX_EXCLUSIVE,
                    });
                }
                Ok(Self(value))
            }

            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_f64(self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = f64::deserialize(deserializer)?;
                $name::new(value).map_err(serde::de::Error::custom)
            }
        }
    };
}

bounded_measure!(
    /// Height in feet, `3 < height < 8`.
    Height,
    3.0,
    8.0
);

bounded_measure!(
    /// Weight in kilograms, `10 < weight < 130`.
    Weight,
    10.0,
    130.0
);
