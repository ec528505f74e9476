//! Typed option properties.
//!
//! Properties are written as short textual tokens (`mandatory`, `type:uint`,
//! `exclude:"quiet verbose"`) and parsed once into [`Property`] values, so the
//! rest of the crate never re-inspects strings.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// The name of a property, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Hidden,
    Mandatory,
    Value,
    Cumulative,
    CumulativeSet,
    Type,
    Short,
    Default,
    Exclude,
    Alias,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 10] = [
        Self::Hidden,
        Self::Mandatory,
        Self::Value,
        Self::Cumulative,
        Self::CumulativeSet,
        Self::Type,
        Self::Short,
        Self::Default,
        Self::Exclude,
        Self::Alias,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Mandatory => "mandatory",
            Self::Value => "value",
            Self::Cumulative => "cumulative",
            Self::CumulativeSet => "cumulativeset",
            Self::Type => "type",
            Self::Short => "short",
            Self::Default => "default",
            Self::Exclude => "exclude",
            Self::Alias => "alias",
        }
    }

    fn takes_payload(self) -> bool {
        matches!(
            self,
            Self::Type | Self::Short | Self::Default | Self::Exclude | Self::Alias
        )
    }
}

impl FromStr for PropertyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownProperty(s.to_string()))
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single annotation attached to an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// Not shown in usage or report output.
    Hidden,
    /// Must be set once parsing completes.
    Mandatory,
    /// Takes a value in the next argument.
    Value,
    /// Collects every value it is given.
    Cumulative,
    /// Collects values, keeping only the first occurrence of each.
    CumulativeSet,
    Type(String),
    Short(char),
    Default(String),
    Exclude(Vec<String>),
    Alias(Vec<String>),
}

impl Property {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Hidden => PropertyKind::Hidden,
            Self::Mandatory => PropertyKind::Mandatory,
            Self::Value => PropertyKind::Value,
            Self::Cumulative => PropertyKind::Cumulative,
            Self::CumulativeSet => PropertyKind::CumulativeSet,
            Self::Type(_) => PropertyKind::Type,
            Self::Short(_) => PropertyKind::Short,
            Self::Default(_) => PropertyKind::Default,
            Self::Exclude(_) => PropertyKind::Exclude,
            Self::Alias(_) => PropertyKind::Alias,
        }
    }

    /// Payload rendered back to text: empty for flags, space-joined for lists.
    pub fn payload(&self) -> String {
        match self {
            Self::Hidden | Self::Mandatory | Self::Value | Self::Cumulative | Self::CumulativeSet => {
                String::new()
            }
            Self::Type(s) | Self::Default(s) => s.clone(),
            Self::Short(c) => c.to_string(),
            Self::Exclude(names) | Self::Alias(names) => names.join(" "),
        }
    }

    /// Check the payload: no glob metacharacters or quotes, a single
    /// alphanumeric short letter, non-empty lists of valid option names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = match self {
            Self::Hidden | Self::Mandatory | Self::Value | Self::Cumulative | Self::CumulativeSet => {
                true
            }
            Self::Type(name) => {
                !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || is_forbidden(c))
            }
            Self::Short(c) => is_valid_short(*c),
            Self::Default(value) => !value.chars().any(is_forbidden),
            Self::Exclude(names) | Self::Alias(names) => {
                !names.is_empty() && names.iter().all(|n| is_valid_name(n))
            }
        };
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidPayload {
                property: self.kind().to_string(),
                payload: self.payload(),
            })
        }
    }
}

impl FromStr for Property {
    type Err = ConfigError;

    /// Parse a token such as `cumulative`, `type:uint` or `alias:"a b"`.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (name, payload) = match token.split_once(':') {
            Some((name, payload)) => (name, Some(payload)),
            None => (token, None),
        };
        let kind: PropertyKind = name.parse()?;

        let property = match (kind.takes_payload(), payload) {
            (false, None) => flag_property(kind),
            (true, Some(payload)) => payload_property(kind, strip_quotes(payload))?,
            (false, Some(_)) | (true, None) => {
                return Err(ConfigError::InvalidPayload {
                    property: name.to_string(),
                    payload: payload.unwrap_or_default().to_string(),
                });
            }
        };
        property.validate()?;
        Ok(property)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclude(_) | Self::Alias(_) => write!(f, "{}:\"{}\"", self.kind(), self.payload()),
            Self::Type(_) | Self::Short(_) | Self::Default(_) => {
                write!(f, "{}:{}", self.kind(), self.payload())
            }
            _ => f.write_str(self.kind().as_str()),
        }
    }
}

fn flag_property(kind: PropertyKind) -> Property {
    match kind {
        PropertyKind::Hidden => Property::Hidden,
        PropertyKind::Mandatory => Property::Mandatory,
        PropertyKind::Value => Property::Value,
        PropertyKind::Cumulative => Property::Cumulative,
        PropertyKind::CumulativeSet => Property::CumulativeSet,
        _ => unreachable!("payload properties are handled by the caller"),
    }
}

fn payload_property(kind: PropertyKind, payload: &str) -> Result<Property, ConfigError> {
    let property = match kind {
        PropertyKind::Type => Property::Type(payload.to_string()),
        PropertyKind::Short => {
            let mut chars = payload.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Property::Short(c),
                _ => {
                    return Err(ConfigError::InvalidPayload {
                        property: kind.to_string(),
                        payload: payload.to_string(),
                    });
                }
            }
        }
        PropertyKind::Default => Property::Default(payload.to_string()),
        PropertyKind::Exclude => Property::Exclude(split_names(payload)),
        PropertyKind::Alias => Property::Alias(split_names(payload)),
        _ => flag_property(kind),
    };
    Ok(property)
}

fn split_names(payload: &str) -> Vec<String> {
    payload.split_whitespace().map(str::to_string).collect()
}

fn strip_quotes(payload: &str) -> &str {
    payload
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(payload)
}

// Glob metacharacters and separators.
fn is_forbidden(c: char) -> bool {
    matches!(c, '*' | '?' | '[' | ']' | '|' | '"' | '\n' | '\r')
}

/// Long option names: ASCII letters, digits, `-` and `_`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub(crate) fn is_valid_short(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flag_properties() {
        assert_eq!("hidden".parse::<Property>().unwrap(), Property::Hidden);
        assert_eq!(
            "cumulativeset".parse::<Property>().unwrap(),
            Property::CumulativeSet
        );
    }

    #[test]
    fn parses_payload_properties() {
        assert_eq!(
            "type:uint".parse::<Property>().unwrap(),
            Property::Type("uint".to_string())
        );
        assert_eq!("short:o".parse::<Property>().unwrap(), Property::Short('o'));
        assert_eq!(
            "default:a b".parse::<Property>().unwrap(),
            Property::Default("a b".to_string())
        );
        assert_eq!(
            "exclude:\"quiet verbose\"".parse::<Property>().unwrap(),
            Property::Exclude(vec!["quiet".to_string(), "verbose".to_string()])
        );
    }

    #[test]
    fn default_payload_may_contain_colons() {
        assert_eq!(
            "default:http://localhost:8080".parse::<Property>().unwrap(),
            Property::Default("http://localhost:8080".to_string())
        );
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert_eq!(
            "sticky".parse::<Property>().unwrap_err(),
            ConfigError::UnknownProperty("sticky".to_string())
        );
        assert!(matches!(
            "type:ui*nt".parse::<Property>(),
            Err(ConfigError::InvalidPayload { .. })
        ));
        assert!(matches!(
            "short:ab".parse::<Property>(),
            Err(ConfigError::InvalidPayload { .. })
        ));
        assert!(matches!(
            "alias:".parse::<Property>(),
            Err(ConfigError::InvalidPayload { .. })
        ));
        assert!(matches!(
            "mandatory:yes".parse::<Property>(),
            Err(ConfigError::InvalidPayload { .. })
        ));
        assert!(matches!(
            "type".parse::<Property>(),
            Err(ConfigError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn typed_properties_are_validated() {
        assert!(Property::Short('o').validate().is_ok());
        assert!(Property::Exclude(vec!["quiet".to_string()]).validate().is_ok());
        for bad in [
            Property::Short('-'),
            Property::Short(':'),
            Property::Type("a*".to_string()),
            Property::Type(String::new()),
            Property::Default("x|y".to_string()),
            Property::Exclude(vec![]),
            Property::Alias(vec!["not valid".to_string()]),
        ] {
            assert!(
                matches!(bad.validate(), Err(ConfigError::InvalidPayload { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn payload_renders_lists_space_joined() {
        let p = Property::Alias(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(p.payload(), "a b");
        assert_eq!(p.to_string(), "alias:\"a b\"");
        assert_eq!(Property::Mandatory.payload(), "");
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("dry-run"));
        assert!(is_valid_name("log_level2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("with space"));
        assert!(!is_valid_name("a.b"));
    }
}
