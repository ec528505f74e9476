//! Option definitions and the short-letter map.

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::property::{Property, PropertyKind, is_valid_name, is_valid_short};

/// Name of the option every parser registers unless told otherwise.
pub const HELP_OPTION: &str = "help";
const HELP_SHORT: char = 'h';
const HELP_DESCRIPTION: &str = "Show this help message";

/// A registered option.
#[derive(Debug, Clone)]
pub struct OptionDef {
    name: String,
    description: String,
    properties: Vec<Property>,
}

impl OptionDef {
    fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, kind: PropertyKind) -> Option<&Property> {
        self.properties.iter().find(|p| p.kind() == kind)
    }

    pub fn has(&self, kind: PropertyKind) -> bool {
        self.property(kind).is_some()
    }

    pub fn takes_value(&self) -> bool {
        self.has(PropertyKind::Value)
    }

    pub fn is_hidden(&self) -> bool {
        self.has(PropertyKind::Hidden)
    }

    pub fn is_mandatory(&self) -> bool {
        self.has(PropertyKind::Mandatory)
    }

    /// `cumulative` or `cumulativeset`.
    pub fn is_repeatable(&self) -> bool {
        self.has(PropertyKind::Cumulative) || self.has(PropertyKind::CumulativeSet)
    }

    pub fn short(&self) -> Option<char> {
        match self.property(PropertyKind::Short) {
            Some(Property::Short(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self.property(PropertyKind::Type) {
            Some(Property::Type(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Option<&str> {
        match self.property(PropertyKind::Default) {
            Some(Property::Default(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn excludes(&self) -> &[String] {
        match self.property(PropertyKind::Exclude) {
            Some(Property::Exclude(names)) => names,
            _ => &[],
        }
    }

    pub fn aliases(&self) -> &[String] {
        match self.property(PropertyKind::Alias) {
            Some(Property::Alias(names)) => names,
            _ => &[],
        }
    }

    fn put(&mut self, property: Property) {
        let kind = property.kind();
        match self.properties.iter_mut().find(|p| p.kind() == kind) {
            Some(slot) => *slot = property,
            None => self.properties.push(property),
        }
    }
}

/// The result of reading an option spec such as `=verbose` or `out=put:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: String,
    pub short: Option<char>,
    pub takes_value: bool,
}

impl OptionSpec {
    /// A trailing `:` marks a value option; `=` before a letter marks that
    /// letter as the short form. Neither marker is part of the name.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidSpec(spec.to_string());

        let (body, takes_value) = match spec.strip_suffix(':') {
            Some(body) => (body, true),
            None => (spec, false),
        };

        let (name, short) = match body.split_once('=') {
            None => (body.to_string(), None),
            Some((head, tail)) => {
                if tail.contains('=') {
                    return Err(invalid());
                }
                let short = tail.chars().next().ok_or_else(invalid)?;
                if !is_valid_short(short) {
                    return Err(ConfigError::InvalidShort(short.to_string()));
                }
                (format!("{head}{tail}"), Some(short))
            }
        };

        if !is_valid_name(&name) {
            return Err(ConfigError::InvalidName(name));
        }

        Ok(Self {
            name,
            short,
            takes_value,
        })
    }
}

/// All option definitions of one parser, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    options: IndexMap<String, OptionDef>,
    shorts: IndexMap<char, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only the `-h/--help` option.
    pub fn with_help() -> Self {
        let mut help = OptionDef::new(HELP_OPTION, HELP_DESCRIPTION);
        help.put(Property::Short(HELP_SHORT));
        Self {
            options: IndexMap::from([(HELP_OPTION.to_string(), help)]),
            shorts: IndexMap::from([(HELP_SHORT, HELP_OPTION.to_string())]),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionDef> {
        self.options.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionDef> {
        self.options.values()
    }

    /// Option bound to a short letter.
    pub fn resolve_short(&self, short: char) -> Option<&str> {
        self.shorts.get(&short).map(String::as_str)
    }

    /// Short letters in the order they were claimed.
    pub fn shorts(&self) -> impl Iterator<Item = (char, &OptionDef)> {
        self.shorts
            .iter()
            .filter_map(|(c, name)| self.options.get(name).map(|def| (*c, def)))
    }

    /// Add an empty definition for `spec.name`.
    ///
    /// The spec's own short letter is checked here so that a colliding
    /// definition never enters the registry.
    pub(crate) fn insert(&mut self, spec: &OptionSpec, description: &str) -> Result<(), ConfigError> {
        if self.options.contains_key(&spec.name) {
            return Err(ConfigError::DuplicateOption(spec.name.clone()));
        }
        if let Some(short) = spec.short {
            if let Some(existing) = self.shorts.get(&short) {
                return Err(ConfigError::ShortCollision {
                    short,
                    existing: existing.clone(),
                    requested: spec.name.clone(),
                });
            }
        }
        self.options
            .insert(spec.name.clone(), OptionDef::new(spec.name.clone(), description));
        Ok(())
    }

    /// Attach `property` to `name`, replacing any property of the same kind.
    pub(crate) fn apply(&mut self, name: &str, property: Property) -> Result<(), ConfigError> {
        if !self.options.contains_key(name) {
            return Err(ConfigError::UnknownOption(name.to_string()));
        }
        property.validate()?;

        if let Property::Short(short) = property {
            match self.shorts.get(&short) {
                Some(existing) if existing != name => {
                    return Err(ConfigError::ShortCollision {
                        short,
                        existing: existing.clone(),
                        requested: name.to_string(),
                    });
                }
                _ => {}
            }
            self.shorts.retain(|_, owner| owner != name);
            self.shorts.insert(short, name.to_string());
        }

        let implies_value = matches!(property, Property::Cumulative | Property::CumulativeSet);
        let Some(def) = self.options.get_mut(name) else {
            return Err(ConfigError::UnknownOption(name.to_string()));
        };
        def.put(property);
        if implies_value {
            def.put(Property::Value);
        }
        Ok(())
    }

    /// Recompute the short map from `short` properties.
    pub(crate) fn rebuild_shorts(&mut self) {
        self.shorts.clear();
        for def in self.options.values() {
            if let Some(short) = def.short() {
                self.shorts.entry(short).or_insert_with(|| def.name.clone());
            }
        }
    }
}
