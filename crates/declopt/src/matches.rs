//! Parsed option values and positional parameters.

use indexmap::IndexMap;

/// What was recorded for an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// How many times a flag was given.
    Count(usize),
    /// Last value given to a value option (or its default).
    Scalar(String),
    /// Occurrence count and collected values of a cumulative option.
    Cumulative { count: usize, values: Vec<String> },
}

impl OptionValue {
    pub fn count(&self) -> usize {
        match self {
            Self::Count(n) | Self::Cumulative { count: n, .. } => *n,
            Self::Scalar(_) => 1,
        }
    }

    /// The scalar value, or the last collected one.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Count(_) => None,
            Self::Scalar(v) => Some(v),
            Self::Cumulative { values, .. } => values.last().map(String::as_str),
        }
    }

    pub fn values(&self) -> &[String] {
        match self {
            Self::Cumulative { values, .. } => values,
            Self::Scalar(v) => std::slice::from_ref(v),
            Self::Count(_) => &[],
        }
    }
}

/// Parsed options and positional parameters.
///
/// An option is set iff it has an entry, whatever the entry holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    options: IndexMap<String, OptionValue>,
    positionals: Vec<String>,
}

impl Matches {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::value)
    }

    /// Values collected by a cumulative option (empty if unset).
    pub fn values(&self, name: &str) -> &[String] {
        self.get(name).map(OptionValue::values).unwrap_or(&[])
    }

    /// Occurrence count (0 if unset).
    pub fn count(&self, name: &str) -> usize {
        self.get(name).map(OptionValue::count).unwrap_or(0)
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }
}

impl Matches {
    pub(crate) fn increment(&mut self, name: &str) {
        let entry = self
            .options
            .entry(name.to_string())
            .or_insert(OptionValue::Count(0));
        *entry = match entry {
            OptionValue::Count(n) => OptionValue::Count(*n + 1),
            // A numeric default is where counting starts from; any other
            // default counts from zero.
            OptionValue::Scalar(v) => OptionValue::Count(v.parse::<usize>().unwrap_or(0) + 1),
            OptionValue::Cumulative { count, values } => OptionValue::Cumulative {
                count: *count + 1,
                values: std::mem::take(values),
            },
        };
    }

    pub(crate) fn set_value(&mut self, name: &str, value: &str) {
        self.options
            .insert(name.to_string(), OptionValue::Scalar(value.to_string()));
    }

    /// Append `value`; with `dedup`, an already collected value only bumps the count.
    pub(crate) fn push_value(&mut self, name: &str, value: &str, dedup: bool) {
        match self.options.get_mut(name) {
            Some(OptionValue::Cumulative { count, values }) => {
                *count += 1;
                if !(dedup && values.iter().any(|v| v == value)) {
                    values.push(value.to_string());
                }
            }
            _ => {
                self.options.insert(
                    name.to_string(),
                    OptionValue::Cumulative {
                        count: 1,
                        values: vec![value.to_string()],
                    },
                );
            }
        }
    }

    pub(crate) fn set_positionals(&mut self, positionals: Vec<String>) {
        self.positionals = positionals;
    }

    pub(crate) fn clear(&mut self) {
        self.options.clear();
        self.positionals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_counts_from_numeric_default() {
        let mut m = Matches::default();
        m.increment("verbose");
        m.increment("verbose");
        assert_eq!(m.get("verbose"), Some(&OptionValue::Count(2)));

        m.set_value("level", "3");
        m.increment("level");
        assert_eq!(m.count("level"), 4);
    }

    #[test]
    fn push_value_replaces_default_then_accumulates() {
        let mut m = Matches::default();
        m.set_value("tag", "base");
        m.push_value("tag", "a", false);
        m.push_value("tag", "b", false);
        assert_eq!(m.values("tag"), ["a", "b"]);
        assert_eq!(m.count("tag"), 2);
        assert_eq!(m.value("tag"), Some("b"));
    }

    #[test]
    fn push_value_dedup_keeps_first_occurrence() {
        let mut m = Matches::default();
        for v in ["a", "b", "a"] {
            m.push_value("tag", v, true);
        }
        assert_eq!(m.values("tag"), ["a", "b"]);
        assert_eq!(m.count("tag"), 3);
    }

    #[test]
    fn empty_value_is_still_set() {
        let mut m = Matches::default();
        m.set_value("name", "");
        assert!(m.is_set("name"));
        assert_eq!(m.value("name"), Some(""));
        assert!(!m.is_set("other"));
        assert_eq!(m.count("other"), 0);
        assert!(m.values("other").is_empty());
    }
}
