//! The parser context and its dispatch loop.

use std::collections::HashMap;

use crate::config::ParserConfig;
use crate::error::{ConfigError, ParseError};
use crate::matches::{Matches, OptionValue};
use crate::property::{Property, PropertyKind};
use crate::registry::{HELP_OPTION, OptionDef, OptionSpec, Registry};
use crate::tokenizer::{self, GetoptLong, Tokenizer};
use crate::types::{SystemLookup, TypeValidator};

/// Extra acceptance test for one option's values.
pub type ValueCheck = Box<dyn Fn(&str) -> bool>;

/// Replacement for the default setting behavior of one option.
///
/// Receives the option name and its value (for value options). The
/// [`Setter`] exposes the default behaviors so a hook can wrap them.
pub type SetHook = Box<dyn Fn(&mut Setter<'_>, &str, Option<&str>) -> Result<(), ParseError>>;

/// Called on every usage error, before `parse` returns it.
pub type UsageHandler = Box<dyn Fn(&Parser, &ParseError)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Matches(Matches),
    /// `--help` was given; carries the full usage text.
    Help(String),
}

/// Option registry, hook tables and parsed state of one program.
pub struct Parser {
    pub(crate) config: ParserConfig,
    pub(crate) registry: Registry,
    pub(crate) matches: Matches,
    pub(crate) allowed_values: HashMap<String, Vec<String>>,
    value_checks: HashMap<String, ValueCheck>,
    hooks: HashMap<String, SetHook>,
    types: TypeValidator,
    tokenizer: Box<dyn Tokenizer>,
    usage_handler: Option<UsageHandler>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("matches", &self.matches)
            .field("allowed_values", &self.allowed_values)
            .finish_non_exhaustive()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        let registry = if config.builtin_help {
            Registry::with_help()
        } else {
            Registry::new()
        };
        Self {
            config,
            registry,
            matches: Matches::default(),
            allowed_values: HashMap::new(),
            value_checks: HashMap::new(),
            hooks: HashMap::new(),
            types: TypeValidator::new(),
            tokenizer: Box::new(GetoptLong),
            usage_handler: None,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn set_program_name(&mut self, program: impl Into<String>) {
        self.config.program = program.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.config.description = Some(description.into());
    }

    pub fn set_minimum_parameters(&mut self, min: usize) {
        self.config.min_parameters = min;
    }

    pub fn set_maximum_parameters(&mut self, max: usize) {
        self.config.max_parameters = max;
    }

    pub fn allow_no_argument(&mut self, allow: bool) {
        self.config.allow_no_argument = allow;
    }

    pub fn set_tokenizer(&mut self, tokenizer: impl Tokenizer + 'static) {
        self.tokenizer = Box::new(tokenizer);
    }

    pub fn set_lookup(&mut self, lookup: impl SystemLookup + 'static) {
        self.types.set_lookup(lookup);
    }

    pub fn set_usage_handler(&mut self, handler: impl Fn(&Parser, &ParseError) + 'static) {
        self.usage_handler = Some(Box::new(handler));
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn definition(&self, name: &str) -> Option<&OptionDef> {
        self.registry.get(name)
    }

    /// Register an option from a spec (`=verbose`, `out=put:`) and property tokens.
    ///
    /// Properties are applied in order; if one fails, the option stays
    /// registered with the properties before it.
    pub fn define(
        &mut self,
        spec: &str,
        description: &str,
        properties: &[&str],
    ) -> Result<(), ConfigError> {
        let spec = OptionSpec::parse(spec)?;
        self.registry.insert(&spec, description)?;
        tracing::debug!(option = %spec.name, "defined option");

        if let Some(short) = spec.short {
            self.set(&spec.name, Property::Short(short))?;
        }
        if spec.takes_value {
            self.set(&spec.name, Property::Value)?;
        }
        for token in properties {
            let property: Property = token.parse()?;
            self.set(&spec.name, property)?;
        }
        Ok(())
    }

    /// [`define`](Self::define) with already typed properties.
    pub fn define_with(
        &mut self,
        spec: &str,
        description: &str,
        properties: impl IntoIterator<Item = Property>,
    ) -> Result<(), ConfigError> {
        self.define(spec, description, &[])?;
        let name = OptionSpec::parse(spec)?.name;
        properties
            .into_iter()
            .try_for_each(|property| self.set(&name, property))
    }

    /// Apply a property token to each of `options` in turn.
    ///
    /// A malformed token is rejected before any option is touched.
    pub fn set_property(&mut self, token: &str, options: &[&str]) -> Result<(), ConfigError> {
        let property: Property = token.parse()?;
        options
            .iter()
            .try_for_each(|option| self.set(option, property.clone()))
    }

    /// Attach a typed property to one option.
    pub fn set(&mut self, option: &str, property: Property) -> Result<(), ConfigError> {
        let default = match &property {
            Property::Default(value) => Some(value.clone()),
            _ => None,
        };
        self.registry.apply(option, property)?;
        if let Some(value) = default {
            self.matches.set_value(option, &value);
        }
        Ok(())
    }

    /// Payload of `property` on `option` (empty for flags), `None` if absent.
    pub fn has_property(&self, option: &str, property: &str) -> Option<String> {
        let kind: PropertyKind = property.parse().ok()?;
        self.registry
            .get(option)?
            .property(kind)
            .map(Property::payload)
    }

    /// Restrict `option` to an enumerated set of values.
    pub fn set_allowed_values<I, S>(&mut self, option: &str, values: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require(option)?;
        self.allowed_values
            .insert(option.to_string(), values.into_iter().map(Into::into).collect());
        Ok(())
    }

    pub fn allowed_values(&self, option: &str) -> Option<&[String]> {
        self.allowed_values.get(option).map(Vec::as_slice)
    }

    /// Validator for `type:<name>` properties naming a type the crate lacks.
    pub fn register_type(&mut self, name: &str, check: impl Fn(&str) -> bool + 'static) {
        self.types.register(name, check);
    }

    pub fn set_value_check(
        &mut self,
        option: &str,
        check: impl Fn(&str) -> bool + 'static,
    ) -> Result<(), ConfigError> {
        self.require(option)?;
        self.value_checks.insert(option.to_string(), Box::new(check));
        Ok(())
    }

    pub fn set_hook(
        &mut self,
        option: &str,
        hook: impl Fn(&mut Setter<'_>, &str, Option<&str>) -> Result<(), ParseError> + 'static,
    ) -> Result<(), ConfigError> {
        self.require(option)?;
        self.hooks.insert(option.to_string(), Box::new(hook));
        Ok(())
    }

    pub fn check_type(&self, type_name: &str, value: &str) -> Result<bool, ConfigError> {
        self.types.check(type_name, value)
    }

    pub fn matches(&self) -> &Matches {
        &self.matches
    }

    pub fn is_set(&self, option: &str) -> bool {
        self.matches.is_set(option)
    }

    pub fn get(&self, option: &str) -> Option<&OptionValue> {
        self.matches.get(option)
    }

    pub fn value(&self, option: &str) -> Option<&str> {
        self.matches.value(option)
    }

    pub fn values(&self, option: &str) -> &[String] {
        self.matches.values(option)
    }

    pub fn count(&self, option: &str) -> usize {
        self.matches.count(option)
    }

    pub fn positionals(&self) -> &[String] {
        self.matches.positionals()
    }

    /// Forget parsed state, keeping definitions and properties.
    ///
    /// Defaults are seeded again and the short map is rebuilt from `short`
    /// properties.
    pub fn reset(&mut self) {
        self.matches.clear();
        self.registry.rebuild_shorts();
        for def in self.registry.iter() {
            if let Some(value) = def.default_value() {
                self.matches.set_value(def.name(), value);
            }
        }
    }

    /// Parse `argv` (without the program name).
    ///
    /// On error, and when help is requested, the parsed state is left as it
    /// was before the call. Usage errors also run the usage handler.
    pub fn parse<S: AsRef<str>>(&mut self, argv: &[S]) -> Result<ParseOutcome, ParseError> {
        let argv: Vec<String> = argv.iter().map(|a| a.as_ref().to_string()).collect();
        let snapshot = self.matches.clone();

        match self.run(&argv) {
            Ok(ParseOutcome::Help(text)) => {
                self.matches = snapshot;
                Ok(ParseOutcome::Help(text))
            }
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.matches = snapshot;
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    fn run(&mut self, argv: &[String]) -> Result<ParseOutcome, ParseError> {
        tracing::debug!(args = argv.len(), "parsing options");
        if argv.is_empty() && !self.config.allow_no_argument {
            return Err(ParseError::NoArguments);
        }

        let resolved = tokenizer::resolve(self.tokenizer.as_ref(), &self.registry, argv)?;
        let exclusions = self.exclusion_map();

        let mut tokens = resolved.options.into_iter();
        while let Some(token) = tokens.next() {
            let name = self.resolve_token(&token)?;
            tracing::trace!(option = %name, "dispatching");

            if self.config.builtin_help && name == HELP_OPTION {
                return Ok(ParseOutcome::Help(self.usage()));
            }

            self.check_exclusions(&exclusions, &name)?;

            let takes_value = self
                .registry
                .get(&name)
                .is_some_and(OptionDef::takes_value);
            let value = if takes_value {
                let value = tokens
                    .next()
                    .ok_or_else(|| crate::error::SyntaxError::MissingArgument(token.clone()))?;
                self.validate_value(&name, &value)?;
                Some(value)
            } else {
                None
            };

            let mut setter = Setter {
                registry: &self.registry,
                hooks: &self.hooks,
                matches: &mut self.matches,
                alias_stack: Vec::new(),
            };
            setter.set(&name, value.as_deref())?;
        }

        self.finish(resolved.positionals)
    }

    fn resolve_token(&self, token: &str) -> Result<String, ConfigError> {
        if let Some(long) = token.strip_prefix("--") {
            if self.registry.contains(long) {
                return Ok(long.to_string());
            }
            return Err(ConfigError::UnknownOption(long.to_string()));
        }

        let mut chars = token.strip_prefix('-').unwrap_or(token).chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) => self
                .registry
                .resolve_short(short)
                .map(str::to_string)
                .ok_or(ConfigError::UnknownShort(short)),
            _ => Err(ConfigError::UnknownOption(token.to_string())),
        }
    }

    /// Symmetric view of every `exclude` property.
    fn exclusion_map(&self) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for def in self.registry.iter() {
            for other in def.excludes() {
                map.entry(def.name().to_string())
                    .or_default()
                    .push(other.clone());
                map.entry(other.clone())
                    .or_default()
                    .push(def.name().to_string());
            }
        }
        map
    }

    fn check_exclusions(
        &self,
        exclusions: &HashMap<String, Vec<String>>,
        name: &str,
    ) -> Result<(), ParseError> {
        let Some(conflicts) = exclusions.get(name) else {
            return Ok(());
        };
        match conflicts
            .iter()
            .find(|other| other.as_str() != name && self.matches.is_set(other))
        {
            Some(other) => Err(ParseError::Excluded {
                option: name.to_string(),
                conflicting: other.clone(),
            }),
            None => Ok(()),
        }
    }

    fn validate_value(&self, name: &str, value: &str) -> Result<(), ParseError> {
        let invalid = |reason: String| ParseError::InvalidValue {
            option: name.to_string(),
            value: value.to_string(),
            reason,
        };

        if let Some(allowed) = self.allowed_values.get(name) {
            if !allowed.iter().any(|a| a == value) {
                return Err(invalid(format!("expected one of: {}", allowed.join(", "))));
            }
        } else if let Some(ty) = self.registry.get(name).and_then(OptionDef::type_name) {
            if !self.types.check(ty, value)? {
                return Err(invalid(format!("not a valid {ty}")));
            }
        }

        if let Some(check) = self.value_checks.get(name) {
            if !check(value) {
                return Err(invalid("rejected by value check".to_string()));
            }
        }
        Ok(())
    }

    fn finish(&mut self, positionals: Vec<String>) -> Result<ParseOutcome, ParseError> {
        let (min, max) = (self.config.min_parameters, self.config.max_parameters);
        let count = positionals.len();
        if count < min || count > max {
            return Err(ParseError::Arity { count, min, max });
        }
        self.matches.set_positionals(positionals);

        let missing: Vec<String> = self
            .registry
            .iter()
            .filter(|def| def.is_mandatory() && !self.matches.is_set(def.name()))
            .map(|def| def.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingMandatory(missing));
        }

        tracing::debug!(positionals = count, "parsed options");
        Ok(ParseOutcome::Matches(self.matches.clone()))
    }

    fn report_failure(&self, err: &ParseError) {
        if !err.is_usage_error() {
            tracing::error!(%err, "option parser misconfigured");
            return;
        }
        match &self.usage_handler {
            Some(handler) => handler(self, err),
            None => {
                eprintln!("{}: {}", self.config.program, err);
                eprint!("{}", self.usage());
            }
        }
    }

    fn require(&self, option: &str) -> Result<(), ConfigError> {
        if self.registry.contains(option) {
            Ok(())
        } else {
            Err(ConfigError::UnknownOption(option.to_string()))
        }
    }
}

/// Write access to parsed state while an option is being set.
pub struct Setter<'p> {
    registry: &'p Registry,
    hooks: &'p HashMap<String, SetHook>,
    matches: &'p mut Matches,
    alias_stack: Vec<String>,
}

impl Setter<'_> {
    pub fn matches(&self) -> &Matches {
        self.matches
    }

    pub fn definition(&self, name: &str) -> Option<&OptionDef> {
        self.registry.get(name)
    }

    /// Set `name` through its hook if it has one, otherwise by default.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), ParseError> {
        let hooks = self.hooks;
        match hooks.get(name) {
            Some(hook) => hook(self, name, value),
            None => self.set_default(name, value),
        }
    }

    /// Default behavior, by precedence: alias, cumulative, cumulativeset,
    /// value, counter.
    pub fn set_default(&mut self, name: &str, value: Option<&str>) -> Result<(), ParseError> {
        let registry = self.registry;
        let def = registry
            .get(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?;

        if !def.aliases().is_empty() {
            return self.set_alias(def, value);
        }

        let required = || ConfigError::MissingValue(name.to_string());
        if def.has(PropertyKind::Cumulative) {
            self.set_cumulative(name, value.ok_or_else(required)?);
        } else if def.has(PropertyKind::CumulativeSet) {
            self.set_cumulative_set(name, value.ok_or_else(required)?);
        } else if def.takes_value() {
            self.set_with_value(name, value.ok_or_else(required)?);
        } else {
            self.set_without_value(name);
        }
        Ok(())
    }

    pub fn set_without_value(&mut self, name: &str) {
        self.matches.increment(name);
    }

    pub fn set_with_value(&mut self, name: &str, value: &str) {
        self.matches.set_value(name, value);
    }

    pub fn set_cumulative(&mut self, name: &str, value: &str) {
        self.matches.push_value(name, value, false);
    }

    pub fn set_cumulative_set(&mut self, name: &str, value: &str) {
        self.matches.push_value(name, value, true);
    }

    /// Set every option `alias` points at, in declared order, forwarding `value`.
    fn set_alias(&mut self, alias: &OptionDef, value: Option<&str>) -> Result<(), ParseError> {
        let name = alias.name();
        if self.alias_stack.iter().any(|n| n == name) {
            return Err(ConfigError::AliasCycle(name.to_string()).into());
        }
        self.alias_stack.push(name.to_string());
        for target in alias.aliases() {
            if self.registry.get(target).is_none() {
                return Err(ConfigError::UnknownOption(target.clone()).into());
            }
            self.set(target, value)?;
        }
        self.alias_stack.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn parser() -> Parser {
        let mut p = Parser::with_config(ParserConfig {
            program: "prog".to_string(),
            ..Default::default()
        });
        p.set_usage_handler(|_, _| {});
        p
    }

    fn matches(outcome: ParseOutcome) -> Matches {
        match outcome {
            ParseOutcome::Matches(m) => m,
            ParseOutcome::Help(text) => panic!("unexpected help:\n{text}"),
        }
    }

    #[test]
    fn value_option_requires_value() {
        let mut p = parser();
        p.define("file:", "input", &[]).unwrap();
        assert!(p.definition("file").unwrap().takes_value());
        let err = p.parse(&["--file"]).unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn counters_values_and_positionals() {
        let mut p = parser();
        p.define("=verbose", "", &[]).unwrap();
        p.define("=output:", "", &[]).unwrap();
        let m = matches(p.parse(&["-vv", "a", "--output", "x", "-o", "y", "b"]).unwrap());
        assert_eq!(m.get("verbose"), Some(&OptionValue::Count(2)));
        assert_eq!(m.value("output"), Some("y"));
        assert_eq!(m.positionals(), ["a", "b"]);
        assert!(p.is_set("verbose"));
        assert!(!p.is_set("help"));
    }

    #[test]
    fn mandatory_options_are_all_reported() {
        let mut p = parser();
        p.define("input:", "", &["mandatory"]).unwrap();
        p.define("output:", "", &["mandatory"]).unwrap();
        p.define("=verbose", "", &[]).unwrap();
        let err = p.parse(&["-v"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingMandatory(vec!["input".to_string(), "output".to_string()])
        );
    }

    #[test]
    fn mandatory_satisfied_by_default() {
        let mut p = parser();
        p.define("level:", "", &["mandatory", "default:3"]).unwrap();
        p.allow_no_argument(true);
        let m = matches(p.parse::<&str>(&[]).unwrap());
        assert_eq!(m.value("level"), Some("3"));
    }

    #[test]
    fn exclusion_is_symmetric() {
        for args in [["--quiet", "--verbose"], ["--verbose", "--quiet"]] {
            let mut p = parser();
            p.define("quiet", "", &["exclude:verbose"]).unwrap();
            p.define("verbose", "", &[]).unwrap();
            let err = p.parse(&args).unwrap_err();
            assert!(matches!(err, ParseError::Excluded { .. }), "{err:?}");
        }

        let mut p = parser();
        p.define("quiet", "", &["exclude:verbose"]).unwrap();
        p.define("verbose", "", &[]).unwrap();
        assert!(p.parse(&["--quiet"]).is_ok());
        p.reset();
        assert!(p.parse(&["--verbose"]).is_ok());
    }

    #[test]
    fn cumulative_and_cumulativeset() {
        let mut p = parser();
        p.define("tag", "", &["cumulative"]).unwrap();
        p.define("uniq", "", &["cumulativeset"]).unwrap();
        let m = matches(
            p.parse(&[
                "--tag", "a", "--tag", "b", "--uniq", "a", "--uniq", "b", "--uniq", "a",
            ])
            .unwrap(),
        );
        assert_eq!(m.values("tag"), ["a", "b"]);
        assert_eq!(m.count("tag"), 2);
        assert_eq!(m.values("uniq"), ["a", "b"]);
        assert_eq!(m.count("uniq"), 3);
    }

    #[test]
    fn typed_value_round_trip() {
        let mut p = parser();
        p.define("foo", "", &["type:uint", "value"]).unwrap();
        assert!(p.parse(&["--foo", "42"]).is_ok());
        assert!(p.is_set("foo"));
        assert_eq!(p.value("foo"), Some("42"));

        p.reset();
        let err = p.parse(&["--foo", "-1"]).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }), "{err:?}");
        assert!(!p.is_set("foo"));
    }

    #[test]
    fn empty_argv_needs_permission() {
        let mut p = parser();
        assert_eq!(p.parse::<&str>(&[]).unwrap_err(), ParseError::NoArguments);
        p.allow_no_argument(true);
        let m = matches(p.parse::<&str>(&[]).unwrap());
        assert!(m.positionals().is_empty());
    }

    #[test]
    fn alias_sets_targets() {
        let mut aliased = parser();
        aliased.define("a", "", &[]).unwrap();
        aliased.define("b", "", &[]).unwrap();
        aliased.define("opt", "", &["alias:\"a b\""]).unwrap();
        let via_alias = matches(aliased.parse(&["--opt"]).unwrap());

        let mut direct = parser();
        direct.define("a", "", &[]).unwrap();
        direct.define("b", "", &[]).unwrap();
        direct.define("opt", "", &["alias:\"a b\""]).unwrap();
        let via_direct = matches(direct.parse(&["--a", "--b"]).unwrap());

        assert_eq!(via_alias.get("a"), via_direct.get("a"));
        assert_eq!(via_alias.get("b"), via_direct.get("b"));
        assert!(!via_alias.is_set("opt"));
    }

    #[test]
    fn alias_forwards_its_value() {
        let mut p = parser();
        p.define("log:", "", &[]).unwrap();
        p.define("trace:", "", &[]).unwrap();
        p.define("both:", "", &["alias:log trace"]).unwrap();
        let m = matches(p.parse(&["--both", "x"]).unwrap());
        assert_eq!(m.value("log"), Some("x"));
        assert_eq!(m.value("trace"), Some("x"));
    }

    #[test]
    fn alias_cycle_fails_fast() {
        let mut p = parser();
        p.define("a", "", &["alias:b"]).unwrap();
        p.define("b", "", &["alias:a"]).unwrap();
        let err = p.parse(&["--a"]).unwrap_err();
        assert!(matches!(err, ParseError::Config(ConfigError::AliasCycle(_))));
    }

    #[test]
    fn short_collision_leaves_first_intact() {
        let mut p = parser();
        p.define("=verbose", "", &[]).unwrap();
        let err = p.define("=version", "", &[]).unwrap_err();
        assert!(matches!(err, ConfigError::ShortCollision { short: 'v', .. }));
        assert_eq!(p.registry().resolve_short('v'), Some("verbose"));
        let err = p.define("quiet", "", &["short:v"]).unwrap_err();
        assert!(matches!(err, ConfigError::ShortCollision { .. }));
        assert_eq!(p.registry().resolve_short('v'), Some("verbose"));
    }

    #[test]
    fn define_rejects_bad_input() {
        let mut p = parser();
        assert!(matches!(
            p.define("no spaces", "", &[]),
            Err(ConfigError::InvalidName(_))
        ));
        assert!(matches!(
            p.define("ok", "", &["bogus"]),
            Err(ConfigError::UnknownProperty(_))
        ));
        // Earlier properties stick even though a later one failed.
        assert!(p.define("partial", "", &["hidden", "bogus"]).is_err());
        assert_eq!(p.has_property("partial", "hidden"), Some(String::new()));
        assert!(matches!(
            p.define("partial", "", &[]),
            Err(ConfigError::DuplicateOption(_))
        ));
    }

    #[test]
    fn set_property_and_has_property() {
        let mut p = parser();
        p.define("a", "", &[]).unwrap();
        p.define("b", "", &[]).unwrap();
        p.set_property("cumulative", &["a", "b"]).unwrap();
        assert_eq!(p.has_property("a", "value"), Some(String::new()));
        assert_eq!(p.has_property("b", "cumulative"), Some(String::new()));

        p.set_property("type:int", &["a"]).unwrap();
        assert_eq!(p.has_property("a", "type"), Some("int".to_string()));
        assert_eq!(p.has_property("b", "type"), None);
        assert_eq!(p.has_property("a", "no-such-property"), None);

        assert!(matches!(
            p.set_property("type:i*", &["a"]),
            Err(ConfigError::InvalidPayload { .. })
        ));
        assert_eq!(p.has_property("a", "type"), Some("int".to_string()));

        let err = p.set_property("hidden", &["a", "missing", "b"]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownOption("missing".to_string()));
        assert!(p.has_property("a", "hidden").is_some());
        assert!(p.has_property("b", "hidden").is_none());
    }

    #[test]
    fn default_counts_as_set_and_survives_reset() {
        let mut p = parser();
        p.define("mode:", "", &["default:fast"]).unwrap();
        assert!(p.is_set("mode"));
        p.allow_no_argument(true);
        p.parse(&["--mode", "slow"]).unwrap();
        assert_eq!(p.value("mode"), Some("slow"));
        p.reset();
        assert_eq!(p.value("mode"), Some("fast"));
    }

    #[test]
    fn enumerated_values_take_precedence_over_type() {
        let mut p = parser();
        p.define("format:", "", &["type:uint"]).unwrap();
        p.set_allowed_values("format", ["plain", "json"]).unwrap();
        assert!(p.parse(&["--format", "json"]).is_ok());
        p.reset();
        let err = p.parse(&["--format", "JSON"]).unwrap_err();
        match err {
            ParseError::InvalidValue { reason, .. } => assert!(reason.contains("plain, json")),
            other => panic!("expected InvalidValue, got: {other:?}"),
        }
    }

    #[test]
    fn value_check_runs_after_type() {
        let mut p = parser();
        p.define("even:", "", &["type:uint"]).unwrap();
        p.set_value_check("even", |v| v.parse::<u32>().is_ok_and(|n| n % 2 == 0))
            .unwrap();
        assert!(p.parse(&["--even", "4"]).is_ok());
        p.reset();
        assert!(p.parse(&["--even", "3"]).is_err());
        p.reset();
        assert!(p.parse(&["--even", "x"]).is_err());
    }

    #[test]
    fn unknown_type_is_a_config_error() {
        let mut p = parser();
        p.define("color:", "", &["type:color"]).unwrap();
        let err = p.parse(&["--color", "red"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::Config(ConfigError::MissingValidator("color".to_string()))
        );

        p.register_type("color", |v| matches!(v, "red" | "green"));
        assert!(p.parse(&["--color", "red"]).is_ok());
    }

    #[test]
    fn hooks_override_default_setting() {
        let mut p = parser();
        p.define("level:", "", &[]).unwrap();
        p.define("loud", "", &[]).unwrap();
        p.set_hook("level", |setter, name, value| {
            let upper = value.unwrap_or_default().to_ascii_uppercase();
            setter.set_with_value(name, &upper);
            Ok(())
        })
        .unwrap();
        p.set_hook("loud", |_, name, _| Err(ParseError::Hook {
            option: name.to_string(),
            message: "not today".to_string(),
        }))
        .unwrap();

        let m = matches(p.parse(&["--level", "info"]).unwrap());
        assert_eq!(m.value("level"), Some("INFO"));

        p.reset();
        let err = p.parse(&["--loud"]).unwrap_err();
        assert!(matches!(err, ParseError::Hook { .. }));
    }

    #[test]
    fn alias_targets_use_their_hooks() {
        let mut p = parser();
        p.define("a", "", &[]).unwrap();
        p.define("all", "", &["alias:a"]).unwrap();
        p.set_hook("a", |setter, name, _| {
            setter.set_without_value(name);
            setter.set_without_value(name);
            Ok(())
        })
        .unwrap();
        let m = matches(p.parse(&["--all"]).unwrap());
        assert_eq!(m.count("a"), 2);
    }

    #[test]
    fn positional_bounds() {
        let mut p = parser();
        p.set_minimum_parameters(1);
        p.set_maximum_parameters(2);
        p.allow_no_argument(true);
        assert!(matches!(
            p.parse::<&str>(&[]).unwrap_err(),
            ParseError::Arity { count: 0, min: 1, max: 2 }
        ));
        assert!(matches!(
            p.parse(&["a", "b", "c"]).unwrap_err(),
            ParseError::Arity { count: 3, .. }
        ));
        let m = matches(p.parse(&["a", "--", "-b"]).unwrap());
        assert_eq!(m.positionals(), ["a", "-b"]);
    }

    #[test]
    fn failure_restores_previous_state_and_calls_usage() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut p = parser();
        let seen = Rc::clone(&calls);
        p.set_usage_handler(move |_, err| seen.borrow_mut().push(err.to_string()));
        p.define("=verbose", "", &[]).unwrap();
        p.define("must", "", &["mandatory"]).unwrap();

        assert!(p.parse(&["-v"]).is_err());
        assert!(!p.is_set("verbose"));
        assert_eq!(calls.borrow().len(), 1);
        assert!(calls.borrow()[0].contains("--must"));
    }

    #[test]
    fn config_errors_skip_usage() {
        let calls = Rc::new(RefCell::new(0));
        let mut p = parser();
        let seen = Rc::clone(&calls);
        p.set_usage_handler(move |_, _| *seen.borrow_mut() += 1);
        p.define("x:", "", &["type:nothing"]).unwrap();
        assert!(p.parse(&["--x", "1"]).is_err());
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn help_returns_usage() {
        let mut p = parser();
        p.define("=verbose", "Be chatty", &[]).unwrap();
        match p.parse(&["-v", "-h"]).unwrap() {
            ParseOutcome::Help(text) => {
                assert!(text.contains("Usage: prog"));
                assert!(text.contains("Be chatty"));
            }
            other => panic!("expected help, got: {other:?}"),
        }
        assert!(!p.is_set("verbose"));
    }

    #[test]
    fn double_dash_can_be_an_option_value() {
        let mut p = parser();
        p.define("=sep:", "", &[]).unwrap();

        let m = matches(p.parse(&["--sep=--", "x"]).unwrap());
        assert_eq!(m.value("sep"), Some("--"));
        assert_eq!(m.positionals(), ["x"]);

        p.reset();
        let m = matches(p.parse(&["-s", "--", "x", "--", "y"]).unwrap());
        assert_eq!(m.value("sep"), Some("--"));
        assert_eq!(m.positionals(), ["x", "y"]);
    }

    #[test]
    fn define_with_typed_properties() {
        let mut p = parser();
        p.define_with(
            "=level:",
            "",
            [Property::Type("uint".to_string()), Property::Default("3".to_string())],
        )
        .unwrap();
        assert_eq!(p.has_property("level", "type").as_deref(), Some("uint"));
        assert_eq!(p.value("level"), Some("3"));
        assert_eq!(p.registry().resolve_short('l'), Some("level"));

        let err = p
            .define_with("flag", "", [Property::Short('-')])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPayload { .. }));
        assert_eq!(p.registry().resolve_short('-'), None);
    }

    #[test]
    fn typed_set_is_validated() {
        let mut p = parser();
        p.define("opt", "", &[]).unwrap();
        for bad in [
            Property::Short('-'),
            Property::Type("a*".to_string()),
            Property::Exclude(vec![]),
        ] {
            assert!(matches!(
                p.set("opt", bad),
                Err(ConfigError::InvalidPayload { .. })
            ));
        }
    }

    #[test]
    fn counter_default_is_the_starting_count() {
        let mut p = parser();
        p.define("=verbose", "", &["default:2"]).unwrap();
        p.define("=quiet", "", &["default:off"]).unwrap();
        let m = matches(p.parse(&["-v", "-q"]).unwrap());
        assert_eq!(m.count("verbose"), 3);
        // Non-numeric defaults count from zero.
        assert_eq!(m.count("quiet"), 1);
    }

    #[test]
    fn help_can_be_disabled() {
        let mut p = Parser::with_config(ParserConfig {
            builtin_help: false,
            ..Default::default()
        });
        p.set_usage_handler(|_, _| {});
        assert!(p.definition("help").is_none());
        p.define("=host:", "", &[]).unwrap();
        assert_eq!(p.registry().resolve_short('h'), Some("host"));
    }
}
