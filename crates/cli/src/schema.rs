use anyhow::{Context, Result};
use declopt::{OptionSpec, ParserConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Option definitions and parser knobs read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserSchema {
    /// Program name shown in usage (default: `declopt`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Text appended to the long usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_parameters: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parameters: Option<usize>,

    #[serde(default)]
    pub allow_no_argument: bool,

    /// Register `-h/--help` (default: true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_help: Option<bool>,

    #[serde(default)]
    pub options: Vec<OptionSchema>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSchema {
    /// Option spec, e.g. `=verbose` or `out=put:`.
    pub spec: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Property tokens, e.g. `mandatory` or `type:uint`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,

    /// Enumerated acceptable values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

pub fn load_schema(path: &Path) -> Result<ParserSchema> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse schema JSON: {}", path.display()))
}

impl ParserSchema {
    pub fn config(&self) -> ParserConfig {
        let defaults = ParserConfig::default();
        ParserConfig {
            program: self
                .program
                .clone()
                .unwrap_or_else(|| "declopt".to_string()),
            description: self.description.clone(),
            min_parameters: self.min_parameters.unwrap_or(defaults.min_parameters),
            max_parameters: self.max_parameters.unwrap_or(defaults.max_parameters),
            allow_no_argument: self.allow_no_argument,
            builtin_help: self.builtin_help.unwrap_or(defaults.builtin_help),
        }
    }

    /// Register every option on a fresh parser.
    pub fn build(&self) -> Result<declopt::Parser> {
        let mut parser = declopt::Parser::with_config(self.config());

        for option in &self.options {
            let properties: Vec<&str> = option.properties.iter().map(String::as_str).collect();
            parser
                .define(&option.spec, &option.description, &properties)
                .with_context(|| format!("invalid option '{}'", option.spec))?;

            if !option.values.is_empty() {
                let name = OptionSpec::parse(&option.spec)?.name;
                parser.set_allowed_values(&name, option.values.iter().cloned())?;
            }
        }

        tracing::debug!(options = self.options.len(), "built parser from schema");
        Ok(parser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_round_trips_camel_case_keys() {
        let json = r#"{
            "program": "demo",
            "minParameters": 1,
            "allowNoArgument": true,
            "options": [
                { "spec": "=verbose", "description": "Be chatty" },
                { "spec": "format:", "properties": ["mandatory"], "values": ["plain", "json"] }
            ]
        }"#;
        let schema: ParserSchema = serde_json::from_str(json).unwrap();
        let config = schema.config();
        assert_eq!(config.program, "demo");
        assert_eq!(config.min_parameters, 1);
        assert_eq!(config.max_parameters, declopt::DEFAULT_MAX_PARAMETERS);
        assert!(config.allow_no_argument);
        assert!(config.builtin_help);

        let parser = schema.build().unwrap();
        assert_eq!(parser.registry().resolve_short('v'), Some("verbose"));
        assert_eq!(
            parser.allowed_values("format"),
            Some(["plain".to_string(), "json".to_string()].as_slice())
        );
    }

    #[test]
    fn build_reports_the_bad_option() {
        let schema = ParserSchema {
            options: vec![OptionSchema {
                spec: "bad name".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = schema.build().unwrap_err();
        assert!(format!("{err:#}").contains("invalid option 'bad name'"));
    }
}
