//! Help text rendered from the registry.

use crate::parser::Parser;
use crate::registry::OptionDef;

/// Column budget of the short usage line.
const USAGE_WIDTH: usize = 78;

fn placeholder(def: &OptionDef) -> String {
    def.name().to_ascii_uppercase().replace('-', "_")
}

impl Parser {
    pub(crate) fn visible(&self) -> impl Iterator<Item = &OptionDef> {
        self.registry.iter().filter(|def| !def.is_hidden())
    }

    fn value_hint(&self, def: &OptionDef) -> Option<String> {
        if !def.takes_value() {
            return None;
        }
        Some(match self.allowed_values(def.name()) {
            Some(values) if !values.is_empty() => format!("<{}>", values.join("|")),
            _ => placeholder(def),
        })
    }

    /// `Usage: prog [--flag] --mandatory VALUE ...`, wrapped at 78 columns.
    pub fn usage_short(&self) -> String {
        let items: Vec<String> = self
            .visible()
            .map(|def| {
                let mut item = format!("--{}", def.name());
                if let Some(hint) = self.value_hint(def) {
                    item.push(' ');
                    item.push_str(&hint);
                }
                if def.is_mandatory() {
                    item
                } else {
                    format!("[{item}]")
                }
            })
            .collect();

        let mut line = format!("Usage: {}", self.config.program);
        let indent = " ".repeat(line.len() + 1);
        let mut out = String::new();
        let mut line_has_item = false;
        for item in items {
            if line_has_item && line.len() + 1 + item.len() > USAGE_WIDTH {
                out.push_str(&line);
                out.push('\n');
                line = format!("{indent}{item}");
            } else {
                line.push(' ');
                line.push_str(&item);
            }
            line_has_item = true;
        }
        out.push_str(&line);
        out.push('\n');
        out
    }

    /// One aligned row per visible option.
    pub fn usage_long(&self) -> String {
        let rows: Vec<(String, String)> = self
            .visible()
            .map(|def| (self.format_left(def), self.format_help(def)))
            .collect();
        if rows.is_empty() {
            return String::new();
        }

        let mut out = String::from("Options:\n");
        let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (left, help) in rows {
            if help.is_empty() {
                out.push_str(&format!("  {}\n", left));
            } else {
                out.push_str(&format!("  {:width$}  {}\n", left, help, width = width));
            }
        }
        out
    }

    /// Short usage, option table, then the description block.
    pub fn usage(&self) -> String {
        let mut out = self.usage_short();
        let long = self.usage_long();
        if !long.is_empty() {
            out.push('\n');
            out.push_str(&long);
        }
        if let Some(description) = &self.config.description {
            out.push('\n');
            out.push_str(description.trim_end());
            out.push('\n');
        }
        out
    }

    fn format_left(&self, def: &OptionDef) -> String {
        let mut out = match def.short() {
            Some(c) => format!("-{c}, --{}", def.name()),
            None => format!("    --{}", def.name()),
        };
        if let Some(hint) = self.value_hint(def) {
            out.push(' ');
            out.push_str(&hint);
        }
        out
    }

    fn format_help(&self, def: &OptionDef) -> String {
        let mut parts: Vec<String> = Vec::new();
        let description = def.description().trim();
        if !description.is_empty() {
            parts.push(description.to_string());
        }
        if def.is_repeatable() {
            parts.push("Can be repeated.".to_string());
        }
        if let Some(values) = self.allowed_values(def.name()) {
            if !values.is_empty() {
                parts.push(format!("Acceptable values: {}", values.join(" ")));
            }
        }
        if !def.aliases().is_empty() {
            let targets: Vec<String> = def.aliases().iter().map(|a| format!("--{a}")).collect();
            parts.push(format!("Same as: {}", targets.join(" ")));
        }
        if def.is_mandatory() {
            parts.push("(mandatory)".to_string());
        }
        if let Some(default) = def.default_value() {
            parts.push(format!("[default: {default}]"));
        }
        parts.join(" ")
    }
}
