//! Human-readable dump of the parsed state.

use crate::matches::OptionValue;
use crate::parser::Parser;

/// Quote `value` so a POSIX shell reads it back unchanged.
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-+=:,./@%".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

fn describe(value: Option<&OptionValue>) -> String {
    match value {
        None => "no".to_string(),
        Some(OptionValue::Count(n)) => format!("yes ({n})"),
        Some(OptionValue::Scalar(v)) => format!("yes: {}", shell_quote(v)),
        Some(OptionValue::Cumulative { count, values }) => {
            let quoted: Vec<String> = values.iter().map(|v| shell_quote(v)).collect();
            format!("yes ({count}): {}", quoted.join(" "))
        }
    }
}

impl Parser {
    /// One `name : state` row per visible option.
    pub fn report(&self) -> String {
        let rows: Vec<(&str, String)> = self
            .visible()
            .map(|def| (def.name(), describe(self.matches.get(def.name()))))
            .collect();
        let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        let mut out = String::new();
        for (name, state) in rows {
            out.push_str(&format!("{:width$} : {}\n", name, state, width = width));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    #[test]
    fn quoting() {
        assert_eq!(shell_quote("plain-value_1.txt"), "plain-value_1.txt");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
    }

    #[test]
    fn report_lists_visible_options() {
        let mut p = Parser::with_config(ParserConfig {
            program: "tool".to_string(),
            ..Default::default()
        });
        p.set_usage_handler(|_, _| {});
        p.define("=verbose", "", &[]).unwrap();
        p.define("name:", "", &[]).unwrap();
        p.define("tag", "", &["cumulative"]).unwrap();
        p.define("secret", "", &["hidden"]).unwrap();
        p.parse(&["-vv", "--name", "a b", "--tag", "x", "--tag", "y z", "--secret"])
            .unwrap();

        let report = p.report();
        assert_eq!(
            report,
            "help    : no\n\
             verbose : yes (2)\n\
             name    : yes: 'a b'\n\
             tag     : yes (2): x 'y z'\n"
        );
    }
}
