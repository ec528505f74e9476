//! getopt-style tokenization of argv.
//!
//! A [`Tokenizer`] turns raw arguments into a normalized stream: every option
//! as `-c` or `--name`, each followed by its value when it takes one, then a
//! `--` marker and all non-option arguments in their original order.

use crate::error::SyntaxError;
use crate::registry::{OptionDef, Registry};

/// End-of-options marker.
pub const END_OF_OPTIONS: &str = "--";

/// Something that can split argv the way `getopt --longoptions` does.
///
/// `short_spec` is a getopt short string (`"ho:v"`), `long_spec` lists long
/// names with a trailing `:` for those taking a value.
pub trait Tokenizer {
    fn tokenize(
        &self,
        short_spec: &str,
        long_spec: &[String],
        argv: &[String],
    ) -> Result<Vec<String>, SyntaxError>;
}

/// GNU getopt compatible tokenizer (permuting, long-prefix abbreviation).
#[derive(Debug, Clone, Copy, Default)]
pub struct GetoptLong;

impl Tokenizer for GetoptLong {
    fn tokenize(
        &self,
        short_spec: &str,
        long_spec: &[String],
        argv: &[String],
    ) -> Result<Vec<String>, SyntaxError> {
        let shorts = parse_short_spec(short_spec);
        let longs: Vec<(&str, bool)> = long_spec
            .iter()
            .map(|l| match l.strip_suffix(':') {
                Some(name) => (name, true),
                None => (l.as_str(), false),
            })
            .collect();

        let mut options = Vec::new();
        let mut positionals = Vec::new();

        let mut i = 0usize;
        while i < argv.len() {
            let arg = argv[i].as_str();

            if arg == END_OF_OPTIONS {
                positionals.extend(argv[i + 1..].iter().cloned());
                break;
            }

            if let Some(body) = arg.strip_prefix("--") {
                let (name, inline) = match body.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (body, None),
                };
                let (long, takes_value) = resolve_long(&longs, name)?;
                let flag = format!("--{long}");

                if takes_value {
                    let value = match inline {
                        Some(v) => v.to_string(),
                        None => {
                            i += 1;
                            argv.get(i)
                                .cloned()
                                .ok_or_else(|| SyntaxError::MissingArgument(flag.clone()))?
                        }
                    };
                    options.push(flag);
                    options.push(value);
                } else if inline.is_some() {
                    return Err(SyntaxError::UnexpectedArgument(flag));
                } else {
                    options.push(flag);
                }
                i += 1;
                continue;
            }

            if arg.len() > 1 && arg.starts_with('-') {
                // Bundled shorts: -abc, -ofile, -o file
                let cluster = &arg[1..];
                for (idx, c) in cluster.char_indices() {
                    let flag = format!("-{c}");
                    let Some(&(_, takes_value)) = shorts.iter().find(|(s, _)| *s == c) else {
                        return Err(SyntaxError::UnrecognizedOption(flag));
                    };
                    if !takes_value {
                        options.push(flag);
                        continue;
                    }

                    let rest = &cluster[idx + c.len_utf8()..];
                    let value = if rest.is_empty() {
                        i += 1;
                        argv.get(i)
                            .cloned()
                            .ok_or_else(|| SyntaxError::MissingArgument(flag.clone()))?
                    } else {
                        rest.to_string()
                    };
                    options.push(flag);
                    options.push(value);
                    break;
                }
                i += 1;
                continue;
            }

            positionals.push(arg.to_string());
            i += 1;
        }

        options.push(END_OF_OPTIONS.to_string());
        options.extend(positionals);
        Ok(options)
    }
}

fn parse_short_spec(spec: &str) -> Vec<(char, bool)> {
    let mut out: Vec<(char, bool)> = Vec::new();
    for c in spec.chars() {
        match (c, out.last_mut()) {
            (':', Some((_, takes_value))) => *takes_value = true,
            (':', None) => {}
            (c, _) => out.push((c, false)),
        }
    }
    out
}

fn resolve_long<'s>(longs: &[(&'s str, bool)], name: &str) -> Result<(&'s str, bool), SyntaxError> {
    if let Some(&exact) = longs.iter().find(|(l, _)| *l == name) {
        return Ok(exact);
    }
    let candidates: Vec<(&str, bool)> = if name.is_empty() {
        Vec::new()
    } else {
        longs
            .iter()
            .copied()
            .filter(|(l, _)| l.starts_with(name))
            .collect()
    };
    match candidates.as_slice() {
        [] => Err(SyntaxError::UnrecognizedOption(format!("--{name}"))),
        [only] => Ok(*only),
        many => Err(SyntaxError::Ambiguous {
            option: format!("--{name}"),
            candidates: many.iter().map(|(l, _)| format!("--{l}")).collect(),
        }),
    }
}

/// getopt specs derived from a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetoptSpec {
    pub short: String,
    pub long: Vec<String>,
}

impl GetoptSpec {
    pub fn from_registry(registry: &Registry) -> Self {
        let short = registry
            .shorts()
            .map(|(c, def)| {
                if def.takes_value() {
                    format!("{c}:")
                } else {
                    c.to_string()
                }
            })
            .collect();
        let long = registry
            .iter()
            .map(|def| {
                if def.takes_value() {
                    format!("{}:", def.name())
                } else {
                    def.name().to_string()
                }
            })
            .collect();
        Self { short, long }
    }
}

/// Token stream split at the end-of-options marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Options, each followed by its value if it takes one.
    pub options: Vec<String>,
    pub positionals: Vec<String>,
}

/// Run `tokenizer` with specs built from `registry` and split its output.
///
/// The marker is the first `--` that is not the value of a preceding option,
/// so `--sep=--` and `-s --` keep their value.
pub fn resolve(
    tokenizer: &dyn Tokenizer,
    registry: &Registry,
    argv: &[String],
) -> Result<Resolved, SyntaxError> {
    let spec = GetoptSpec::from_registry(registry);
    tracing::trace!(short = %spec.short, long = ?spec.long, "tokenizing arguments");
    let tokens = tokenizer.tokenize(&spec.short, &spec.long, argv)?;

    let mut options = Vec::new();
    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        if token == END_OF_OPTIONS {
            return Ok(Resolved {
                options,
                positionals: tokens.by_ref().collect(),
            });
        }
        let takes_value = option_takes_value(registry, &token);
        options.push(token);
        if takes_value {
            options.extend(tokens.next());
        }
    }
    Ok(Resolved {
        options,
        positionals: Vec::new(),
    })
}

fn option_takes_value(registry: &Registry, token: &str) -> bool {
    let def = match token.strip_prefix("--") {
        Some(long) => registry.get(long),
        None => {
            let mut chars = token.strip_prefix('-').unwrap_or(token).chars();
            match (chars.next(), chars.next()) {
                (Some(short), None) => registry
                    .resolve_short(short)
                    .and_then(|name| registry.get(name)),
                _ => None,
            }
        }
    };
    def.is_some_and(OptionDef::takes_value)
}
