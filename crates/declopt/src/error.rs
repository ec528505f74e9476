use thiserror::Error;

/// Mistakes in how the parser was set up.
///
/// These are programmer bugs rather than bad user input, so they never
/// trigger the usage handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid option name '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidName(String),

    #[error("option '{0}' is already defined")]
    DuplicateOption(String),

    #[error("invalid option spec '{0}'")]
    InvalidSpec(String),

    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    #[error("invalid payload for property '{property}': '{payload}'")]
    InvalidPayload { property: String, payload: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("short option '-{short}' is already used by '{existing}' (requested by '{requested}')")]
    ShortCollision {
        short: char,
        existing: String,
        requested: String,
    },

    #[error("invalid short option '{0}'")]
    InvalidShort(String),

    #[error("no option is bound to short option '-{0}'")]
    UnknownShort(char),

    #[error("no validator for type '{0}'")]
    MissingValidator(String),

    #[error("alias cycle detected through option '{0}'")]
    AliasCycle(String),

    #[error("option '{0}' requires a value but was set without one")]
    MissingValue(String),
}

/// Rejections coming from the argv tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unrecognized option '{0}'")]
    UnrecognizedOption(String),

    #[error("option '{0}' requires an argument")]
    MissingArgument(String),

    #[error("option '{0}' doesn't allow an argument")]
    UnexpectedArgument(String),

    #[error("option '{option}' is ambiguous; possibilities: {}", join_candidates(.candidates))]
    Ambiguous {
        option: String,
        candidates: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("at least one argument is required")]
    NoArguments,

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("option '--{option}' cannot be used with '--{conflicting}'")]
    Excluded { option: String, conflicting: String },

    #[error("invalid value '{value}' for option '--{option}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    #[error("{}", arity_message(.count, .min, .max))]
    Arity { count: usize, min: usize, max: usize },

    #[error("missing mandatory {}", format_missing(.0))]
    MissingMandatory(Vec<String>),

    #[error("option '--{option}': {message}")]
    Hook { option: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ParseError {
    /// Whether this error is the user's fault (and should show usage).
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

fn arity_message(count: &usize, min: &usize, max: &usize) -> String {
    if count < min {
        format!("too few parameters: expected at least {min}, got {count}")
    } else {
        format!("too many parameters: expected at most {max}, got {count}")
    }
}

fn format_missing(names: &[String]) -> String {
    let list = names
        .iter()
        .map(|n| format!("--{n}"))
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() == 1 {
        format!("option: {list}")
    } else {
        format!("options: {list}")
    }
}

fn join_candidates(candidates: &[String]) -> String {
    candidates.join(" ")
}
