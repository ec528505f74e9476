use std::path::Path;

/// Upper bound on positional parameters when none is configured.
pub const DEFAULT_MAX_PARAMETERS: usize = 100_000;

/// Parser-wide knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Name shown in `Usage:` lines and error messages.
    pub program: String,
    /// Free text appended verbatim to the long usage.
    pub description: Option<String>,
    pub min_parameters: usize,
    pub max_parameters: usize,
    /// Accept an empty argv instead of failing.
    pub allow_no_argument: bool,
    /// Register `-h/--help` on construction.
    pub builtin_help: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            program: program_name(),
            description: None,
            min_parameters: 0,
            max_parameters: DEFAULT_MAX_PARAMETERS,
            allow_no_argument: false,
            builtin_help: true,
        }
    }
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "program".to_string())
}
