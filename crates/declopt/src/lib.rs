//! Declarative getopt-style option parsing.
//!
//! Options are registered up front with a compact spec and a list of
//! properties, then argv is parsed in one pass:
//!
//! ```
//! use declopt::{ParseOutcome, Parser};
//!
//! let mut parser = Parser::new();
//! parser.define("=verbose", "Be chatty", &[]).unwrap();
//! parser.define("out=put:", "Where to write", &["mandatory", "type:char"]).unwrap();
//! parser.define("tag", "Attach a tag", &["cumulative"]).unwrap();
//!
//! let outcome = parser
//!     .parse(&["-v", "-p", "x", "--tag", "a", "--tag", "b", "rest"])
//!     .unwrap();
//! let ParseOutcome::Matches(m) = outcome else {
//!     panic!("expected matches");
//! };
//! assert_eq!(m.count("verbose"), 1);
//! assert_eq!(m.value("output"), Some("x"));
//! assert_eq!(m.values("tag"), ["a", "b"]);
//! assert_eq!(m.positionals(), ["rest"]);
//! ```
//!
//! Properties understood by [`Parser::define`] and [`Parser::set_property`]:
//! `hidden`, `mandatory`, `value`, `cumulative`, `cumulativeset`,
//! `type:<name>`, `short:<c>`, `default:<value>`, `exclude:"<names>"`,
//! `alias:"<names>"`.
//!
//! Option names that differ only by `-` versus `_` are distinct options; no
//! attempt is made to detect such pairs.

pub mod config;
pub mod error;
pub mod matches;
pub mod parser;
pub mod property;
pub mod registry;
pub mod report;
pub mod tokenizer;
pub mod types;
mod usage;

pub use config::{DEFAULT_MAX_PARAMETERS, ParserConfig};
pub use error::{ConfigError, ParseError, SyntaxError};
pub use matches::{Matches, OptionValue};
pub use parser::{ParseOutcome, Parser, SetHook, Setter, UsageHandler, ValueCheck};
pub use property::{Property, PropertyKind};
pub use registry::{HELP_OPTION, OptionDef, OptionSpec, Registry};
pub use report::shell_quote;
pub use tokenizer::{END_OF_OPTIONS, GetoptLong, GetoptSpec, Tokenizer};
pub use types::{SystemDatabase, SystemLookup, TypeCheck, TypeValidator};
