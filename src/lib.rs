//! Parse `robots.txt` documents into per-agent rule sets, sitemap URLs and
//! unrecognized directives, with an HTTP fetcher that feeds the parser.

pub mod config;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod sitemap;

pub use error::{Result, RobotsError};
pub use parser::{parse, parse_bytes, ParseResult, RuleSet};
