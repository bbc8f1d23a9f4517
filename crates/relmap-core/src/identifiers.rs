//! Identifier naming and quoting.
//!
//! Native property names are `camelCase`; column names are `snake_case`.
//! The conversion is character-exact in both directions (no acronym
//! folding), so `to_property_name(&to_column_name(x)) == x` for every
//! camelCase identifier.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How property names become column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// `firstName` <-> `first_name`.
    #[default]
    SnakeCase,
    /// Column names equal property names.
    Verbatim,
}

impl NamingConvention {
    /// Column name for a property.
    pub fn column_name(self, property: &str) -> String {
        match self {
            NamingConvention::SnakeCase => to_column_name(property),
            NamingConvention::Verbatim => property.to_string(),
        }
    }

    /// Property name for a column.
    pub fn property_name(self, column: &str) -> String {
        match self {
            NamingConvention::SnakeCase => to_property_name(column),
            NamingConvention::Verbatim => column.to_string(),
        }
    }
}

/// `firstName` -> `first_name`.
pub fn to_column_name(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `first_name` -> `firstName`.
pub fn to_property_name(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper_next = false;
    for ch in column.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn property_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][A-Za-z0-9]*$").expect("static pattern"))
}

/// Whether `name` is a camelCase identifier the naming convention round-trips.
pub fn is_valid_property_name(name: &str) -> bool {
    property_name_regex().is_match(name)
}

/// Quote an identifier with double quotes (ANSI / Postgres).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote an identifier with backticks (MySQL).
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
