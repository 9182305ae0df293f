//! Gene list input.

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How identifiers are separated in a gene list file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// `", "`
    #[default]
    Comma,
    Newline,
    Tab,
}

impl Separator {
    fn as_delimiter(self) -> &'static str {
        match self {
            Separator::Comma => ", ",
            Separator::Newline => "\n",
            Separator::Tab => "\t",
        }
    }
}

/// Split `text` into identifiers. Surrounding single quotes and whitespace
/// are stripped; blank entries are dropped.
pub fn parse_gene_list(text: &str, sep: Separator) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split(sep.as_delimiter())
        .map(|g| g.trim().trim_matches('\'').trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_gene_list(path: &Path, sep: Separator) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read gene list {}", path.display()))?;
    Ok(parse_gene_list(&text, sep))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_separated_with_quotes() {
        assert_eq!(parse_gene_list("'ARL6', 'BBS1', BBS2\n", Separator::Comma), vec!["ARL6", "BBS1", "BBS2"]);
    }

    #[test]
    fn test_newline_and_tab() {
        assert_eq!(parse_gene_list("ARL6\nBBS1\n\n582\n", Separator::Newline), vec!["ARL6", "BBS1", "582"]);
        assert_eq!(parse_gene_list("ARL6\tBBS1", Separator::Tab), vec!["ARL6", "BBS1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_gene_list("  \n", Separator::Newline).is_empty());
    }

    #[test]
    fn test_windows_line_endings() {
        assert_eq!(parse_gene_list("ARL6\r\nBBS1\r\n", Separator::Newline), vec!["ARL6", "BBS1"]);
    }
}
