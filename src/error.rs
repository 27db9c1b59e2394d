// Jetporch
// Copyright (C) 2023 - Michael DeHaan <michael@michaeldehaan.net> + contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
// 
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// 
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::fmt;
use std::error::Error as StdError;
use std::io;
use std::path::Path;

/// Main error type for inventory and config generation
#[derive(Debug)]
pub enum InventoryError {
    /// Malformed line in a host-description file
    Parse(String),

    /// Bad hostname, bad IP address, or missing required YAML key
    Validation(String),

    /// A required input file does not exist
    FileNotFound(String),

    /// Template or YAML syntax errors
    Format(String),

    /// Configuration / command line errors
    Config(String),

    /// IO errors
    Io(io::Error),

    /// YAML (de)serialization errors
    Yaml(serde_yaml::Error),

    /// Other errors
    Other(String),
}

impl InventoryError {
    pub fn parse_at(line_number: usize, line: &str, reason: &str) -> Self {
        InventoryError::Parse(format!("line {}: {} ({})", line_number, reason, line))
    }

    pub fn file_not_found(path: &Path) -> Self {
        InventoryError::FileNotFound(format!("File not found: {}", path.display()))
    }
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryError::Parse(msg) => write!(f, "Parse error: {}", msg),
            InventoryError::Validation(msg) => write!(f, "Validation error: {}", msg),
            InventoryError::FileNotFound(msg) => write!(f, "{}", msg),
            InventoryError::Format(msg) => write!(f, "Format error: {}", msg),
            InventoryError::Config(msg) => write!(f, "Configuration error: {}", msg),
            InventoryError::Io(err) => write!(f, "IO error: {}", err),
            InventoryError::Yaml(err) => write!(f, "YAML error: {}", err),
            InventoryError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl StdError for InventoryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            InventoryError::Io(err) => Some(err),
            InventoryError::Yaml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for InventoryError {
    fn from(err: io::Error) -> Self {
        InventoryError::Io(err)
    }
}

impl From<serde_yaml::Error> for InventoryError {
    fn from(err: serde_yaml::Error) -> Self {
        InventoryError::Yaml(err)
    }
}

impl From<String> for InventoryError {
    fn from(err: String) -> Self {
        InventoryError::Other(err)
    }
}

impl From<&str> for InventoryError {
    fn from(err: &str) -> Self {
        InventoryError::Other(err.to_string())
    }
}

/// Result type alias for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Helper trait to lift the String errors of the util layer into InventoryError
pub trait ErrorContext<T> {
    fn context(self, context: &str) -> Result<T>;
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::result::Result<T, String> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| InventoryError::Other(format!("{}: {}", context, e)))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| InventoryError::Other(format!("{}: {}", f(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_at_includes_line_number() {
        let err = InventoryError::parse_at(7, "k1", "expected '<hostname> <ip>'");
        let msg = err.to_string();
        assert!(msg.starts_with("Parse error: line 7"));
        assert!(msg.contains("k1"));
    }

    #[test]
    fn test_file_not_found_message() {
        let err = InventoryError::file_not_found(Path::new("/nonexistent/hosts.txt"));
        assert_eq!(err.to_string(), "File not found: /nonexistent/hosts.txt");
    }

    #[test]
    fn test_io_error_has_source() {
        let err: InventoryError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_error_context() {
        let r: std::result::Result<(), String> = Err("unable to open file: x".to_string());
        let err = r.context("loading inventory").unwrap_err();
        assert_eq!(err.to_string(), "Error: loading inventory: unable to open file: x");
    }
}
