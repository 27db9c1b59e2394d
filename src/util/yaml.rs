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

use serde_yaml::Value;

const YAML_ERROR_SHOW_LINES:usize = 10;
const YAML_ERROR_WIDTH:usize = 180; // things will wrap in terminal anyway

// ==============================================================================================================
// PUBLIC API
// ==============================================================================================================

// the error message followed by the lines surrounding the error location, if it has one
pub fn yaml_error_context(yaml_error: &serde_yaml::Error, source: &str) -> String {
    let mut yaml_error_str = format!("{}", yaml_error);
    if yaml_error_str.len() > YAML_ERROR_WIDTH {
        let mut cut = YAML_ERROR_WIDTH - 3;
        while !yaml_error_str.is_char_boundary(cut) {
            cut -= 1;
        }
        yaml_error_str.truncate(cut);
        yaml_error_str.push_str("...");
    }

    let location = match yaml_error.location() {
        Some(x) => x,
        None => return yaml_error_str,
    };
    let error_line = location.line();
    let error_column = location.column();

    let show_start = error_line.saturating_sub(YAML_ERROR_SHOW_LINES);
    let show_stop = error_line + YAML_ERROR_SHOW_LINES;

    let mut out = yaml_error_str;
    out.push('\n');
    for (index, line) in source.lines().enumerate() {
        let count = index + 1;
        if count < show_start || count > show_stop {
            continue;
        }
        if count == error_line {
            out.push_str(&format!("{count:5}:{error_column:5} | >>> | {}\n", line));
        } else {
            out.push_str(&format!("{count:5}       |     | {}\n", line));
        }
    }
    out
}

// null, blank strings and empty collections all count as "not set"
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Sequence(s) => s.is_empty(),
        Value::Mapping(m) => m.is_empty(),
        _ => false,
    }
}

// walk nested mappings by key; the error names the first key that is missing
pub fn lookup_path<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a Value, String> {
    let mut current = value;
    for (depth, key) in keys.iter().enumerate() {
        let mapping = match current.as_mapping() {
            Some(m) => m,
            None => {
                return Err(format!("'{}' is not a mapping", keys[..depth].join(" -> ")));
            }
        };
        current = match mapping.get(*key) {
            Some(v) => v,
            None => {
                return Err(format!("Missing required field '{}' ({})", key, keys[..=depth].join(" -> ")));
            }
        };
    }
    Ok(current)
}

pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => split_list(s),
        _ => Vec::new(),
    }
}

pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// "a, b,,c" -> [a, b, c]
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim())
        .filter(|x| !x.is_empty())
        .map(String::from)
        .collect()
}
