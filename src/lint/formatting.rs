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

use std::fs;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use serde_yaml::Value;
use crate::error::Result;
use crate::inventory::builder::{invalid_yaml, load_yaml_file};
use crate::inventory::validate::validate_yaml_root;
use crate::output::OutputHandler;
use crate::util::io::file_timestamp;

/// Options for a batch of formatting fixes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixOptions {
    pub dry_run: bool,
    pub strict: bool,
    pub backup: bool,
    /// This target must also keep the `all.children` inventory shape
    pub inventory: Option<PathBuf>,
}

/// What happened to each target of a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixReport {
    pub fixed: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub would_change: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl FixReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Strip trailing whitespace and squeeze blank lines, ending with exactly one newline.
///
/// Non-strict mode keeps at most one blank line in a row anywhere. Strict mode
/// only keeps a blank line that sits between two non-blank lines.
/// Input that is entirely blank becomes empty.
pub fn normalize_formatting(text: &str, strict: bool) -> String {
    let mut out : Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            let previous_blank = out.last().map(|l| l.is_empty()).unwrap_or(false);
            if previous_blank || (strict && out.is_empty()) {
                continue;
            }
        }
        out.push(line);
    }
    while out.last().map(|l| l.is_empty()).unwrap_or(false) {
        out.pop();
    }
    if out.is_empty() {
        return String::new();
    }
    let mut result = out.join("\n");
    result.push('\n');
    result
}

/// Rewrite one file in place. Errors are logged and reported as `false`, never raised.
pub fn fix_formatting(path: &Path, strict: bool, output: &dyn OutputHandler) -> bool {
    let (original, normalized) = match plan_fix(path, strict) {
        Ok(x) => x,
        Err(msg) => {
            output.error(&msg);
            return false;
        }
    };
    let changed = original != normalized;
    if changed {
        if let Err(e) = fs::write(path, &normalized) {
            output.error(&format!("unable to write file: {}, {}", path.display(), e));
            return false;
        }
    }
    output.on_file_fixed(path, changed);
    true
}

/// Copy `path` to `<path>.<timestamp>.bak`. Nothing is copied if the source is missing,
/// the backup path is returned either way.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup = PathBuf::from(format!("{}.{}.bak", path.display(), file_timestamp()));
    if path.exists() {
        fs::copy(path, &backup)?;
    }
    Ok(backup)
}

/// Load a YAML file and check it has the `all.children` inventory shape
pub fn fix_yaml_file(path: &Path) -> Result<Value> {
    let data = load_yaml_file(path)?;
    validate_yaml_root(&data)?;
    Ok(data)
}

/// Check that fixed text still parses, every document of a multi-document file included
pub fn check_fixed_yaml(path: &Path, text: &str) -> Result<()> {
    for document in serde_yaml::Deserializer::from_str(text) {
        Value::deserialize(document).map_err(|e| invalid_yaml(path, text, &e))?;
    }
    Ok(())
}

/// Fix every target; a failure on one file does not stop the others.
/// A target that is not valid YAML, or an inventory without `all.children`, fails and is left untouched.
pub fn fix_targets(targets: &[PathBuf], options: &FixOptions, output: &dyn OutputHandler) -> FixReport {
    let mut report = FixReport::default();

    for target in targets.iter() {
        if !target.exists() {
            output.warning(&format!("skipping missing file: {}", target.display()));
            report.skipped.push(target.clone());
            continue;
        }

        let (original, normalized) = match plan_fix(target, options.strict) {
            Ok(x) => x,
            Err(msg) => {
                output.error(&msg);
                report.failed.push(target.clone());
                continue;
            }
        };
        let changed = original != normalized;

        let checked = if options.inventory.as_deref() == Some(target.as_path()) {
            fix_yaml_file(target).map(|_| ())
        } else {
            check_fixed_yaml(target, &normalized)
        };
        if let Err(e) = checked {
            output.error(&format!("{}: {}", target.display(), e));
            report.failed.push(target.clone());
            continue;
        }

        if options.dry_run {
            if changed {
                output.warning(&format!("would fix: {}", target.display()));
                report.would_change.push(target.clone());
            } else {
                output.on_file_unchanged(target);
                report.unchanged.push(target.clone());
            }
            continue;
        }

        if !changed {
            output.on_file_unchanged(target);
            report.unchanged.push(target.clone());
            continue;
        }

        if options.backup {
            match backup_file(target) {
                Ok(b) => output.info(&format!("backed up {} to {}", target.display(), b.display())),
                Err(e) => {
                    output.error(&format!("unable to back up {}: {}", target.display(), e));
                    report.failed.push(target.clone());
                    continue;
                }
            }
        }

        if fix_formatting(target, options.strict, output) {
            report.fixed.push(target.clone());
        } else {
            report.failed.push(target.clone());
        }
    }

    report
}

// ==============================================================================================================
// PRIVATE INTERNALS
// ==============================================================================================================

fn plan_fix(path: &Path, strict: bool) -> std::result::Result<(String, String), String> {
    let bytes = fs::read(path).map_err(|e| format!("unable to read file: {}, {}", path.display(), e))?;
    let original = String::from_utf8(bytes).map_err(|_| format!("file is not valid UTF-8: {}", path.display()))?;
    let normalized = normalize_formatting(&original, strict);
    Ok((original, normalized))
}
