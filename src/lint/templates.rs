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
use minijinja::Environment;
use walkdir::{DirEntry, WalkDir};
use crate::output::OutputHandler;

pub const TEMPLATE_EXTENSIONS: &[&str] = &["j2", "jinja2", "yml", "yaml"];
pub const SKIPPED_DIRS: &[&str] = &["venv", ".venv"];
const TEMPLATE_MARKERS: &[&str] = &["{{", "{%", "{#"];

/// Compile a template source, only syntax is checked so unknown filters are fine
pub fn check_template_source(source: &str) -> Result<(), minijinja::Error> {
    let env = Environment::new();
    env.template_from_str(source).map(|_| ())
}

/// `None` when the file parses, otherwise a message naming the file
pub fn check_template_file(path: &Path) -> Option<String> {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Some(format!("Error processing {}: {}", path.display(), e)),
    };
    match check_template_source(&source) {
        Ok(()) => None,
        Err(e) => Some(format!("Error in {}: {}", path.display(), e)),
    }
}

/// Every file under `directory` that is, or looks like, a template.
/// Virtualenv directories are not descended into.
pub fn find_template_files(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_template_candidate(p))
        .collect()
}

pub fn check_single_file(path: &Path, output: &dyn OutputHandler) -> i32 {
    if !path.exists() {
        output.on_template_error(&format!("Error: File '{}' does not exist.", path.display()));
        return 1;
    }
    match check_template_file(path) {
        Some(error) => {
            output.on_template_error(&error);
            1
        },
        None => {
            output.on_check_passed(&format!("No Jinja2 syntax errors found in {}.", path.display()));
            0
        }
    }
}

pub fn check_all_files(directory: &Path, output: &dyn OutputHandler) -> i32 {
    let files = find_template_files(directory);
    output.debug(&format!("checking {} template files under {}", files.len(), directory.display()));

    let mut errors_found = false;
    for path in files.iter() {
        if let Some(error) = check_template_file(path) {
            output.on_template_error(&error);
            errors_found = true;
        }
    }

    if errors_found {
        return 1;
    }
    output.on_check_passed("No Jinja2 syntax errors found in template files.");
    0
}

// ==============================================================================================================
// PRIVATE INTERNALS
// ==============================================================================================================

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.depth() > 0
        && entry.file_name().to_str().map(|n| SKIPPED_DIRS.contains(&n)).unwrap_or(false)
}

fn is_template_candidate(path: &Path) -> bool {
    let by_extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEMPLATE_EXTENSIONS.contains(&e))
        .unwrap_or(false);
    if by_extension {
        return true;
    }
    // binary or unreadable files are not templates
    match fs::read_to_string(path) {
        Ok(content) => TEMPLATE_MARKERS.iter().any(|m| content.contains(m)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NullOutputHandler;
    use tempfile::TempDir;

    const GOOD: &str = "
write-kubeconfig-mode: '0644'
tls-san: {{ tls_san | to_yaml }}
node-name: {{ inventory_hostname }}
{% if inventory_hostname == groups['control_plane_nodes'][0] %}
cluster-init: true
{% else %}
server: https://{{ hostvars[groups['control_plane_nodes'][0]].ansible_host }}:9345
{% endif %}
";

    #[test]
    fn test_valid_template() {
        assert!(check_template_source(GOOD).is_ok());
    }

    #[test]
    fn test_unclosed_block() {
        assert!(check_template_source("{% if x %}\nserver: a\n").is_err());
        assert!(check_template_source("value: {{ x ").is_err());
    }

    #[test]
    fn test_check_template_file_messages() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("config.yaml.j2");
        let bad = temp_dir.path().join("broken.j2");
        fs::write(&good, GOOD).unwrap();
        fs::write(&bad, "{% for x in y %}").unwrap();

        assert_eq!(check_template_file(&good), None);
        let err = check_template_file(&bad).unwrap();
        assert!(err.starts_with("Error in "));
        assert!(err.contains("broken.j2"));

        let unreadable = check_template_file(&temp_dir.path().join("missing.j2")).unwrap();
        assert!(unreadable.starts_with("Error processing "));
    }

    #[test]
    fn test_find_template_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("roles/rke2/templates")).unwrap();
        fs::create_dir_all(root.join("venv/lib")).unwrap();
        fs::create_dir_all(root.join(".venv")).unwrap();
        fs::write(root.join("site.yml"), "- hosts: all\n").unwrap();
        fs::write(root.join("roles/rke2/templates/config.yaml.j2"), GOOD).unwrap();
        fs::write(root.join("roles/rke2/templates/motd"), "hello {{ name }}\n").unwrap();
        fs::write(root.join("README.md"), "plain text\n").unwrap();
        fs::write(root.join("blob.bin"), [0xff, 0xfe, 0x7b, 0x7b]).unwrap();
        fs::write(root.join("venv/lib/skip.yml"), "{% if %}").unwrap();
        fs::write(root.join(".venv/skip.j2"), "{% if %}").unwrap();

        let found: Vec<String> = find_template_files(root).iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(found, vec![
            "roles/rke2/templates/config.yaml.j2",
            "roles/rke2/templates/motd",
            "site.yml",
        ]);
    }

    #[test]
    fn test_exit_codes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("ok.j2"), GOOD).unwrap();

        assert_eq!(check_single_file(&root.join("ok.j2"), &NullOutputHandler), 0);
        assert_eq!(check_single_file(&root.join("nope.j2"), &NullOutputHandler), 1);
        assert_eq!(check_all_files(root, &NullOutputHandler), 0);

        fs::write(root.join("bad.yml"), "x: {% if a %}").unwrap();
        assert_eq!(check_all_files(root, &NullOutputHandler), 1);
    }
}
