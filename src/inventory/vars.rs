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

use indexmap::IndexMap;
use serde_yaml::Value;
use crate::util::yaml::is_empty_value;

/// Cluster-wide variables, in the order they were first assigned
pub type ClusterVars = IndexMap<String, Value>;

/// Variables whose `[vars]` value is a comma separated list
pub const LIST_VARS: &[&str] = &["tls_sans"];

pub const TLS_SANS: &str = "tls_sans";
pub const RKE2_TOKEN: &str = "rke2_token";
pub const RKE2_VERSION: &str = "rke2_version";
pub const RKE2_CONFIG: &str = "rke2_config";

/// Values filled in when the host file does not set them
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterDefaults {
    pub ansible_user: String,
    pub python_interpreter: String,
    pub ssh_common_args: String,
    pub ssh_private_key_file: String,
    pub rke2_version: String,
    pub tls_sans: Vec<String>,
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        Self {
            ansible_user: String::from("ubuntu"),
            python_interpreter: String::from("/usr/bin/python3"),
            ssh_common_args: String::from("-o StrictHostKeyChecking=no"),
            ssh_private_key_file: String::from("~/.ssh/id_rsa"),
            rke2_version: String::from("v1.29.4+rke2r1"),
            tls_sans: vec![String::from("127.0.0.1"), String::from("localhost")],
        }
    }
}

impl ClusterDefaults {

    pub fn to_vars(&self) -> ClusterVars {
        let mut vars = ClusterVars::new();
        vars.insert("ansible_user".into(), Value::String(self.ansible_user.clone()));
        vars.insert("ansible_python_interpreter".into(), Value::String(self.python_interpreter.clone()));
        vars.insert("ansible_ssh_common_args".into(), Value::String(self.ssh_common_args.clone()));
        vars.insert("ansible_ssh_private_key_file".into(), Value::String(self.ssh_private_key_file.clone()));
        vars.insert(RKE2_VERSION.into(), Value::String(self.rke2_version.clone()));
        vars.insert(TLS_SANS.into(), string_sequence(&self.tls_sans));
        vars
    }
}

/// Merge overrides over defaults, first non-empty value wins.
///
/// Keys keep the order of `defaults`, keys only present in `overrides` follow
/// in their own order. An override that is null, blank, or an empty collection
/// does not replace a default.
pub fn merge_variables(defaults: &ClusterVars, overrides: &ClusterVars) -> ClusterVars {
    let mut merged = ClusterVars::new();
    for (k, v) in defaults.iter() {
        let chosen = match overrides.get(k) {
            Some(o) if !is_empty_value(o) => o.clone(),
            _ => v.clone(),
        };
        merged.insert(k.clone(), chosen);
    }
    for (k, v) in overrides.iter() {
        if merged.contains_key(k) || is_empty_value(v) {
            continue;
        }
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Convert one `key=value` assignment from the host file into a YAML value
pub fn var_value(key: &str, raw: &str) -> Value {
    if LIST_VARS.contains(&key) {
        return string_sequence(&crate::util::yaml::split_list(raw));
    }
    Value::String(raw.to_string())
}

pub fn string_sequence(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::String(s.clone())).collect())
}
