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

use std::path::PathBuf;
use crate::inventory::vars::ClusterDefaults;

pub const DEFAULT_INVENTORY_PATH: &str = "inventory/rke2.yml";
pub const DEFAULT_GROUP_VARS_PATH: &str = "inventory/group_vars/all.yml";
pub const DEFAULT_GENERATED_CONFIGS_DIR: &str = "generated_configs";
pub const DEFAULT_CLUSTER_NAME: &str = "six_node_cluster";

/// Files the YAML fixer visits when none are named
pub const DEFAULT_FIX_TARGETS: &[&str] = &[
    "inventory/rke2.yml",
    "inventory/group_vars/all.yml",
    "site.yml",
    "roles/rke2_cluster/tasks/main.yml",
    "roles/rke2_cluster/defaults/main.yml",
];

/// Configuration for running the generators programmatically
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub inventory_path: PathBuf,
    pub group_vars_path: PathBuf,
    pub generated_configs_dir: PathBuf,
    /// used when the host file has no address mapping section
    pub default_cluster_name: String,
    /// forces a cluster name regardless of the host file
    pub cluster_name: Option<String>,
    pub defaults: ClusterDefaults,
    pub fix_targets: Vec<PathBuf>,
    pub strict: bool,
    pub backup: bool,
    pub verbosity: u32,
    pub include_workers: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            inventory_path: PathBuf::from(DEFAULT_INVENTORY_PATH),
            group_vars_path: PathBuf::from(DEFAULT_GROUP_VARS_PATH),
            generated_configs_dir: PathBuf::from(DEFAULT_GENERATED_CONFIGS_DIR),
            default_cluster_name: String::from(DEFAULT_CLUSTER_NAME),
            cluster_name: None,
            defaults: ClusterDefaults::default(),
            fix_targets: DEFAULT_FIX_TARGETS.iter().map(PathBuf::from).collect(),
            strict: false,
            backup: false,
            verbosity: 0,
            include_workers: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inventory_path = path.into();
        self
    }

    pub fn group_vars<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.group_vars_path = path.into();
        self
    }

    pub fn generated_configs<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.generated_configs_dir = dir.into();
        self
    }

    pub fn cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = Some(name.into());
        self
    }

    pub fn defaults(mut self, defaults: ClusterDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replaces the default target list. An empty list keeps the defaults.
    pub fn fix_targets(mut self, targets: Vec<PathBuf>) -> Self {
        if !targets.is_empty() {
            self.fix_targets = targets;
        }
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn include_workers(mut self, include: bool) -> Self {
        self.include_workers = include;
        self
    }

    /// The explicit name if one was set, else derived from the mapping section
    pub fn resolve_cluster_name(&self, mapping_section: Option<&str>) -> String {
        match &self.cluster_name {
            Some(name) => name.clone(),
            None => crate::inventory::builder::cluster_name_for(mapping_section, &self.default_cluster_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::new();
        assert_eq!(config.inventory_path, PathBuf::from("inventory/rke2.yml"));
        assert_eq!(config.group_vars_path, PathBuf::from("inventory/group_vars/all.yml"));
        assert_eq!(config.generated_configs_dir, PathBuf::from("generated_configs"));
        assert_eq!(config.fix_targets.len(), 5);
        assert_eq!(config.defaults.ansible_user, "ubuntu");
        assert!(!config.strict);
        assert!(!config.include_workers);
    }

    #[test]
    fn test_builder_chain() {
        let config = GeneratorConfig::new()
            .inventory("/tmp/out/rke2.yml")
            .generated_configs("/tmp/out/configs")
            .strict(true)
            .backup(true)
            .verbosity(2)
            .fix_targets(vec![PathBuf::from("site.yml")]);
        assert_eq!(config.inventory_path, PathBuf::from("/tmp/out/rke2.yml"));
        assert_eq!(config.generated_configs_dir, PathBuf::from("/tmp/out/configs"));
        assert_eq!(config.fix_targets, vec![PathBuf::from("site.yml")]);
        assert!(config.strict && config.backup);
        assert_eq!(config.verbosity, 2);
    }

    #[test]
    fn test_empty_fix_targets_keep_defaults() {
        let config = GeneratorConfig::new().fix_targets(Vec::new());
        assert_eq!(config.fix_targets.len(), DEFAULT_FIX_TARGETS.len());
    }

    #[test]
    fn test_resolve_cluster_name() {
        let config = GeneratorConfig::new();
        assert_eq!(config.resolve_cluster_name(Some("three_node")), "three_node_cluster");
        assert_eq!(config.resolve_cluster_name(None), "six_node_cluster");

        let forced = GeneratorConfig::new().cluster_name("lab");
        assert_eq!(forced.resolve_cluster_name(Some("three_node")), "lab");
    }
}
