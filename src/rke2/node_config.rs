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

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use crate::error::{ErrorContext, InventoryError, Result};
use crate::inventory::hosts::{Role, vars as host_vars};
use crate::inventory::vars::RKE2_CONFIG;
use crate::inventory::validate::required_inventory_path;
use crate::util::io::write_new_local_file;
use crate::util::yaml::{lookup_path, scalar_to_string, string_list};

pub const DEFAULT_TOKEN: &str = "test123";
pub const SUPERVISOR_PORT: u16 = 9345;
pub const KUBECONFIG_MODE: &str = "0644";
/// Used as the join address when no control-plane address is recorded anywhere
pub const FALLBACK_SERVER_ADDRESS: &str = "127.0.0.1";

/// The cluster-wide RKE2 settings node configs are derived from
#[derive(Debug, Clone, PartialEq)]
pub struct Rke2Settings {
    pub token: String,
    pub tls_san: Vec<String>,
    pub control_plane_ips: Vec<String>,
}

impl Default for Rke2Settings {
    fn default() -> Self {
        Self {
            token: String::from(DEFAULT_TOKEN),
            tls_san: Vec::new(),
            control_plane_ips: Vec::new(),
        }
    }
}

impl Rke2Settings {
    // https://<first control plane>:9345
    pub fn server_url(&self) -> String {
        let first = self.control_plane_ips.first().map(|s| s.as_str()).unwrap_or(FALLBACK_SERVER_ADDRESS);
        if first.contains(':') {
            format!("https://[{}]:{}", first, SUPERVISOR_PORT)
        } else {
            format!("https://{}:{}", first, SUPERVISOR_PORT)
        }
    }
}

/// Per-host label / taint replacements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOverrides {
    pub node_labels: Option<Vec<String>>,
    pub node_taints: Option<Vec<String>>,
}

impl NodeOverrides {
    pub fn from_host_vars(vars: &Value) -> Self {
        Self {
            node_labels: vars.get(host_vars::NODE_LABELS).map(string_list),
            node_taints: vars.get(host_vars::NODE_TAINTS).map(string_list),
        }
    }
}

/// How a node finds its cluster: the first server initializes it, everything else joins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinMode {
    ClusterInit {
        #[serde(rename = "cluster-init")]
        cluster_init: bool,
    },
    Server {
        server: String,
    },
}

/// One RKE2 `config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeConfig {
    pub write_kubeconfig_mode: String,
    pub tls_san: Vec<String>,
    pub node_name: String,
    pub token: String,
    #[serde(flatten)]
    pub join: JoinMode,
    pub node_label: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_taint: Vec<String>,
}

impl NodeConfig {
    pub fn is_cluster_init(&self) -> bool {
        matches!(self.join, JoinMode::ClusterInit { cluster_init: true })
    }

    pub fn server(&self) -> Option<&str> {
        match &self.join {
            JoinMode::Server { server } => Some(server.as_str()),
            _ => None,
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

pub fn default_labels(hostname: &str, role: Role) -> Vec<String> {
    let (instance_type, workload) = match role {
        Role::ControlPlane => ("control-plane", "control-plane"),
        Role::Worker => ("worker", "mixed"),
    };
    vec![
        format!("node.kubernetes.io/instance-type={}", instance_type),
        format!("kubernetes.io/hostname={}", hostname),
        format!("workload.type={}", workload),
    ]
}

pub fn default_taints(role: Role) -> Vec<String> {
    match role {
        Role::ControlPlane => vec![String::from("CriticalAddonsOnly=true:NoSchedule")],
        Role::Worker => Vec::new(),
    }
}

/// Config for a control-plane node. Exactly the first one gets `cluster-init`.
pub fn derive_node_config(hostname: &str, is_first: bool, settings: &Rke2Settings, overrides: &NodeOverrides) -> NodeConfig {
    let join = if is_first {
        JoinMode::ClusterInit { cluster_init: true }
    } else {
        JoinMode::Server { server: settings.server_url() }
    };
    build_config(hostname, Role::ControlPlane, join, settings, overrides)
}

/// Config for an agent node, which always joins the first server
pub fn derive_worker_config(hostname: &str, settings: &Rke2Settings, overrides: &NodeOverrides) -> NodeConfig {
    let join = JoinMode::Server { server: settings.server_url() };
    build_config(hostname, Role::Worker, join, settings, overrides)
}

/// Read the `rke2_config` block (from `all.vars`, else the document root).
/// Missing control-plane addresses are taken from the cluster's host list.
pub fn rke2_settings(doc: &Value, cluster_name: &str) -> Rke2Settings {
    let mut settings = Rke2Settings::default();

    let block = lookup_path(doc, &["all", "vars", RKE2_CONFIG]).ok()
        .or_else(|| doc.get(RKE2_CONFIG));

    if let Some(block) = block {
        if let Some(token) = block.get("token").and_then(scalar_to_string) {
            if !token.trim().is_empty() {
                settings.token = token;
            }
        }
        if let Some(sans) = block.get("tls-san") {
            settings.tls_san = string_list(sans);
        }
        if let Some(ips) = block.get("control_plane_nodes") {
            settings.control_plane_ips = string_list(ips);
        }
    }

    if settings.control_plane_ips.is_empty() {
        settings.control_plane_ips = hosts_of(doc, cluster_name, Role::ControlPlane).iter()
            .filter_map(|(_, vars)| vars.get(host_vars::ANSIBLE_HOST).and_then(scalar_to_string))
            .collect();
    }
    settings
}

/// One config per host of the role group, in inventory order
pub fn node_configs(doc: &Value, cluster_name: &str, role: Role) -> Result<Vec<NodeConfig>> {
    let mut path = required_inventory_path(cluster_name);
    path[4] = role.group_name();
    if role == Role::ControlPlane {
        lookup_path(doc, &path).map_err(InventoryError::Validation)?;
    }

    let settings = rke2_settings(doc, cluster_name);
    let configs = hosts_of(doc, cluster_name, role).iter().enumerate()
        .map(|(index, (hostname, vars))| {
            let overrides = NodeOverrides::from_host_vars(vars);
            match role {
                Role::ControlPlane => derive_node_config(hostname, index == 0, &settings, &overrides),
                Role::Worker => derive_worker_config(hostname, &settings, &overrides),
            }
        })
        .collect();
    Ok(configs)
}

pub fn config_file_name(hostname: &str, timestamp: &str) -> String {
    format!("rke2_config_{}_{}.yaml", hostname, timestamp)
}

/// The file each config will be written to. Fails before anything is written if one
/// already exists, which happens when `configs` runs twice within the same second.
pub fn node_config_paths(dir: &Path, configs: &[NodeConfig], timestamp: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for config in configs.iter() {
        let path = dir.join(config_file_name(&config.node_name, timestamp));
        if path.exists() {
            return Err(InventoryError::Config(format!(
                "config for {} already exists at {}, configs were generated less than a second ago",
                config.node_name, path.display())));
        }
        paths.push(path);
    }
    Ok(paths)
}

/// Writes a new file per invocation, an existing file of the same name is an error
pub fn write_node_config(dir: &Path, config: &NodeConfig, timestamp: &str) -> Result<PathBuf> {
    let path = dir.join(config_file_name(&config.node_name, timestamp));
    let body = config.to_yaml_string()?;
    write_new_local_file(&path, &body).with_context(|| format!("writing config for {}", config.node_name))?;
    Ok(path)
}

// ==============================================================================================================
// PRIVATE INTERNALS
// ==============================================================================================================

fn build_config(hostname: &str, role: Role, join: JoinMode, settings: &Rke2Settings, overrides: &NodeOverrides) -> NodeConfig {
    NodeConfig {
        write_kubeconfig_mode: String::from(KUBECONFIG_MODE),
        tls_san: settings.tls_san.clone(),
        node_name: hostname.to_string(),
        token: settings.token.clone(),
        join,
        node_label: overrides.node_labels.clone().unwrap_or_else(|| default_labels(hostname, role)),
        node_taint: overrides.node_taints.clone().unwrap_or_else(|| default_taints(role)),
    }
}

fn hosts_of(doc: &Value, cluster_name: &str, role: Role) -> Vec<(String, Value)> {
    let mut path = required_inventory_path(cluster_name);
    path[4] = role.group_name();
    let hosts = match lookup_path(doc, &path).ok().and_then(|h| h.as_mapping()) {
        Some(m) => m,
        None => return Vec::new(),
    };
    hosts.iter()
        .filter_map(|(k, v)| k.as_str().map(|name| (name.to_string(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_inventory() -> Value {
        serde_yaml::from_str("
all:
  children:
    six_node_cluster:
      children:
        control_plane_nodes:
          hosts:
            k1: {ansible_host: 192.168.1.23}
            k2: {ansible_host: 192.168.1.24}
            k3: {ansible_host: 192.168.1.25, node_taints: ''}
        worker_nodes:
          hosts:
            worker1: {ansible_host: 192.168.1.26, node_labels: 'zone=a,disk=ssd'}
rke2_config:
  tls-san: [127.0.0.1, 192.168.1.23, kubernetes, kubernetes.default]
  token: test123
").unwrap()
    }

    fn settings(ips: &[&str]) -> Rke2Settings {
        Rke2Settings {
            token: String::from("abc"),
            tls_san: vec![String::from("127.0.0.1")],
            control_plane_ips: ips.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_first_node_gets_cluster_init() {
        let config = derive_node_config("k1", true, &settings(&["192.168.1.23"]), &NodeOverrides::default());
        assert!(config.is_cluster_init());
        assert_eq!(config.server(), None);
        let yaml = config.to_yaml_string().unwrap();
        assert!(yaml.contains("cluster-init: true"));
        assert!(!yaml.contains("server:"));
    }

    #[test]
    fn test_other_nodes_join_first() {
        let s = settings(&["192.168.1.23", "192.168.1.24", "192.168.1.25"]);
        let config = derive_node_config("k2", false, &s, &NodeOverrides::default());
        assert!(!config.is_cluster_init());
        assert_eq!(config.server(), Some("https://192.168.1.23:9345"));
        let yaml = config.to_yaml_string().unwrap();
        assert!(yaml.contains("server: https://192.168.1.23:9345"));
        assert!(yaml.contains("workload.type=control-plane"));
        assert!(yaml.contains("CriticalAddonsOnly=true:NoSchedule"));
    }

    #[test]
    fn test_fallback_server_address() {
        let config = derive_node_config("k2", false, &settings(&[]), &NodeOverrides::default());
        assert_eq!(config.server(), Some("https://127.0.0.1:9345"));
    }

    #[test]
    fn test_ipv6_server_is_bracketed() {
        assert_eq!(settings(&["fd00::10"]).server_url(), "https://[fd00::10]:9345");
    }

    #[test]
    fn test_overrides_replace_labels() {
        let overrides = NodeOverrides {
            node_labels: Some(vec![String::from("zone=a")]),
            node_taints: Some(Vec::new()),
        };
        let config = derive_node_config("k1", true, &settings(&["10.0.0.1"]), &overrides);
        assert_eq!(config.node_label, vec!["zone=a"]);
        assert!(config.node_taint.is_empty());
        assert!(!config.to_yaml_string().unwrap().contains("node-taint"));
    }

    #[test]
    fn test_worker_config() {
        let config = derive_worker_config("worker1", &settings(&["192.168.1.23"]), &NodeOverrides::default());
        assert_eq!(config.server(), Some("https://192.168.1.23:9345"));
        assert!(config.node_label.contains(&String::from("node.kubernetes.io/instance-type=worker")));
        assert!(config.node_taint.is_empty());
    }

    #[test]
    fn test_settings_from_top_level_block() {
        let s = rke2_settings(&sample_inventory(), "six_node_cluster");
        assert_eq!(s.token, "test123");
        assert!(s.tls_san.contains(&String::from("127.0.0.1")));
        assert_eq!(s.control_plane_ips, vec!["192.168.1.23", "192.168.1.24", "192.168.1.25"]);
    }

    #[test]
    fn test_settings_defaults_when_absent() {
        let doc: Value = serde_yaml::from_str("all: {children: {}}").unwrap();
        let s = rke2_settings(&doc, "six_node_cluster");
        assert_eq!(s.token, DEFAULT_TOKEN);
        assert!(s.tls_san.is_empty());
        assert!(s.control_plane_ips.is_empty());
    }

    #[test]
    fn test_settings_prefer_all_vars() {
        let doc: Value = serde_yaml::from_str("
all:
  vars:
    rke2_config: {token: fromvars, tls-san: [a], control_plane_nodes: [10.9.9.9]}
rke2_config: {token: toplevel}
").unwrap();
        let s = rke2_settings(&doc, "six_node_cluster");
        assert_eq!(s.token, "fromvars");
        assert_eq!(s.control_plane_ips, vec!["10.9.9.9"]);
    }

    #[test]
    fn test_node_configs_in_inventory_order() {
        let configs = node_configs(&sample_inventory(), "six_node_cluster", Role::ControlPlane).unwrap();
        let names: Vec<&str> = configs.iter().map(|c| c.node_name.as_str()).collect();
        assert_eq!(names, vec!["k1", "k2", "k3"]);
        assert!(configs[0].is_cluster_init());
        for config in configs[1..].iter() {
            assert_eq!(config.server(), Some("https://192.168.1.23:9345"));
        }
        assert!(configs[2].node_taint.is_empty());
    }

    #[test]
    fn test_worker_node_configs_use_host_labels() {
        let configs = node_configs(&sample_inventory(), "six_node_cluster", Role::Worker).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].node_label, vec!["zone=a", "disk=ssd"]);
    }

    #[test]
    fn test_node_configs_missing_cluster() {
        let err = node_configs(&sample_inventory(), "three_node_cluster", Role::ControlPlane).unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
    }

    #[test]
    fn test_write_node_config_is_append_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = derive_node_config("k1", true, &settings(&["10.0.0.1"]), &NodeOverrides::default());

        let path = write_node_config(temp_dir.path(), &config, "20240101_120000").unwrap();
        assert!(path.ends_with("rke2_config_k1_20240101_120000.yaml"));
        let loaded: NodeConfig = serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);

        assert!(write_node_config(temp_dir.path(), &config, "20240101_120000").is_err());
        assert!(write_node_config(temp_dir.path(), &config, "20240101_120001").is_ok());
    }

    #[test]
    fn test_node_config_paths_catch_same_second_rerun() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings(&["10.0.0.1"]);
        let configs = vec![
            derive_node_config("k1", true, &settings, &NodeOverrides::default()),
            derive_node_config("k2", false, &settings, &NodeOverrides::default()),
        ];

        let paths = node_config_paths(temp_dir.path(), &configs, "20240101_120000").unwrap();
        assert_eq!(paths[1], temp_dir.path().join("rke2_config_k2_20240101_120000.yaml"));
        assert!(paths.iter().all(|p| !p.exists()));

        write_node_config(temp_dir.path(), &configs[1], "20240101_120000").unwrap();
        let err = node_config_paths(temp_dir.path(), &configs, "20240101_120000").unwrap_err();
        assert!(matches!(err, InventoryError::Config(_)));
        assert!(err.to_string().contains("k2"));
        assert!(!paths[0].exists());
    }
}
