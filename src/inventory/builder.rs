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

use std::path::Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use crate::error::{ErrorContext, InventoryError, Result};
use crate::inventory::hosts::{HostEntry, Role};
use crate::inventory::vars::{self, ClusterDefaults, ClusterVars, merge_variables, string_sequence};
use crate::util::io::{read_local_file, write_local_file};
use crate::util::yaml::{string_list, yaml_error_context};

pub const WARNING_HEADER: &str = "\
#####################################################################
# WARNING: THIS IS A GENERATED FILE. DO NOT EDIT DIRECTLY!
#
# This file is automatically generated by rke2-inventory.
# To make changes, edit the host file and regenerate this file.
#####################################################################
";

pub const CLUSTER_SUFFIX: &str = "_cluster";

pub type HostVars = IndexMap<String, Value>;

// the inventory YAML structures, field order is output order

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDocument {
    pub all: AllGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllGroup {
    pub children: IndexMap<String, ClusterGroup>,
    #[serde(default)]
    pub vars: ClusterVars,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterGroup {
    pub children: RoleGroups,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub vars: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleGroups {
    pub control_plane_nodes: HostGroup,
    #[serde(default)]
    pub worker_nodes: HostGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostGroup {
    #[serde(default)]
    pub hosts: IndexMap<String, HostVars>,
}

impl RoleGroups {
    pub fn group(&self, role: Role) -> &HostGroup {
        match role {
            Role::ControlPlane => &self.control_plane_nodes,
            Role::Worker => &self.worker_nodes,
        }
    }

    fn group_mut(&mut self, role: Role) -> &mut HostGroup {
        match role {
            Role::ControlPlane => &mut self.control_plane_nodes,
            Role::Worker => &mut self.worker_nodes,
        }
    }
}

impl InventoryDocument {

    pub fn cluster(&self, cluster_name: &str) -> Option<&ClusterGroup> {
        self.all.children.get(cluster_name)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_yaml::to_value(self)?)
    }
}

/// `six_node` -> `six_node_cluster`, names already ending in `_cluster` are kept
pub fn cluster_name_for(mapping_section: Option<&str>, default_name: &str) -> String {
    match mapping_section {
        Some(s) if s.ends_with(CLUSTER_SUFFIX) => s.to_string(),
        Some(s) if !s.is_empty() => format!("{}{}", s, CLUSTER_SUFFIX),
        _ => default_name.to_string(),
    }
}

/// Assemble the inventory for one cluster.
///
/// Hosts keep the order of the input slices. `overrides` replaces `defaults`
/// through `merge_variables`, and the merged variables also feed the
/// `rke2_config` block the config generator reads back.
pub fn build_inventory(control_plane: &[HostEntry], workers: &[HostEntry], overrides: &ClusterVars,
                       defaults: &ClusterDefaults, cluster_name: &str) -> InventoryDocument {

    let mut roles = RoleGroups {
        control_plane_nodes: HostGroup::default(),
        worker_nodes: HostGroup::default(),
    };
    for (role, entries) in [(Role::ControlPlane, control_plane), (Role::Worker, workers)] {
        let group = roles.group_mut(role);
        for entry in entries.iter() {
            group.hosts.insert(entry.hostname.clone(), entry.host_vars());
        }
    }

    let cp_ips : Vec<String> = control_plane.iter().map(|h| h.ip.clone()).collect();

    let mut cluster_vars : IndexMap<String, Value> = IndexMap::new();
    let cluster_type = cluster_name.strip_suffix(CLUSTER_SUFFIX).unwrap_or(cluster_name);
    cluster_vars.insert("cluster_type".into(), Value::String(cluster_type.to_string()));
    if let Some(first) = cp_ips.first() {
        cluster_vars.insert("first_server_ip".into(), Value::String(first.clone()));
    }

    let mut all_vars = merge_variables(&defaults.to_vars(), overrides);
    let rke2_config = rke2_config_block(&all_vars, &cp_ips);
    all_vars.insert(vars::RKE2_CONFIG.into(), rke2_config);

    let mut children = IndexMap::new();
    children.insert(cluster_name.to_string(), ClusterGroup { children: roles, vars: cluster_vars });

    InventoryDocument {
        all: AllGroup { children, vars: all_vars },
    }
}

/// Build straight from address lists, naming hosts K1..Kn with control plane first.
/// TLS SANs are every node address, duplicates removed.
pub fn build_inventory_from_ips(control_plane_ips: &[String], worker_ips: &[String],
                                defaults: &ClusterDefaults, cluster_name: &str) -> InventoryDocument {

    let name = |idx: usize| format!("K{}", idx + 1);
    let control_plane : Vec<HostEntry> = control_plane_ips.iter().enumerate()
        .map(|(i, ip)| HostEntry::new(&name(i), ip, Role::ControlPlane))
        .collect();
    let workers : Vec<HostEntry> = worker_ips.iter().enumerate()
        .map(|(i, ip)| HostEntry::new(&name(i + control_plane_ips.len()), ip, Role::Worker))
        .collect();

    let mut sans : Vec<String> = Vec::new();
    for ip in control_plane_ips.iter().chain(worker_ips.iter()) {
        if !sans.contains(ip) {
            sans.push(ip.clone());
        }
    }
    let mut overrides = ClusterVars::new();
    overrides.insert(vars::TLS_SANS.into(), string_sequence(&sans));

    build_inventory(&control_plane, &workers, &overrides, defaults, cluster_name)
}

pub fn write_inventory(doc: &InventoryDocument, path: &Path) -> Result<()> {
    let body = doc.to_yaml_string()?;
    let mut contents = String::from(WARNING_HEADER);
    contents.push('\n');
    contents.push_str(body.trim_end());
    contents.push('\n');
    write_local_file(path, &contents).context("writing inventory")
}

/// Read any YAML file into a generic value, syntax errors shown with surrounding lines
pub fn load_yaml_file(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(InventoryError::file_not_found(path));
    }
    let contents = read_local_file(path).context("reading YAML")?;
    serde_yaml::from_str::<Value>(&contents).map_err(|e| invalid_yaml(path, &contents, &e))
}

/// The error for YAML text read from `path` that does not parse
pub fn invalid_yaml(path: &Path, contents: &str, err: &serde_yaml::Error) -> InventoryError {
    InventoryError::Format(format!("Invalid YAML format in {}: {}", path.display(), yaml_error_context(err, contents)))
}

pub fn load_inventory(path: &Path) -> Result<InventoryDocument> {
    let value = load_yaml_file(path)?;
    Ok(serde_yaml::from_value(value)?)
}

// ==============================================================================================================
// PRIVATE INTERNALS
// ==============================================================================================================

fn rke2_config_block(all_vars: &ClusterVars, cp_ips: &[String]) -> Value {
    let mut block = serde_yaml::Mapping::new();
    if let Some(token) = all_vars.get(vars::RKE2_TOKEN) {
        block.insert("token".into(), token.clone());
    }
    let sans = all_vars.get(vars::TLS_SANS).map(string_list).unwrap_or_default();
    block.insert("tls-san".into(), string_sequence(&sans));
    block.insert("control_plane_nodes".into(), string_sequence(cp_ips));
    Value::Mapping(block)
}
