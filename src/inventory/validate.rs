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

use std::collections::HashSet;
use std::net::IpAddr;
use serde_yaml::Value;
use crate::error::{InventoryError, Result};
use crate::inventory::hosts::HostEntry;
use crate::util::yaml::lookup_path;

/// Check every entry has a non-empty hostname and a parseable IPv4/IPv6 address.
/// The error names the first offending entry.
pub fn validate_nodes(nodes: &[HostEntry]) -> Result<bool> {
    for node in nodes.iter() {
        if node.hostname.trim().is_empty() {
            return Err(InventoryError::Validation(
                format!("Invalid hostname for entry with IP '{}': hostname must be a non-empty string", node.ip)
            ));
        }
        if node.ip.trim().parse::<IpAddr>().is_err() {
            return Err(InventoryError::Validation(
                format!("Invalid IP address '{}' for host '{}'", node.ip, node.hostname)
            ));
        }
    }
    Ok(true)
}

/// A hostname may belong to at most one role group
pub fn validate_role_assignment(control_plane: &[HostEntry], workers: &[HostEntry]) -> Result<()> {
    let mut seen : HashSet<&str> = HashSet::new();
    for node in control_plane.iter().chain(workers.iter()) {
        if !seen.insert(node.hostname.as_str()) {
            return Err(InventoryError::Validation(
                format!("Host '{}' is assigned to more than one role group", node.hostname)
            ));
        }
    }
    Ok(())
}

/// RKE2 releases look like `v1.29.4+rke2r1`, which is semver once the `v` is gone
pub fn validate_rke2_version(version: &str) -> Result<()> {
    let bare = version.trim().strip_prefix('v').unwrap_or(version.trim());
    semver::Version::parse(bare).map(|_| ()).map_err(|e| {
        InventoryError::Validation(format!("Invalid rke2_version '{}': {}", version, e))
    })
}

/// The key-path a generated inventory must have for the given cluster group
pub fn required_inventory_path(cluster_name: &str) -> [&str; 6] {
    ["all", "children", cluster_name, "children", "control_plane_nodes", "hosts"]
}

pub fn validate_inventory_structure(doc: &Value, cluster_name: &str) -> Result<bool> {
    if !doc.is_mapping() {
        return Err(InventoryError::Validation(String::from("Inventory root must be a mapping")));
    }
    lookup_path(doc, &required_inventory_path(cluster_name)).map_err(InventoryError::Validation)?;
    Ok(true)
}

/// Lighter check used on arbitrary YAML files: a mapping root with `all.children`
pub fn validate_yaml_root(doc: &Value) -> Result<bool> {
    if !doc.is_mapping() {
        return Err(InventoryError::Validation(String::from("YAML root must be a mapping")));
    }
    let all = match doc.get("all") {
        Some(x) => x,
        None => {
            return Err(InventoryError::Validation(String::from("Missing required field 'all' in YAML structure")));
        }
    };
    if all.get("children").is_none() {
        return Err(InventoryError::Validation(String::from("Missing required field 'children' in 'all' section")));
    }
    Ok(true)
}
