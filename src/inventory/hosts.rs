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
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Magic host variable names understood by the generators
pub mod vars {
    pub const ANSIBLE_HOST: &str = "ansible_host";
    pub const DATA_MOUNT: &str = "data_mount";
    pub const NODE_LABELS: &str = "node_labels";
    pub const NODE_TAINTS: &str = "node_taints";
    pub const MOUNT_DEVICE: &str = "mount_device";
    pub const MOUNT_FSTYPE: &str = "mount_fstype";
    pub const MOUNT_OPTS: &str = "mount_opts";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    ControlPlane,
    Worker,
}

impl Role {
    // the inventory group a host of this role lands in
    pub fn group_name(&self) -> &'static str {
        match self {
            Role::ControlPlane => "control_plane_nodes",
            Role::Worker => "worker_nodes",
        }
    }

    pub fn from_section(section: &str) -> Option<Self> {
        match section {
            "control_plane_nodes" => Some(Role::ControlPlane),
            "worker_nodes" => Some(Role::Worker),
            _ => None,
        }
    }
}

/// Data disk to be mounted on the node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MountSpec {
    pub device: String,
    pub fstype: String,
    pub opts: String,
}

impl MountSpec {
    pub const DEFAULT_FSTYPE: &'static str = "ext4";
    pub const DEFAULT_OPTS: &'static str = "defaults";

    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            fstype: String::from(Self::DEFAULT_FSTYPE),
            opts: String::from(Self::DEFAULT_OPTS),
        }
    }
}

/// One parsed line of the host-description file, bound to a role
#[derive(Clone, Debug, PartialEq)]
pub struct HostEntry {
    pub hostname: String,
    pub ip: String,
    pub role: Role,
    pub extra_vars: IndexMap<String, String>,
    pub mount: Option<MountSpec>,
}

impl HostEntry {

    pub fn new(hostname: &str, ip: &str, role: Role) -> Self {
        Self {
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            role,
            extra_vars: IndexMap::new(),
            mount: None,
        }
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.extra_vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_mount(mut self, mount: MountSpec) -> Self {
        self.mount = Some(mount);
        self
    }

    /// Host variables as they appear under `hosts.<name>` in the inventory.
    /// `ansible_host` always comes first and cannot be shadowed by an extra var.
    pub fn host_vars(&self) -> IndexMap<String, Value> {
        let mut result : IndexMap<String, Value> = IndexMap::new();
        result.insert(vars::ANSIBLE_HOST.to_string(), Value::String(self.ip.clone()));
        for (k, v) in self.extra_vars.iter() {
            if k == vars::ANSIBLE_HOST {
                continue;
            }
            result.insert(k.clone(), Value::String(v.clone()));
        }
        if let Some(mount) = &self.mount {
            // MountSpec only holds strings, serialization cannot fail
            if let Ok(value) = serde_yaml::to_value(mount) {
                result.insert(vars::DATA_MOUNT.to_string(), value);
            }
        }
        return result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_group_names() {
        assert_eq!(Role::ControlPlane.group_name(), "control_plane_nodes");
        assert_eq!(Role::Worker.group_name(), "worker_nodes");
        assert_eq!(Role::from_section("worker_nodes"), Some(Role::Worker));
        assert_eq!(Role::from_section("six_node"), None);
    }

    #[test]
    fn test_host_vars_ansible_host_first() {
        let entry = HostEntry::new("k1", "192.168.1.23", Role::ControlPlane)
            .with_var("node_labels", "zone=a")
            .with_var("ansible_host", "10.0.0.1");
        let vars = entry.host_vars();
        let keys: Vec<&String> = vars.keys().collect();
        assert_eq!(keys, vec!["ansible_host", "node_labels"]);
        assert_eq!(vars["ansible_host"], "192.168.1.23");
    }

    #[test]
    fn test_host_vars_mount() {
        let entry = HostEntry::new("node7", "192.168.1.55", Role::Worker)
            .with_mount(MountSpec::new("/dev/sdb"));
        let vars = entry.host_vars();
        assert_eq!(vars["data_mount"]["device"], "/dev/sdb");
        assert_eq!(vars["data_mount"]["fstype"], "ext4");
        assert_eq!(vars["data_mount"]["opts"], "defaults");
    }
}
