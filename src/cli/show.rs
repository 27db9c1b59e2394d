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

use crate::inventory::hostfile::ParsedHosts;
use crate::inventory::hosts::{HostEntry, Role};
use crate::inventory::vars::ClusterVars;
use crate::util::terminal::{banner, two_column_table};
use crate::util::yaml::scalar_to_string;

// rke2-inventory show hosts.txt

pub fn show_parsed_hosts(parsed: &ParsedHosts, cluster_name: &str) {
    banner(&format!("Cluster: {}", cluster_name));
    println!();
    for role in [Role::ControlPlane, Role::Worker] {
        let entries = match role {
            Role::ControlPlane => &parsed.control_plane,
            Role::Worker => &parsed.workers,
        };
        println!("{}:", role.group_name());
        if entries.is_empty() {
            println!("    (none)");
        } else {
            two_column_table("Host", "Address", &host_rows(entries));
        }
        println!();
    }
    if !parsed.vars.is_empty() {
        println!("vars:");
        two_column_table("Variable", "Value", &var_rows(&parsed.vars));
        println!();
    }
    if !parsed.dropped.is_empty() {
        println!("not mapped to an address: {}", parsed.dropped.join(", "));
    }
}

pub fn host_rows(entries: &[HostEntry]) -> Vec<(String, String)> {
    entries.iter().map(|e| {
        let address = match &e.mount {
            Some(m) => format!("{} ({} on {})", e.ip, m.device, m.fstype),
            None => e.ip.clone(),
        };
        (e.hostname.clone(), address)
    }).collect()
}

pub fn var_rows(vars: &ClusterVars) -> Vec<(String, String)> {
    vars.iter().map(|(k, v)| {
        let shown = match v {
            serde_yaml::Value::Sequence(items) => {
                items.iter().filter_map(scalar_to_string).collect::<Vec<String>>().join(", ")
            },
            other => scalar_to_string(other).unwrap_or_default(),
        };
        (k.clone(), shown)
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::hostfile::parse_hosts_str;

    #[test]
    fn test_rows() {
        let parsed = parse_hosts_str("
[vars]
tls_sans=10.0.0.10,rke2.lab
[six_node]
k1 10.0.0.1 mount_device=/dev/sdb
node7 10.0.0.7
[control_plane_nodes]
k1
[worker_nodes]
node7
").unwrap();
        assert_eq!(host_rows(&parsed.control_plane), vec![
            (String::from("k1"), String::from("10.0.0.1 (/dev/sdb on ext4)")),
        ]);
        assert_eq!(host_rows(&parsed.workers), vec![
            (String::from("node7"), String::from("10.0.0.7")),
        ]);
        assert_eq!(var_rows(&parsed.vars), vec![
            (String::from("tls_sans"), String::from("10.0.0.10, rke2.lab")),
        ]);
        show_parsed_hosts(&parsed, "six_node_cluster");
    }
}
