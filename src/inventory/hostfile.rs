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

// Host-description file format:
//
//   # comment
//   [vars]
//   ansible_user=admin
//   tls_sans=10.0.0.10,rke2.example.com
//
//   [six_node]
//   k1 192.168.1.23
//   k2 192.168.1.24 mount_device=/dev/sdb mount_opts="defaults,noatime"
//   node7 192.168.1.55 node_labels=zone=a
//
//   [control_plane_nodes]
//   k1
//   k2
//
//   [worker_nodes]
//   node7
//
// Any section other than vars / control_plane_nodes / worker_nodes is an
// address mapping section. Role sections only see hosts mapped above them.

use std::path::Path;
use indexmap::IndexMap;
use crate::error::{ErrorContext, InventoryError, Result};
use crate::inventory::hosts::{HostEntry, MountSpec, Role, vars};
use crate::inventory::vars::{ClusterVars, var_value};
use crate::util::io::read_local_file;

pub const VARS_SECTION: &str = "vars";

/// Everything read out of one host-description file
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedHosts {
    pub control_plane: Vec<HostEntry>,
    pub workers: Vec<HostEntry>,
    pub vars: ClusterVars,
    /// name of the last address mapping section seen, eg "six_node"
    pub mapping_section: Option<String>,
    /// role-section hostnames that had no address mapping
    pub dropped: Vec<String>,
}

impl ParsedHosts {
    pub fn all_hosts(&self) -> impl Iterator<Item = &HostEntry> {
        self.control_plane.iter().chain(self.workers.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Section {
    None,
    Vars,
    Mapping,
    Role(Role),
}

// what a mapping line binds a hostname to, before it is assigned a role
#[derive(Debug, Clone)]
struct MappedHost {
    ip: String,
    extra_vars: IndexMap<String, String>,
    mount: Option<MountSpec>,
}

pub fn parse_hosts_file(path: &Path) -> Result<ParsedHosts> {
    if !path.exists() {
        return Err(InventoryError::file_not_found(path));
    }
    let contents = read_local_file(path).context("reading host file")?;
    parse_hosts_str(&contents)
}

pub fn parse_hosts_str(contents: &str) -> Result<ParsedHosts> {

    let mut parsed = ParsedHosts::default();
    let mut mapped : IndexMap<String, MappedHost> = IndexMap::new();
    let mut section = Section::None;

    for (index, raw_line) in contents.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len()-1].trim();
            section = if name == VARS_SECTION {
                Section::Vars
            } else if let Some(role) = Role::from_section(name) {
                Section::Role(role)
            } else {
                parsed.mapping_section = Some(name.to_string());
                Section::Mapping
            };
            continue;
        }

        match section {
            Section::None => {
                return Err(InventoryError::parse_at(line_number, line, "entry outside of any [section]"));
            },
            Section::Vars => {
                let (key, value) = split_assignment(line)
                    .ok_or_else(|| InventoryError::parse_at(line_number, line, "expected key=value"))?;
                // later assignments win, but keep the position of the first
                parsed.vars.insert(key.to_string(), var_value(key, value));
            },
            Section::Mapping => {
                let (hostname, host) = parse_mapping_line(line_number, line)?;
                mapped.insert(hostname, host);
            },
            Section::Role(role) => {
                let hostname = line.split_whitespace().next().unwrap_or(line);
                match mapped.get(hostname) {
                    Some(host) => {
                        let entry = HostEntry {
                            hostname: hostname.to_string(),
                            ip: host.ip.clone(),
                            role,
                            extra_vars: host.extra_vars.clone(),
                            mount: host.mount.clone(),
                        };
                        match role {
                            Role::ControlPlane => parsed.control_plane.push(entry),
                            Role::Worker => parsed.workers.push(entry),
                        }
                    },
                    None => parsed.dropped.push(hostname.to_string()),
                }
            },
        }
    }

    Ok(parsed)
}

// ==============================================================================================================
// PRIVATE INTERNALS
// ==============================================================================================================

fn split_assignment(token: &str) -> Option<(&str, &str)> {
    let (key, value) = token.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

fn parse_mapping_line(line_number: usize, line: &str) -> Result<(String, MappedHost)> {
    let tokens = shlex::split(line)
        .ok_or_else(|| InventoryError::parse_at(line_number, line, "unbalanced quotes"))?;
    if tokens.len() < 2 {
        return Err(InventoryError::parse_at(line_number, line, "expected '<hostname> <ip> [key=value ...]'"));
    }

    let mut extra_vars : IndexMap<String, String> = IndexMap::new();
    for token in tokens[2..].iter() {
        let (key, value) = split_assignment(token)
            .ok_or_else(|| InventoryError::parse_at(line_number, line, &format!("expected key=value, got '{}'", token)))?;
        extra_vars.insert(key.to_string(), value.to_string());
    }

    let mount = match extra_vars.shift_remove(vars::MOUNT_DEVICE) {
        Some(device) => {
            let mut disk = MountSpec::new(&device);
            if let Some(fstype) = extra_vars.shift_remove(vars::MOUNT_FSTYPE) {
                disk.fstype = fstype;
            }
            if let Some(opts) = extra_vars.shift_remove(vars::MOUNT_OPTS) {
                disk.opts = opts;
            }
            Some(disk)
        },
        None => None,
    };

    Ok((tokens[0].clone(), MappedHost { ip: tokens[1].clone(), extra_vars, mount }))
}
