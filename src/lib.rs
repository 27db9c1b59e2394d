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

pub mod cli;
pub mod inventory;
pub mod lint;
pub mod rke2;
pub mod util;

pub mod api;
pub mod config;
pub mod error;
pub mod output;

// Re-export commonly used types for library users
pub use api::{Generator, InventoryResult, ConfigsResult, TemplateTarget};
pub use config::GeneratorConfig;
pub use error::{InventoryError, ErrorContext, Result};
pub use output::{OutputHandler, OutputHandlerRef, TerminalOutputHandler, NullOutputHandler, LogLevel};
pub use inventory::builder::{InventoryDocument, build_inventory, build_inventory_from_ips, write_inventory, load_inventory};
pub use inventory::hostfile::{ParsedHosts, parse_hosts_file, parse_hosts_str};
pub use inventory::hosts::{HostEntry, MountSpec, Role};
pub use inventory::vars::{ClusterDefaults, ClusterVars, merge_variables};
pub use rke2::node_config::{NodeConfig, derive_node_config};
