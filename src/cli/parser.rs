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
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use clap::error::ErrorKind;
use crate::config::{DEFAULT_GENERATED_CONFIGS_DIR, DEFAULT_GROUP_VARS_PATH, DEFAULT_INVENTORY_PATH, GeneratorConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// Increase output, may be repeated (-vvv shows debug messages)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the Ansible inventory from a host-description file
    Inventory {
        /// The host-description file ([vars], address mapping and role sections)
        hosts_file: PathBuf,
        #[command(flatten)]
        output: InventoryOutput,
        /// Cluster group name, defaults to the address mapping section name plus `_cluster`
        #[clap(long)]
        cluster_name: Option<String>,
    },
    /// Generate the Ansible inventory from lists of node addresses
    FromIps {
        /// Control plane node addresses, the first one initializes the cluster
        #[clap(long, num_args = 1.., required = true)]
        control_plane_ips: Vec<String>,
        /// Worker node addresses
        #[clap(long, num_args = 1..)]
        worker_ips: Vec<String>,
        #[command(flatten)]
        output: InventoryOutput,
        /// Cluster group name, defaults to six_node_cluster
        #[clap(long)]
        cluster_name: Option<String>,
    },
    /// Write group_vars/all.yml and one RKE2 config per control plane node from an inventory
    Configs {
        /// The inventory to read, the same file `inventory` and `from-ips` write
        #[clap(long, env = "RKE2_INVENTORY_OUTPUT", default_value = DEFAULT_INVENTORY_PATH)]
        inventory: PathBuf,
        #[clap(long, default_value = DEFAULT_GROUP_VARS_PATH)]
        group_vars: PathBuf,
        /// Directory the per-node configs are written to
        #[clap(long, env = "RKE2_GENERATED_CONFIGS", default_value = DEFAULT_GENERATED_CONFIGS_DIR)]
        output_dir: PathBuf,
        /// Also write configs for worker nodes
        #[clap(long)]
        include_workers: bool,
        /// Cluster group to read, defaults to the only cluster group in the inventory
        #[clap(long)]
        cluster_name: Option<String>,
    },
    /// Normalize whitespace and blank lines in YAML files
    FixYaml {
        /// Report which files would change without writing anything
        #[clap(long)]
        dry_run: bool,
        /// Only allow single blank lines between two content lines
        #[clap(long)]
        strict: bool,
        /// Keep a timestamped copy of every file that is rewritten
        #[clap(long)]
        backup: bool,
        /// Files to fix, defaults to the inventory, group vars, site.yml and role files
        files: Vec<PathBuf>,
    },
    /// Check Jinja template syntax in one file or a directory tree
    #[clap(group(ArgGroup::new("target").args(["file", "directory"])))]
    CheckTemplates {
        #[clap(short, long)]
        file: Option<PathBuf>,
        /// Defaults to the current directory
        #[clap(short, long)]
        directory: Option<PathBuf>,
    },
    /// Print the hosts a host-description file assigns to each role
    Show {
        hosts_file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct InventoryOutput {
    /// Where to write the inventory
    #[clap(short = 'o', long = "output", env = "RKE2_INVENTORY_OUTPUT", default_value = DEFAULT_INVENTORY_PATH)]
    pub path: PathBuf,
}

impl Cli {
    /// The generator configuration this invocation asks for
    pub fn generator_config(&self) -> GeneratorConfig {
        let config = GeneratorConfig::new().verbosity(self.verbose as u32);
        match &self.command {
            Commands::Inventory { output, cluster_name, .. }
            | Commands::FromIps { output, cluster_name, .. } => {
                with_cluster_name(config.inventory(&output.path), cluster_name)
            },
            Commands::Configs { inventory, group_vars, output_dir, include_workers, cluster_name } => {
                let config = config
                    .inventory(inventory)
                    .group_vars(group_vars)
                    .generated_configs(output_dir)
                    .include_workers(*include_workers);
                with_cluster_name(config, cluster_name)
            },
            Commands::FixYaml { strict, backup, files, .. } => {
                config.strict(*strict).backup(*backup).fix_targets(files.clone())
            },
            Commands::CheckTemplates { .. } | Commands::Show { .. } => config,
        }
    }
}

/// Help and version requests exit cleanly, every other parse failure is a usage error
pub fn exit_code_for(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn with_cluster_name(config: GeneratorConfig, cluster_name: &Option<String>) -> GeneratorConfig {
    match cluster_name {
        Some(name) => config.cluster_name(name.clone()),
        None => config,
    }
}
