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
use std::process;
use std::sync::Arc;
use clap::Parser;
use rke2_inventory::{Generator, TemplateTarget, TerminalOutputHandler, InventoryError, Result};
use rke2_inventory::cli::parser::{Cli, Commands, exit_code_for};
use rke2_inventory::cli::show::show_parsed_hosts;
use rke2_inventory::util::io::quit;

fn main() {
    // clap sends help to stdout and usage errors to stderr
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = exit_code_for(&e);
            let _ = e.print();
            process::exit(code);
        }
    };
    match liftoff(cli) {
        Err(e) => quit(&e.to_string()),
        Ok(code) => process::exit(code),
    }
}

fn liftoff(cli: Cli) -> Result<i32> {
    let config = cli.generator_config();
    let output_handler = Arc::new(TerminalOutputHandler::new(config.verbosity));
    let generator = Generator::new(config.clone())
        .with_output_handler(output_handler);

    match &cli.command {
        Commands::Inventory { hosts_file, .. } => {
            let result = generator.generate_inventory(hosts_file)?;
            println!("Inventory for {} ({} control plane, {} worker) written to {}",
                result.cluster_name, result.control_plane_count, result.worker_count, result.path.display());
            Ok(0)
        },
        Commands::FromIps { control_plane_ips, worker_ips, .. } => {
            let result = generator.generate_from_ips(control_plane_ips, worker_ips)?;
            println!("Inventory written to {}", result.path.display());
            Ok(0)
        },
        Commands::Configs { .. } => {
            let result = generator.generate_configs()?;
            println!("Wrote {} node configs to {}", result.node_config_paths.len(), config.generated_configs_dir.display());
            Ok(0)
        },
        Commands::FixYaml { dry_run, .. } => {
            let report = generator.fix_yaml(*dry_run);
            if *dry_run {
                return Ok(0);
            }
            if !report.success() {
                return Err(InventoryError::Format(format!("{} file(s) could not be fixed", report.failed.len())));
            }
            Ok(0)
        },
        Commands::CheckTemplates { file, directory } => {
            let target = match (file, directory) {
                (Some(f), _) => TemplateTarget::File(f.clone()),
                (None, Some(d)) => TemplateTarget::Directory(d.clone()),
                (None, None) => TemplateTarget::Directory(PathBuf::from(".")),
            };
            Ok(generator.check_templates(&target))
        },
        Commands::Show { hosts_file } => {
            let parsed = generator.load_hosts(hosts_file)?;
            let cluster_name = config.resolve_cluster_name(parsed.mapping_section.as_deref());
            show_parsed_hosts(&parsed, &cluster_name);
            Ok(0)
        },
    }
}

