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
use std::sync::Arc;
use crate::config::GeneratorConfig;
use crate::error::{InventoryError, Result};
use crate::inventory::builder::{InventoryDocument, build_inventory, build_inventory_from_ips, load_yaml_file, write_inventory};
use crate::inventory::hostfile::{ParsedHosts, parse_hosts_file};
use crate::inventory::hosts::{HostEntry, Role};
use crate::inventory::validate::{validate_inventory_structure, validate_nodes, validate_role_assignment, validate_rke2_version};
use crate::inventory::vars::RKE2_VERSION;
use crate::lint::formatting::{FixOptions, FixReport, fix_targets};
use crate::lint::templates::{check_all_files, check_single_file};
use crate::output::{OutputHandler, OutputHandlerRef, NullOutputHandler};
use crate::rke2::group_vars::{generate_base_vars, write_group_vars};
use crate::rke2::node_config::{node_config_paths, node_configs, rke2_settings, write_node_config};
use crate::util::io::file_timestamp;
use crate::util::yaml::scalar_to_string;

/// Main API for generating and checking cluster files
pub struct Generator {
    config: GeneratorConfig,
    output_handler: OutputHandlerRef,
}

/// Result of writing an inventory
#[derive(Debug, Clone)]
pub struct InventoryResult {
    pub path: PathBuf,
    pub cluster_name: String,
    pub control_plane_count: usize,
    pub worker_count: usize,
    pub dropped: Vec<String>,
}

/// Result of writing group vars and node configs
#[derive(Debug, Clone)]
pub struct ConfigsResult {
    pub group_vars_path: PathBuf,
    pub node_config_paths: Vec<PathBuf>,
}

/// Where a template check should look
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateTarget {
    File(PathBuf),
    Directory(PathBuf),
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            output_handler: Arc::new(NullOutputHandler),
        }
    }

    pub fn with_output_handler(mut self, handler: Arc<dyn OutputHandler>) -> Self {
        self.output_handler = handler;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parse and validate a host file without writing anything
    pub fn load_hosts(&self, hosts_file: &Path) -> Result<ParsedHosts> {
        let parsed = parse_hosts_file(hosts_file)?;
        for hostname in parsed.dropped.iter() {
            self.output_handler.warning(&format!("host '{}' is not in an address mapping section, skipping", hostname));
        }
        self.output_handler.info(&format!("parsed {} control plane and {} worker hosts from {}",
            parsed.control_plane.len(), parsed.workers.len(), hosts_file.display()));

        let all : Vec<HostEntry> = parsed.all_hosts().cloned().collect();
        validate_nodes(&all)?;
        validate_role_assignment(&parsed.control_plane, &parsed.workers)?;
        if let Some(version) = parsed.vars.get(RKE2_VERSION).and_then(scalar_to_string) {
            validate_rke2_version(&version)?;
        }
        Ok(parsed)
    }

    /// Host file in, inventory file out
    pub fn generate_inventory(&self, hosts_file: &Path) -> Result<InventoryResult> {
        self.output_handler.on_command_start("inventory");
        let result = self.generate_inventory_inner(hosts_file);
        self.output_handler.on_command_end("inventory", result.is_ok());
        result
    }

    /// Inventory straight from address lists, hosts are named K1..Kn
    pub fn generate_from_ips(&self, control_plane_ips: &[String], worker_ips: &[String]) -> Result<InventoryResult> {
        self.output_handler.on_command_start("from-ips");
        let result = self.generate_from_ips_inner(control_plane_ips, worker_ips);
        self.output_handler.on_command_end("from-ips", result.is_ok());
        result
    }

    /// Inventory file in, group vars and one config per control plane node out
    pub fn generate_configs(&self) -> Result<ConfigsResult> {
        self.output_handler.on_command_start("configs");
        let result = self.generate_configs_inner();
        self.output_handler.on_command_end("configs", result.is_ok());
        result
    }

    pub fn fix_yaml(&self, dry_run: bool) -> FixReport {
        self.output_handler.on_command_start("fix-yaml");
        let options = FixOptions {
            dry_run,
            strict: self.config.strict,
            backup: self.config.backup,
            inventory: Some(self.config.inventory_path.clone()),
        };
        let report = fix_targets(&self.config.fix_targets, &options, self.output_handler.as_ref());
        self.output_handler.on_command_end("fix-yaml", report.success());
        report
    }

    /// Returns the process exit code, 1 if anything failed to compile
    pub fn check_templates(&self, target: &TemplateTarget) -> i32 {
        self.output_handler.on_command_start("check-templates");
        let code = match target {
            TemplateTarget::File(path) => check_single_file(path, self.output_handler.as_ref()),
            TemplateTarget::Directory(dir) => check_all_files(dir, self.output_handler.as_ref()),
        };
        self.output_handler.on_command_end("check-templates", code == 0);
        code
    }

    // ==============================================================================================================
    // PRIVATE INTERNALS
    // ==============================================================================================================

    fn generate_inventory_inner(&self, hosts_file: &Path) -> Result<InventoryResult> {
        let parsed = self.load_hosts(hosts_file)?;
        if parsed.control_plane.is_empty() {
            return Err(InventoryError::Validation(format!("no control plane nodes found in {}", hosts_file.display())));
        }
        let cluster_name = self.config.resolve_cluster_name(parsed.mapping_section.as_deref());
        let doc = build_inventory(&parsed.control_plane, &parsed.workers, &parsed.vars, &self.config.defaults, &cluster_name);
        self.write(&doc, &cluster_name, parsed.dropped)
    }

    fn generate_from_ips_inner(&self, control_plane_ips: &[String], worker_ips: &[String]) -> Result<InventoryResult> {
        if control_plane_ips.is_empty() {
            return Err(InventoryError::Config(String::from("at least one control plane IP is required")));
        }
        let cluster_name = self.config.resolve_cluster_name(None);
        let doc = build_inventory_from_ips(control_plane_ips, worker_ips, &self.config.defaults, &cluster_name);

        let cluster = doc.cluster(&cluster_name).ok_or_else(|| InventoryError::Other(format!("cluster '{}' missing after build", cluster_name)))?;
        let hosts : Vec<HostEntry> = [Role::ControlPlane, Role::Worker].iter()
            .flat_map(|role| {
                cluster.children.group(*role).hosts.iter().map(move |(name, vars)| {
                    let ip = vars.get("ansible_host").and_then(scalar_to_string).unwrap_or_default();
                    HostEntry::new(name, &ip, *role)
                })
            })
            .collect();
        validate_nodes(&hosts)?;

        self.write(&doc, &cluster_name, Vec::new())
    }

    fn write(&self, doc: &InventoryDocument, cluster_name: &str, dropped: Vec<String>) -> Result<InventoryResult> {
        let path = self.config.inventory_path.clone();
        write_inventory(doc, &path)?;
        self.output_handler.on_file_written(&path);

        let (control_plane_count, worker_count) = match doc.cluster(cluster_name) {
            Some(c) => (c.children.control_plane_nodes.hosts.len(), c.children.worker_nodes.hosts.len()),
            None => (0, 0),
        };
        Ok(InventoryResult {
            path,
            cluster_name: cluster_name.to_string(),
            control_plane_count,
            worker_count,
            dropped,
        })
    }

    fn generate_configs_inner(&self) -> Result<ConfigsResult> {
        let doc = load_yaml_file(&self.config.inventory_path)?;
        let cluster_name = self.inventory_cluster_name(&doc);
        validate_inventory_structure(&doc, &cluster_name)?;
        self.output_handler.debug(&format!("using cluster group '{}'", cluster_name));

        let mut configs = node_configs(&doc, &cluster_name, Role::ControlPlane)?;
        if self.config.include_workers {
            configs.extend(node_configs(&doc, &cluster_name, Role::Worker)?);
        }
        let timestamp = file_timestamp();
        node_config_paths(&self.config.generated_configs_dir, &configs, &timestamp)?;

        let settings = rke2_settings(&doc, &cluster_name);
        let group_vars = generate_base_vars(&settings);
        write_group_vars(&self.config.group_vars_path, &group_vars)?;
        self.output_handler.on_file_written(&self.config.group_vars_path);

        let mut written = Vec::new();
        for config in configs.iter() {
            let path = write_node_config(&self.config.generated_configs_dir, config, &timestamp)?;
            self.output_handler.on_file_written(&path);
            written.push(path);
        }

        Ok(ConfigsResult {
            group_vars_path: self.config.group_vars_path.clone(),
            node_config_paths: written,
        })
    }

    // an explicit name wins, otherwise the only cluster group in the file, otherwise the default
    fn inventory_cluster_name(&self, doc: &serde_yaml::Value) -> String {
        if let Some(name) = &self.config.cluster_name {
            return name.clone();
        }
        let children = doc.get("all")
            .and_then(|a| a.get("children"))
            .and_then(|c| c.as_mapping());
        if let Some(children) = children {
            if children.len() == 1 {
                if let Some(name) = children.keys().next().and_then(|k| k.as_str()) {
                    return name.to_string();
                }
            }
        }
        self.config.default_cluster_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::capture::CaptureOutputHandler;
    use std::fs;
    use tempfile::TempDir;

    const HOSTS: &str = "
[vars]
rke2_token=s3cret

[three_node]
k1 192.168.1.23
k2 192.168.1.24
node7 192.168.1.55

[control_plane_nodes]
k1
k2
ghost

[worker_nodes]
node7
";

    fn generator(dir: &Path) -> Generator {
        let config = GeneratorConfig::new()
            .inventory(dir.join("inventory/rke2.yml"))
            .group_vars(dir.join("inventory/group_vars/all.yml"))
            .generated_configs(dir.join("generated_configs"));
        Generator::new(config)
    }

    #[test]
    fn test_generate_inventory_warns_on_dropped_hosts() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts.txt");
        fs::write(&hosts, HOSTS).unwrap();

        let capture = Arc::new(CaptureOutputHandler::default());
        let result = generator(temp_dir.path())
            .with_output_handler(capture.clone())
            .generate_inventory(&hosts)
            .unwrap();

        assert_eq!(result.cluster_name, "three_node_cluster");
        assert_eq!(result.control_plane_count, 2);
        assert_eq!(result.worker_count, 1);
        assert_eq!(result.dropped, vec!["ghost".to_string()]);
        assert_eq!(capture.warnings().len(), 1);
        assert!(capture.warnings()[0].contains("ghost"));
        assert_eq!(capture.written.lock().unwrap().len(), 1);
        assert!(result.path.exists());
    }

    #[test]
    fn test_generate_inventory_rejects_bad_ip() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts.txt");
        fs::write(&hosts, "[six_node]\nk1 256.256.256.256\n[control_plane_nodes]\nk1\n").unwrap();

        let err = generator(temp_dir.path()).generate_inventory(&hosts).unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(!temp_dir.path().join("inventory/rke2.yml").exists());
    }

    #[test]
    fn test_generate_inventory_rejects_bad_version() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts.txt");
        fs::write(&hosts, "[vars]\nrke2_version=latest\n[six_node]\nk1 10.0.0.1\n[control_plane_nodes]\nk1\n").unwrap();

        let err = generator(temp_dir.path()).generate_inventory(&hosts).unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
    }

    #[test]
    fn test_generate_inventory_requires_control_plane() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts.txt");
        fs::write(&hosts, "[six_node]\nk1 10.0.0.1\n[worker_nodes]\nk1\n").unwrap();

        let err = generator(temp_dir.path()).generate_inventory(&hosts).unwrap_err();
        assert!(err.to_string().contains("no control plane nodes"));
    }

    #[test]
    fn test_generate_configs_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts.txt");
        fs::write(&hosts, HOSTS).unwrap();

        let gen = generator(temp_dir.path());
        gen.generate_inventory(&hosts).unwrap();
        let result = gen.generate_configs().unwrap();

        assert_eq!(result.node_config_paths.len(), 2);
        let first = fs::read_to_string(&result.node_config_paths[0]).unwrap();
        let second = fs::read_to_string(&result.node_config_paths[1]).unwrap();
        assert!(first.contains("cluster-init: true"));
        assert!(first.contains("token: s3cret"));
        assert!(second.contains("server: https://192.168.1.23:9345"));

        let group_vars = fs::read_to_string(&result.group_vars_path).unwrap();
        assert!(group_vars.contains("rke2_token: s3cret"));
    }

    #[test]
    fn test_generate_configs_with_workers() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts.txt");
        fs::write(&hosts, HOSTS).unwrap();

        let config = generator(temp_dir.path()).config().clone().include_workers(true);
        let gen = Generator::new(config);
        gen.generate_inventory(&hosts).unwrap();
        let result = gen.generate_configs().unwrap();
        assert_eq!(result.node_config_paths.len(), 3);
        let worker = fs::read_to_string(&result.node_config_paths[2]).unwrap();
        assert!(worker.contains("node-name: node7"));
        assert!(!worker.contains("cluster-init"));
    }

    #[test]
    fn test_generate_configs_missing_inventory() {
        let temp_dir = TempDir::new().unwrap();
        let err = generator(temp_dir.path()).generate_configs().unwrap_err();
        assert!(matches!(err, InventoryError::FileNotFound(_)));
    }

    #[test]
    fn test_generate_from_ips() {
        let temp_dir = TempDir::new().unwrap();
        let gen = generator(temp_dir.path());
        let cp = vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()];
        let workers = vec!["10.0.0.3".to_string()];

        let result = gen.generate_from_ips(&cp, &workers).unwrap();
        assert_eq!(result.cluster_name, "six_node_cluster");
        assert_eq!(result.control_plane_count, 2);
        assert_eq!(result.worker_count, 1);

        let bad = gen.generate_from_ips(&["10.0.0.999".to_string()], &[]).unwrap_err();
        assert!(matches!(bad, InventoryError::Validation(_)));
        assert!(gen.generate_from_ips(&[], &workers).is_err());
    }

    #[test]
    fn test_check_templates_targets() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("config.yaml.j2");
        fs::write(&good, "node-name: {{ inventory_hostname }}\n").unwrap();

        let gen = generator(temp_dir.path());
        assert_eq!(gen.check_templates(&TemplateTarget::File(good)), 0);
        assert_eq!(gen.check_templates(&TemplateTarget::Directory(temp_dir.path().to_path_buf())), 0);
        assert_eq!(gen.check_templates(&TemplateTarget::File(temp_dir.path().join("none.j2"))), 1);
    }

    #[test]
    fn test_fix_yaml_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let site = temp_dir.path().join("site.yml");
        fs::write(&site, "- hosts: all\n\n\n\n").unwrap();

        let config = GeneratorConfig::new().fix_targets(vec![site.clone()]);
        let report = Generator::new(config).fix_yaml(true);
        assert_eq!(report.would_change, vec![site.clone()]);
        assert_eq!(fs::read_to_string(&site).unwrap(), "- hosts: all\n\n\n\n");
    }
}
