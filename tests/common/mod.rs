// Common test utilities

use std::fs;
use std::path::{Path, PathBuf};
use rke2_inventory::{Generator, GeneratorConfig};

pub const SIX_NODE_HOSTS: &str = "
# lab cluster
[vars]
ansible_user=admin
rke2_token=s3cret
tls_sans=10.0.0.10,rke2.lab

[six_node]
k1 192.168.1.23
k2 192.168.1.24
k3 192.168.1.25
node7 192.168.1.55 mount_device=/dev/sdb mount_opts=\"defaults,noatime\"

[control_plane_nodes]
k1
k2
k3

[worker_nodes]
node7
";

pub fn write_hosts(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("hosts.txt");
    fs::write(&path, contents).unwrap();
    path
}

/// A generator whose every output lands under `dir`
pub fn scratch_generator(dir: &Path) -> Generator {
    let config = GeneratorConfig::new()
        .inventory(dir.join("inventory/rke2.yml"))
        .group_vars(dir.join("inventory/group_vars/all.yml"))
        .generated_configs(dir.join("generated_configs"));
    Generator::new(config)
}
