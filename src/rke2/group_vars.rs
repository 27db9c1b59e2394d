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
use serde::{Deserialize, Serialize};
use crate::error::{ErrorContext, Result};
use crate::rke2::node_config::Rke2Settings;
use crate::util::io::write_local_file;

/// Contents of `inventory/group_vars/all.yml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupVars {
    pub rke2_token: String,
    pub tls_san: Vec<String>,
}

pub fn generate_base_vars(settings: &Rke2Settings) -> GroupVars {
    GroupVars {
        rke2_token: settings.token.clone(),
        tls_san: settings.tls_san.clone(),
    }
}

impl GroupVars {
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

pub fn write_group_vars(path: &Path, vars: &GroupVars) -> Result<()> {
    write_local_file(path, &vars.to_yaml_string()?).context("writing group vars")
}
