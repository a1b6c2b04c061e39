// NetSynth: intent-driven router configuration generator
// Copyright (C) 2024-2025 The NetSynth Developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Delivery of generated configurations: writing them to an output directory, and installing them
//! into an existing GNS3 project by replacing the startup configurations the emulator created.
//!
//! GNS3 stores one `i<id>_startup-config.cfg` per dynamips node, at an unpredictable depth inside
//! the project directory. Installation therefore walks the whole project tree and overwrites every
//! startup configuration for which a generated file with the same id exists.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::export::{CfgGen, ExportError};
use crate::resolver::ResolvedNetwork;

const CONFIG_SUFFIX: &str = "_startup-config.cfg";

/// Writes generated configurations into an output directory and installs them into GNS3 projects.
#[derive(Debug, Clone)]
pub struct FileDispatcher {
    out_dir: PathBuf,
}

impl FileDispatcher {
    /// Create a dispatcher writing into the given output directory.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// The output directory of this dispatcher.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Render and write the configuration of every router. Returns the written paths in
    /// hostname order.
    pub fn write_all(
        &self,
        net: &ResolvedNetwork,
        generator: &impl CfgGen,
    ) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(&self.out_dir)?;
        let mut written = Vec::with_capacity(net.routers.len());
        for router in net.routers.values() {
            let path = self.out_dir.join(generator.config_file_name(router));
            fs::write(&path, generator.generate_config(net, router)?)?;
            info!("{}: wrote {}", router.hostname, path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Replace the startup configurations of a GNS3 project with the generated ones. A node whose
    /// id has no generated counterpart is left untouched. Returns the number of replaced files.
    pub fn install_into(&self, project_dir: impl AsRef<Path>) -> Result<usize, ExportError> {
        let mut found = BTreeMap::new();
        collect_startup_configs(project_dir.as_ref(), &mut found)?;

        let mut replaced = 0;
        for (id, target) in &found {
            let source = self.out_dir.join(format!("i{id}{CONFIG_SUFFIX}"));
            if source.exists() {
                fs::copy(&source, target)?;
                info!("replaced {}", target.display());
                replaced += 1;
            } else {
                warn!("no generated configuration for node {id}, keeping {}", target.display());
            }
        }
        info!("replaced {replaced}/{} startup configurations", found.len());
        Ok(replaced)
    }
}

/// Recursively collect all `i<id>_startup-config.cfg` files below `dir`, keyed by node id.
fn collect_startup_configs(
    dir: &Path,
    found: &mut BTreeMap<u32, PathBuf>,
) -> Result<(), ExportError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_startup_configs(&path, found)?;
        } else if let Some(id) = parse_config_id(&path) {
            found.insert(id, path);
        }
    }
    Ok(())
}

/// Extract the node id from a `i<id>_startup-config.cfg` file name, if it has that shape.
fn parse_config_id(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix('i')?
        .strip_suffix(CONFIG_SUFFIX)?
        .parse()
        .ok()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::export::CiscoIosGen;
    use crate::intent::Intent;
    use crate::resolver::resolve;

    const INTENT: &str = r#"
ases:
  - number: 100
    ipv4_prefix: 10.0.0.0/24
    igp: OSPF
    routers:
      - hostname: R1
        id: 1
      - hostname: R2
        id: 2
    internal_links:
      - first: { router: R1, iface: GigabitEthernet1/0 }
        second: { router: R2, iface: GigabitEthernet1/0 }
"#;

    #[test]
    fn parse_config_file_names() {
        assert_eq!(parse_config_id(Path::new("/a/b/i3_startup-config.cfg")), Some(3));
        assert_eq!(parse_config_id(Path::new("i12_startup-config.cfg")), Some(12));
        assert_eq!(parse_config_id(Path::new("iR_startup-config.cfg")), None);
        assert_eq!(parse_config_id(Path::new("3_startup-config.cfg")), None);
        assert_eq!(parse_config_id(Path::new("i3_startup.cfg")), None);
    }

    #[test]
    fn write_all_creates_one_file_per_router() {
        let out = tempfile::tempdir().unwrap();
        let net = resolve(&Intent::from_yaml(INTENT).unwrap()).unwrap();
        let written = FileDispatcher::new(out.path())
            .write_all(&net, &CiscoIosGen::new())
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(out.path().join("i1_startup-config.cfg").exists());
        let config = fs::read_to_string(out.path().join("i2_startup-config.cfg")).unwrap();
        assert!(config.contains("hostname R2"));
    }

    #[test]
    fn install_replaces_only_matching_nodes() {
        let out = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();

        // a GNS3 project keeps the configs at some depth inside the project tree
        let node1 = project.path().join("project-files/dynamips/abc/configs");
        let node3 = project.path().join("project-files/dynamips/def/configs");
        fs::create_dir_all(&node1).unwrap();
        fs::create_dir_all(&node3).unwrap();
        fs::write(node1.join("i1_startup-config.cfg"), "factory default").unwrap();
        fs::write(node3.join("i3_startup-config.cfg"), "factory default").unwrap();

        let net = resolve(&Intent::from_yaml(INTENT).unwrap()).unwrap();
        let dispatcher = FileDispatcher::new(out.path());
        dispatcher.write_all(&net, &CiscoIosGen::new()).unwrap();

        let replaced = dispatcher.install_into(project.path()).unwrap();
        assert_eq!(replaced, 1);

        let installed = fs::read_to_string(node1.join("i1_startup-config.cfg")).unwrap();
        assert!(installed.contains("hostname R1"));
        // node 3 has no counterpart and keeps its factory configuration
        assert_eq!(
            fs::read_to_string(node3.join("i3_startup-config.cfg")).unwrap(),
            "factory default"
        );
    }
}
