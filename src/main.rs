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

use std::path::PathBuf;

use clap::Parser;
use log::info;

use netsynth::prelude::*;

/// Compile an intent file into Cisco IOS startup configurations.
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Cli {
    /// Intent file describing the network to configure (YAML or JSON).
    intent: PathBuf,
    /// Directory the generated configurations are written to.
    #[clap(long = "out-dir", short = 'o', default_value = "configs")]
    out_dir: PathBuf,
    /// Install the generated configurations into this GNS3 project directory.
    #[clap(long = "copy-config", short = 'c')]
    copy_config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let args = Cli::parse();

    let intent = Intent::from_path(&args.intent)?;
    let net = resolve(&intent)?;
    info!(
        "resolved {} routers ({} border)",
        net.routers.len(),
        net.border_routers.len()
    );

    let dispatcher = FileDispatcher::new(&args.out_dir);
    let written = dispatcher.write_all(&net, &CiscoIosGen::new())?;
    println!(
        "wrote {} configurations to {}",
        written.len(),
        args.out_dir.display()
    );

    if let Some(project_dir) = &args.copy_config {
        let replaced = dispatcher.install_into(project_dir)?;
        println!(
            "installed {replaced} configurations into {}",
            project_dir.display()
        );
    }

    Ok(())
}
