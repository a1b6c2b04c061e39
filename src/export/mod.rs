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

//! Rendering of the resolved model into device configurations.
//!
//! A [`CfgGen`] turns one [`RouterModel`] into the text a device boots from. Generators are pure
//! over the resolved network; all decisions were made during resolution, so rendering one router
//! never looks at another router's configuration.

use thiserror::Error;

use crate::resolver::{ResolvedNetwork, RouterModel};

mod cisco;

pub use cisco::CiscoIosGen;

/// Error raised while exporting configurations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Cannot write the configuration to disk.
    #[error("cannot write configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// A configuration generator for one target platform.
pub trait CfgGen {
    /// Generate the complete device configuration for one router.
    fn generate_config(
        &self,
        net: &ResolvedNetwork,
        router: &RouterModel,
    ) -> Result<String, ExportError>;

    /// The file name under which the configuration is stored.
    fn config_file_name(&self, router: &RouterModel) -> String;
}
