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

//! # NetSynth
//!
//! NetSynth compiles a declarative description of a multi-AS network (the *intent*) into complete,
//! bootable router configurations. The intent names autonomous systems, their address prefixes,
//! routers and links; NetSynth derives every concrete artifact deterministically: interface and
//! loopback addresses, the iBGP full mesh, eBGP sessions with their relationship route-maps, VRFs
//! for VPN attachments, and the IGP configuration.
//!
//! The pipeline has three stages:
//!
//! 1. [`intent`]: load and validate the declarative input (YAML or JSON),
//! 2. [`resolver`]: resolve it into one immutable [`resolver::RouterModel`] per router,
//! 3. [`export`] and [`dispatch`]: render Cisco IOS configurations and deliver them, either into
//!    an output directory or directly into a GNS3 project.
//!
//! Resolution is deterministic: the same intent always yields the same addresses and the same
//! configurations, because every allocation follows declaration order.
//!
//! ```
//! use netsynth::prelude::*;
//!
//! let intent = Intent::from_yaml(
//!     r#"
//! ases:
//!   - number: 100
//!     ipv4_prefix: 10.0.0.0/24
//!     igp: OSPF
//!     routers:
//!       - hostname: R1
//!         id: 1
//!       - hostname: R2
//!         id: 2
//!     internal_links:
//!       - first: { router: R1, iface: GigabitEthernet1/0 }
//!         second: { router: R2, iface: GigabitEthernet1/0 }
//! "#,
//! )?;
//!
//! let net = resolve(&intent)?;
//! let config = CiscoIosGen::new().generate_config(&net, &net.routers["R1"])?;
//! assert!(config.contains("router bgp 100"));
//! assert!(config.contains(" ip address 10.0.0.1/30"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs, missing_debug_implementations)]

pub mod addressing;
pub mod dispatch;
pub mod export;
pub mod intent;
pub mod resolver;
pub mod types;

/// Module to re-export the most important structures and functions of the crate.
pub mod prelude {
    pub use crate::dispatch::FileDispatcher;
    pub use crate::export::{CfgGen, CiscoIosGen, ExportError};
    pub use crate::intent::{Intent, IntentError};
    pub use crate::resolver::{resolve, ResolvedNetwork, RouterModel};
    pub use crate::types::{AsId, IgpKind, Relationship, ResolveError};
}
