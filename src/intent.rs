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

//! The declarative intent model. An intent file (YAML or JSON) describes the network that should
//! exist; the [`crate::resolver`] turns it into concrete per-router configuration state.
//!
//! Declaration order matters and is part of the contract: routers, internal links and external
//! links are processed in the order they appear in the file, and address allocation follows that
//! order deterministically.

use std::fs;
use std::path::Path;

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AsId, IgpKind, Relationship};

/// Error raised while loading an intent file.
#[derive(Debug, Error)]
pub enum IntentError {
    /// The file could not be read.
    #[error("cannot read intent file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid YAML (or violates the intent schema).
    #[error("invalid YAML intent: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The file is not valid JSON (or violates the intent schema).
    #[error("invalid JSON intent: {0}")]
    Json(#[from] serde_json::Error),
}

/// One endpoint of a link: a router and one of its interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname of the router.
    pub router: String,
    /// Interface name, e.g. `GigabitEthernet1/0`.
    pub iface: String,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(router: impl Into<String>, iface: impl Into<String>) -> Self {
        Self {
            router: router.into(),
            iface: iface.into(),
        }
    }
}

/// A router as declared in the intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterIntent {
    /// Unique hostname.
    pub hostname: String,
    /// Numeric creation id; used as the BGP/OSPF router-id and in the startup-config file name.
    pub id: u32,
    /// Whether the router is declared as a border router. Routers with external links become
    /// border routers regardless of this flag.
    #[serde(default)]
    pub border: bool,
    /// Management (telnet console) port of the emulated device, if any. Carried through to the
    /// resolved model for external delivery tooling; never used by the engine itself.
    #[serde(default)]
    pub mgmt_port: Option<u16>,
}

/// An internal link between two routers of the same AS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalLink {
    /// First endpoint; gets the first host of the link subnet.
    pub first: Endpoint,
    /// Second endpoint; gets the second host of the link subnet.
    pub second: Endpoint,
}

/// An inter-AS link with its commercial relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    /// First endpoint.
    pub first: Endpoint,
    /// Second endpoint.
    pub second: Endpoint,
    /// Relationship as seen from the first endpoint.
    pub relation: Relationship,
    /// Role of the second endpoint. When absent, the opposite of `relation` is inferred
    /// (provider ↔ client; peer and plain-bgp stay symmetric).
    #[serde(default)]
    pub second_relation: Option<Relationship>,
    /// Name of the VRF created on the attaching side. Required for (and only meaningful on)
    /// `vpn` links.
    #[serde(default)]
    pub vrf_name: Option<String>,
}

/// An autonomous system as declared in the intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsIntent {
    /// The AS number.
    pub number: AsId,
    /// IPv4 prefix owned by this AS. All IPv4 transit subnets and loopbacks are carved out of it.
    #[serde(default)]
    pub ipv4_prefix: Option<Ipv4Net>,
    /// IPv6 prefix owned by this AS.
    #[serde(default)]
    pub ipv6_prefix: Option<Ipv6Net>,
    /// The IGP running inside this AS.
    #[serde(default)]
    pub igp: IgpKind,
    /// Whether this AS is a VPN customer. On a `vpn` link, the endpoint in the non-client AS is
    /// the attaching (provider) side.
    #[serde(default)]
    pub vpn_client: bool,
    /// Routers of this AS, in declaration order.
    pub routers: Vec<RouterIntent>,
    /// Internal links of this AS, in declaration order.
    #[serde(default)]
    pub internal_links: Vec<InternalLink>,
}

/// The complete intent: a list of AS records plus the inter-AS links between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// All declared autonomous systems, in declaration order.
    pub ases: Vec<AsIntent>,
    /// All inter-AS links, in declaration order.
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
}

impl Intent {
    /// Parse an intent from a YAML string.
    pub fn from_yaml(s: &str) -> Result<Self, IntentError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parse an intent from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, IntentError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load an intent file. JSON is used for a `.json` extension, YAML for everything else.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IntentError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&raw),
            _ => Self::from_yaml(&raw),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const YAML: &str = r#"
ases:
  - number: 100
    ipv4_prefix: 10.0.0.0/24
    igp: OSPF
    routers:
      - hostname: R1
        id: 1
      - hostname: R2
        id: 2
        mgmt_port: 5001
    internal_links:
      - first: { router: R1, iface: GigabitEthernet1/0 }
        second: { router: R2, iface: GigabitEthernet1/0 }
  - number: 200
    ipv4_prefix: 20.0.0.0/24
    igp: RIP
    vpn_client: true
    routers:
      - hostname: R3
        id: 3
external_links:
  - first: { router: R1, iface: GigabitEthernet2/0 }
    second: { router: R3, iface: GigabitEthernet1/0 }
    relation: peer
"#;

    #[test]
    fn parse_yaml() {
        let intent = Intent::from_yaml(YAML).unwrap();
        assert_eq!(intent.ases.len(), 2);
        let as100 = &intent.ases[0];
        assert_eq!(as100.number, AsId(100));
        assert_eq!(as100.ipv4_prefix, Some("10.0.0.0/24".parse().unwrap()));
        assert_eq!(as100.ipv6_prefix, None);
        assert_eq!(as100.igp, IgpKind::Ospf);
        assert!(!as100.vpn_client);
        assert_eq!(as100.routers[1].mgmt_port, Some(5001));
        assert_eq!(
            as100.internal_links[0].first,
            Endpoint::new("R1", "GigabitEthernet1/0")
        );
        assert!(intent.ases[1].vpn_client);
        assert_eq!(intent.external_links[0].relation, Relationship::Peer);
        assert_eq!(intent.external_links[0].second_relation, None);
    }

    #[test]
    fn parse_json() {
        let json = r#"{
            "ases": [
                {
                    "number": 300,
                    "ipv6_prefix": "2001:db8::/48",
                    "igp": "none",
                    "routers": [{"hostname": "R9", "id": 9, "border": true}]
                }
            ]
        }"#;
        let intent = Intent::from_json(json).unwrap();
        assert_eq!(intent.ases[0].number, AsId(300));
        assert_eq!(intent.ases[0].igp, IgpKind::None);
        assert!(intent.ases[0].routers[0].border);
        assert!(intent.external_links.is_empty());
    }

    #[test]
    fn yaml_and_json_agree() {
        let intent = Intent::from_yaml(YAML).unwrap();
        let json = serde_json::to_string(&intent).unwrap();
        assert_eq!(Intent::from_json(&json).unwrap(), intent);
    }
}
