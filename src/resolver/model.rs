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

//! The resolved per-router model: the immutable contract handed to the renderer. The model builder
//! only composes what the resolution passes produced and runs a final consistency pass; it never
//! computes anything new.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;

use ipnet::IpNet;
use serde::Serialize;

use crate::types::{AsId, IgpKind, Relationship, ResolveError};

/// The addresses assigned to one interface, one per family the owning AS declares, IPv4 first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IfaceAddr {
    /// Assigned addresses, rendered with the mask of the link subnet they were drawn from.
    pub addrs: Vec<IpNet>,
    /// The VRF this interface is bound to, if the interface is a VPN attachment.
    pub vrf: Option<String>,
    /// Whether the interface terminates an inter-AS link.
    pub external: bool,
}

impl IfaceAddr {
    /// Create an assignment with no VRF tag.
    pub(crate) fn new(addrs: Vec<IpNet>, external: bool) -> Self {
        Self {
            addrs,
            vrf: None,
            external,
        }
    }

    /// The primary address of this interface: the IPv4 address if one is assigned, otherwise the
    /// first assigned address. BGP sessions are established over primary addresses.
    pub fn primary(&self) -> IpAddr {
        self.addrs
            .iter()
            .find(|a| matches!(a, IpNet::V4(_)))
            .or_else(|| self.addrs.first())
            .map(|a| a.addr())
            .expect("an interface assignment always carries at least one address")
    }

    /// Whether any assigned address is IPv6.
    pub fn has_ipv6(&self) -> bool {
        self.addrs.iter().any(|a| matches!(a, IpNet::V6(_)))
    }
}

/// One BGP neighbor entry of a router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BgpNeighbor {
    /// Address of the remote session endpoint: the remote loopback for iBGP, the remote interface
    /// address for eBGP.
    pub addr: IpAddr,
    /// AS number of the remote router.
    pub remote_as: AsId,
    /// Whether this is an iBGP session (`update-source Loopback0`).
    pub internal: bool,
    /// Relationship tag driving route-map selection on eBGP sessions.
    pub relation: Option<Relationship>,
}

/// A VRF owned by a router, created for one VPN attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vrf {
    /// VRF name, unique per router.
    pub name: String,
    /// Route distinguisher value (combined with the AS number when rendered).
    pub rd: u32,
    /// Route target value (combined with the AS number when rendered).
    pub rt: u32,
    /// The attaching interface; it carries this VRF's tag.
    pub iface: String,
    /// Interface address of the remote endpoint.
    pub peer: IpAddr,
    /// AS number of the remote endpoint.
    pub remote_as: AsId,
}

/// The immutable per-router snapshot produced by resolution. This is the sole contract between
/// the engine and the rendering stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterModel {
    /// Unique hostname.
    pub hostname: String,
    /// Numeric creation id (router-id, startup-config file name).
    pub id: u32,
    /// The AS this router belongs to.
    pub asn: AsId,
    /// The IGP running in that AS.
    pub igp: IgpKind,
    /// Whether the router terminates at least one inter-AS link (or was declared border).
    pub border: bool,
    /// Management console port, if declared.
    pub mgmt_port: Option<u16>,
    /// Interface name → assigned addresses (and VRF tag).
    pub ifaces: BTreeMap<String, IfaceAddr>,
    /// Ordered BGP neighbor list: the iBGP full mesh first, then eBGP sessions in link
    /// declaration order.
    pub neighbors: Vec<BgpNeighbor>,
    /// VRFs owned by this router, in attachment order.
    pub vrfs: Vec<Vrf>,
}

impl RouterModel {
    /// The loopback assignment of this router. Present on every resolved router.
    pub fn loopback(&self) -> Option<&IfaceAddr> {
        self.ifaces.get(LOOPBACK_IFACE)
    }
}

/// The interface name under which loopback addresses are recorded.
pub const LOOPBACK_IFACE: &str = "Loopback0";

/// The fully resolved network: every router's snapshot plus the network-wide lists the renderer
/// needs to emit `network` statements and border-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNetwork {
    /// All routers, keyed by hostname.
    pub routers: BTreeMap<String, RouterModel>,
    /// Hostnames of all border routers, in declaration order.
    pub border_routers: Vec<String>,
    /// Internal transit subnets per AS; border routers advertise these via BGP.
    pub advertised: BTreeMap<AsId, Vec<IpNet>>,
}

impl ResolvedNetwork {
    /// Compose the final model from the router arena (in declaration order) and run the
    /// consistency pass. Any violation means a bug in the resolution passes and aborts the run;
    /// a partial model is never returned.
    pub(crate) fn compose(
        arena: Vec<RouterModel>,
        advertised: BTreeMap<AsId, Vec<IpNet>>,
    ) -> Result<Self, ResolveError> {
        let border_routers = arena
            .iter()
            .filter(|r| r.border)
            .map(|r| r.hostname.clone())
            .collect();

        let mut seen_addrs: HashSet<IpAddr> = HashSet::new();
        for router in &arena {
            for (name, iface) in &router.ifaces {
                for addr in &iface.addrs {
                    if !seen_addrs.insert(addr.addr()) {
                        return Err(ResolveError::Inconsistency(format!(
                            "address {} of {}:{} is assigned twice",
                            addr.addr(),
                            router.hostname,
                            name
                        )));
                    }
                }
            }
            for vrf in &router.vrfs {
                match router.ifaces.get(&vrf.iface) {
                    Some(iface) if iface.vrf.as_deref() == Some(vrf.name.as_str()) => {}
                    Some(_) => {
                        return Err(ResolveError::Inconsistency(format!(
                            "interface {}:{} does not carry the tag of VRF {}",
                            router.hostname, vrf.iface, vrf.name
                        )))
                    }
                    None => {
                        return Err(ResolveError::Inconsistency(format!(
                            "VRF {} of {} attaches to undeclared interface {}",
                            vrf.name, router.hostname, vrf.iface
                        )))
                    }
                }
            }
        }

        Ok(Self {
            routers: arena
                .into_iter()
                .map(|r| (r.hostname.clone(), r))
                .collect(),
            border_routers,
            advertised,
        })
    }
}
