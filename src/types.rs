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

//! Module containing all type definitions shared between the intent model, the
//! resolution engine and the exporter.

use std::fmt;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// AS Number
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AsId(pub u32);

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS{}", self.0)
    }
}

impl From<u32> for AsId {
    fn from(x: u32) -> Self {
        Self(x)
    }
}

/// Interior gateway protocol running inside an AS.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IgpKind {
    /// No IGP is configured; only directly connected routes exist.
    #[default]
    #[serde(rename = "none")]
    None,
    /// RIP (one process per AS, named `RIP_AS_<number>`).
    #[serde(rename = "RIP")]
    Rip,
    /// OSPF (single area 0, process id equal to the AS number).
    #[serde(rename = "OSPF")]
    Ospf,
}

impl fmt::Display for IgpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgpKind::None => write!(f, "none"),
            IgpKind::Rip => write!(f, "RIP"),
            IgpKind::Ospf => write!(f, "OSPF"),
        }
    }
}

/// The address family of a prefix or a pool. Each AS owns one transit pool and one loopback pool
/// per family it declares a prefix for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    /// IPv4
    Ipv4,
    /// IPv6
    Ipv6,
}

impl AddressFamily {
    /// Get the family of the given network.
    pub fn of(net: &IpNet) -> Self {
        match net {
            IpNet::V4(_) => Self::Ipv4,
            IpNet::V6(_) => Self::Ipv6,
        }
    }

    /// Prefix length of transit (link) subnets in this family.
    pub fn transit_prefix_len(self) -> u8 {
        match self {
            Self::Ipv4 => 30,
            Self::Ipv6 => 64,
        }
    }

    /// Prefix length of a single host (loopback) in this family.
    pub fn host_prefix_len(self) -> u8 {
        match self {
            Self::Ipv4 => 32,
            Self::Ipv6 => 128,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "IPv4"),
            Self::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// Commercial relationship of an inter-AS link. The relationship selects the route-map applied to
/// the eBGP session on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    /// Settlement-free peering; both sides apply the same `PEER` filter.
    Peer,
    /// This side sells transit to the other side.
    Provider,
    /// This side buys transit from the other side.
    Client,
    /// An ordinary eBGP session without any route-map.
    PlainBgp,
    /// A VPN attachment; the provider side isolates the link in a VRF.
    Vpn,
}

impl Relationship {
    /// The role of the opposite side of a link, used when the intent only declares one side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Provider => Self::Client,
            Self::Client => Self::Provider,
            other => other,
        }
    }

    /// Name of the route-map applied to sessions with this relationship, or `None` if the session
    /// runs unfiltered.
    pub fn route_map_name(self) -> Option<&'static str> {
        match self {
            Self::Peer => Some("PEER"),
            Self::Provider => Some("PROVIDER"),
            Self::Client => Some("CLIENT"),
            Self::PlainBgp | Self::Vpn => None,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peer => write!(f, "peer"),
            Self::Provider => write!(f, "provider"),
            Self::Client => write!(f, "client"),
            Self::PlainBgp => write!(f, "plain-bgp"),
            Self::Vpn => write!(f, "vpn"),
        }
    }
}

/// Error raised by the resolution engine. Every variant is fatal to the run; the engine never
/// produces a partial model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// An interface is claimed by two links.
    #[error("interface {iface} of router {router} is already in use")]
    DuplicateInterfaceAssignment {
        /// Hostname of the affected router.
        router: String,
        /// Name of the interface that was claimed twice.
        iface: String,
    },
    /// A pool cannot produce another subnet or host. The AS prefix is undersized for its declared
    /// topology.
    #[error("{asn} ran out of {family} address space")]
    AddressSpaceExhausted {
        /// The AS whose pool is exhausted.
        asn: AsId,
        /// The family of the exhausted pool.
        family: AddressFamily,
    },
    /// A link references a router that was never declared (or declared in a different AS).
    #[error("link endpoint references unknown router {0}")]
    UnknownEndpoint(String),
    /// A VPN link cannot unambiguously assign the attaching and the remote side.
    #[error(
        "cannot decide the attaching side of the VPN link between {first} and {second}: \
         exactly one endpoint must belong to a vpn_client AS"
    )]
    AmbiguousVrfRole {
        /// Hostname of the first endpoint.
        first: String,
        /// Hostname of the second endpoint.
        second: String,
    },
    /// An AS declares no address prefix in any family.
    #[error("{0} declares no address prefix")]
    MissingPrefix(AsId),
    /// Two routers share the same hostname.
    #[error("router {0} is declared more than once")]
    DuplicateHostname(String),
    /// Two AS records share the same number.
    #[error("{0} is declared more than once")]
    DuplicateAsNumber(AsId),
    /// A router would own two VRFs with the same name.
    #[error("router {router} already owns a VRF named {name}")]
    DuplicateVrfName {
        /// Hostname of the affected router.
        router: String,
        /// The VRF name that was used twice.
        name: String,
    },
    /// A VPN link does not carry a VRF name.
    #[error("the VPN link between {first} and {second} does not carry a vrf_name")]
    MissingVrfName {
        /// Hostname of the first endpoint.
        first: String,
        /// Hostname of the second endpoint.
        second: String,
    },
    /// The final consistency pass over the composed model failed. This points to a bug in the
    /// resolution passes, not to an intent defect.
    #[error("resolved model failed its consistency check: {0}")]
    Inconsistency(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn relationship_roles() {
        assert_eq!(Relationship::Provider.opposite(), Relationship::Client);
        assert_eq!(Relationship::Client.opposite(), Relationship::Provider);
        assert_eq!(Relationship::Peer.opposite(), Relationship::Peer);
        assert_eq!(Relationship::PlainBgp.opposite(), Relationship::PlainBgp);
        assert_eq!(Relationship::Peer.route_map_name(), Some("PEER"));
        assert_eq!(Relationship::PlainBgp.route_map_name(), None);
        assert_eq!(Relationship::Vpn.route_map_name(), None);
    }

    #[test]
    fn family_of_prefix() {
        let v4: IpNet = "10.0.0.0/24".parse().unwrap();
        let v6: IpNet = "2001:db8::/48".parse().unwrap();
        assert_eq!(AddressFamily::of(&v4), AddressFamily::Ipv4);
        assert_eq!(AddressFamily::of(&v6), AddressFamily::Ipv6);
        assert_eq!(AddressFamily::Ipv4.transit_prefix_len(), 30);
        assert_eq!(AddressFamily::Ipv6.host_prefix_len(), 128);
    }
}
