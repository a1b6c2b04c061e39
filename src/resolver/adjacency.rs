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

//! Derivation of the BGP session lists: the iBGP full mesh of every AS, and one eBGP session pair
//! per external link. Both passes run after all addresses are assigned; they only read interface
//! state and append neighbor entries.

use log::debug;

use super::{vrf, BgpNeighbor, Resolver, LOOPBACK_IFACE};
use crate::types::{Relationship, ResolveError};

/// Give every router an iBGP session to every other router of its AS. Sessions run between
/// primary loopback addresses, and the neighbor list follows router declaration order.
pub(super) fn build_ibgp_mesh(r: &mut Resolver) -> Result<(), ResolveError> {
    let intent = r.intent;
    for a in &intent.ases {
        let mut members = Vec::with_capacity(a.routers.len());
        for router in &a.routers {
            let idx = r.lookup(&router.hostname)?;
            let loopback = r.arena[idx].ifaces.get(LOOPBACK_IFACE).ok_or_else(|| {
                ResolveError::Inconsistency(format!("{} carries no loopback", router.hostname))
            })?;
            members.push((idx, loopback.primary()));
        }

        debug!("{}: full mesh over {} routers", a.number, members.len());
        for &(idx, _) in &members {
            for &(other, addr) in &members {
                if other == idx {
                    continue;
                }
                r.arena[idx].neighbors.push(BgpNeighbor {
                    addr,
                    remote_as: a.number,
                    internal: true,
                    relation: None,
                });
            }
        }
    }
    Ok(())
}

/// Derive the eBGP sessions of all external links, in link declaration order. Ordinary links
/// produce one neighbor entry per side, tagged with that side's role; VPN links are handed to the
/// VRF assigner instead.
pub(super) fn build_ebgp_sessions(r: &mut Resolver) -> Result<(), ResolveError> {
    let intent = r.intent;
    for link in &intent.external_links {
        let i = r.lookup(&link.first.router)?;
        let j = r.lookup(&link.second.router)?;
        let addr_i = r.iface_addr(i, &link.first.iface)?;
        let addr_j = r.iface_addr(j, &link.second.iface)?;

        if link.relation == Relationship::Vpn {
            vrf::assign_vpn(r, link, i, j, addr_i, addr_j)?;
            continue;
        }

        let role_i = link.relation;
        let role_j = link.second_relation.unwrap_or_else(|| role_i.opposite());
        let (asn_i, asn_j) = (r.arena[i].asn, r.arena[j].asn);
        r.arena[i].neighbors.push(BgpNeighbor {
            addr: addr_j,
            remote_as: asn_j,
            internal: false,
            relation: Some(role_i),
        });
        r.arena[j].neighbors.push(BgpNeighbor {
            addr: addr_i,
            remote_as: asn_i,
            internal: false,
            relation: Some(role_j),
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use crate::intent::{AsIntent, Endpoint, Intent, InternalLink, RouterIntent};
    use crate::resolver::resolve;
    use crate::types::{AsId, IgpKind};

    fn ring_of_three() -> Intent {
        let routers = (1..=3)
            .map(|n| RouterIntent {
                hostname: format!("R{n}"),
                id: n,
                border: false,
                mgmt_port: None,
            })
            .collect();
        let link = |a: &str, ai: &str, b: &str, bi: &str| InternalLink {
            first: Endpoint::new(a, ai),
            second: Endpoint::new(b, bi),
        };
        Intent {
            ases: vec![AsIntent {
                number: AsId(100),
                ipv4_prefix: Some("10.0.0.0/24".parse().unwrap()),
                ipv6_prefix: None,
                igp: IgpKind::Ospf,
                vpn_client: false,
                routers,
                internal_links: vec![
                    link("R1", "Gi1/0", "R2", "Gi1/0"),
                    link("R2", "Gi2/0", "R3", "Gi1/0"),
                    link("R3", "Gi2/0", "R1", "Gi2/0"),
                ],
            }],
            external_links: Vec::new(),
        }
    }

    #[test]
    fn every_router_peers_with_all_others() {
        let resolved = resolve(&ring_of_three()).unwrap();
        for r in resolved.routers.values() {
            assert_eq!(r.neighbors.len(), 2, "{} misses an iBGP session", r.hostname);
            assert!(r.neighbors.iter().all(|n| n.internal));
            assert!(r.neighbors.iter().all(|n| n.remote_as == AsId(100)));
            let targets: HashSet<_> = r.neighbors.iter().map(|n| n.addr).collect();
            assert_eq!(targets.len(), 2);
            // never a session to the own loopback
            assert!(!targets.contains(&r.loopback().unwrap().primary()));
        }
    }

    #[test]
    fn mesh_follows_declaration_order() {
        let resolved = resolve(&ring_of_three()).unwrap();
        let r3 = &resolved.routers["R3"];
        // loopbacks are handed out in declaration order: R1 .192, R2 .193, R3 .194
        assert_eq!(
            r3.neighbors.iter().map(|n| n.addr.to_string()).collect::<Vec<_>>(),
            vec!["10.0.0.192".to_string(), "10.0.0.193".to_string()]
        );
    }
}
