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

//! The address and topology resolution engine.
//!
//! [`resolve`] walks the intent in declaration order and produces one immutable
//! [`RouterModel`] per router. Resolution is a strict sequence of passes over an arena of router
//! records, each pass reading the intent and writing into the arena:
//!
//! 1. arena and pool construction (uniqueness of hostnames and AS numbers),
//! 2. internal link resolution and loopback assignment, per AS in declaration order,
//! 3. external link resolution (the transit subnet comes from the lower-numbered AS),
//! 4. iBGP full mesh and eBGP session derivation (VPN links go through the VRF assigner),
//! 5. model composition with a final consistency pass.
//!
//! The first error aborts the whole run; no partial model is ever returned.

use std::collections::{BTreeMap, HashMap};

use ipnet::IpNet;
use log::{debug, info};

use crate::addressing::AsPools;
use crate::intent::Intent;
use crate::types::{AsId, ResolveError};

mod adjacency;
mod model;
mod vrf;

pub use model::{
    BgpNeighbor, IfaceAddr, ResolvedNetwork, RouterModel, Vrf, LOOPBACK_IFACE,
};

/// Resolve an intent into the per-router configuration model.
pub fn resolve(intent: &Intent) -> Result<ResolvedNetwork, ResolveError> {
    let mut resolver = Resolver::new(intent)?;
    resolver.resolve_internal_links()?;
    resolver.resolve_external_links()?;
    adjacency::build_ibgp_mesh(&mut resolver)?;
    adjacency::build_ebgp_sessions(&mut resolver)?;
    info!(
        "resolved {} routers in {} ASes",
        resolver.arena.len(),
        resolver.pools.len()
    );
    ResolvedNetwork::compose(resolver.arena, resolver.advertised)
}

/// Working state of one resolution run: the router arena (in declaration order), the hostname
/// index into it, and the per-AS pools and counters.
struct Resolver<'a> {
    intent: &'a Intent,
    arena: Vec<RouterModel>,
    index: HashMap<String, usize>,
    pools: BTreeMap<AsId, AsPools>,
    vpn_client: BTreeMap<AsId, bool>,
    vrf_counters: BTreeMap<AsId, u32>,
    advertised: BTreeMap<AsId, Vec<IpNet>>,
}

impl<'a> Resolver<'a> {
    fn new(intent: &'a Intent) -> Result<Self, ResolveError> {
        let mut arena = Vec::new();
        let mut index = HashMap::new();
        let mut pools = BTreeMap::new();
        let mut vpn_client = BTreeMap::new();

        for a in &intent.ases {
            if pools.contains_key(&a.number) {
                return Err(ResolveError::DuplicateAsNumber(a.number));
            }
            pools.insert(
                a.number,
                AsPools::new(a.number, a.ipv4_prefix, a.ipv6_prefix)?,
            );
            vpn_client.insert(a.number, a.vpn_client);

            for router in &a.routers {
                if index.contains_key(&router.hostname) {
                    return Err(ResolveError::DuplicateHostname(router.hostname.clone()));
                }
                index.insert(router.hostname.clone(), arena.len());
                arena.push(RouterModel {
                    hostname: router.hostname.clone(),
                    id: router.id,
                    asn: a.number,
                    igp: a.igp,
                    border: router.border,
                    mgmt_port: router.mgmt_port,
                    ifaces: BTreeMap::new(),
                    neighbors: Vec::new(),
                    vrfs: Vec::new(),
                });
            }
        }

        Ok(Self {
            intent,
            arena,
            index,
            pools,
            vpn_client,
            vrf_counters: BTreeMap::new(),
            advertised: BTreeMap::new(),
        })
    }

    /// Find a router by hostname.
    fn lookup(&self, hostname: &str) -> Result<usize, ResolveError> {
        self.index
            .get(hostname)
            .copied()
            .ok_or_else(|| ResolveError::UnknownEndpoint(hostname.to_string()))
    }

    /// Find a router by hostname and require it to be a member of the given AS.
    fn member(&self, hostname: &str, asn: AsId) -> Result<usize, ResolveError> {
        let idx = self.lookup(hostname)?;
        if self.arena[idx].asn != asn {
            return Err(ResolveError::UnknownEndpoint(hostname.to_string()));
        }
        Ok(idx)
    }

    /// Fail if the interface is already claimed by an earlier link. This check runs on both
    /// endpoints before any subnet is drawn; a silent overwrite would put two links on one IP.
    fn claim_check(&self, idx: usize, iface: &str) -> Result<(), ResolveError> {
        if self.arena[idx].ifaces.contains_key(iface) {
            return Err(ResolveError::DuplicateInterfaceAssignment {
                router: self.arena[idx].hostname.clone(),
                iface: iface.to_string(),
            });
        }
        Ok(())
    }

    /// Draw one transit subnet per declared family from the given AS and split it into the two
    /// endpoint addresses. Internal links also record the subnet for BGP advertisement.
    fn allocate_link(
        &mut self,
        donor: AsId,
        advertise: bool,
    ) -> Result<(Vec<IpNet>, Vec<IpNet>), ResolveError> {
        let pools = self
            .pools
            .get_mut(&donor)
            .ok_or_else(|| ResolveError::Inconsistency(format!("no pools exist for {donor}")))?;

        let mut first = Vec::new();
        let mut second = Vec::new();
        for family in pools.families_mut() {
            let subnet = family.next_transit()?;
            let (h1, h2) = family.host_pair(&subnet)?;
            // unwrapping is fine: both hosts lie within the subnet we just carved
            first.push(IpNet::new(h1, subnet.prefix_len()).unwrap());
            second.push(IpNet::new(h2, subnet.prefix_len()).unwrap());
            if advertise {
                self.advertised.entry(donor).or_default().push(subnet);
            }
        }
        Ok((first, second))
    }

    /// Resolve all internal links, then assign loopbacks, per AS in declaration order.
    fn resolve_internal_links(&mut self) -> Result<(), ResolveError> {
        let intent = self.intent;
        for a in &intent.ases {
            for link in &a.internal_links {
                let i = self.member(&link.first.router, a.number)?;
                let j = self.member(&link.second.router, a.number)?;
                if i == j && link.first.iface == link.second.iface {
                    return Err(ResolveError::DuplicateInterfaceAssignment {
                        router: link.first.router.clone(),
                        iface: link.first.iface.clone(),
                    });
                }
                self.claim_check(i, &link.first.iface)?;
                self.claim_check(j, &link.second.iface)?;

                let (addrs_i, addrs_j) = self.allocate_link(a.number, true)?;
                debug!(
                    "{}: {}:{} <-> {}:{}",
                    a.number, link.first.router, link.first.iface, link.second.router,
                    link.second.iface
                );
                self.arena[i]
                    .ifaces
                    .insert(link.first.iface.clone(), IfaceAddr::new(addrs_i, false));
                self.arena[j]
                    .ifaces
                    .insert(link.second.iface.clone(), IfaceAddr::new(addrs_j, false));
            }

            // loopbacks only after every internal link of the AS is resolved
            for router in &a.routers {
                let idx = self.lookup(&router.hostname)?;
                self.claim_check(idx, LOOPBACK_IFACE)?;
                let pools = self.pools.get_mut(&a.number).ok_or_else(|| {
                    ResolveError::Inconsistency(format!("no pools exist for {}", a.number))
                })?;
                let mut addrs = Vec::new();
                for family in pools.families_mut() {
                    addrs.push(family.next_loopback()?);
                }
                self.arena[idx]
                    .ifaces
                    .insert(LOOPBACK_IFACE.to_string(), IfaceAddr::new(addrs, false));
            }
        }
        Ok(())
    }

    /// Resolve all inter-AS links in declaration order. The transit subnet of an external link is
    /// always drawn from the pools of the endpoint AS with the lower AS number, independent of the
    /// order in which the two endpoints are declared.
    fn resolve_external_links(&mut self) -> Result<(), ResolveError> {
        let intent = self.intent;
        for link in &intent.external_links {
            let i = self.lookup(&link.first.router)?;
            let j = self.lookup(&link.second.router)?;
            if i == j && link.first.iface == link.second.iface {
                return Err(ResolveError::DuplicateInterfaceAssignment {
                    router: link.first.router.clone(),
                    iface: link.first.iface.clone(),
                });
            }
            self.claim_check(i, &link.first.iface)?;
            self.claim_check(j, &link.second.iface)?;

            let donor = self.arena[i].asn.min(self.arena[j].asn);
            let (addrs_i, addrs_j) = self.allocate_link(donor, false)?;
            debug!(
                "external ({}): {}:{} <-> {}:{}",
                link.relation, link.first.router, link.first.iface, link.second.router,
                link.second.iface
            );
            self.arena[i]
                .ifaces
                .insert(link.first.iface.clone(), IfaceAddr::new(addrs_i, true));
            self.arena[j]
                .ifaces
                .insert(link.second.iface.clone(), IfaceAddr::new(addrs_j, true));
            self.arena[i].border = true;
            self.arena[j].border = true;
        }
        Ok(())
    }

    /// The primary address of a router's interface, used as the remote end of BGP sessions.
    fn iface_addr(&self, idx: usize, iface: &str) -> Result<std::net::IpAddr, ResolveError> {
        self.arena[idx]
            .ifaces
            .get(iface)
            .map(|i| i.primary())
            .ok_or_else(|| {
                ResolveError::Inconsistency(format!(
                    "interface {}:{iface} vanished after link resolution",
                    self.arena[idx].hostname
                ))
            })
    }
}
