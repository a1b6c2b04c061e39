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

//! VRF assignment for VPN attachments. The endpoint in the AS that is not a `vpn_client` is the
//! attaching (provider) side: it binds the link interface to a fresh VRF and runs the eBGP session
//! inside it. The client side sees nothing special, just a plain eBGP neighbor.

use std::net::IpAddr;

use log::debug;

use super::{BgpNeighbor, Resolver, Vrf};
use crate::intent::ExternalLink;
use crate::types::ResolveError;

/// Resolve one VPN link. `i`/`j` index the two endpoint routers, `addr_i`/`addr_j` are their
/// interface addresses on this link.
pub(super) fn assign_vpn(
    r: &mut Resolver,
    link: &ExternalLink,
    i: usize,
    j: usize,
    addr_i: IpAddr,
    addr_j: IpAddr,
) -> Result<(), ResolveError> {
    let client_i = r.vpn_client[&r.arena[i].asn];
    let client_j = r.vpn_client[&r.arena[j].asn];
    // exactly one side attaches; the client side stays plain
    let (pe, pe_iface, pe_addr, ce, ce_addr) = match (client_i, client_j) {
        (false, true) => (i, &link.first.iface, addr_i, j, addr_j),
        (true, false) => (j, &link.second.iface, addr_j, i, addr_i),
        _ => {
            return Err(ResolveError::AmbiguousVrfRole {
                first: link.first.router.clone(),
                second: link.second.router.clone(),
            })
        }
    };

    let name = link.vrf_name.clone().ok_or_else(|| ResolveError::MissingVrfName {
        first: link.first.router.clone(),
        second: link.second.router.clone(),
    })?;
    if r.arena[pe].vrfs.iter().any(|v| v.name == name) {
        return Err(ResolveError::DuplicateVrfName {
            router: r.arena[pe].hostname.clone(),
            name,
        });
    }

    let pe_asn = r.arena[pe].asn;
    let ce_asn = r.arena[ce].asn;
    let count = r.vrf_counters.entry(pe_asn).or_insert(0);
    *count += 1;
    let index = *count;
    debug!(
        "{}: VRF {name} on {}:{pe_iface} (rd {}, rt {})",
        pe_asn,
        r.arena[pe].hostname,
        index * 100,
        index * 1000
    );

    let pe_hostname = r.arena[pe].hostname.clone();
    let iface = r.arena[pe].ifaces.get_mut(pe_iface).ok_or_else(|| {
        ResolveError::Inconsistency(format!(
            "interface {pe_hostname}:{pe_iface} vanished after link resolution"
        ))
    })?;
    iface.vrf = Some(name.clone());
    r.arena[pe].vrfs.push(Vrf {
        name,
        rd: index * 100,
        rt: index * 1000,
        iface: pe_iface.clone(),
        peer: ce_addr,
        remote_as: ce_asn,
    });

    // the client side runs an ordinary, unfiltered eBGP session
    r.arena[ce].neighbors.push(BgpNeighbor {
        addr: pe_addr,
        remote_as: pe_asn,
        internal: false,
        relation: None,
    });
    Ok(())
}
