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

//! Address pools. Each AS owns, per declared address family, a transit pool (fixed-size link
//! subnets carved out of the AS prefix in ascending order) and a loopback pool (single-host
//! subnets carved out of the reserved last quarter of the AS prefix).
//!
//! Pools are explicit cursors: a pool never yields the same subnet twice within a run, and
//! exhaustion is an explicit error instead of a surprise deep inside rendering code.

use std::net::IpAddr;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use log::debug;

use crate::types::{AddressFamily, AsId, ResolveError};

/// Compute the `n`-th subnet of `parent` sliced at `slice_len`, in canonical ascending order.
/// Returns `None` if the slice length does not fit the parent or `n` is out of range.
fn nth_subnet(parent: &IpNet, slice_len: u8, n: u128) -> Option<IpNet> {
    if slice_len < parent.prefix_len() {
        return None;
    }
    match parent {
        IpNet::V4(p) => {
            if slice_len > 32 || n >= 1u128 << (slice_len - p.prefix_len()) {
                return None;
            }
            let step = 1u64 << (32 - slice_len);
            let addr = u64::from(u32::from(p.network())) + n as u64 * step;
            Some(IpNet::V4(Ipv4Net::new((addr as u32).into(), slice_len).ok()?))
        }
        IpNet::V6(p) => {
            let diff = slice_len - p.prefix_len();
            if slice_len > 128 || (diff < 128 && n >= 1u128 << diff) {
                return None;
            }
            let shift = (128 - slice_len) as u32;
            let offset = n.checked_shl(shift).filter(|_| shift < 128 || n == 0)?;
            let addr = u128::from(p.network()).checked_add(offset)?;
            Some(IpNet::V6(Ipv6Net::new(addr.into(), slice_len).ok()?))
        }
    }
}

/// An explicit cursor over the ascending enumeration of fixed-size subnets of a parent prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetPool {
    parent: IpNet,
    slice_len: u8,
    cursor: u128,
    cap: u128,
}

impl SubnetPool {
    /// Create a pool over all subnets of `parent` at `slice_len`. Returns `None` if the slice
    /// length does not fit the parent prefix.
    pub fn new(parent: IpNet, slice_len: u8) -> Option<Self> {
        let family = AddressFamily::of(&parent);
        if slice_len < parent.prefix_len() || slice_len > family.host_prefix_len() {
            return None;
        }
        let diff = (slice_len - parent.prefix_len()) as u32;
        let cap = 1u128.checked_shl(diff).unwrap_or(u128::MAX);
        Some(Self {
            parent: parent.trunc(),
            slice_len,
            cursor: 0,
            cap,
        })
    }

    /// Like [`SubnetPool::new`], but the pool stops after at most `cap` subnets. Used to keep the
    /// transit pool out of the reserved loopback block.
    pub fn with_cap(parent: IpNet, slice_len: u8, cap: u128) -> Option<Self> {
        let mut pool = Self::new(parent, slice_len)?;
        pool.cap = pool.cap.min(cap);
        Some(pool)
    }

    /// The parent prefix this pool slices.
    pub fn parent(&self) -> IpNet {
        self.parent
    }

    /// How many subnets this pool can still produce.
    pub fn remaining(&self) -> u128 {
        self.cap - self.cursor
    }

    /// Produce the next subnet, or `None` if the enumerable range is exhausted.
    pub fn next_subnet(&mut self) -> Option<IpNet> {
        if self.cursor >= self.cap {
            return None;
        }
        let net = nth_subnet(&self.parent, self.slice_len, self.cursor)?;
        self.cursor += 1;
        Some(net)
    }
}

/// The transit and loopback pools of one AS in one address family.
///
/// The AS prefix is split in four: the first three quarters feed the transit pool, the last
/// quarter is reserved for loopbacks. Neither pool can ever issue a subnet of the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyPools {
    asn: AsId,
    family: AddressFamily,
    prefix: IpNet,
    transit: SubnetPool,
    loopback: SubnetPool,
}

impl FamilyPools {
    /// Split the AS prefix into the transit range and the reserved loopback block. Fails with
    /// [`ResolveError::AddressSpaceExhausted`] if the prefix is too small to be quartered.
    pub fn new(asn: AsId, prefix: IpNet) -> Result<Self, ResolveError> {
        let prefix = prefix.trunc();
        let family = AddressFamily::of(&prefix);
        let exhausted = || ResolveError::AddressSpaceExhausted { asn, family };

        let quarter_len = prefix
            .prefix_len()
            .checked_add(2)
            .filter(|l| *l <= family.transit_prefix_len())
            .ok_or_else(exhausted)?;
        let loopback_block = nth_subnet(&prefix, quarter_len, 3).ok_or_else(exhausted)?;
        let per_quarter = 1u128 << (family.transit_prefix_len() - quarter_len);
        let transit = SubnetPool::with_cap(prefix, family.transit_prefix_len(), 3 * per_quarter)
            .ok_or_else(exhausted)?;
        let loopback =
            SubnetPool::new(loopback_block, family.host_prefix_len()).ok_or_else(exhausted)?;

        Ok(Self {
            asn,
            family,
            prefix,
            transit,
            loopback,
        })
    }

    /// The address family of this pool pair.
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// The AS prefix these pools are carved from.
    pub fn prefix(&self) -> IpNet {
        self.prefix
    }

    /// The reserved block that loopbacks are drawn from.
    pub fn loopback_block(&self) -> IpNet {
        self.loopback.parent()
    }

    /// Draw the next transit subnet for a link.
    pub fn next_transit(&mut self) -> Result<IpNet, ResolveError> {
        let net = self.transit.next_subnet().ok_or(ResolveError::AddressSpaceExhausted {
            asn: self.asn,
            family: self.family,
        })?;
        debug!("{}: allocated transit subnet {net}", self.asn);
        Ok(net)
    }

    /// Draw the next loopback address (a single-host subnet).
    pub fn next_loopback(&mut self) -> Result<IpNet, ResolveError> {
        let net = self.loopback.next_subnet().ok_or(ResolveError::AddressSpaceExhausted {
            asn: self.asn,
            family: self.family,
        })?;
        debug!("{}: allocated loopback {net}", self.asn);
        Ok(net)
    }

    /// The first two usable host addresses of a transit subnet, in ascending order starting after
    /// the network address.
    pub fn host_pair(&self, subnet: &IpNet) -> Result<(IpAddr, IpAddr), ResolveError> {
        let err = || ResolveError::AddressSpaceExhausted {
            asn: self.asn,
            family: self.family,
        };
        match subnet {
            IpNet::V4(n) => {
                if n.prefix_len() > 30 {
                    return Err(err());
                }
                let base = u32::from(n.network());
                Ok((
                    IpAddr::V4((base + 1).into()),
                    IpAddr::V4((base + 2).into()),
                ))
            }
            IpNet::V6(n) => {
                if n.prefix_len() > 126 {
                    return Err(err());
                }
                let base = u128::from(n.network());
                Ok((
                    IpAddr::V6((base + 1).into()),
                    IpAddr::V6((base + 2).into()),
                ))
            }
        }
    }
}

/// All pools owned by one AS: one [`FamilyPools`] per declared address family, IPv4 first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsPools {
    asn: AsId,
    pools: Vec<FamilyPools>,
}

impl AsPools {
    /// Build the pools of an AS from its declared prefixes. At least one family must be declared,
    /// otherwise this fails with [`ResolveError::MissingPrefix`].
    pub fn new(
        asn: AsId,
        ipv4: Option<Ipv4Net>,
        ipv6: Option<Ipv6Net>,
    ) -> Result<Self, ResolveError> {
        let mut pools = Vec::new();
        if let Some(p) = ipv4 {
            pools.push(FamilyPools::new(asn, IpNet::V4(p))?);
        }
        if let Some(p) = ipv6 {
            pools.push(FamilyPools::new(asn, IpNet::V6(p))?);
        }
        if pools.is_empty() {
            return Err(ResolveError::MissingPrefix(asn));
        }
        Ok(Self { asn, pools })
    }

    /// The owning AS.
    pub fn asn(&self) -> AsId {
        self.asn
    }

    /// Iterate over the per-family pools.
    pub fn families(&self) -> impl Iterator<Item = &FamilyPools> {
        self.pools.iter()
    }

    /// Iterate mutably over the per-family pools.
    pub fn families_mut(&mut self) -> impl Iterator<Item = &mut FamilyPools> {
        self.pools.iter_mut()
    }
}
