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

//! Configuration generator in the style of Cisco IOS, targeting the dynamips images used in GNS3
//! projects. The output is a complete startup configuration, section by section: preamble, VRF
//! definitions, interfaces, BGP, the IGP process, and route-map stubs.

use itertools::Itertools;

use super::{CfgGen, ExportError};
use crate::resolver::{ResolvedNetwork, RouterModel};
use crate::types::IgpKind;

/// Generator for Cisco IOS startup configurations.
#[derive(Debug, Default, Clone, Copy)]
pub struct CiscoIosGen;

impl CiscoIosGen {
    /// Create a new generator.
    pub fn new() -> Self {
        Self
    }

    fn preamble(&self, router: &RouterModel) -> String {
        let mut config = String::new();
        config.push_str("service timestamps debug datetime msec\n");
        config.push_str("service timestamps log datetime msec\n");
        config.push_str("!\n");
        config.push_str(&format!("hostname {}\n", router.hostname));
        config.push_str("!\n");
        if router.ifaces.values().any(|i| i.has_ipv6()) {
            config.push_str("ipv6 unicast-routing\n!\n");
        }
        config
    }

    fn vrf_definitions(&self, router: &RouterModel) -> String {
        let mut config = String::new();
        for vrf in &router.vrfs {
            config.push_str(&format!("ip vrf {}\n", vrf.name));
            config.push_str(&format!(" rd {}:{}\n", router.asn.0, vrf.rd));
            config.push_str(&format!(" route-target export {}:{}\n", router.asn.0, vrf.rt));
            config.push_str(&format!(" route-target import {}:{}\n", router.asn.0, vrf.rt));
            config.push_str("!\n");
        }
        config
    }

    fn igp_iface_line(&self, router: &RouterModel) -> Option<String> {
        match router.igp {
            IgpKind::None => None,
            IgpKind::Rip => Some(format!(" ip rip RIP_AS_{} enable\n", router.asn.0)),
            IgpKind::Ospf => Some(format!(" ip ospf {} area 0\n", router.asn.0)),
        }
    }

    fn interfaces(&self, router: &RouterModel) -> String {
        let mut config = String::new();
        for (name, iface) in &router.ifaces {
            config.push_str(&format!("interface {name}\n"));
            if let Some(vrf) = &iface.vrf {
                config.push_str(&format!(" ip vrf forwarding {vrf}\n"));
            }
            for addr in iface.addrs.iter().filter(|a| matches!(a, ipnet::IpNet::V4(_))) {
                config.push_str(&format!(" ip address {addr}\n"));
            }
            if iface.has_ipv6() {
                config.push_str(" ipv6 enable\n");
                for addr in iface.addrs.iter().filter(|a| matches!(a, ipnet::IpNet::V6(_))) {
                    config.push_str(&format!(" ipv6 address {addr}\n"));
                }
            }
            if let Some(line) = self.igp_iface_line(router) {
                config.push_str(&line);
            }
            config.push_str("!\n");
        }
        config
    }

    fn bgp(&self, net: &ResolvedNetwork, router: &RouterModel) -> String {
        let mut config = String::new();
        config.push_str(&format!("router bgp {}\n", router.asn.0));
        config.push_str(&format!(" bgp router-id {}\n", router_id(router)));
        config.push_str(" bgp log-neighbor-changes\n");
        for n in &router.neighbors {
            config.push_str(&format!(" neighbor {} remote-as {}\n", n.addr, n.remote_as.0));
            if n.internal {
                config.push_str(&format!(" neighbor {} update-source Loopback0\n", n.addr));
            } else if let Some(rm) = n.relation.and_then(|r| r.route_map_name()) {
                config.push_str(&format!(" neighbor {} route-map {rm} in\n", n.addr));
            }
        }

        config.push_str(" !\n address-family ipv4\n");
        if router.border {
            for subnet in net.advertised.get(&router.asn).into_iter().flatten() {
                config.push_str(&format!("  network {subnet}\n"));
            }
        }
        for n in &router.neighbors {
            // next-hop-self: the mesh learns eBGP routes with a reachable next hop
            if router.border && n.internal {
                config.push_str(&format!("  neighbor {} next-hop-self\n", n.addr));
            }
            config.push_str(&format!("  neighbor {} activate\n", n.addr));
            config.push_str(&format!("  neighbor {} send-community both\n", n.addr));
        }
        config.push_str(" exit-address-family\n");

        for vrf in &router.vrfs {
            config.push_str(&format!(" !\n address-family ipv4 vrf {}\n", vrf.name));
            config.push_str(&format!(
                "  neighbor {} remote-as {}\n",
                vrf.peer, vrf.remote_as.0
            ));
            config.push_str(&format!("  neighbor {} activate\n", vrf.peer));
            config.push_str(" exit-address-family\n");
        }
        config.push_str("!\n");
        config
    }

    fn igp_process(&self, router: &RouterModel) -> String {
        let mut config = String::new();
        match router.igp {
            IgpKind::None => {}
            IgpKind::Rip => {
                config.push_str(&format!("ip router rip RIP_AS_{}\n", router.asn.0));
                config.push_str(" redistribute connected\n");
                config.push_str("!\n");
            }
            IgpKind::Ospf => {
                config.push_str(&format!("ip router ospf {}\n", router.asn.0));
                config.push_str(&format!(" router-id {}\n", router_id(router)));
                // inter-AS links never carry OSPF adjacencies
                for (name, iface) in &router.ifaces {
                    if iface.external {
                        config.push_str(&format!(" passive-interface {name}\n"));
                    }
                }
                config.push_str("!\n");
            }
        }
        config
    }

    fn route_maps(&self, router: &RouterModel) -> String {
        let mut config = String::new();
        for rm in router
            .neighbors
            .iter()
            .filter_map(|n| n.relation.and_then(|r| r.route_map_name()))
            .unique()
        {
            config.push_str(&format!("route-map {rm} permit 10\n!\n"));
        }
        config
    }
}

impl CfgGen for CiscoIosGen {
    fn generate_config(
        &self,
        net: &ResolvedNetwork,
        router: &RouterModel,
    ) -> Result<String, ExportError> {
        let mut config = String::new();
        config.push_str(&self.preamble(router));
        config.push_str(&self.vrf_definitions(router));
        config.push_str(&self.interfaces(router));
        config.push_str(&self.bgp(net, router));
        config.push_str(&self.igp_process(router));
        config.push_str(&self.route_maps(router));
        config.push_str("end\n");
        Ok(config)
    }

    fn config_file_name(&self, router: &RouterModel) -> String {
        format!("i{}_startup-config.cfg", router.id)
    }
}

/// The dotted-quad router id derived from the creation id, e.g. `3.3.3.3` for id 3.
fn router_id(router: &RouterModel) -> String {
    let id = router.id;
    format!("{id}.{id}.{id}.{id}")
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::resolver::{BgpNeighbor, IfaceAddr, ResolvedNetwork, Vrf, LOOPBACK_IFACE};
    use crate::types::{AsId, Relationship};

    fn iface(addrs: &[&str], external: bool) -> IfaceAddr {
        IfaceAddr::new(addrs.iter().map(|a| a.parse().unwrap()).collect(), external)
    }

    fn border_router() -> RouterModel {
        let mut ifaces = BTreeMap::new();
        ifaces.insert("GigabitEthernet1/0".to_string(), iface(&["10.0.0.1/30"], false));
        ifaces.insert("GigabitEthernet2/0".to_string(), iface(&["10.0.0.5/30"], true));
        ifaces.insert(LOOPBACK_IFACE.to_string(), iface(&["10.0.0.192/32"], false));
        RouterModel {
            hostname: "R1".to_string(),
            id: 1,
            asn: AsId(100),
            igp: IgpKind::Ospf,
            border: true,
            mgmt_port: None,
            ifaces,
            neighbors: vec![
                BgpNeighbor {
                    addr: "10.0.0.193".parse().unwrap(),
                    remote_as: AsId(100),
                    internal: true,
                    relation: None,
                },
                BgpNeighbor {
                    addr: "10.0.0.6".parse().unwrap(),
                    remote_as: AsId(200),
                    internal: false,
                    relation: Some(Relationship::Peer),
                },
            ],
            vrfs: Vec::new(),
        }
    }

    fn network_of(router: RouterModel) -> ResolvedNetwork {
        let mut advertised = BTreeMap::new();
        advertised.insert(AsId(100), vec!["10.0.0.0/30".parse().unwrap()]);
        ResolvedNetwork::compose(vec![router], advertised).unwrap()
    }

    #[test]
    fn border_router_config() {
        let net = network_of(border_router());
        let config = CiscoIosGen::new()
            .generate_config(&net, &net.routers["R1"])
            .unwrap();
        assert_eq!(
            config,
            "\
service timestamps debug datetime msec
service timestamps log datetime msec
!
hostname R1
!
interface GigabitEthernet1/0
 ip address 10.0.0.1/30
 ip ospf 100 area 0
!
interface GigabitEthernet2/0
 ip address 10.0.0.5/30
 ip ospf 100 area 0
!
interface Loopback0
 ip address 10.0.0.192/32
 ip ospf 100 area 0
!
router bgp 100
 bgp router-id 1.1.1.1
 bgp log-neighbor-changes
 neighbor 10.0.0.193 remote-as 100
 neighbor 10.0.0.193 update-source Loopback0
 neighbor 10.0.0.6 remote-as 200
 neighbor 10.0.0.6 route-map PEER in
 !
 address-family ipv4
  network 10.0.0.0/30
  neighbor 10.0.0.193 next-hop-self
  neighbor 10.0.0.193 activate
  neighbor 10.0.0.193 send-community both
  neighbor 10.0.0.6 activate
  neighbor 10.0.0.6 send-community both
 exit-address-family
!
ip router ospf 100
 router-id 1.1.1.1
 passive-interface GigabitEthernet2/0
!
route-map PEER permit 10
!
end
"
        );
    }

    #[test]
    fn internal_rip_router_config() {
        let mut router = border_router();
        router.border = false;
        router.igp = IgpKind::Rip;
        router.ifaces.remove("GigabitEthernet2/0");
        router.neighbors.pop();
        let net = network_of(router);
        let config = CiscoIosGen::new()
            .generate_config(&net, &net.routers["R1"])
            .unwrap();

        assert!(config.contains(" ip rip RIP_AS_100 enable\n"));
        assert!(config.contains("ip router rip RIP_AS_100\n redistribute connected\n"));
        // non-border routers advertise nothing and keep the default next hop
        assert!(!config.contains("  network "));
        assert!(!config.contains("next-hop-self"));
        assert!(!config.contains("route-map"));
    }

    #[test]
    fn vrf_sections_are_rendered() {
        let mut router = border_router();
        router.neighbors.pop();
        let attachment = router.ifaces.get_mut("GigabitEthernet2/0").unwrap();
        attachment.vrf = Some("CUSTOMER_A".to_string());
        router.vrfs.push(Vrf {
            name: "CUSTOMER_A".to_string(),
            rd: 100,
            rt: 1000,
            iface: "GigabitEthernet2/0".to_string(),
            peer: "10.0.0.6".parse().unwrap(),
            remote_as: AsId(300),
        });
        let net = network_of(router);
        let config = CiscoIosGen::new()
            .generate_config(&net, &net.routers["R1"])
            .unwrap();

        assert!(config.contains(
            "ip vrf CUSTOMER_A\n rd 100:100\n route-target export 100:1000\n route-target import 100:1000\n!\n"
        ));
        assert!(config.contains("interface GigabitEthernet2/0\n ip vrf forwarding CUSTOMER_A\n ip address 10.0.0.5/30\n"));
        assert!(config.contains(
            " address-family ipv4 vrf CUSTOMER_A\n  neighbor 10.0.0.6 remote-as 300\n  neighbor 10.0.0.6 activate\n exit-address-family\n"
        ));
    }

    #[test]
    fn dual_stack_interface_config() {
        let mut router = border_router();
        router.border = false;
        router.igp = IgpKind::None;
        router.neighbors.clear();
        router.ifaces.insert(
            "GigabitEthernet3/0".to_string(),
            iface(&["10.0.0.9/30", "2001:db8:100::1/64"], false),
        );
        let net = network_of(router);
        let config = CiscoIosGen::new()
            .generate_config(&net, &net.routers["R1"])
            .unwrap();

        assert!(config.starts_with(
            "service timestamps debug datetime msec\nservice timestamps log datetime msec\n!\nhostname R1\n!\nipv6 unicast-routing\n!\n"
        ));
        assert!(config.contains(
            "interface GigabitEthernet3/0\n ip address 10.0.0.9/30\n ipv6 enable\n ipv6 address 2001:db8:100::1/64\n!\n"
        ));
    }

    #[test]
    fn route_maps_are_emitted_once_per_relation() {
        let mut router = border_router();
        router.neighbors.push(BgpNeighbor {
            addr: "10.0.0.10".parse().unwrap(),
            remote_as: AsId(300),
            internal: false,
            relation: Some(Relationship::Peer),
        });
        router.neighbors.push(BgpNeighbor {
            addr: "10.0.0.14".parse().unwrap(),
            remote_as: AsId(400),
            internal: false,
            relation: Some(Relationship::PlainBgp),
        });
        router
            .ifaces
            .insert("GigabitEthernet3/0".to_string(), iface(&["10.0.0.9/30"], true));
        router
            .ifaces
            .insert("GigabitEthernet4/0".to_string(), iface(&["10.0.0.13/30"], true));
        let net = network_of(router);
        let config = CiscoIosGen::new()
            .generate_config(&net, &net.routers["R1"])
            .unwrap();

        assert_eq!(config.matches("route-map PEER permit 10").count(), 1);
        // plain-bgp sessions run unfiltered
        assert!(!config.contains("route-map PLAIN"));
        assert!(!config.contains(" neighbor 10.0.0.14 route-map"));
    }

    #[test]
    fn file_name_follows_the_creation_id() {
        let router = border_router();
        assert_eq!(
            CiscoIosGen::new().config_file_name(&router),
            "i1_startup-config.cfg"
        );
    }
}
