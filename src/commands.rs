//! Configuration-mode command blocks
//!
//! Builders turn operator parameters into the IOS text sent in one piece by
//! [`Session::send`](crate::core::session::Session::send). Every line ends
//! with a newline. Parsing helpers validate raw operator input first.

use std::net::Ipv4Addr;

use thiserror::Error;
use tracing::warn;

/// HSRP priority used when the operator gives none or an invalid one
pub const DEFAULT_HSRP_PRIORITY: u8 = 100;

/// Highest usable host octet in the /24 the DHCP exclusions work on
const LAST_HOST_OCTET: u32 = 254;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("VLAN ID should be a number between 1 and 4094, received: {0}")]
    InvalidVlanId(String),

    #[error("the number of {field} must be a whole number, received: {value}")]
    InvalidCount { field: &'static str, value: String },

    #[error("device address {0} is not an IPv4 address")]
    InvalidAddress(String),

    #[error("{routers} routers and {switches} switches do not fit in the excluded ranges")]
    ExclusionOverflow { routers: u32, switches: u32 },
}

/// Hot Standby Router Protocol group on one interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hsrp {
    pub interface: String,
    pub group: String,
    pub virtual_ip: String,
    pub priority: u8,
}

/// Blank means default; anything unparsable falls back to the default too
pub fn parse_priority(input: &str) -> u8 {
    let input = input.trim();
    if input.is_empty() {
        return DEFAULT_HSRP_PRIORITY;
    }
    input.parse().unwrap_or_else(|_| {
        warn!("Invalid priority {:?}, defaulting to {}", input, DEFAULT_HSRP_PRIORITY);
        DEFAULT_HSRP_PRIORITY
    })
}

pub fn hsrp(params: &Hsrp) -> String {
    let Hsrp {
        interface,
        group,
        virtual_ip,
        priority,
    } = params;
    format!(
        "interface {interface}\n\
         standby {group} ip {virtual_ip}\n\
         standby {group} priority {priority}\n\
         standby {group} preempt\n"
    )
}

/// DHCP pool served by a router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dhcp {
    pub lan_id: String,
    pub pool_network: String,
    pub subnet_mask: String,
    /// The router itself, also the base of the excluded ranges
    pub gateway: Ipv4Addr,
    pub switches: u32,
    pub routers: u32,
    pub dns_server: String,
}

pub fn parse_count(field: &'static str, input: &str) -> Result<u32, CommandError> {
    input.trim().parse().map_err(|_| CommandError::InvalidCount {
        field,
        value: input.trim().to_string(),
    })
}

pub fn parse_gateway(input: &str) -> Result<Ipv4Addr, CommandError> {
    input
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidAddress(input.trim().to_string()))
}

/// Pool plus two exclusions: `.1` up to one address per router at the
/// bottom of the /24, and one address per switch at the top.
pub fn dhcp(params: &Dhcp) -> Result<String, CommandError> {
    let overflow = || CommandError::ExclusionOverflow {
        routers: params.routers,
        switches: params.switches,
    };

    let low_end = params.routers.checked_add(1).ok_or_else(overflow)?;
    let high_start = (LAST_HOST_OCTET + 1)
        .checked_sub(params.switches)
        .ok_or_else(overflow)?;
    if low_end > LAST_HOST_OCTET || (params.switches > 0 && low_end >= high_start) {
        return Err(overflow());
    }

    let [a, b, c, _] = params.gateway.octets();
    let base = format!("{a}.{b}.{c}");

    let mut block = format!(
        "ip dhcp pool LAN{}\n\
         network {} {}\n\
         default-router {}\n\
         dns-server {}\n\
         exit\n\
         ip dhcp excluded-address {base}.1 {base}.{low_end}\n",
        params.lan_id, params.pool_network, params.subnet_mask, params.gateway, params.dns_server
    );
    if params.switches > 0 {
        block.push_str(&format!(
            "ip dhcp excluded-address {base}.{high_start} {base}.{LAST_HOST_OCTET}\n"
        ));
    }
    Ok(block)
}

/// RIP version 2 on a router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RipV2 {
    pub networks: Vec<String>,
    pub redistribute_static: bool,
}

/// `y`/`n`, case-insensitive; anything else is `None`
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

pub fn ripv2(params: &RipV2) -> String {
    let mut block = String::from("router rip\nversion 2\nno auto-summary\n");
    for network in &params.networks {
        block.push_str(&format!("network {network}\n"));
    }
    if params.redistribute_static {
        block.push_str("redistribute static\n");
    }
    block
}

pub fn parse_vlan_id(input: &str) -> Result<u16, CommandError> {
    let input = input.trim();
    match input.parse::<u16>() {
        Ok(id) if (1..=4094).contains(&id) => Ok(id),
        _ => Err(CommandError::InvalidVlanId(input.to_string())),
    }
}

pub fn vlan(id: u16, name: &str) -> String {
    format!("vlan {id}\nname {name}\n")
}

/// Access port locked to one VLAN with port security
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSecurity {
    pub interface: String,
    pub vlan: String,
}

pub fn port_security(params: &PortSecurity) -> String {
    format!(
        "interface {}\n\
         switchport mode access\n\
         switchport access vlan {}\n\
         switchport port-security\n",
        params.interface, params.vlan
    )
}

/// Rapid PVST+ with optional root bridge VLANs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stp {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

/// `q` skips the setting
pub fn parse_skippable(input: &str) -> Option<String> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        None
    } else {
        Some(input.to_string())
    }
}

pub fn stp(params: &Stp) -> String {
    let mut block = String::from("spanning-tree mode rapid-pvst\n");
    if let Some(vlan) = &params.primary {
        block.push_str(&format!("spanning-tree vlan {vlan} root primary\n"));
    }
    if let Some(vlan) = &params.secondary {
        block.push_str(&format!("spanning-tree vlan {vlan} root secondary\n"));
    }
    if params.primary.is_none() || params.secondary.is_none() {
        warn!("Skipping some VLAN root settings based on user input");
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsrp_block() {
        let block = hsrp(&Hsrp {
            interface: "Gi0/1".to_string(),
            group: "1".to_string(),
            virtual_ip: "192.168.10.254".to_string(),
            priority: 110,
        });
        assert_eq!(
            block,
            "interface Gi0/1\n\
             standby 1 ip 192.168.10.254\n\
             standby 1 priority 110\n\
             standby 1 preempt\n"
        );
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority(""), 100);
        assert_eq!(parse_priority("  150 "), 150);
        assert_eq!(parse_priority("high"), 100);
        assert_eq!(parse_priority("300"), 100);
    }

    fn dhcp_params(switches: u32, routers: u32) -> Dhcp {
        Dhcp {
            lan_id: "10".to_string(),
            pool_network: "192.168.10.0".to_string(),
            subnet_mask: "255.255.255.0".to_string(),
            gateway: Ipv4Addr::new(192, 168, 10, 1),
            switches,
            routers,
            dns_server: "8.8.8.8".to_string(),
        }
    }

    #[test]
    fn test_dhcp_block() {
        let block = dhcp(&dhcp_params(3, 2)).unwrap();
        assert_eq!(
            block,
            "ip dhcp pool LAN10\n\
             network 192.168.10.0 255.255.255.0\n\
             default-router 192.168.10.1\n\
             dns-server 8.8.8.8\n\
             exit\n\
             ip dhcp excluded-address 192.168.10.1 192.168.10.3\n\
             ip dhcp excluded-address 192.168.10.252 192.168.10.254\n"
        );
    }

    #[test]
    fn test_dhcp_without_switches_skips_high_range() {
        let block = dhcp(&dhcp_params(0, 1)).unwrap();
        assert!(block.contains("excluded-address 192.168.10.1 192.168.10.2\n"));
        assert_eq!(block.matches("excluded-address").count(), 1);
    }

    #[test]
    fn test_dhcp_overlapping_ranges() {
        assert_eq!(
            dhcp(&dhcp_params(200, 100)),
            Err(CommandError::ExclusionOverflow {
                routers: 100,
                switches: 200
            })
        );
        assert!(dhcp(&dhcp_params(0, 254)).is_err());
        assert!(dhcp(&dhcp_params(300, 0)).is_err());
    }

    #[test]
    fn test_parse_count_and_gateway() {
        assert_eq!(parse_count("switches", " 4 "), Ok(4));
        assert!(matches!(
            parse_count("routers", "two"),
            Err(CommandError::InvalidCount { field: "routers", .. })
        ));
        assert_eq!(parse_gateway("10.1.1.1"), Ok(Ipv4Addr::new(10, 1, 1, 1)));
        assert!(parse_gateway("core-router").is_err());
    }

    #[test]
    fn test_ripv2_block() {
        let mut params = RipV2 {
            networks: vec!["10.0.0.0".to_string(), "172.16.0.0".to_string()],
            redistribute_static: true,
        };
        assert_eq!(
            ripv2(&params),
            "router rip\nversion 2\nno auto-summary\nnetwork 10.0.0.0\nnetwork 172.16.0.0\nredistribute static\n"
        );

        params.redistribute_static = false;
        assert!(!ripv2(&params).contains("redistribute"));
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("Y"), Some(true));
        assert_eq!(parse_yes_no("n"), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
    }

    #[test]
    fn test_vlan() {
        assert_eq!(parse_vlan_id("10"), Ok(10));
        assert!(parse_vlan_id("ten").is_err());
        assert!(parse_vlan_id("0").is_err());
        assert!(parse_vlan_id("4095").is_err());
        assert_eq!(vlan(10, "Mgmt"), "vlan 10\nname Mgmt\n");
    }

    #[test]
    fn test_port_security_block() {
        let block = port_security(&PortSecurity {
            interface: "GigabitEthernet0/1".to_string(),
            vlan: "20".to_string(),
        });
        assert_eq!(
            block,
            "interface GigabitEthernet0/1\n\
             switchport mode access\n\
             switchport access vlan 20\n\
             switchport port-security\n"
        );
    }

    #[test]
    fn test_stp_block() {
        let full = stp(&Stp {
            primary: parse_skippable("10"),
            secondary: parse_skippable("20"),
        });
        assert_eq!(
            full,
            "spanning-tree mode rapid-pvst\n\
             spanning-tree vlan 10 root primary\n\
             spanning-tree vlan 20 root secondary\n"
        );

        let primary_only = stp(&Stp {
            primary: parse_skippable("10"),
            secondary: parse_skippable("Q"),
        });
        assert!(!primary_only.contains("secondary"));
        assert_eq!(stp(&Stp::default()), "spanning-tree mode rapid-pvst\n");
    }
}
