//! Device reachability matching
//!
//! A tracked device is looked up in a LAN host snapshot either by MAC
//! address (whole-host reachability) or by IP address (reachability of that
//! one L3 entry, since a host can hold several addresses in different
//! states).

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use fbx_api::LanHost;
use thiserror::Error;
use tracing::debug;

use crate::bus::ChannelBus;
use crate::channel::{ChannelValue, PROPERTY_VENDOR, REACHABLE};

/// Rejected tracked-address configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid MAC address: {0:?}")]
    InvalidMac(String),

    #[error("Invalid IP address: {0:?}")]
    InvalidIp(String),
}

/// MAC address normalized to upper-case, colon-separated form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    /// Accepts six hex octets separated by `:` or `-`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let octets: Vec<&str> = trimmed.split(|c| c == ':' || c == '-').collect();

        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(AddressError::InvalidMac(s.to_string()));
        }

        Ok(Self(octets.join(":").to_ascii_uppercase()))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a tracked address is looked up in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    ByMac,
    ByIp,
}

/// Address identifying the tracked device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedAddress {
    Mac(MacAddress),
    Ip(IpAddr),
}

impl TrackedAddress {
    pub fn parse_mac(s: &str) -> Result<Self, AddressError> {
        s.parse().map(TrackedAddress::Mac)
    }

    pub fn parse_ip(s: &str) -> Result<Self, AddressError> {
        s.trim()
            .parse()
            .map(TrackedAddress::Ip)
            .map_err(|_| AddressError::InvalidIp(s.to_string()))
    }

    pub fn match_mode(&self) -> MatchMode {
        match self {
            TrackedAddress::Mac(_) => MatchMode::ByMac,
            TrackedAddress::Ip(_) => MatchMode::ByIp,
        }
    }
}

impl fmt::Display for TrackedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackedAddress::Mac(mac) => write!(f, "{}", mac),
            TrackedAddress::Ip(ip) => write!(f, "{}", ip),
        }
    }
}

/// Outcome of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMatch {
    pub reachable: bool,
    /// Vendor of the matching host; never empty
    pub vendor: Option<String>,
}

/// Look `tracked` up in `snapshot` using `mode`
///
/// `None` means the device is absent from the snapshot, which is not the
/// same as unreachable: callers keep whatever they published before. A
/// mode that does not fit the address kind never matches.
pub fn match_host(
    snapshot: &[LanHost],
    tracked: &TrackedAddress,
    mode: MatchMode,
) -> Option<HostMatch> {
    match (mode, tracked) {
        (MatchMode::ByMac, TrackedAddress::Mac(mac)) => match_by_mac(snapshot, mac),
        (MatchMode::ByIp, TrackedAddress::Ip(ip)) => match_by_ip(snapshot, ip),
        _ => {
            debug!(?mode, %tracked, "match mode does not fit tracked address");
            None
        }
    }
}

fn match_by_mac(snapshot: &[LanHost], mac: &MacAddress) -> Option<HostMatch> {
    snapshot
        .iter()
        .find(|host| {
            host.mac()
                .is_some_and(|m| m.eq_ignore_ascii_case(mac.as_str()))
        })
        .map(|host| HostMatch {
            reachable: host.reachable,
            vendor: non_empty(&host.vendor_name),
        })
}

fn match_by_ip(snapshot: &[LanHost], ip: &IpAddr) -> Option<HostMatch> {
    let mut found = false;

    for host in snapshot {
        for l3 in &host.l3connectivities {
            if l3.addr.trim().parse::<IpAddr>().ok() != Some(*ip) {
                continue;
            }
            if l3.reachable {
                return Some(HostMatch {
                    reachable: true,
                    vendor: non_empty(&host.vendor_name),
                });
            }
            found = true;
        }
    }

    found.then_some(HostMatch {
        reachable: false,
        vendor: None,
    })
}

fn non_empty(vendor: &str) -> Option<String> {
    (!vendor.is_empty()).then(|| vendor.to_string())
}

/// Publish the outcome of a lookup
///
/// `reachable` is published whenever the device was found; the vendor
/// property is only written when it changed.
pub fn publish_reachability(bus: &dyn ChannelBus, found: &HostMatch) {
    bus.publish(REACHABLE, ChannelValue::OnOff(found.reachable));

    if let Some(vendor) = &found.vendor {
        if bus.publish_if_changed(PROPERTY_VENDOR, vendor) {
            debug!(%vendor, "vendor updated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::StoreBus;
    use rstest::rstest;

    fn snapshot() -> Vec<LanHost> {
        vec![
            LanHost::with_mac("00:11:22:33:44:55", "Apple", true)
                .with_address("192.168.1.10", true),
            LanHost::with_mac("AA:BB:CC:DD:EE:FF", "", false)
                .with_address("192.168.1.20", false),
            LanHost::with_mac("66:77:88:99:AA:BB", "Netgear", true)
                .with_address("192.168.1.30", false)
                .with_address("192.168.1.31", true)
                .with_address("fe80::1", true),
        ]
    }

    #[rstest]
    #[case("00:11:22:33:44:55", Some((true, Some("Apple"))))]
    #[case("00-11-22-33-44-55", Some((true, Some("Apple"))))]
    #[case("aa:bb:cc:dd:ee:ff", Some((false, None)))]
    #[case("12:34:56:78:9A:BC", None)]
    fn test_match_by_mac(#[case] mac: &str, #[case] expected: Option<(bool, Option<&str>)>) {
        let tracked = TrackedAddress::parse_mac(mac).unwrap();
        let result = match_host(&snapshot(), &tracked, tracked.match_mode());

        let expected = expected.map(|(reachable, vendor)| HostMatch {
            reachable,
            vendor: vendor.map(str::to_string),
        });
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case("192.168.1.10", Some((true, Some("Apple"))))]
    #[case("192.168.1.20", Some((false, None)))]
    #[case("192.168.1.30", Some((false, None)))]
    #[case("192.168.1.31", Some((true, Some("Netgear"))))]
    #[case("fe80::1", Some((true, Some("Netgear"))))]
    #[case("10.0.0.1", None)]
    fn test_match_by_ip(#[case] ip: &str, #[case] expected: Option<(bool, Option<&str>)>) {
        let tracked = TrackedAddress::parse_ip(ip).unwrap();
        let result = match_host(&snapshot(), &tracked, tracked.match_mode());

        let expected = expected.map(|(reachable, vendor)| HostMatch {
            reachable,
            vendor: vendor.map(str::to_string),
        });
        assert_eq!(result, expected);
    }

    #[test]
    fn test_ip_reachable_on_any_matching_entry() {
        // Same address on two hosts: unreachable on the first, reachable on the second
        let hosts = vec![
            LanHost::with_mac("00:00:00:00:00:01", "Stale", false).with_address("192.168.1.50", false),
            LanHost::with_mac("00:00:00:00:00:02", "Fresh", true).with_address("192.168.1.50", true),
        ];
        let tracked = TrackedAddress::parse_ip("192.168.1.50").unwrap();

        assert_eq!(
            match_host(&hosts, &tracked, tracked.match_mode()),
            Some(HostMatch {
                reachable: true,
                vendor: Some("Fresh".to_string()),
            })
        );
    }

    #[test]
    fn test_mac_first_match_wins() {
        let hosts = vec![
            LanHost::with_mac("00:11:22:33:44:55", "First", false),
            LanHost::with_mac("00:11:22:33:44:55", "Second", true),
        ];
        let tracked = TrackedAddress::parse_mac("00:11:22:33:44:55").unwrap();

        let found = match_host(&hosts, &tracked, tracked.match_mode()).unwrap();
        assert!(!found.reachable);
        assert_eq!(found.vendor.as_deref(), Some("First"));
    }

    #[rstest]
    #[case("00:11:22:33:44")]
    #[case("00:11:22:33:44:GG")]
    #[case("001122334455")]
    #[case("")]
    fn test_invalid_mac(#[case] raw: &str) {
        assert_eq!(
            TrackedAddress::parse_mac(raw),
            Err(AddressError::InvalidMac(raw.to_string()))
        );
    }

    #[test]
    fn test_invalid_ip() {
        assert!(matches!(
            TrackedAddress::parse_ip("192.168.1"),
            Err(AddressError::InvalidIp(_))
        ));
    }

    #[test]
    fn test_match_mode_follows_address_kind() {
        let mac = TrackedAddress::parse_mac("00:11:22:33:44:55").unwrap();
        let ip = TrackedAddress::parse_ip("192.168.1.10").unwrap();

        assert_eq!(mac.match_mode(), MatchMode::ByMac);
        assert_eq!(ip.match_mode(), MatchMode::ByIp);
        assert_eq!(mac.to_string(), "00:11:22:33:44:55");
    }

    #[test]
    fn test_mismatched_mode_never_matches() {
        let mac = TrackedAddress::parse_mac("00:11:22:33:44:55").unwrap();
        let ip = TrackedAddress::parse_ip("192.168.1.10").unwrap();

        assert_eq!(match_host(&snapshot(), &mac, MatchMode::ByIp), None);
        assert_eq!(match_host(&snapshot(), &ip, MatchMode::ByMac), None);
        assert!(match_host(&snapshot(), &ip, MatchMode::ByIp).is_some());
    }

    #[test]
    fn test_publish_reachability_suppresses_same_vendor() {
        let bus = StoreBus::new();
        bus.store().watch(PROPERTY_VENDOR);
        let found = HostMatch {
            reachable: true,
            vendor: Some("Apple".to_string()),
        };

        publish_reachability(&bus, &found);
        publish_reachability(&bus, &found);

        assert_eq!(bus.get(REACHABLE), Some(ChannelValue::OnOff(true)));
        assert_eq!(bus.property(PROPERTY_VENDOR).as_deref(), Some("Apple"));
        assert_eq!(bus.store().iter().try_iter().count(), 1);
    }

    #[test]
    fn test_publish_reachability_without_vendor_keeps_property() {
        let bus = StoreBus::new();
        bus.publish_if_changed(PROPERTY_VENDOR, "Apple");

        publish_reachability(
            &bus,
            &HostMatch {
                reachable: false,
                vendor: None,
            },
        );

        assert_eq!(bus.get(REACHABLE), Some(ChannelValue::OnOff(false)));
        assert_eq!(bus.property(PROPERTY_VENDOR).as_deref(), Some("Apple"));
    }
}
