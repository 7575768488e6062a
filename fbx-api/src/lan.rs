//! LAN browser hosts
//!
//! A host is identified at layer 2 (usually by MAC address) and may carry
//! several layer 3 addresses, each with its own reachability.

use serde::{Deserialize, Serialize};

/// Layer 2 identity of a host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2Ident {
    pub id: String,

    /// `mac_address` for ethernet and wifi hosts
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A single network-layer address attached to a host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct L3Connectivity {
    pub addr: String,

    /// `ipv4` or `ipv6`
    #[serde(default)]
    pub af: String,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub reachable: bool,
}

impl L3Connectivity {
    pub fn new(addr: impl Into<String>, reachable: bool) -> Self {
        Self {
            addr: addr.into(),
            reachable,
            ..Default::default()
        }
    }
}

/// Snapshot of one host seen by the router
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanHost {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub primary_name: String,

    #[serde(default)]
    pub host_type: String,

    #[serde(default)]
    pub l2ident: Option<L2Ident>,

    #[serde(default)]
    pub vendor_name: String,

    #[serde(default)]
    pub reachable: bool,

    #[serde(default)]
    pub l3connectivities: Vec<L3Connectivity>,
}

impl LanHost {
    /// Host identified by `mac`
    pub fn with_mac(mac: impl Into<String>, vendor: impl Into<String>, reachable: bool) -> Self {
        Self {
            l2ident: Some(L2Ident {
                id: mac.into(),
                kind: "mac_address".to_string(),
            }),
            vendor_name: vendor.into(),
            reachable,
            ..Default::default()
        }
    }

    /// Append an L3 entry
    pub fn with_address(mut self, addr: impl Into<String>, reachable: bool) -> Self {
        self.l3connectivities.push(L3Connectivity::new(addr, reachable));
        self
    }

    /// MAC address, when the layer 2 identity is one
    pub fn mac(&self) -> Option<&str> {
        self.l2ident
            .as_ref()
            .filter(|ident| ident.kind == "mac_address")
            .map(|ident| ident.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_requires_mac_ident() {
        let host = LanHost::with_mac("00:24:D4:AA:BB:CC", "Freebox SAS", true);
        assert_eq!(host.mac(), Some("00:24:D4:AA:BB:CC"));

        let other = LanHost {
            l2ident: Some(L2Ident {
                id: "dhcp-client-7".to_string(),
                kind: "dhcp".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(other.mac(), None);
        assert_eq!(LanHost::default().mac(), None);
    }

    #[test]
    fn test_deserialize_router_shape() {
        let json = r#"{
            "id": "ether-00:24:d4:aa:bb:cc",
            "primary_name": "nas",
            "host_type": "nas",
            "l2ident": {"id": "00:24:D4:AA:BB:CC", "type": "mac_address"},
            "vendor_name": "Synology",
            "reachable": true,
            "l3connectivities": [
                {"addr": "192.168.1.20", "af": "ipv4", "active": true, "reachable": true},
                {"addr": "fe80::1", "af": "ipv6", "active": false, "reachable": false}
            ]
        }"#;

        let host: LanHost = serde_json::from_str(json).unwrap();
        assert_eq!(host.mac(), Some("00:24:D4:AA:BB:CC"));
        assert_eq!(host.l3connectivities.len(), 2);
        assert!(!host.l3connectivities[1].reachable);
    }
}
