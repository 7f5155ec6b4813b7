//! Network interface lookup via pnet.

use std::fmt;

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;

use crate::error::CaptureError;

/// Find an interface by name.
pub fn find_interface(name: &str) -> Result<NetworkInterface, CaptureError> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| CaptureError::InterfaceNotFound(name.to_string()))
}

/// Summary of one network interface, as shown by `--list-interfaces`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSummary {
    pub name: String,
    pub index: u32,
    pub up: bool,
    pub addresses: Vec<IpNetwork>,
}

impl From<NetworkInterface> for InterfaceSummary {
    fn from(iface: NetworkInterface) -> Self {
        Self {
            up: iface.is_up(),
            name: iface.name,
            index: iface.index,
            addresses: iface.ips,
        }
    }
}

impl fmt::Display for InterfaceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.up { "up" } else { "down" };
        write!(f, "{} (index {}, {})", self.name, self.index, state)?;
        for addr in &self.addresses {
            write!(f, " {}", addr)?;
        }
        Ok(())
    }
}

/// Enumerate network interfaces.
pub fn list_interfaces() -> Vec<InterfaceSummary> {
    datalink::interfaces()
        .into_iter()
        .map(InterfaceSummary::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_find_missing_interface() {
        let err = find_interface("no-such-iface0").unwrap_err();
        assert!(matches!(err, CaptureError::InterfaceNotFound(name) if name == "no-such-iface0"));
    }

    #[test]
    #[serial]
    fn test_find_listed_interfaces() {
        for iface in datalink::interfaces() {
            let found = find_interface(&iface.name).unwrap();
            assert_eq!(found.index, iface.index);
        }
    }

    #[test]
    #[serial]
    fn test_list_matches_lookup() {
        for summary in list_interfaces() {
            let iface = find_interface(&summary.name).unwrap();
            assert_eq!(summary.index, iface.index);
        }
    }

    #[test]
    fn test_summary_display() {
        let summary = InterfaceSummary {
            name: "eth0".to_string(),
            index: 2,
            up: true,
            addresses: vec!["192.168.1.10/24".parse().unwrap()],
        };
        assert_eq!(summary.to_string(), "eth0 (index 2, up) 192.168.1.10/24");

        let bare = InterfaceSummary {
            name: "dummy0".to_string(),
            index: 7,
            up: false,
            addresses: Vec::new(),
        };
        assert_eq!(bare.to_string(), "dummy0 (index 7, down)");
    }
}
