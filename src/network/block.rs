//! IPv4 CIDR address blocks.
//!
//! An [`AddressBlock`] is always stored in normalized form: the base address
//! has every host bit cleared, so two blocks compare equal exactly when they
//! describe the same range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::TopologyError;

/// Maximum prefix length for an IPv4 block.
pub const MAX_PREFIX_LEN: u8 = 32;

/// A contiguous IPv4 range expressed as base address plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressBlock {
    base: Ipv4Addr,
    prefix_len: u8,
}

/// Converts a prefix length to a netmask.
const fn netmask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (MAX_PREFIX_LEN - prefix_len)
    }
}

impl AddressBlock {
    /// The default-route destination, `0.0.0.0/0`.
    pub const ANY: Self = Self {
        base: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Creates a block, clearing any host bits in `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if `prefix_len` is greater than 32.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, TopologyError> {
        if prefix_len > MAX_PREFIX_LEN {
            return Err(TopologyError::invalid_block(
                format!("{addr}/{prefix_len}"),
                "prefix length is too long",
            ));
        }

        let base = Ipv4Addr::from(u32::from(addr) & netmask(prefix_len));
        Ok(Self { base, prefix_len })
    }

    /// Creates a block from four octets and a prefix length.
    ///
    /// # Errors
    ///
    /// Returns an error if `prefix_len` is greater than 32.
    pub fn from_octets(octets: [u8; 4], prefix_len: u8) -> Result<Self, TopologyError> {
        Self::new(Ipv4Addr::from(octets), prefix_len)
    }

    /// Returns the network (base) address.
    #[must_use]
    pub const fn base(&self) -> Ipv4Addr {
        self.base
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns the base address octets.
    #[must_use]
    pub const fn octets(&self) -> [u8; 4] {
        self.base.octets()
    }

    /// Returns the first address in the block.
    #[must_use]
    pub const fn first(&self) -> Ipv4Addr {
        self.base
    }

    /// Returns the last (broadcast) address in the block.
    #[must_use]
    pub fn last(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.base) | !netmask(self.prefix_len))
    }

    /// Returns the number of addresses in the block.
    #[must_use]
    pub const fn size(&self) -> u64 {
        1u64 << (MAX_PREFIX_LEN - self.prefix_len)
    }

    /// Returns true if `other` lies entirely inside this block.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.prefix_len >= self.prefix_len
            && u32::from(other.base) & netmask(self.prefix_len) == u32::from(self.base)
    }

    /// Returns true if the two blocks share at least one address.
    ///
    /// CIDR blocks either nest or are disjoint, so containment in either
    /// direction is the whole test.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for AddressBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

impl FromStr for AddressBlock {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| TopologyError::invalid_block(s, "expected ADDRESS/PREFIX"))?;

        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| TopologyError::invalid_block(s, format!("invalid address {addr}")))?;
        let len: u8 = len
            .parse()
            .map_err(|_| TopologyError::invalid_block(s, format!("invalid prefix length {len}")))?;

        Self::new(addr, len)
    }
}

impl TryFrom<String> for AddressBlock {
    type Error = TopologyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AddressBlock> for String {
    fn from(block: AddressBlock) -> Self {
        block.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(s: &str) -> AddressBlock {
        s.parse().expect("valid block")
    }

    #[test]
    fn test_parse_and_display() {
        let b = block("10.1.64.0/19");
        assert_eq!(b.base(), Ipv4Addr::new(10, 1, 64, 0));
        assert_eq!(b.prefix_len(), 19);
        assert_eq!(b.to_string(), "10.1.64.0/19");
    }

    #[test]
    fn test_host_bits_are_cleared() {
        assert_eq!(block("10.1.70.9/19"), block("10.1.64.0/19"));
        assert_eq!(block("192.168.1.42/24").to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_invalid_blocks() {
        assert!("10.1.0.0".parse::<AddressBlock>().is_err());
        assert!("10.1.0.0/33".parse::<AddressBlock>().is_err());
        assert!("10.1.0/24".parse::<AddressBlock>().is_err());
        assert!("10.1.0.0/x".parse::<AddressBlock>().is_err());
    }

    #[test]
    fn test_first_last_size() {
        let b = block("10.1.66.0/24");
        assert_eq!(b.first(), Ipv4Addr::new(10, 1, 66, 0));
        assert_eq!(b.last(), Ipv4Addr::new(10, 1, 66, 255));
        assert_eq!(b.size(), 256);

        let vpc = block("10.1.32.0/19");
        assert_eq!(vpc.last(), Ipv4Addr::new(10, 1, 63, 255));
        assert_eq!(AddressBlock::ANY.size(), 1u64 << 32);
        assert_eq!(AddressBlock::ANY.last(), Ipv4Addr::BROADCAST);
    }

    #[test]
    fn test_contains() {
        let vpc = block("10.1.64.0/19");
        assert!(vpc.contains(&block("10.1.64.0/24")));
        assert!(vpc.contains(&block("10.1.95.0/24")));
        assert!(!vpc.contains(&block("10.1.96.0/24")));
        assert!(!vpc.contains(&block("10.1.63.0/24")));
        assert!(!block("10.1.64.0/24").contains(&vpc));
        assert!(AddressBlock::ANY.contains(&vpc));
    }

    #[test]
    fn test_overlaps() {
        assert!(block("10.1.0.0/19").overlaps(&block("10.1.5.0/24")));
        assert!(block("10.1.5.0/24").overlaps(&block("10.1.0.0/19")));
        assert!(!block("10.1.5.0/24").overlaps(&block("10.1.6.0/24")));
        assert!(!block("10.1.0.0/19").overlaps(&block("10.1.32.0/19")));
    }

    #[test]
    fn test_serde_as_string() {
        let b = block("10.1.0.0/24");
        let json = serde_json::to_string(&b).expect("serialize");
        assert_eq!(json, "\"10.1.0.0/24\"");
        let back: AddressBlock = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, b);
        assert!(serde_json::from_str::<AddressBlock>("\"nope\"").is_err());
    }
}
