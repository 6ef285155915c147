//! Sequential `/24` allocation inside a VPC block.
//!
//! The running offset is an explicit [`SubnetCursor`] value: every allocation
//! step consumes a cursor and returns the advanced one, so allocation order is
//! visible at each call site and no state outlives a planning pass.

use crate::error::TopologyError;
use crate::network::AddressBlock;

/// First two octets of every planned block.
pub const NETWORK_PREFIX: [u8; 2] = [10, 1];

/// Prefix length of a VPC block.
pub const VPC_PREFIX_LEN: u8 = 19;

/// Prefix length of a subnet block.
pub const SUBNET_PREFIX_LEN: u8 = 24;

/// Running subnet offset for one planning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetCursor {
    base_offset: u8,
    next: u8,
}

/// Returns the VPC block for a base offset, `10.1.{base_offset}.0/19`.
///
/// # Errors
///
/// Returns an error if `base_offset` is not aligned to a `/19` boundary
/// (a multiple of 32), since the block would not start at the offset.
pub fn vpc_block(base_offset: u8) -> Result<AddressBlock, TopologyError> {
    let [first, second] = NETWORK_PREFIX;
    let block = AddressBlock::from_octets([first, second, base_offset, 0], VPC_PREFIX_LEN)?;

    if block.octets()[2] == base_offset {
        Ok(block)
    } else {
        Err(TopologyError::invalid_input(format!(
            "base offset {base_offset} is not aligned to a /{VPC_PREFIX_LEN} boundary"
        )))
    }
}

impl SubnetCursor {
    /// Creates a cursor positioned at the first subnet of the VPC.
    #[must_use]
    pub const fn start(base_offset: u8) -> Self {
        Self {
            base_offset,
            next: 0,
        }
    }

    /// Returns how many subnets have been allocated so far.
    #[must_use]
    pub const fn allocated(self) -> u8 {
        self.next
    }

    /// Allocates the next `/24` and returns it with the advanced cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the block would leave `vpc` or run past the last
    /// third-octet value.
    pub fn allocate(self, vpc: &AddressBlock) -> Result<(AddressBlock, Self), TopologyError> {
        let exhausted = || {
            TopologyError::invalid_input(format!(
                "subnet #{} does not fit in VPC block {vpc}",
                u16::from(self.next) + 1
            ))
        };

        let octet = self.base_offset.checked_add(self.next).ok_or_else(exhausted)?;
        let [first, second] = NETWORK_PREFIX;
        let block = AddressBlock::from_octets([first, second, octet, 0], SUBNET_PREFIX_LEN)?;

        if !vpc.contains(&block) {
            return Err(exhausted());
        }

        let next = self.next.checked_add(1).ok_or_else(exhausted)?;
        Ok((block, Self { next, ..self }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vpc_block() {
        assert_eq!(vpc_block(64).expect("aligned").to_string(), "10.1.64.0/19");
        assert_eq!(vpc_block(0).expect("aligned").to_string(), "10.1.0.0/19");
        assert!(vpc_block(40).is_err());
    }

    #[test]
    fn test_cursor_advances_sequentially() {
        let vpc = vpc_block(32).expect("aligned");
        let cursor = SubnetCursor::start(32);

        let (first, cursor) = cursor.allocate(&vpc).expect("first");
        let (second, cursor) = cursor.allocate(&vpc).expect("second");

        assert_eq!(first.to_string(), "10.1.32.0/24");
        assert_eq!(second.to_string(), "10.1.33.0/24");
        assert_eq!(cursor.allocated(), 2);
    }

    #[test]
    fn test_cursor_is_a_value() {
        let vpc = vpc_block(0).expect("aligned");
        let cursor = SubnetCursor::start(0);

        let (a, _) = cursor.allocate(&vpc).expect("alloc");
        let (b, _) = cursor.allocate(&vpc).expect("alloc");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cursor_stops_at_vpc_boundary() {
        let vpc = vpc_block(64).expect("aligned");
        let mut cursor = SubnetCursor::start(64);
        for _ in 0..32 {
            let (block, next) = cursor.allocate(&vpc).expect("fits");
            assert!(vpc.contains(&block));
            cursor = next;
        }
        assert!(cursor.allocate(&vpc).is_err());
    }

    #[test]
    fn test_cursor_stops_at_last_octet() {
        let vpc = vpc_block(224).expect("aligned");
        let mut cursor = SubnetCursor::start(224);
        for _ in 0..32 {
            cursor = cursor.allocate(&vpc).expect("fits").1;
        }
        assert!(cursor.allocate(&vpc).is_err());
    }
}
