use std::fmt::{Display, Formatter, LowerHex};

/// Represent address in running program.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct RelocatedAddress(usize);

impl RelocatedAddress {
    pub fn offset(self, offset: isize) -> RelocatedAddress {
        if offset >= 0 {
            self.0.wrapping_add(offset as usize)
        } else {
            self.0.wrapping_sub(offset.unsigned_abs())
        }
        .into()
    }

    /// Distance in bytes from `base` to this address, zero if the address is below `base`.
    pub fn distance_from(self, base: RelocatedAddress) -> usize {
        self.0.saturating_sub(base.0)
    }

    pub fn as_u64(self) -> u64 {
        u64::from(self)
    }

    pub fn as_usize(self) -> usize {
        usize::from(self)
    }

    /// Fixed-width representation, `ptr_size * 2` hex digits with `0x` prefix.
    pub fn sized(self, ptr_size: usize) -> SizedAddress {
        SizedAddress {
            addr: self,
            ptr_size,
        }
    }
}

impl From<usize> for RelocatedAddress {
    fn from(addr: usize) -> Self {
        RelocatedAddress(addr)
    }
}

impl From<u64> for RelocatedAddress {
    fn from(addr: u64) -> Self {
        RelocatedAddress(addr as usize)
    }
}

impl From<RelocatedAddress> for usize {
    fn from(addr: RelocatedAddress) -> Self {
        addr.0
    }
}

impl From<RelocatedAddress> for u64 {
    fn from(addr: RelocatedAddress) -> Self {
        addr.0 as u64
    }
}

impl Display for RelocatedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:#x}", self.0))
    }
}

impl LowerHex for RelocatedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        LowerHex::fmt(&self.0, f)
    }
}

/// Address displayed with architecture word width.
#[derive(Clone, Copy, Debug)]
pub struct SizedAddress {
    addr: RelocatedAddress,
    ptr_size: usize,
}

impl Display for SizedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let width = self.ptr_size * 2 + 2;
        f.write_fmt(format_args!("{:#0width$x}", self.addr.0))
    }
}
