//! CSR window paging.
//!
//! Each peripheral with registers gets one page of the CSR region. Pages are
//! handed out in reservation order, so a peripheral that is never attached
//! leaves its page free.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ecpsoc_core::{Result, SocError};

use crate::region::AddressRegion;

/// Bytes per CSR page.
pub const CSR_PAGING: u64 = 0x800;

/// A page of the CSR window owned by one peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CsrSlot {
    pub name: String,
    pub index: u32,
    pub base: u64,
}

/// Page allocator over the CSR region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CsrWindow {
    region: String,
    base: u64,
    paging: u64,
    pages: u64,
    slots: Vec<CsrSlot>,
}

impl CsrWindow {
    /// Open a window over `region` with pages of `paging` bytes.
    pub fn new(region: &AddressRegion, paging: u64) -> Result<Self> {
        if paging == 0 || !paging.is_power_of_two() {
            return Err(SocError::configuration(format!(
                "CSR paging 0x{paging:X} is not a power of two"
            )));
        }
        Ok(Self {
            region: region.name.clone(),
            base: region.base,
            paging,
            pages: region.max_size / paging,
            slots: Vec::new(),
        })
    }

    /// Reserve the next free page for `name`.
    pub fn reserve(&mut self, name: &str) -> Result<CsrSlot> {
        self.check_room(name)?;
        let index = self.used_pages();
        let slot = CsrSlot {
            name: name.into(),
            index: u32::try_from(index).map_err(|_| {
                SocError::configuration(format!("CSR page index {index} out of range"))
            })?,
            base: self.base + index * self.paging,
        };
        debug!(csr = name, index, base = format_args!("0x{:08X}", slot.base), "csr page reserved");
        self.slots.push(slot.clone());
        Ok(slot)
    }

    /// Fail unless one more page can be reserved for `name`.
    pub fn check_room(&self, name: &str) -> Result<()> {
        if self.slot(name).is_some() {
            return Err(SocError::attach(name, "CSR page already reserved"));
        }
        let used = self.used_pages();
        if used >= self.pages {
            return Err(SocError::Overflow {
                region: self.region.clone(),
                requested: (used + 1) * self.paging,
                available: self.pages * self.paging,
            });
        }
        Ok(())
    }

    /// Fail unless all of `names` can be reserved together.
    pub fn check_room_for(&self, names: &[String]) -> Result<()> {
        for (i, name) in names.iter().enumerate() {
            if self.slot(name).is_some() || names[..i].contains(name) {
                return Err(SocError::attach(name.as_str(), "CSR page already reserved"));
            }
        }
        let extra = u64::try_from(names.len()).unwrap_or(u64::MAX);
        let needed = self.used_pages().saturating_add(extra);
        if needed > self.pages {
            return Err(SocError::Overflow {
                region: self.region.clone(),
                requested: needed.saturating_mul(self.paging),
                available: self.pages * self.paging,
            });
        }
        Ok(())
    }

    fn used_pages(&self) -> u64 {
        u64::try_from(self.slots.len()).unwrap_or(u64::MAX)
    }

    pub fn slot(&self, name: &str) -> Option<&CsrSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn slots(&self) -> &[CsrSlot] {
        &self.slots
    }

    pub fn paging(&self) -> u64 {
        self.paging
    }

    /// Bytes of the CSR region in use.
    pub fn footprint(&self) -> u64 {
        self.used_pages().saturating_mul(self.paging)
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecpsoc_core::{ErrorKind, RegionKind};

    fn csr_region(max_size: u64) -> AddressRegion {
        AddressRegion {
            name: "csr".into(),
            kind: RegionKind::Csr,
            base: 0xf000_0000,
            max_size,
            populated: false,
            size: 0,
        }
    }

    #[test]
    fn pages_are_sequential() {
        let mut window = CsrWindow::new(&csr_region(0x1_0000), CSR_PAGING).unwrap();
        let ctrl = window.reserve("ctrl").unwrap();
        let uart = window.reserve("uart").unwrap();
        assert_eq!(ctrl.base, 0xf000_0000);
        assert_eq!(uart.base, 0xf000_0800);
        assert_eq!(uart.index, 1);
        assert_eq!(window.footprint(), 0x1000);
    }

    #[test]
    fn duplicate_reservation_rejected() {
        let mut window = CsrWindow::new(&csr_region(0x1_0000), CSR_PAGING).unwrap();
        window.reserve("timer0").unwrap();
        assert_eq!(
            window.reserve("timer0").unwrap_err().kind(),
            ErrorKind::Attach
        );
    }

    #[test]
    fn full_window_overflows() {
        let mut window = CsrWindow::new(&csr_region(0x1000), CSR_PAGING).unwrap();
        window.reserve("a").unwrap();
        window.reserve("b").unwrap();
        let err = window.reserve("c").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert_eq!(window.slots().len(), 2);
    }

    #[test]
    fn batch_room_check_leaves_window_untouched() {
        let mut window = CsrWindow::new(&csr_region(0x1000), CSR_PAGING).unwrap();
        window.reserve("a").unwrap();
        let both = vec!["b".to_string(), "c".to_string()];
        assert_eq!(
            window.check_room_for(&both).unwrap_err().kind(),
            ErrorKind::Overflow
        );
        let repeated = vec!["b".to_string(), "b".to_string()];
        assert_eq!(
            window.check_room_for(&repeated).unwrap_err().kind(),
            ErrorKind::Attach
        );
        assert_eq!(window.slots().len(), 1);
        assert!(window.check_room_for(&both[..1]).is_ok());
    }

    #[test]
    fn paging_must_be_power_of_two() {
        assert!(CsrWindow::new(&csr_region(0x1000), 0x300).is_err());
    }
}
