//! Endereço físico e aritmética de página usada pelo PMM

use crate::klib::{align_down, align_up, is_aligned};
use crate::mm::config::PAGE_SIZE;
use core::fmt;

/// Endereço físico (wrapper type-safe)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Arredonda para baixo até o início da página
    #[inline]
    pub fn page_floor(self) -> Self {
        Self(align_down(self.0 as usize, PAGE_SIZE) as u64)
    }

    /// Arredonda para cima até a próxima fronteira de página
    #[inline]
    pub fn page_ceil(self) -> Self {
        Self(align_up(self.0 as usize, PAGE_SIZE) as u64)
    }

    #[inline]
    pub fn is_page_aligned(self) -> bool {
        is_aligned(self.0 as usize, PAGE_SIZE)
    }

    /// `self + pages * PAGE_SIZE`
    #[inline]
    pub const fn add_pages(self, pages: u64) -> Self {
        Self(self.0 + pages * PAGE_SIZE as u64)
    }

    /// Número de páginas inteiras entre `base` e `self`.
    ///
    /// `None` se `self < base`.
    #[inline]
    pub const fn pages_since(self, base: PhysAddr) -> Option<u64> {
        if self.0 < base.0 {
            None
        } else {
            Some((self.0 - base.0) / PAGE_SIZE as u64)
        }
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_rounding() {
        let a = PhysAddr::new(0x1234);
        assert_eq!(a.page_floor(), PhysAddr::new(0x1000));
        assert_eq!(a.page_ceil(), PhysAddr::new(0x2000));
        assert!(!a.is_page_aligned());
        assert_eq!(PhysAddr::new(0x3000).page_ceil(), PhysAddr::new(0x3000));
    }

    #[test]
    fn test_pages_since() {
        let base = PhysAddr::new(0x10_0000);
        assert_eq!(base.add_pages(3).pages_since(base), Some(3));
        assert_eq!(PhysAddr::new(0x10_0fff).pages_since(base), Some(0));
        assert_eq!(PhysAddr::new(0x0f_f000).pages_since(base), None);
    }
}
