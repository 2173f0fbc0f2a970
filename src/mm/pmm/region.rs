use crate::mm::addr::PhysAddr;

/// Tipos de região de memória (baseado no UEFI/Multiboot)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegionType {
    Usable,
    Reserved,
    Kernel,
    Bootloader,
}

/// Uma região contígua de memória física `[start, end)`
#[derive(Debug, Clone, Copy)]
pub struct MemoryRegion {
    pub start: PhysAddr,
    pub end: PhysAddr,
    pub kind: MemoryRegionType,
}

impl MemoryRegion {
    pub const fn usable(start: u64, end: u64) -> Self {
        Self {
            start: PhysAddr::new(start),
            end: PhysAddr::new(end),
            kind: MemoryRegionType::Usable,
        }
    }

    /// Sub-região de páginas inteiras: início arredondado para cima, fim
    /// para baixo. Vazia se não couber nenhuma página.
    pub fn page_aligned(&self) -> Self {
        let start = self.start.page_ceil();
        let end = self.end.page_floor();
        Self {
            start,
            end: if end < start { start } else { end },
            kind: self.kind,
        }
    }

    /// Número de frames inteiros nessa região
    pub fn frame_count(&self) -> usize {
        let r = self.page_aligned();
        r.end.pages_since(r.start).unwrap_or(0) as usize
    }
}
