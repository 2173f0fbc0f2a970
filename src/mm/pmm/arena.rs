//! Arena de frames
//!
//! Faixa contígua de frames que o pool gerencia. Endereço físico do frame
//! `i` = `phys_base + i * PAGE_SIZE`; o conteúdo é acessado pelo mapeamento
//! direto em `virt_base + i * PAGE_SIZE`.

use alloc::alloc::{alloc, dealloc, Layout};
use core::ptr::NonNull;

use crate::mm::addr::PhysAddr;
use crate::mm::config::PAGE_SIZE;
use crate::mm::error::{MmError, MmResult};
use crate::mm::pmm::region::{MemoryRegion, MemoryRegionType};

/// Região de frames com mapeamento direto
pub struct FrameArena {
    phys_base: PhysAddr,
    virt_base: NonNull<u8>,
    frames: usize,
    /// Arena no heap: dona da memória, devolvida no Drop
    owned: Option<Layout>,
}

// SAFETY: a arena só entrega ponteiros para frames; a posse de cada frame
// é controlada pelo FramePool.
unsafe impl Send for FrameArena {}
unsafe impl Sync for FrameArena {}

impl FrameArena {
    /// Arena sobre uma região do memory map, já mapeada em
    /// `phys + direct_map_offset`.
    ///
    /// A região é arredondada para dentro (páginas inteiras).
    ///
    /// # Safety
    ///
    /// A faixa inteira precisa estar mapeada e não pode ser usada por mais
    /// ninguém enquanto a arena existir.
    pub unsafe fn from_region(region: MemoryRegion, direct_map_offset: u64) -> MmResult<Self> {
        if region.kind != MemoryRegionType::Usable {
            crate::kerror!("(PMM) Região não utilizável em ", region.start.as_u64());
            return Err(MmError::InvalidParameter);
        }

        let r = region.page_aligned();
        let frames = region.frame_count();
        if frames == 0 {
            crate::kerror!("(PMM) Região sem páginas inteiras em ", region.start.as_u64());
            return Err(MmError::InitFailed);
        }

        let virt = (r.start.as_u64() + direct_map_offset) as *mut u8;
        let virt_base = NonNull::new(virt).ok_or(MmError::InvalidAddress)?;

        Ok(Self {
            phys_base: r.start,
            virt_base,
            frames,
            owned: None,
        })
    }

    /// Arena no heap do kernel (ou do host, em testes e simulação).
    ///
    /// O endereço "físico" é o próprio endereço da alocação.
    pub fn hosted(frames: usize) -> MmResult<Self> {
        if frames == 0 || frames > u32::MAX as usize {
            return Err(MmError::InvalidParameter);
        }
        let size = frames.checked_mul(PAGE_SIZE).ok_or(MmError::InvalidParameter)?;
        let layout = Layout::from_size_align(size, PAGE_SIZE)
            .map_err(|_| MmError::InvalidParameter)?;

        // SAFETY: layout com tamanho > 0
        let ptr = unsafe { alloc(layout) };
        let virt_base = NonNull::new(ptr).ok_or(MmError::OutOfMemory)?;

        Ok(Self {
            phys_base: PhysAddr::new(ptr as u64),
            virt_base,
            frames,
            owned: Some(layout),
        })
    }

    /// Quantidade de frames
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Primeiro endereço físico
    #[inline]
    pub fn phys_base(&self) -> PhysAddr {
        self.phys_base
    }

    /// Fim exclusivo da faixa
    #[inline]
    pub fn phys_end(&self) -> PhysAddr {
        self.phys_base.add_pages(self.frames as u64)
    }

    /// Endereço físico do frame `idx`
    #[inline]
    pub fn addr_of(&self, idx: u32) -> PhysAddr {
        self.phys_base.add_pages(idx as u64)
    }

    /// Índice do frame que começa em `addr`.
    ///
    /// Erro se fora da faixa ou desalinhado.
    pub fn index_of(&self, addr: PhysAddr) -> MmResult<u32> {
        if addr >= self.phys_end() {
            return Err(MmError::InvalidAddress);
        }
        let idx = addr.pages_since(self.phys_base).ok_or(MmError::InvalidAddress)?;
        if !addr.is_page_aligned() {
            return Err(MmError::NotAligned);
        }
        Ok(idx as u32)
    }

    /// Ponteiro para o conteúdo do frame `idx`
    #[inline]
    pub fn frame_ptr(&self, idx: u32) -> *mut u8 {
        debug_assert!((idx as usize) < self.frames);
        // SAFETY: idx < frames, dentro da alocação/mapeamento
        unsafe { self.virt_base.as_ptr().add(idx as usize * PAGE_SIZE) }
    }

    /// Preenche o frame `idx` com `byte`
    ///
    /// # Safety
    ///
    /// Ninguém mais pode estar acessando o frame.
    #[inline]
    pub unsafe fn fill(&self, idx: u32, byte: u8) {
        core::ptr::write_bytes(self.frame_ptr(idx), byte, PAGE_SIZE);
    }
}

impl Drop for FrameArena {
    fn drop(&mut self) {
        if let Some(layout) = self.owned.take() {
            // SAFETY: alocado em `hosted` com este layout
            unsafe { dealloc(self.virt_base.as_ptr(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_addresses() {
        let arena = FrameArena::hosted(4).unwrap();
        assert!(arena.phys_base().is_page_aligned());
        let a2 = arena.addr_of(2);
        assert_eq!(arena.index_of(a2), Ok(2));
        assert_eq!(arena.index_of(PhysAddr::new(a2.as_u64() + 8)), Err(MmError::NotAligned));
        assert_eq!(arena.index_of(arena.phys_end()), Err(MmError::InvalidAddress));
    }

    #[test]
    fn test_from_region_rounds_inward() {
        let mut backing = std::vec![0u8; 4 * PAGE_SIZE];
        let base = backing.as_mut_ptr() as u64;
        // "físico" = 0x10_0800, direct map aponta para o buffer
        let phys = 0x10_0800u64;
        let offset = base.wrapping_sub(0x10_1000);
        let region = MemoryRegion::usable(phys, phys + 3 * PAGE_SIZE as u64);
        let arena = unsafe { FrameArena::from_region(region, offset) }.unwrap();
        assert_eq!(arena.frames(), 2);
        assert_eq!(arena.phys_base().as_u64(), 0x10_1000);
        assert_eq!(arena.frame_ptr(0) as u64, base);
    }

    #[test]
    fn test_from_region_rejects_reserved() {
        let region = MemoryRegion {
            kind: MemoryRegionType::Reserved,
            ..MemoryRegion::usable(0x1000, 0x3000)
        };
        assert!(unsafe { FrameArena::from_region(region, 0) }.is_err());
    }
}
