use crate::mm::addr::PhysAddr;
use crate::mm::config::PAGE_SIZE;
use core::fmt;

/// Um frame de memória física (tamanho fixo PAGE_SIZE = 4KiB)
///
/// Handle opaco entregue por `FramePool::alloc`. Não é `Clone`: o dono
/// devolve exatamente uma vez via `free`. Referências extras (COW) passam
/// por `FramePool::share`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysFrame {
    start_address: PhysAddr,
}

impl PhysFrame {
    /// Cria um frame a partir de um endereço, sem validar.
    ///
    /// O pool valida alinhamento e faixa em `free`; um handle forjado
    /// aqui com endereço ruim é rejeitado lá.
    #[inline]
    pub const fn from_start_address(addr: PhysAddr) -> Self {
        Self {
            start_address: addr,
        }
    }

    /// Retorna o endereço inicial do frame
    #[inline]
    pub const fn start_address(&self) -> PhysAddr {
        self.start_address
    }

    #[inline]
    pub const fn size(&self) -> u64 {
        PAGE_SIZE as u64
    }

    /// Endereço físico como u64
    #[inline]
    pub const fn addr(&self) -> u64 {
        self.start_address.as_u64()
    }
}

impl fmt::Debug for PhysFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysFrame({:?})", self.start_address)
    }
}
