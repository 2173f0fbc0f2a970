//! Trait de CPU

/// Abstração de CPU
pub trait CpuHal: Sync {
    /// Retorna ID da CPU atual
    fn id(&self) -> usize;

    /// Verifica se as interrupções estão habilitadas
    fn interrupts_enabled(&self) -> bool;

    /// Habilita interrupções
    fn enable_interrupts(&self);

    /// Desabilita interrupções
    fn disable_interrupts(&self);
}
