//! # Configuração dos Pools
//!
//! Constantes de tamanho, padrões de preenchimento e a configuração de
//! particionamento do PMM e do buffer cache. Tudo fixo após a construção
//! do pool.

use crate::mm::error::{MmError, MmResult};

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Máscara para alinhar endereços a página
pub const PAGE_MASK: usize = !(PAGE_SIZE - 1);

/// Tamanho de linha de cache (para evitar false sharing entre partições)
pub const CACHE_LINE_SIZE: usize = 64;

// =============================================================================
// CONFIGURAÇÃO SMP
// =============================================================================

/// Número máximo de CPUs suportadas
pub const MAX_CPUS: usize = 64;

/// Partições padrão do PMM (uma por CPU)
pub const NCPU: usize = 8;

// =============================================================================
// PADRÕES DE PREENCHIMENTO (JUNK)
// =============================================================================

/// Escrito em todo frame devolvido (pega uso após free)
pub const FREE_JUNK: u8 = 0x01;

/// Escrito em todo frame entregue (pega leitura não inicializada)
pub const ALLOC_JUNK: u8 = 0x05;

// =============================================================================
// BUFFER CACHE
// =============================================================================

/// Tamanho de um bloco de disco
pub const BSIZE: usize = 1024;

/// Total de buffers do cache
pub const NBUF: usize = 30;

/// Quantidade de buckets (primo)
pub const NBUCKET: usize = 13;

/// Slots por bucket
pub const BUCKET_SLOTS: usize = NBUF / NBUCKET + 1;

/// Multiplicador do dispositivo no hash de bloco
pub const DEV_PRIME: u64 = 100003;

// =============================================================================
// CONFIGURAÇÃO EM RUNTIME
// =============================================================================

/// Particionamento do PMM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Número de partições (free lists independentes)
    pub partitions: usize,
}

impl PoolConfig {
    pub const fn new(partitions: usize) -> Self {
        Self { partitions }
    }

    pub fn validate(&self) -> MmResult<()> {
        if self.partitions == 0 || self.partitions > MAX_CPUS {
            crate::kerror!("(PMM) Partições inválidas=", self.partitions);
            return Err(MmError::InvalidParameter);
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(NCPU)
    }
}

/// Geometria do buffer cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Número de buckets de hash
    pub buckets: usize,
    /// Slots fixos por bucket
    pub slots_per_bucket: usize,
}

impl CacheConfig {
    pub const fn new(buckets: usize, slots_per_bucket: usize) -> Self {
        Self {
            buckets,
            slots_per_bucket,
        }
    }

    /// Total de slots do cache
    pub const fn total_slots(&self) -> usize {
        self.buckets * self.slots_per_bucket
    }

    pub fn validate(&self) -> MmResult<()> {
        if self.buckets == 0 {
            crate::kerror!("(BCACHE) Buckets inválidos=", self.buckets);
            return Err(MmError::InvalidParameter);
        }
        if self.slots_per_bucket == 0 || self.slots_per_bucket > u16::MAX as usize {
            crate::kerror!("(BCACHE) Slots por bucket inválidos=", self.slots_per_bucket);
            return Err(MmError::InvalidParameter);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(NBUCKET, BUCKET_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PoolConfig::default().partitions, NCPU);
        let c = CacheConfig::default();
        assert_eq!(c.buckets, 13);
        assert_eq!(c.slots_per_bucket, 3);
        assert!(c.total_slots() >= NBUF);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert_eq!(PoolConfig::new(0).validate(), Err(MmError::InvalidParameter));
        assert_eq!(
            PoolConfig::new(MAX_CPUS + 1).validate(),
            Err(MmError::InvalidParameter)
        );
        assert_eq!(CacheConfig::new(0, 2).validate(), Err(MmError::InvalidParameter));
        assert_eq!(CacheConfig::new(2, 0).validate(), Err(MmError::InvalidParameter));
    }
}
