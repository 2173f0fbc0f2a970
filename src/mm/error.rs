//! Tipos de Erro dos Pools
//!
//! Erros recuperáveis reportados ao caller. Violações de contrato (double
//! free, endereço estrangeiro, release sem lock) não passam por aqui: são
//! `panic!` imediato.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Sem frame livre em nenhuma partição (OOM)
    OutOfMemory,
    /// Endereço fora da região gerenciada
    InvalidAddress,
    /// Endereço não alinhado a página
    NotAligned,
    /// Double free detectado
    DoubleFree,
    /// Parâmetro inválido
    InvalidParameter,
    /// Falha na inicialização
    InitFailed,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: sem frames físicos disponíveis",
            Self::InvalidAddress => "Endereço inválido",
            Self::NotAligned => "Endereço não alinhado a página",
            Self::DoubleFree => "Double free detectado",
            Self::InvalidParameter => "Parâmetro inválido",
            Self::InitFailed => "Falha na inicialização",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
