//! # Funções de Alinhamento de Memória
//!
//! Usadas pelo PMM para arredondar a região gerenciável para dentro e
//! validar endereços devolvidos em `free`.

/// Alinha um valor para cima ao próximo múltiplo de `align`.
///
/// `align` precisa ser potência de dois.
#[inline(always)]
pub const fn align_up(val: usize, align: usize) -> usize {
    (val + align - 1) & !(align - 1)
}

/// Alinha um valor para baixo ao múltiplo anterior de `align`.
#[inline(always)]
pub const fn align_down(val: usize, align: usize) -> usize {
    val & !(align - 1)
}

/// Verifica se um valor está alinhado a `align`.
#[inline(always)]
pub const fn is_aligned(val: usize, align: usize) -> bool {
    val & (align - 1) == 0
}
