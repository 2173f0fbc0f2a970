//! Aquisição ordenada de múltiplos Spinlocks
//!
//! Única forma permitida de segurar mais de um lock do mesmo array ao
//! mesmo tempo. Os índices precisam vir estritamente crescentes: a ordem
//! global (índice ascendente) é o que impede espera circular entre dois
//! contextos que tentam pegar o mesmo conjunto. A liberação acontece na
//! ordem inversa (descendente).

use alloc::vec::Vec;

use super::{Spinlock, SpinlockGuard};

/// Conjunto de guards adquiridos em ordem crescente de índice
pub struct OrderedGuards<'a, T> {
    /// (índice, guard), crescente por índice
    guards: Vec<(usize, SpinlockGuard<'a, T>)>,
}

/// Adquire `locks[i]` para cada `i` de `indices`, em ordem crescente.
///
/// # Panics
///
/// Se `indices` não for estritamente crescente ou tiver índice fora de
/// `locks`. Ordem errada aqui é bug de quem chama, não condição de runtime.
pub fn lock_ordered<'a, T>(locks: &'a [Spinlock<T>], indices: &[usize]) -> OrderedGuards<'a, T> {
    let mut prev: Option<usize> = None;
    for &idx in indices {
        if idx >= locks.len() || prev.map_or(false, |p| p >= idx) {
            crate::kerror!("(SYNC) lock_ordered: índice fora de ordem=", idx);
            panic!("lock_ordered: índices devem ser crescentes e válidos");
        }
        prev = Some(idx);
    }

    // Reservar antes de pegar o primeiro lock: nada de alocação com lock tomado
    let mut guards = Vec::with_capacity(indices.len());
    for &idx in indices {
        guards.push((idx, locks[idx].lock()));
    }

    OrderedGuards { guards }
}

/// Atalho: todos os locks do array, `0..len`
pub fn lock_all<T>(locks: &[Spinlock<T>]) -> OrderedGuards<'_, T> {
    let indices: Vec<usize> = (0..locks.len()).collect();
    lock_ordered(locks, &indices)
}

impl<'a, T> OrderedGuards<'a, T> {
    /// Dados do lock de índice `idx` (precisa estar no conjunto)
    pub fn get(&self, idx: usize) -> Option<&T> {
        let pos = self.position(idx)?;
        Some(&*self.guards[pos].1)
    }

    /// Dados mutáveis do lock de índice `idx`
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        let pos = self.position(idx)?;
        Some(&mut *self.guards[pos].1)
    }

    /// Dois locks distintos do conjunto, mutáveis ao mesmo tempo
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut T, &mut T)> {
        if a == b {
            return None;
        }
        let pa = self.position(a)?;
        let pb = self.position(b)?;

        if pa < pb {
            let (lo, hi) = self.guards.split_at_mut(pb);
            Some((&mut *lo[pa].1, &mut *hi[0].1))
        } else {
            let (lo, hi) = self.guards.split_at_mut(pa);
            Some((&mut *hi[0].1, &mut *lo[pb].1))
        }
    }

    /// Índices travados, em ordem crescente
    pub fn indices(&self) -> Vec<usize> {
        self.guards.iter().map(|(idx, _)| *idx).collect()
    }

    /// Quantidade de locks seguros
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    fn position(&self, idx: usize) -> Option<usize> {
        self.guards.binary_search_by_key(&idx, |(i, _)| *i).ok()
    }
}

impl<T> Drop for OrderedGuards<'_, T> {
    fn drop(&mut self) {
        // Liberar em ordem DESCENDENTE
        while let Some((_, guard)) = self.guards.pop() {
            drop(guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_lock_all_and_access() {
        let locks = [Spinlock::new(1), Spinlock::new(2), Spinlock::new(3)];
        {
            let mut set = lock_all(&locks);
            assert_eq!(set.len(), 3);
            *set.get_mut(1).unwrap() += 10;
            let (a, c) = set.pair_mut(2, 0).unwrap();
            core::mem::swap(a, c);
            assert!(locks.iter().all(|l| l.is_locked()));
        }
        assert!(locks.iter().all(|l| !l.is_locked()));
        assert_eq!(*locks[0].lock(), 3);
        assert_eq!(*locks[1].lock(), 12);
        assert_eq!(*locks[2].lock(), 1);
    }

    #[test]
    fn test_subset() {
        let locks = [Spinlock::new(0), Spinlock::new(0), Spinlock::new(0)];
        let set = lock_ordered(&locks, &[0, 2]);
        assert!(set.get(1).is_none());
        assert!(!locks[1].is_locked());
        assert_eq!(set.indices(), vec![0, 2]);
        assert_eq!(set.get(2), Some(&0));
    }

    #[test]
    #[should_panic]
    fn test_rejects_descending_indices() {
        let locks = [Spinlock::new(0), Spinlock::new(0)];
        let _set = lock_ordered(&locks, &[1, 0]);
    }

    #[test]
    #[should_panic]
    fn test_rejects_duplicates() {
        let locks = [Spinlock::new(0), Spinlock::new(0)];
        let _set = lock_ordered(&locks, &[1, 1]);
    }

    #[test]
    fn test_concurrent_lock_all_does_not_deadlock() {
        let locks: Vec<Spinlock<usize>> = (0..4).map(|_| Spinlock::new(0)).collect();
        std::thread::scope(|s| {
            for t in 0..4 {
                let locks = &locks;
                s.spawn(move || {
                    for _ in 0..500 {
                        let mut set = lock_all(locks);
                        *set.get_mut(t).unwrap() += 1;
                    }
                });
            }
        });
        for l in &locks {
            assert_eq!(*l.lock(), 500);
        }
    }
}
