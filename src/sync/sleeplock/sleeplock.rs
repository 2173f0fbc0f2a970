//! SleepLock - bloqueio que tira a task de execução
//!
//! Estado (livre/ocupado, dono, fila de espera) fica num `Spinlock`
//! curto; quem não consegue o lock entra na fila e é bloqueado via
//! `SchedHal::block`. O unlock acorda TODOS os que esperam e cada um
//! re-tenta: wakeups espúrias e entradas repetidas são inofensivas.
//!
//! Usado pelos buffers do bcache, cujo dono pode ficar parado em I/O de
//! disco enquanto segura o lock.

use alloc::collections::VecDeque;
use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

use crate::hal::{self, TaskId};
use crate::sync::Spinlock;

/// Dono "ninguém"
const NO_HOLDER: TaskId = 0;

/// Capacidade da fila de espera na primeira disputa
const INITIAL_WAITERS: usize = 4;

struct SleepState {
    locked: bool,
    holder: TaskId,
    waiters: VecDeque<TaskId>,
}

/// SleepLock - bloqueia (dorme) se não conseguir o lock
///
/// # Diferença do Spinlock
///
/// - SleepLock PODE dormir (chama scheduler)
/// - Spinlock NÃO pode dormir (busy-wait)
/// - NUNCA adquirir um SleepLock segurando um Spinlock
pub struct SleepLock<T> {
    state: Spinlock<SleepState>,
    data: UnsafeCell<T>,
}

// SAFETY: acesso a `data` só com o lock adquirido
unsafe impl<T: Send> Send for SleepLock<T> {}
unsafe impl<T: Send> Sync for SleepLock<T> {}

impl<T> SleepLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            state: Spinlock::new(SleepState {
                locked: false,
                holder: NO_HOLDER,
                waiters: VecDeque::new(),
            }),
            data: UnsafeCell::new(data),
        }
    }

    /// Adquire o lock, dormindo enquanto outro dono o segura
    pub fn lock(&self) -> SleepLockGuard<'_, T> {
        let sched = hal::platform();
        let me = sched.current_task();

        loop {
            let mut st = self.state.lock();
            if !st.locked {
                st.locked = true;
                st.holder = me;
                break;
            }
            if !st.waiters.contains(&me) {
                if st.waiters.len() == st.waiters.capacity() {
                    // Fila cheia: crescer fora do Spinlock e re-tentar
                    let want = core::cmp::max(st.waiters.capacity() * 2, INITIAL_WAITERS);
                    drop(st);
                    self.grow_waiters(want);
                    continue;
                }
                st.waiters.push_back(me);
            }
            drop(st);

            sched.block(me);
        }

        SleepLockGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Troca a fila de espera por uma com capacidade `want`.
    ///
    /// Aloca antes de pegar o Spinlock e libera a fila antiga depois de
    /// soltá-lo. Se outro contexto já cresceu a fila, não faz nada.
    fn grow_waiters(&self, want: usize) {
        let mut fresh: VecDeque<TaskId> = VecDeque::with_capacity(want);

        let mut st = self.state.lock();
        if st.waiters.capacity() < fresh.capacity() {
            // len <= capacidade antiga < capacidade nova: extend não aloca
            fresh.extend(st.waiters.drain(..));
            core::mem::swap(&mut st.waiters, &mut fresh);
        }
        drop(st);

        drop(fresh);
    }

    /// Capacidade atual da fila de espera
    pub fn waiter_capacity(&self) -> usize {
        self.state.lock().waiters.capacity()
    }

    /// Tenta adquirir sem dormir
    pub fn try_lock(&self) -> Option<SleepLockGuard<'_, T>> {
        let me = hal::current_task();
        let mut st = self.state.lock();
        if st.locked {
            return None;
        }
        st.locked = true;
        st.holder = me;
        Some(SleepLockGuard {
            lock: self,
            _not_send: PhantomData,
        })
    }

    /// A task atual é a dona do lock?
    pub fn holding(&self) -> bool {
        let me = hal::current_task();
        let st = self.state.lock();
        st.locked && st.holder == me
    }

    /// Alguém segura o lock?
    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    fn unlock(&self) {
        let me = hal::current_task();
        let waiters = {
            let mut st = self.state.lock();
            if !st.locked || st.holder != me {
                drop(st);
                crate::kerror!("(SYNC) releasesleep sem ser dono. task=", me);
                panic!("releasesleep: lock não pertence à task atual");
            }
            st.locked = false;
            st.holder = NO_HOLDER;
            // Fila vazia no lugar (sem alocar); a antiga é liberada fora do lock
            core::mem::take(&mut st.waiters)
        };

        let sched = hal::platform();
        for &task in waiters.iter() {
            sched.wake(task);
        }
        self.recycle_waiters(waiters);
    }

    /// Devolve a capacidade de uma fila já drenada, se a atual for menor.
    ///
    /// Evita re-crescer a fila a cada rodada de disputa.
    fn recycle_waiters(&self, mut spare: VecDeque<TaskId>) {
        spare.clear();
        let mut st = self.state.lock();
        if st.waiters.capacity() < spare.capacity() {
            // len <= capacidade atual < capacidade de `spare`
            spare.extend(st.waiters.drain(..));
            core::mem::swap(&mut st.waiters, &mut spare);
        }
        drop(st);
    }
}

/// Guard do SleepLock
///
/// Não é `Send`: o dono é a task que adquiriu.
pub struct SleepLockGuard<'a, T> {
    lock: &'a SleepLock<T>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, T> SleepLockGuard<'a, T> {
    /// Lock de origem
    pub fn lock_ref(&self) -> &'a SleepLock<T> {
        self.lock
    }
}

impl<T> Deref for SleepLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SleepLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SleepLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::hal::host;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_holding() {
        host::install_host();
        let lock = SleepLock::new(0u8);
        assert!(!lock.holding());
        let g = lock.lock();
        assert!(lock.holding());
        assert!(lock.try_lock().is_none());
        drop(g);
        assert!(!lock.holding());
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_not_holding_from_other_task() {
        host::install_host();
        let lock = SleepLock::new(());
        let _g = lock.lock();
        std::thread::scope(|s| {
            s.spawn(|| assert!(!lock.holding()));
        });
    }

    #[test]
    fn test_wait_list_grows_and_keeps_waiters() {
        host::install_host();
        let lock = SleepLock::new(());
        assert_eq!(lock.waiter_capacity(), 0);

        lock.grow_waiters(8);
        assert!(lock.waiter_capacity() >= 8);

        {
            let mut st = lock.state.lock();
            st.waiters.push_back(7);
            st.waiters.push_back(9);
        }
        // Pedido menor que a capacidade atual: nada muda
        lock.grow_waiters(4);
        assert!(lock.waiter_capacity() >= 8);
        let st = lock.state.lock();
        assert_eq!(st.waiters.iter().copied().collect::<std::vec::Vec<_>>(), std::vec![7, 9]);
    }

    #[test]
    fn test_contended_wait_list_stays_bounded() {
        host::install_host();
        let lock = SleepLock::new(0usize);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        let mut g = lock.lock();
                        *g += 1;
                    }
                });
            }
        });

        assert_eq!(*lock.lock(), 800);
        // No máximo 7 tasks esperando ao mesmo tempo: 4 → 8, reaproveitada
        assert!(lock.waiter_capacity() <= 16);
    }

    #[test]
    fn test_waiters_are_woken() {
        host::install_host();
        let lock = SleepLock::new(0usize);
        let inside = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let mut g = lock.lock();
                        // Exclusão mútua: ninguém mais dentro
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        *g += 1;
                        std::thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(*lock.lock(), 800);
    }
}
