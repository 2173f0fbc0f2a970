//! HAL hospedado
//!
//! Implementa `CpuHal` e `SchedHal` sobre threads do host, para rodar os
//! pools fora do kernel (testes, simulação):
//!
//! - CPU: cada thread escolhe a sua com [`HostPlatform::bind_cpu`] (padrão 0)
//! - Interrupções: flag por thread, apenas para o Spinlock salvar/restaurar
//! - Tasks: cada thread recebe um `TaskId` na primeira consulta; `block` e
//!   `wake` viram `thread::park` / `Thread::unpark`, que já têm a semântica
//!   de token exigida pelo contrato de `SchedHal`.

use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, Thread};
use std::vec::Vec;

use super::{CpuHal, SchedHal, TaskId};

std::thread_local! {
    static CPU: Cell<usize> = const { Cell::new(0) };
    static IRQ_ENABLED: Cell<bool> = const { Cell::new(true) };
    static TASK: Cell<TaskId> = const { Cell::new(0) };
}

/// Próximo TaskId livre (0 é reservado)
static NEXT_TASK: AtomicUsize = AtomicUsize::new(1);

/// `THREADS[id]` = handle da thread dona do TaskId `id`
static THREADS: Mutex<Vec<Option<Thread>>> = Mutex::new(Vec::new());

/// Plataforma hospedada.
///
/// Sem estado próprio: TaskIds e handles de thread são globais ao processo,
/// então qualquer instância enxerga as mesmas tasks.
pub struct HostPlatform;

/// Instância global usada pelos testes
pub static HOST: HostPlatform = HostPlatform;

/// Registra [`HOST`] como plataforma (idempotente)
pub fn install_host() -> &'static HostPlatform {
    super::install(&HOST);
    &HOST
}

impl HostPlatform {
    /// Fixa a thread atual numa CPU lógica
    pub fn bind_cpu(&self, cpu: usize) {
        CPU.with(|c| c.set(cpu));
    }

    fn register_current(&self) -> TaskId {
        let id = NEXT_TASK.fetch_add(1, Ordering::Relaxed);
        let mut threads = THREADS.lock().unwrap_or_else(|e| e.into_inner());
        if threads.len() <= id {
            threads.resize(id + 1, None);
        }
        threads[id] = Some(thread::current());
        id
    }
}

impl CpuHal for HostPlatform {
    fn id(&self) -> usize {
        CPU.with(|c| c.get())
    }

    fn interrupts_enabled(&self) -> bool {
        IRQ_ENABLED.with(|f| f.get())
    }

    fn enable_interrupts(&self) {
        IRQ_ENABLED.with(|f| f.set(true));
    }

    fn disable_interrupts(&self) {
        IRQ_ENABLED.with(|f| f.set(false));
    }
}

impl SchedHal for HostPlatform {
    fn current_task(&self) -> TaskId {
        let id = TASK.with(|t| t.get());
        if id != 0 {
            return id;
        }
        let id = self.register_current();
        TASK.with(|t| t.set(id));
        id
    }

    fn block(&self, task: TaskId) {
        debug_assert_eq!(task, self.current_task());
        thread::park();
    }

    fn wake(&self, task: TaskId) {
        let threads = THREADS.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(Some(t)) = threads.get(task) {
            t.unpark();
        }
    }
}
