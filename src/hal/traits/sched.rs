//! Trait do Scheduler
//!
//! O mínimo que uma wait queue precisa: identificar a task atual, tirá-la
//! de execução e devolvê-la à run queue.

/// Identificador de task. `0` é reservado para "nenhuma".
pub type TaskId = usize;

/// Abstração do scheduler
///
/// # Contrato de `block`/`wake`
///
/// Semântica de token (park/unpark): um `wake(t)` emitido depois que `t`
/// se registrou numa fila, mas antes de `t` chamar `block`, faz o próximo
/// `block(t)` retornar imediatamente. Sem isso a wakeup seria perdida.
///
/// `block` pode retornar espuriamente; quem espera sempre re-verifica a
/// condição em loop.
pub trait SchedHal: Sync {
    /// Task em execução neste contexto
    fn current_task(&self) -> TaskId;

    /// Tira `task` (a atual) de execução até um `wake(task)`
    fn block(&self, task: TaskId);

    /// Devolve `task` à run queue
    fn wake(&self, task: TaskId);
}
