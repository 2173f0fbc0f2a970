//! Hardware Abstraction Layer (HAL)
//!
//! Seams entre os pools e o resto do kernel. Os pools precisam saber
//! três coisas que não são responsabilidade deles:
//!
//! - Em qual CPU o contexto atual roda (escolha da partição do PMM)
//! - Como desabilitar/restaurar interrupções (Spinlock)
//! - Como bloquear e acordar uma task (SleepLock dos buffers)
//!
//! O kernel registra sua implementação uma única vez com [`install`].
//! Antes disso vale a [`NullPlatform`]: CPU 0, interrupções no-op e
//! bloqueio degradado para spin.

pub mod traits;

#[cfg(feature = "std")]
pub mod host;

pub use traits::*;

use spin::Once;

static PLATFORM: Once<&'static dyn Platform> = Once::new();

/// Plataforma usada antes de qualquer `install`
pub static NULL_PLATFORM: NullPlatform = NullPlatform;

/// Registra a plataforma do kernel.
///
/// Retorna `false` se outra plataforma já estava registrada (a primeira vence).
pub fn install(platform: &'static dyn Platform) -> bool {
    let mut installed = false;
    PLATFORM.call_once(|| {
        installed = true;
        platform
    });
    if installed {
        crate::kinfo!("(HAL) Plataforma registrada");
    }
    installed
}

/// Plataforma ativa
#[inline]
pub fn platform() -> &'static dyn Platform {
    match PLATFORM.get() {
        Some(p) => *p,
        None => &NULL_PLATFORM,
    }
}

/// Atalho: ID da CPU atual
#[inline]
pub fn cpu_id() -> usize {
    platform().id()
}

/// Atalho: task atual
#[inline]
pub fn current_task() -> TaskId {
    platform().current_task()
}

/// Plataforma nula (early boot / single core sem scheduler)
pub struct NullPlatform;

impl CpuHal for NullPlatform {
    fn id(&self) -> usize {
        0
    }

    fn interrupts_enabled(&self) -> bool {
        false
    }

    fn enable_interrupts(&self) {}

    fn disable_interrupts(&self) {}
}

impl SchedHal for NullPlatform {
    fn current_task(&self) -> TaskId {
        0
    }

    fn block(&self, _task: TaskId) {
        // Sem scheduler: quem espera apenas gira
        core::hint::spin_loop();
    }

    fn wake(&self, _task: TaskId) {}
}
