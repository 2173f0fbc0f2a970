//! # FramePool - alocador de frames particionado
//!
//! Uma free list por partição (CPU), cada uma com seu Spinlock. O caminho
//! comum (alloc/free) toca apenas a partição do CPU atual. Quando ela
//! esgota, `rebalance` trava TODAS as partições em ordem crescente e rouba
//! metade da partição mais cheia.
//!
//! ## Estruturas
//!
//! - Descritores: um `AtomicU32` de referências por frame, indexado pelo
//!   número do frame. Referências = 0 significa frame livre.
//! - Free lists: pilhas intrusivas. Um único array `next` (um `u32` por
//!   frame) encadeia os frames livres; cada partição guarda só topo e
//!   tamanho. Memória O(frames), independente do número de partições, e
//!   nenhuma alocação com lock tomado.
//!
//! ## Ordem de lock
//!
//! Apenas `rebalance` e `snapshot` seguram mais de uma partição, sempre
//! via `sync::lock_all` (crescente, liberação decrescente).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal;
use crate::mm::config::{PoolConfig, ALLOC_JUNK, FREE_JUNK, PAGE_SIZE};
use crate::mm::error::{MmError, MmResult};
use crate::mm::pmm::arena::FrameArena;
use crate::mm::pmm::frame::PhysFrame;
use crate::mm::pmm::stats::{PmmStats, PoolSnapshot};
use crate::sync::{lock_all, Spinlock};

/// Fim de lista
const NIL: u32 = u32::MAX;

/// Free list de uma partição.
///
/// Alinhada a cache line para evitar false sharing entre CPUs.
#[repr(C, align(64))]
struct Partition {
    /// Topo da pilha (`NIL` se vazia)
    head: u32,
    /// Frames na pilha
    len: usize,
}

impl Partition {
    const fn empty() -> Self {
        Self { head: NIL, len: 0 }
    }
}

/// Alocador de frames físicos particionado por CPU
pub struct FramePool {
    arena: FrameArena,
    /// Referências por frame (0 = livre)
    refs: Box<[AtomicU32]>,
    /// Próximo frame livre na mesma pilha. Só tem sentido enquanto o frame
    /// está livre, e só é tocado com o lock da partição dona.
    next: Box<[AtomicU32]>,
    partitions: Box<[Spinlock<Partition>]>,
    stats: PmmStats,
}

impl FramePool {
    /// Cria o pool e distribui os frames da arena entre as partições.
    ///
    /// Divisão o mais uniforme possível; o resto fica com a última
    /// partição. Todo frame é preenchido com `FREE_JUNK`.
    pub fn new(arena: FrameArena, config: PoolConfig) -> MmResult<Self> {
        config.validate()?;

        let total = arena.frames();
        if total == 0 || total >= NIL as usize {
            crate::kerror!("(PMM) Arena com tamanho inválido=", total);
            return Err(MmError::InitFailed);
        }

        let n = config.partitions;
        let per = total / n;

        let refs: Vec<AtomicU32> = (0..total).map(|_| AtomicU32::new(0)).collect();
        let next: Vec<AtomicU32> = (0..total).map(|_| AtomicU32::new(NIL)).collect();

        let mut partitions = Vec::with_capacity(n);
        for p in 0..n {
            let start = p * per;
            let end = if p == n - 1 { total } else { start + per };

            let mut part = Partition::empty();
            // Empilhar ao contrário: pop entrega o menor índice primeiro
            for idx in (start..end).rev() {
                // SAFETY: pool ainda não publicado, frame sem dono
                unsafe { arena.fill(idx as u32, FREE_JUNK) };
                push(&next, &mut part, idx as u32);
            }
            partitions.push(Spinlock::new(part));
        }

        crate::kinfo!("(PMM) Pool particionado. Frames=", total);
        crate::kinfo!("(PMM) Partições=", n);

        Ok(Self {
            arena,
            refs: refs.into_boxed_slice(),
            next: next.into_boxed_slice(),
            partitions: partitions.into_boxed_slice(),
            stats: PmmStats::new(total),
        })
    }

    /// Pool sobre uma arena no heap
    pub fn hosted(frames: usize, config: PoolConfig) -> MmResult<Self> {
        Self::new(FrameArena::hosted(frames)?, config)
    }

    // =========================================================================
    // ALOCAÇÃO
    // =========================================================================

    /// Aloca um frame da partição do CPU atual
    pub fn alloc(&self) -> MmResult<PhysFrame> {
        self.alloc_on(hal::cpu_id())
    }

    /// Aloca um frame da partição de `cpu`.
    ///
    /// Se a partição estiver vazia, rebalanceia. `OutOfMemory` apenas se
    /// todas as partições estiverem vazias.
    pub fn alloc_on(&self, cpu: usize) -> MmResult<PhysFrame> {
        let p = self.partition_of(cpu);

        let local = pop(&self.next, &mut self.partitions[p].lock());
        let idx = match local {
            Some(idx) => idx,
            None => self.rebalance(p)?,
        };

        Ok(self.hand_out(idx))
    }

    /// Marca o frame como em uso e preenche com `ALLOC_JUNK`
    fn hand_out(&self, idx: u32) -> PhysFrame {
        let prev = self.refs[idx as usize].swap(1, Ordering::AcqRel);
        if prev != 0 {
            crate::kerror!("(PMM) Frame da free list já em uso: idx=", idx);
            panic!("PMM: free list corrompida");
        }

        // SAFETY: frame acabou de sair da free list, só nós o vemos
        unsafe { self.arena.fill(idx, ALLOC_JUNK) };

        self.stats.inc_alloc();
        crate::ktrace!("(PMM) alloc idx=", idx);
        PhysFrame::from_start_address(self.arena.addr_of(idx))
    }

    /// Rouba frames da partição mais cheia para `requester`.
    ///
    /// Trava todas as partições em ordem crescente, re-checa o requester
    /// (outro contexto pode ter devolvido frames nesse meio tempo), move
    /// `max(doador / 2, 1)` frames e entrega um ao caller ainda dentro da
    /// seção crítica.
    fn rebalance(&self, requester: usize) -> MmResult<u32> {
        let mut all = lock_all(&self.partitions);

        if let Some(idx) = all.get_mut(requester).and_then(|part| pop(&self.next, part)) {
            return Ok(idx);
        }

        // Doador: maior free list, menor índice em caso de empate
        let mut donor = None;
        let mut donor_free = 0;
        for i in 0..self.partitions.len() {
            let free = all.get(i).map_or(0, |part| part.len);
            if i != requester && free > donor_free {
                donor = Some(i);
                donor_free = free;
            }
        }

        let Some(donor) = donor else {
            drop(all);
            self.stats.inc_failed();
            crate::kwarn!("(PMM) OOM: todas as partições vazias. cpu=", requester);
            return Err(MmError::OutOfMemory);
        };

        let moved = core::cmp::max(donor_free / 2, 1);
        // Ambos travados por lock_all e donor != requester
        let Some((to, from)) = all.pair_mut(requester, donor) else {
            unreachable!("rebalance: partições {} e {} fora do conjunto", requester, donor);
        };

        steal(&self.next, to, from, moved);
        let Some(idx) = pop(&self.next, to) else {
            unreachable!("rebalance: requester vazio após roubo");
        };
        drop(all);

        self.stats.inc_rebalance(moved);
        crate::kdebug!("(PMM) rebalance: frames roubados=", moved);

        Ok(idx)
    }

    // =========================================================================
    // LIBERAÇÃO
    // =========================================================================

    /// Devolve o frame à partição do CPU atual
    pub fn free(&self, frame: PhysFrame) {
        self.free_on(hal::cpu_id(), frame)
    }

    /// Devolve o frame à partição de `cpu` (quem libera, não quem alocou).
    ///
    /// Com referências compartilhadas, só volta à free list quando a última
    /// referência é solta.
    ///
    /// # Panics
    ///
    /// Endereço fora do pool, desalinhado ou double free.
    pub fn free_on(&self, cpu: usize, frame: PhysFrame) {
        let idx = self.index_or_die(&frame, "free");

        match self.drop_ref(idx) {
            Err(e) => {
                crate::kerror!("(PMM) Double free: addr=", frame.addr());
                panic!("PMM: {}", e);
            }
            Ok(0) => {}
            Ok(_) => {
                crate::ktrace!("(PMM) free: referência compartilhada solta idx=", idx);
                return;
            }
        }

        // SAFETY: última referência, frame sem dono até entrar na free list
        unsafe { self.arena.fill(idx, FREE_JUNK) };

        let p = self.partition_of(cpu);
        push(&self.next, &mut self.partitions[p].lock(), idx);

        self.stats.inc_free();
        crate::ktrace!("(PMM) free idx=", idx);
    }

    /// Solta uma referência ao frame `idx`; retorna quantas restam.
    ///
    /// `DoubleFree` se o frame já estava livre.
    fn drop_ref(&self, idx: u32) -> MmResult<u32> {
        self.refs[idx as usize]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| r.checked_sub(1))
            .map(|prev| prev - 1)
            .map_err(|_| MmError::DoubleFree)
    }

    // =========================================================================
    // REFERÊNCIAS (COW)
    // =========================================================================

    /// Nova referência ao mesmo frame. Cada handle é liberado uma vez.
    ///
    /// # Panics
    ///
    /// Se o frame estiver livre ou não pertencer ao pool.
    pub fn share(&self, frame: &PhysFrame) -> PhysFrame {
        let idx = self.index_or_die(frame, "share");

        let prev = self.refs[idx as usize].fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| {
            if r == 0 {
                None
            } else {
                r.checked_add(1)
            }
        });
        if prev.is_err() {
            crate::kerror!("(PMM) share de frame livre: addr=", frame.addr());
            panic!("PMM: share de frame livre");
        }

        PhysFrame::from_start_address(frame.start_address())
    }

    /// Referências atuais do frame
    pub fn ref_count(&self, frame: &PhysFrame) -> MmResult<u32> {
        let idx = self.arena.index_of(frame.start_address())?;
        Ok(self.refs[idx as usize].load(Ordering::Acquire))
    }

    // =========================================================================
    // CONTEÚDO
    // =========================================================================

    /// Conteúdo do frame.
    ///
    /// # Safety
    ///
    /// O caller precisa ter uma referência viva ao frame e ninguém pode
    /// escrever nele durante o empréstimo.
    pub unsafe fn frame_bytes(&self, frame: &PhysFrame) -> &[u8] {
        let idx = self.index_or_die(frame, "frame_bytes");
        core::slice::from_raw_parts(self.arena.frame_ptr(idx), PAGE_SIZE)
    }

    /// Conteúdo mutável do frame.
    ///
    /// # Safety
    ///
    /// O caller precisa ser o único dono do frame durante o empréstimo.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn frame_bytes_mut(&self, frame: &PhysFrame) -> &mut [u8] {
        let idx = self.index_or_die(frame, "frame_bytes_mut");
        core::slice::from_raw_parts_mut(self.arena.frame_ptr(idx), PAGE_SIZE)
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    /// Partição atendida por `cpu`
    #[inline]
    pub fn partition_of(&self, cpu: usize) -> usize {
        cpu % self.partitions.len()
    }

    pub fn partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn total_frames(&self) -> usize {
        self.arena.frames()
    }

    /// Frames livres em uma partição (leitura pontual)
    pub fn free_in(&self, partition: usize) -> usize {
        self.partitions
            .get(partition)
            .map_or(0, |p| p.lock().len)
    }

    /// Foto consistente de todas as free lists
    pub fn snapshot(&self) -> PoolSnapshot {
        let all = lock_all(&self.partitions);
        let free_per_partition = (0..self.partitions.len())
            .map(|i| all.get(i).map_or(0, |p| p.len))
            .collect();
        drop(all);

        PoolSnapshot {
            free_per_partition,
            total_frames: self.arena.frames(),
        }
    }

    pub fn stats(&self) -> &PmmStats {
        &self.stats
    }

    fn index_or_die(&self, frame: &PhysFrame, op: &'static str) -> u32 {
        match self.arena.index_of(frame.start_address()) {
            Ok(idx) => idx,
            Err(e) => {
                crate::kerror!("(PMM) Frame inválido: addr=", frame.addr());
                crate::kerror!(op);
                panic!("PMM: {} em frame inválido ({})", op, e);
            }
        }
    }
}

// =============================================================================
// PILHAS INTRUSIVAS
// =============================================================================
//
// `next` é compartilhado por todas as partições, mas cada frame livre está
// em exatamente uma pilha e só é tocado com o lock dela: Relaxed basta, o
// Spinlock dá a ordenação.

fn push(next: &[AtomicU32], part: &mut Partition, idx: u32) {
    next[idx as usize].store(part.head, Ordering::Relaxed);
    part.head = idx;
    part.len += 1;
}

fn pop(next: &[AtomicU32], part: &mut Partition) -> Option<u32> {
    if part.head == NIL {
        return None;
    }
    let idx = part.head;
    part.head = next[idx as usize].load(Ordering::Relaxed);
    part.len -= 1;
    Some(idx)
}

/// Move os `moved` frames do topo de `from` para o topo de `to`.
///
/// O(moved): percorre até o último nó do trecho e religa.
fn steal(next: &[AtomicU32], to: &mut Partition, from: &mut Partition, moved: usize) {
    debug_assert!(moved >= 1 && moved <= from.len);

    let first = from.head;
    let mut last = first;
    for _ in 1..moved {
        last = next[last as usize].load(Ordering::Relaxed);
    }

    from.head = next[last as usize].load(Ordering::Relaxed);
    from.len -= moved;

    next[last as usize].store(to.head, Ordering::Relaxed);
    to.head = first;
    to.len += moved;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::addr::PhysAddr;
    use std::collections::HashSet;

    fn pool(frames: usize, partitions: usize) -> FramePool {
        FramePool::hosted(frames, PoolConfig::new(partitions)).unwrap()
    }

    #[test]
    fn test_even_split_with_remainder_on_last() {
        let p = pool(10, 3);
        assert_eq!(p.snapshot().free_per_partition, std::vec![3, 3, 4]);
    }

    #[test]
    fn test_drain_then_rebalance_steals_half() {
        let p = pool(8, 2);
        let mut held = Vec::new();
        for _ in 0..4 {
            held.push(p.alloc_on(0).unwrap());
        }
        assert_eq!(p.free_in(0), 0);
        assert_eq!(p.free_in(1), 4);

        held.push(p.alloc_on(0).unwrap());
        // 2 roubados, 1 entregue
        assert_eq!(p.free_in(0), 1);
        assert_eq!(p.free_in(1), 2);
        assert_eq!(p.stats().rebalances.load(Ordering::Relaxed), 1);
        assert_eq!(p.stats().frames_stolen.load(Ordering::Relaxed), 2);

        let addrs: HashSet<u64> = held.iter().map(|f| f.addr()).collect();
        assert_eq!(addrs.len(), 5);
    }

    #[test]
    fn test_single_free_frame_is_stolen() {
        let p = pool(2, 2);
        let a = p.alloc_on(0).unwrap();
        let b = p.alloc_on(0).unwrap();
        assert_ne!(a, b);
        assert_eq!(p.alloc_on(1), Err(MmError::OutOfMemory));
        assert_eq!(p.stats().failed_allocs.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_free_goes_to_releasing_partition() {
        let p = pool(4, 2);
        let f = p.alloc_on(0).unwrap();
        p.free_on(1, f);
        assert_eq!(p.snapshot().free_per_partition, std::vec![1, 3]);
    }

    #[test]
    fn test_conservation() {
        let p = pool(16, 4);
        let mut held = Vec::new();
        for i in 0..11 {
            held.push(p.alloc_on(i).unwrap());
            let snap = p.snapshot();
            assert_eq!(snap.free_total() + held.len(), 16);
        }
        for (i, f) in held.drain(..).enumerate() {
            p.free_on(i * 7, f);
        }
        assert_eq!(p.snapshot().free_total(), 16);
        assert_eq!(p.stats().used(), 0);
    }

    #[test]
    fn test_junk_patterns() {
        let p = pool(2, 1);
        let f = p.alloc_on(0).unwrap();
        unsafe {
            assert!(p.frame_bytes(&f).iter().all(|&b| b == ALLOC_JUNK));
            p.frame_bytes_mut(&f)[0] = 0xAA;
        }
        let addr = f.start_address();
        p.free_on(0, f);

        let arena_ptr = p.arena.frame_ptr(p.arena.index_of(addr).unwrap());
        let bytes = unsafe { core::slice::from_raw_parts(arena_ptr, PAGE_SIZE) };
        assert!(bytes.iter().all(|&b| b == FREE_JUNK));
    }

    #[test]
    fn test_share_defers_free() {
        let p = pool(2, 1);
        let f = p.alloc_on(0).unwrap();
        let g = p.share(&f);
        assert_eq!(p.ref_count(&f), Ok(2));

        p.free_on(0, f);
        assert_eq!(p.ref_count(&g), Ok(1));
        assert_eq!(p.free_in(0), 1);

        p.free_on(0, g);
        assert_eq!(p.free_in(0), 2);
    }

    #[test]
    #[should_panic]
    fn test_double_free_panics() {
        let p = pool(2, 1);
        let f = p.alloc_on(0).unwrap();
        let forged = PhysFrame::from_start_address(f.start_address());
        p.free_on(0, f);
        p.free_on(0, forged);
    }

    #[test]
    #[should_panic]
    fn test_misaligned_free_panics() {
        let p = pool(2, 1);
        let f = p.alloc_on(0).unwrap();
        p.free_on(0, PhysFrame::from_start_address(PhysAddr::new(f.start_address().as_u64() + 16)));
    }

    #[test]
    #[should_panic]
    fn test_foreign_free_panics() {
        let p = pool(2, 1);
        p.free_on(0, PhysFrame::from_start_address(PhysAddr::new(0x1000)));
    }

    #[test]
    fn test_free_lists_take_one_link_per_frame() {
        let p = pool(1024, 64);
        assert_eq!(p.next.len(), 1024);
        assert_eq!(core::mem::size_of::<Partition>(), crate::mm::config::CACHE_LINE_SIZE);

        // Drenar tudo a partir de um CPU passa por vários roubos
        let mut held = Vec::new();
        while let Ok(f) = p.alloc_on(5) {
            held.push(f);
        }
        assert_eq!(held.len(), 1024);
        let addrs: HashSet<u64> = held.iter().map(|f| f.addr()).collect();
        assert_eq!(addrs.len(), 1024);

        for f in held {
            p.free_on(9, f);
        }
        assert_eq!(p.free_in(9), 1024);
    }

    #[test]
    fn test_steal_moves_top_of_donor() {
        let next: Vec<AtomicU32> = (0..6).map(|_| AtomicU32::new(NIL)).collect();
        let mut from = Partition::empty();
        let mut to = Partition::empty();
        for idx in (0..5).rev() {
            push(&next, &mut from, idx);
        }
        push(&next, &mut to, 5);

        steal(&next, &mut to, &mut from, 2);
        assert_eq!((to.len, from.len), (3, 3));
        assert_eq!(pop(&next, &mut to), Some(0));
        assert_eq!(pop(&next, &mut to), Some(1));
        assert_eq!(pop(&next, &mut to), Some(5));
        assert_eq!(pop(&next, &mut to), None);
        assert_eq!(pop(&next, &mut from), Some(2));
    }

    #[test]
    fn test_drop_ref_reports_double_free() {
        let p = pool(2, 1);
        let f = p.alloc_on(0).unwrap();
        let idx = p.arena.index_of(f.start_address()).unwrap();
        assert_eq!(p.drop_ref(idx), Ok(0));
        assert_eq!(p.drop_ref(idx), Err(MmError::DoubleFree));
    }

    #[test]
    fn test_invalid_config() {
        assert!(FramePool::hosted(4, PoolConfig::new(0)).is_err());
    }
}
