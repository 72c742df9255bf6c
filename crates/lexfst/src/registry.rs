// Bounded hash-consing cache for frozen builder states.
//
// The table is `table_size` buckets of `mru_size` cells laid out flat. Each
// bucket is a small most-recently-used list: hits move to the front, misses
// overwrite the last cell and move it to the front.

use std::hash::Hasher;

use crate::state::BuilderState;
use crate::transition::StateAddress;
use crate::{FstError, Result};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
///
/// Each registry owns one instance and resets it before hashing a state.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl FnvHasher {
    pub fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = FNV_OFFSET_BASIS;
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

/// One registry slot: a frozen state and the address it was compiled to.
#[derive(Debug, Clone, Default)]
pub struct RegistryCell {
    state: BuilderState,
    addr: Option<StateAddress>,
}

impl RegistryCell {
    /// Store a freshly compiled state in this cell.
    pub fn insert(&mut self, state: BuilderState, addr: StateAddress) {
        self.state = state;
        self.addr = Some(addr);
    }

    #[inline]
    fn matches(&self, candidate: &BuilderState) -> Option<StateAddress> {
        self.addr.filter(|_| self.state.equiv(candidate))
    }

    fn clear(&mut self) {
        self.state.clear();
        self.addr = None;
    }
}

/// Outcome of a registry lookup.
#[derive(Debug)]
pub enum RegistryEntry<'a> {
    /// An equivalent state was already compiled at this address.
    Found(StateAddress),
    /// No equivalent state is cached. The returned (emptied, front-most) cell
    /// should receive the candidate once it has been compiled.
    NotFound(&'a mut RegistryCell),
    /// The registry has no capacity; every state must be compiled.
    Rejected,
}

/// Fixed-capacity minimization cache.
///
/// A miss never means that no equivalent state exists, only that none is
/// cached; the automaton stays correct, it just loses some sharing.
#[derive(Debug)]
pub struct Registry {
    table: Vec<RegistryCell>,
    table_size: usize,
    mru_size: usize,
    hasher: FnvHasher,
}

impl Registry {
    /// Allocate `table_size * mru_size` empty cells.
    ///
    /// Fails with `InvalidInput` if the table cannot be allocated.
    pub fn new(table_size: usize, mru_size: usize) -> Result<Self> {
        let too_large = || {
            FstError::InvalidInput(format!(
                "registry of {table_size} x {mru_size} cells cannot be allocated"
            ))
        };
        let capacity = table_size.checked_mul(mru_size).ok_or_else(too_large)?;
        let mut table = Vec::new();
        table
            .try_reserve_exact(capacity)
            .map_err(|_| too_large())?;
        table.resize_with(capacity, RegistryCell::default);
        tracing::trace!(table_size, mru_size, capacity, "registry allocated");
        Ok(Self {
            table,
            table_size,
            mru_size,
            hasher: FnvHasher::new(),
        })
    }

    /// Total number of cells.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }

    /// Look up `candidate`, updating the MRU order of its bucket.
    pub fn entry(&mut self, candidate: &BuilderState) -> RegistryEntry<'_> {
        if self.table.is_empty() {
            return RegistryEntry::Rejected;
        }
        let bucket = (self.hash(candidate) % self.table_size as u64) as usize;
        let start = bucket * self.mru_size;
        let cells = &mut self.table[start..start + self.mru_size];

        if cells.len() == 1 {
            let cell = &mut cells[0];
            if let Some(addr) = cell.matches(candidate) {
                return RegistryEntry::Found(addr);
            }
            cell.clear();
            return RegistryEntry::NotFound(cell);
        }

        if let Some((i, addr)) = cells
            .iter()
            .enumerate()
            .find_map(|(i, cell)| cell.matches(candidate).map(|addr| (i, addr)))
        {
            cells[..=i].rotate_right(1);
            return RegistryEntry::Found(addr);
        }

        // Evict the least recently used cell and promote it to the front.
        cells.rotate_right(1);
        let cell = &mut cells[0];
        cell.clear();
        RegistryEntry::NotFound(cell)
    }

    /// Hash the structural identity of a state: finality, final output and
    /// every transition's label, output and destination, in order.
    fn hash(&mut self, state: &BuilderState) -> u64 {
        let h = &mut self.hasher;
        h.reset();
        h.write(&u64::from(state.is_final).to_le_bytes());
        h.write(&state.final_output.to_le_bytes());
        for t in &state.transitions {
            h.write(&[t.label]);
            h.write(&t.output.to_le_bytes());
            h.write(&t.dest.to_le_bytes());
        }
        h.finish()
    }
}
