// Incremental construction of a minimal FST from keys in sorted order.
//
// The builder keeps the path of the most recently inserted key as a stack of
// unfinished states (index = depth). When the next key arrives, every state
// below the common prefix can no longer change: those are frozen deepest
// first, deduplicated through the registry, and written to the encoder. The
// edge into each unfinished state is kept as a pending transition until its
// destination has an address.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::BuilderConfig;
use crate::format::Footer;
use crate::node::Encoder;
use crate::registry::{Registry, RegistryEntry};
use crate::state::BuilderState;
use crate::transition::{StateAddress, Transition, max_output};
use crate::{FstError, Result};

/// Edge into an unfinished state; its destination is not known yet.
#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    label: u8,
    output: u64,
}

#[derive(Debug, Default)]
struct UnfinishedState {
    state: BuilderState,
    last: Option<PendingTransition>,
}

impl UnfinishedState {
    fn with_pending(label: u8, output: u64) -> Self {
        Self {
            state: BuilderState::new(),
            last: Some(PendingTransition { label, output }),
        }
    }

    fn final_leaf() -> Self {
        let mut state = BuilderState::new();
        state.set_final(0);
        Self { state, last: None }
    }

    /// Turn the pending transition into a real one pointing at `addr`.
    fn freeze_last(&mut self, addr: StateAddress) {
        if let Some(p) = self.last.take() {
            self.state.add_transition(Transition {
                label: p.label,
                output: p.output,
                dest: addr,
            });
        }
    }

    fn add_output_prefix(&mut self, prefix: u64) {
        self.state.add_output_prefix(prefix);
        if let Some(p) = self.last.as_mut() {
            p.output += prefix;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Open,
    Closed,
    Failed,
}

/// Counters describing a build, available at any point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Keys inserted.
    pub keys: u64,
    /// Node records written to the output.
    pub nodes_written: u64,
    /// Frozen states that were replaced by an equivalent, already written node.
    pub registry_hits: u64,
    /// Bytes written, including the footer once closed.
    pub bytes_written: u64,
}

/// Builds an FST by streaming node records to `W`.
///
/// Keys must be inserted in strictly increasing byte order. Nothing is
/// buffered beyond the current key's path and the registry, so memory use is
/// bounded by the longest key and the registry size, not by the key count.
///
/// A builder is single-use: after [`close`](Builder::close), or after any
/// write error, further inserts fail with [`FstError::BuilderClosed`].
pub struct Builder<W: Write> {
    encoder: Encoder<W>,
    registry: Registry,
    unfinished: Vec<UnfinishedState>,
    last_key: Option<Vec<u8>>,
    len: u64,
    output_width: u8,
    max_output: u64,
    registry_hits: u64,
    status: Status,
}

impl<W: Write> std::fmt::Debug for Builder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("len", &self.len)
            .field("depth", &self.unfinished.len())
            .field("output_width", &self.output_width)
            .field("registry_capacity", &self.registry.capacity())
            .field("status", &self.status)
            .finish()
    }
}

impl Builder<BufWriter<File>> {
    /// Create a builder writing to a new file at `path`.
    pub fn create(path: impl AsRef<Path>, config: BuilderConfig) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(FstError::Write)?;
        Builder::new(BufWriter::new(file), config)
    }

    /// Close the builder and sync the file to disk.
    ///
    /// [`close`](Builder::close) only flushes the buffer into the file.
    pub fn close_synced(&mut self) -> Result<()> {
        self.close()?;
        self.encoder
            .get_ref()
            .get_ref()
            .sync_all()
            .map_err(FstError::Write)
    }
}

impl<W: Write> Builder<W> {
    /// Create a builder writing node records to `wtr`.
    ///
    /// Fails with `InvalidInput` if the configuration is out of range.
    pub fn new(wtr: W, config: BuilderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            encoder: Encoder::new(wtr, config.output_width),
            registry: Registry::new(config.registry_table_size, config.registry_mru_size)?,
            unfinished: vec![UnfinishedState::default()],
            last_key: None,
            len: 0,
            output_width: config.output_width,
            max_output: max_output(config.output_width),
            registry_hits: 0,
            status: Status::Open,
        })
    }

    /// Add `key` with output `value`.
    ///
    /// `key` must be strictly greater than the previously inserted key, and
    /// `value` must fit in the configured output width. Either violation is
    /// reported without changing the builder.
    pub fn insert(&mut self, key: &[u8], value: u64) -> Result<()> {
        if self.status != Status::Open {
            return Err(FstError::BuilderClosed);
        }
        if let Some(previous) = &self.last_key {
            if key <= previous.as_slice() {
                return Err(FstError::OutOfOrder {
                    previous: previous.clone(),
                    key: key.to_vec(),
                });
            }
        }
        if value > self.max_output {
            return Err(FstError::InvalidInput(format!(
                "value {value} does not fit in {} output bytes",
                self.output_width
            )));
        }

        if let Err(e) = self.insert_sorted(key, value) {
            self.status = Status::Failed;
            return Err(e);
        }
        Ok(())
    }

    /// Insert every pair of `iter`, stopping at the first error.
    pub fn extend<I, K>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<[u8]>,
    {
        for (key, value) in iter {
            self.insert(key.as_ref(), value)?;
        }
        Ok(())
    }

    fn insert_sorted(&mut self, key: &[u8], value: u64) -> Result<()> {
        if key.is_empty() {
            // The empty key sorts first, so the root is still untouched.
            self.unfinished[0].state.set_final(value);
        } else {
            let (prefix_len, rest) = self.push_common_prefix(key, value);
            self.freeze_from(prefix_len)?;
            self.add_suffix(&key[prefix_len..], rest);
        }

        self.len += 1;
        match self.last_key.as_mut() {
            Some(last) => {
                last.clear();
                last.extend_from_slice(key);
            }
            None => self.last_key = Some(key.to_vec()),
        }
        Ok(())
    }

    /// Walk the pending transitions shared with `key`, leaving on each only
    /// the part of its output that `key` also carries and pushing the excess
    /// one level down.
    ///
    /// Returns the common prefix length and the output still to be placed.
    fn push_common_prefix(&mut self, key: &[u8], value: u64) -> (usize, u64) {
        let mut rest = value;
        let mut i = 0;
        while i < key.len() {
            let Some(pending) = self.unfinished[i].last.as_mut() else {
                break;
            };
            if pending.label != key[i] {
                break;
            }
            let common = pending.output.min(rest);
            let excess = pending.output - common;
            pending.output = common;
            rest -= common;
            i += 1;
            if excess > 0 {
                self.unfinished[i].add_output_prefix(excess);
            }
        }
        (i, rest)
    }

    /// Freeze every unfinished state deeper than `depth` and attach the
    /// resulting address to the pending transition at `depth`.
    fn freeze_from(&mut self, depth: usize) -> Result<()> {
        let mut addr = None;
        while self.unfinished.len() > depth + 1 {
            let Some(mut top) = self.unfinished.pop() else {
                break;
            };
            if let Some(child) = addr {
                top.freeze_last(child);
            }
            addr = Some(self.compile(top.state)?);
        }
        if let Some(child) = addr {
            self.unfinished[depth].freeze_last(child);
        }
        Ok(())
    }

    /// Extend the unfinished path with the bytes of `suffix`. The remaining
    /// output rides on the first new transition; the new leaf is final.
    fn add_suffix(&mut self, suffix: &[u8], output: u64) {
        let Some((&first, rest)) = suffix.split_first() else {
            return;
        };
        let depth = self.unfinished.len() - 1;
        debug_assert!(self.unfinished[depth].last.is_none());
        self.unfinished[depth].last = Some(PendingTransition {
            label: first,
            output,
        });
        self.unfinished
            .extend(rest.iter().map(|&b| UnfinishedState::with_pending(b, 0)));
        self.unfinished.push(UnfinishedState::final_leaf());
    }

    /// Return the address of a node equivalent to `state`, writing it only
    /// if the registry has no equivalent cached.
    fn compile(&mut self, state: BuilderState) -> Result<StateAddress> {
        match self.registry.entry(&state) {
            RegistryEntry::Found(addr) => {
                self.registry_hits += 1;
                Ok(addr)
            }
            RegistryEntry::NotFound(cell) => {
                let addr = self.encoder.write_state(&state)?;
                cell.insert(state, addr);
                Ok(addr)
            }
            RegistryEntry::Rejected => self.encoder.write_state(&state),
        }
    }

    /// Freeze the remaining path down to the root, write the footer and
    /// flush the writer. Syncing a file to disk is left to
    /// [`close_synced`](Builder::close_synced).
    ///
    /// Closing an already closed builder is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.status {
            Status::Open => {}
            Status::Closed => return Ok(()),
            Status::Failed => return Err(FstError::BuilderClosed),
        }
        match self.finish() {
            Ok(()) => {
                self.status = Status::Closed;
                Ok(())
            }
            Err(e) => {
                self.status = Status::Failed;
                Err(e)
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.freeze_from(0)?;
        let root = self.unfinished.pop().unwrap_or_default();
        let root_addr = self.compile(root.state)?;

        let footer = Footer::new(self.output_width, self.len, root_addr);
        self.encoder.write_raw(&footer.to_bytes())?;
        self.encoder.flush()?;

        let stats = self.stats();
        tracing::debug!(
            keys = stats.keys,
            nodes = stats.nodes_written,
            registry_hits = stats.registry_hits,
            bytes = stats.bytes_written,
            root_addr,
            "fst builder closed"
        );
        Ok(())
    }

    /// Number of keys inserted so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stats(&self) -> BuildStats {
        BuildStats {
            keys: self.len,
            nodes_written: self.encoder.nodes_written(),
            registry_hits: self.registry_hits,
            bytes_written: self.encoder.offset(),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.encoder.get_ref()
    }

    /// Close the builder if needed and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        Ok(self.encoder.into_inner())
    }
}
