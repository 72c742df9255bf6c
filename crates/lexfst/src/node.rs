// Node record encoding and zero-copy decoding.
//
// Records are appended in the order states are frozen, so a node's children
// always live at lower addresses. Layout of the record at address A:
//
//   flags        1 byte      bit 0: final, bits 4-7: delta width d (0..=8)
//   count        uvarint     number of transitions (0..=256)
//   final output w bytes     only if final
//   labels       count bytes strictly increasing
//   entries      count * (w + d) bytes: output (w bytes), A - dest (d bytes)
//
// `w` is the FST-wide output width. Labels are contiguous so lookups can
// binary search them, and entries have a fixed stride so transition `i` is
// addressable without scanning.

use std::io::Write;

use crate::state::BuilderState;
use crate::transition::{
    StateAddress, Transition, bytes_needed, pack_uint, pack_uvarint, unpack_uint, unpack_uvarint,
};
use crate::{FstError, Result};

const FLAG_FINAL: u8 = 0b0000_0001;
const FLAG_RESERVED: u8 = 0b0000_1110;
const DELTA_WIDTH_SHIFT: u8 = 4;

/// Maximum number of transitions leaving one state (one per byte value).
pub const MAX_TRANSITIONS: usize = 256;

/// Append the record for `state`, to be placed at `addr`, to `buf`.
///
/// Every destination of `state` must already be compiled below `addr`.
pub fn encode_state(buf: &mut Vec<u8>, state: &BuilderState, addr: StateAddress, output_width: u8) {
    debug_assert!(state.transitions.len() <= MAX_TRANSITIONS);
    debug_assert!(state.transitions.iter().all(|t| t.dest < addr));

    let max_delta = state
        .transitions
        .iter()
        .map(|t| addr - t.dest)
        .max()
        .unwrap_or(0);
    let delta_width = bytes_needed(max_delta);

    let mut flags = delta_width << DELTA_WIDTH_SHIFT;
    if state.is_final {
        flags |= FLAG_FINAL;
    }
    buf.push(flags);
    pack_uvarint(buf, state.transitions.len() as u64);
    if state.is_final {
        pack_uint(buf, state.final_output, output_width);
    }
    buf.extend(state.transitions.iter().map(|t| t.label));
    for t in &state.transitions {
        pack_uint(buf, t.output, output_width);
        pack_uint(buf, addr - t.dest, delta_width);
    }
}

/// A decoded view of one node record, borrowing the FST bytes.
#[derive(Clone, Copy)]
pub struct Node<'f> {
    data: &'f [u8],
    addr: StateAddress,
    is_final: bool,
    final_output: u64,
    len: usize,
    labels_at: usize,
    entries_at: usize,
    output_width: u8,
    delta_width: u8,
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("addr", &self.addr)
            .field("is_final", &self.is_final)
            .field("final_output", &self.final_output)
            .field("len", &self.len)
            .field("labels", &self.labels())
            .finish()
    }
}

impl<'f> Node<'f> {
    /// Decode the record at `addr`.
    ///
    /// `data` is the node region of the FST (everything before the footer).
    /// Truncated records are reported as `CorruptFormat`. Destinations are
    /// checked when a transition is read, so decoding costs the same for any
    /// fan-out.
    pub fn decode(data: &'f [u8], addr: StateAddress, output_width: u8) -> Result<Self> {
        let start = usize::try_from(addr)
            .ok()
            .filter(|&a| a < data.len())
            .ok_or_else(|| corrupt(addr, "address out of bounds"))?;

        let flags = data[start];
        if flags & FLAG_RESERVED != 0 {
            return Err(corrupt(addr, "reserved flag bits set"));
        }
        let is_final = flags & FLAG_FINAL != 0;
        let delta_width = flags >> DELTA_WIDTH_SHIFT;
        if delta_width > 8 {
            return Err(corrupt(addr, "delta width exceeds 8 bytes"));
        }

        let (count, used) = unpack_uvarint(&data[start + 1..])?;
        if count > MAX_TRANSITIONS as u64 {
            return Err(corrupt(addr, "too many transitions"));
        }
        let len = count as usize;
        if len > 0 && delta_width == 0 {
            return Err(corrupt(addr, "missing destination width"));
        }

        let mut pos = start + 1 + used;
        let w = output_width as usize;
        let final_output = if is_final {
            if pos + w > data.len() {
                return Err(corrupt(addr, "truncated final output"));
            }
            let out = unpack_uint(&data[pos..], output_width);
            pos += w;
            out
        } else {
            0
        };

        let labels_at = pos;
        let entries_at = labels_at + len;
        let end = entries_at + len * (w + delta_width as usize);
        if end > data.len() {
            return Err(corrupt(addr, "truncated transition table"));
        }

        Ok(Node {
            data,
            addr,
            is_final,
            final_output,
            len,
            labels_at,
            entries_at,
            output_width,
            delta_width,
        })
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    #[inline]
    pub fn final_output(&self) -> u64 {
        self.final_output
    }

    /// Number of outgoing transitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Labels of all transitions, in increasing order.
    #[inline]
    pub fn labels(&self) -> &'f [u8] {
        &self.data[self.labels_at..self.entries_at]
    }

    #[inline]
    fn entry_at(&self, i: usize) -> usize {
        self.entries_at + i * (self.output_width as usize + self.delta_width as usize)
    }

    /// The `i`-th transition. Panics if `i >= self.len()`.
    ///
    /// Fails with `CorruptFormat` if its destination does not lie strictly
    /// below this node, which keeps every traversal finite.
    #[inline]
    pub fn transition(&self, i: usize) -> Result<Transition> {
        assert!(i < self.len, "transition index {i} out of range");
        let at = self.entry_at(i);
        let delta = unpack_uint(
            &self.data[at + self.output_width as usize..],
            self.delta_width,
        );
        if delta == 0 || delta > self.addr {
            return Err(corrupt(self.addr, "destination does not point backwards"));
        }
        Ok(Transition {
            label: self.data[self.labels_at + i],
            output: unpack_uint(&self.data[at..], self.output_width),
            dest: self.addr - delta,
        })
    }

    /// Index of the transition labelled `label`, if any.
    #[inline]
    pub fn find(&self, label: u8) -> Option<usize> {
        self.labels().binary_search(&label).ok()
    }

    /// Index of the first transition whose label is `>= label`
    /// (`self.len()` if there is none).
    #[inline]
    pub fn lower_bound(&self, label: u8) -> usize {
        self.labels().partition_point(|&l| l < label)
    }

    pub fn transitions(&self) -> impl Iterator<Item = Result<Transition>> + '_ {
        (0..self.len).map(move |i| self.transition(i))
    }

    /// Rebuild the builder-side state this record was encoded from.
    pub fn to_state(&self) -> Result<BuilderState> {
        Ok(BuilderState {
            is_final: self.is_final,
            final_output: self.final_output,
            transitions: self.transitions().collect::<Result<_>>()?,
        })
    }
}

fn corrupt(addr: StateAddress, what: &str) -> FstError {
    FstError::CorruptFormat(format!("node at {addr}: {what}"))
}

/// Appends node records to a writer and hands out their addresses.
pub struct Encoder<W> {
    wtr: W,
    offset: u64,
    nodes: u64,
    output_width: u8,
    scratch: Vec<u8>,
}

impl<W: Write> Encoder<W> {
    pub fn new(wtr: W, output_width: u8) -> Self {
        Self {
            wtr,
            offset: 0,
            nodes: 0,
            output_width,
            scratch: Vec::with_capacity(64),
        }
    }

    /// Encode `state` at the current end of the stream and return its address.
    pub fn write_state(&mut self, state: &BuilderState) -> Result<StateAddress> {
        let addr = self.offset;
        self.scratch.clear();
        encode_state(&mut self.scratch, state, addr, self.output_width);
        self.wtr.write_all(&self.scratch).map_err(FstError::Write)?;
        self.offset += self.scratch.len() as u64;
        self.nodes += 1;
        Ok(addr)
    }

    /// Write raw bytes (the footer) after the node records.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.wtr.write_all(bytes).map_err(FstError::Write)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush().map_err(FstError::Write)
    }

    /// Bytes written so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Node records written so far.
    pub fn nodes_written(&self) -> u64 {
        self.nodes
    }

    pub fn get_ref(&self) -> &W {
        &self.wtr
    }

    pub fn into_inner(self) -> W {
        self.wtr
    }
}
