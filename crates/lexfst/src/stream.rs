// Ordered iteration over the keys of an FST.
//
// The traversal is an explicit depth-first stack of decoded nodes. Each frame
// remembers the next transition to follow and the output accumulated on the
// way down; the key bytes of the current path live in a separate buffer
// (its length is always the stack depth minus one).

use crate::node::Node;
use crate::transition::{StateAddress, add_outputs};
use crate::{FstError, Result};

#[derive(Debug, Clone, Copy)]
struct Frame<'f> {
    node: Node<'f>,
    next: usize,
    output: u64,
}

/// A forward cursor over the keys of an [`Fst`](crate::Fst) in increasing
/// byte order, optionally bounded to `start <= key < end`.
///
/// A freshly created iterator is already positioned on its first key (or
/// exhausted). [`advance`](FstIterator::advance) moves to the next key and
/// returns [`FstError::IteratorDone`] once there are no more. The cursor
/// cannot be rewound; create a new one to iterate again.
#[derive(Debug)]
pub struct FstIterator<'f> {
    data: &'f [u8],
    output_width: u8,
    stack: Vec<Frame<'f>>,
    key: Vec<u8>,
    value: u64,
    end: Option<Vec<u8>>,
    done: bool,
}

impl<'f> FstIterator<'f> {
    pub(crate) fn new(
        data: &'f [u8],
        root_addr: StateAddress,
        output_width: u8,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Self> {
        let root = Node::decode(data, root_addr, output_width)?;
        let mut it = Self {
            data,
            output_width,
            stack: vec![Frame {
                node: root,
                next: 0,
                output: 0,
            }],
            key: Vec::new(),
            value: 0,
            end: end.map(<[u8]>::to_vec),
            done: false,
        };

        let found = match start {
            Some(start) => it.seek(start)?,
            None if root.is_final() => Some(root.final_output()),
            None => None,
        };
        let found = match found {
            Some(value) => Some(value),
            None => it.step()?,
        };
        it.settle(found);
        Ok(it)
    }

    /// Follow `start` as far as the automaton allows, leaving every frame on
    /// the path pointed at the first transition that leads past `start`.
    ///
    /// Returns the output of `start` itself if it is a key.
    fn seek(&mut self, start: &[u8]) -> Result<Option<u64>> {
        for &b in start {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let i = frame.node.lower_bound(b);
            if i == frame.node.len() || frame.node.labels()[i] != b {
                frame.next = i;
                return Ok(None);
            }
            frame.next = i + 1;
            let t = frame.node.transition(i)?;
            let output = add_outputs(frame.output, t.output)?;
            let child = Node::decode(self.data, t.dest, self.output_width)?;
            self.key.push(b);
            self.stack.push(Frame {
                node: child,
                next: 0,
                output,
            });
        }
        match self.stack.last() {
            Some(top) if top.node.is_final() => {
                add_outputs(top.output, top.node.final_output()).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Depth-first search for the next final node after the current
    /// position. Returns its output with `self.key` set to its key.
    fn step(&mut self) -> Result<Option<u64>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            if frame.next >= frame.node.len() {
                self.stack.pop();
                self.key.pop();
                continue;
            }
            let t = frame.node.transition(frame.next)?;
            frame.next += 1;
            let output = add_outputs(frame.output, t.output)?;
            let child = Node::decode(self.data, t.dest, self.output_width)?;
            self.key.push(t.label);
            self.stack.push(Frame {
                node: child,
                next: 0,
                output,
            });
            if child.is_final() {
                return add_outputs(output, child.final_output()).map(Some);
            }
        }
    }

    /// Accept the key just found, or finish if there is none or it lies at
    /// or past the upper bound.
    fn settle(&mut self, found: Option<u64>) {
        let in_bounds = self
            .end
            .as_deref()
            .is_none_or(|end| self.key.as_slice() < end);
        match found {
            Some(value) if in_bounds => self.value = value,
            _ => self.finish(),
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.stack.clear();
        self.key.clear();
        self.value = 0;
    }

    /// The key and output at the current position, or `None` once exhausted.
    pub fn current(&self) -> Option<(&[u8], u64)> {
        if self.done {
            None
        } else {
            Some((&self.key, self.value))
        }
    }

    /// Move to the next key.
    ///
    /// Returns `Err(FstError::IteratorDone)` when there is no next key. Any
    /// other error means the underlying data is corrupt; the iterator is
    /// exhausted afterwards.
    pub fn advance(&mut self) -> Result<()> {
        if self.done {
            return Err(FstError::IteratorDone);
        }
        match self.step() {
            Ok(found) => self.settle(found),
            Err(e) => {
                self.finish();
                return Err(e);
            }
        }
        if self.done {
            Err(FstError::IteratorDone)
        } else {
            Ok(())
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Adapt into a standard iterator over owned `(key, output)` pairs.
    pub fn into_pairs(self) -> Pairs<'f> {
        Pairs {
            it: self,
            started: false,
        }
    }
}

/// Owned-pair adapter returned by [`FstIterator::into_pairs`].
///
/// Yields `Err` at most once, when the data turns out to be corrupt, and
/// ends afterwards.
#[derive(Debug)]
pub struct Pairs<'f> {
    it: FstIterator<'f>,
    started: bool,
}

impl Iterator for Pairs<'_> {
    type Item = Result<(Vec<u8>, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            match self.it.advance() {
                Ok(()) => {}
                Err(FstError::IteratorDone) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
        self.started = true;
        self.it.current().map(|(key, value)| Ok((key.to_vec(), value)))
    }
}
