// Loading a compiled FST and point lookups over its bytes.

use std::fs::File;
use std::path::Path;

use hashbrown::HashSet;
use memmap2::Mmap;

use crate::format::{self, FOOTER_SIZE, Footer};
use crate::node::Node;
use crate::stream::FstIterator;
use crate::transition::{StateAddress, add_outputs};
use crate::{FstError, Result};

enum FstData {
    Owned(Vec<u8>),
    Mapped(Mmap),
    Closed,
}

impl FstData {
    fn as_slice(&self) -> Option<&[u8]> {
        match self {
            FstData::Owned(v) => Some(v),
            FstData::Mapped(m) => Some(m),
            FstData::Closed => None,
        }
    }
}

/// A compiled, immutable FST.
///
/// All queries read the encoded bytes directly; nothing is materialized.
/// The handle is `Send + Sync`, and any number of lookups and iterators can
/// run against it concurrently.
pub struct Fst {
    data: FstData,
    footer: Footer,
}

impl std::fmt::Debug for Fst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fst")
            .field("len", &self.footer.key_count)
            .field("root_addr", &self.footer.root_addr)
            .field("output_width", &self.footer.output_width)
            .field("size_bytes", &self.size_bytes())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Fst {
    /// Load an FST from an owned buffer, as produced by [`Builder::into_inner`](crate::Builder::into_inner).
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_data(FstData::Owned(data))
    }

    /// Memory-map the FST file at `path`.
    ///
    /// The file must not be modified while the map is alive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(FstError::Read)?;
        // SAFETY: the map is read-only and callers must not truncate or
        // rewrite the file while this `Fst` holds it.
        let mmap = unsafe { Mmap::map(&file) }.map_err(FstError::Read)?;
        let fst = Self::from_data(FstData::Mapped(mmap))?;
        tracing::debug!(
            path = %path.display(),
            bytes = fst.size_bytes(),
            keys = fst.len(),
            "fst mapped"
        );
        Ok(fst)
    }

    /// Read the whole FST file at `path` into memory.
    pub fn open_buffered(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(FstError::Read)?;
        let fst = Self::from_data(FstData::Owned(data))?;
        tracing::debug!(
            path = %path.display(),
            bytes = fst.size_bytes(),
            keys = fst.len(),
            "fst loaded"
        );
        Ok(fst)
    }

    fn from_data(data: FstData) -> Result<Self> {
        let bytes = data.as_slice().unwrap_or_default();
        let footer = format::parse_footer(bytes)?;
        let nodes = &bytes[..bytes.len() - FOOTER_SIZE];
        let root = Node::decode(nodes, footer.root_addr, footer.output_width())?;
        if footer.key_count == 0 && (root.is_final() || !root.is_empty()) {
            return Err(FstError::CorruptFormat(
                "empty FST with a non-empty root".to_string(),
            ));
        }
        Ok(Self { data, footer })
    }

    /// Node records, without the footer.
    fn nodes(&self) -> Result<&[u8]> {
        let bytes = self.data.as_slice().ok_or(FstError::Closed)?;
        Ok(&bytes[..bytes.len() - FOOTER_SIZE])
    }

    fn root(&self) -> Result<Node<'_>> {
        Node::decode(self.nodes()?, self.footer.root_addr, self.output_width())
    }

    /// Number of keys.
    pub fn len(&self) -> u64 {
        self.footer.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.footer.key_count == 0
    }

    /// Bytes per encoded output value.
    pub fn output_width(&self) -> u8 {
        self.footer.output_width()
    }

    pub fn version(&self) -> u32 {
        self.footer.version
    }

    pub fn root_addr(&self) -> StateAddress {
        self.footer.root_addr
    }

    /// Total size of the encoded FST, footer included (0 once closed).
    pub fn size_bytes(&self) -> usize {
        self.data.as_slice().map_or(0, <[u8]>::len)
    }

    /// Look up the output stored for `key`.
    pub fn get(&self, key: &[u8]) -> Result<Option<u64>> {
        let nodes = self.nodes()?;
        let width = self.output_width();
        let mut node = self.root()?;
        let mut out = 0u64;
        for &b in key {
            let Some(i) = node.find(b) else {
                return Ok(None);
            };
            let t = node.transition(i)?;
            out = add_outputs(out, t.output)?;
            node = Node::decode(nodes, t.dest, width)?;
        }
        if !node.is_final() {
            return Ok(None);
        }
        add_outputs(out, node.final_output()).map(Some)
    }

    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterate over all keys in increasing order.
    pub fn iter(&self) -> Result<FstIterator<'_>> {
        self.range(None, None)
    }

    /// Iterate over keys `k` with `start <= k < end`, in increasing order.
    /// Either bound may be omitted.
    pub fn range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<FstIterator<'_>> {
        FstIterator::new(
            self.nodes()?,
            self.footer.root_addr,
            self.output_width(),
            start,
            end,
        )
    }

    /// Iterate over keys starting with `prefix`, in increasing order.
    pub fn prefix(&self, prefix: &[u8]) -> Result<FstIterator<'_>> {
        let end = prefix_successor(prefix);
        self.range(Some(prefix), end.as_deref())
    }

    /// Number of distinct nodes reachable from the root.
    pub fn node_count(&self) -> Result<usize> {
        let nodes = self.nodes()?;
        let width = self.output_width();
        let mut seen = HashSet::new();
        let mut pending = vec![self.footer.root_addr];
        while let Some(addr) = pending.pop() {
            if !seen.insert(addr) {
                continue;
            }
            let node = Node::decode(nodes, addr, width)?;
            for t in node.transitions() {
                pending.push(t?.dest);
            }
        }
        Ok(seen.len())
    }

    /// Release the underlying buffer or memory map.
    ///
    /// Queries on a closed FST fail with [`FstError::Closed`]; metadata
    /// accessors keep working. Closing twice is a no-op.
    pub fn close(&mut self) {
        if !self.is_closed() {
            tracing::debug!(bytes = self.size_bytes(), "fst closed");
            self.data = FstData::Closed;
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.data, FstData::Closed)
    }
}

/// Smallest byte string greater than every string starting with `prefix`,
/// or `None` if there is none (empty prefix or all `0xFF`).
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let keep = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut end = prefix[..=keep].to_vec();
    end[keep] += 1;
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Builder, BuilderConfig};

    fn build(pairs: &[(&[u8], u64)]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new(), BuilderConfig::default()).unwrap();
        for &(k, v) in pairs {
            builder.insert(k, v).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn keys(it: FstIterator<'_>) -> Vec<Vec<u8>> {
        it.into_pairs().map(|r| r.unwrap().0).collect()
    }

    #[test]
    fn fst_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fst>();
    }

    #[test]
    fn lookup_and_metadata() {
        let fst = Fst::from_bytes(build(&[(b"bar", 2), (b"baz", 3), (b"foo", 1)])).unwrap();
        assert_eq!(fst.len(), 3);
        assert_eq!(fst.version(), 1);
        assert_eq!(fst.output_width(), 8);
        assert_eq!(fst.get(b"baz").unwrap(), Some(3));
        assert_eq!(fst.get(b"ba").unwrap(), None);
        assert_eq!(fst.get(b"bazz").unwrap(), None);
        assert_eq!(fst.get(b"").unwrap(), None);
        assert!(fst.contains(b"foo").unwrap());
    }

    #[test]
    fn prefix_iteration() {
        let fst = Fst::from_bytes(build(&[
            (b"a", 0),
            (b"ab", 1),
            (b"abc", 2),
            (b"abd", 3),
            (b"ac", 4),
            (b"b", 5),
        ]))
        .unwrap();
        assert_eq!(
            keys(fst.prefix(b"ab").unwrap()),
            [b"ab".to_vec(), b"abc".to_vec(), b"abd".to_vec()]
        );
        assert_eq!(keys(fst.prefix(b"").unwrap()).len(), 6);
        assert!(keys(fst.prefix(b"x").unwrap()).is_empty());
    }

    #[test]
    fn prefix_of_high_bytes() {
        let fst = Fst::from_bytes(build(&[(b"\xff", 1), (b"\xff\xff", 2), (b"\xff\xff\x01", 3)]))
            .unwrap();
        assert_eq!(keys(fst.prefix(b"\xff\xff").unwrap()).len(), 2);
    }

    #[test]
    fn successor_of_prefix() {
        assert_eq!(prefix_successor(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_successor(b"a\xff"), Some(b"b".to_vec()));
        assert_eq!(prefix_successor(b"\xff\xff"), None);
        assert_eq!(prefix_successor(b""), None);
    }

    #[test]
    fn close_is_idempotent() {
        let mut fst = Fst::from_bytes(build(&[(b"a", 1)])).unwrap();
        fst.close();
        fst.close();
        assert!(fst.is_closed());
        assert_eq!(fst.len(), 1);
        assert_eq!(fst.size_bytes(), 0);
        assert!(matches!(fst.get(b"a"), Err(FstError::Closed)));
        assert!(matches!(fst.iter(), Err(FstError::Closed)));
    }

    #[test]
    fn rejects_truncated_data() {
        let data = build(&[(b"a", 1)]);
        let err = Fst::from_bytes(data[..10].to_vec()).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn rejects_garbage_root() {
        let mut data = build(&[(b"hello", 1)]);
        let at = data.len() - FOOTER_SIZE - 1;
        data[at] = 0xFF;
        // The last byte of the node region belongs to the root record.
        assert!(Fst::from_bytes(data).is_err());
    }

    #[test]
    fn self_loop_is_reported_when_reached() {
        // Records: final leaf at 0 (10 bytes), `b` node at 10 (12 bytes),
        // root at 22 (12 bytes). Zero the delta byte of the `b` node.
        let mut data = build(&[(b"ab", 4)]);
        assert_eq!(data.len(), 34 + FOOTER_SIZE);
        data[21] = 0;

        let fst = Fst::from_bytes(data).unwrap();
        assert!(matches!(fst.get(b"ab"), Err(FstError::CorruptFormat(_))));
        assert_eq!(fst.get(b"x").unwrap(), None);
        assert!(fst.iter().unwrap_err().is_corrupt());
        assert!(fst.node_count().unwrap_err().is_corrupt());
    }

    #[test]
    fn node_count_of_single_key() {
        let fst = Fst::from_bytes(build(&[(b"abc", 0)])).unwrap();
        assert_eq!(fst.node_count().unwrap(), 4);
    }
}
