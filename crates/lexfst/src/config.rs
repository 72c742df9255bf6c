// Builder configuration.

use crate::FstError;
use crate::registry::RegistryCell;

/// Default number of registry buckets.
pub const DEFAULT_REGISTRY_TABLE_SIZE: usize = 10_000;
/// Default number of cells per registry bucket.
pub const DEFAULT_REGISTRY_MRU_SIZE: usize = 2;
/// Default output width: full `u64` outputs.
pub const DEFAULT_OUTPUT_WIDTH: u8 = 8;

/// Options recognized by [`Builder::new`](crate::Builder::new).
///
/// `registry_table_size * registry_mru_size` bounds the number of frozen
/// states kept for deduplication. A zero in either disables deduplication
/// entirely: the FST stays correct but is no longer minimal.
///
/// `output_width` is the number of bytes used for every output field in the
/// encoded nodes (0..=8). Values that do not fit are rejected at insert
/// time; a width of 0 builds a plain key set whose values are all 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderConfig {
    pub registry_table_size: usize,
    pub registry_mru_size: usize,
    pub output_width: u8,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            registry_table_size: DEFAULT_REGISTRY_TABLE_SIZE,
            registry_mru_size: DEFAULT_REGISTRY_MRU_SIZE,
            output_width: DEFAULT_OUTPUT_WIDTH,
        }
    }
}

impl BuilderConfig {
    /// A configuration with deduplication turned off.
    pub fn without_registry() -> Self {
        Self {
            registry_table_size: 0,
            ..Self::default()
        }
    }

    pub fn with_output_width(mut self, output_width: u8) -> Self {
        self.output_width = output_width;
        self
    }

    pub fn with_registry(mut self, table_size: usize, mru_size: usize) -> Self {
        self.registry_table_size = table_size;
        self.registry_mru_size = mru_size;
        self
    }

    pub fn validate(&self) -> Result<(), FstError> {
        if self.output_width > 8 {
            return Err(FstError::InvalidInput(format!(
                "output width {} exceeds 8 bytes",
                self.output_width
            )));
        }
        let bytes = self
            .registry_table_size
            .checked_mul(self.registry_mru_size)
            .and_then(|cells| cells.checked_mul(size_of::<RegistryCell>()));
        if bytes.is_none_or(|b| b > isize::MAX as usize) {
            return Err(FstError::InvalidInput(format!(
                "registry of {} x {} cells is too large",
                self.registry_table_size, self.registry_mru_size
            )));
        }
        Ok(())
    }
}
