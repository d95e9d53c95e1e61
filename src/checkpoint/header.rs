//! Two-byte checkpoint header: format version and build flags.

use crate::field::AxisOrder;
use crate::label_error::LabelError;

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u8 = 1;

const FLAG_COLUMN_MAJOR: u8 = 1 << 0;
const FLAG_DISTRIBUTED: u8 = 1 << 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CheckpointHeader {
    version: u8,
    flags: u8,
}

impl CheckpointHeader {
    /// Header this build writes for axis order `O`.
    pub fn current<O: AxisOrder>(distributed: bool) -> Self {
        let mut flags = 0;
        if O::COLUMN_MAJOR {
            flags |= FLAG_COLUMN_MAJOR;
        }
        if distributed {
            flags |= FLAG_DISTRIBUTED;
        }
        Self {
            version: CHECKPOINT_VERSION,
            flags,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn is_column_major(&self) -> bool {
        self.flags & FLAG_COLUMN_MAJOR != 0
    }

    pub fn is_distributed(&self) -> bool {
        self.flags & FLAG_DISTRIBUTED != 0
    }

    pub fn to_bytes(self) -> [u8; 2] {
        [self.version, self.flags]
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            version: bytes[0],
            flags: bytes[1],
        }
    }

    /// Check a header read from disk against what this build expects.
    pub fn check_compatible(&self, expected: &CheckpointHeader) -> Result<(), LabelError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(LabelError::CheckpointVersion(self.version));
        }
        if self.is_column_major() != expected.is_column_major() {
            return Err(LabelError::CheckpointMismatch(format!(
                "file column-major = {}, domain column-major = {}",
                self.is_column_major(),
                expected.is_column_major()
            )));
        }
        if self.is_distributed() != expected.is_distributed() {
            return Err(LabelError::CheckpointMismatch(format!(
                "file distributed = {}, domain distributed = {}",
                self.is_distributed(),
                expected.is_distributed()
            )));
        }
        Ok(())
    }
}
