//! Per-type actual-cost functions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::JobType;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Work reported by an executor, used to price a successful attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Bytes read or written (OCR input, storage upload).
    pub bytes_processed: u64,
    /// Discrete items handled (transformed rows or tables).
    pub items_processed: u64,
}

impl Usage {
    /// Usage measured in bytes.
    #[must_use]
    pub const fn bytes(bytes_processed: u64) -> Self {
        Self {
            bytes_processed,
            items_processed: 0,
        }
    }

    /// Usage measured in items.
    #[must_use]
    pub const fn items(items_processed: u64) -> Self {
        Self {
            bytes_processed: 0,
            items_processed,
        }
    }
}

/// Rates used to turn [`Usage`] into money.
///
/// OCR and storage are priced by size, transform by item count and
/// compression at a flat fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Price per MiB of OCR input.
    pub ocr_per_mb: Decimal,
    /// Price per MiB uploaded to storage.
    pub storage_per_mb: Decimal,
    /// Price per transformed item.
    pub transform_per_item: Decimal,
    /// Flat price per compression.
    pub compress_flat: Decimal,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            ocr_per_mb: Decimal::new(5, 2),
            storage_per_mb: Decimal::new(1, 2),
            transform_per_item: Decimal::new(1, 3),
            compress_flat: Decimal::new(2, 3),
        }
    }
}

impl CostModel {
    /// Actual cost of a successful attempt.
    #[must_use]
    pub fn cost_for(&self, job_type: JobType, usage: &Usage) -> Decimal {
        match job_type {
            JobType::Ocr => Self::per_mb(self.ocr_per_mb, usage.bytes_processed),
            JobType::Storage => Self::per_mb(self.storage_per_mb, usage.bytes_processed),
            JobType::Transform => self
                .transform_per_item
                .saturating_mul(Decimal::from(usage.items_processed)),
            JobType::Compress => self.compress_flat,
        }
    }

    /// Validate that no rate is negative.
    pub fn validate(&self) -> Result<(), String> {
        let rates = [
            ("ocr_per_mb", self.ocr_per_mb),
            ("storage_per_mb", self.storage_per_mb),
            ("transform_per_item", self.transform_per_item),
            ("compress_flat", self.compress_flat),
        ];
        for (name, rate) in rates {
            if rate.is_sign_negative() {
                return Err(format!("{name} must not be negative"));
            }
        }
        Ok(())
    }

    fn per_mb(rate: Decimal, bytes: u64) -> Decimal {
        rate.saturating_mul(Decimal::from(bytes)) / Decimal::from(BYTES_PER_MB)
    }
}
