use crate::error::{TaskError, TaskResult};

pub const DEFAULT_PLATFORM_FEE_BPS: u32 = 1000;
const BPS_DENOMINATOR: i128 = 10_000;

/// Platform commission in basis points (1/100 of a percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    bps: u32,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            bps: DEFAULT_PLATFORM_FEE_BPS,
        }
    }
}

impl FeePolicy {
    pub fn from_bps(bps: u32) -> TaskResult<Self> {
        if i128::from(bps) > BPS_DENOMINATOR {
            return Err(TaskError::Validation(format!(
                "platform fee of {} bps exceeds 100%",
                bps
            )));
        }
        Ok(Self { bps })
    }

    pub fn bps(&self) -> u32 {
        self.bps
    }

    /// Fee on `amount`, rounded down to whole minor units.
    pub fn fee_for(&self, amount: i64) -> i64 {
        let fee = i128::from(amount) * i128::from(self.bps) / BPS_DENOMINATOR;
        // bps <= 10_000 keeps the fee within the amount
        fee as i64
    }
}
