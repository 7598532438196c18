use crate::utils::error::SizeError;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// 批次筆數上下限，檔案與 JSON 來源共用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    max_records: usize,
}

impl BatchPolicy {
    pub fn new(max_records: usize) -> Self {
        Self { max_records }
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    pub fn check(&self, record_count: usize) -> std::result::Result<(), SizeError> {
        if record_count == 0 {
            return Err(SizeError::Empty);
        }
        if record_count > self.max_records {
            return Err(SizeError::ExceedsLimit {
                count: record_count,
                limit: self.max_records,
            });
        }
        Ok(())
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_SIZE)
    }
}
