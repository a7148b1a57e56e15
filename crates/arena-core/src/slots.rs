use crate::{CoreError, SlotError};

/// Fixed-size output collection, one slot per input item.
///
/// Each slot is written exactly once; reading happens only after the run,
/// through [`ResultSlots::into_results`].
#[derive(Debug)]
pub struct ResultSlots<T> {
    slots: Vec<Option<Result<T, SlotError>>>,
    filled: usize,
}

impl<T> ResultSlots<T> {
    pub fn new(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self { slots, filled: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots written so far.
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    pub fn is_filled(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Write slot `index`. A second write to the same slot is rejected and
    /// leaves the first value in place.
    pub fn fill(&mut self, index: usize, value: Result<T, SlotError>) -> Result<(), CoreError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(CoreError::OutOfRange { index, len })?;
        if slot.is_some() {
            return Err(CoreError::SlotTaken(index));
        }
        *slot = Some(value);
        self.filled += 1;
        Ok(())
    }

    /// Consume the slots in index order; unwritten slots become [`SlotError::Lost`].
    pub fn into_results(self) -> Vec<Result<T, SlotError>> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or(Err(SlotError::Lost { index })))
            .collect()
    }
}
