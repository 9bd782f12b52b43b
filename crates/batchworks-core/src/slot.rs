//! A single batch lane: staged inputs, a progress counter, and at most one
//! completed output.

use crate::id::ItemTypeId;
use crate::quality::QualityTier;

/// Most ingredient stages a slot can require.
pub const MAX_STAGES: usize = 3;

/// A typed ingredient reference handed over by the inventory collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingredient<Q> {
    pub item: ItemTypeId,
    /// Quality carried by intermediate products. Raw reagents carry none.
    pub quality: Option<Q>,
}

impl<Q> Ingredient<Q> {
    /// A raw ingredient without quality.
    pub fn raw(item: ItemTypeId) -> Self {
        Self { item, quality: None }
    }

    /// An intermediate product carrying a quality tier.
    pub fn graded(item: ItemTypeId, quality: Q) -> Self {
        Self {
            item,
            quality: Some(quality),
        }
    }
}

/// Finished product of one or more batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutput<Q> {
    pub item: ItemTypeId,
    pub quantity: u32,
    pub quality: Q,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SlotState<Q> {
    /// Collecting inputs, or progressing once all are present.
    Staging {
        inputs: Vec<Ingredient<Q>>,
        elapsed: u32,
    },
    /// Completed; holds the output until drained. Inputs are consumed.
    Done(BatchOutput<Q>),
}

/// One lane of a batch station.
///
/// The state enum makes "output present implies no staged inputs" hold by
/// construction, and a slot holding output refuses new inputs until drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSlot<Q> {
    required: usize,
    state: SlotState<Q>,
}

impl<Q: QualityTier> BatchSlot<Q> {
    /// An empty slot requiring `required_inputs` ordered ingredients
    /// (clamped to `1..=MAX_STAGES`).
    pub fn new(required_inputs: usize) -> Self {
        Self {
            required: required_inputs.clamp(1, MAX_STAGES),
            state: SlotState::Staging {
                inputs: Vec::with_capacity(MAX_STAGES),
                elapsed: 0,
            },
        }
    }

    /// Rebuild a slot from persisted parts. An output wins over staged
    /// inputs; surplus inputs are dropped.
    pub(crate) fn restore(
        required_inputs: usize,
        mut inputs: Vec<Ingredient<Q>>,
        elapsed: u32,
        output: Option<BatchOutput<Q>>,
    ) -> Self {
        let mut slot = Self::new(required_inputs);
        slot.state = match output {
            Some(output) => SlotState::Done(output),
            None => {
                inputs.truncate(slot.required);
                let elapsed = if inputs.len() == slot.required { elapsed } else { 0 };
                SlotState::Staging { inputs, elapsed }
            }
        };
        slot
    }

    /// Stage `ingredient` as input number `stage` (0-based).
    ///
    /// Succeeds only if the slot holds no output and exactly `stage` inputs
    /// are already staged, so ingredients always arrive in order.
    pub fn accept(&mut self, ingredient: Ingredient<Q>, stage: usize) -> bool {
        if stage >= self.required {
            return false;
        }
        match &mut self.state {
            SlotState::Staging { inputs, .. } if inputs.len() == stage => {
                inputs.push(ingredient);
                true
            }
            _ => false,
        }
    }

    /// Add `ticks` of progress if every required input is present and no
    /// output exists. Returns whether the slot progressed.
    pub fn advance(&mut self, ticks: u32) -> bool {
        match &mut self.state {
            SlotState::Staging { inputs, elapsed } if inputs.len() == self.required => {
                *elapsed = elapsed.saturating_add(ticks);
                true
            }
            _ => false,
        }
    }

    /// Progress has reached `threshold` but the output is not materialized yet.
    pub fn is_ready(&self, threshold: u32) -> bool {
        matches!(
            &self.state,
            SlotState::Staging { inputs, elapsed }
                if inputs.len() == self.required && *elapsed >= threshold
        )
    }

    /// Materialize the output if ready, consuming the staged inputs.
    ///
    /// `produce` sees the staged inputs in stage order. Once an output exists
    /// further calls are no-ops. Returns whether an output was written.
    pub fn complete<F>(&mut self, threshold: u32, produce: F) -> bool
    where
        F: FnOnce(&[Ingredient<Q>]) -> BatchOutput<Q>,
    {
        if !self.is_ready(threshold) {
            return false;
        }
        if let SlotState::Staging { inputs, .. } = &self.state {
            let output = produce(inputs);
            self.state = SlotState::Done(output);
        }
        true
    }

    /// Remove and return the output, leaving the slot empty.
    pub fn drain(&mut self) -> Option<BatchOutput<Q>> {
        if !matches!(self.state, SlotState::Done(_)) {
            return None;
        }
        let empty = SlotState::Staging {
            inputs: Vec::with_capacity(MAX_STAGES),
            elapsed: 0,
        };
        match std::mem::replace(&mut self.state, empty) {
            SlotState::Done(output) => Some(output),
            SlotState::Staging { .. } => None,
        }
    }

    /// Number of ingredient stages this slot requires.
    pub fn required_inputs(&self) -> usize {
        self.required
    }

    /// Number of inputs currently staged (0 once completed).
    pub fn stage(&self) -> usize {
        self.inputs().len()
    }

    pub fn inputs(&self) -> &[Ingredient<Q>] {
        match &self.state {
            SlotState::Staging { inputs, .. } => inputs,
            SlotState::Done(_) => &[],
        }
    }

    /// Ticks of progress on the staged batch (0 once completed).
    pub fn elapsed(&self) -> u32 {
        match &self.state {
            SlotState::Staging { elapsed, .. } => *elapsed,
            SlotState::Done(_) => 0,
        }
    }

    /// All inputs staged and no output yet.
    pub fn is_progressing(&self) -> bool {
        matches!(
            &self.state,
            SlotState::Staging { inputs, .. } if inputs.len() == self.required
        )
    }

    pub fn output(&self) -> Option<&BatchOutput<Q>> {
        match &self.state {
            SlotState::Done(output) => Some(output),
            SlotState::Staging { .. } => None,
        }
    }

    /// No inputs, no progress, no output.
    pub fn is_empty(&self) -> bool {
        matches!(
            &self.state,
            SlotState::Staging { inputs, elapsed } if inputs.is_empty() && *elapsed == 0
        )
    }
}
