//! Run configuration.

/// Default instruction budget for [`Traversal::FollowIp`] runs.
pub const DEFAULT_STEP_LIMIT: usize = 100_000;

/// Which operations recompute the zero and sign flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FlagPolicy {
    /// `mov`, `add`, `sub` and `cmp` all recompute flags from their result.
    #[default]
    IncludeMoves,
    /// Only `add`, `sub` and `cmp` touch flags; moves leave them as they are.
    ArithmeticOnly,
}

impl FlagPolicy {
    /// Returns true when moves update flags.
    #[must_use]
    pub const fn moves_update_flags(self) -> bool {
        matches!(self, Self::IncludeMoves)
    }
}

/// How memory operands are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryModel {
    /// A 64 KiB little-endian array backs every memory operand.
    #[default]
    Backed,
    /// Addresses are computed but reads yield zero and writes are dropped.
    Inert,
}

/// How the driver picks the next instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Traversal {
    /// Linear cursor; jumps update IP but never redirect decoding.
    #[default]
    Sweep,
    /// Fetch at IP after every instruction, so taken jumps redirect decoding.
    FollowIp,
}

/// Top-level immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimConfig {
    /// Flag recomputation policy.
    pub flag_policy: FlagPolicy,
    /// Memory operand model.
    pub memory: MemoryModel,
    /// Instruction fetch strategy.
    pub traversal: Traversal,
    /// Upper bound on executed instructions under [`Traversal::FollowIp`].
    pub step_limit: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            flag_policy: FlagPolicy::IncludeMoves,
            memory: MemoryModel::Backed,
            traversal: Traversal::Sweep,
            step_limit: Some(DEFAULT_STEP_LIMIT),
        }
    }
}

impl SimConfig {
    /// Returns the step limit that applies to this configuration.
    ///
    /// A linear sweep always terminates, so only IP-following runs are bounded.
    #[must_use]
    pub const fn effective_step_limit(&self) -> Option<usize> {
        match self.traversal {
            Traversal::Sweep => None,
            Traversal::FollowIp => self.step_limit,
        }
    }
}
