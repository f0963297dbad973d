use crate::model::{BattleState, Side};

/// Turn resolution supplied by the battle simulator.
///
/// The search only ever calls `step` on its own snapshots; implementations
/// must return a fresh state and leave the input untouched.
pub trait BattleEnv {
    /// Moves plus switch options available to `side`.
    fn legal_action_count(&self, state: &BattleState, side: Side) -> usize;

    /// Resolves one turn with both sides' actions applied simultaneously.
    /// `actions[0]` belongs to the controlled side.
    fn step(&self, state: &BattleState, actions: [usize; 2]) -> BattleState;
}

impl<T: BattleEnv + ?Sized> BattleEnv for &T {
    fn legal_action_count(&self, state: &BattleState, side: Side) -> usize {
        (**self).legal_action_count(state, side)
    }

    fn step(&self, state: &BattleState, actions: [usize; 2]) -> BattleState {
        (**self).step(state, actions)
    }
}
