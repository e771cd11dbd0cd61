use serde::{Deserialize, Serialize};

/// Per-joint values, index-aligned with `name`.
///
/// Also used to describe the controllable joints and to command joints;
/// vectors that are not relevant may be left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub name: Vec<String>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub effort: Vec<f64>,
}

impl JointState {
    /// Position-only state.
    pub fn positions<S: Into<String>>(joints: impl IntoIterator<Item = (S, f64)>) -> Self {
        let mut state = JointState::default();
        for (name, position) in joints {
            state.name.push(name.into());
            state.position.push(position);
        }
        state
    }

    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Position of the joint called `name`, if present.
    pub fn position_of(&self, name: &str) -> Option<f64> {
        let index = self.name.iter().position(|n| n == name)?;
        self.position.get(index).copied()
    }
}
