//! Checkbox state machine.
//!
//! A checkbox reports one of `true`/`false` (or `Y`/`N` when the record spells
//! it that way) and, for 3-state fields with an unrecognized initial value,
//! `null`. The spelling seen at mount time is kept so toggling answers in the
//! same family and case.
//!
//! The indeterminate state is only reachable from the initial value. Once the
//! user toggles, the box moves between the two concrete states.

use super::value::Primitive;

/// Spelling of the concrete states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckFamily {
    /// `"true"` / `"false"`
    Bool,
    /// `"Y"` / `"N"`, in the case first seen
    YesNo { upper: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked(CheckFamily),
    Unchecked(CheckFamily),
    /// Shown as neither; reports `null`
    Indeterminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckBoxMachine {
    state: CheckState,
    tri_state: bool,
}

impl CheckBoxMachine {
    /// Resolve the initial state from the record text (case-insensitive).
    pub fn from_value(raw: &str, tri_state: bool) -> Self {
        CheckBoxMachine {
            state: resolve(raw, tri_state),
            tri_state,
        }
    }

    /// Re-resolve from an externally supplied value
    pub fn set_value(&mut self, raw: &str) {
        self.state = resolve(raw, self.tri_state);
    }

    /// Apply one user click
    pub fn toggle(&mut self) {
        self.state = match self.state {
            CheckState::Checked(family) => CheckState::Unchecked(family),
            CheckState::Unchecked(family) => CheckState::Checked(family),
            CheckState::Indeterminate => CheckState::Checked(CheckFamily::Bool),
        };
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    /// `Some(checked)`, or `None` while indeterminate
    pub fn is_checked(&self) -> Option<bool> {
        match self.state {
            CheckState::Checked(_) => Some(true),
            CheckState::Unchecked(_) => Some(false),
            CheckState::Indeterminate => None,
        }
    }

    pub fn is_tri_state(&self) -> bool {
        self.tri_state
    }

    /// Value reported to the aggregator
    pub fn value(&self) -> Primitive {
        let text = match self.state {
            CheckState::Indeterminate => return Primitive::Null,
            CheckState::Checked(CheckFamily::Bool) => "true",
            CheckState::Unchecked(CheckFamily::Bool) => "false",
            CheckState::Checked(CheckFamily::YesNo { upper: true }) => "Y",
            CheckState::Unchecked(CheckFamily::YesNo { upper: true }) => "N",
            CheckState::Checked(CheckFamily::YesNo { upper: false }) => "y",
            CheckState::Unchecked(CheckFamily::YesNo { upper: false }) => "n",
        };
        Primitive::string(text)
    }
}

fn resolve(raw: &str, tri_state: bool) -> CheckState {
    let trimmed = raw.trim();
    let upper = trimmed.chars().all(|c| c.is_ascii_uppercase());
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => CheckState::Checked(CheckFamily::Bool),
        "false" => CheckState::Unchecked(CheckFamily::Bool),
        "y" => CheckState::Checked(CheckFamily::YesNo { upper }),
        "n" => CheckState::Unchecked(CheckFamily::YesNo { upper }),
        _ if tri_state => CheckState::Indeterminate,
        _ => CheckState::Unchecked(CheckFamily::Bool),
    }
}
