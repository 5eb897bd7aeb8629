// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Hotkey conflict detection and committing bindings to a registrar.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::binding::{Chord, HotkeyBinding, Scope};
use super::{ButtonId, HotkeyError};

/// The hotkeys held by one button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeySlots {
    pub local: Option<HotkeyBinding>,
    pub global: Option<HotkeyBinding>,
}

impl HotkeySlots {
    pub fn new(local: Option<HotkeyBinding>, global: Option<HotkeyBinding>) -> HotkeySlots {
        HotkeySlots { local, global }
    }

    /// The binding in the given slot.
    pub fn get(&self, slot: Scope) -> Option<&HotkeyBinding> {
        match slot {
            Scope::Local => self.local.as_ref(),
            Scope::Global => self.global.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: Scope) -> &mut Option<HotkeyBinding> {
        match slot {
            Scope::Local => &mut self.local,
            Scope::Global => &mut self.global,
        }
    }

    /// The bindings that are set, local first.
    pub fn iter(&self) -> impl Iterator<Item = &HotkeyBinding> {
        self.local.iter().chain(self.global.iter())
    }

    /// Replaces both slots with the candidates, registering each with the registrar.
    ///
    /// Each slot is committed on its own: the old binding is unregistered, then the candidate is
    /// registered. If registration fails the slot is left empty and the error is returned
    /// alongside any error from the other slot.
    pub fn commit(
        &mut self,
        registrar: &dyn HotkeyRegistrar,
        owner: ButtonId,
        local: Option<HotkeyBinding>,
        global: Option<HotkeyBinding>,
    ) -> Vec<HotkeyError> {
        [(Scope::Local, local), (Scope::Global, global)]
            .into_iter()
            .filter_map(|(slot, candidate)| {
                self.commit_slot(registrar, owner, slot, candidate).err()
            })
            .collect()
    }

    /// Commits a single slot.
    pub fn commit_slot(
        &mut self,
        registrar: &dyn HotkeyRegistrar,
        owner: ButtonId,
        slot: Scope,
        candidate: Option<HotkeyBinding>,
    ) -> Result<(), HotkeyError> {
        let current = self.slot_mut(slot);
        if let Some(old) = current.take() {
            registrar.unregister(owner, &old);
        }

        let Some(candidate) = candidate else {
            return Ok(());
        };
        let candidate = candidate.with_scope(slot);
        match registrar.register(owner, &candidate) {
            Ok(()) => {
                debug!(owner, slot = %slot, hotkey = %candidate, "Committed hotkey.");
                *current = Some(candidate);
                Ok(())
            }
            Err(e) => {
                warn!(owner, slot = %slot, hotkey = %candidate, err = %e, "Hotkey not committed.");
                Err(e)
            }
        }
    }

    /// Unregisters both slots and leaves them empty.
    pub fn clear(&mut self, registrar: &dyn HotkeyRegistrar, owner: ButtonId) {
        for slot in [Scope::Local, Scope::Global] {
            if let Some(old) = self.slot_mut(slot).take() {
                registrar.unregister(owner, &old);
            }
        }
    }
}

/// Another button's hotkeys, as seen by the validator.
#[derive(Debug, Clone)]
pub struct OtherButton {
    pub id: ButtonId,
    pub name: String,
    pub hotkeys: HotkeySlots,
}

/// One reason a candidate can't be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The candidate local and global bindings are the same chord.
    SelfConflict { chord: Chord },
    /// A candidate uses a chord another button already holds.
    Taken {
        /// Which candidate conflicts.
        candidate: Scope,
        owner: ButtonId,
        owner_name: String,
        /// Which of the other button's slots holds the chord.
        slot: Scope,
        binding: HotkeyBinding,
    },
}

impl Conflict {
    /// True if the conflict prevents the candidate in the given slot from being committed.
    pub fn blocks(&self, slot: Scope) -> bool {
        match self {
            Conflict::SelfConflict { .. } => true,
            Conflict::Taken { candidate, .. } => *candidate == slot,
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::SelfConflict { chord } => {
                write!(f, "{} is used as both the local and global hotkey", chord)
            }
            Conflict::Taken {
                candidate,
                owner_name,
                slot,
                binding,
                ..
            } => write!(
                f,
                "{} hotkey {} is already the {} hotkey of \"{}\"",
                candidate, binding, slot, owner_name
            ),
        }
    }
}

/// Everything wrong with a candidate pair of bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter()
    }

    pub fn has_self_conflict(&self) -> bool {
        self.conflicts
            .iter()
            .any(|conflict| matches!(conflict, Conflict::SelfConflict { .. }))
    }

    /// True if the candidate in the given slot can't be committed.
    pub fn blocks(&self, slot: Scope) -> bool {
        self.conflicts.iter().any(|conflict| conflict.blocks(slot))
    }
}

impl IntoIterator for ConflictReport {
    type Item = Conflict;
    type IntoIter = std::vec::IntoIter<Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.conflicts.into_iter()
    }
}

/// Checks a candidate pair of bindings for `owner` against every other button.
///
/// Scope plays no part in the comparison: a local candidate conflicts with another button's
/// global binding on the same chord and vice versa. Entries for `owner` itself in `others` are
/// skipped.
pub fn validate(
    local: Option<&HotkeyBinding>,
    global: Option<&HotkeyBinding>,
    owner: ButtonId,
    others: &[OtherButton],
) -> ConflictReport {
    let mut conflicts = Vec::new();

    if let (Some(local), Some(global)) = (local, global) {
        if local.same_chord(global) {
            conflicts.push(Conflict::SelfConflict {
                chord: local.chord(),
            });
        }
    }

    for (candidate_slot, candidate) in [(Scope::Local, local), (Scope::Global, global)] {
        let Some(candidate) = candidate else {
            continue;
        };
        for other in others.iter().filter(|other| other.id != owner) {
            for slot in [Scope::Local, Scope::Global] {
                if let Some(binding) = other.hotkeys.get(slot) {
                    if candidate.same_chord(binding) {
                        conflicts.push(Conflict::Taken {
                            candidate: candidate_slot,
                            owner: other.id,
                            owner_name: other.name.clone(),
                            slot,
                            binding: *binding,
                        });
                    }
                }
            }
        }
    }

    ConflictReport { conflicts }
}

/// Registers hotkeys with whatever delivers key events, usually the operating system.
pub trait HotkeyRegistrar: Send + Sync {
    /// Claims the binding's chord for the owner.
    fn register(&self, owner: ButtonId, binding: &HotkeyBinding) -> Result<(), HotkeyError>;

    /// Releases the binding. Releasing a binding that isn't held does nothing.
    fn unregister(&self, owner: ButtonId, binding: &HotkeyBinding);
}

/// An in-process registrar. Refuses a chord that another owner already holds in either scope.
#[derive(Default)]
pub struct MemoryRegistrar {
    held: Mutex<HashMap<(Chord, Scope), ButtonId>>,
}

impl MemoryRegistrar {
    pub fn new() -> MemoryRegistrar {
        MemoryRegistrar::default()
    }

    /// The owner currently holding the chord.
    pub fn holder(&self, chord: &Chord) -> Option<ButtonId> {
        let held = self.held.lock();
        [Scope::Local, Scope::Global]
            .into_iter()
            .find_map(|scope| held.get(&(*chord, scope)).copied())
    }

    pub fn len(&self) -> usize {
        self.held.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.lock().is_empty()
    }
}

impl HotkeyRegistrar for MemoryRegistrar {
    fn register(&self, owner: ButtonId, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        let mut held = self.held.lock();
        let chord = binding.chord();
        for scope in [Scope::Local, Scope::Global] {
            if let Some(holder) = held.get(&(chord, scope)).copied() {
                if holder != owner {
                    return Err(HotkeyError::RegistrationFailed {
                        binding: binding.to_string(),
                        reason: format!("already held by button {}", holder),
                    });
                }
            }
        }
        held.insert((chord, binding.scope()), owner);
        Ok(())
    }

    fn unregister(&self, owner: ButtonId, binding: &HotkeyBinding) {
        let mut held = self.held.lock();
        let key = (binding.chord(), binding.scope());
        if held.get(&key) == Some(&owner) {
            held.remove(&key);
        }
    }
}
