//! Ammo types and their damage / impact multipliers.

use serde::{Deserialize, Serialize};

/// Number of ammo types, lettered A to Z.
pub const AMMO_TYPE_COUNT: usize = 26;

/// One of 26 ammo (and damage) types, `A` = 0 through `Z` = 25.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AmmoType(pub u8);

impl AmmoType {
    pub const A: AmmoType = AmmoType(0);

    /// Parse an ammo letter (either case).
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Some(AmmoType(upper as u8 - b'A'))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Display letter, or `'?'` for an out-of-range value.
    pub fn letter(self) -> char {
        if self.index() < AMMO_TYPE_COUNT {
            (b'A' + self.0) as char
        } else {
            '?'
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmmoProfile {
    pub damage_multiplier: f32,
    pub impact_multiplier: f32,
}

impl Default for AmmoProfile {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            impact_multiplier: 1.0,
        }
    }
}

/// Multipliers for every ammo type. Lookups outside the table give 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoTable {
    profiles: [AmmoProfile; AMMO_TYPE_COUNT],
}

impl Default for AmmoTable {
    fn default() -> Self {
        Self {
            profiles: [AmmoProfile::default(); AMMO_TYPE_COUNT],
        }
    }
}

impl AmmoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Neutral table with the given entries replaced.
    pub fn from_overrides(overrides: &[(AmmoType, AmmoProfile)]) -> Self {
        let mut table = Self::default();
        for (ammo_type, profile) in overrides {
            table.set(*ammo_type, *profile);
        }
        table
    }

    /// Replace one entry. Out-of-range types are logged and ignored.
    pub fn set(&mut self, ammo_type: AmmoType, profile: AmmoProfile) {
        match self.profiles.get_mut(ammo_type.index()) {
            Some(slot) => *slot = profile,
            None => log::warn!("Ignoring ammo profile for out-of-range type {}", ammo_type.0),
        }
    }

    pub fn profile(&self, ammo_type: AmmoType) -> AmmoProfile {
        self.profiles
            .get(ammo_type.index())
            .copied()
            .unwrap_or_default()
    }

    pub fn get_ammo_damage_multiplier(&self, index: usize) -> f32 {
        self.profiles.get(index).map_or(1.0, |p| p.damage_multiplier)
    }

    pub fn get_ammo_impact_multiplier(&self, index: usize) -> f32 {
        self.profiles.get(index).map_or(1.0, |p| p.impact_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_round_trip() {
        assert_eq!(AmmoType::from_letter('a'), Some(AmmoType(0)));
        assert_eq!(AmmoType::from_letter('Z'), Some(AmmoType(25)));
        assert_eq!(AmmoType::from_letter('3'), None);
        assert_eq!(AmmoType(2).letter(), 'C');
        assert_eq!(AmmoType(40).letter(), '?');
    }

    #[test]
    fn out_of_range_multiplier_is_neutral() {
        let table = AmmoTable::from_overrides(&[(
            AmmoType(3),
            AmmoProfile {
                damage_multiplier: 2.5,
                impact_multiplier: 0.5,
            },
        )]);
        assert_eq!(table.get_ammo_damage_multiplier(26), 1.0);
        assert_eq!(table.get_ammo_impact_multiplier(usize::MAX), 1.0);
        assert_eq!(table.get_ammo_damage_multiplier(3), 2.5);
        assert_eq!(table.get_ammo_impact_multiplier(3), 0.5);
        assert_eq!(table.get_ammo_damage_multiplier(0), 1.0);
    }

    #[test]
    fn set_out_of_range_is_ignored() {
        let mut table = AmmoTable::new();
        table.set(
            AmmoType(200),
            AmmoProfile {
                damage_multiplier: 9.0,
                impact_multiplier: 9.0,
            },
        );
        assert_eq!(table, AmmoTable::default());
        assert_eq!(table.profile(AmmoType(200)), AmmoProfile::default());
    }
}
