//! Per-character scalar fields. A character's value block sits between
//! the `ID` suffix after their name record and a double-newline
//! terminator; the interesting integers live at fixed offsets from the
//! block's edges.

use crate::pattern::{Pat, Pattern, Span};
use crate::{EditError, Result, SaveData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterValues {
    pub gold: u32,
    pub experience: u32,
    pub level: u32,
    pub perk_points: u32,
    pub perk_checks: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterUpdate {
    pub gold: Option<u32>,
    pub experience: Option<u32>,
    pub perk_points: Option<u32>,
    pub perk_checks: Option<u32>,
}

impl CharacterUpdate {
    pub fn is_empty(&self) -> bool {
        self.gold.is_none()
            && self.experience.is_none()
            && self.perk_points.is_none()
            && self.perk_checks.is_none()
    }
}

impl SaveData {
    /// The value block following the character's name. Needs at least
    /// the leading three and trailing three integers, which overlap for
    /// the shortest observed blocks.
    fn locate_character_block(&self, name: &str) -> Result<Span> {
        let pattern = Pattern::new(vec![
            Pat::lit(name.as_bytes()),
            Pat::Any { max: 1024 },
            Pat::lit(b"ID"),
            Pat::Any { max: 4096 },
            Pat::lit(b"\n\n"),
        ]);
        let m = pattern
            .find_from(self.bytes(), 0)
            .ok_or_else(|| EditError::NotFound(format!("character {name}")))?;
        let block = m.token_spans[3];
        if block.len() < 12 {
            return Err(EditError::OutOfRange {
                offset: block.start + 12,
                len: block.end,
            });
        }
        Ok(block)
    }

    pub fn character_values(&self, name: &str) -> Result<CharacterValues> {
        let block = self.locate_character_block(name)?;
        Ok(CharacterValues {
            gold: self.read_u32(block.start)?,
            experience: self.read_u32(block.start + 4)?,
            level: self.read_u32(block.start + 8)?,
            perk_points: self.read_u32(block.end - 12)?,
            perk_checks: self.read_u32(block.end - 8)?,
        })
    }

    /// Writes only the fields the update names; everything else in the
    /// block keeps its bytes. Returns the values before and after.
    pub fn update_character(
        &mut self,
        name: &str,
        update: CharacterUpdate,
    ) -> Result<(CharacterValues, CharacterValues)> {
        let before = self.character_values(name)?;
        // All four writes are in-place 4-byte splices, so the block's
        // position is stable across them.
        let block = self.locate_character_block(name)?;
        if let Some(gold) = update.gold {
            self.write_u32(block.start, gold)?;
        }
        if let Some(experience) = update.experience {
            self.write_u32(block.start + 4, experience)?;
        }
        if let Some(perk_points) = update.perk_points {
            self.write_u32(block.end - 12, perk_points)?;
        }
        if let Some(perk_checks) = update.perk_checks {
            self.write_u32(block.end - 8, perk_checks)?;
        }
        let after = self.character_values(name)?;
        Ok((before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character_block(name: &str, values: CharacterValues) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b"_someClassID");
        out.extend_from_slice(&values.gold.to_le_bytes());
        out.extend_from_slice(&values.experience.to_le_bytes());
        out.extend_from_slice(&values.level.to_le_bytes());
        out.extend_from_slice(&[0x01; 8]); // unrelated fields
        out.extend_from_slice(&values.perk_points.to_le_bytes());
        out.extend_from_slice(&values.perk_checks.to_le_bytes());
        out.extend_from_slice(&[0x01; 4]);
        out.extend_from_slice(b"\n\n");
        out
    }

    fn sample_values() -> CharacterValues {
        CharacterValues {
            gold: 30,
            experience: 125,
            level: 3,
            perk_points: 1,
            perk_checks: 2,
        }
    }

    fn sample_save() -> SaveData {
        let mut bytes = b"PREFIX".to_vec();
        bytes.extend_from_slice(&character_block("Sol Goodman", sample_values()));
        bytes.extend_from_slice(b"SUFFIX");
        SaveData::from_bytes(bytes)
    }

    #[test]
    fn reads_all_five_values() {
        let save = sample_save();
        assert_eq!(save.character_values("Sol Goodman").unwrap(), sample_values());
    }

    #[test]
    fn unknown_character_is_not_found() {
        let save = sample_save();
        assert!(matches!(
            save.character_values("Nobody"),
            Err(EditError::NotFound(_))
        ));
    }

    #[test]
    fn updates_only_the_named_fields() {
        let mut save = sample_save();
        let (before, after) = save
            .update_character(
                "Sol Goodman",
                CharacterUpdate {
                    gold: Some(500),
                    perk_checks: Some(9),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(before, sample_values());
        assert_eq!(after.gold, 500);
        assert_eq!(after.perk_checks, 9);
        assert_eq!(after.experience, before.experience);
        assert_eq!(after.level, before.level);
        assert_eq!(after.perk_points, before.perk_points);
    }

    #[test]
    fn writing_current_values_is_byte_idempotent() {
        let mut save = sample_save();
        let values = save.character_values("Sol Goodman").unwrap();
        let before = save.bytes().to_vec();
        save.update_character(
            "Sol Goodman",
            CharacterUpdate {
                gold: Some(values.gold),
                experience: Some(values.experience),
                perk_points: Some(values.perk_points),
                perk_checks: Some(values.perk_checks),
            },
        )
        .unwrap();
        assert_eq!(save.bytes(), before.as_slice());
    }

    #[test]
    fn update_touches_nothing_outside_the_block() {
        let mut save = sample_save();
        save.update_character(
            "Sol Goodman",
            CharacterUpdate {
                gold: Some(12345),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(save.bytes().starts_with(b"PREFIX"));
        assert!(save.bytes().ends_with(b"SUFFIX"));
    }
}
