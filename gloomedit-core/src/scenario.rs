//! Scenario status field: a 4-byte code at a fixed offset from the
//! `Quest_Campaign_NNN` anchor, plus the small state machine deciding
//! which statuses a user is allowed to overwrite.

use std::collections::HashSet;

use crate::pattern::{ByteClass, Pat, Pattern, Span};
use crate::records;
use crate::{EditError, Result, SaveData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStatus {
    None,
    Locked,
    Unlocked,
    InProgress,
    Completed,
    Blocked,
    InProgressCasual,
}

impl ScenarioStatus {
    pub fn from_code(code: u32) -> Option<ScenarioStatus> {
        use ScenarioStatus::*;
        Some(match code {
            0 => None,
            1 => Locked,
            2 => Unlocked,
            3 => InProgress,
            4 => Completed,
            5 => Blocked,
            6 => InProgressCasual,
            _ => return Option::None,
        })
    }

    pub fn code(self) -> u32 {
        use ScenarioStatus::*;
        match self {
            None => 0,
            Locked => 1,
            Unlocked => 2,
            InProgress => 3,
            Completed => 4,
            Blocked => 5,
            InProgressCasual => 6,
        }
    }

    pub fn from_name(name: &str) -> Option<ScenarioStatus> {
        use ScenarioStatus::*;
        Some(match name {
            "None" => None,
            "Locked" => Locked,
            "Unlocked" => Unlocked,
            "InProgress" => InProgress,
            "Completed" => Completed,
            "Blocked" => Blocked,
            "InProgressCasual" => InProgressCasual,
            _ => return Option::None,
        })
    }

    pub fn name(self) -> &'static str {
        use ScenarioStatus::*;
        match self {
            None => "None",
            Locked => "Locked",
            Unlocked => "Unlocked",
            InProgress => "InProgress",
            Completed => "Completed",
            Blocked => "Blocked",
            InProgressCasual => "InProgressCasual",
        }
    }

    /// Only these states may be overwritten; the in-progress and
    /// completed states belong to the game, not the editor.
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            ScenarioStatus::Locked | ScenarioStatus::Unlocked | ScenarioStatus::Blocked
        )
    }

    /// Display order for the overview report.
    pub fn all() -> [ScenarioStatus; 7] {
        use ScenarioStatus::*;
        [
            Completed,
            InProgress,
            InProgressCasual,
            Unlocked,
            Locked,
            Blocked,
            None,
        ]
    }
}

/// Outcome of a status write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Applied {
        from: ScenarioStatus,
        to: ScenarioStatus,
    },
    /// The current state is not user-transitionable; nothing was
    /// written.
    Rejected { current: ScenarioStatus },
}

impl SaveData {
    /// Byte offset of the scenario's 4-byte status word. The record is
    /// a length-prefixed `Quest_Campaign_NNN` string; the status is the
    /// last four bytes before the field terminator. Scenario 19's
    /// record carries one extra terminator inside it.
    fn locate_scenario_status(&self, number: u32) -> Result<usize> {
        let mut tokens = vec![
            Pat::lit(b"\x12"),
            Pat::lit(format!("Quest_Campaign_{number:03}")),
            Pat::Any { max: 256 },
            Pat::lit(b"\t"),
        ];
        if number == 19 {
            tokens.push(Pat::Any { max: 256 });
            tokens.push(Pat::lit(b"\t"));
        }
        let pattern = Pattern::new(tokens);
        let m = pattern
            .find_from(self.bytes(), 0)
            .ok_or_else(|| EditError::NotFound(format!("scenario {number}")))?;
        Ok(m.span.end - 5)
    }

    pub fn scenario_status(&self, number: u32) -> Result<ScenarioStatus> {
        let offset = self.locate_scenario_status(number)?;
        let code = self.read_u32(offset)?;
        ScenarioStatus::from_code(code)
            .ok_or_else(|| EditError::NotFound(format!("scenario {number} status")))
    }

    /// Writes a new status if the current one permits it. A rejection
    /// is reported, not raised: the save is fine, the request just is
    /// not allowed.
    pub fn set_scenario_status(
        &mut self,
        number: u32,
        target: ScenarioStatus,
    ) -> Result<StatusChange> {
        let offset = self.locate_scenario_status(number)?;
        let code = self.read_u32(offset)?;
        let current = ScenarioStatus::from_code(code)
            .ok_or_else(|| EditError::NotFound(format!("scenario {number} status")))?;
        if !current.is_editable() {
            return Ok(StatusChange::Rejected { current });
        }
        self.write_u32(offset, target.code())?;
        Ok(StatusChange::Applied {
            from: current,
            to: target,
        })
    }

    /// Every scenario record in the buffer with its status, first
    /// occurrence per scenario number, in buffer order. The pattern
    /// requires the status word's three high bytes to be zero, which
    /// every valid code satisfies.
    pub fn scenario_overview(&self) -> Vec<(u32, ScenarioStatus)> {
        let pattern = Pattern::new(vec![
            Pat::lit(b"\x12Quest_Campaign_"),
            Pat::Run {
                class: ByteClass::Digit,
                min: 3,
            },
            Pat::Any { max: 256 },
            Pat::lit(b"\x00\x00\x00\t"),
        ]);

        let mut seen: HashSet<u32> = HashSet::new();
        let mut out = Vec::new();
        let mut from = 0usize;
        while let Some(m) = pattern.find(self.bytes(), Span::new(from, self.len())) {
            from = m.span.end;
            let digits = m.token_spans[1].slice(self.bytes());
            let Ok(number) = String::from_utf8_lossy(digits).parse::<u32>() else {
                continue;
            };
            if !seen.insert(number) {
                continue;
            }
            let code = match records::read_u32(self.bytes(), m.span.end - 5) {
                Ok(code) => code,
                Err(_) => continue,
            };
            if let Some(status) = ScenarioStatus::from_code(code) {
                out.push((number, status));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_record(number: u32, code: u32) -> Vec<u8> {
        let mut out = vec![0x12];
        out.extend_from_slice(format!("Quest_Campaign_{number:03}").as_bytes());
        out.extend_from_slice(&[0x02, 0x01]); // unrelated record bytes
        out.extend_from_slice(&code.to_le_bytes());
        out.push(b'\t');
        out
    }

    fn save_with(records: &[(u32, u32)]) -> SaveData {
        let mut bytes = b"header".to_vec();
        for &(number, code) in records {
            bytes.extend_from_slice(&scenario_record(number, code));
        }
        bytes.extend_from_slice(b"trailer");
        SaveData::from_bytes(bytes)
    }

    #[test]
    fn editable_states_are_exactly_locked_unlocked_blocked() {
        assert!(ScenarioStatus::Locked.is_editable());
        assert!(ScenarioStatus::Unlocked.is_editable());
        assert!(ScenarioStatus::Blocked.is_editable());
        assert!(!ScenarioStatus::InProgress.is_editable());
        assert!(!ScenarioStatus::Completed.is_editable());
        assert!(!ScenarioStatus::InProgressCasual.is_editable());
        assert!(!ScenarioStatus::None.is_editable());
    }

    #[test]
    fn unlocked_scenario_can_be_completed() {
        let mut save = save_with(&[(2, ScenarioStatus::Unlocked.code())]);
        let change = save
            .set_scenario_status(2, ScenarioStatus::Completed)
            .unwrap();
        assert_eq!(
            change,
            StatusChange::Applied {
                from: ScenarioStatus::Unlocked,
                to: ScenarioStatus::Completed,
            }
        );
        assert_eq!(save.scenario_status(2).unwrap(), ScenarioStatus::Completed);
    }

    #[test]
    fn completed_scenario_rejects_changes() {
        let mut save = save_with(&[(2, ScenarioStatus::Completed.code())]);
        let before = save.bytes().to_vec();
        let change = save
            .set_scenario_status(2, ScenarioStatus::Unlocked)
            .unwrap();
        assert_eq!(
            change,
            StatusChange::Rejected {
                current: ScenarioStatus::Completed,
            }
        );
        assert_eq!(save.bytes(), before.as_slice());
    }

    #[test]
    fn missing_scenario_is_not_found() {
        let save = save_with(&[(2, 1)]);
        assert!(matches!(
            save.scenario_status(57),
            Err(EditError::NotFound(_))
        ));
    }

    #[test]
    fn overview_groups_and_deduplicates() {
        let save = save_with(&[(1, 4), (2, 2), (1, 1), (3, 0)]);
        let overview = save.scenario_overview();
        assert_eq!(
            overview,
            vec![
                (1, ScenarioStatus::Completed),
                (2, ScenarioStatus::Unlocked),
                (3, ScenarioStatus::None),
            ]
        );
    }

    #[test]
    fn status_write_is_byte_idempotent() {
        let mut save = save_with(&[(5, ScenarioStatus::Unlocked.code())]);
        let before = save.bytes().to_vec();
        save.set_scenario_status(5, ScenarioStatus::Unlocked).unwrap();
        assert_eq!(save.bytes(), before.as_slice());
    }
}
