//! Campaign-wide scalars: the donation total after the `GoldDonated`
//! label, and prosperity/reputation inside the tab-delimited block
//! after the party record's class name.

use crate::pattern::{Pat, Pattern, Span};
use crate::{EditError, Result, SaveData};

const PARTY_ANCHOR: &[u8] = b"MapRuleLibrary.Party.CMapCharacter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignValues {
    pub gold_donated: u32,
    pub prosperity: u32,
    pub reputation: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CampaignUpdate {
    pub gold_donated: Option<u32>,
    pub prosperity: Option<u32>,
    pub reputation: Option<u32>,
}

impl CampaignUpdate {
    pub fn is_empty(&self) -> bool {
        self.gold_donated.is_none() && self.prosperity.is_none() && self.reputation.is_none()
    }
}

impl SaveData {
    /// Offset of the donation counter: six bytes of record framing after
    /// the label, then the integer.
    fn locate_gold_donated(&self) -> Result<usize> {
        let pattern = Pattern::new(vec![Pat::lit(b"GoldDonated")]);
        let m = pattern
            .find_from(self.bytes(), 0)
            .ok_or_else(|| EditError::NotFound("GoldDonated".to_string()))?;
        Ok(m.span.end + 6)
    }

    /// The second tab-delimited field after the party class name;
    /// prosperity and reputation are its middle and trailing integers.
    fn locate_party_block(&self) -> Result<Span> {
        let pattern = Pattern::new(vec![
            Pat::lit(PARTY_ANCHOR),
            Pat::Any { max: 256 },
            Pat::lit(b"\t"),
            Pat::Any { max: 64 },
            Pat::lit(b"\t"),
        ]);
        let m = pattern
            .find_from(self.bytes(), 0)
            .ok_or_else(|| EditError::NotFound("campaign party record".to_string()))?;
        Ok(m.token_spans[3])
    }

    pub fn campaign_values(&self) -> Result<CampaignValues> {
        let donated_at = self.locate_gold_donated()?;
        let block = self.locate_party_block()?;
        Ok(CampaignValues {
            gold_donated: self.read_u32(donated_at)?,
            prosperity: self.read_u32(block.start + 4)?,
            reputation: self.read_u32(block.start + 8)?,
        })
    }

    pub fn update_campaign(
        &mut self,
        update: CampaignUpdate,
    ) -> Result<(CampaignValues, CampaignValues)> {
        let before = self.campaign_values()?;
        if let Some(donated) = update.gold_donated {
            let at = self.locate_gold_donated()?;
            self.write_u32(at, donated)?;
        }
        // Same-size writes, so the block does not move between fields.
        if update.prosperity.is_some() || update.reputation.is_some() {
            let block = self.locate_party_block()?;
            if let Some(prosperity) = update.prosperity {
                self.write_u32(block.start + 4, prosperity)?;
            }
            if let Some(reputation) = update.reputation {
                self.write_u32(block.start + 8, reputation)?;
            }
        }
        let after = self.campaign_values()?;
        Ok((before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_save() -> SaveData {
        let mut bytes = b"....GoldDonated".to_vec();
        bytes.extend_from_slice(&[0x08, 0x01, 0x02, 0x03, 0x04, 0x05]); // framing
        bytes.extend_from_slice(&120u32.to_le_bytes());
        bytes.extend_from_slice(b"....MapRuleLibrary.Party.CMapCharacter");
        bytes.extend_from_slice(&[0x02, 0x01]);
        bytes.push(b'\t');
        bytes.extend_from_slice(&7u32.to_le_bytes()); // leading field
        bytes.extend_from_slice(&4u32.to_le_bytes()); // prosperity
        bytes.extend_from_slice(&2u32.to_le_bytes()); // reputation
        bytes.push(b'\t');
        bytes.extend_from_slice(b"....");
        SaveData::from_bytes(bytes)
    }

    #[test]
    fn reads_campaign_values() {
        let save = sample_save();
        assert_eq!(
            save.campaign_values().unwrap(),
            CampaignValues {
                gold_donated: 120,
                prosperity: 4,
                reputation: 2,
            }
        );
    }

    #[test]
    fn updates_each_field_independently() {
        let mut save = sample_save();
        let (before, after) = save
            .update_campaign(CampaignUpdate {
                prosperity: Some(6),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(before.prosperity, 4);
        assert_eq!(after.prosperity, 6);
        assert_eq!(after.gold_donated, before.gold_donated);
        assert_eq!(after.reputation, before.reputation);
    }

    #[test]
    fn full_update_round_trips() {
        let mut save = sample_save();
        save.update_campaign(CampaignUpdate {
            gold_donated: Some(1000),
            prosperity: Some(9),
            reputation: Some(20),
        })
        .unwrap();
        assert_eq!(
            save.campaign_values().unwrap(),
            CampaignValues {
                gold_donated: 1000,
                prosperity: 9,
                reputation: 20,
            }
        );
    }

    #[test]
    fn missing_anchor_is_not_found() {
        let save = SaveData::from_bytes(b"no campaign here".to_vec());
        assert!(matches!(
            save.campaign_values(),
            Err(EditError::NotFound(_))
        ));
    }
}
