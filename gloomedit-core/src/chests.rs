//! The looted-chest set: an array of `TT_Campaign_Chest_NN` string
//! records reached through the graph. Chests are only ever added;
//! marking one looted is a set union re-encoded with fresh contiguous
//! object IDs from a fixed base.

use std::collections::BTreeSet;

use crate::deck::{self, DeckItem};
use crate::graph::Graph;
use crate::pattern::{Pat, Pattern, Span};
use crate::{EditError, Result, SaveData};

const CHEST_DECK_SLOT: &str = "AlreadyRewardedChestTreasureTableIDs";
const CHEST_PAYLOAD_PREFIX: &str = "TT_Campaign_Chest_";
/// The game allocates chest record IDs from this base, independent of
/// the rest of the object-ID space.
const CHEST_BASE_OBJECT_ID: u32 = 3_000_000;

#[derive(Debug)]
pub struct ChestToggle {
    pub newly_looted: Vec<u32>,
    pub looted: Vec<u32>,
}

fn chest_number(item: &DeckItem) -> Option<u32> {
    let text = String::from_utf8_lossy(&item.payload);
    text.strip_prefix(CHEST_PAYLOAD_PREFIX)?.parse().ok()
}

impl SaveData {
    fn locate_chest_deck(&self, graph: &Graph) -> Result<(Vec<DeckItem>, Span, [u8; 5])> {
        let (tag, object_id) = graph.resolve_slot(CHEST_DECK_SLOT)?;
        let mut anchor = [0u8; 5];
        anchor[0] = tag;
        anchor[1..].copy_from_slice(&object_id.to_le_bytes());

        let pattern = Pattern::new(vec![Pat::lit(anchor)]);
        let m = pattern
            .find_from(self.bytes(), 0)
            .ok_or_else(|| EditError::NotFound("looted chest deck".to_string()))?;
        let (decoded, end) = deck::decode(self.bytes(), m.span.start + 5)?;
        Ok((decoded.items, Span::new(m.span.start, end), anchor))
    }

    /// Chest numbers currently marked looted, in deck order.
    pub fn read_looted_chests(&self, graph: &Graph) -> Result<Vec<u32>> {
        let (items, _, _) = self.locate_chest_deck(graph)?;
        Ok(items.iter().filter_map(chest_number).collect())
    }

    /// Marks the given chests looted. The new set is the sorted union
    /// of the current chests and the request; the deck is re-encoded
    /// with a power-of-two capacity and contiguous object IDs.
    pub fn loot_chests(&mut self, graph: &Graph, chests: &[u32]) -> Result<ChestToggle> {
        let (items, span, anchor) = self.locate_chest_deck(graph)?;
        let current: BTreeSet<u32> = items.iter().filter_map(chest_number).collect();
        let all: BTreeSet<u32> = current.union(&chests.iter().copied().collect()).copied().collect();
        let newly_looted: Vec<u32> = all.difference(&current).copied().collect();

        let new_items: Vec<DeckItem> = all
            .iter()
            .enumerate()
            .map(|(i, number)| {
                DeckItem::new(
                    CHEST_BASE_OBJECT_ID + i as u32,
                    format!("{CHEST_PAYLOAD_PREFIX}{number:02}"),
                )
            })
            .collect();

        let mut replacement = anchor.to_vec();
        replacement.extend(deck::encode(
            "looted chest deck",
            deck::capacity_for(new_items.len()),
            &new_items,
        )?);
        self.replace_span(span, &replacement)?;

        Ok(ChestToggle {
            newly_looted,
            looted: all.into_iter().collect(),
        })
    }
}
