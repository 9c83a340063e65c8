//! The personal quest deck: a fixed 25-slot array reached through the
//! decoded graph, holding `PERSONALQUEST_*` string records. Removal and
//! prioritisation are pure reorderings of the decoded items; object IDs
//! and payloads are reused, never renumbered.

use crate::deck::{self, DeckItem};
use crate::graph::Graph;
use crate::pattern::{Pat, Pattern, Span};
use crate::{EditError, Result, SaveData};

const QUEST_DECK_SLOT: &str = "PersonalQuestDeck";
/// The game always serializes the quest deck with this capacity.
const QUEST_DECK_CAPACITY: u32 = 25;
/// Quest payloads start with `PERSONALQUEST_` (or the mixed-case
/// variant of the same length); the remainder names the quest.
const QUEST_PREFIX_LEN: usize = 14;

#[derive(Debug)]
pub struct QuestRemoval {
    pub removed: Vec<String>,
    pub not_found: Vec<String>,
    pub order: Vec<String>,
}

fn quest_key(item: &DeckItem) -> String {
    let payload = &item.payload;
    let tail = payload.get(QUEST_PREFIX_LEN..).unwrap_or(&[]);
    String::from_utf8_lossy(tail).into_owned()
}

impl SaveData {
    /// Resolves the deck's array record through the graph and parses
    /// its span in the buffer. The span covers the record tag, object
    /// ID, capacity and items, so a replacement must re-emit all of
    /// them.
    fn locate_quest_deck(&self, graph: &Graph) -> Result<(Vec<DeckItem>, Span, [u8; 5])> {
        let (tag, object_id) = graph.resolve_slot(QUEST_DECK_SLOT)?;
        let mut anchor = [0u8; 5];
        anchor[0] = tag;
        anchor[1..].copy_from_slice(&object_id.to_le_bytes());

        let pattern = Pattern::new(vec![Pat::lit(anchor)]);
        let m = pattern
            .find_from(self.bytes(), 0)
            .ok_or_else(|| EditError::NotFound("personal quest deck".to_string()))?;
        let (decoded, end) = deck::decode(self.bytes(), m.span.start + 5)?;
        Ok((decoded.items, Span::new(m.span.start, end), anchor))
    }

    fn splice_quest_deck(
        &mut self,
        items: &[DeckItem],
        span: Span,
        anchor: [u8; 5],
    ) -> Result<()> {
        let mut replacement = anchor.to_vec();
        replacement.extend(deck::encode(
            "personal quest deck",
            QUEST_DECK_CAPACITY,
            items,
        )?);
        self.replace_span(span, &replacement)
    }

    /// Quest names currently in the deck, in draw order.
    pub fn read_quests(&self, graph: &Graph) -> Result<Vec<String>> {
        let (items, _, _) = self.locate_quest_deck(graph)?;
        Ok(items.iter().map(quest_key).collect())
    }

    /// Drops the named quests from the deck. Unknown names are reported
    /// back rather than failing the whole edit.
    pub fn remove_quests(&mut self, graph: &Graph, quests: &[String]) -> Result<QuestRemoval> {
        let (items, span, anchor) = self.locate_quest_deck(graph)?;
        let mut removed = Vec::new();
        let mut not_found = Vec::new();
        let mut kept = items;
        for name in quests {
            let before = kept.len();
            kept.retain(|item| &quest_key(item) != name);
            if kept.len() < before {
                removed.push(name.clone());
            } else {
                not_found.push(name.clone());
            }
        }
        self.splice_quest_deck(&kept, span, anchor)?;
        let order = kept.iter().map(quest_key).collect();
        Ok(QuestRemoval {
            removed,
            not_found,
            order,
        })
    }

    /// Moves the named quests toward the front, interleaved with the
    /// deck's existing order: for each prioritized quest, one quest
    /// from the remaining order is dealt first, then the prioritized
    /// one. A name not in the deck fails the operation before any
    /// bytes change.
    pub fn prioritise_quests(&mut self, graph: &Graph, quests: &[String]) -> Result<Vec<String>> {
        let (items, span, anchor) = self.locate_quest_deck(graph)?;
        let mut remaining = items;
        let mut ordered: Vec<DeckItem> = Vec::with_capacity(remaining.len());
        for name in quests {
            let pos = remaining
                .iter()
                .position(|item| &quest_key(item) == name)
                .ok_or_else(|| EditError::NotFound(format!("personal quest {name}")))?;
            let prioritized = remaining.remove(pos);
            if !remaining.is_empty() {
                ordered.push(remaining.remove(0));
            }
            ordered.push(prioritized);
        }
        ordered.extend(remaining);

        self.splice_quest_deck(&ordered, span, anchor)?;
        Ok(ordered.iter().map(quest_key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{NULL_RUN_TAG, STRING_TAG};
    use serde_json::json;

    const DECK_OBJECT_ID: u32 = 42;

    fn quest_record(id: u32, name: &str) -> Vec<u8> {
        let payload = format!("PERSONALQUEST_{name}");
        let mut out = vec![STRING_TAG];
        out.extend_from_slice(&id.to_le_bytes());
        out.push(payload.len() as u8);
        out.extend_from_slice(payload.as_bytes());
        out
    }

    fn sample_graph() -> Graph {
        Graph::new(json!([[
            {
                "RecordTypeEnum": "ClassWithMembersAndTypes",
                "ClassInfo": {"ObjectId": 1, "MemberNames": ["PersonalQuestDeck"]},
                "Values": [{"IdRef": 40}]
            },
            {
                "RecordTypeEnum": "ClassWithId",
                "ObjectId": 40,
                "Values": [{"IdRef": 41}]
            },
            {
                "RecordTypeEnum": "ClassWithId",
                "ObjectId": 41,
                "Values": [{"IdRef": DECK_OBJECT_ID}]
            },
            {
                "RecordTypeEnum": "ArraySingleString",
                "ObjectId": DECK_OBJECT_ID,
                "Values": ["510", "512", "514"]
            }
        ]]))
    }

    fn sample_save() -> SaveData {
        let mut bytes = b"HEAD".to_vec();
        bytes.push(0x11); // ArraySingleString tag
        bytes.extend_from_slice(&DECK_OBJECT_ID.to_le_bytes());
        bytes.extend_from_slice(&QUEST_DECK_CAPACITY.to_le_bytes());
        for (i, name) in ["510", "512", "514"].iter().enumerate() {
            bytes.extend_from_slice(&quest_record(2000 + i as u32, name));
        }
        bytes.push(NULL_RUN_TAG);
        bytes.push(22);
        bytes.extend_from_slice(b"TAIL");
        SaveData::from_bytes(bytes)
    }

    #[test]
    fn reads_quests_in_deck_order() {
        let save = sample_save();
        let graph = sample_graph();
        assert_eq!(save.read_quests(&graph).unwrap(), ["510", "512", "514"]);
    }

    #[test]
    fn removal_keeps_remaining_ids_and_reports_unknowns() {
        let mut save = sample_save();
        let graph = sample_graph();
        let report = save
            .remove_quests(&graph, &["512".to_string(), "999".to_string()])
            .unwrap();
        assert_eq!(report.removed, ["512"]);
        assert_eq!(report.not_found, ["999"]);
        assert_eq!(report.order, ["510", "514"]);

        // Surviving items keep their original object IDs; the null run
        // now covers 23 free slots.
        let (deck, _) = deck::decode(save.bytes(), 4 + 5).unwrap();
        let ids: Vec<u32> = deck.items.iter().map(|i| i.object_id).collect();
        assert_eq!(ids, [2000, 2002]);
        assert_eq!(deck.capacity, QUEST_DECK_CAPACITY);
        assert!(save.bytes().starts_with(b"HEAD"));
        assert!(save.bytes().ends_with(b"TAIL"));
    }

    #[test]
    fn prioritise_interleaves_with_existing_order() {
        let mut save = sample_save();
        let graph = sample_graph();
        let order = save
            .prioritise_quests(&graph, &["514".to_string()])
            .unwrap();
        // One quest from the old front, then the prioritized one, then
        // the rest.
        assert_eq!(order, ["510", "514", "512"]);

        let (deck, _) = deck::decode(save.bytes(), 4 + 5).unwrap();
        let ids: Vec<u32> = deck.items.iter().map(|i| i.object_id).collect();
        assert_eq!(ids, [2000, 2002, 2001]);
    }

    #[test]
    fn prioritising_an_absent_quest_changes_nothing() {
        let mut save = sample_save();
        let graph = sample_graph();
        let before = save.bytes().to_vec();
        let err = save
            .prioritise_quests(&graph, &["999".to_string()])
            .unwrap_err();
        assert!(matches!(err, EditError::NotFound(_)));
        assert_eq!(save.bytes(), before.as_slice());
    }
}
