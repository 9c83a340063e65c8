//! City and road event decks. Each is a power-of-two-capacity array of
//! `Event_<Kind>_Campaign_<name>ID` string records, optionally followed
//! by an always-empty discard deck that must be re-emitted empty
//! whenever the primary deck is replaced.

use crate::deck::{self, DeckItem};
use crate::pattern::{Pat, Pattern, Span};
use crate::{EditError, Result, SaveData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDeckKind {
    City,
    Road,
}

impl EventDeckKind {
    fn capital(self) -> &'static str {
        match self {
            EventDeckKind::City => "City",
            EventDeckKind::Road => "Road",
        }
    }

    fn payload_prefix(self) -> String {
        format!("Event_{}_Campaign_", self.capital())
    }

    /// First literal of the structure following this deck's discard
    /// deck, used to measure whether a discard deck is present at all.
    fn next_anchor(self) -> &'static [u8] {
        match self {
            EventDeckKind::City => b"Event_Road_Campaign_",
            EventDeckKind::Road => b"PERSONALQUEST_",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventDeckKind::City => "city",
            EventDeckKind::Road => "road",
        }
    }
}

#[derive(Debug)]
pub struct EventsReplacement {
    pub kind: EventDeckKind,
    pub previous: Vec<String>,
    pub current: Vec<String>,
}

/// Distance between a deck's end and the next anchor when no discard
/// deck sits between them: the anchor's array header plus string-record
/// framing. Empirical, carried over from the original tooling.
const NEXT_ANCHOR_BACKSET: usize = 15;

impl SaveData {
    /// Span of the whole event deck starting at its capacity word, plus
    /// the first item's object ID. The capacity word sits 10 bytes
    /// before the first event name (capacity 4, record tag 1, object
    /// ID 4, length prefix 1).
    fn locate_event_deck(&self, kind: EventDeckKind) -> Result<(Span, u32)> {
        let prefix = kind.payload_prefix();
        let pattern = Pattern::new(vec![Pat::lit(prefix.as_bytes())]);
        let m = pattern
            .find_from(self.bytes(), 0)
            .ok_or_else(|| EditError::NotFound(format!("{} event deck", kind.label())))?;
        let start = m.span.start.checked_sub(10).ok_or_else(|| {
            EditError::NotFound(format!("{} event deck header", kind.label()))
        })?;
        let base_id = self.read_u32(start + 5)?;
        let (_, end) = deck::decode(self.bytes(), start)?;
        Ok((Span::new(start, end), base_id))
    }

    fn decode_event_names(&self, kind: EventDeckKind, start: usize) -> Result<Vec<String>> {
        let (decoded, _) = deck::decode(self.bytes(), start)?;
        let prefix = kind.payload_prefix();
        let names = decoded
            .items
            .iter()
            .filter_map(|item| {
                let text = String::from_utf8_lossy(&item.payload);
                let rest = text.strip_prefix(prefix.as_str())?;
                Some(rest.strip_suffix("ID").unwrap_or(rest).to_string())
            })
            .collect();
        Ok(names)
    }

    /// Event identifiers currently in the deck, in draw order.
    pub fn read_events(&self, kind: EventDeckKind) -> Result<Vec<String>> {
        let (span, _) = self.locate_event_deck(kind)?;
        self.decode_event_names(kind, span.start)
    }

    /// Replaces the deck wholesale with `new_events`, renumbering
    /// object IDs contiguously from the existing base ID and carrying
    /// the discard deck through empty if one follows. An empty list is
    /// a no-op: a deck with no items loses the payload anchor this
    /// module locates it by, so it could never be found again.
    pub fn replace_events(
        &mut self,
        kind: EventDeckKind,
        new_events: &[String],
    ) -> Result<EventsReplacement> {
        let (span, base_id) = self.locate_event_deck(kind)?;
        let previous = self.decode_event_names(kind, span.start)?;
        if new_events.is_empty() {
            return Ok(EventsReplacement {
                kind,
                current: previous.clone(),
                previous,
            });
        }

        let prefix = kind.payload_prefix();
        let items: Vec<DeckItem> = new_events
            .iter()
            .enumerate()
            .map(|(i, name)| {
                DeckItem::new(base_id + i as u32, format!("{prefix}{name}ID"))
            })
            .collect();
        let slot = format!("{} event deck", kind.label());
        let mut replacement = deck::encode(&slot, deck::capacity_for(items.len()), &items)?;

        // A discard deck is present exactly when the next structure's
        // anchor is further away than its own framing. Heuristic; see
        // reemit_discard.
        let anchor = Pattern::new(vec![Pat::lit(kind.next_anchor())]);
        let anchor_start = anchor
            .find_from(self.bytes(), span.end)
            .map(|m| m.span.start)
            .ok_or_else(|| EditError::NotFound(format!("anchor after {} event deck", kind.label())))?;
        let discard_end = anchor_start.saturating_sub(NEXT_ANCHOR_BACKSET);
        let splice_end = if discard_end > span.end {
            replacement.extend(deck::reemit_discard(self.bytes(), span.end, discard_end)?);
            discard_end
        } else {
            span.end
        };

        self.replace_span(Span::new(span.start, splice_end), &replacement)?;

        // The new deck starts where the old one did; decode it directly
        // rather than re-anchoring on a payload that may have changed.
        let current = self.decode_event_names(kind, span.start)?;
        Ok(EventsReplacement {
            kind,
            previous,
            current,
        })
    }
}
