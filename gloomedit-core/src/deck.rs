//! Codec for fixed-capacity arrays of length-prefixed string records
//! ("decks"): a 4-byte little-endian capacity, one record per live
//! item, and a run-length encoding of the trailing empty slots.

use crate::records::{self, NULL_RUN_TAG, NULL_TAG, STRING_TAG};
use crate::{EditError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckItem {
    pub object_id: u32,
    pub payload: Vec<u8>,
}

impl DeckItem {
    pub fn new(object_id: u32, payload: impl AsRef<[u8]>) -> Self {
        DeckItem {
            object_id,
            payload: payload.as_ref().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub capacity: u32,
    pub items: Vec<DeckItem>,
}

/// Smallest power of two that holds `n` items, with a floor of 4.
/// Both constants are empirical properties of the format, observed
/// rather than specified.
pub fn capacity_for(n: usize) -> u32 {
    let n = n.max(1) as u32;
    n.next_power_of_two().max(4)
}

fn push_null_run(out: &mut Vec<u8>, free: u32) {
    if free == 1 {
        out.push(NULL_TAG);
    } else if free > 1 {
        out.push(NULL_RUN_TAG);
        out.push(free as u8);
    }
}

/// Encodes a deck body: capacity word, the item records, then exactly
/// enough null slots to fill the capacity. The array record's own tag
/// and object ID are not part of the body; callers that replace a whole
/// array prepend them separately.
pub fn encode(slot: &str, capacity: u32, items: &[DeckItem]) -> Result<Vec<u8>> {
    if items.len() > capacity as usize {
        return Err(EditError::CapacityExceeded {
            slot: slot.to_string(),
            items: items.len(),
            capacity: capacity as usize,
        });
    }
    let free = capacity - items.len() as u32;
    // The null-run count is a single byte; no deck in this format comes
    // anywhere near that bound.
    if free > u8::MAX as u32 {
        return Err(EditError::CapacityExceeded {
            slot: slot.to_string(),
            items: items.len(),
            capacity: u8::MAX as usize,
        });
    }

    let mut out = Vec::new();
    out.extend_from_slice(&capacity.to_le_bytes());
    for item in items {
        debug_assert!(item.payload.len() <= u8::MAX as usize);
        out.push(STRING_TAG);
        out.extend_from_slice(&item.object_id.to_le_bytes());
        out.push(item.payload.len() as u8);
        out.extend_from_slice(&item.payload);
    }
    push_null_run(&mut out, free);
    Ok(out)
}

/// Decodes a deck body starting at the capacity word. Stops at the
/// null-run marker, at capacity, or at the first byte that is not a
/// string record. Returns the deck and the offset one past its last
/// byte, so the caller knows the exact span to splice over. Object IDs
/// come back with the payloads so deletions and reorderings can reuse
/// them instead of renumbering.
pub fn decode(buf: &[u8], start: usize) -> Result<(Deck, usize)> {
    let capacity = records::read_u32(buf, start)?;
    let mut pos = start + 4;
    let mut items = Vec::new();

    while (items.len() as u32) < capacity && pos < buf.len() {
        match buf[pos] {
            STRING_TAG => {
                let object_id = records::read_u32(buf, pos + 1)?;
                if pos + 6 > buf.len() {
                    return Err(EditError::OutOfRange {
                        offset: pos + 6,
                        len: buf.len(),
                    });
                }
                let len = buf[pos + 5] as usize;
                let payload_start = pos + 6;
                if payload_start + len > buf.len() {
                    return Err(EditError::OutOfRange {
                        offset: payload_start + len,
                        len: buf.len(),
                    });
                }
                items.push(DeckItem {
                    object_id,
                    payload: buf[payload_start..payload_start + len].to_vec(),
                });
                pos = payload_start + len;
            }
            NULL_TAG => {
                pos += 1;
                break;
            }
            NULL_RUN_TAG => {
                pos = (pos + 2).min(buf.len());
                break;
            }
            _ => break,
        }
    }

    Ok((Deck { capacity, items }, pos))
}

/// Re-emits the always-empty "discard" array sitting at
/// `[start, end)`, right after a primary deck: its original tag,
/// object ID and capacity word are kept verbatim, followed by a
/// capacity-sized null run. An empty range means no discard deck is
/// present and nothing is emitted.
///
/// Presence is decided by the caller from the byte distance between
/// the primary deck's end and the next known anchor. The heuristic is
/// carried over from the original tooling and can misfire on unusual
/// layouts; it is intentionally not second-guessed here.
pub fn reemit_discard(buf: &[u8], start: usize, end: usize) -> Result<Vec<u8>> {
    if start == end {
        return Ok(Vec::new());
    }
    // Tag byte, 4-byte object ID, then the capacity word.
    let capacity = records::read_u32(buf, start + 5)?;
    if capacity > u8::MAX as u32 {
        return Err(EditError::CapacityExceeded {
            slot: "discard deck".to_string(),
            items: capacity as usize,
            capacity: u8::MAX as usize,
        });
    }
    let mut out = buf[start..start + 9].to_vec();
    push_null_run(&mut out, capacity);
    Ok(out)
}
