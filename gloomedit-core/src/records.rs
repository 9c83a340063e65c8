//! Record-level constants of the serialized object-graph format, plus
//! the little-endian field primitives the patch operations are built
//! on.

use crate::{EditError, Result};

/// One-byte record-type tags, in the order the external decoder names
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    SerializedStreamHeader = 0,
    ClassWithId = 1,
    SystemClassWithMembers = 2,
    ClassWithMembers = 3,
    SystemClassWithMembersAndTypes = 4,
    ClassWithMembersAndTypes = 5,
    BinaryObjectString = 6,
    BinaryArray = 7,
    MemberPrimitiveTyped = 8,
    MemberReference = 9,
    ObjectNull = 10,
    MessageEnd = 11,
    BinaryLibrary = 12,
    ObjectNullMultiple256 = 13,
    ObjectNullMultiple = 14,
    ArraySinglePrimitive = 15,
    ArraySingleObject = 16,
    ArraySingleString = 17,
    ArrayOfType = 18,
    MethodCall = 19,
    MethodReturn = 20,
}

impl RecordType {
    /// Maps the decoder's textual `RecordTypeEnum` back to a tag.
    pub fn from_name(name: &str) -> Option<RecordType> {
        use RecordType::*;
        Some(match name {
            "SerializedStreamHeader" => SerializedStreamHeader,
            "ClassWithId" => ClassWithId,
            "SystemClassWithMembers" => SystemClassWithMembers,
            "ClassWithMembers" => ClassWithMembers,
            "SystemClassWithMembersAndTypes" => SystemClassWithMembersAndTypes,
            "ClassWithMembersAndTypes" => ClassWithMembersAndTypes,
            "BinaryObjectString" => BinaryObjectString,
            "BinaryArray" => BinaryArray,
            "MemberPrimitiveTyped" => MemberPrimitiveTyped,
            "MemberReference" => MemberReference,
            "ObjectNull" => ObjectNull,
            "MessageEnd" => MessageEnd,
            "BinaryLibrary" => BinaryLibrary,
            "ObjectNullMultiple256" => ObjectNullMultiple256,
            "ObjectNullMultiple" => ObjectNullMultiple,
            "ArraySinglePrimitive" => ArraySinglePrimitive,
            "ArraySingleObject" => ArraySingleObject,
            "ArraySingleString" => ArraySingleString,
            "ArrayOfType" => ArrayOfType,
            "MethodCall" => MethodCall,
            "MethodReturn" => MethodReturn,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Tag of a length-prefixed string record.
pub const STRING_TAG: u8 = RecordType::BinaryObjectString as u8;
/// Tag marking a single empty array slot.
pub const NULL_TAG: u8 = RecordType::ObjectNull as u8;
/// Tag of a two-byte run of empty array slots (tag, then a count byte).
pub const NULL_RUN_TAG: u8 = RecordType::ObjectNullMultiple256 as u8;

pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > buf.len() {
        return Err(EditError::OutOfRange {
            offset,
            len: buf.len(),
        });
    }
    Ok(u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
    if offset + 4 > buf.len() {
        return Err(EditError::OutOfRange {
            offset,
            len: buf.len(),
        });
    }
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_round_trips_through_name() {
        let rt = RecordType::from_name("ObjectNullMultiple256").unwrap();
        assert_eq!(rt.tag(), 13);
        assert!(RecordType::from_name("NoSuchRecord").is_none());
    }

    #[test]
    fn read_u32_is_little_endian() {
        let buf = [0x00, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32(&buf, 1).unwrap(), 0x1234_5678);
    }

    #[test]
    fn read_u32_rejects_short_buffer() {
        let buf = [0u8; 5];
        assert!(matches!(
            read_u32(&buf, 2),
            Err(EditError::OutOfRange { offset: 2, len: 5 })
        ));
    }

    #[test]
    fn write_u32_round_trips() {
        let mut buf = [0u8; 8];
        write_u32(&mut buf, 3, 0xDEAD_BEEF).unwrap();
        assert_eq!(read_u32(&buf, 3).unwrap(), 0xDEAD_BEEF);
    }
}
