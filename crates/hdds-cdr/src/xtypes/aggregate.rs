// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct framing per extensibility kind.
//!
//! | Kind       | XCDR1                         | XCDR2                          |
//! |------------|-------------------------------|--------------------------------|
//! | Final      | members in order              | members in order               |
//! | Appendable | same as Final                 | DHEADER + members in order     |
//! | Mutable    | PL_CDR parameters + LIST_END  | DHEADER + EMHEADER per member  |
//!
//! [`StructEncoder`] and [`StructDecoder`] hide these differences from derived
//! and descriptor-driven code.

use super::emheader::{
    needs_extended_pid, EmHeader, LengthCode, EMHEADER_ID_MASK, PID_EXTENDED, PID_ID_MASK,
    PID_IGNORE, PID_LIST_END, PID_MUST_UNDERSTAND, PL_EXTENDED_M_FLAG,
};
use super::traits::{CdrDecode, CdrEncode};
use crate::cdr::{CdrReader, CdrSink, CdrSizer};
use crate::encoding::{EncodingMode, Extensibility};
use crate::error::{CdrError, Result};

/// Extensibility actually applied on the wire: XCDR1 has no appendable form.
#[inline]
pub const fn wire_extensibility(mode: EncodingMode, ext: Extensibility) -> Extensibility {
    match (mode, ext) {
        (EncodingMode::Xcdr1, Extensibility::Appendable) => Extensibility::Final,
        _ => ext,
    }
}

fn length_u32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| CdrError::invalid_value(format!("{} longer than u32::MAX", what)))
}

/// Writes one aggregate (struct or union body) to a sink.
pub struct StructEncoder<'s, S: CdrSink> {
    sink: &'s mut S,
    ext: Extensibility,
    dheader: Option<usize>,
    body_start: usize,
}

impl<'s, S: CdrSink> StructEncoder<'s, S> {
    /// Open an aggregate, writing its DHEADER placeholder when one is needed.
    pub fn begin(sink: &'s mut S, ext: Extensibility) -> Result<Self> {
        let mode = sink.mode();
        let dheader = if mode.uses_dheader(ext) {
            Some(sink.reserve_u32()?)
        } else {
            None
        };
        let body_start = sink.position();
        Ok(Self {
            sink,
            ext: wire_extensibility(mode, ext),
            dheader,
            body_start,
        })
    }

    /// Raw access for union discriminators and custom framing.
    pub fn sink(&mut self) -> &mut S {
        &mut *self.sink
    }

    pub fn extensibility(&self) -> Extensibility {
        self.ext
    }

    /// Write a non-optional member.
    pub fn member<T: CdrEncode + ?Sized>(
        &mut self,
        member_id: u32,
        must_understand: bool,
        value: &T,
    ) -> Result<()> {
        match (self.ext, self.sink.mode()) {
            (Extensibility::Mutable, EncodingMode::Xcdr2) => {
                self.emheader_member(member_id, must_understand, value)
            }
            (Extensibility::Mutable, EncodingMode::Xcdr1) => {
                self.parameter_member(member_id, must_understand, value)
            }
            _ => value.encode(&mut *self.sink),
        }
    }

    /// Write an optional member: presence flag in positional forms, omitted
    /// entirely from mutable forms when absent.
    pub fn optional<T: CdrEncode + ?Sized>(
        &mut self,
        member_id: u32,
        must_understand: bool,
        value: Option<&T>,
    ) -> Result<()> {
        match (self.ext, value) {
            (Extensibility::Mutable, Some(value)) => self.member(member_id, must_understand, value),
            (Extensibility::Mutable, None) => Ok(()),
            (_, Some(value)) => {
                self.sink.write_bool(true)?;
                value.encode(&mut *self.sink)
            }
            (_, None) => self.sink.write_bool(false),
        }
    }

    /// Close the aggregate: terminate the parameter list and patch the DHEADER.
    pub fn finish(self) -> Result<()> {
        if self.ext == Extensibility::Mutable && self.sink.mode() == EncodingMode::Xcdr1 {
            self.sink.align(4)?;
            self.sink.write_u16(PID_LIST_END)?;
            self.sink.write_u16(0)?;
        }
        if let Some(slot) = self.dheader {
            let len = length_u32(self.sink.position() - self.body_start, "aggregate body")?;
            self.sink.patch_u32(slot, len)?;
        }
        Ok(())
    }

    fn emheader_member<T: CdrEncode + ?Sized>(
        &mut self,
        member_id: u32,
        must_understand: bool,
        value: &T,
    ) -> Result<()> {
        self.sink.align(4)?;
        let lc = value.length_code();
        let em = EmHeader::new(member_id, lc, must_understand);
        self.sink.write_u32(em.to_u32())?;
        if lc != LengthCode::NextInt {
            // LC 0..3 fix the length; LC 5..7 read it from the value's own
            // leading count or DHEADER.
            return value.encode(&mut *self.sink);
        }
        let slot = self.sink.reserve_u32()?;
        let start = self.sink.position();
        value.encode(&mut *self.sink)?;
        let len = length_u32(self.sink.position() - start, "member")?;
        self.sink.patch_u32(slot, len)
    }

    fn parameter_member<T: CdrEncode + ?Sized>(
        &mut self,
        member_id: u32,
        must_understand: bool,
        value: &T,
    ) -> Result<()> {
        self.sink.align(4)?;
        let header_at = self.sink.position();
        let mut extended = needs_extended_pid(member_id, 0);
        let mut len = self.parameter_len(header_at, extended, value)?;
        if !extended && needs_extended_pid(member_id, len) {
            extended = true;
            len = self.parameter_len(header_at, extended, value)?;
        }

        if extended {
            let mut flags = PID_EXTENDED;
            if must_understand {
                flags |= PID_MUST_UNDERSTAND;
            }
            self.sink.write_u16(flags)?;
            self.sink.write_u16(8)?;
            let id_word = if must_understand {
                member_id | PL_EXTENDED_M_FLAG
            } else {
                member_id
            };
            self.sink.write_u32(id_word)?;
            self.sink.write_u32(length_u32(len, "parameter")?)?;
        } else {
            let mut pid = (member_id as u16) & PID_ID_MASK;
            if must_understand {
                pid |= PID_MUST_UNDERSTAND;
            }
            self.sink.write_u16(pid)?;
            self.sink.write_u16(len as u16)?;
        }

        let value_start = self.sink.position();
        value.encode(&mut *self.sink)?;
        self.sink.align(4)?;
        let written = self.sink.position() - value_start;
        if written != len {
            log::error!(
                "[cdr] parameter {:#x}: predicted {} bytes, wrote {}",
                member_id,
                len,
                written
            );
            return Err(CdrError::SizeMismatch {
                predicted: len,
                written,
            });
        }
        Ok(())
    }

    /// Padded value length of a PL_CDR parameter whose header starts at `header_at`.
    fn parameter_len<T: CdrEncode + ?Sized>(
        &self,
        header_at: usize,
        extended: bool,
        value: &T,
    ) -> Result<usize> {
        let value_start = header_at + if extended { 12 } else { 4 };
        let mut sizer = CdrSizer::with_start(self.sink.mode(), value_start);
        sizer.set_origin(self.sink.origin());
        value.encode(&mut sizer)?;
        sizer.align(4)?;
        Ok(sizer.size_delta(value_start))
    }
}

/// Location of one member of a mutable aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberHeader {
    pub member_id: u32,
    pub must_understand: bool,
    /// Position just past the member value.
    pub end: usize,
}

/// Reads one aggregate from a reader.
pub struct StructDecoder<'r, 'a> {
    reader: &'r mut CdrReader<'a>,
    declared: Extensibility,
    ext: Extensibility,
    frame: Option<(usize, usize)>,
    list_ended: bool,
}

impl<'r, 'a> StructDecoder<'r, 'a> {
    /// Open an aggregate, validating its DHEADER against the enclosing limit.
    pub fn begin(reader: &'r mut CdrReader<'a>, ext: Extensibility) -> Result<Self> {
        let mode = reader.mode();
        let frame = if mode.uses_dheader(ext) {
            let offset = reader.position();
            let len = reader.read_u32()? as usize;
            let end = reader.position().saturating_add(len);
            if end > reader.limit() {
                return Err(CdrError::MalformedLength {
                    what: "DHEADER",
                    offset,
                    declared: len,
                    remaining: reader.remaining(),
                });
            }
            let previous = reader.push_limit(end)?;
            Some((end, previous))
        } else {
            None
        };
        Ok(Self {
            reader,
            declared: ext,
            ext: wire_extensibility(mode, ext),
            frame,
            list_ended: false,
        })
    }

    pub fn reader(&mut self) -> &mut CdrReader<'a> {
        &mut *self.reader
    }

    pub fn extensibility(&self) -> Extensibility {
        self.ext
    }

    /// True once an appendable body has no bytes left for further members.
    ///
    /// Under XCDR1 appendable bodies are undelimited, so the end of the
    /// enclosing limit stands in for the body end.
    pub fn exhausted(&self) -> bool {
        match self.frame {
            Some((end, _)) => self.reader.position() >= end,
            None => self.declared == Extensibility::Appendable && self.reader.is_eof(),
        }
    }

    /// Read a positional member. A member an older writer did not send takes
    /// [`CdrDecode::absent`].
    pub fn member<T: CdrDecode>(&mut self) -> Result<T> {
        if self.exhausted() {
            return T::absent().ok_or_else(|| {
                CdrError::invalid_value("body ended before a member without a default")
            });
        }
        T::decode(&mut *self.reader)
    }

    /// Read a positional member that must be on the wire.
    pub fn required<T: CdrDecode>(&mut self, name: &str) -> Result<T> {
        if self.exhausted() {
            return Err(CdrError::invalid_value(format!("missing member {}", name)));
        }
        T::decode(&mut *self.reader)
    }

    /// Read a positional member, or `Default::default()` when an older
    /// writer did not send it.
    pub fn member_or_default<T: CdrDecode + Default>(&mut self) -> Result<T> {
        if self.exhausted() {
            return Ok(T::default());
        }
        T::decode(&mut *self.reader)
    }

    /// Read a positional optional member (presence flag + value).
    pub fn optional<T: CdrDecode>(&mut self) -> Result<Option<T>> {
        if self.exhausted() {
            return Ok(None);
        }
        if self.reader.read_bool()? {
            T::decode(&mut *self.reader).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Next member header of a mutable aggregate, `None` at the end.
    pub fn next_member(&mut self) -> Result<Option<MemberHeader>> {
        if self.ext != Extensibility::Mutable {
            return Err(CdrError::invalid_state(
                "member headers only exist in mutable aggregates",
            ));
        }
        match self.reader.mode() {
            EncodingMode::Xcdr2 => self.next_emheader(),
            EncodingMode::Xcdr1 => self.next_parameter(),
        }
    }

    /// Decode the value of `header`, confined to its declared length.
    pub fn value<T: CdrDecode>(&mut self, header: &MemberHeader) -> Result<T> {
        self.value_with(header, T::decode)
    }

    /// Like [`value`](Self::value) with a caller-supplied decode function.
    pub fn value_with<R, F>(&mut self, header: &MemberHeader, decode: F) -> Result<R>
    where
        F: FnOnce(&mut CdrReader<'a>) -> Result<R>,
    {
        let previous = self.reader.push_limit(header.end)?;
        let value = decode(&mut *self.reader)?;
        self.reader.seek(header.end)?;
        self.reader.pop_limit(previous);
        Ok(value)
    }

    /// Skip a member this decoder does not know.
    pub fn skip(&mut self, header: &MemberHeader) -> Result<()> {
        if header.must_understand {
            return Err(CdrError::UnknownMustUnderstand {
                member_id: header.member_id,
            });
        }
        log::trace!(
            "[cdr] skipping unknown member id={:#x} ({} bytes)",
            header.member_id,
            header.end.saturating_sub(self.reader.position())
        );
        self.reader.seek(header.end)
    }

    /// Close the aggregate, discarding any trailing bytes of a delimited body.
    pub fn finish(mut self) -> Result<()> {
        if self.ext == Extensibility::Mutable
            && self.reader.mode() == EncodingMode::Xcdr1
            && !self.list_ended
        {
            while let Some(header) = self.next_parameter()? {
                self.skip(&header)?;
            }
        }
        if let Some((end, previous)) = self.frame {
            if self.reader.position() < end {
                log::trace!(
                    "[cdr] discarding {} trailing bytes",
                    end - self.reader.position()
                );
            }
            self.reader.seek(end)?;
            self.reader.pop_limit(previous);
        }
        Ok(())
    }

    fn next_emheader(&mut self) -> Result<Option<MemberHeader>> {
        if self.reader.is_eof() {
            return Ok(None);
        }
        self.reader.align(4)?;
        let offset = self.reader.position();
        let em = EmHeader::from_u32(self.reader.read_u32()?);
        let len = match (em.length_code.fixed_len(), em.length_code.nextint_scale()) {
            (Some(len), _) => len,
            // NEXTINT is part of the value and stays unread.
            (None, Some(scale)) => (self.reader.peek_u32()? as usize)
                .saturating_mul(scale)
                .saturating_add(4),
            (None, None) => self.reader.read_u32()? as usize,
        };
        let end = self.reader.position().saturating_add(len);
        if end > self.reader.limit() {
            return Err(CdrError::MalformedLength {
                what: "member",
                offset,
                declared: len,
                remaining: self.reader.remaining(),
            });
        }
        Ok(Some(MemberHeader {
            member_id: em.member_id,
            must_understand: em.must_understand,
            end,
        }))
    }

    fn next_parameter(&mut self) -> Result<Option<MemberHeader>> {
        if self.list_ended {
            return Ok(None);
        }
        loop {
            self.reader.align(4)?;
            let offset = self.reader.position();
            let raw_pid = self.reader.read_u16()?;
            let short_len = self.reader.read_u16()? as usize;
            let pid = raw_pid & PID_ID_MASK;
            let (member_id, must_understand, len) = match pid {
                PID_LIST_END => {
                    self.list_ended = true;
                    return Ok(None);
                }
                PID_IGNORE => {
                    let end = self.reader.position().saturating_add(short_len);
                    self.reader.seek(end)?;
                    continue;
                }
                PID_EXTENDED => {
                    let id_word = self.reader.read_u32()?;
                    let len = self.reader.read_u32()? as usize;
                    (
                        id_word & EMHEADER_ID_MASK,
                        id_word & PL_EXTENDED_M_FLAG != 0 || raw_pid & PID_MUST_UNDERSTAND != 0,
                        len,
                    )
                }
                _ => (
                    u32::from(pid),
                    raw_pid & PID_MUST_UNDERSTAND != 0,
                    short_len,
                ),
            };
            let end = self.reader.position().saturating_add(len);
            if end > self.reader.limit() {
                return Err(CdrError::MalformedLength {
                    what: "parameter",
                    offset,
                    declared: len,
                    remaining: self.reader.remaining(),
                });
            }
            return Ok(Some(MemberHeader {
                member_id,
                must_understand,
                end,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::CdrWriter;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Sample {
        id: u32,
        name: String,
        extra: Option<i64>,
    }

    fn encode_sample<S: CdrSink>(sink: &mut S, ext: Extensibility, value: &Sample) -> Result<()> {
        let mut enc = StructEncoder::begin(sink, ext)?;
        enc.member(0, true, &value.id)?;
        enc.member(1, false, &value.name)?;
        enc.optional(2, false, value.extra.as_ref())?;
        enc.finish()
    }

    fn decode_sample(reader: &mut CdrReader<'_>, ext: Extensibility) -> Result<Sample> {
        let mut dec = StructDecoder::begin(reader, ext)?;
        let mut out = Sample::default();
        if dec.extensibility() == Extensibility::Mutable {
            while let Some(header) = dec.next_member()? {
                match header.member_id {
                    0 => out.id = dec.value(&header)?,
                    1 => out.name = dec.value(&header)?,
                    2 => out.extra = Some(dec.value(&header)?),
                    _ => dec.skip(&header)?,
                }
            }
        } else {
            out.id = dec.member()?;
            out.name = dec.member()?;
            out.extra = dec.optional()?;
        }
        dec.finish()?;
        Ok(out)
    }

    fn write_with<F>(mode: EncodingMode, f: F) -> Vec<u8>
    where
        F: FnOnce(&mut CdrWriter<'static>) -> Result<()>,
    {
        let mut writer = CdrWriter::growable(mode);
        f(&mut writer).unwrap();
        writer.into_vec()
    }

    fn single_u32(mode: EncodingMode, ext: Extensibility) -> Vec<u8> {
        write_with(mode, |w| {
            let mut enc = StructEncoder::begin(w, ext)?;
            enc.member(10, false, &5u32)?;
            enc.optional::<u32>(60, false, None)?;
            enc.finish()
        })
    }

    #[test]
    fn test_final_and_appendable_layouts() {
        let final_only = write_with(EncodingMode::Xcdr2, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Final)?;
            enc.member(0, false, &5u32)?;
            enc.finish()
        });
        assert_eq!(final_only, vec![0x05, 0, 0, 0]);

        let appendable = write_with(EncodingMode::Xcdr2, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Appendable)?;
            enc.member(0, false, &5u32)?;
            enc.finish()
        });
        assert_eq!(appendable, vec![0x04, 0, 0, 0, 0x05, 0, 0, 0]);

        let degraded = write_with(EncodingMode::Xcdr1, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Appendable)?;
            enc.member(0, false, &5u32)?;
            enc.finish()
        });
        assert_eq!(degraded, vec![0x05, 0, 0, 0]);
    }

    #[test]
    fn test_mutable_xcdr2_primitive_member() {
        assert_eq!(
            single_u32(EncodingMode::Xcdr2, Extensibility::Mutable),
            vec![
                0x08, 0x00, 0x00, 0x00, // DHEADER
                0x0a, 0x00, 0x00, 0x20, // EMHEADER: LC=2, id=10
                0x05, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn test_mutable_xcdr1_parameter_list() {
        assert_eq!(
            single_u32(EncodingMode::Xcdr1, Extensibility::Mutable),
            vec![
                0x0a, 0x00, 0x04, 0x00, // pid=10, len=4
                0x05, 0x00, 0x00, 0x00, //
                0x02, 0x3f, 0x00, 0x00, // PID_LIST_END
            ]
        );
    }

    #[test]
    fn test_mutable_xcdr2_string_length_is_its_count() {
        let bytes = write_with(EncodingMode::Xcdr2, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Mutable)?;
            enc.member(1, true, "Hi")?;
            enc.finish()
        });
        assert_eq!(
            bytes,
            vec![
                0x0b, 0x00, 0x00, 0x00, // DHEADER
                0x01, 0x00, 0x00, 0xd0, // M=1, LC=5, id=1
                0x03, 0x00, 0x00, 0x00, b'H', b'i', 0x00, // count doubles as NEXTINT
            ]
        );
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        let mut dec = StructDecoder::begin(&mut reader, Extensibility::Mutable).unwrap();
        let header = dec.next_member().unwrap().unwrap();
        assert_eq!(header.end, bytes.len());
        assert_eq!(dec.value::<String>(&header).unwrap(), "Hi");
        dec.finish().unwrap();
    }

    #[test]
    fn test_mutable_xcdr2_collection_length_codes() {
        let bytes = write_with(EncodingMode::Xcdr2, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Mutable)?;
            enc.member(1, false, &vec![7u32, 8])?;
            enc.member(2, false, &[1u16, 2, 3, 4])?;
            enc.member(3, false, &vec![9i16])?;
            enc.finish()
        });
        assert_eq!(
            bytes,
            vec![
                0x2a, 0x00, 0x00, 0x00, // DHEADER
                0x01, 0x00, 0x00, 0x60, // LC=6, id=1
                0x02, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
                0x02, 0x00, 0x00, 0x30, // LC=3, id=2: 8-byte array
                0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, //
                0x03, 0x00, 0x00, 0x40, // LC=4, id=3: 2-byte elements
                0x06, 0x00, 0x00, 0x00, // NEXTINT
                0x01, 0x00, 0x00, 0x00, 0x09, 0x00,
            ]
        );

        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        let mut dec = StructDecoder::begin(&mut reader, Extensibility::Mutable).unwrap();
        let first = dec.next_member().unwrap().unwrap();
        assert_eq!(dec.value::<Vec<u32>>(&first).unwrap(), vec![7, 8]);
        let second = dec.next_member().unwrap().unwrap();
        assert_eq!(dec.value::<[u16; 4]>(&second).unwrap(), [1, 2, 3, 4]);
        let third = dec.next_member().unwrap().unwrap();
        assert_eq!(dec.value::<Vec<i16>>(&third).unwrap(), vec![9]);
        assert!(dec.next_member().unwrap().is_none());
        dec.finish().unwrap();
    }

    #[test]
    fn test_xcdr1_extended_parameter_header() {
        let bytes = write_with(EncodingMode::Xcdr1, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Mutable)?;
            enc.member(0x4000, true, &7u16)?;
            enc.finish()
        });
        assert_eq!(
            bytes,
            vec![
                0x01, 0x7f, 0x08, 0x00, // PID_EXTENDED | must-understand
                0x00, 0x40, 0x00, 0x40, // id 0x4000 with M flag
                0x04, 0x00, 0x00, 0x00, // padded length
                0x07, 0x00, 0x00, 0x00, //
                0x02, 0x3f, 0x00, 0x00,
            ]
        );
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr1);
        let mut dec = StructDecoder::begin(&mut reader, Extensibility::Mutable).unwrap();
        let header = dec.next_member().unwrap().unwrap();
        assert_eq!(header.member_id, 0x4000);
        assert!(header.must_understand);
        assert_eq!(dec.value::<u16>(&header).unwrap(), 7);
        assert!(dec.next_member().unwrap().is_none());
        dec.finish().unwrap();
        assert!(reader.is_eof());
    }

    #[test]
    fn test_round_trip_all_kinds_and_modes() {
        let sample = Sample {
            id: 42,
            name: String::from("Test"),
            extra: Some(-9),
        };
        for mode in [EncodingMode::Xcdr1, EncodingMode::Xcdr2] {
            for ext in [
                Extensibility::Final,
                Extensibility::Appendable,
                Extensibility::Mutable,
            ] {
                for value in [sample.clone(), Sample::default()] {
                    let bytes = write_with(mode, |w| encode_sample(w, ext, &value));
                    let mut sizer = CdrSizer::new(mode);
                    encode_sample(&mut sizer, ext, &value).unwrap();
                    assert_eq!(sizer.size_delta(0), bytes.len(), "{:?} {:?}", mode, ext);

                    let mut reader = CdrReader::new(&bytes, mode);
                    assert_eq!(decode_sample(&mut reader, ext).unwrap(), value);
                    assert!(reader.is_eof());
                }
            }
        }
    }

    #[test]
    fn test_appendable_backward_compatibility() {
        // Older writer: only `id`.
        let bytes = [0x04, 0, 0, 0, 0x2a, 0, 0, 0];
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        let sample = decode_sample(&mut reader, Extensibility::Appendable).unwrap();
        assert_eq!(sample.id, 42);
        assert_eq!(sample.name, "");
        assert_eq!(sample.extra, None);
    }

    #[test]
    fn test_xcdr1_appendable_ends_with_the_buffer() {
        let bytes = [0x2a, 0, 0, 0];
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr1);
        let sample = decode_sample(&mut reader, Extensibility::Appendable).unwrap();
        assert_eq!(sample.id, 42);
        assert_eq!(sample.name, "");

        // Final bodies are never cut short.
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr1);
        assert!(matches!(
            decode_sample(&mut reader, Extensibility::Final),
            Err(CdrError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_required_member_missing_from_body() {
        let bytes = [0x04, 0, 0, 0, 0x2a, 0, 0, 0];
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        let mut dec = StructDecoder::begin(&mut reader, Extensibility::Appendable).unwrap();
        assert_eq!(dec.required::<u32>("id").unwrap(), 42);
        assert_eq!(
            dec.required::<String>("name").unwrap_err(),
            CdrError::InvalidValue("missing member name".into())
        );
    }

    #[test]
    fn test_appendable_forward_compatibility() {
        let newer = write_with(EncodingMode::Xcdr2, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Appendable)?;
            enc.member(0, false, &7u32)?;
            enc.member(1, false, "x")?;
            enc.optional(2, false, Some(&1i64))?;
            enc.member(3, false, &0xdead_beefu32)?;
            enc.finish()
        });
        let mut with_trailer = newer.clone();
        with_trailer.extend_from_slice(&[0xaa, 0xbb]);

        let mut reader = CdrReader::new(&with_trailer, EncodingMode::Xcdr2);
        let sample = decode_sample(&mut reader, Extensibility::Appendable).unwrap();
        assert_eq!(sample.id, 7);
        assert_eq!(sample.extra, Some(1));
        assert_eq!(reader.position(), newer.len());
    }

    #[test]
    fn test_mutable_skips_unknown_members() {
        let bytes = write_with(EncodingMode::Xcdr2, |w| {
            let mut enc = StructEncoder::begin(w, Extensibility::Mutable)?;
            enc.member(99, false, "ignored")?;
            enc.member(1, false, "kept")?;
            enc.member(0, false, &3u32)?;
            enc.finish()
        });
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        let sample = decode_sample(&mut reader, Extensibility::Mutable).unwrap();
        assert_eq!(sample.id, 3);
        assert_eq!(sample.name, "kept");
        assert_eq!(sample.extra, None);
    }

    #[test]
    fn test_unknown_must_understand_member_fails() {
        for mode in [EncodingMode::Xcdr1, EncodingMode::Xcdr2] {
            let bytes = write_with(mode, |w| {
                let mut enc = StructEncoder::begin(w, Extensibility::Mutable)?;
                enc.member(77, true, &1u8)?;
                enc.finish()
            });
            let mut reader = CdrReader::new(&bytes, mode);
            assert_eq!(
                decode_sample(&mut reader, Extensibility::Mutable).unwrap_err(),
                CdrError::UnknownMustUnderstand { member_id: 77 }
            );
        }
    }

    #[test]
    fn test_length_code_with_nextint_in_value() {
        // Member 1 uses LC=5: NEXTINT is the nested DHEADER, length = 4 + NEXTINT.
        let bytes = [
            0x0c, 0x00, 0x00, 0x00, // DHEADER
            0x01, 0x00, 0x00, 0x50, // LC=5, id=1
            0x04, 0x00, 0x00, 0x00, // NEXTINT / nested DHEADER
            0x09, 0x00, 0x00, 0x00, // nested u32
        ];
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        let mut dec = StructDecoder::begin(&mut reader, Extensibility::Mutable).unwrap();
        let header = dec.next_member().unwrap().unwrap();
        assert_eq!(header.member_id, 1);
        assert_eq!(header.end, 16);
        let inner = {
            let mut nested =
                StructDecoder::begin(dec.reader(), Extensibility::Appendable).unwrap();
            let v: u32 = nested.member().unwrap();
            nested.finish().unwrap();
            v
        };
        assert_eq!(inner, 9);
        assert!(dec.next_member().unwrap().is_none());
        dec.finish().unwrap();
    }

    #[test]
    fn test_pid_ignore_is_skipped() {
        let bytes = [
            0x03, 0x3f, 0x04, 0x00, 0xff, 0xff, 0xff, 0xff, // PID_IGNORE
            0x00, 0x00, 0x04, 0x00, 0x2a, 0x00, 0x00, 0x00, // id 0 = 42
            0x02, 0x3f, 0x00, 0x00,
        ];
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr1);
        let sample = decode_sample(&mut reader, Extensibility::Mutable).unwrap();
        assert_eq!(sample.id, 42);
    }

    #[test]
    fn test_dheader_beyond_buffer_is_malformed() {
        let bytes = [0x40, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        assert!(matches!(
            decode_sample(&mut reader, Extensibility::Appendable),
            Err(CdrError::MalformedLength { what: "DHEADER", .. })
        ));
    }

    #[test]
    fn test_member_length_beyond_body_is_malformed() {
        let bytes = [
            0x0c, 0x00, 0x00, 0x00, //
            0x01, 0x00, 0x00, 0x40, // LC=4, id=1
            0x20, 0x00, 0x00, 0x00, // NEXTINT=32, body has 4 left
            0x00, 0x00, 0x00, 0x00,
        ];
        let mut reader = CdrReader::new(&bytes, EncodingMode::Xcdr2);
        assert!(matches!(
            decode_sample(&mut reader, Extensibility::Mutable),
            Err(CdrError::MalformedLength { what: "member", .. })
        ));
    }
}
