//! OSC 1.0 packet codec.
//!
//! Layout rules:
//! - strings are UTF-8, NUL terminated, zero padded to a multiple of 4 bytes
//! - numbers are big-endian
//! - a message is `address, ",<tags>", args...`
//! - a bundle is `"#bundle", timetag, (i32 size, packet)*`

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// Bundles nested deeper than this are rejected.
pub const MAX_BUNDLE_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OscError {
    #[error("empty packet")]
    Empty,

    #[error("packet truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("string at byte {offset} is not NUL terminated")]
    UnterminatedString { offset: usize },

    #[error("string at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("address `{0}` does not start with '/'")]
    BadAddress(String),

    #[error("message `{address}` has no type tag string")]
    MissingTypeTags { address: String },

    #[error("unsupported type tag `{tag}`")]
    UnsupportedTypeTag { tag: char },

    #[error("bundle nesting exceeds {MAX_BUNDLE_DEPTH} levels")]
    TooDeep,

    #[error("bundle element at byte {offset} declares invalid size {size}")]
    BadElementSize { offset: usize, size: i32 },
}

/// One OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Double(f64),
    Long(i64),
    TimeTag(u64),
    Str(String),
    Blob(Vec<u8>),
    Bool(bool),
    Nil,
    Impulse,
}

impl OscArg {
    /// Numeric value as `f32`, converting integers and doubles.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            OscArg::Float(v) => Some(v),
            OscArg::Int(v) => Some(v as f32),
            OscArg::Double(v) => Some(v as f32),
            OscArg::Long(v) => Some(v as f32),
            _ => None,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            OscArg::Int(_) => b'i',
            OscArg::Float(_) => b'f',
            OscArg::Double(_) => b'd',
            OscArg::Long(_) => b'h',
            OscArg::TimeTag(_) => b't',
            OscArg::Str(_) => b's',
            OscArg::Blob(_) => b'b',
            OscArg::Bool(true) => b'T',
            OscArg::Bool(false) => b'F',
            OscArg::Nil => b'N',
            OscArg::Impulse => b'I',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), args: Vec::new() }
    }

    pub fn with_arg(mut self, arg: OscArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Message with one `f` argument per value.
    pub fn with_floats(address: impl Into<String>, values: &[f32]) -> Self {
        Self {
            address: address.into(),
            args: values.iter().copied().map(OscArg::Float).collect(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + self.args.len() * 4);
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        write_padded(out, self.address.as_bytes());

        let mut tags = Vec::with_capacity(self.args.len() + 1);
        tags.push(b',');
        tags.extend(self.args.iter().map(OscArg::tag));
        write_padded(out, &tags);

        for arg in &self.args {
            // Writes into a Vec cannot fail.
            let _ = match arg {
                OscArg::Int(v) => out.write_i32::<BigEndian>(*v),
                OscArg::Float(v) => out.write_f32::<BigEndian>(*v),
                OscArg::Double(v) => out.write_f64::<BigEndian>(*v),
                OscArg::Long(v) => out.write_i64::<BigEndian>(*v),
                OscArg::TimeTag(v) => out.write_u64::<BigEndian>(*v),
                OscArg::Str(s) => {
                    write_padded(out, s.as_bytes());
                    Ok(())
                }
                OscArg::Blob(bytes) => {
                    let r = out.write_i32::<BigEndian>(bytes.len() as i32);
                    out.extend_from_slice(bytes);
                    pad_to_four(out);
                    r
                }
                OscArg::Bool(_) | OscArg::Nil | OscArg::Impulse => Ok(()),
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle { timetag: u64, content: Vec<OscPacket> },
}

impl OscPacket {
    pub fn decode(data: &[u8]) -> Result<OscPacket, OscError> {
        decode_packet(data, 0, 0)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            OscPacket::Message(msg) => msg.encode_into(out),
            OscPacket::Bundle { timetag, content } => {
                out.extend_from_slice(BUNDLE_TAG);
                let _ = out.write_u64::<BigEndian>(*timetag);
                for element in content {
                    let bytes = element.encode();
                    let _ = out.write_i32::<BigEndian>(bytes.len() as i32);
                    out.extend_from_slice(&bytes);
                }
            }
        }
    }

    /// Every message in the packet, bundles flattened in order.
    pub fn into_messages(self) -> Vec<OscMessage> {
        let mut out = Vec::new();
        self.collect_messages(&mut out);
        out
    }

    fn collect_messages(self, out: &mut Vec<OscMessage>) {
        match self {
            OscPacket::Message(msg) => out.push(msg),
            OscPacket::Bundle { content, .. } => {
                for packet in content {
                    packet.collect_messages(out);
                }
            }
        }
    }
}

// ── decoding ──────────────────────────────────────────────────────────────

/// `base` is the offset of `data` within the datagram, for error reporting.
fn decode_packet(data: &[u8], base: usize, depth: usize) -> Result<OscPacket, OscError> {
    match data.first() {
        None => Err(OscError::Empty),
        Some(b'#') if data.starts_with(BUNDLE_TAG) => decode_bundle(data, base, depth),
        Some(_) => decode_message(data, base).map(OscPacket::Message),
    }
}

fn decode_bundle(data: &[u8], base: usize, depth: usize) -> Result<OscPacket, OscError> {
    if depth >= MAX_BUNDLE_DEPTH {
        return Err(OscError::TooDeep);
    }

    let mut cur = Cursor::new(data);
    cur.set_position(BUNDLE_TAG.len() as u64);
    let timetag = cur.read_u64::<BigEndian>().map_err(|_| truncated(&cur, base))?;

    let mut content = Vec::new();
    while (cur.position() as usize) < data.len() {
        let at = cur.position() as usize;
        let size = cur.read_i32::<BigEndian>().map_err(|_| truncated(&cur, base))?;
        let start = at + 4;

        let end = usize::try_from(size)
            .ok()
            .filter(|n| *n > 0 && n % 4 == 0)
            .map(|n| start + n)
            .filter(|end| *end <= data.len())
            .ok_or(OscError::BadElementSize { offset: base + at, size })?;

        content.push(decode_packet(&data[start..end], base + start, depth + 1)?);
        cur.set_position(end as u64);
    }

    Ok(OscPacket::Bundle { timetag, content })
}

fn decode_message(data: &[u8], base: usize) -> Result<OscMessage, OscError> {
    let mut cur = Cursor::new(data);

    let address = read_string(&mut cur, base)?;
    if !address.starts_with('/') {
        return Err(OscError::BadAddress(address));
    }

    if cur.position() as usize >= data.len() {
        return Err(OscError::MissingTypeTags { address });
    }
    let tags = read_string(&mut cur, base)?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(OscError::MissingTypeTags { address });
    };

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscArg::Int(cur.read_i32::<BigEndian>().map_err(|_| truncated(&cur, base))?),
            'f' => OscArg::Float(cur.read_f32::<BigEndian>().map_err(|_| truncated(&cur, base))?),
            'd' => OscArg::Double(cur.read_f64::<BigEndian>().map_err(|_| truncated(&cur, base))?),
            'h' => OscArg::Long(cur.read_i64::<BigEndian>().map_err(|_| truncated(&cur, base))?),
            't' => OscArg::TimeTag(cur.read_u64::<BigEndian>().map_err(|_| truncated(&cur, base))?),
            's' | 'S' => OscArg::Str(read_string(&mut cur, base)?),
            'b' => OscArg::Blob(read_blob(&mut cur, base)?),
            'T' => OscArg::Bool(true),
            'F' => OscArg::Bool(false),
            'N' => OscArg::Nil,
            'I' => OscArg::Impulse,
            other => return Err(OscError::UnsupportedTypeTag { tag: other }),
        };
        args.push(arg);
    }

    Ok(OscMessage { address, args })
}

fn read_string(cur: &mut Cursor<&[u8]>, base: usize) -> Result<String, OscError> {
    let start = cur.position() as usize;
    let rest = &cur.get_ref()[start..];

    let len = rest
        .iter()
        .position(|b| *b == 0)
        .ok_or(OscError::UnterminatedString { offset: base + start })?;
    let text = std::str::from_utf8(&rest[..len])
        .map_err(|_| OscError::InvalidUtf8 { offset: base + start })?
        .to_string();

    let padded = padded_len(len + 1);
    if padded > rest.len() {
        return Err(OscError::Truncated { offset: base + start + rest.len() });
    }
    cur.set_position((start + padded) as u64);
    Ok(text)
}

fn read_blob(cur: &mut Cursor<&[u8]>, base: usize) -> Result<Vec<u8>, OscError> {
    let at = cur.position() as usize;
    let size = cur.read_i32::<BigEndian>().map_err(|_| truncated(cur, base))?;
    let size = usize::try_from(size).map_err(|_| OscError::Truncated { offset: base + at })?;

    // The declared size is untrusted; it must fit in what is left of the datagram.
    let data = *cur.get_ref();
    let start = cur.position() as usize;
    let remaining = data.len() - start;
    if padded_len(size) > remaining {
        return Err(OscError::Truncated { offset: base + data.len() });
    }

    cur.set_position((start + padded_len(size)) as u64);
    Ok(data[start..start + size].to_vec())
}

fn truncated(cur: &Cursor<&[u8]>, base: usize) -> OscError {
    OscError::Truncated { offset: base + cur.position() as usize }
}

// ── encoding ──────────────────────────────────────────────────────────────

fn write_padded(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(bytes);
    out.push(0);
    pad_to_four(out);
}

fn pad_to_four(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

#[inline]
fn padded_len(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bytes as produced by the phone trackers for `/face-tracker/1/eye-position`.
    fn tracker_packet() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"/face-tracker/1/eye-position\0\0\0\0");
        b.extend_from_slice(b",fff\0\0\0\0");
        b.extend_from_slice(&(-45.5f32).to_be_bytes());
        b.extend_from_slice(&3.25f32.to_be_bytes());
        b.extend_from_slice(&12.0f32.to_be_bytes());
        b
    }

    // ── messages ──────────────────────────────────────────────────────────

    #[test]
    fn decodes_tracker_eye_position() {
        let packet = OscPacket::decode(&tracker_packet()).unwrap();
        let OscPacket::Message(msg) = packet else { panic!("expected a message") };
        assert_eq!(msg.address, "/face-tracker/1/eye-position");
        assert_eq!(
            msg.args,
            vec![OscArg::Float(-45.5), OscArg::Float(3.25), OscArg::Float(12.0)]
        );
    }

    #[test]
    fn encoder_matches_tracker_bytes() {
        let msg = OscMessage::with_floats("/face-tracker/1/eye-position", &[-45.5, 3.25, 12.0]);
        assert_eq!(msg.encode(), tracker_packet());
    }

    #[test]
    fn decodes_message_without_arguments() {
        // "/face-tracker/2/lost" is 20 bytes, so its NUL needs a whole padding word.
        let bytes = OscMessage::new("/face-tracker/2/lost").encode();
        assert_eq!(bytes.len(), 24 + 4);
        let msg = OscPacket::decode(&bytes).unwrap().into_messages().remove(0);
        assert!(msg.args.is_empty());
    }

    #[test]
    fn decodes_mixed_argument_types() {
        let original = OscMessage::new("/x")
            .with_arg(OscArg::Int(-7))
            .with_arg(OscArg::Double(0.5))
            .with_arg(OscArg::Str("abc".into()))
            .with_arg(OscArg::Blob(vec![1, 2, 3, 4, 5]))
            .with_arg(OscArg::Bool(true))
            .with_arg(OscArg::Nil)
            .with_arg(OscArg::Long(1 << 40))
            .with_arg(OscArg::TimeTag(99));
        let decoded = OscPacket::decode(&original.encode()).unwrap();
        assert_eq!(decoded, OscPacket::Message(original));
    }

    #[test]
    fn numeric_arguments_convert_to_f32() {
        assert_eq!(OscArg::Int(3).as_f32(), Some(3.0));
        assert_eq!(OscArg::Double(1.5).as_f32(), Some(1.5));
        assert_eq!(OscArg::Str("1".into()).as_f32(), None);
    }

    // ── malformed input ───────────────────────────────────────────────────

    #[test]
    fn empty_datagram_is_rejected() {
        assert_eq!(OscPacket::decode(&[]), Err(OscError::Empty));
    }

    #[test]
    fn truncated_argument_is_rejected() {
        let mut bytes = tracker_packet();
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(OscPacket::decode(&bytes), Err(OscError::Truncated { .. })));
    }

    #[test]
    fn oversized_blob_length_is_rejected() {
        let mut bytes = b"/x\0\0,b\0\0".to_vec();
        bytes.extend_from_slice(&i32::MAX.to_be_bytes());
        assert_eq!(OscPacket::decode(&bytes), Err(OscError::Truncated { offset: 12 }));

        let mut bytes = b"/x\0\0,b\0\0".to_vec();
        bytes.extend_from_slice(&5i32.to_be_bytes());
        bytes.extend_from_slice(b"abcde");
        assert!(matches!(OscPacket::decode(&bytes), Err(OscError::Truncated { .. })), "missing padding");
    }

    #[test]
    fn unterminated_address_is_rejected() {
        assert_eq!(
            OscPacket::decode(b"/abc"),
            Err(OscError::UnterminatedString { offset: 0 })
        );
    }

    #[test]
    fn address_must_start_with_slash() {
        assert_eq!(
            OscPacket::decode(b"abc\0,\0\0\0"),
            Err(OscError::BadAddress("abc".into()))
        );
    }

    #[test]
    fn missing_type_tags_is_rejected() {
        assert!(matches!(
            OscPacket::decode(b"/abc\0\0\0\0"),
            Err(OscError::MissingTypeTags { .. })
        ));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        assert_eq!(
            OscPacket::decode(b"/a\0\0,r\0\0\0\0\0\0"),
            Err(OscError::UnsupportedTypeTag { tag: 'r' })
        );
    }

    // ── bundles ───────────────────────────────────────────────────────────

    #[test]
    fn bundle_flattens_in_order() {
        let inner = OscPacket::Bundle {
            timetag: 1,
            content: vec![OscPacket::Message(OscMessage::new("/b"))],
        };
        let bundle = OscPacket::Bundle {
            timetag: 1,
            content: vec![OscPacket::Message(OscMessage::new("/a")), inner],
        };

        let decoded = OscPacket::decode(&bundle.encode()).unwrap();
        assert_eq!(decoded, bundle);

        let addresses: Vec<_> = decoded.into_messages().into_iter().map(|m| m.address).collect();
        assert_eq!(addresses, ["/a", "/b"]);
    }

    #[test]
    fn bundle_element_overrunning_packet_is_rejected() {
        let mut bytes = BUNDLE_TAG.to_vec();
        bytes.extend_from_slice(&1u64.to_be_bytes());
        bytes.extend_from_slice(&64i32.to_be_bytes());
        bytes.extend_from_slice(b"/a\0\0,\0\0\0");
        assert!(matches!(
            OscPacket::decode(&bytes),
            Err(OscError::BadElementSize { size: 64, .. })
        ));
    }

    #[test]
    fn deeply_nested_bundle_is_rejected() {
        let mut packet = OscPacket::Message(OscMessage::new("/deep"));
        for _ in 0..=MAX_BUNDLE_DEPTH {
            packet = OscPacket::Bundle { timetag: 0, content: vec![packet] };
        }
        assert_eq!(OscPacket::decode(&packet.encode()), Err(OscError::TooDeep));
    }
}
