//! CBOR decoder.
//!
//! An explicit state machine over a byte slice: read a header, collect the
//! payload, recurse for children, and stack tags on the way out. Strict
//! canonical mode additionally rejects indefinite-length items,
//! non-minimal arguments, out-of-order or duplicate map keys, and invalid
//! tagged payloads.

use crate::cbor::canonical_key_cmp;
use crate::cbor::half;
use crate::cbor::tags::TagRegistry;
use crate::cbor::CborMap;
use crate::cbor::CborValue;
use crate::defs::DecodeError;

const MAX_DEPTH: usize = 500;

/// Decoder configuration.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Reject anything but the unique canonical encoding.
    pub canonical: bool,
}

impl DecodeOptions {
    /// Strict canonical decoding.
    pub fn canonical() -> Self {
        DecodeOptions { canonical: true }
    }
}

/// Decodes a single data item with the default tag handlers, requiring the
/// input to be fully consumed.
pub fn decode(data: &[u8], opts: &DecodeOptions) -> Result<CborValue, DecodeError> {
    decode_with(data, &TagRegistry::default(), opts)
}

/// Decodes a single data item against a caller-supplied tag registry.
pub fn decode_with(
    data: &[u8],
    registry: &TagRegistry,
    opts: &DecodeOptions,
) -> Result<CborValue, DecodeError> {
    let mut d = Decoder { data, pos: 0, registry, opts };
    let v = d.read_value(0)?;
    if d.pos != data.len() {
        return Err(DecodeError::TrailingData);
    }
    Ok(v)
}

/// Pull reader over a byte source: each call to [`CborReader::next_value`]
/// decodes one complete data item and advances past it, so a caller can
/// drain a concatenated stream of items at its own pace.
pub struct CborReader<'a> {
    inner: Decoder<'a>,
}

impl<'a> CborReader<'a> {
    /// A reader over `data` using the given registry and options.
    pub fn new(data: &'a [u8], registry: &'a TagRegistry, opts: &'a DecodeOptions) -> Self {
        CborReader { inner: Decoder { data, pos: 0, registry, opts } }
    }

    /// Decodes the next item, or `None` at the end of the input.
    pub fn next_value(&mut self) -> Option<Result<CborValue, DecodeError>> {
        if self.inner.pos >= self.inner.data.len() {
            return None;
        }
        Some(self.inner.read_value(0))
    }

    /// Byte offset of the next unread item.
    pub fn position(&self) -> usize {
        self.inner.pos
    }
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    registry: &'a TagRegistry,
    opts: &'a DecodeOptions,
}

// A parsed initial byte.
enum Header {
    Arg(u64),
    Indefinite,
}

impl<'a> Decoder<'a> {
    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self.data.get(self.pos).ok_or(DecodeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::UnexpectedEof)?;
        let s = self.data.get(self.pos..end).ok_or(DecodeError::UnexpectedEof)?;
        self.pos = end;
        Ok(s)
    }

    // Reads the argument following an initial byte.
    fn read_arg(&mut self, info: u8, allow_indefinite: bool) -> Result<Header, DecodeError> {
        match info {
            0..=23 => Ok(Header::Arg(info as u64)),
            24 => {
                let v = self.byte()? as u64;
                if self.opts.canonical && v < 24 {
                    return Err(DecodeError::NonMinimalArgument);
                }
                Ok(Header::Arg(v))
            }
            25 => {
                let b = self.take(2)?;
                let v = u16::from_be_bytes([b[0], b[1]]) as u64;
                if self.opts.canonical && v <= 0xFF {
                    return Err(DecodeError::NonMinimalArgument);
                }
                Ok(Header::Arg(v))
            }
            26 => {
                let b = self.take(4)?;
                let v = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64;
                if self.opts.canonical && v <= 0xFFFF {
                    return Err(DecodeError::NonMinimalArgument);
                }
                Ok(Header::Arg(v))
            }
            27 => {
                let b = self.take(8)?;
                let v = u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
                if self.opts.canonical && v <= 0xFFFF_FFFF {
                    return Err(DecodeError::NonMinimalArgument);
                }
                Ok(Header::Arg(v))
            }
            28..=30 => Err(DecodeError::ReservedArgument),
            _ => {
                if !allow_indefinite {
                    return Err(DecodeError::MalformedIndefinite);
                }
                if self.opts.canonical {
                    return Err(DecodeError::MalformedIndefinite);
                }
                Ok(Header::Indefinite)
            }
        }
    }

    fn read_definite_len(&mut self, info: u8) -> Result<Option<usize>, DecodeError> {
        match self.read_arg(info, true)? {
            Header::Arg(n) => {
                let n = usize::try_from(n).map_err(|_| DecodeError::UnexpectedEof)?;
                Ok(Some(n))
            }
            Header::Indefinite => Ok(None),
        }
    }

    // True when the next byte is a break, consuming it.
    fn eat_break(&mut self) -> Result<bool, DecodeError> {
        if self.data.get(self.pos) == Some(&0xFF) {
            self.pos += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // Reassembles an indefinite-length string from definite chunks of the
    // same major type.
    fn read_chunks(&mut self, major: u8) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        loop {
            if self.eat_break()? {
                return Ok(out);
            }
            let ib = self.byte()?;
            if ib >> 5 != major {
                return Err(DecodeError::MalformedIndefinite);
            }
            match self.read_arg(ib & 0x1F, false)? {
                Header::Arg(n) => {
                    let n = usize::try_from(n).map_err(|_| DecodeError::UnexpectedEof)?;
                    out.extend_from_slice(self.take(n)?);
                }
                Header::Indefinite => return Err(DecodeError::MalformedIndefinite),
            }
        }
    }

    fn read_value(&mut self, depth: usize) -> Result<CborValue, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::DepthExceeded);
        }
        let ib = self.byte()?;
        let major = ib >> 5;
        let info = ib & 0x1F;
        match major {
            0 => match self.read_arg(info, false)? {
                Header::Arg(v) => Ok(CborValue::UInt(v)),
                Header::Indefinite => unreachable!(),
            },
            1 => match self.read_arg(info, false)? {
                Header::Arg(v) => Ok(CborValue::NInt(v)),
                Header::Indefinite => unreachable!(),
            },
            2 => match self.read_definite_len(info)? {
                Some(n) => Ok(CborValue::Bytes(self.take(n)?.to_vec())),
                None => Ok(CborValue::Bytes(self.read_chunks(2)?)),
            },
            3 => {
                let raw = match self.read_definite_len(info)? {
                    Some(n) => self.take(n)?.to_vec(),
                    None => self.read_chunks(3)?,
                };
                let s = String::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
                Ok(CborValue::Text(s))
            }
            4 => match self.read_definite_len(info)? {
                Some(n) => {
                    let mut items = Vec::new();
                    for _ in 0..n {
                        items.push(self.read_value(depth + 1)?);
                    }
                    Ok(CborValue::Array(items))
                }
                None => {
                    let mut items = Vec::new();
                    while !self.eat_break()? {
                        items.push(self.read_value(depth + 1)?);
                    }
                    Ok(CborValue::Array(items))
                }
            },
            5 => {
                let len = self.read_definite_len(info)?;
                let mut map = CborMap::new();
                let mut prev_key: Option<Vec<u8>> = None;
                let mut remaining = len;
                loop {
                    match remaining {
                        Some(0) => break,
                        Some(ref mut n) => *n -= 1,
                        None => {
                            if self.eat_break()? {
                                break;
                            }
                        }
                    }
                    let key_start = self.pos;
                    let key = self.read_value(depth + 1)?;
                    let key_bytes = self.data[key_start..self.pos].to_vec();
                    if self.opts.canonical {
                        if let Some(prev) = &prev_key {
                            match canonical_key_cmp(prev, &key_bytes) {
                                core::cmp::Ordering::Less => {}
                                core::cmp::Ordering::Equal => {
                                    return Err(DecodeError::DuplicateMapKey)
                                }
                                core::cmp::Ordering::Greater => {
                                    return Err(DecodeError::OutOfOrderMapKey)
                                }
                            }
                        }
                        prev_key = Some(key_bytes);
                    }
                    let value = self.read_value(depth + 1)?;
                    map.insert(key, value);
                }
                Ok(CborValue::Map(map))
            }
            6 => {
                let tag = match self.read_arg(info, false)? {
                    Header::Arg(v) => v,
                    Header::Indefinite => unreachable!(),
                };
                let inner = self.read_value(depth + 1)?;
                self.apply_tag(tag, inner)
            }
            _ => self.read_simple(info),
        }
    }

    fn apply_tag(&mut self, tag: u64, inner: CborValue) -> Result<CborValue, DecodeError> {
        match self.registry.get(tag) {
            None => Ok(CborValue::Tagged(tag, Box::new(inner))),
            Some(handler) => {
                if !handler.filter().accepts(&inner) {
                    if self.opts.canonical {
                        return Err(DecodeError::TagValidationFailed(tag));
                    }
                    return Ok(CborValue::Tagged(tag, Box::new(inner)));
                }
                match handler.validate(inner) {
                    Ok(v) => Ok(v),
                    Err(raw) => {
                        if self.opts.canonical {
                            Err(DecodeError::TagValidationFailed(tag))
                        } else {
                            // keep the raw payload, marked only by its tag
                            Ok(CborValue::Tagged(tag, Box::new(raw)))
                        }
                    }
                }
            }
        }
    }

    fn read_simple(&mut self, info: u8) -> Result<CborValue, DecodeError> {
        match info {
            20 => Ok(CborValue::Bool(false)),
            21 => Ok(CborValue::Bool(true)),
            22 => Ok(CborValue::Null),
            23 => Ok(CborValue::Undefined),
            v @ 0..=19 => Ok(CborValue::Simple(v)),
            24 => {
                let v = self.byte()?;
                if v < 32 {
                    return Err(DecodeError::ReservedArgument);
                }
                Ok(CborValue::Simple(v))
            }
            25 => {
                let b = self.take(2)?;
                let h = u16::from_be_bytes([b[0], b[1]]);
                Ok(CborValue::Float(half::f16_bits_to_f32(h) as f64))
            }
            26 => {
                let b = self.take(4)?;
                let f = f32::from_bits(u32::from_be_bytes([b[0], b[1], b[2], b[3]]));
                Ok(CborValue::Float(f as f64))
            }
            27 => {
                let b = self.take(8)?;
                let f = f64::from_bits(u64::from_be_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ]));
                Ok(CborValue::Float(f))
            }
            28..=30 => Err(DecodeError::ReservedArgument),
            _ => Err(DecodeError::UnexpectedBreak),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::bigint::BigInt;

    fn dec(data: &[u8]) -> Result<CborValue, DecodeError> {
        decode(data, &DecodeOptions::default())
    }

    fn dec_canonical(data: &[u8]) -> Result<CborValue, DecodeError> {
        decode(data, &DecodeOptions::canonical())
    }

    #[test]
    fn test_integers() {
        assert_eq!(dec(&[0x00]).unwrap(), CborValue::UInt(0));
        assert_eq!(dec(&[0x17]).unwrap(), CborValue::UInt(23));
        assert_eq!(dec(&[0x18, 0x18]).unwrap(), CborValue::UInt(24));
        assert_eq!(dec(&[0x19, 0x03, 0xE8]).unwrap(), CborValue::UInt(1000));
        assert_eq!(dec(&[0x20]).unwrap(), CborValue::NInt(0));
        assert_eq!(dec(&[0x38, 0x63]).unwrap(), CborValue::NInt(99));
    }

    #[test]
    fn test_canonical_minimal_arguments() {
        // 0x1800 would re-encode shorter
        assert_eq!(dec_canonical(&[0x18, 0x00]), Err(DecodeError::NonMinimalArgument));
        assert_eq!(dec_canonical(&[0x19, 0x00, 0x17]), Err(DecodeError::NonMinimalArgument));
        assert!(dec(&[0x18, 0x00]).is_ok());
        assert_eq!(dec_canonical(&[0x18, 0x18]).unwrap(), CborValue::UInt(24));
    }

    #[test]
    fn test_strings() {
        assert_eq!(dec(&[0x40]).unwrap(), CborValue::Bytes(vec![]));
        assert_eq!(dec(&[0x43, 1, 2, 3]).unwrap(), CborValue::Bytes(vec![1, 2, 3]));
        assert_eq!(
            dec(&[0x64, b'I', b'E', b'T', b'F']).unwrap(),
            CborValue::Text("IETF".into())
        );
        // invalid UTF-8
        assert_eq!(dec(&[0x61, 0xFF]), Err(DecodeError::InvalidUtf8));
        // truncated
        assert_eq!(dec(&[0x43, 1, 2]), Err(DecodeError::UnexpectedEof));
    }

    #[test]
    fn test_indefinite_strings() {
        // (_ h'0102', h'030405')
        let data = [0x5F, 0x42, 1, 2, 0x43, 3, 4, 5, 0xFF];
        assert_eq!(dec(&data).unwrap(), CborValue::Bytes(vec![1, 2, 3, 4, 5]));

        // mixed chunk type
        let bad = [0x5F, 0x42, 1, 2, 0x61, b'a', 0xFF];
        assert_eq!(dec(&bad), Err(DecodeError::MalformedIndefinite));

        // canonical mode rejects indefinite items
        assert_eq!(
            dec_canonical(&[0x5F, 0x42, 1, 2, 0xFF]),
            Err(DecodeError::MalformedIndefinite)
        );

        // indefinite text
        let data = [0x7F, 0x62, b'a', b'b', 0x61, b'c', 0xFF];
        assert_eq!(dec(&data).unwrap(), CborValue::Text("abc".into()));
    }

    #[test]
    fn test_arrays_and_maps() {
        assert_eq!(dec(&[0x80]).unwrap(), CborValue::Array(vec![]));
        assert_eq!(
            dec(&[0x83, 0x01, 0x02, 0x03]).unwrap(),
            CborValue::Array(vec![CborValue::UInt(1), CborValue::UInt(2), CborValue::UInt(3)])
        );

        // indefinite array
        assert_eq!(
            dec(&[0x9F, 0x01, 0x02, 0xFF]).unwrap(),
            CborValue::Array(vec![CborValue::UInt(1), CborValue::UInt(2)])
        );

        // {1: 2, 3: 4}
        let m = dec(&[0xA2, 0x01, 0x02, 0x03, 0x04]).unwrap();
        match m {
            CborValue::Map(m) => {
                assert_eq!(m.len(), 2);
                assert_eq!(m.get(&CborValue::UInt(1)), Some(&CborValue::UInt(2)));
                assert_eq!(m.get(&CborValue::UInt(3)), Some(&CborValue::UInt(4)));
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_map_order() {
        // keys out of order
        let bad = [0xA2, 0x02, 0x01, 0x01, 0x02];
        assert_eq!(dec_canonical(&bad), Err(DecodeError::OutOfOrderMapKey));
        assert!(dec(&bad).is_ok());

        // duplicate keys
        let dup = [0xA2, 0x01, 0x01, 0x01, 0x02];
        assert_eq!(dec_canonical(&dup), Err(DecodeError::DuplicateMapKey));

        // sorted is fine
        let good = [0xA2, 0x01, 0x01, 0x02, 0x02];
        assert!(dec_canonical(&good).is_ok());
    }

    #[test]
    fn test_simple_and_floats() {
        assert_eq!(dec(&[0xF4]).unwrap(), CborValue::Bool(false));
        assert_eq!(dec(&[0xF5]).unwrap(), CborValue::Bool(true));
        assert_eq!(dec(&[0xF6]).unwrap(), CborValue::Null);
        assert_eq!(dec(&[0xF7]).unwrap(), CborValue::Undefined);
        assert_eq!(dec(&[0xF0]).unwrap(), CborValue::Simple(16));
        assert_eq!(dec(&[0xF8, 0xFF]).unwrap(), CborValue::Simple(255));
        // two-byte simple values below 32 are not well-formed
        assert_eq!(dec(&[0xF8, 0x1F]), Err(DecodeError::ReservedArgument));

        assert_eq!(dec(&[0xF9, 0x3C, 0x00]).unwrap(), CborValue::Float(1.0));
        assert_eq!(
            dec(&[0xFA, 0x47, 0xC3, 0x50, 0x00]).unwrap(),
            CborValue::Float(100_000.0)
        );
        assert_eq!(
            dec(&[0xFB, 0x3F, 0xF1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9A]).unwrap(),
            CborValue::Float(1.1)
        );

        // half infinity and NaN
        assert_eq!(dec(&[0xF9, 0x7C, 0x00]).unwrap(), CborValue::Float(f64::INFINITY));
        match dec(&[0xF9, 0x7E, 0x00]).unwrap() {
            CborValue::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_and_break() {
        assert_eq!(dec(&[0x1C]), Err(DecodeError::ReservedArgument));
        assert_eq!(dec(&[0x3D]), Err(DecodeError::ReservedArgument));
        assert_eq!(dec(&[0xFC]), Err(DecodeError::ReservedArgument));
        assert_eq!(dec(&[0xFF]), Err(DecodeError::UnexpectedBreak));
        // break inside a definite array
        assert_eq!(dec(&[0x82, 0x01, 0xFF]), Err(DecodeError::UnexpectedBreak));
        // indefinite integers do not exist
        assert_eq!(dec(&[0x1F]), Err(DecodeError::MalformedIndefinite));
    }

    #[test]
    fn test_trailing_data() {
        assert_eq!(dec(&[0x01, 0x02]), Err(DecodeError::TrailingData));
    }

    #[test]
    fn test_pull_reader() {
        let registry = TagRegistry::default();
        let opts = DecodeOptions::default();
        let data = [0x01, 0x62, b'h', b'i', 0xF6];
        let mut reader = CborReader::new(&data, &registry, &opts);

        assert_eq!(reader.next_value(), Some(Ok(CborValue::UInt(1))));
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.next_value(), Some(Ok(CborValue::Text("hi".into()))));
        assert_eq!(reader.next_value(), Some(Ok(CborValue::Null)));
        assert_eq!(reader.next_value(), None);

        // errors surface per item without consuming the rest
        let data = [0x1C];
        let mut reader = CborReader::new(&data, &registry, &opts);
        assert_eq!(reader.next_value(), Some(Err(DecodeError::ReservedArgument)));
    }

    #[test]
    fn test_depth_limit() {
        let mut data = vec![0x81u8; 600];
        data.push(0x01);
        assert_eq!(dec(&data), Err(DecodeError::DepthExceeded));
    }

    #[test]
    fn test_bignum_tags() {
        // tag 2 with 9 bytes: 2^64
        let mut data = vec![0xC2, 0x49, 0x01];
        data.extend_from_slice(&[0; 8]);
        let expect = BigInt::from(u64::MAX) + BigInt::from(1);
        assert_eq!(dec(&data).unwrap(), CborValue::Integer(expect));

        // tag 3 with the same bytes: -1 - 2^64
        let mut data = vec![0xC3, 0x49, 0x01];
        data.extend_from_slice(&[0; 8]);
        let expect = -(BigInt::from(u64::MAX) + BigInt::from(2));
        assert_eq!(dec(&data).unwrap(), CborValue::Integer(expect));

        // a small bignum normalises to the integer majors
        let data = [0xC2, 0x41, 0x05];
        assert_eq!(dec(&data).unwrap(), CborValue::UInt(5));
    }

    #[test]
    fn test_number_tags() {
        // tag 4 [-2, 27315] = 273.15
        let v = dec(&[0xC4, 0x82, 0x21, 0x19, 0x6A, 0xB3]).unwrap();
        match &v {
            CborValue::Decimal(d) => assert_eq!(d.to_string(), "273.15"),
            other => panic!("expected decimal, got {:?}", other),
        }
        // round trip
        assert_eq!(v.to_bytes(), vec![0xC4, 0x82, 0x21, 0x19, 0x6A, 0xB3]);

        // tag 5 [-1, 3] = 1.5
        let v = dec(&[0xC5, 0x82, 0x20, 0x03]).unwrap();
        match &v {
            CborValue::BigFloat(bf) => assert_eq!(bf.to_f64(), 1.5),
            other => panic!("expected bigfloat, got {:?}", other),
        }

        // tag 30 [1, 3]
        let v = dec(&[0xD8, 0x1E, 0x82, 0x01, 0x03]).unwrap();
        match &v {
            CborValue::Rational(r) => {
                assert_eq!(*r.numerator(), BigInt::from(1));
                assert_eq!(*r.denominator(), BigInt::from(3));
            }
            other => panic!("expected rational, got {:?}", other),
        }
    }

    #[test]
    fn test_tag_validation() {
        // tag 4 with a non-array payload stays raw in lenient mode
        let data = [0xC4, 0x01];
        match dec(&data).unwrap() {
            CborValue::Tagged(4, inner) => assert_eq!(*inner, CborValue::UInt(1)),
            other => panic!("expected raw tagged value, got {:?}", other),
        }
        // and is an error in canonical mode
        assert_eq!(dec_canonical(&data), Err(DecodeError::TagValidationFailed(4)));

        // tag 30 with a zero denominator fails validation
        let data = [0xD8, 0x1E, 0x82, 0x01, 0x00];
        assert!(matches!(dec(&data).unwrap(), CborValue::Tagged(30, _)));
        assert_eq!(
            dec_canonical(&data),
            Err(DecodeError::TagValidationFailed(30))
        );

        // unknown tags pass through
        let data = [0xD8, 0x64, 0x01];
        assert_eq!(
            dec(&data).unwrap(),
            CborValue::Tagged(100, Box::new(CborValue::UInt(1)))
        );
    }

    #[test]
    fn test_nested_tags() {
        // tag 100 wrapping tag 2 wrapping bytes
        let data = [0xD8, 0x64, 0xC2, 0x42, 0x01, 0x00];
        match dec(&data).unwrap() {
            CborValue::Tagged(100, inner) => {
                assert_eq!(*inner, CborValue::UInt(256));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
