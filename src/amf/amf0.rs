/// AMF0 type markers understood by this codec. Markers outside this set fail to decode.
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const NULL: u8 = 0x05;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
}

/// Insertion-ordered string-keyed map, used for AMF0 `Object`/`EcmaArray` payloads.
///
/// A `HashMap` would lose the key order a publisher encoded values in, which matters
/// when `@setDataFrame` payloads get re-serialized downstream (see the session
/// controller's metadata handling).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Amf0Object {
    entries: Vec<(String, Amf0Value)>,
}

impl Amf0Object {
    pub fn new() -> Self {
        Amf0Object { entries: Vec::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Amf0Value) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Amf0Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Amf0Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Amf0Value)> for Amf0Object {
    fn from_iter<I: IntoIterator<Item = (String, Amf0Value)>>(iter: I) -> Self {
        let mut obj = Amf0Object::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

/// AMF0 value, restricted to the marker set §4.2 supports.
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    String(String),
    Object(Amf0Object),
    Null,
    EcmaArray(Amf0Object),
}

impl Amf0Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Amf0Object> {
        match self {
            Amf0Value::Object(o) | Amf0Value::EcmaArray(o) => Some(o),
            _ => None,
        }
    }

    pub fn number(n: impl Into<f64>) -> Self {
        Amf0Value::Number(n.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Amf0Value::String(s.into())
    }
}
