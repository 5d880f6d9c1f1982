use crate::amf::amf0::{markers, Amf0Object, Amf0Value};
use crate::{Error, Result};

/// Encodes one AMF0 value with its marker byte, appending to `out`.
pub fn encode_value(out: &mut Vec<u8>, value: &Amf0Value) -> Result<()> {
    match value {
        Amf0Value::Number(n) => encode_number(out, *n),
        Amf0Value::Boolean(b) => encode_boolean(out, *b),
        Amf0Value::String(s) => encode_string(out, s),
        Amf0Value::Object(obj) => encode_object(out, obj),
        Amf0Value::Null => {
            out.push(markers::NULL);
            Ok(())
        }
        Amf0Value::EcmaArray(obj) => encode_ecma_array(out, obj),
    }
}

pub fn encode_values(values: &[Amf0Value]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for v in values {
        encode_value(&mut out, v)?;
    }
    Ok(out)
}

fn encode_number(out: &mut Vec<u8>, n: f64) -> Result<()> {
    out.push(markers::NUMBER);
    out.extend_from_slice(&n.to_be_bytes());
    Ok(())
}

fn encode_boolean(out: &mut Vec<u8>, b: bool) -> Result<()> {
    out.push(markers::BOOLEAN);
    out.push(if b { 1 } else { 0 });
    Ok(())
}

fn encode_string_body(out: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.len() > 0xFFFF {
        return Err(Error::amf_encode("string too long"));
    }
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn encode_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    out.push(markers::STRING);
    encode_string_body(out, s)
}

fn encode_object(out: &mut Vec<u8>, obj: &Amf0Object) -> Result<()> {
    out.push(markers::OBJECT);
    encode_entries(out, obj)?;
    out.extend_from_slice(&[0x00, 0x00, markers::OBJECT_END]);
    Ok(())
}

fn encode_ecma_array(out: &mut Vec<u8>, obj: &Amf0Object) -> Result<()> {
    out.push(markers::ECMA_ARRAY);
    out.extend_from_slice(&(obj.len() as u32).to_be_bytes());
    encode_entries(out, obj)?;
    out.extend_from_slice(&[0x00, 0x00, markers::OBJECT_END]);
    Ok(())
}

fn encode_entries(out: &mut Vec<u8>, obj: &Amf0Object) -> Result<()> {
    for (key, value) in obj.iter() {
        encode_string_body(out, key)?;
        encode_value(out, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::decoder::decode_value;

    #[test]
    fn round_trips_number_string_null() {
        for v in [
            Amf0Value::Number(42.5),
            Amf0Value::String("hello".to_string()),
            Amf0Value::Null,
        ] {
            let mut out = Vec::new();
            encode_value(&mut out, &v).unwrap();
            let (decoded, consumed) = decode_value(&out).unwrap();
            assert_eq!(decoded, v);
            assert_eq!(consumed, out.len());
        }
    }

    #[test]
    fn round_trips_object() {
        let mut obj = Amf0Object::new();
        obj.insert("width", Amf0Value::Number(1280.0));
        obj.insert("name", Amf0Value::String("cam".to_string()));
        let v = Amf0Value::Object(obj.clone());
        let mut out = Vec::new();
        encode_value(&mut out, &v).unwrap();
        let (decoded, _) = decode_value(&out).unwrap();
        assert_eq!(decoded.as_object().unwrap(), &obj);
    }

    #[test]
    fn rejects_overlong_string() {
        let s = "a".repeat(70_000);
        let mut out = Vec::new();
        assert!(encode_string(&mut out, &s).is_err());
    }
}
