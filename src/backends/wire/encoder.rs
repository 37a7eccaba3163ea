use prost::encoding::{encode_key, encode_varint, WireType};

use crate::backends::wire::{DynamicMessage, Value};

fn encode_length_delimited(number: u32, bytes: &[u8], buf: &mut Vec<u8>) {
    encode_key(number, WireType::LengthDelimited, buf);
    encode_varint(bytes.len() as u64, buf);
    buf.extend_from_slice(bytes);
}

impl DynamicMessage {
    /// Append the wire encoding of this message to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        for (number, value) in &self.fields {
            let number = *number;
            
            match value {
                // Negative 32-bit values are sign-extended to ten bytes
                Value::Int32(v) | Value::Enum(v) => {
                    encode_key(number, WireType::Varint, buf);
                    encode_varint(*v as i64 as u64, buf);
                },
                Value::Int64(v) => {
                    encode_key(number, WireType::Varint, buf);
                    encode_varint(*v as u64, buf);
                },
                Value::Bool(v) => {
                    encode_key(number, WireType::Varint, buf);
                    encode_varint(*v as u64, buf);
                },
                Value::String(v) => encode_length_delimited(number, v.as_bytes(), buf),
                Value::Bytes(v) => encode_length_delimited(number, v, buf),
                Value::Message(nested) => {
                    let nested = nested.encode_to_vec();
                    encode_length_delimited(number, &nested, buf);
                },
            }
        }
    }
    
    /// The wire encoding of this message.
    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    
    #[derive(Clone, PartialEq, prost::Message)]
    struct Inner {
        #[prost(bool, optional, tag = "1")]
        flag: Option<bool>,
        #[prost(int64, required, tag = "3")]
        big: i64,
    }
    
    #[derive(Clone, PartialEq, prost::Message)]
    struct Request {
        #[prost(int32, required, tag = "1")]
        id: i32,
        #[prost(string, optional, tag = "2")]
        name: Option<String>,
        #[prost(int32, repeated, packed = "false", tag = "3")]
        tags: Vec<i32>,
        #[prost(message, optional, tag = "4")]
        inner: Option<Inner>,
        #[prost(bytes = "vec", optional, tag = "5")]
        blob: Option<Vec<u8>>,
    }
    
    #[test]
    fn test_decodes_with_prost() {
        let mut inner = DynamicMessage::new("Inner");
        inner.push(1, Value::Bool(true));
        inner.push(3, Value::Int64(-1));
        
        let mut message = DynamicMessage::new("Request");
        message.push(1, Value::Int32(-7));
        message.push(2, Value::String("abc".to_string()));
        message.push(3, Value::Enum(1));
        message.push(3, Value::Enum(0));
        message.push(4, Value::Message(inner));
        message.push(5, Value::Bytes(vec![0, 255]));
        
        let decoded = Request::decode(message.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, Request {
            id: -7,
            name: Some("abc".to_string()),
            tags: vec![1, 0],
            inner: Some(Inner {
                flag: Some(true),
                big: -1,
            }),
            blob: Some(vec![0, 255]),
        });
    }
    
    #[test]
    fn test_known_bytes() {
        let mut message = DynamicMessage::new("Request");
        message.push(1, Value::Int32(150));
        assert_eq!(message.encode_to_vec(), vec![0x08, 0x96, 0x01]);
    }
}
