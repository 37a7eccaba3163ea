use std::path::Path;

use ahash::AHashMap;
use indexmap::IndexMap;
use prost::Message;
use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorSet,
};

use crate::{
    error::SchemaError,
    schema::{Cardinality, EnumValue, Field, FieldKind, SchemaIntrospector},
};

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

/// All messages and enums of a compiled `FileDescriptorSet`.
///
/// Messages can be looked up by their fully qualified name (`pkg.Outer.Inner`) or by their
/// short name (`Inner`) as long as the short name is unique in the pool.
pub struct DescriptorPool {
    messages: IndexMap<String, Vec<FieldDescriptorProto>>,
    enums: AHashMap<String, Vec<EnumValue>>,
    // `None` marks a short name that is shared by several messages
    short_names: AHashMap<String, Option<String>>,
}

impl DescriptorPool {
    /// Index all messages and enums of `set`.
    pub fn new(set: FileDescriptorSet) -> Self {
        let mut pool = Self {
            messages: IndexMap::new(),
            enums: AHashMap::new(),
            short_names: AHashMap::new(),
        };

        for file in &set.file {
            let package = file.package();

            for message in &file.message_type {
                pool.add_message(package, message);
            }

            for enumeration in &file.enum_type {
                pool.add_enum(package, enumeration);
            }
        }

        pool
    }

    /// Decode a binary `FileDescriptorSet`.
    pub fn decode(bytes: &[u8]) -> Result<Self, SchemaError> {
        let set = FileDescriptorSet::decode(bytes)?;
        Ok(Self::new(set))
    }

    /// Load a descriptor set written by `protoc --descriptor_set_out`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    fn add_message(&mut self, scope: &str, message: &DescriptorProto) {
        let full_name = qualify(scope, message.name());

        for nested in &message.nested_type {
            self.add_message(&full_name, nested);
        }

        for enumeration in &message.enum_type {
            self.add_enum(&full_name, enumeration);
        }

        self.short_names
            .entry(message.name().to_string())
            .and_modify(|full| *full = None)
            .or_insert_with(|| Some(full_name.clone()));
        self.messages.insert(full_name, message.field.clone());
    }

    fn add_enum(&mut self, scope: &str, enumeration: &EnumDescriptorProto) {
        let values = enumeration.value.iter().map(|value| EnumValue::new(value.name(), value.number())).collect();
        self.enums.insert(qualify(scope, enumeration.name()), values);
    }

    /// Resolve a short or fully qualified message name to its fully qualified name.
    pub fn resolve(&self, name: &str) -> Result<&str, SchemaError> {
        let name = name.trim_start_matches('.');

        if let Some((full_name, _)) = self.messages.get_key_value(name) {
            return Ok(full_name);
        }

        match self.short_names.get(name) {
            Some(Some(full_name)) => Ok(full_name),
            Some(None) => Err(SchemaError::AmbiguousMessage(name.to_string())),
            None => Err(SchemaError::UnknownMessage(name.to_string())),
        }
    }

    /// Fully qualified names of all messages in the pool.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    fn convert(&self, field: &FieldDescriptorProto) -> Result<Field, SchemaError> {
        let cardinality = match field.label() {
            Label::Optional => Cardinality::Optional,
            Label::Required => Cardinality::Required,
            Label::Repeated => Cardinality::Repeated,
        };
        let type_name = field.type_name().trim_start_matches('.');

        let kind = match field.r#type() {
            Type::Int32 => FieldKind::Int32,
            Type::Int64 => FieldKind::Int64,
            Type::Bool => FieldKind::Bool,
            Type::String => FieldKind::String,
            Type::Bytes => FieldKind::Bytes,
            Type::Message => FieldKind::Message(type_name.to_string()),
            Type::Enum => match self.enums.get(type_name) {
                Some(values) => FieldKind::Enum(values.clone()),
                None => {
                    return Err(SchemaError::UnknownEnum {
                        field: field.name().to_string(),
                        type_name: type_name.to_string(),
                    })
                },
            },
            other => FieldKind::Unsupported(format!("{:?}", other).to_lowercase()),
        };

        Ok(Field::new(field.name(), field.number() as u32, cardinality, kind))
    }
}

impl SchemaIntrospector for DescriptorPool {
    fn fields(&self, message: &str) -> Result<Vec<Field>, SchemaError> {
        let full_name = self.resolve(message)?;
        let fields = &self.messages[full_name];
        fields.iter().map(|field| self.convert(field)).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use prost_types::{EnumValueDescriptorProto, FileDescriptorProto};

    pub(crate) fn field(name: &str, number: i32, label: Label, ty: Type, type_name: Option<&str>) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(label as i32),
            r#type: Some(ty as i32),
            type_name: type_name.map(String::from),
            ..Default::default()
        }
    }

    /// `demo.Request { required int32 id; optional string name; repeated Tag tags; optional Inner inner; }`
    pub(crate) fn demo_set() -> FileDescriptorSet {
        let tag = EnumDescriptorProto {
            name: Some("Tag".to_string()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("A".to_string()),
                    number: Some(0),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("B".to_string()),
                    number: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let inner = DescriptorProto {
            name: Some("Inner".to_string()),
            field: vec![
                field("flag", 1, Label::Optional, Type::Bool, None),
                field("blob", 2, Label::Optional, Type::Bytes, None),
                field("big", 3, Label::Optional, Type::Int64, None),
            ],
            ..Default::default()
        };
        let request = DescriptorProto {
            name: Some("Request".to_string()),
            field: vec![
                field("id", 1, Label::Required, Type::Int32, None),
                field("name", 2, Label::Optional, Type::String, None),
                field("tags", 3, Label::Repeated, Type::Enum, Some(".demo.Tag")),
                field("inner", 4, Label::Optional, Type::Message, Some(".demo.Request.Inner")),
            ],
            nested_type: vec![inner],
            ..Default::default()
        };

        FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("demo.proto".to_string()),
                package: Some("demo".to_string()),
                message_type: vec![request],
                enum_type: vec![tag],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_fields() {
        let pool = DescriptorPool::new(demo_set());
        let fields = pool.fields("Request").unwrap();

        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], Field::new("id", 1, Cardinality::Required, FieldKind::Int32));
        assert_eq!(
            fields[2].kind,
            FieldKind::Enum(vec![EnumValue::new("A", 0), EnumValue::new("B", 1)])
        );
        assert_eq!(fields[3].kind, FieldKind::Message("demo.Request.Inner".to_string()));

        let inner = pool.fields("demo.Request.Inner").unwrap();
        assert_eq!(inner[0].kind, FieldKind::Bool);
        assert_eq!(inner[2].kind, FieldKind::Int64);
    }

    #[test]
    fn test_resolve() {
        let pool = DescriptorPool::new(demo_set());
        assert_eq!(pool.resolve("Request").unwrap(), "demo.Request");
        assert_eq!(pool.resolve(".demo.Request").unwrap(), "demo.Request");
        assert!(matches!(pool.resolve("Nope"), Err(SchemaError::UnknownMessage(_))));
    }

    #[test]
    fn test_ambiguous_short_name() {
        let mut set = demo_set();
        let mut other = set.file[0].clone();
        other.package = Some("other".to_string());
        set.file.push(other);

        let pool = DescriptorPool::new(set);
        assert!(matches!(pool.resolve("Request"), Err(SchemaError::AmbiguousMessage(_))));
        assert_eq!(pool.resolve("other.Request").unwrap(), "other.Request");
    }

    #[test]
    fn test_unsupported_kind() {
        let mut set = demo_set();
        set.file[0].message_type[0].field.push(field("ratio", 5, Label::Optional, Type::Double, None));

        let pool = DescriptorPool::new(set);
        let fields = pool.fields("Request").unwrap();
        assert_eq!(fields[4].kind, FieldKind::Unsupported("double".to_string()));
    }

    #[test]
    fn test_decode() {
        let bytes = demo_set().encode_to_vec();
        let pool = DescriptorPool::decode(&bytes).unwrap();
        assert_eq!(pool.messages().collect::<Vec<_>>(), vec!["demo.Request.Inner", "demo.Request"]);

        assert!(DescriptorPool::decode(&[0xff, 0xff, 0xff]).is_err());
    }
}
