//! Structural descriptors of the config types.
//!
//! Every node type of the current schema implements [`Describe`], returning its
//! serialized field names and their shapes. The documentation checker walks
//! these descriptors against the documentation tree, and the parser uses them
//! to spot keys that no field accepts.

/// Shape of a single field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Bool,
    Integer,
    String,
    Optional(Box<FieldKind>),
    List(Box<FieldKind>),
    Object(fn() -> ObjectSchema),
}

impl FieldKind {
    pub fn optional(inner: FieldKind) -> Self {
        FieldKind::Optional(Box::new(inner))
    }

    pub fn list(inner: FieldKind) -> Self {
        FieldKind::List(Box::new(inner))
    }

    /// Optional list, the way every list is modelled.
    pub fn list_of(inner: FieldKind) -> Self {
        FieldKind::optional(FieldKind::list(inner))
    }

    pub fn object<T: Describe>() -> Self {
        FieldKind::Object(T::describe)
    }

    /// The kind with any optional wrapper removed.
    pub fn strip_optional(&self) -> &FieldKind {
        match self {
            FieldKind::Optional(inner) => inner.strip_optional(),
            other => other,
        }
    }

    /// True for booleans, integers and strings, optional or not.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.strip_optional(),
            FieldKind::Bool | FieldKind::Integer | FieldKind::String
        )
    }

    /// Nested object descriptor, looking through optionals and lists.
    pub fn object_schema(&self) -> Option<ObjectSchema> {
        match self {
            FieldKind::Optional(inner) | FieldKind::List(inner) => inner.object_schema(),
            FieldKind::Object(describe) => Some(describe()),
            _ => None,
        }
    }

    /// Human-readable type label: `string`, `object`, `list of strings`.
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::Bool => "boolean".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::String => "string".to_string(),
            FieldKind::Object(_) => "object".to_string(),
            FieldKind::Optional(inner) => inner.type_name(),
            FieldKind::List(inner) => format!("list of {}s", inner.type_name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Serialized (camelCase) field name.
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Builder-style field declaration, in serialization order.
    pub fn field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldSchema { name, kind });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Types that can describe their own serialized structure.
pub trait Describe {
    fn describe() -> ObjectSchema;
}
