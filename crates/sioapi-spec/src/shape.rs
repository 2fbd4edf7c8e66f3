//! Data shapes: anything that can describe itself as a structural schema.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;

use crate::schema::StructuralSchema;

/// A data shape that can describe itself as a structural schema.
///
/// Implemented for every [`JsonSchema`] type. Nested definitions are emitted
/// under `definitions` and referenced as `#/definitions/<Name>`.
pub trait Shape {
    /// The structural schema of the shape.
    fn structural_schema() -> StructuralSchema;

    /// The name the schema is registered under in `components.schemas`.
    fn type_name() -> String;
}

impl<T: JsonSchema> Shape for T {
    fn structural_schema() -> StructuralSchema {
        let root = SchemaSettings::draft07()
            .into_generator()
            .into_root_schema_for::<T>();
        // RootSchema holds only string-keyed maps, so converting it to a Value cannot fail.
        let mut value = serde_json::to_value(&root).unwrap_or_default();
        // The document declares its own dialect; a per-schema `$schema` is noise there.
        if let Value::Object(obj) = &mut value {
            obj.remove("$schema");
        }
        StructuralSchema::from_value(value)
    }

    fn type_name() -> String {
        T::schema_name()
    }
}

/// A shape captured at runtime: its registered name plus its structural schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    name: String,
    schema: StructuralSchema,
}

impl ShapeDescriptor {
    pub fn new(name: impl Into<String>, schema: StructuralSchema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Describe a static [`Shape`].
    pub fn of<T: Shape>() -> Self {
        Self::new(T::type_name(), T::structural_schema())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &StructuralSchema {
        &self.schema
    }
}

/// How a handler documents one of its shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DocShape {
    /// A concrete shape: documented, and validated when validation is on.
    Explicit(ShapeDescriptor),
    /// The handler has a value here but declared no shape for it; documented
    /// with the `NoSpec` placeholder.
    NotProvided,
    /// Nothing to document.
    #[default]
    Absent,
}

impl DocShape {
    pub fn of<T: Shape>() -> Self {
        Self::Explicit(ShapeDescriptor::of::<T>())
    }

    /// The descriptor of an explicit shape.
    pub fn descriptor(&self) -> Option<&ShapeDescriptor> {
        match self {
            Self::Explicit(descriptor) => Some(descriptor),
            Self::NotProvided | Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<ShapeDescriptor> for DocShape {
    fn from(descriptor: ShapeDescriptor) -> Self {
        Self::Explicit(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Inner {
        is_accepted: bool,
    }

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Outer {
        success: bool,
        data: Inner,
    }

    #[test]
    fn derived_shape_uses_type_name() {
        let descriptor = ShapeDescriptor::of::<Outer>();
        assert_eq!(descriptor.name(), "Outer");
    }

    #[test]
    fn derived_shape_drops_dialect_marker() {
        let schema = Outer::structural_schema();
        assert!(schema.as_value().get("$schema").is_none());
        assert_eq!(schema.as_value()["type"], "object");
    }

    #[test]
    fn derived_shape_references_nested_definitions() {
        let schema = Outer::structural_schema();
        assert_eq!(schema.references(), vec!["#/definitions/Inner"]);
        assert!(schema.as_value()["definitions"]["Inner"].is_object());
    }

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    enum Priority {
        Low,
        High,
    }

    #[test]
    fn every_derived_shape_is_an_object_schema() {
        let schemas = [
            Outer::structural_schema(),
            Priority::structural_schema(),
            <Option<String>>::structural_schema(),
            <Vec<Inner>>::structural_schema(),
            <std::collections::HashMap<String, u32>>::structural_schema(),
            <()>::structural_schema(),
        ];
        for schema in schemas {
            assert!(schema.as_value().is_object(), "{:?}", schema);
        }
    }

    #[test]
    fn doc_shape_descriptor() {
        assert!(DocShape::of::<Inner>().descriptor().is_some());
        assert!(DocShape::NotProvided.descriptor().is_none());
        assert!(DocShape::default().is_absent());
    }
}
