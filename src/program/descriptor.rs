//! Field and method descriptors.
//!
//! Descriptors use the class-file grammar: `I`, `J`, `Z`... for primitives,
//! `Lpkg/Name;` for references, a `[` prefix per array dimension, and
//! `(params)ret` for methods with `V` as the void return.

use std::fmt;

use strum::{EnumIter, IntoEnumIterator};

use crate::{Error, Result};

/// A primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum BaseType {
    /// `B`
    Byte,
    /// `C`
    Char,
    /// `D`
    Double,
    /// `F`
    Float,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `S`
    Short,
    /// `Z`
    Boolean,
}

impl BaseType {
    /// Returns the descriptor character of this type.
    #[must_use]
    pub const fn descriptor_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    fn from_descriptor_char(c: char) -> Option<Self> {
        BaseType::iter().find(|base| base.descriptor_char() == c)
    }
}

/// The type of a field, parameter or non-void return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A primitive.
    Base(BaseType),
    /// A class or interface, by internal name.
    Object(String),
    /// An array of the component type.
    Array(Box<FieldType>),
}

impl FieldType {
    /// Returns the number of array dimensions, `0` for non-array types.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        let mut dims = 0;
        let mut current = self;
        while let FieldType::Array(component) = current {
            dims += 1;
            current = component;
        }
        dims
    }

    /// Returns the innermost non-array type.
    #[must_use]
    pub fn element(&self) -> &FieldType {
        let mut current = self;
        while let FieldType::Array(component) = current {
            current = component;
        }
        current
    }

    /// Returns `true` for class, interface and array types.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        !matches!(self, FieldType::Base(_))
    }

    /// Returns the internal name of the element type if it is a class or interface.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match self.element() {
            FieldType::Object(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => write!(f, "{}", base.descriptor_char()),
            FieldType::Object(name) => write!(f, "L{};", name),
            FieldType::Array(component) => write!(f, "[{}", component),
        }
    }
}

/// The return type of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    /// `V`
    Void,
    /// A value of the given type.
    Type(FieldType),
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => write!(f, "V"),
            ReturnType::Type(ty) => write!(f, "{}", ty),
        }
    }
}

/// A parsed method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Parameter types in declaration order, without the receiver.
    pub params: Vec<FieldType>,
    /// Return type.
    pub return_type: ReturnType,
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        write!(f, "){}", self.return_type)
    }
}

/// Parses a field descriptor such as `[Ljava/lang/String;`.
///
/// # Errors
///
/// Returns [`Error::InvalidDescriptor`] if `desc` is not exactly one field type.
pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let (ty, rest) = parse_field_type(desc)?;
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

/// Parses a method descriptor such as `(ILjava/lang/String;)V`.
///
/// # Errors
///
/// Returns [`Error::InvalidDescriptor`] if `desc` is malformed.
pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let invalid = || Error::InvalidDescriptor(desc.to_string());

    let mut rest = desc.strip_prefix('(').ok_or_else(invalid)?;
    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        if rest.is_empty() {
            return Err(invalid());
        }
        let (param, after) = parse_field_type(rest).map_err(|_| invalid())?;
        params.push(param);
        rest = after;
    }

    let return_type = if rest == "V" {
        ReturnType::Void
    } else {
        ReturnType::Type(parse_field_descriptor(rest).map_err(|_| invalid())?)
    };

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

fn parse_field_type(input: &str) -> Result<(FieldType, &str)> {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return Err(Error::InvalidDescriptor(input.to_string()));
    };
    if let Some(base) = BaseType::from_descriptor_char(first) {
        return Ok((FieldType::Base(base), chars.as_str()));
    }
    match first {
        'L' => {
            let body = chars.as_str();
            match body.find(';') {
                Some(end) if end > 0 => {
                    Ok((FieldType::Object(body[..end].to_string()), &body[end + 1..]))
                }
                _ => Err(Error::InvalidDescriptor(input.to_string())),
            }
        }
        '[' => {
            let (component, rest) = parse_field_type(chars.as_str())?;
            Ok((FieldType::Array(Box::new(component)), rest))
        }
        _ => Err(Error::InvalidDescriptor(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_descriptors() {
        assert_eq!(
            parse_field_descriptor("I").unwrap(),
            FieldType::Base(BaseType::Int)
        );
        let strings = parse_field_descriptor("[[Ljava/lang/String;").unwrap();
        assert_eq!(strings.dimensions(), 2);
        assert_eq!(strings.class_name(), Some("java/lang/String"));
        assert_eq!(strings.to_string(), "[[Ljava/lang/String;");
        assert!(strings.is_reference());
    }

    #[test]
    fn test_method_descriptor() {
        let desc = parse_method_descriptor("(IJ[Ljava/lang/Object;)[I").unwrap();
        assert_eq!(
            desc.params,
            vec![
                FieldType::Base(BaseType::Int),
                FieldType::Base(BaseType::Long),
                FieldType::Array(Box::new(FieldType::Object("java/lang/Object".into()))),
            ]
        );
        assert_eq!(
            desc.return_type,
            ReturnType::Type(FieldType::Array(Box::new(FieldType::Base(BaseType::Int))))
        );
        assert_eq!(desc.to_string(), "(IJ[Ljava/lang/Object;)[I");

        let main = parse_method_descriptor("([Ljava/lang/String;)V").unwrap();
        assert_eq!(main.return_type, ReturnType::Void);
    }

    #[test]
    fn test_malformed_descriptors() {
        for bad in ["", "X", "L;", "Ljava/lang/Object", "II", "[", "()", "(I", "I)V", "()VV", "(V)V"] {
            let field = parse_field_descriptor(bad).is_err();
            let method = parse_method_descriptor(bad).is_err();
            assert!(field && method, "accepted {:?}", bad);
        }
    }
}
