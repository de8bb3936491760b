//! Solidity type descriptors.
//!
//! A type string is parsed into an elementary (or tuple) base plus a list of
//! array dimensions. Dimensions are stored innermost first, so `uint8[2][]`
//! is a dynamic array whose elements are `uint8[2]`.

use std::fmt;
use std::str::FromStr;

use crate::error::AbiError;

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;

/// One array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayDim {
    Fixed(usize),
    Dynamic,
}

/// The non-array part of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    Uint(usize),
    Int(usize),
    Address,
    Bool,
    FixedBytes(usize),
    Bytes,
    String,
    Tuple(Vec<SolidityType>),
}

impl BaseType {
    fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::String => true,
            Self::Tuple(components) => components.iter().any(SolidityType::is_dynamic),
            _ => false,
        }
    }

    fn static_words(&self) -> Option<usize> {
        match self {
            Self::Bytes | Self::String => None,
            Self::Tuple(components) => components.iter().map(SolidityType::static_words).sum(),
            _ => Some(1),
        }
    }

    fn parse(ty: &str) -> Result<Self, AbiError> {
        if let Some(inner) = ty.strip_prefix('(') {
            let inner = inner
                .strip_suffix(')')
                .ok_or_else(|| AbiError::type_parse(ty, "unbalanced parentheses"))?;
            let components = split_components(inner)
                .ok_or_else(|| AbiError::type_parse(ty, "unbalanced parentheses"))?
                .into_iter()
                .map(|c| SolidityType::parse(type_token(c)))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::Tuple(components));
        }

        let sized = |prefix: &str| -> Result<Option<usize>, AbiError> {
            match ty.strip_prefix(prefix) {
                Some("") => Ok(None),
                Some(digits) if digits.chars().all(|c| c.is_ascii_digit()) => digits
                    .parse()
                    .map(Some)
                    .map_err(|_| AbiError::type_parse(ty, "bad width")),
                _ => Err(AbiError::type_parse(ty, "unknown type")),
            }
        };

        let base = match ty {
            "address" => Self::Address,
            "bool" => Self::Bool,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            "byte" => Self::FixedBytes(1),
            _ if ty.starts_with("uint") => Self::Uint(sized("uint")?.unwrap_or(256)),
            _ if ty.starts_with("int") => Self::Int(sized("int")?.unwrap_or(256)),
            _ if ty.starts_with("bytes") => match sized("bytes")? {
                Some(n) => Self::FixedBytes(n),
                None => Self::Bytes,
            },
            _ => return Err(AbiError::type_parse(ty, "unknown type")),
        };

        match base {
            Self::Uint(bits) | Self::Int(bits) if bits == 0 || bits > 256 || bits % 8 != 0 => {
                Err(AbiError::type_parse(ty, "integer width must be a multiple of 8 in 8..=256"))
            }
            Self::FixedBytes(n) if n == 0 || n > 32 => {
                Err(AbiError::type_parse(ty, "fixed bytes width must be in 1..=32"))
            }
            base => Ok(base),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::FixedBytes(n) => write!(f, "bytes{n}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::Tuple(components) => {
                f.write_str("(")?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A parsed Solidity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidityType {
    pub base: BaseType,
    /// Array dimensions, innermost first.
    pub dims: Vec<ArrayDim>,
}

impl SolidityType {
    pub fn new(base: BaseType) -> Self {
        Self {
            base,
            dims: Vec::new(),
        }
    }

    /// Parse a type string such as `uint256`, `bytes32[]` or `(address,uint)[2]`.
    ///
    /// Fails with [`AbiError::TypeParse`] on any malformed input; a partial
    /// descriptor is never returned.
    pub fn parse(input: &str) -> Result<Self, AbiError> {
        let ty = input.trim();
        if ty.is_empty() {
            return Err(AbiError::type_parse(input, "empty type"));
        }

        let mut rest = ty;
        let mut outer_first = Vec::new();
        while let Some(open_part) = rest.strip_suffix(']') {
            let open = open_part
                .rfind('[')
                .ok_or_else(|| AbiError::type_parse(input, "unbalanced brackets"))?;
            let size = &open_part[open + 1..];
            let dim = if size.is_empty() {
                ArrayDim::Dynamic
            } else if size.chars().all(|c| c.is_ascii_digit()) {
                match size.parse::<usize>() {
                    Ok(n) if n > 0 => ArrayDim::Fixed(n),
                    _ => return Err(AbiError::type_parse(input, "invalid array size")),
                }
            } else {
                return Err(AbiError::type_parse(input, "invalid array size"));
            };
            outer_first.push(dim);
            rest = &open_part[..open];
        }

        let is_tuple = rest.starts_with('(');
        if !is_tuple && (rest.contains('[') || rest.contains(']')) {
            return Err(AbiError::type_parse(input, "unbalanced brackets"));
        }
        let base = BaseType::parse(rest).map_err(|e| match e {
            AbiError::TypeParse { reason, .. } if !is_tuple => AbiError::type_parse(input, reason),
            other => other,
        })?;

        outer_first.reverse();
        Ok(Self {
            base,
            dims: outer_first,
        })
    }

    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }

    /// `true` if the encoded size depends on the value.
    pub fn is_dynamic(&self) -> bool {
        self.dims.contains(&ArrayDim::Dynamic) || self.base.is_dynamic()
    }

    /// Words occupied in place by a static type; `None` for dynamic types.
    pub fn static_words(&self) -> Option<usize> {
        if self.dims.contains(&ArrayDim::Dynamic) {
            return None;
        }
        let element = self.base.static_words()?;
        self.dims.iter().try_fold(element, |acc, dim| match dim {
            ArrayDim::Fixed(n) => acc.checked_mul(*n),
            ArrayDim::Dynamic => None,
        })
    }

    /// Words this type takes in the head of an enclosing sequence.
    pub fn head_words(&self) -> usize {
        self.static_words().unwrap_or(1)
    }

    /// Outermost array dimension, if any.
    pub fn outer_dim(&self) -> Option<ArrayDim> {
        self.dims.last().copied()
    }

    /// The type with its outermost dimension removed.
    pub fn element_type(&self) -> Option<SolidityType> {
        let (_, inner) = self.dims.split_last()?;
        Some(Self {
            base: self.base.clone(),
            dims: inner.to_vec(),
        })
    }
}

impl fmt::Display for SolidityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for dim in &self.dims {
            match dim {
                ArrayDim::Fixed(n) => write!(f, "[{n}]")?,
                ArrayDim::Dynamic => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for SolidityType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Words needed for the heads of `types` laid out in sequence.
pub fn head_size(types: &[SolidityType]) -> usize {
    types.iter().map(SolidityType::head_words).sum::<usize>() * WORD
}

/// Split on top-level commas. `None` when parentheses do not balance.
pub(crate) fn split_components(inner: &str) -> Option<Vec<&str>> {
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(inner[start..].trim());
    Some(parts)
}

/// The type part of a parameter declaration, dropping any name or
/// `indexed`/`memory` qualifiers: `"uint256 indexed value"` → `"uint256"`.
pub(crate) fn type_token(decl: &str) -> &str {
    let decl = decl.trim();
    if decl.starts_with('(') {
        let mut depth = 0usize;
        for (i, c) in decl.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let suffix_end = decl[i + 1..]
                            .find(char::is_whitespace)
                            .map_or(decl.len(), |n| i + 1 + n);
                        return &decl[..suffix_end];
                    }
                }
                _ => {}
            }
        }
        return decl;
    }
    decl.split_whitespace().next().unwrap_or(decl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> SolidityType {
        SolidityType::parse(s).unwrap()
    }

    #[test]
    fn elementary_types() {
        assert_eq!(parse("uint256").base, BaseType::Uint(256));
        assert_eq!(parse("uint").base, BaseType::Uint(256));
        assert_eq!(parse("int8").base, BaseType::Int(8));
        assert_eq!(parse("int").to_string(), "int256");
        assert_eq!(parse("byte").to_string(), "bytes1");
        assert_eq!(parse("bytes32").base, BaseType::FixedBytes(32));
        assert_eq!(parse("bytes").base, BaseType::Bytes);
        assert_eq!(parse("address").base, BaseType::Address);
    }

    #[test]
    fn dims_are_innermost_first() {
        let t = parse("uint8[2][]");
        assert_eq!(t.dims, vec![ArrayDim::Fixed(2), ArrayDim::Dynamic]);
        assert_eq!(t.outer_dim(), Some(ArrayDim::Dynamic));
        assert_eq!(t.element_type().unwrap().to_string(), "uint8[2]");
        assert_eq!(t.to_string(), "uint8[2][]");
    }

    #[test]
    fn dynamic_classification() {
        assert!(!parse("uint256").is_dynamic());
        assert!(!parse("bytes32[3]").is_dynamic());
        assert!(parse("bytes").is_dynamic());
        assert!(parse("string").is_dynamic());
        assert!(parse("uint256[]").is_dynamic());
        assert!(parse("string[2]").is_dynamic());
        assert!(parse("(uint256,string)").is_dynamic());
        assert!(!parse("(uint256,bool)[2]").is_dynamic());
    }

    #[test]
    fn static_word_counts() {
        assert_eq!(parse("uint256").static_words(), Some(1));
        assert_eq!(parse("uint8[3]").static_words(), Some(3));
        assert_eq!(parse("address[2][3]").static_words(), Some(6));
        assert_eq!(parse("(uint256,bool)[2]").static_words(), Some(4));
        assert_eq!(parse("uint256[]").static_words(), None);
        assert_eq!(parse("uint256[]").head_words(), 1);
        assert_eq!(head_size(&[parse("uint256"), parse("bytes"), parse("bool[2]")]), 4 * WORD);
    }

    #[test]
    fn tuples_render_canonically() {
        let t = parse("(uint, address to, bytes[])[]");
        assert_eq!(t.to_string(), "(uint256,address,bytes[])[]");
        assert_eq!(parse("()").to_string(), "()");
    }

    #[test]
    fn malformed_types_are_rejected() {
        for bad in [
            "", "uint256[", "uint256]", "uint256[a]", "uint256[0]", "uint256[-1]", "uint7",
            "uint264", "int0", "bytes0", "bytes33", "foo", "uint256[2", "uint[2]]",
            "(uint256", "(uint256,bool))", "ui[nt]256",
        ] {
            assert!(
                matches!(SolidityType::parse(bad), Err(AbiError::TypeParse { .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn type_token_strips_names() {
        assert_eq!(type_token("uint256 indexed value"), "uint256");
        assert_eq!(type_token("(uint256,bool)[] items"), "(uint256,bool)[]");
        assert_eq!(type_token(" address "), "address");
    }
}
