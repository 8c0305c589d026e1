//! Fields a reader's schema does not declare, kept verbatim for re-encoding.

/// Raw wire payload of an unknown field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnknownValue {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(Vec<u8>),
    Fixed32(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownField {
    pub number: u32,
    pub value: UnknownValue,
}

/// Unknown fields in the order they were read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnknownFields {
    fields: Vec<UnknownField>,
}

impl UnknownFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, number: u32, value: UnknownValue) {
        self.fields.push(UnknownField { number, value });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnknownField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

impl<'a> IntoIterator for &'a UnknownFields {
    type Item = &'a UnknownField;
    type IntoIter = std::slice::Iter<'a, UnknownField>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
