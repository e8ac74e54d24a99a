use crate::utils::{find_modbus_attr, get_punctuated, get_str, get_u16, panic_no_key};
use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, ToTokens};
use syn::{Expr, Field, Type};

pub type Address = u16;
pub type Quantity = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Coil,
    Discrete,
    Input,
    Holding,
}

impl From<String> for Table {
    fn from(value: String) -> Self {
        match value.as_str() {
            "coil" => Table::Coil,
            "discrete" => Table::Discrete,
            "input" => Table::Input,
            "holding" => Table::Holding,
            s => panic!(
                "Invalid `table` variant \"{s}\". Use one of \"coil\", \"discrete\", \"input\" or \"holding\"."
            ),
        }
    }
}

impl Table {
    /// `BindingMap` method binding this table.
    pub fn bind_method(&self) -> Ident {
        let name = match self {
            Table::Coil => "bind_coils",
            Table::Discrete => "bind_discrete_inputs",
            Table::Input => "bind_input_registers",
            Table::Holding => "bind_holding_registers",
        };
        Ident::new(name, Span::call_site())
    }
}

#[derive(Debug, Clone)]
/// Single bound field. Parsed from field attributes and to be used in proc macros
pub struct Entry {
    pub field_name: String,
    /// Element type, the field type itself unless the field is an array.
    pub elem_ty: Type,
    /// Array length expression for array fields.
    pub len: Option<Expr>,
    pub table: Table,
    pub addr: Address,
    pub size: Option<Quantity>,
}

impl From<Field> for Entry {
    fn from(value: Field) -> Self {
        let field_name = value
            .ident
            .as_ref()
            .unwrap_or_else(|| panic!("Unexpected unnamed struct field."))
            .to_string();

        let (elem_ty, len) = match value.ty {
            Type::Array(array) => (*array.elem, Some(array.len)),
            ty @ Type::Path(_) => (ty, None),
            _ => panic!("Unexpected `syn::Type` variant in `{field_name}` field."),
        };

        let attr = find_modbus_attr(&value.attrs).unwrap_or_else(|| {
            panic!("Unexpected missing attribute `modbus` for `{field_name}` field.")
        });
        let punctuated = get_punctuated(attr, &field_name);

        let table = get_str(&punctuated, "table", &field_name)
            .unwrap_or_else(|| panic_no_key("table", &field_name))
            .into();
        let addr = get_u16(&punctuated, "addr", &field_name)
            .unwrap_or_else(|| panic_no_key("addr", &field_name));
        let size = get_u16(&punctuated, "size", &field_name);
        if size == Some(0) {
            panic!("In `modbus` attribute for `{field_name}`, the key `size` must be positive.");
        }

        let entry = Self {
            field_name,
            elem_ty,
            len,
            table,
            addr,
            size,
        };
        if matches!(entry.table, Table::Coil | Table::Discrete) && !entry.is_bool() {
            panic!(
                "Field `{}` bound to {:?} table must be `bool` or an array of `bool`.",
                entry.field_name, entry.table
            );
        }
        entry
    }
}

impl Entry {
    // Macro helpers

    pub fn field_name_ident(&self) -> Ident {
        Ident::new(&self.field_name, Span::call_site())
    }

    pub fn is_array(&self) -> bool {
        self.len.is_some()
    }

    pub fn is_bool(&self) -> bool {
        self.ty_string() == "bool"
    }

    /// Type as a string to compare field types.
    pub fn ty_string(&self) -> String {
        self.elem_ty.to_token_stream().to_string()
    }

    /// Units per entry: the `size` key, or the native width of the type.
    pub fn size_tokens(&self) -> TokenStream {
        let elem_ty = &self.elem_ty;
        match self.size {
            Some(size) => quote!(#size),
            None => quote!(<#elem_ty as ::modbus_binding::codec::Native>::UNITS),
        }
    }

    /// Whether `other` may continue the binding this entry belongs to.
    pub fn continues_with(&self, other: &Entry) -> bool {
        !self.is_array()
            && !other.is_array()
            && self.table == other.table
            && self.size == other.size
            && self.ty_string() == other.ty_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{parse_quote, FieldsNamed};

    fn fields(fields: FieldsNamed) -> Vec<Entry> {
        fields.named.into_iter().map(Entry::from).collect()
    }

    #[test]
    fn test_parse_entries() {
        let entries = fields(parse_quote!({
            #[modbus(table = "holding", addr = 2, size = 4)]
            setpoint: f32,
            #[modbus(table = "coil", addr = 0)]
            relays: [bool; 8],
        }));
        assert_eq!(entries[0].table, Table::Holding);
        assert_eq!(entries[0].addr, 2);
        assert_eq!(entries[0].size, Some(4));
        assert!(!entries[0].is_array());
        assert_eq!(entries[1].table, Table::Coil);
        assert!(entries[1].is_array());
        assert!(entries[1].is_bool());
        assert_eq!(entries[1].table.bind_method().to_string(), "bind_coils");
    }

    #[test]
    #[should_panic(expected = "must be `bool`")]
    fn test_coil_must_be_bool() {
        fields(parse_quote!({
            #[modbus(table = "coil", addr = 0)]
            level: u16,
        }));
    }

    #[test]
    #[should_panic(expected = "Invalid `table` variant")]
    fn test_invalid_table() {
        fields(parse_quote!({
            #[modbus(table = "register", addr = 0)]
            level: u16,
        }));
    }
}
